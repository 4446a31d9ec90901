//! Basic 2D geometry shared across the viewer crates: points, sizes,
//! rectangles, margins, and page rotation.
//!
//! Coordinates are always `f64`, matching the precision the display model
//! computes layout in. Conversion to device pixels happens at the painter
//! boundary, not in here.

/// Page/canvas rotation, always one of 0, 90, 180, 270 degrees.
pub type Rotation = i32;

/// Folds an arbitrary rotation delta into `{0, 90, 180, 270}`.
pub fn normalize_rotation(rotation: Rotation) -> Rotation {
    let r = rotation % 360;
    if r < 0 {
        r + 360
    } else {
        r
    }
}

/// Whether `rotation` is already one of the four valid orientations.
pub fn is_valid_rotation(rotation: Rotation) -> bool {
    matches!(normalize_rotation(rotation), 0 | 90 | 180 | 270)
}

/// Rounds to the nearest integer the way the original display model does:
/// truncating `x + 0.5`. Chosen over plain truncation so layout does not
/// drift by half a pixel near page boundaries (see DESIGN.md).
pub fn round_to_device(x: f64) -> i64 {
    (x + 0.5).floor() as i64
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub w: f64,
    pub h: f64,
}

impl Size {
    pub fn new(w: f64, h: f64) -> Self {
        Size { w, h }
    }

    pub fn area(&self) -> f64 {
        self.w * self.h
    }

    /// Swaps width and height, as happens when a page's combined rotation
    /// (global rotation + the page's own `/Rotate` entry) is 90 or 270.
    pub fn swapped(&self) -> Self {
        Size::new(self.h, self.w)
    }
}

/// Asymmetric padding around pages, e.g. the border/between-pages constants
/// from §6.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Margin {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Margin {
    pub fn uniform(v: f64) -> Self {
        Margin {
            left: v,
            right: v,
            top: v,
            bottom: v,
        }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

/// An axis-aligned rectangle in `(x, y, width, height)` form.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub const ZERO: Rect = Rect {
        x: 0.0,
        y: 0.0,
        w: 0.0,
        h: 0.0,
    };

    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Rect { x, y, w, h }
    }

    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Rect::new(origin.x, origin.y, size.w, size.h)
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.w, self.h)
    }

    pub fn left(&self) -> f64 {
        self.x
    }

    pub fn top(&self) -> f64 {
        self.y
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    pub fn area(&self) -> f64 {
        self.w.max(0.0) * self.h.max(0.0)
    }

    pub fn contains_point(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.w, self.h)
    }

    /// Intersection with `other`, or `None` if they do not overlap.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x0 = self.left().max(other.left());
        let y0 = self.top().max(other.top());
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());

        if x1 > x0 && y1 > y0 {
            Some(Rect::new(x0, y0, x1 - x0, y1 - y0))
        } else {
            None
        }
    }

    /// Fraction of `self`'s area that overlaps `other`, in `[0, 1]`.
    pub fn visibility_within(&self, other: &Rect) -> f64 {
        let area = self.area();
        if area <= 0.0 {
            return 0.0;
        }

        match self.intersect(other) {
            Some(i) => (i.area() / area).min(1.0),
            None => 0.0,
        }
    }

    pub fn union(&self, other: &Rect) -> Rect {
        let x0 = self.left().min(other.left());
        let y0 = self.top().min(other.top());
        let x1 = self.right().max(other.right());
        let y1 = self.bottom().max(other.bottom());

        Rect::new(x0, y0, x1 - x0, y1 - y0)
    }

    /// Grows the rectangle by `margin` on every side (a "halo"), used when
    /// requesting tiles slightly beyond the visible viewport.
    pub fn inflate(&self, margin: f64) -> Rect {
        Rect::new(
            self.x - margin,
            self.y - margin,
            self.w + 2.0 * margin,
            self.h + 2.0 * margin,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_folds_into_four_values() {
        for r in [-450, -90, 0, 45, 90, 271, 360, 720, 730] {
            let n = normalize_rotation(r);
            assert!((0..360).contains(&n));
        }
        assert_eq!(normalize_rotation(-90), 270);
        assert_eq!(normalize_rotation(450), 90);
        assert_eq!(normalize_rotation(720), 0);
    }

    #[test]
    fn rotation_normalization_is_periodic() {
        for r in [-900, -360, 0, 360, 720] {
            assert_eq!(normalize_rotation(r), normalize_rotation(r + 360));
        }
    }

    #[test]
    fn valid_rotation_rejects_non_right_angles() {
        assert!(is_valid_rotation(0));
        assert!(is_valid_rotation(450)); // folds to 90
        assert!(!is_valid_rotation(45));
        assert!(!is_valid_rotation(91));
    }

    #[test]
    fn intersect_disjoint_is_none() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(20.0, 20.0, 5.0, 5.0);
        assert!(a.intersect(&b).is_none());
    }

    #[test]
    fn visibility_of_fully_contained_rect_is_one() {
        let page = Rect::new(0.0, 0.0, 100.0, 100.0);
        let viewport = Rect::new(-50.0, -50.0, 300.0, 300.0);
        assert_eq!(page.visibility_within(&viewport), 1.0);
    }

    #[test]
    fn visibility_of_half_overlap() {
        let page = Rect::new(0.0, 0.0, 100.0, 100.0);
        let viewport = Rect::new(50.0, 0.0, 100.0, 100.0);
        assert_eq!(page.visibility_within(&viewport), 0.5);
    }

    #[test]
    fn size_swap_exchanges_dimensions() {
        let s = Size::new(200.0, 100.0).swapped();
        assert_eq!(s, Size::new(100.0, 200.0));
    }

    #[test]
    fn round_to_device_matches_plus_half_truncation() {
        assert_eq!(round_to_device(1.4), 1);
        assert_eq!(round_to_device(1.5), 2);
        assert_eq!(round_to_device(1.999), 2);
        assert_eq!(round_to_device(-0.4), 0);
    }
}
