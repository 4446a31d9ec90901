use geometry::{normalize_rotation, Point, Size};

/// The current transformation matrix mapping a page's user-space
/// coordinates (origin top-left, rotation already folded in) to device
/// pixels at a given real zoom and rotation.
///
/// A plain 2x3 affine (`[a c e; b d f]` in column form) rather than
/// `nalgebra::Affine2` so `engine` has no dependency on rendering-only
/// crates beyond `geometry`; `display` composes these with its own
/// viewport offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ctm {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
}

impl Ctm {
    /// Builds the ctm for a page of `page_size` user units, rendered at
    /// `zoom_real` (already dpi-scaled) and `rotation`. The translation
    /// component shifts the rotated page so its origin lands back in the
    /// positive quadrant, matching how PDF viewers present rotated pages.
    pub fn new(page_size: Size, zoom_real: f64, rotation: i32) -> Self {
        let scale = zoom_real / 100.0;
        let rotation = normalize_rotation(rotation);

        let (a, b, c, d) = match rotation {
            0 => (scale, 0.0, 0.0, scale),
            90 => (0.0, scale, -scale, 0.0),
            180 => (-scale, 0.0, 0.0, -scale),
            270 => (0.0, -scale, scale, 0.0),
            _ => unreachable!("rotation is always normalized"),
        };

        let (e, f) = match rotation {
            0 => (0.0, 0.0),
            90 => (page_size.h * scale, 0.0),
            180 => (page_size.w * scale, page_size.h * scale),
            270 => (0.0, page_size.w * scale),
            _ => unreachable!("rotation is always normalized"),
        };

        Ctm { a, b, c, d, e, f }
    }

    pub fn transform_point(&self, p: Point) -> Point {
        Point::new(self.a * p.x + self.c * p.y + self.e, self.b * p.x + self.d * p.y + self.f)
    }

    /// The inverse transform, from device pixels back to page user space.
    pub fn inverse(&self) -> Ctm {
        let det = self.a * self.d - self.b * self.c;
        let ia = self.d / det;
        let ib = -self.b / det;
        let ic = -self.c / det;
        let id = self.a / det;
        let ie = -(ia * self.e + ic * self.f);
        let if_ = -(ib * self.e + id * self.f);

        Ctm {
            a: ia,
            b: ib,
            c: ic,
            d: id,
            e: ie,
            f: if_,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_rotation_is_plain_scale() {
        let ctm = Ctm::new(Size::new(100.0, 200.0), 100.0, 0);
        let p = ctm.transform_point(Point::new(10.0, 20.0));
        assert_eq!(p, Point::new(10.0, 20.0));
    }

    #[test]
    fn inverse_round_trips() {
        let ctm = Ctm::new(Size::new(100.0, 200.0), 150.0, 90);
        let p = Point::new(12.0, 34.0);
        let round_tripped = ctm.inverse().transform_point(ctm.transform_point(p));
        assert!((round_tripped.x - p.x).abs() < 1e-9);
        assert!((round_tripped.y - p.y).abs() < 1e-9);
    }
}
