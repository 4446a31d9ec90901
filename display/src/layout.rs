//! Pure page-grid layout, independent of zoom resolution or scrolling.
//!
//! Grounded on the teacher's `VerticalLayout`/`HorizontalLayout` centering
//! idiom (each page centered within the width/height its row or column
//! allots it), generalized here to a `columns`-wide grid with an optional
//! leading blank cell for book-view mode.

use geometry::{Rect, Size};

pub struct LayoutParams {
    pub columns: u32,
    /// Reserves the first cell of the first row empty, so the first page
    /// lands in the second column (used by book-view modes).
    pub leading_blank: bool,
    pub border: f64,
    pub between_x: f64,
    pub between_y: f64,
}

pub struct LayoutResult {
    pub canvas: Size,
    /// Per-page device-pixel rectangles, in the same order as the input
    /// `sizes` slice.
    pub page_rects: Vec<Rect>,
}

/// Lays `sizes` out into rows of `params.columns` pages, centering each page
/// within its column's width and each row within the overall canvas width.
pub fn compute_layout(sizes: &[Size], params: &LayoutParams) -> LayoutResult {
    let columns = params.columns.max(1) as usize;

    let mut rows: Vec<Vec<Option<usize>>> = Vec::new();
    let mut idx = 0;
    let mut first_row = true;
    while idx < sizes.len() {
        let mut row = Vec::with_capacity(columns);
        if first_row && params.leading_blank {
            row.push(None);
        }
        while row.len() < columns && idx < sizes.len() {
            row.push(Some(idx));
            idx += 1;
        }
        rows.push(row);
        first_row = false;
    }
    if rows.is_empty() {
        rows.push(vec![None; columns]);
    }

    let mut col_widths = vec![0.0_f64; columns];
    for row in &rows {
        for (c, cell) in row.iter().enumerate() {
            if let Some(i) = cell {
                col_widths[c] = col_widths[c].max(sizes[*i].w);
            }
        }
    }

    let canvas_w = params.border * 2.0 + col_widths.iter().sum::<f64>() + params.between_x * (columns.saturating_sub(1)) as f64;

    let mut page_rects = vec![Rect::ZERO; sizes.len()];
    let mut y = params.border;
    for row in &rows {
        let row_height = row.iter().filter_map(|c| c.map(|i| sizes[i].h)).fold(0.0_f64, f64::max);

        let mut x = params.border;
        for (c, cell) in row.iter().enumerate() {
            let col_w = col_widths[c];
            if let Some(i) = cell {
                let size = sizes[i];
                let cx = x + (col_w - size.w) / 2.0;
                let cy = y + (row_height - size.h) / 2.0;
                page_rects[i] = Rect::new(cx, cy, size.w, size.h);
            }
            x += col_w + params.between_x;
        }

        y += row_height + params.between_y;
    }

    let canvas_h = (y - params.between_y + params.border).max(params.border * 2.0);

    LayoutResult {
        canvas: Size::new(canvas_w.max(params.border * 2.0), canvas_h),
        page_rects,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(columns: u32, leading_blank: bool) -> LayoutParams {
        LayoutParams {
            columns,
            leading_blank,
            border: 4.0,
            between_x: 4.0,
            between_y: 4.0,
        }
    }

    #[test]
    fn single_column_stacks_pages_vertically() {
        let sizes = [Size::new(100.0, 200.0), Size::new(100.0, 200.0)];
        let result = compute_layout(&sizes, &params(1, false));
        assert_eq!(result.page_rects[0].y, 4.0);
        assert_eq!(result.page_rects[1].y, 4.0 + 200.0 + 4.0);
        assert_eq!(result.canvas.w, 100.0 + 8.0);
    }

    #[test]
    fn narrower_page_is_centered_in_its_column() {
        let sizes = [Size::new(100.0, 100.0), Size::new(50.0, 100.0)];
        let result = compute_layout(&sizes, &params(1, false));
        assert_eq!(result.page_rects[1].x, 4.0 + (100.0 - 50.0) / 2.0);
    }

    #[test]
    fn book_view_leaves_first_cell_blank() {
        let sizes = [Size::new(100.0, 100.0), Size::new(100.0, 100.0), Size::new(100.0, 100.0)];
        let result = compute_layout(&sizes, &params(2, true));
        // page 0 alone occupies the second column of row 0; page 1 and 2
        // share row 1, so page 1 sits in the leftmost column.
        assert!(result.page_rects[0].x > result.page_rects[1].x);
        assert_eq!(result.page_rects[1].y, result.page_rects[2].y);
    }

    #[test]
    fn two_columns_places_pages_side_by_side() {
        let sizes = [Size::new(100.0, 100.0), Size::new(100.0, 100.0)];
        let result = compute_layout(&sizes, &params(2, false));
        assert_eq!(result.page_rects[0].y, result.page_rects[1].y);
        assert!(result.page_rects[1].x > result.page_rects[0].x);
    }
}
