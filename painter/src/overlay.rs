use geometry::Rect;

/// What kind of highlight an [`Overlay`] rectangle represents, each with its
/// own alpha-blended color per §4.7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayKind {
    Selection,
    SearchHit,
    ForwardSearch,
}

impl OverlayKind {
    pub fn rgba(self) -> [u8; 4] {
        match self {
            OverlayKind::Selection => [51, 102, 204, 90],
            OverlayKind::SearchHit => [255, 220, 0, 110],
            OverlayKind::ForwardSearch => [255, 70, 70, 140],
        }
    }
}

/// A highlight to draw, already in viewport/screen coordinates (as produced
/// by `DisplayModel::user_to_screen`/`map_result_rect_to_screen`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Overlay {
    pub kind: OverlayKind,
    pub rect: Rect,
}
