//! `EngineIface`: the narrow interface `display` and `render` need from a
//! PDF engine. The parser itself is out of scope for this crate; this is
//! only the boundary the core renders and navigates through.

mod bitmap;
mod ctm;
mod error;
mod fake;
mod link;
mod toc;

pub use bitmap::Bitmap;
pub use ctm::Ctm;
pub use error::EngineError;
pub use fake::FakeEngine;
pub use link::{Dest, Link, LinkKind};
pub use toc::TocNode;

use geometry::{Rect, Size};

/// Pages are numbered from 1, matching the original and `prefs::ViewState`.
pub type PageNo = u32;

/// A single extracted character and its bounding box in page user space,
/// as returned by the engine for `DisplayModel::get_text_in_region`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharInfo {
    pub ch: char,
    pub rect: Rect,
    /// Whether this character starts a new line, used to decide where to
    /// insert line breaks when reconstructing text for a region.
    pub line_start: bool,
}

/// Parameters for a single render call: render `page` at `zoom_real` and
/// `rotation`, producing the sub-rectangle `rect` (in device pixels of the
/// full rotated page) at `target_width x target_height`.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderParams {
    pub page: PageNo,
    pub zoom_real: f64,
    pub rotation: i32,
    pub rect: Rect,
    pub target_width: u32,
    pub target_height: u32,
}

/// The capability set `DisplayModel`, `RenderWorker` and `Painter` need
/// from a document engine. A single generic `DisplayModel<E: EngineIface>`
/// replaces what the original expressed as per-engine subclasses.
pub trait EngineIface: Send + Sync {
    fn page_count(&self) -> u32;

    /// Page size in user units (1/72 inch), before rotation is applied.
    fn page_size(&self, page: PageNo) -> Size;

    /// The page's own `/Rotate` entry, normalized to `{0,90,180,270}`.
    fn page_rotation(&self, page: PageNo) -> i32;

    /// The page's content bounding box, used for `FitContent` zoom.
    fn content_bbox(&self, page: PageNo) -> Rect;

    fn viewctm(&self, page: PageNo, zoom_real: f64, rotation: i32) -> Ctm {
        let size = self.page_size(page);
        Ctm::new(size, zoom_real, rotation + self.page_rotation(page))
    }

    /// Renders `params` to a bitmap. `abort` is polled by the engine at
    /// granular rendering steps; once it returns `true` the engine may
    /// return `Err(EngineError::Aborted)` at its convenience.
    fn render_bitmap(&self, params: RenderParams, abort: &dyn Fn() -> bool) -> Result<Bitmap, EngineError>;

    fn extract_page_text(&self, page: PageNo, line_break: &str) -> Result<String, EngineError>;

    /// Per-character boxes for `page`, in page user-space coordinates.
    fn page_chars(&self, page: PageNo) -> Result<Vec<CharInfo>, EngineError>;

    fn link_count(&self) -> u32;

    /// Appends every link in the document to `buffer`, in document order.
    fn fill_links(&self, buffer: &mut Vec<Link>);

    fn find_page_by_dest(&self, dest: &Dest) -> Option<PageNo>;

    fn get_named_dest(&self, name: &str) -> Option<Dest>;

    /// Whether `page`'s content is effectively a single embedded image,
    /// used by `BitmapCache`'s tile-resolution heuristic.
    fn is_image_page(&self, page: PageNo) -> bool;

    fn get_toc_tree(&self) -> Option<TocNode>;

    fn printing_allowed(&self) -> bool;
}
