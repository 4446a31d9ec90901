use std::time::Instant;

/// Opaque handle a host assigns when it registers a document with the
/// `RenderSystem`. The render pipeline never looks inside a document beyond
/// the `EngineIface` it was registered with, so this is a plain integer
/// rather than a path or file handle.
pub type DocId = u64;

/// One tile of a page at some resolution level. `res == 0` means "the whole
/// page in one tile"; each increment doubles the number of tiles per axis,
/// so `res` tiles form a `2^res x 2^res` grid and `(col, row)` picks one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tile {
    pub res: u16,
    pub col: u16,
    pub row: u16,
}

impl Tile {
    pub const WHOLE: Tile = Tile { res: 0, col: 0, row: 0 };

    pub fn grid_size(self) -> u32 {
        1u32 << self.res
    }
}

impl Default for Tile {
    fn default() -> Self {
        Tile::WHOLE
    }
}

/// Quantizes a zoom percentage to thousandths so it can be used as a hash
/// key without the usual float equality pitfalls.
pub fn quantize_zoom(zoom_real: f64) -> i64 {
    (zoom_real * 1000.0).round() as i64
}

/// Identifies one cached or in-flight bitmap: a specific tile of a specific
/// page, at a specific rotation and zoom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub doc: DocId,
    pub page: u32,
    pub rotation: i32,
    pub zoom_milli: i64,
    pub tile: Tile,
}

impl CacheKey {
    pub fn new(doc: DocId, page: u32, rotation: i32, zoom_real: f64, tile: Tile) -> Self {
        CacheKey {
            doc,
            page,
            rotation: geometry::normalize_rotation(rotation),
            zoom_milli: quantize_zoom(zoom_real),
            tile,
        }
    }

    /// The part of the key that identifies a cache *slot* regardless of
    /// rotation/zoom: two requests sharing a `loc` compete for the same
    /// slot, and a fresher one aborts or supersedes a stale one.
    pub fn loc(&self) -> (DocId, u32, Tile) {
        (self.doc, self.page, self.tile)
    }
}

/// One request to render a bitmap, as handed to [`crate::RenderQueue`].
pub struct RenderRequest {
    pub key: CacheKey,
    /// Region of the full rotated page, in device pixels, to render.
    pub rect: geometry::Rect,
    pub target_width: u32,
    pub target_height: u32,
    pub timestamp: Instant,
    pub abort: std::sync::Arc<std::sync::atomic::AtomicBool>,
    /// Invoked on the worker thread once the request finishes, with `None`
    /// on abort or engine failure. Callers that only want the tile to land
    /// in the cache (the common "paint will re-check the cache" path) leave
    /// this `None`.
    #[allow(clippy::type_complexity)]
    pub on_complete: Option<std::sync::Arc<dyn Fn(Option<std::sync::Arc<engine::Bitmap>>) + Send + Sync>>,
}

impl RenderRequest {
    pub fn new(key: CacheKey, rect: geometry::Rect, target_width: u32, target_height: u32) -> Self {
        RenderRequest {
            key,
            rect,
            target_width,
            target_height,
            timestamp: Instant::now(),
            abort: std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false)),
            on_complete: None,
        }
    }

    pub fn with_completion(mut self, f: impl Fn(Option<std::sync::Arc<engine::Bitmap>>) + Send + Sync + 'static) -> Self {
        self.on_complete = Some(std::sync::Arc::new(f));
        self
    }
}
