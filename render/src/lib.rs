//! The render pipeline: a bounded request queue, a bounded bitmap cache, a
//! single background worker thread that calls into an [`engine::EngineIface`],
//! and `RenderSystem` tying the three together for any number of open
//! documents.

mod cache;
mod error;
mod key;
mod queue;
mod system;
mod visibility;
mod worker;

pub use cache::{always_visible, choose_tile_resolution, BitmapCache, CacheHandle, VisibilityOracle, MAX_ENTRIES};
pub use error::RenderError;
pub use key::{quantize_zoom, CacheKey, DocId, RenderRequest, Tile};
pub use queue::{RenderDelay, RenderQueue, MAX_REQUESTS};
pub use system::RenderSystem;
pub use visibility::RangeVisibility;
pub use worker::RenderWorker;
