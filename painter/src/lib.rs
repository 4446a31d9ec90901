//! Compositing a `DisplayModel`'s visible pages and cached tiles onto an
//! abstract [`Surface`], independent of any particular GUI toolkit.

mod overlay;
mod paint;
mod surface;

pub use overlay::{Overlay, OverlayKind};
pub use paint::paint;
pub use surface::Surface;
