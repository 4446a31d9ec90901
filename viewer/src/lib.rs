//! Top-level wiring: a [`Session`] ties a shared [`render::RenderSystem`],
//! persisted [`prefs::Store`] and any number of open [`display::DisplayModel`]
//! instances together for a single host process.

mod error;
mod session;

pub use error::ViewerError;
pub use session::{OpenDocument, Session};
