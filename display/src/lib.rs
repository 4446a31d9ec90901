//! `DisplayModel`: the layout, navigation, and coordinate-conversion core
//! that sits between a document engine and a host UI. Single-threaded by
//! design; publishes visibility to the render pipeline through a
//! [`render::RangeVisibility`] handle rather than being shared across
//! threads itself.

mod error;
mod layout;
mod model;
mod scroll;

pub use error::DisplayError;
pub use layout::{compute_layout, LayoutParams, LayoutResult};
pub use model::{DisplayModel, LinkAction};
pub use scroll::{NavHistory, ScrollState, NAV_HISTORY_LEN};
