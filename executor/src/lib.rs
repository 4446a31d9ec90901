//! A small, dependency-free background task executor.
//!
//! `render`'s `RenderSystem` uses the single-priority [`exec::Executor`] to
//! host its one background render thread (`RenderQueue` already orders
//! requests by priority, so the pool itself only ever runs one task at a
//! time). The multi-priority [`priority::Executor`] is kept as the
//! general-purpose building block this workspace's render pipeline is
//! grounded on, and is exercised directly by its own tests.

mod common;
mod handle;

pub mod exec;
pub mod priority;

pub use common::Monitor;
pub use handle::{DropHandle, Handle};
