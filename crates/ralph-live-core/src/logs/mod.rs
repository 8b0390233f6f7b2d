//! Client-side log presentation.
//!
//! - **buffer**: ordered master sequence with pause/resume side buffer
//! - **filter**: enabled-level view over the visible sequence
//! - **scroll**: auto-scroll heuristic with burst coalescing
//! - **view**: the three combined for a renderer

mod buffer;
mod filter;
mod scroll;
mod view;

pub use buffer::LogStreamBuffer;
pub use filter::LevelFilter;
pub use scroll::AutoScrollController;
pub use view::LiveLogView;
