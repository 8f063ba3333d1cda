//! Terminal user interface.
//!
//! # Module Structure
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `input` - Keyboard input handling
//! - `events` - Background task event processing
//! - `render` - Layout and render dispatch
//! - `helpers` - Task spawners and shared formatting
//! - `map` - Map canvas widget
//! - `feed_list` - Report feed widget
//! - `detail` - Selected-report overlay
//! - `filters` - Filter panel overlay
//! - `chat` - Assistant transcript widget
//! - `status` - Status bar widget

mod chat;
mod detail;
mod events;
mod feed_list;
mod filters;
mod helpers;
mod input;
mod loop_runner;
mod map;
mod render;
mod status;

pub use loop_runner::{run, Action};
