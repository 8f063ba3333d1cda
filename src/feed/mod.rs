//! Feed synchronization core: pagination state machine and the marker
//! and polygon projections derived from the item collection.

pub mod projections;
pub mod sync;

pub use projections::{Marker, PolygonOverlay};
pub use sync::{ApplyOutcome, FeedSynchronizer, PageState};
