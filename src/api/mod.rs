//! Backend REST surface: client, wire types and the filter-query builder.

mod client;
pub mod query;
pub mod types;

pub use client::{ApiClient, ApiError};
pub use query::{FilterSelection, PickedPoint, DEFAULT_RADIUS_KM};
pub use types::{FeedItem, FilterOptions, Location, PolygonGeometry, Source};
