//! Google Trends client exposed through the [`backend::TrendsBackend`] capability.
//!
//! - [`backend`]: the trait sessions are written against
//! - [`client`]: [`GoogleTrendsClient`], the HTTP implementation
//! - [`extract`]: pure helpers that pull widgets and tables out of Google's
//!   JSON (anti-XSSI prefix stripping, widget selection, ranked lists)
//! - [`types`]: raw records returned by the backend
//!
//! The client keeps the explore widgets of the last built payload. Read
//! operations only consult them, so a built client can be shared.
pub mod backend;
pub mod client;
pub mod error;
pub mod extract;
pub mod types;

pub use backend::TrendsBackend;
pub use client::GoogleTrendsClient;
pub use error::{GoogleTrendsError, Result};
pub use types::{
    Category, Coordinates, HistoricalRequest, PayloadRequest, RankedQuery, RankedTopic,
    RawSuggestion, RegionPoint, RelatedMap, RelatedTables, TimelinePoint, TopChartItem, TopicRef,
};

/// Google rejects comparisons of more than five terms.
pub const MAX_KEYWORDS: usize = 5;
