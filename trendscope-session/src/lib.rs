//! A configured Google Trends query with typed, validated result tables.
//!
//! A [`TrendsSession`] binds one [`QueryConfig`] to a [`TrendsBackend`] and
//! builds the query payload once, at construction. Every read operation then
//! issues its backend call, checks the result for emptiness and reshapes it
//! into a [`ResultTable`] of operation-specific rows.
//!
//! An empty result is not an error: operations return `Ok(None)` and log the
//! notice `Google trends has returned no results.`.
//!
//! ```no_run
//! use trendscope_common::ClientSettings;
//! use trendscope_session::{QueryConfig, TrendsSession};
//!
//! # async fn demo() -> Result<(), trendscope_session::SessionError> {
//! let config = QueryConfig::new(["pizza", "pasta"], "today 5-y", "US", "en-US")?;
//! let session = TrendsSession::connect(config, &ClientSettings::default()).await?;
//! if let Some(table) = session.interest_over_time().await? {
//!     for row in table.iter() {
//!         println!("{} pizza={:?}", row.datetime, row.value("pizza"));
//!     }
//! }
//! # Ok(()) }
//! ```
pub mod dates;
pub mod error;
pub mod query;
pub mod rows;
pub mod session;
pub mod table;

pub use error::{RelatedKind, RelatedPart, Result, SessionError};
pub use query::{DEFAULT_TIMEFRAME, QueryConfig};
pub use rows::{
    InterestRow, KeywordInterest, RegionRow, RelatedQueriesRow, RelatedTopicsRow, Suggestion,
    TrendingSearch,
};
pub use session::{RegionOptions, TrendsSession};
pub use table::ResultTable;

pub use trendscope_google::{Category, TopChartItem, TrendsBackend};
