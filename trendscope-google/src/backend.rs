use crate::error::Result;
use crate::types::{
    Category, HistoricalRequest, PayloadRequest, RankedQuery, RankedTopic, RawSuggestion,
    RegionPoint, RelatedMap, TimelinePoint, TopChartItem,
};
use async_trait::async_trait;
use trendscope_common::Resolution;

/// Capability a trends session is written against.
///
/// `build_payload` stores the query that the panel reads
/// (`interest_over_time`, `interest_by_region`, `related_*`) are answered
/// from. The remaining calls are independent of it.
#[async_trait]
pub trait TrendsBackend: Send + Sync {
    /// Submit keywords, category, timeframe, geo and property for later reads.
    async fn build_payload(&mut self, payload: &PayloadRequest) -> Result<()>;

    /// Time-keyed interest of the built payload, in the order Google sent it.
    async fn interest_over_time(&self) -> Result<Vec<TimelinePoint>>;

    /// Hourly interest over an arbitrary range, accumulated across as many
    /// requests as the range needs. Windows are appended in request order and
    /// an hour already returned by an earlier window is not repeated. Does not
    /// replace the built payload.
    async fn historical_interest(&self, request: &HistoricalRequest)
    -> Result<Vec<TimelinePoint>>;

    /// Interest per region, re-sorted by region name rather than kept in
    /// Google's order.
    async fn interest_by_region(
        &self,
        resolution: Resolution,
        include_low_volume: bool,
        include_geo_code: bool,
    ) -> Result<Vec<RegionPoint>>;

    async fn related_topics(&self) -> Result<RelatedMap<RankedTopic>>;

    async fn related_queries(&self) -> Result<RelatedMap<RankedQuery>>;

    /// Daily trending searches. `country` is Google's lowercase name, e.g.
    /// `united_states`.
    async fn trending_searches(&self, country: &str) -> Result<Vec<String>>;

    /// Top chart items for `year` (`YYYY` or `YYYYMM`).
    async fn top_charts(&self, year: u32, geo: &str) -> Result<Vec<TopChartItem>>;

    async fn suggestions(&self, keyword: &str) -> Result<Vec<RawSuggestion>>;

    async fn categories(&self) -> Result<Category>;
}
