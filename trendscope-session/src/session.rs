use crate::dates::{check_hour, parse_date_parts};
use crate::error::{RelatedKind, RelatedPart, Result, SessionError};
use crate::query::QueryConfig;
use crate::rows::{
    InterestRow, RegionRow, RelatedQueriesRow, RelatedTopicsRow, Suggestion, TrendingSearch,
    side_by_side, zip_keywords,
};
use crate::table::{ResultTable, check_if_valid};
use std::time::{Duration, Instant};
use trendscope_common::{ClientSettings, Resolution};
use trendscope_google::{
    Category, GoogleTrendsClient, HistoricalRequest, RelatedMap, RelatedTables, TimelinePoint,
    TopChartItem, TrendsBackend,
};

const RELATED_TOPICS_NOTICE: &str = "No results for Related topics";
const RELATED_QUERIES_NOTICE: &str = "No results for Related queries";

/// Flags for [`TrendsSession::interest_by_region`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionOptions {
    /// Include regions Google flags as low search volume.
    pub include_low_volume: bool,
    /// Add ISO codes (or coordinates for cities) next to region names.
    pub include_geo_code: bool,
}

impl Default for RegionOptions {
    fn default() -> Self {
        Self {
            include_low_volume: false,
            include_geo_code: true,
        }
    }
}

/// A query bound to a backend whose payload was built at construction.
pub struct TrendsSession<B = GoogleTrendsClient> {
    config: QueryConfig,
    backend: B,
}

impl TrendsSession<GoogleTrendsClient> {
    /// Connect to Google Trends and build the payload for `config`.
    pub async fn connect(config: QueryConfig, settings: &ClientSettings) -> Result<Self> {
        let backend = GoogleTrendsClient::connect(config.host_language(), settings).await?;
        Self::with_backend(config, backend).await
    }
}

impl<B: TrendsBackend> TrendsSession<B> {
    pub async fn with_backend(config: QueryConfig, mut backend: B) -> Result<Self> {
        let started = Instant::now();
        backend.build_payload(&config.payload()).await?;
        tracing::info!(
            target: "trends.session",
            keywords = ?config.keywords(),
            timeframe = %config.timeframe(),
            geo = %config.geo(),
            category = config.category(),
            property = %config.search_property(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "session.payload.built"
        );
        Ok(Self { config, backend })
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Interest over the configured timeframe, one row per time bucket.
    pub async fn interest_over_time(&self) -> Result<Option<ResultTable<InterestRow>>> {
        let points = self.backend.interest_over_time().await?;
        let rows = self.timeline_rows("interest_over_time", points)?;
        Ok(check_if_valid("interest_over_time", rows))
    }

    /// Hourly interest from `start_date` 00h to `end_date` 01h.
    pub async fn historical_hourly_interest(
        &self,
        start_date: &str,
        end_date: &str,
    ) -> Result<Option<ResultTable<InterestRow>>> {
        self.historical_hourly_interest_between(start_date, end_date, 0, 1)
            .await
    }

    /// Hourly interest over `start_date`T`hour_start` ..= `end_date`T`hour_end`.
    ///
    /// Dates are `YYYY-MM-DD`. The backend walks the range in as many requests
    /// as it needs, with no pause between them.
    pub async fn historical_hourly_interest_between(
        &self,
        start_date: &str,
        end_date: &str,
        hour_start: u32,
        hour_end: u32,
    ) -> Result<Option<ResultTable<InterestRow>>> {
        let start = parse_date_parts(start_date)?;
        let end = parse_date_parts(end_date)?;
        let request = HistoricalRequest {
            keywords: self.config.keywords().to_vec(),
            year_start: start.year,
            month_start: start.month,
            day_start: start.day,
            hour_start: check_hour(hour_start)?,
            year_end: end.year,
            month_end: end.month,
            day_end: end.day,
            hour_end: check_hour(hour_end)?,
            category: self.config.category(),
            geo: self.config.geo().to_string(),
            search_property: self.config.search_property(),
            delay: Duration::ZERO,
        };

        let points = self.backend.historical_interest(&request).await?;
        let rows = self.timeline_rows("historical_hourly_interest", points)?;
        Ok(check_if_valid("historical_hourly_interest", rows))
    }

    pub async fn interest_by_region(
        &self,
        resolution: Resolution,
        options: RegionOptions,
    ) -> Result<Option<ResultTable<RegionRow>>> {
        let points = self
            .backend
            .interest_by_region(
                resolution,
                options.include_low_volume,
                options.include_geo_code,
            )
            .await?;

        let keywords = self.config.keywords();
        let mut rows = Vec::with_capacity(points.len());
        for point in points {
            ensure_width("interest_by_region", keywords.len(), point.values.len())?;
            rows.push(RegionRow {
                geo_name: point.geo_name,
                geo_code: point.geo_code,
                coordinates: point.coordinates,
                interest: zip_keywords(keywords, point.values),
            });
        }
        Ok(check_if_valid("interest_by_region", rows))
    }

    /// Top and rising topics of the primary keyword.
    pub async fn related_topics(&self) -> Result<Option<ResultTable<RelatedTopicsRow>>> {
        let panels = self.backend.related_topics().await?;
        let (top, rising) = self.primary_tables(RelatedKind::Topics, panels)?;
        let rows = side_by_side(top, rising, RelatedTopicsRow::compose);
        Ok(check_if_valid("related_topics", rows))
    }

    /// Top and rising queries of the primary keyword.
    ///
    /// `category` is accepted for call-site compatibility and not forwarded;
    /// the session's own category applies.
    pub async fn related_queries(
        &self,
        category: Option<u32>,
    ) -> Result<Option<ResultTable<RelatedQueriesRow>>> {
        if let Some(category) = category.filter(|c| *c != 0) {
            tracing::debug!(
                target: "trends.session",
                category,
                session_category = self.config.category(),
                "session.related_queries.category_ignored"
            );
        }
        let panels = self.backend.related_queries().await?;
        let (top, rising) = self.primary_tables(RelatedKind::Queries, panels)?;
        let rows = side_by_side(top, rising, RelatedQueriesRow::compose);
        Ok(check_if_valid("related_queries", rows))
    }

    /// Today's trending searches for `country` (e.g. `united_states`).
    pub async fn trending_searches(
        &self,
        country: &str,
    ) -> Result<Option<ResultTable<TrendingSearch>>> {
        let rows = self
            .backend
            .trending_searches(country)
            .await?
            .into_iter()
            .map(|query| TrendingSearch { query })
            .collect();
        Ok(check_if_valid("trending_searches", rows))
    }

    /// Top chart items for `year` (`YYYY` or `YYYYMM`) in the session's geo.
    pub async fn top_charts(&self, year: u32) -> Result<Option<ResultTable<TopChartItem>>> {
        let rows = self.backend.top_charts(year, self.config.geo()).await?;
        Ok(check_if_valid("top_charts", rows))
    }

    /// Refinements Google offers for the primary keyword.
    pub async fn suggestions(&self) -> Result<Option<ResultTable<Suggestion>>> {
        let rows = self
            .backend
            .suggestions(self.config.primary_keyword())
            .await?
            .into_iter()
            .map(Suggestion::from)
            .collect();
        Ok(check_if_valid("suggestions", rows))
    }

    /// Google's category taxonomy, as returned.
    pub async fn categories(&self) -> Result<Category> {
        Ok(self.backend.categories().await?)
    }

    fn timeline_rows(
        &self,
        operation: &'static str,
        points: Vec<TimelinePoint>,
    ) -> Result<Vec<InterestRow>> {
        let keywords = self.config.keywords();
        points
            .into_iter()
            .map(|point| {
                ensure_width(operation, keywords.len(), point.values.len())?;
                Ok(InterestRow {
                    datetime: point.time,
                    interest: zip_keywords(keywords, point.values),
                    is_partial: point.is_partial,
                })
            })
            .collect()
    }

    /// Pull the primary keyword's panel apart, or report what is missing.
    /// Two empty lists are not an error but still get the related notice.
    fn primary_tables<T>(
        &self,
        kind: RelatedKind,
        mut panels: RelatedMap<T>,
    ) -> Result<(Vec<T>, Vec<T>)> {
        let keyword = self.config.primary_keyword();
        let notice = related_notice(kind);
        let missing = |part: RelatedPart| {
            tracing::warn!(
                target: "trends.session",
                keyword = %keyword,
                missing = %part,
                "{notice}"
            );
            SessionError::IncompleteRelatedData {
                kind,
                keyword: keyword.to_string(),
                missing: part,
            }
        };

        let RelatedTables { top, rising } = panels
            .remove(keyword)
            .ok_or_else(|| missing(RelatedPart::Keyword))?;
        let rising = rising.ok_or_else(|| missing(RelatedPart::Rising))?;
        let top = top.ok_or_else(|| missing(RelatedPart::Top))?;
        if top.is_empty() && rising.is_empty() {
            tracing::warn!(target: "trends.session", keyword = %keyword, "{notice}");
        }
        Ok((top, rising))
    }
}

fn related_notice(kind: RelatedKind) -> &'static str {
    match kind {
        RelatedKind::Topics => RELATED_TOPICS_NOTICE,
        RelatedKind::Queries => RELATED_QUERIES_NOTICE,
    }
}

fn ensure_width(operation: &'static str, expected: usize, got: usize) -> Result<()> {
    if expected != got {
        return Err(SessionError::SchemaMismatch {
            operation,
            expected,
            got,
        });
    }
    Ok(())
}
