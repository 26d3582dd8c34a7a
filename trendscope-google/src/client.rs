//! HTTP implementation of [`TrendsBackend`] against trends.google.com.
//!
//! Construction primes the cookie jar (Google answers 429 to cookieless
//! widget calls). `build_payload` fetches the explore widgets once and every
//! panel read replays the stored widget request with its token.
use crate::MAX_KEYWORDS;
use crate::backend::TrendsBackend;
use crate::error::{GoogleTrendsError, Result};
use crate::extract::{
    Widget, WidgetSet, decode_guarded, parse_geo_map, parse_related_queries,
    parse_related_topics, parse_timeline, related_widget_keyword,
};
use crate::types::{
    Category, HistoricalRequest, PayloadRequest, RankedQuery, RankedTopic, RawSuggestion,
    RegionPoint, RelatedMap, RelatedTables, TimelinePoint, TopChartItem,
};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use serde_json::json;
use std::borrow::Cow;
use std::collections::HashMap;
use std::time::Instant;
use tokio::time::sleep;
use trendscope_common::{ClientSettings, Resolution};
use trendscope_http::{ClientOptions, HttpClient, HttpError, RequestOpts};

const EXPLORE_PATH: &str = "trends/api/explore";
const MULTILINE_PATH: &str = "trends/api/widgetdata/multiline";
const COMPARED_GEO_PATH: &str = "trends/api/widgetdata/comparedgeo";
const RELATED_SEARCHES_PATH: &str = "trends/api/widgetdata/relatedsearches";
const TRENDING_SEARCHES_PATH: &str = "trends/hottrends/visualize/internal/data";
const TOP_CHARTS_PATH: &str = "trends/api/topcharts";
const SUGGESTIONS_PATH: &str = "trends/api/autocomplete/";
const CATEGORIES_PATH: &str = "trends/api/explore/pickers/category";

/// Hourly data is only served for windows of at most a week.
const HOURLY_WINDOW_DAYS: i64 = 7;
const HOURLY_TIMEFRAME_FORMAT: &str = "%Y-%m-%dT%H";

pub struct GoogleTrendsClient {
    http: HttpClient,
    host_language: String,
    timezone_offset: i32,
    payload: Option<PayloadRequest>,
    widgets: WidgetSet,
}

impl GoogleTrendsClient {
    /// Build the HTTP client from `settings` and prime Google's cookies.
    pub async fn connect(host_language: &str, settings: &ClientSettings) -> Result<Self> {
        let http = HttpClient::with_options(
            &settings.base_url,
            ClientOptions {
                connect_timeout: settings.connect_timeout(),
                timeout: settings.read_timeout(),
                max_retries: settings.retries,
                backoff: settings.backoff(),
                proxy: settings.proxy.clone(),
                cookie_store: true,
            },
        )?;
        let client = Self {
            http,
            host_language: host_language.to_string(),
            timezone_offset: settings.timezone_offset,
            payload: None,
            widgets: WidgetSet::default(),
        };
        client.prime_cookies().await?;
        Ok(client)
    }

    async fn prime_cookies(&self) -> Result<()> {
        let geo = cookie_geo(&self.host_language);
        let started = Instant::now();
        self.http
            .get_text(
                "",
                RequestOpts {
                    query: Some(vec![("geo", Cow::Owned(geo.clone()))]),
                    ..Default::default()
                },
            )
            .await?;
        tracing::debug!(
            target: "trends.google",
            geo = %geo,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "google.cookies.primed"
        );
        Ok(())
    }

    fn tz_param(&self) -> Cow<'static, str> {
        Cow::Owned(self.timezone_offset.to_string())
    }

    async fn fetch_widgets(&self, payload: &PayloadRequest) -> Result<WidgetSet> {
        validate_payload(payload)?;
        let req = explore_request(payload);
        let started = Instant::now();
        let body = self
            .http
            .get_text(
                EXPLORE_PATH,
                RequestOpts {
                    query: Some(vec![
                        ("hl", Cow::Borrowed(self.host_language.as_str())),
                        ("tz", self.tz_param()),
                        ("req", Cow::Owned(req.to_string())),
                    ]),
                    ..Default::default()
                },
            )
            .await?;
        let widgets = WidgetSet::parse(&body)?;
        tracing::debug!(
            target: "trends.google",
            keywords = ?payload.keywords,
            timeframe = %payload.timeframe,
            related_topics = widgets.related_topics.len(),
            related_queries = widgets.related_queries.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "google.explore.widgets"
        );
        Ok(widgets)
    }

    async fn fetch_widget_data(&self, path: &str, widget: &Widget) -> Result<String> {
        let body = self
            .http
            .get_text(
                path,
                RequestOpts {
                    query: Some(vec![
                        ("req", Cow::Owned(widget.request.to_string())),
                        ("token", Cow::Borrowed(widget.token.as_str())),
                        ("tz", self.tz_param()),
                    ]),
                    ..Default::default()
                },
            )
            .await?;
        Ok(body)
    }

    async fn fetch_timeline(&self, widgets: &WidgetSet) -> Result<Vec<TimelinePoint>> {
        let widget = widgets
            .interest_over_time
            .as_ref()
            .ok_or(GoogleTrendsError::MissingWidget("TIMESERIES"))?;
        let body = self.fetch_widget_data(MULTILINE_PATH, widget).await?;
        parse_timeline(&body)
    }

    async fn fetch_related<T, F>(&self, widgets: &[Widget], parse: F) -> Result<RelatedMap<T>>
    where
        T: Send,
        F: Fn(&str) -> Result<RelatedTables<T>> + Send + Sync,
    {
        let mut out = HashMap::with_capacity(widgets.len());
        for widget in widgets {
            let keyword = related_widget_keyword(widget);
            let body = self.fetch_widget_data(RELATED_SEARCHES_PATH, widget).await?;
            out.insert(keyword, parse(&body)?);
        }
        Ok(out)
    }

    fn lang_query(&self) -> Vec<(&str, Cow<'_, str>)> {
        vec![("hl", Cow::Borrowed(self.host_language.as_str()))]
    }
}

#[async_trait]
impl TrendsBackend for GoogleTrendsClient {
    async fn build_payload(&mut self, payload: &PayloadRequest) -> Result<()> {
        let widgets = self.fetch_widgets(payload).await?;
        self.widgets = widgets;
        self.payload = Some(payload.clone());
        Ok(())
    }

    async fn interest_over_time(&self) -> Result<Vec<TimelinePoint>> {
        self.fetch_timeline(&self.widgets).await
    }

    async fn historical_interest(
        &self,
        request: &HistoricalRequest,
    ) -> Result<Vec<TimelinePoint>> {
        let start = hour_of(
            request.year_start,
            request.month_start,
            request.day_start,
            request.hour_start,
        )?;
        let end = hour_of(
            request.year_end,
            request.month_end,
            request.day_end,
            request.hour_end,
        )?;
        if end < start {
            return Err(GoogleTrendsError::InvalidPayload(format!(
                "historical range ends ({end}) before it starts ({start})"
            )));
        }

        let windows = hourly_windows(start, end);
        let mut points: Vec<TimelinePoint> = Vec::new();
        let mut fetched = 0usize;
        let mut last_err = None;

        for (idx, (from, to)) in windows.iter().enumerate() {
            if idx > 0 && !request.delay.is_zero() {
                sleep(request.delay).await;
            }
            let payload = PayloadRequest {
                keywords: request.keywords.clone(),
                category: request.category,
                timeframe: format!(
                    "{} {}",
                    from.format(HOURLY_TIMEFRAME_FORMAT),
                    to.format(HOURLY_TIMEFRAME_FORMAT)
                ),
                geo: request.geo.clone(),
                search_property: request.search_property,
            };
            let window = match self.fetch_widgets(&payload).await {
                Ok(widgets) => self.fetch_timeline(&widgets).await,
                Err(e) => Err(e),
            };
            match window {
                Ok(mut window) => {
                    fetched += 1;
                    let last = points.last().map(|p| p.time);
                    window.retain(|p| last.is_none_or(|last| p.time > last));
                    points.append(&mut window);
                }
                Err(e) => {
                    tracing::warn!(
                        target: "trends.google",
                        timeframe = %payload.timeframe,
                        error = %e,
                        "google.historical.window_failed"
                    );
                    last_err = Some(e);
                }
            }
        }

        if fetched == 0 {
            if let Some(e) = last_err {
                return Err(e);
            }
        }

        let (start, end) = (start.and_utc(), end.and_utc());
        points.retain(|p| p.time >= start && p.time <= end);
        tracing::debug!(
            target: "trends.google",
            windows = windows.len(),
            fetched,
            points = points.len(),
            "google.historical.done"
        );
        Ok(points)
    }

    async fn interest_by_region(
        &self,
        resolution: Resolution,
        include_low_volume: bool,
        include_geo_code: bool,
    ) -> Result<Vec<RegionPoint>> {
        let mut widget = self
            .widgets
            .interest_by_region
            .clone()
            .ok_or(GoogleTrendsError::MissingWidget("GEO_MAP"))?;
        let geo = self.payload.as_ref().map(|p| p.geo.as_str()).unwrap_or("");
        if let Some(req) = widget.request.as_object_mut() {
            if resolution_applies(geo, resolution) {
                req.insert("resolution".to_string(), json!(resolution.as_param()));
            }
            req.insert(
                "includeLowSearchVolumeGeos".to_string(),
                json!(include_low_volume),
            );
        }
        let body = self.fetch_widget_data(COMPARED_GEO_PATH, &widget).await?;
        parse_geo_map(&body, include_geo_code)
    }

    async fn related_topics(&self) -> Result<RelatedMap<RankedTopic>> {
        self.fetch_related(&self.widgets.related_topics, parse_related_topics)
            .await
    }

    async fn related_queries(&self) -> Result<RelatedMap<RankedQuery>> {
        self.fetch_related(&self.widgets.related_queries, parse_related_queries)
            .await
    }

    async fn trending_searches(&self, country: &str) -> Result<Vec<String>> {
        let body = self
            .http
            .get_text(TRENDING_SEARCHES_PATH, RequestOpts::default())
            .await?;
        let mut by_country: HashMap<String, Vec<String>> =
            decode_guarded("trending searches", &body)?;
        by_country
            .remove(country)
            .ok_or_else(|| GoogleTrendsError::UnknownCountry(country.to_string()))
    }

    async fn top_charts(&self, year: u32, geo: &str) -> Result<Vec<TopChartItem>> {
        #[derive(Deserialize)]
        struct TopChartsResponse {
            #[serde(rename = "topCharts", default)]
            top_charts: Vec<TopChart>,
        }
        #[derive(Deserialize)]
        struct TopChart {
            #[serde(rename = "listItems", default)]
            list_items: Vec<TopChartItem>,
        }

        let geo = if geo.trim().is_empty() { "GLOBAL" } else { geo };
        let body = self
            .http
            .get_text(
                TOP_CHARTS_PATH,
                RequestOpts {
                    query: Some(vec![
                        ("hl", Cow::Borrowed(self.host_language.as_str())),
                        ("tz", self.tz_param()),
                        ("date", Cow::Owned(year.to_string())),
                        ("geo", Cow::Borrowed(geo)),
                        ("isMobile", Cow::Borrowed("false")),
                    ]),
                    ..Default::default()
                },
            )
            .await?;
        let resp: TopChartsResponse = decode_guarded("topcharts", &body)?;
        Ok(resp
            .top_charts
            .into_iter()
            .next()
            .map(|chart| chart.list_items)
            .unwrap_or_default())
    }

    async fn suggestions(&self, keyword: &str) -> Result<Vec<RawSuggestion>> {
        #[derive(Deserialize)]
        struct Envelope {
            default: Topics,
        }
        #[derive(Deserialize)]
        struct Topics {
            #[serde(default)]
            topics: Vec<RawSuggestion>,
        }

        let mut url = self
            .http
            .base()
            .join(SUGGESTIONS_PATH)
            .map_err(|e| HttpError::Url(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| HttpError::Url("trends base URL cannot be a base".into()))?
            .pop_if_empty()
            .push(keyword);
        let body = self
            .http
            .get_text(
                url.as_str(),
                RequestOpts {
                    query: Some(self.lang_query()),
                    allow_absolute: true,
                    ..Default::default()
                },
            )
            .await?;
        let env: Envelope = decode_guarded("autocomplete", &body)?;
        Ok(env.default.topics)
    }

    async fn categories(&self) -> Result<Category> {
        let body = self
            .http
            .get_text(
                CATEGORIES_PATH,
                RequestOpts {
                    query: Some(self.lang_query()),
                    ..Default::default()
                },
            )
            .await?;
        decode_guarded("category picker", &body)
    }
}

// ==============================
// Helpers
// ==============================

fn validate_payload(payload: &PayloadRequest) -> Result<()> {
    if payload.keywords.is_empty() {
        return Err(GoogleTrendsError::InvalidPayload(
            "keyword list is empty".into(),
        ));
    }
    if payload.keywords.len() > MAX_KEYWORDS {
        return Err(GoogleTrendsError::InvalidPayload(format!(
            "keyword list is too long ({} > {MAX_KEYWORDS})",
            payload.keywords.len()
        )));
    }
    Ok(())
}

/// JSON carried in the explore `req` parameter.
fn explore_request(payload: &PayloadRequest) -> serde_json::Value {
    let items: Vec<_> = payload
        .keywords
        .iter()
        .map(|kw| json!({ "keyword": kw, "time": payload.timeframe, "geo": payload.geo }))
        .collect();
    json!({
        "comparisonItem": items,
        "category": payload.category,
        "property": payload.search_property.as_param(),
    })
}

/// Country used for cookie priming: the region subtag of the host language.
fn cookie_geo(host_language: &str) -> String {
    let chars: Vec<char> = host_language.chars().collect();
    let tail: String = chars[chars.len().saturating_sub(2)..].iter().collect();
    tail.to_ascii_uppercase()
}

/// Google only honours a resolution for world queries, or for the US at
/// sub-national levels.
fn resolution_applies(geo: &str, resolution: Resolution) -> bool {
    geo.is_empty()
        || (geo == "US"
            && matches!(
                resolution,
                Resolution::Dma | Resolution::City | Resolution::Region
            ))
}

fn hour_of(year: i32, month: u32, day: u32, hour: u32) -> Result<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, 0, 0))
        .ok_or_else(|| {
            GoogleTrendsError::InvalidPayload(format!(
                "invalid date/hour {year:04}-{month:02}-{day:02}T{hour:02}"
            ))
        })
}

/// Week-long windows starting at `start` until one reaches `end`.
fn hourly_windows(start: NaiveDateTime, end: NaiveDateTime) -> Vec<(NaiveDateTime, NaiveDateTime)> {
    let step = ChronoDuration::days(HOURLY_WINDOW_DAYS);
    let mut windows = Vec::new();
    let mut from = start;
    loop {
        let to = from + step;
        windows.push((from, to));
        if to >= end {
            break;
        }
        from = to;
    }
    windows
}
