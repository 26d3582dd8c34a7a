use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, Mutex};
use trendscope_common::Resolution;
use trendscope_google::{
    Category, GoogleTrendsError, HistoricalRequest, PayloadRequest, RankedQuery, RankedTopic,
    RawSuggestion, RegionPoint, RelatedMap, RelatedTables, TimelinePoint, TopChartItem, TopicRef,
    TrendsBackend,
};
use trendscope_session::{
    QueryConfig, RegionOptions, RelatedKind, RelatedPart, SessionError, TrendsSession,
};

#[derive(Default)]
struct FakeBackend {
    built: Option<PayloadRequest>,
    reject_payload: bool,
    timeline: Vec<TimelinePoint>,
    regions: Vec<RegionPoint>,
    topics: RelatedMap<RankedTopic>,
    queries: RelatedMap<RankedQuery>,
    trending: Vec<String>,
    charts: Vec<TopChartItem>,
    suggestions: Vec<RawSuggestion>,
    historical: Mutex<Option<HistoricalRequest>>,
    region_args: Mutex<Option<(Resolution, bool, bool)>>,
    chart_args: Mutex<Option<(u32, String)>>,
    suggestion_arg: Mutex<Option<String>>,
}

#[async_trait]
impl TrendsBackend for FakeBackend {
    async fn build_payload(&mut self, payload: &PayloadRequest) -> trendscope_google::Result<()> {
        if self.reject_payload {
            return Err(GoogleTrendsError::InvalidPayload("rejected".into()));
        }
        self.built = Some(payload.clone());
        Ok(())
    }

    async fn interest_over_time(&self) -> trendscope_google::Result<Vec<TimelinePoint>> {
        Ok(self.timeline.clone())
    }

    async fn historical_interest(
        &self,
        request: &HistoricalRequest,
    ) -> trendscope_google::Result<Vec<TimelinePoint>> {
        *self.historical.lock().unwrap() = Some(request.clone());
        Ok(self.timeline.clone())
    }

    async fn interest_by_region(
        &self,
        resolution: Resolution,
        include_low_volume: bool,
        include_geo_code: bool,
    ) -> trendscope_google::Result<Vec<RegionPoint>> {
        *self.region_args.lock().unwrap() =
            Some((resolution, include_low_volume, include_geo_code));
        Ok(self.regions.clone())
    }

    async fn related_topics(&self) -> trendscope_google::Result<RelatedMap<RankedTopic>> {
        Ok(self.topics.clone())
    }

    async fn related_queries(&self) -> trendscope_google::Result<RelatedMap<RankedQuery>> {
        Ok(self.queries.clone())
    }

    async fn trending_searches(&self, _country: &str) -> trendscope_google::Result<Vec<String>> {
        Ok(self.trending.clone())
    }

    async fn top_charts(
        &self,
        year: u32,
        geo: &str,
    ) -> trendscope_google::Result<Vec<TopChartItem>> {
        *self.chart_args.lock().unwrap() = Some((year, geo.to_string()));
        Ok(self.charts.clone())
    }

    async fn suggestions(&self, keyword: &str) -> trendscope_google::Result<Vec<RawSuggestion>> {
        *self.suggestion_arg.lock().unwrap() = Some(keyword.to_string());
        Ok(self.suggestions.clone())
    }

    async fn categories(&self) -> trendscope_google::Result<Category> {
        Ok(Category {
            name: "All categories".into(),
            id: 0,
            children: vec![Category {
                name: "Food & Drink".into(),
                id: 71,
                children: Vec::new(),
            }],
        })
    }
}

#[derive(Clone)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Route events on this thread into a buffer until the guard drops.
fn capture_logs() -> (LogBuffer, tracing::subscriber::DefaultGuard) {
    let buffer = LogBuffer(Arc::new(Mutex::new(Vec::new())));
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();
    (buffer, tracing::subscriber::set_default(subscriber))
}

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

fn config() -> QueryConfig {
    QueryConfig::new(["pizza", "pasta"], "today 3-m", "US", "en-US").unwrap()
}

async fn session(backend: FakeBackend) -> TrendsSession<FakeBackend> {
    TrendsSession::with_backend(config(), backend).await.unwrap()
}

fn point(hour: u32, values: Vec<u32>) -> TimelinePoint {
    TimelinePoint {
        time: Utc.with_ymd_and_hms(2023, 1, 1, hour, 0, 0).unwrap(),
        values,
        is_partial: false,
    }
}

fn topic(title: &str, value: i64) -> RankedTopic {
    RankedTopic {
        topic: TopicRef {
            mid: format!("/m/{title}"),
            title: title.into(),
            kind: "Topic".into(),
        },
        value,
        formatted_value: value.to_string(),
        has_data: true,
        link: String::new(),
    }
}

fn query(text: &str, value: i64) -> RankedQuery {
    RankedQuery {
        query: text.into(),
        value,
        formatted_value: value.to_string(),
        has_data: true,
        link: String::new(),
    }
}

#[tokio::test]
async fn construction_builds_payload_from_config() {
    let s = session(FakeBackend::default()).await;
    let built = s.backend().built.as_ref().unwrap();
    assert_eq!(built.keywords, vec!["pizza", "pasta"]);
    assert_eq!(built.timeframe, "today 3-m");
    assert_eq!(built.geo, "US");
}

#[tokio::test]
async fn rejected_payload_fails_construction() {
    let backend = FakeBackend {
        reject_payload: true,
        ..Default::default()
    };
    let err = TrendsSession::with_backend(config(), backend)
        .await
        .err()
        .unwrap();
    assert!(matches!(
        err,
        SessionError::Backend(GoogleTrendsError::InvalidPayload(_))
    ));
}

#[tokio::test]
async fn every_table_operation_returns_none_on_empty() {
    let s = session(FakeBackend::default()).await;
    assert!(s.interest_over_time().await.unwrap().is_none());
    assert!(
        s.historical_hourly_interest("2023-01-01", "2023-01-02")
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        s.interest_by_region(Resolution::Country, RegionOptions::default())
            .await
            .unwrap()
            .is_none()
    );
    assert!(s.trending_searches("united_states").await.unwrap().is_none());
    assert!(s.top_charts(2023).await.unwrap().is_none());
    assert!(s.suggestions().await.unwrap().is_none());
}

#[tokio::test]
async fn interest_over_time_keeps_datetime_and_row_count() {
    let backend = FakeBackend {
        timeline: vec![point(0, vec![10, 20]), point(1, vec![30, 40])],
        ..Default::default()
    };
    let s = session(backend).await;
    let table = s.interest_over_time().await.unwrap().unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(
        table.rows()[1].datetime,
        Utc.with_ymd_and_hms(2023, 1, 1, 1, 0, 0).unwrap()
    );
    assert_eq!(table.rows()[1].value("pasta"), Some(40));
}

#[tokio::test]
async fn timeline_width_mismatch_is_reported() {
    let backend = FakeBackend {
        timeline: vec![point(0, vec![10])],
        ..Default::default()
    };
    let s = session(backend).await;
    let err = s.interest_over_time().await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::SchemaMismatch {
            expected: 2,
            got: 1,
            ..
        }
    ));
}

#[tokio::test]
async fn historical_dates_are_decomposed() {
    let backend = FakeBackend {
        timeline: vec![point(0, vec![1, 2])],
        ..Default::default()
    };
    let s = session(backend).await;
    let table = s
        .historical_hourly_interest("2023-01-01", "2023-01-02")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(table.len(), 1);

    let request = s.backend().historical.lock().unwrap().clone().unwrap();
    assert_eq!(
        (
            request.year_start,
            request.month_start,
            request.day_start,
            request.hour_start
        ),
        (2023, 1, 1, 0)
    );
    assert_eq!(
        (
            request.year_end,
            request.month_end,
            request.day_end,
            request.hour_end
        ),
        (2023, 1, 2, 1)
    );
    assert!(request.delay.is_zero());
    assert_eq!(request.geo, "US");
}

#[tokio::test]
async fn invalid_dates_fail_before_request() {
    let s = session(FakeBackend::default()).await;
    let err = s
        .historical_hourly_interest("2023-13-01", "2023-01-02")
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::InvalidDate { .. }));
    let err = s
        .historical_hourly_interest_between("2023-01-01", "2023-01-02", 0, 24)
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::InvalidHour(24)));
    assert!(s.backend().historical.lock().unwrap().is_none());
}

#[tokio::test]
async fn region_rows_carry_geo_name_and_forward_options() {
    let backend = FakeBackend {
        regions: vec![RegionPoint {
            geo_name: "Alabama".into(),
            geo_code: Some("US-AL".into()),
            coordinates: None,
            values: vec![70, 30],
        }],
        ..Default::default()
    };
    let s = session(backend).await;
    let table = s
        .interest_by_region(Resolution::Region, RegionOptions::default())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(table.rows()[0].geo_name, "Alabama");
    assert_eq!(table.rows()[0].value("pizza"), Some(70));
    assert_eq!(
        *s.backend().region_args.lock().unwrap(),
        Some((Resolution::Region, false, true))
    );
}

#[tokio::test]
async fn related_topics_compose_top_and_rising() {
    let mut topics = HashMap::new();
    topics.insert(
        "pizza".to_string(),
        RelatedTables {
            top: Some(vec![topic("Pizza", 100), topic("Cheese", 40)]),
            rising: Some(vec![topic("Detroit-style pizza", 250)]),
        },
    );
    let backend = FakeBackend {
        topics,
        ..Default::default()
    };
    let s = session(backend).await;
    let table = s.related_topics().await.unwrap().unwrap();
    assert_eq!(table.len(), 2);
    let first = &table.rows()[0];
    assert_eq!(first.value_top, Some(100));
    assert_eq!(first.value_rising, Some(250));
    assert_eq!(table.rows()[1].topic_title_rising, None);

    let json = serde_json::to_value(&table).unwrap();
    let row = json[0].as_object().unwrap();
    assert!(!row.contains_key("link"));
    assert!(!row.contains_key("topic_mid"));
}

#[tokio::test]
async fn related_topics_missing_keyword_is_incomplete() {
    let s = session(FakeBackend::default()).await;
    let err = s.related_topics().await.unwrap_err();
    match err {
        SessionError::IncompleteRelatedData {
            kind,
            keyword,
            missing,
        } => {
            assert_eq!(kind, RelatedKind::Topics);
            assert_eq!(keyword, "pizza");
            assert_eq!(missing, RelatedPart::Keyword);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn related_queries_missing_rising_is_incomplete() {
    let mut queries = HashMap::new();
    queries.insert(
        "pizza".to_string(),
        RelatedTables {
            top: Some(vec![query("pizza near me", 100)]),
            rising: None,
        },
    );
    let backend = FakeBackend {
        queries,
        ..Default::default()
    };
    let s = session(backend).await;
    let err = s.related_queries(None).await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::IncompleteRelatedData {
            kind: RelatedKind::Queries,
            missing: RelatedPart::Rising,
            ..
        }
    ));
}

#[tokio::test]
async fn related_queries_columns() {
    let mut queries = HashMap::new();
    queries.insert(
        "pizza".to_string(),
        RelatedTables {
            top: Some(vec![query("pizza near me", 100)]),
            rising: Some(vec![query("pizza day", 300), query("pizza oven", 120)]),
        },
    );
    let backend = FakeBackend {
        queries,
        ..Default::default()
    };
    let s = session(backend).await;
    let table = s.related_queries(Some(71)).await.unwrap().unwrap();
    assert_eq!(table.len(), 2);

    let json = serde_json::to_value(&table).unwrap();
    let mut keys: Vec<_> = json[0].as_object().unwrap().keys().cloned().collect();
    keys.sort();
    assert_eq!(
        keys,
        vec!["rising_query", "rising_value", "top_query", "top_value"]
    );
    assert!(json[1]["top_query"].is_null());
    assert_eq!(json[1]["rising_query"], "pizza oven");
}

#[tokio::test]
async fn empty_related_panels_yield_none() {
    let mut queries = HashMap::new();
    queries.insert(
        "pizza".to_string(),
        RelatedTables {
            top: Some(Vec::new()),
            rising: Some(Vec::new()),
        },
    );
    let backend = FakeBackend {
        queries,
        ..Default::default()
    };
    let s = session(backend).await;
    let (logs, _guard) = capture_logs();
    assert!(s.related_queries(None).await.unwrap().is_none());
    let logs = logs.contents();
    assert!(logs.contains("No results for Related queries"), "{logs}");
    assert!(logs.contains("Google trends has returned no results."), "{logs}");
}

#[tokio::test]
async fn empty_related_topics_emit_related_notice() {
    let mut topics = HashMap::new();
    topics.insert(
        "pizza".to_string(),
        RelatedTables {
            top: Some(Vec::new()),
            rising: Some(Vec::new()),
        },
    );
    let backend = FakeBackend {
        topics,
        ..Default::default()
    };
    let s = session(backend).await;
    let (logs, _guard) = capture_logs();
    assert!(s.related_topics().await.unwrap().is_none());
    assert!(logs.contents().contains("No results for Related topics"));
}

#[tokio::test]
async fn standalone_operations() {
    let backend = FakeBackend {
        trending: vec!["eclipse".into(), "super bowl".into()],
        charts: vec![TopChartItem {
            title: "Wordle".into(),
            explore_query: Some("wordle".into()),
        }],
        suggestions: vec![RawSuggestion {
            mid: "/m/0663v".into(),
            title: "Pizza".into(),
            kind: "Dish".into(),
        }],
        ..Default::default()
    };
    let s = session(backend).await;

    let trending = s.trending_searches("united_states").await.unwrap().unwrap();
    assert_eq!(trending.rows()[1].query, "super bowl");

    let charts = s.top_charts(2022).await.unwrap().unwrap();
    assert_eq!(charts.rows()[0].title, "Wordle");
    assert_eq!(
        *s.backend().chart_args.lock().unwrap(),
        Some((2022, "US".to_string()))
    );

    let suggestions = s.suggestions().await.unwrap().unwrap();
    let json = serde_json::to_value(&suggestions).unwrap();
    assert!(json[0].get("mid").is_none());
    assert_eq!(
        s.backend().suggestion_arg.lock().unwrap().as_deref(),
        Some("pizza")
    );

    let taxonomy = s.categories().await.unwrap();
    assert_eq!(taxonomy.children[0].id, 71);
    assert_eq!(taxonomy.children[0].name, "Food & Drink");
}
