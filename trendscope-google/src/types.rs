use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use trendscope_common::SearchProperty;

/// Query parameters submitted to the explore endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadRequest {
    pub keywords: Vec<String>,
    #[serde(default)]
    pub category: u32,
    pub timeframe: String,
    #[serde(default)]
    pub geo: String,
    #[serde(default)]
    pub search_property: SearchProperty,
}

/// Hourly range walked by [`crate::TrendsBackend::historical_interest`].
///
/// Fields are kept decomposed so callers can check exactly what was asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoricalRequest {
    pub keywords: Vec<String>,
    pub year_start: i32,
    pub month_start: u32,
    pub day_start: u32,
    pub hour_start: u32,
    pub year_end: i32,
    pub month_end: u32,
    pub day_end: u32,
    pub hour_end: u32,
    pub category: u32,
    pub geo: String,
    pub search_property: SearchProperty,
    /// Pause between window requests.
    pub delay: Duration,
}

/// One timeline entry; `values` follow the payload's keyword order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelinePoint {
    pub time: DateTime<Utc>,
    pub values: Vec<u32>,
    pub is_partial: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// One region entry; `values` follow the payload's keyword order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionPoint {
    pub geo_name: String,
    pub geo_code: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub values: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicRef {
    #[serde(default)]
    pub mid: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedTopic {
    pub topic: TopicRef,
    pub value: i64,
    #[serde(rename = "formattedValue", default)]
    pub formatted_value: String,
    #[serde(rename = "hasData", default)]
    pub has_data: bool,
    #[serde(default)]
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedQuery {
    pub query: String,
    pub value: i64,
    #[serde(rename = "formattedValue", default)]
    pub formatted_value: String,
    #[serde(rename = "hasData", default)]
    pub has_data: bool,
    #[serde(default)]
    pub link: String,
}

/// `top` and `rising` lists of one related panel. A list Google did not send
/// is `None`, which is different from an empty list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedTables<T> {
    pub top: Option<Vec<T>>,
    pub rising: Option<Vec<T>>,
}

impl<T> Default for RelatedTables<T> {
    fn default() -> Self {
        Self {
            top: None,
            rising: None,
        }
    }
}

/// Related panels keyed by the keyword they belong to.
pub type RelatedMap<T> = HashMap<String, RelatedTables<T>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopChartItem {
    pub title: String,
    #[serde(rename = "exploreQuery", default)]
    pub explore_query: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSuggestion {
    #[serde(default)]
    pub mid: String,
    pub title: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// Node of Google's category taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub id: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Category>,
}
