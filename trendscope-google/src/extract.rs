//! Helpers that turn Google's explore/widget JSON into backend records.
//!
//! Everything here is pure so it can be tested without a server.
use crate::error::{GoogleTrendsError, Result};
use crate::types::{Coordinates, RankedQuery, RankedTopic, RegionPoint, RelatedTables, TimelinePoint};
use chrono::DateTime;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use trendscope_http::{HttpError, decode_json};

const XSSI_PREFIX: &str = ")]}'";

/// Strip Google's anti-XSSI guard (`)]}'` optionally followed by `,`) from a body.
///
/// ```
/// use trendscope_google::extract::strip_xssi_prefix;
///
/// assert_eq!(strip_xssi_prefix(")]}',\n{\"a\":1}"), "{\"a\":1}");
/// assert_eq!(strip_xssi_prefix("{\"a\":1}"), "{\"a\":1}");
/// ```
pub fn strip_xssi_prefix(body: &str) -> &str {
    let trimmed = body.trim_start();
    match trimmed.strip_prefix(XSSI_PREFIX) {
        Some(rest) => rest.trim_start_matches(',').trim_start(),
        None => trimmed,
    }
}

/// Strip the guard and decode. Decode failures name the endpoint.
pub fn decode_guarded<T: DeserializeOwned>(endpoint: &'static str, body: &str) -> Result<T> {
    decode_json(strip_xssi_prefix(body).as_bytes()).map_err(|e| match e {
        HttpError::Decode(message, _) => {
            tracing::debug!(target: "trends.google", endpoint, "google.decode_error");
            GoogleTrendsError::malformed(endpoint, message)
        }
        other => GoogleTrendsError::Http(other),
    })
}

// ==============================
// Explore widgets
// ==============================

/// A panel in the explore response: the request to replay plus its token.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Widget {
    pub id: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub request: Value,
}

#[derive(Debug, Deserialize)]
struct ExploreResponse {
    #[serde(default)]
    widgets: Vec<Widget>,
}

/// Widgets of one built payload, sorted by panel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WidgetSet {
    pub interest_over_time: Option<Widget>,
    pub interest_by_region: Option<Widget>,
    pub related_topics: Vec<Widget>,
    pub related_queries: Vec<Widget>,
}

impl WidgetSet {
    /// Sort explore widgets into panels. Only the first `GEO_MAP` is kept;
    /// Google sends one per keyword when comparing.
    pub fn from_widgets(widgets: Vec<Widget>) -> Self {
        let mut set = WidgetSet::default();
        for widget in widgets {
            if widget.id == "TIMESERIES" {
                set.interest_over_time = Some(widget);
            } else if widget.id == "GEO_MAP" {
                if set.interest_by_region.is_none() {
                    set.interest_by_region = Some(widget);
                }
            } else if widget.id.contains("RELATED_TOPICS") {
                set.related_topics.push(widget);
            } else if widget.id.contains("RELATED_QUERIES") {
                set.related_queries.push(widget);
            }
        }
        set
    }

    pub fn parse(body: &str) -> Result<Self> {
        let resp: ExploreResponse = decode_guarded("explore", body)?;
        Ok(Self::from_widgets(resp.widgets))
    }
}

/// Keyword a related widget belongs to; empty when Google left it out.
pub fn related_widget_keyword(widget: &Widget) -> String {
    widget
        .request
        .pointer("/restriction/complexKeywordsRestriction/keyword/0/value")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

// ==============================
// Widget data
// ==============================

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    default: T,
}

#[derive(Debug, Deserialize)]
struct TimelineData {
    #[serde(rename = "timelineData", default)]
    timeline_data: Vec<RawTimelinePoint>,
}

#[derive(Debug, Deserialize)]
struct RawTimelinePoint {
    time: String,
    #[serde(default)]
    value: Vec<u32>,
    #[serde(rename = "isPartial", default)]
    is_partial: bool,
}

/// Decode a `widgetdata/multiline` body into points, in Google's order.
pub fn parse_timeline(body: &str) -> Result<Vec<TimelinePoint>> {
    let env: Envelope<TimelineData> = decode_guarded("multiline", body)?;
    env.default
        .timeline_data
        .into_iter()
        .map(|raw| {
            let secs: i64 = raw
                .time
                .trim()
                .parse()
                .map_err(|e| GoogleTrendsError::malformed("multiline", format!("time `{}`: {e}", raw.time)))?;
            let time = DateTime::from_timestamp(secs, 0).ok_or_else(|| {
                GoogleTrendsError::malformed("multiline", format!("time out of range: {secs}"))
            })?;
            Ok(TimelinePoint {
                time,
                values: raw.value,
                is_partial: raw.is_partial,
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct GeoMapData {
    #[serde(rename = "geoMapData", default)]
    geo_map_data: Vec<RawGeoPoint>,
}

#[derive(Debug, Deserialize)]
struct RawGeoPoint {
    #[serde(rename = "geoName")]
    geo_name: String,
    #[serde(rename = "geoCode", default)]
    geo_code: Option<String>,
    #[serde(default)]
    coordinates: Option<Coordinates>,
    #[serde(default)]
    value: Vec<u32>,
}

/// Decode a `widgetdata/comparedgeo` body into points sorted by region name.
/// Codes and coordinates are dropped unless `include_geo_code` is set.
pub fn parse_geo_map(body: &str, include_geo_code: bool) -> Result<Vec<RegionPoint>> {
    let env: Envelope<GeoMapData> = decode_guarded("comparedgeo", body)?;
    let mut points: Vec<RegionPoint> = env
        .default
        .geo_map_data
        .into_iter()
        .map(|raw| RegionPoint {
            geo_name: raw.geo_name,
            geo_code: raw.geo_code.filter(|_| include_geo_code),
            coordinates: raw.coordinates.filter(|_| include_geo_code),
            values: raw.value,
        })
        .collect();
    points.sort_by(|a, b| a.geo_name.cmp(&b.geo_name));
    Ok(points)
}

#[derive(Debug, Deserialize)]
struct RankedData {
    #[serde(rename = "rankedList", default)]
    ranked_list: Vec<RankedList>,
}

#[derive(Debug, Deserialize)]
struct RankedList {
    #[serde(rename = "rankedKeyword")]
    ranked_keyword: Option<Vec<Value>>,
}

/// `rankedList[0]` is the top list, `rankedList[1]` the rising list.
fn parse_ranked<T: DeserializeOwned>(body: &str) -> Result<RelatedTables<T>> {
    let env: Envelope<RankedData> = decode_guarded("relatedsearches", body)?;
    let mut lists = env.default.ranked_list.into_iter();
    let decode = |list: Option<RankedList>| -> Result<Option<Vec<T>>> {
        match list.and_then(|l| l.ranked_keyword) {
            None => Ok(None),
            Some(items) => items
                .into_iter()
                .map(|v| {
                    serde_json::from_value(v)
                        .map_err(|e| GoogleTrendsError::malformed("relatedsearches", e))
                })
                .collect::<Result<Vec<T>>>()
                .map(Some),
        }
    };
    let top = decode(lists.next())?;
    let rising = decode(lists.next())?;
    Ok(RelatedTables { top, rising })
}

pub fn parse_related_topics(body: &str) -> Result<RelatedTables<RankedTopic>> {
    parse_ranked(body)
}

pub fn parse_related_queries(body: &str) -> Result<RelatedTables<RankedQuery>> {
    parse_ranked(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strips_both_prefix_shapes() {
        assert_eq!(strip_xssi_prefix(")]}'{\"x\":1}"), "{\"x\":1}");
        assert_eq!(strip_xssi_prefix(")]}',\n{\"x\":1}"), "{\"x\":1}");
        assert_eq!(strip_xssi_prefix("  [1]"), "[1]");
    }

    #[test]
    fn widget_selection_keeps_first_geo_map() {
        let widgets = vec![
            Widget { id: "TIMESERIES".into(), token: "t1".into(), request: json!({}) },
            Widget { id: "GEO_MAP".into(), token: "g1".into(), request: json!({}) },
            Widget { id: "GEO_MAP_0".into(), token: "g2".into(), request: json!({}) },
            Widget { id: "GEO_MAP".into(), token: "g3".into(), request: json!({}) },
            Widget { id: "RELATED_TOPICS".into(), token: "rt".into(), request: json!({}) },
            Widget { id: "RELATED_QUERIES_0".into(), token: "rq".into(), request: json!({}) },
        ];
        let set = WidgetSet::from_widgets(widgets);
        assert_eq!(set.interest_over_time.unwrap().token, "t1");
        assert_eq!(set.interest_by_region.unwrap().token, "g1");
        assert_eq!(set.related_topics.len(), 1);
        assert_eq!(set.related_queries[0].token, "rq");
    }

    #[test]
    fn related_keyword_comes_from_restriction() {
        let w = Widget {
            id: "RELATED_QUERIES".into(),
            token: String::new(),
            request: json!({"restriction":{"complexKeywordsRestriction":{"keyword":[{"type":"BROAD","value":"pizza"}]}}}),
        };
        assert_eq!(related_widget_keyword(&w), "pizza");
        let bare = Widget { id: "RELATED_QUERIES".into(), token: String::new(), request: json!({}) };
        assert_eq!(related_widget_keyword(&bare), "");
    }

    #[test]
    fn timeline_keeps_response_order_and_partial_defaults_false() {
        let body = r#")]}',
{"default":{"timelineData":[
  {"time":"1672534800","value":[40,2]},
  {"time":"1672531200","value":[35,1],"isPartial":true}
]}}"#;
        let points = parse_timeline(body).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].time.timestamp(), 1_672_534_800);
        assert_eq!(points[0].values, vec![40, 2]);
        assert!(!points[0].is_partial);
        assert!(points[1].is_partial);
    }

    #[test]
    fn html_body_is_malformed_for_its_endpoint() {
        let err = WidgetSet::parse(")]}'\n<html>rate limited</html>").unwrap_err();
        assert!(matches!(
            err,
            GoogleTrendsError::Malformed { endpoint: "explore", .. }
        ));
    }

    #[test]
    fn bad_timestamp_is_malformed() {
        let body = r#"{"default":{"timelineData":[{"time":"soon","value":[1]}]}}"#;
        assert!(matches!(
            parse_timeline(body),
            Err(GoogleTrendsError::Malformed { endpoint: "multiline", .. })
        ));
    }

    #[test]
    fn geo_codes_follow_flag() {
        let body = r#"{"default":{"geoMapData":[
  {"geoCode":"US-TX","geoName":"Texas","value":[80]},
  {"geoCode":"US-CA","geoName":"California","value":[100]}
]}}"#;
        let with = parse_geo_map(body, true).unwrap();
        assert_eq!(with[0].geo_name, "California");
        assert_eq!(with[0].geo_code.as_deref(), Some("US-CA"));
        let without = parse_geo_map(body, false).unwrap();
        assert!(without.iter().all(|p| p.geo_code.is_none()));
    }

    #[test]
    fn missing_rising_list_is_absent_not_empty() {
        let body = r#"{"default":{"rankedList":[
  {"rankedKeyword":[{"query":"pizza hut","value":100,"formattedValue":"100","hasData":true,"link":"/x"}]}
]}}"#;
        let tables = parse_related_queries(body).unwrap();
        assert_eq!(tables.top.as_ref().map(Vec::len), Some(1));
        assert!(tables.rising.is_none());
    }
}
