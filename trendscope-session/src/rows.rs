//! Row records of every table a session returns.
//!
//! Interest and region rows carry one value per keyword, so their column set
//! depends on the query; they serialize as flat maps keyed by keyword. The
//! fixed columns (`datetime`, `geoName`, ...) always win: a keyword spelled
//! like one of them, or repeated, is left out of the map, while
//! [`InterestRow::value`] still reads the first matching entry. The related
//! rows are fixed-width and derive `Serialize` directly.
use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use trendscope_google::{Coordinates, RankedQuery, RankedTopic, RawSuggestion};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordInterest {
    pub keyword: String,
    pub value: u32,
}

pub(crate) fn zip_keywords(keywords: &[String], values: Vec<u32>) -> Vec<KeywordInterest> {
    keywords
        .iter()
        .cloned()
        .zip(values)
        .map(|(keyword, value)| KeywordInterest { keyword, value })
        .collect()
}

/// One timeline row of `interest_over_time` or `historical_hourly_interest`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterestRow {
    pub datetime: DateTime<Utc>,
    pub interest: Vec<KeywordInterest>,
    pub is_partial: bool,
}

impl InterestRow {
    pub fn value(&self, keyword: &str) -> Option<u32> {
        lookup(&self.interest, keyword)
    }
}

impl Serialize for InterestRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("datetime", &self.datetime)?;
        for entry in keyword_columns(&self.interest, INTEREST_COLUMNS) {
            map.serialize_entry(&entry.keyword, &entry.value)?;
        }
        map.serialize_entry("isPartial", &self.is_partial)?;
        map.end()
    }
}

/// One region row of `interest_by_region`.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionRow {
    pub geo_name: String,
    pub geo_code: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub interest: Vec<KeywordInterest>,
}

impl RegionRow {
    pub fn value(&self, keyword: &str) -> Option<u32> {
        lookup(&self.interest, keyword)
    }
}

impl Serialize for RegionRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("geoName", &self.geo_name)?;
        if let Some(code) = &self.geo_code {
            map.serialize_entry("geoCode", code)?;
        }
        if let Some(coordinates) = &self.coordinates {
            map.serialize_entry("coordinates", coordinates)?;
        }
        for entry in keyword_columns(&self.interest, REGION_COLUMNS) {
            map.serialize_entry(&entry.keyword, &entry.value)?;
        }
        map.end()
    }
}

const INTEREST_COLUMNS: &[&str] = &["datetime", "isPartial"];
const REGION_COLUMNS: &[&str] = &["geoName", "geoCode", "coordinates"];

/// Keyword entries that can be written as columns: not a fixed column name
/// and not already written.
fn keyword_columns<'a>(
    interest: &'a [KeywordInterest],
    fixed: &'static [&'static str],
) -> impl Iterator<Item = &'a KeywordInterest> + 'a {
    interest.iter().enumerate().filter_map(move |(idx, entry)| {
        let reserved = fixed.contains(&entry.keyword.as_str());
        let repeated = interest[..idx].iter().any(|e| e.keyword == entry.keyword);
        (!reserved && !repeated).then_some(entry)
    })
}

fn lookup(interest: &[KeywordInterest], keyword: &str) -> Option<u32> {
    interest
        .iter()
        .find(|e| e.keyword == keyword)
        .map(|e| e.value)
}

/// Top and rising topics of the primary keyword, side by side.
///
/// The two halves of a row sit at the same rank position and are otherwise
/// unrelated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RelatedTopicsRow {
    pub value_top: Option<i64>,
    #[serde(rename = "formattedValue_top")]
    pub formatted_value_top: Option<String>,
    #[serde(rename = "hasData_top")]
    pub has_data_top: Option<bool>,
    pub topic_title_top: Option<String>,
    pub topic_type_top: Option<String>,
    pub value_rising: Option<i64>,
    #[serde(rename = "formattedValue_rising")]
    pub formatted_value_rising: Option<String>,
    #[serde(rename = "hasData_rising")]
    pub has_data_rising: Option<bool>,
    pub topic_title_rising: Option<String>,
    pub topic_type_rising: Option<String>,
}

impl RelatedTopicsRow {
    pub(crate) fn compose(top: Option<RankedTopic>, rising: Option<RankedTopic>) -> Self {
        let mut row = Self::default();
        if let Some(t) = top {
            row.value_top = Some(t.value);
            row.formatted_value_top = Some(t.formatted_value);
            row.has_data_top = Some(t.has_data);
            row.topic_title_top = Some(t.topic.title);
            row.topic_type_top = Some(t.topic.kind);
        }
        if let Some(r) = rising {
            row.value_rising = Some(r.value);
            row.formatted_value_rising = Some(r.formatted_value);
            row.has_data_rising = Some(r.has_data);
            row.topic_title_rising = Some(r.topic.title);
            row.topic_type_rising = Some(r.topic.kind);
        }
        row
    }
}

/// Top and rising queries of the primary keyword, side by side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RelatedQueriesRow {
    pub top_query: Option<String>,
    pub top_value: Option<i64>,
    pub rising_query: Option<String>,
    pub rising_value: Option<i64>,
}

impl RelatedQueriesRow {
    pub(crate) fn compose(top: Option<RankedQuery>, rising: Option<RankedQuery>) -> Self {
        let (top_query, top_value) = top.map(|q| (q.query, q.value)).unzip();
        let (rising_query, rising_value) = rising.map(|q| (q.query, q.value)).unzip();
        Self {
            top_query,
            top_value,
            rising_query,
            rising_value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendingSearch {
    pub query: String,
}

/// Autocomplete entry without Google's internal `mid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl From<RawSuggestion> for Suggestion {
    fn from(raw: RawSuggestion) -> Self {
        Self {
            title: raw.title,
            kind: raw.kind,
        }
    }
}

/// Pair two lists by position. The result is as long as the longer list and
/// the shorter side is padded with `None`.
pub(crate) fn side_by_side<T, R, O>(
    top: Vec<T>,
    rising: Vec<R>,
    mut compose: impl FnMut(Option<T>, Option<R>) -> O,
) -> Vec<O> {
    let len = top.len().max(rising.len());
    let mut top = top.into_iter();
    let mut rising = rising.into_iter();
    (0..len)
        .map(|_| compose(top.next(), rising.next()))
        .collect()
}
