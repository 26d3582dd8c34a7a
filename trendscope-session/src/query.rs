use crate::error::{Result, SessionError};
use serde::Serialize;
use trendscope_common::SearchProperty;
use trendscope_google::{MAX_KEYWORDS, PayloadRequest};

/// Google's own default window.
pub const DEFAULT_TIMEFRAME: &str = "today 5-y";

/// Immutable description of one trends query.
///
/// Keywords keep their order; the first one is the primary keyword used by
/// related topics, related queries and suggestions. Topic identifiers such as
/// `/m/025rw19` are accepted wherever a keyword is.
///
/// ```
/// use trendscope_common::SearchProperty;
/// use trendscope_session::QueryConfig;
///
/// let cfg = QueryConfig::new(["Pizza", "Italian"], "today 3-m", "US-AL", "en-US")
///     .unwrap()
///     .with_category(71)
///     .with_search_property(SearchProperty::Images);
/// assert_eq!(cfg.primary_keyword(), "Pizza");
/// assert_eq!(cfg.category(), 71);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryConfig {
    keywords: Vec<String>,
    timeframe: String,
    geo: String,
    host_language: String,
    category: u32,
    search_property: SearchProperty,
}

impl QueryConfig {
    /// Validate and build a config with no category and web search.
    pub fn new<I, S>(
        keywords: I,
        timeframe: impl Into<String>,
        geo: impl Into<String>,
        host_language: impl Into<String>,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keywords: Vec<String> = keywords.into_iter().map(Into::into).collect();
        if keywords.is_empty() {
            return Err(SessionError::EmptyKeywords);
        }
        if keywords.len() > MAX_KEYWORDS {
            return Err(SessionError::TooManyKeywords {
                got: keywords.len(),
                max: MAX_KEYWORDS,
            });
        }
        Ok(Self {
            keywords,
            timeframe: timeframe.into(),
            geo: geo.into(),
            host_language: host_language.into(),
            category: 0,
            search_property: SearchProperty::Web,
        })
    }

    pub fn with_category(mut self, category: u32) -> Self {
        self.category = category;
        self
    }

    pub fn with_search_property(mut self, search_property: SearchProperty) -> Self {
        self.search_property = search_property;
        self
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn primary_keyword(&self) -> &str {
        // non-empty by construction
        &self.keywords[0]
    }

    pub fn timeframe(&self) -> &str {
        &self.timeframe
    }

    pub fn geo(&self) -> &str {
        &self.geo
    }

    pub fn host_language(&self) -> &str {
        &self.host_language
    }

    pub fn category(&self) -> u32 {
        self.category
    }

    pub fn search_property(&self) -> SearchProperty {
        self.search_property
    }

    pub(crate) fn payload(&self) -> PayloadRequest {
        PayloadRequest {
            keywords: self.keywords.clone(),
            category: self.category,
            timeframe: self.timeframe.clone(),
            geo: self.geo.clone(),
            search_property: self.search_property,
        }
    }
}
