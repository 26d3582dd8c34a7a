//! Common types and utilities shared across trendscope crates.
//!
//! This crate defines the client settings, query enums, and observability
//! helpers used throughout the workspace. It stays dependency-light so the
//! HTTP, client, session and app crates can all depend on it.
//!
//! # Overview
//!
//! - [`ClientSettings`]: timezone offset, retry budget and timeouts handed to
//!   the trends client at session construction
//! - [`SearchProperty`]: which Google property a query is filtered to
//! - [`Resolution`]: geographic granularity for region queries
//! - [`observability`]: centralised tracing/logging initialisation
//!
//! # Examples
//!
//! ```rust
//! use trendscope_common::{ClientSettings, SearchProperty};
//!
//! let settings = ClientSettings::default();
//! assert_eq!(settings.timezone_offset, 360);
//! assert_eq!(settings.retries, 2);
//! assert_eq!("youtube".parse::<SearchProperty>().unwrap(), SearchProperty::Youtube);
//! ```
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub mod observability;

pub const DEFAULT_TRENDS_HOST: &str = "https://trends.google.com";

/// Connection parameters for the trends client.
///
/// Every session is opened with one of these. The defaults match what the
/// Google Trends web UI tolerates for scripted access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    /// Timezone offset in minutes. Google inverts the sign, so US CST is `360`.
    pub timezone_offset: i32,
    /// Retry budget for connect, read and 429/5xx failures.
    pub retries: usize,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    /// Base delay for exponential backoff between retries.
    pub backoff_millis: u64,
    /// Optional HTTPS proxy, e.g. `https://34.203.233.13:80`.
    pub proxy: Option<String>,
    /// Trends host. Only overridden by tests and mirrors.
    pub base_url: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            timezone_offset: 360,
            retries: 2,
            connect_timeout_secs: 10,
            read_timeout_secs: 25,
            backoff_millis: 200,
            proxy: None,
            base_url: DEFAULT_TRENDS_HOST.to_string(),
        }
    }
}

impl ClientSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_millis)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} `{value}`, expected one of: {expected}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
    expected: &'static str,
}

/// Google property a query is filtered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SearchProperty {
    #[default]
    #[serde(rename = "", alias = "web")]
    Web,
    #[serde(rename = "images")]
    Images,
    #[serde(rename = "news")]
    News,
    #[serde(rename = "youtube")]
    Youtube,
    /// Google Shopping.
    #[serde(rename = "froogle")]
    Froogle,
}

impl SearchProperty {
    /// Value sent as `property` in the explore request.
    pub fn as_param(&self) -> &'static str {
        match self {
            Self::Web => "",
            Self::Images => "images",
            Self::News => "news",
            Self::Youtube => "youtube",
            Self::Froogle => "froogle",
        }
    }
}

impl FromStr for SearchProperty {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "web" => Ok(Self::Web),
            "images" => Ok(Self::Images),
            "news" => Ok(Self::News),
            "youtube" => Ok(Self::Youtube),
            "froogle" | "shopping" => Ok(Self::Froogle),
            _ => Err(ParseEnumError {
                kind: "search property",
                value: s.to_string(),
                expected: "web, images, news, youtube, froogle",
            }),
        }
    }
}

impl fmt::Display for SearchProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Web => f.write_str("web"),
            other => f.write_str(other.as_param()),
        }
    }
}

/// Geographic granularity for region queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Resolution {
    City,
    #[default]
    Country,
    /// Designated market area (US metro).
    Dma,
    Region,
}

impl Resolution {
    pub fn as_param(&self) -> &'static str {
        match self {
            Self::City => "CITY",
            Self::Country => "COUNTRY",
            Self::Dma => "DMA",
            Self::Region => "REGION",
        }
    }
}

impl FromStr for Resolution {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CITY" => Ok(Self::City),
            "COUNTRY" => Ok(Self::Country),
            "DMA" | "METRO" => Ok(Self::Dma),
            "REGION" => Ok(Self::Region),
            _ => Err(ParseEnumError {
                kind: "resolution",
                value: s.to_string(),
                expected: "CITY, COUNTRY, DMA, REGION",
            }),
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_param())
    }
}
