use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use trendscope_common::{Resolution, SearchProperty};
use trendscope_config::QuerySpec;
use trendscope_session::{DEFAULT_TIMEFRAME, QueryConfig};

#[derive(Debug, Parser)]
#[command(
    name = "trendscope",
    version,
    about = "Query Google Trends and print the results as JSON",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (defaults to the user config dir)
    #[arg(long, global = true, env = "TRENDSCOPE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Duplicate log events to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub query: QueryArgs,
}

/// Query flags; each one overrides the `query` section of the config file.
#[derive(Debug, Default, Args)]
pub struct QueryArgs {
    /// Keyword or topic id, up to five (repeatable)
    #[arg(short, long = "keyword", global = true)]
    pub keywords: Vec<String>,

    /// Timeframe, e.g. `today 5-y`, `now 7-d`, `2016-12-14 2017-01-25`
    #[arg(short, long, global = true)]
    pub timeframe: Option<String>,

    /// Geography, e.g. `US` or `US-AL`; empty for worldwide
    #[arg(short, long, global = true)]
    pub geo: Option<String>,

    /// Host language, e.g. `en-US`
    #[arg(long = "hl", global = true)]
    pub host_language: Option<String>,

    /// Category id, 0 for none
    #[arg(long, global = true)]
    pub category: Option<u32>,

    /// Google property: web, images, news, youtube, froogle
    #[arg(long, global = true)]
    pub property: Option<SearchProperty>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interest over the configured timeframe
    InterestOverTime,

    /// Hourly interest between two dates
    Historical {
        /// Start date, YYYY-MM-DD
        start: String,
        /// End date, YYYY-MM-DD
        end: String,
        #[arg(long, default_value_t = 0)]
        hour_start: u32,
        #[arg(long, default_value_t = 1)]
        hour_end: u32,
    },

    /// Interest per region
    ByRegion {
        /// CITY, COUNTRY, DMA or REGION
        #[arg(short, long, default_value = "COUNTRY")]
        resolution: Resolution,
        /// Include low search volume regions
        #[arg(long)]
        low_volume: bool,
        /// Leave out ISO codes
        #[arg(long)]
        no_geo_code: bool,
    },

    /// Top and rising topics of the first keyword
    RelatedTopics,

    /// Top and rising queries of the first keyword
    RelatedQueries {
        /// Accepted but not forwarded; the query category applies
        #[arg(long)]
        category_override: Option<u32>,
    },

    /// Today's trending searches
    Trending {
        /// Lowercase country name
        #[arg(default_value = "united_states")]
        country: String,
    },

    /// Top charts for a year (YYYY or YYYYMM)
    TopCharts { year: u32 },

    /// Refinements for the first keyword
    Suggestions,

    /// Category taxonomy
    Categories,
}

impl QueryArgs {
    /// Merge flags over the configured query. Flags win field by field.
    pub fn resolve(&self, spec: Option<&QuerySpec>) -> Result<QueryConfig> {
        let keywords = if self.keywords.is_empty() {
            spec.map(|s| s.keywords.clone()).unwrap_or_default()
        } else {
            self.keywords.clone()
        };
        let timeframe = self
            .timeframe
            .clone()
            .or_else(|| spec.map(|s| s.timeframe.clone()))
            .unwrap_or_else(|| DEFAULT_TIMEFRAME.to_string());
        let geo = self
            .geo
            .clone()
            .or_else(|| spec.map(|s| s.geo.clone()))
            .unwrap_or_default();
        let host_language = self
            .host_language
            .clone()
            .or_else(|| spec.map(|s| s.host_language.clone()))
            .unwrap_or_else(|| "en-US".to_string());
        let category = self
            .category
            .or_else(|| spec.map(|s| s.category))
            .unwrap_or(0);
        let property = self
            .property
            .or_else(|| spec.map(|s| s.search_property))
            .unwrap_or_default();

        let config = QueryConfig::new(keywords, timeframe, geo, host_language)
            .context("no usable keywords; pass --keyword or set query.keywords")?
            .with_category(category)
            .with_search_property(property);
        Ok(config)
    }
}
