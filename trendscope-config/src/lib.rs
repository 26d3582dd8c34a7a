//! Loader for trendscope configuration with YAML + environment overlays.
//!
//! Sources are merged in order: files and inline YAML as added, then
//! `TRENDSCOPE__`-prefixed environment variables (`__` separates nested keys,
//! e.g. `TRENDSCOPE__CLIENT__RETRIES=4`). `${VAR}` placeholders in string
//! values are expanded after merging.
//!
//! ```yaml
//! client:
//!   timezone_offset: 360
//!   retries: 2
//!   proxy: "${TRENDS_PROXY}"
//! query:
//!   keywords: [pizza, pasta]
//!   timeframe: today 3-m
//!   geo: US
//! logging:
//!   format: json
//! ```
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use trendscope_common::observability::LogFormat;
use trendscope_common::{ClientSettings, SearchProperty};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "TRENDSCOPE";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TrendscopeConfig {
    pub client: ClientSettings,
    pub query: Option<QuerySpec>,
    pub logging: LoggingSpec,
}

/// Default query parameters; CLI flags take precedence over each field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QuerySpec {
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default = "default_timeframe")]
    pub timeframe: String,
    #[serde(default)]
    pub geo: String,
    #[serde(default = "default_host_language")]
    pub host_language: String,
    #[serde(default)]
    pub category: u32,
    #[serde(default)]
    pub search_property: SearchProperty,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingSpec {
    pub dir: Option<PathBuf>,
    pub format: LogFormat,
    /// Used when `RUST_LOG` is unset.
    pub filter: Option<String>,
    pub stderr: bool,
}

fn default_timeframe() -> String {
    "today 5-y".into()
}

fn default_host_language() -> String {
    "en-US".into()
}

/// `<config dir>/trendscope/trendscope.yaml`, e.g. `~/.config/trendscope/trendscope.yaml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("trendscope").join("trendscope.yaml"))
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder over the `config` crate wiring.
pub struct TrendscopeConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for TrendscopeConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl TrendscopeConfigLoader {
    /// An empty loader; environment overrides are applied by [`Self::load`].
    ///
    /// ```
    /// use trendscope_config::TrendscopeConfigLoader;
    ///
    /// let config = TrendscopeConfigLoader::new().load().expect("defaults");
    /// assert_eq!(config.client.timezone_offset, 360);
    /// assert!(config.query.is_none());
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a file that must exist; the format is inferred from the suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that is skipped when absent.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet.
    ///
    /// ```
    /// use trendscope_common::SearchProperty;
    /// use trendscope_config::TrendscopeConfigLoader;
    ///
    /// let cfg = TrendscopeConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// client:
    ///   retries: 5
    /// query:
    ///   keywords: [pizza]
    ///   search_property: youtube
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.client.retries, 5);
    /// let query = cfg.query.unwrap();
    /// assert_eq!(query.keywords, vec!["pizza"]);
    /// assert_eq!(query.timeframe, "today 5-y");
    /// assert_eq!(query.search_property, SearchProperty::Youtube);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Merge all sources, expand `${VAR}` placeholders and deserialize.
    pub fn load(self) -> Result<TrendscopeConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("query.keywords"),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))
    }
}
