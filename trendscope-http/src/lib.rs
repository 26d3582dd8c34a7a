//! Minimal HTTP client with safe logging, retries, and a cookie jar.
//!
//! - Request options: headers, query params, timeout, retries
//! - Connect timeout, proxy and cookie persistence set once per client
//! - Retries network failures and 429/5xx with exponential backoff and
//!   `Retry-After` support
//! - Redacts cookie headers and never logs their values
//! - Optional *raw* request/response logging via `TRENDSCOPE_HTTP_RAW=1`
//!
//! ```no_run
//! use std::borrow::Cow;
//! use trendscope_http::{HttpClient, RequestOpts};
//!
//! # async fn demo() -> Result<(), trendscope_http::HttpError> {
//! let client = HttpClient::new("https://trends.google.com")?;
//! let picker = client
//!     .get_text(
//!         "trends/api/explore/pickers/category",
//!         RequestOpts {
//!             query: Some(vec![("hl", Cow::Borrowed("en-US"))]),
//!             ..Default::default()
//!         },
//!     )
//!     .await?;
//! # let _ = picker;
//! # Ok(()) }
//! ```

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, Method, Proxy, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::env;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::time::sleep;

const RAW_ENV: &str = "TRENDSCOPE_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024;
const SNIPPET_LEN: usize = 500;
const RATE_LIMIT_FLOOR: Duration = Duration::from_millis(1100);

fn raw_enabled() -> bool {
    matches!(
        env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

fn is_sensitive_header(name: &str) -> bool {
    name.eq_ignore_ascii_case("cookie")
        || name.eq_ignore_ascii_case("set-cookie")
        || name.eq_ignore_ascii_case("authorization")
}

/// Render a best-effort curl command for repro/debug, cookies redacted.
fn make_curl(method: &Method, url: &Url, headers: &HeaderMap) -> String {
    let mut parts = vec!["curl".to_string(), format!("-X{}", method)];
    for (name, val) in headers.iter() {
        let v = if is_sensitive_header(name.as_str()) {
            "<redacted>".to_string()
        } else {
            val.to_str().unwrap_or("").to_string()
        };
        parts.push(format!(
            "-H '{}: {}'",
            name.as_str(),
            v.replace('\'', r"'\''")
        ));
    }
    parts.push(format!("'{}'", url.as_str()));
    parts.join(" ")
}

fn redact_headers(h: &HeaderMap) -> Vec<(String, String)> {
    h.iter()
        .map(|(k, v)| {
            let key = k.as_str().to_string();
            let val = if is_sensitive_header(&key) {
                "<redacted>".to_string()
            } else {
                v.to_str().unwrap_or("").to_string()
            };
            (key, val)
        })
        .collect()
}

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("decode error: {0}, body_snippet: {1}")]
    Decode(String, String),
    #[error("server returned error {status}: {message}, request_id={request_id}")]
    Api {
        status: StatusCode,
        message: String,
        request_id: String,
    },
}

/// Client-wide settings fixed when the underlying `reqwest::Client` is built.
///
/// ```
/// use trendscope_http::ClientOptions;
/// use std::time::Duration;
///
/// let opts = ClientOptions {
///     connect_timeout: Duration::from_secs(10),
///     ..Default::default()
/// };
/// assert!(opts.cookie_store);
/// assert_eq!(opts.max_retries, 2);
/// ```
#[derive(Clone, Debug)]
pub struct ClientOptions {
    pub connect_timeout: Duration,
    /// Per-request timeout used when `RequestOpts::timeout` is unset.
    pub timeout: Duration,
    pub max_retries: usize,
    /// First backoff delay; doubles per attempt.
    pub backoff: Duration,
    pub proxy: Option<String>,
    /// Persist cookies between requests (Google needs its `NID` cookie).
    pub cookie_store: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            timeout: Duration::from_secs(15),
            max_retries: 2,
            backoff: Duration::from_millis(200),
            proxy: None,
            cookie_store: true,
        }
    }
}

/// Per-request overrides. Unset fields fall back to the client defaults.
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    pub timeout: Option<Duration>,
    pub retries: Option<usize>,
    pub headers: Option<HeaderMap>,
    pub query: Option<Vec<(&'a str, Cow<'a, str>)>>,
    /// Accept an absolute URL in `path` instead of joining it to the base.
    pub allow_absolute: bool,
}

#[derive(Clone)]
pub struct HttpClient {
    base: Url,
    inner: Client,
    default_timeout: Duration,
    max_retries: usize,
    backoff: Duration,
}

impl HttpClient {
    /// Client for `base` with [`ClientOptions::default`].
    pub fn new(base: &str) -> Result<Self, HttpError> {
        Self::with_options(base, ClientOptions::default())
    }

    /// Construct a client with explicit connect timeout, proxy and cookie jar.
    pub fn with_options(base: &str, options: ClientOptions) -> Result<Self, HttpError> {
        let base = Url::parse(base).map_err(|e| HttpError::Url(e.to_string()))?;
        let mut builder = Client::builder()
            .connect_timeout(options.connect_timeout)
            .cookie_store(options.cookie_store);
        if let Some(proxy) = options.proxy.as_deref() {
            let proxy = Proxy::all(proxy).map_err(|e| HttpError::Build(e.to_string()))?;
            builder = builder.proxy(proxy);
        }
        let inner = builder
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            base,
            inner,
            default_timeout: options.timeout,
            max_retries: options.max_retries,
            backoff: options.backoff,
        })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// GET a body as text. Google prefixes its JSON with an anti-XSSI
    /// guard, so callers strip it and hand the rest to [`decode_json`].
    pub async fn get_text(&self, path: &str, opts: RequestOpts<'_>) -> Result<String, HttpError> {
        let body = self.request_internal(Method::GET, path, opts).await?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    fn resolve_url(&self, path: &str, allow_absolute: bool) -> Result<Url, HttpError> {
        if allow_absolute {
            if let Ok(abs) = Url::parse(path) {
                return Ok(abs);
            }
        }
        self.base
            .join(path)
            .map_err(|e| HttpError::Url(e.to_string()))
    }

    fn backoff_delay(&self, attempt: usize) -> Duration {
        let shift = attempt.saturating_sub(1).min(16) as u32;
        self.backoff.saturating_mul(1u32 << shift)
    }

    /// `Retry-After` wins; otherwise exponential backoff, never below
    /// [`RATE_LIMIT_FLOOR`] for a 429.
    fn retry_delay(&self, attempt: usize, status: StatusCode, headers: &HeaderMap) -> Duration {
        if let Some(secs) = retry_after_delay_secs(headers) {
            return Duration::from_secs(secs);
        }
        let exp = self.backoff_delay(attempt);
        if status == StatusCode::TOO_MANY_REQUESTS {
            exp.max(RATE_LIMIT_FLOOR)
        } else {
            exp
        }
    }

    async fn request_internal(
        &self,
        method: Method,
        path: &str,
        opts: RequestOpts<'_>,
    ) -> Result<Vec<u8>, HttpError> {
        let url = self.resolve_url(path, opts.allow_absolute)?;
        let max_retries = opts.retries.unwrap_or(self.max_retries);
        let timeout = opts.timeout.unwrap_or(self.default_timeout);
        let query: Vec<(&str, &str)> = opts
            .query
            .as_ref()
            .map(|q| q.iter().map(|(k, v)| (*k, v.as_ref())).collect())
            .unwrap_or_default();
        let req_id = format!("r{}", uuid::Uuid::new_v4().simple());

        if raw_enabled() {
            let mut full = url.clone();
            if !query.is_empty() {
                full.query_pairs_mut().extend_pairs(query.iter());
            }
            let curl = make_curl(&method, &full, &opts.headers.clone().unwrap_or_default());
            tracing::debug!(target: "http.raw", %req_id, %curl, "request");
        }

        let mut attempt = 0usize;
        loop {
            let mut rb = self
                .inner
                .request(method.clone(), url.clone())
                .timeout(timeout);
            if !query.is_empty() {
                rb = rb.query(&query);
            }
            if let Some(hdrs) = &opts.headers {
                rb = rb.headers(hdrs.clone());
            }

            tracing::debug!(
                req_id = %req_id,
                attempt = attempt + 1,
                max_retries,
                method = %method,
                path = %url.path(),
                query = ?query,
                "http.request.start"
            );

            let started = Instant::now();
            let (status, headers, body) = match send_and_read(rb).await {
                Ok(parts) => parts,
                Err(err) if attempt < max_retries => {
                    attempt += 1;
                    let delay = self.backoff_delay(attempt);
                    tracing::warn!(
                        req_id = %req_id,
                        attempt,
                        backoff_ms = delay.as_millis() as u64,
                        error = %err,
                        "http.retrying.network"
                    );
                    sleep(delay).await;
                    continue;
                }
                Err(err) => {
                    tracing::warn!(req_id = %req_id, attempt, error = %err, "http.network_error");
                    return Err(HttpError::Network(err.to_string()));
                }
            };
            let elapsed_ms = started.elapsed().as_millis() as u64;

            tracing::debug!(
                req_id = %req_id,
                %status,
                elapsed_ms,
                body_len = body.len(),
                "http.response"
            );
            if raw_enabled() {
                let shown = &body[..body.len().min(RAW_MAX_BODY)];
                tracing::info!(
                    target: "http.raw",
                    %req_id,
                    %status,
                    headers = ?redact_headers(&headers),
                    body = %String::from_utf8_lossy(shown),
                    truncated = body.len() > RAW_MAX_BODY,
                    "response"
                );
            }

            if status.is_success() {
                return Ok(body);
            }

            let message = extract_error_message(&body);
            let retryable = status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
            if retryable && attempt < max_retries {
                attempt += 1;
                let delay = self.retry_delay(attempt, status, &headers);
                tracing::warn!(
                    req_id = %req_id,
                    %status,
                    attempt,
                    backoff_ms = delay.as_millis() as u64,
                    message = %message,
                    "http.retrying.status"
                );
                sleep(delay).await;
                continue;
            }

            tracing::warn!(
                req_id = %req_id,
                %status,
                message = %message,
                "http.error"
            );
            return Err(HttpError::Api {
                status,
                message,
                request_id: req_id,
            });
        }
    }
}

/// One round trip; body read failures count as network failures.
async fn send_and_read(
    rb: reqwest::RequestBuilder,
) -> Result<(StatusCode, HeaderMap, Vec<u8>), reqwest::Error> {
    let resp = rb.send().await?;
    let status = resp.status();
    let headers = resp.headers().clone();
    let body = resp.bytes().await?.to_vec();
    Ok((status, headers, body))
}

// ==============================
// Helpers
// ==============================

/// Decode a JSON body, logging position details on failure.
pub fn decode_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, HttpError> {
    serde_json::from_slice::<T>(body).map_err(|e| {
        let snippet = snip_body(body);
        tracing::warn!(
            serde_line=%e.line(),
            serde_col=%e.column(),
            serde_err=%e,
            body_snippet=%snippet,
            "http.response.decode_error"
        );
        HttpError::Decode(e.to_string(), snippet)
    })
}

fn extract_error_message(body: &[u8]) -> String {
    // {"message":"..."} or {"error":"..."}
    #[derive(Deserialize)]
    struct Flat {
        #[serde(default)]
        message: String,
        #[serde(default)]
        error: String,
    }

    if let Ok(m) = serde_json::from_slice::<Flat>(body) {
        if !m.message.is_empty() {
            return m.message;
        }
        if !m.error.is_empty() {
            return m.error;
        }
    }
    snip_body(body)
}

fn retry_after_delay_secs(h: &HeaderMap) -> Option<u64> {
    h.get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())?
        .trim()
        .parse()
        .ok()
}

fn snip_body(body: &[u8]) -> String {
    let mut snip = String::from_utf8_lossy(body).to_string();
    if snip.len() > SNIPPET_LEN {
        let mut cut = SNIPPET_LEN;
        while !snip.is_char_boundary(cut) {
            cut -= 1;
        }
        snip.truncate(cut);
        snip.push_str("...");
    }
    snip
}
