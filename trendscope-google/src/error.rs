use thiserror::Error;
use trendscope_http::HttpError;

pub type Result<T> = std::result::Result<T, GoogleTrendsError>;

#[derive(Debug, Error)]
pub enum GoogleTrendsError {
    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("malformed {endpoint} response: {message}")]
    Malformed {
        endpoint: &'static str,
        message: String,
    },

    #[error("explore response has no {0} widget; build a payload first")]
    MissingWidget(&'static str),

    #[error("no trending searches for country `{0}`")]
    UnknownCountry(String),
}

impl GoogleTrendsError {
    pub(crate) fn malformed(endpoint: &'static str, err: impl std::fmt::Display) -> Self {
        GoogleTrendsError::Malformed {
            endpoint,
            message: err.to_string(),
        }
    }
}
