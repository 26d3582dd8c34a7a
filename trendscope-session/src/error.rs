use std::fmt;
use thiserror::Error;
use trendscope_google::GoogleTrendsError;

pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelatedKind {
    Topics,
    Queries,
}

impl fmt::Display for RelatedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelatedKind::Topics => f.write_str("topics"),
            RelatedKind::Queries => f.write_str("queries"),
        }
    }
}

/// Which piece of a related response was missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelatedPart {
    /// No panel at all for the primary keyword.
    Keyword,
    Top,
    Rising,
}

impl fmt::Display for RelatedPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelatedPart::Keyword => f.write_str("keyword panel"),
            RelatedPart::Top => f.write_str("top table"),
            RelatedPart::Rising => f.write_str("rising table"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("keyword list is empty")]
    EmptyKeywords,

    #[error("at most {max} keywords can be compared, got {got}")]
    TooManyKeywords { got: usize, max: usize },

    #[error("invalid date `{input}`: {reason}")]
    InvalidDate { input: String, reason: String },

    #[error("hour {0} is outside 0-23")]
    InvalidHour(u32),

    #[error("incomplete related {kind} data for `{keyword}`: no {missing}")]
    IncompleteRelatedData {
        kind: RelatedKind,
        keyword: String,
        missing: RelatedPart,
    },

    #[error("{operation}: expected {expected} values per row, got {got}")]
    SchemaMismatch {
        operation: &'static str,
        expected: usize,
        got: usize,
    },

    #[error(transparent)]
    Backend(#[from] GoogleTrendsError),
}
