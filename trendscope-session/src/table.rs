use serde::Serialize;

pub const NO_RESULTS_NOTICE: &str = "Google trends has returned no results.";

/// Non-empty, ordered rows of one operation's result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResultTable<R> {
    rows: Vec<R>,
}

impl<R> ResultTable<R> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.rows.iter()
    }

    pub fn into_rows(self) -> Vec<R> {
        self.rows
    }
}

impl<R> IntoIterator for ResultTable<R> {
    type Item = R;
    type IntoIter = std::vec::IntoIter<R>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a, R> IntoIterator for &'a ResultTable<R> {
    type Item = &'a R;
    type IntoIter = std::slice::Iter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Empty rows become `None` plus the no-results notice.
pub(crate) fn check_if_valid<R>(operation: &'static str, rows: Vec<R>) -> Option<ResultTable<R>> {
    if rows.is_empty() {
        tracing::warn!(target: "trends.session", operation, "{NO_RESULTS_NOTICE}");
        return None;
    }
    Some(ResultTable { rows })
}
