use thiserror::Error;

#[derive(Debug, Error)]
pub enum LogFacetsError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("query `{operation}` failed: {source}")]
    Query {
        operation: &'static str,
        source: rusqlite::Error,
    },

    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: &'static str },

    #[error("failed to write report: {0}")]
    Output(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LogFacetsError>;

impl LogFacetsError {
    pub fn query(operation: &'static str) -> impl FnOnce(rusqlite::Error) -> Self {
        move |source| LogFacetsError::Query { operation, source }
    }
}
