use std::sync::Arc;

use mensa_api::FeedError;
use thiserror::Error;

/// Document-level failures.
///
/// Row-level problems never show up here: a bad row is skipped and a bad
/// field falls back to its default inside the record builder.
///
/// Cloneable so one failed refresh can be handed to every request that
/// waited on it.
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// Network failure, timeout, error status or empty body from upstream
    #[error("Failed to fetch meal plan: {0}")]
    FetchError(String),

    /// The body is not a feed document
    #[error("Failed to parse meal plan: {0}")]
    ParseError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[source] Arc<std::io::Error>),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(Arc::new(err))
    }
}

impl From<FeedError> for Error {
    fn from(err: FeedError) -> Self {
        if err.is_parse() {
            Error::ParseError(err.to_string())
        } else {
            Error::FetchError(err.to_string())
        }
    }
}
