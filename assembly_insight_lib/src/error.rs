//! Error types shared by the pipeline stages.

use thiserror::Error;

/// Failure to fetch from an upstream source.
///
/// [`FetchError::RateLimited`] is the only error that aborts the remaining
/// fetches of a run; every other variant only abandons the current entity.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("rate limited by upstream")]
    RateLimited,
    #[error("upstream error: {0}")]
    Api(assembly_api::Error),
    #[error("{0}")]
    Other(String),
}

impl FetchError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, FetchError::RateLimited)
    }
}

impl From<assembly_api::Error> for FetchError {
    fn from(e: assembly_api::Error) -> Self {
        if e.is_rate_limited() {
            FetchError::RateLimited
        } else {
            FetchError::Api(e)
        }
    }
}

/// A single fetched record that cannot be merged. The record is skipped and
/// the rest of its batch continues.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed record: {0}")]
pub struct MalformedRecord(pub String);

impl MalformedRecord {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}
