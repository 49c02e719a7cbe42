pub mod atcoder;
pub mod codeforces;
pub mod kontests;

use crate::model::ContestRecord;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

pub use atcoder::AtCoderProblemsSource;
pub use codeforces::CodeforcesSource;
pub use kontests::KontestsSource;

pub type Result<T> = std::result::Result<T, SourceError>;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to request contest listing")]
    RequestError(#[from] reqwest::Error),
    #[error("failed to deserialize contest listing")]
    DeserializeError(#[from] serde_json::Error),
    #[error("invalid source url given")]
    InvalidUrlError(#[from] url::ParseError),
    #[error("{0}")]
    UnexpectedError(String),
}

/// One contest-listing source. Each source is fetched independently of the others.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    fn name(&self) -> &str;
    async fn fetch_all(&self) -> Result<Vec<ContestRecord>>;
}

/// HTTP client shared by the listing sources.
pub fn http_client(timeout: Duration) -> Result<Client> {
    let client = Client::builder().gzip(true).timeout(timeout).build()?;
    Ok(client)
}
