use crate::model::ContestRecord;
use crate::site::site_from_location;
use crate::source::{Result, SourceError, SourceFetcher};
use async_trait::async_trait;
use reqwest::{Client, Url};

/// A listing endpoint that already serves `[ContestRecord]` JSON.
pub struct KontestsSource {
    url: Url,
    client: Client,
}

impl KontestsSource {
    pub fn new(url: &str, client: Client) -> Result<Self> {
        Ok(Self {
            url: Url::parse(url)?,
            client,
        })
    }
}

#[async_trait]
impl SourceFetcher for KontestsSource {
    fn name(&self) -> &str {
        "kontests"
    }

    async fn fetch_all(&self) -> Result<Vec<ContestRecord>> {
        tracing::info!("Start to retrieve contests from {}", self.url);
        let res = self.client.get(self.url.clone()).send().await?;

        if let Err(e) = res.error_for_status_ref() {
            let message = format!("error response returned from {}: {:?}", self.url, e);
            tracing::error!(message);
            return Err(SourceError::UnexpectedError(message));
        }

        let body = res.text().await?;
        let records: Vec<ContestRecord> = serde_json::from_str(&body)?;
        let records: Vec<ContestRecord> = records
            .into_iter()
            .map(|mut record| {
                record.site = site_from_location(&record.site);
                record
            })
            .collect();
        tracing::info!("{} contests retrieved from {}", records.len(), self.url);

        Ok(records)
    }
}
