use crate::date::{epoch_span, to_listing_format};
use crate::model::ContestRecord;
use crate::site::Site;
use crate::source::{Result, SourceError, SourceFetcher};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

const CONTEST_LIST_URL: &str = "https://codeforces.com/api/contest.list";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeforcesContest {
    pub id: i64,
    pub name: String,
    pub phase: String,
    pub duration_seconds: i64,
    #[serde(default)]
    pub start_time_seconds: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CodeforcesResponse {
    pub status: String,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub result: Vec<CodeforcesContest>,
}

impl CodeforcesContest {
    fn to_record(&self) -> Option<ContestRecord> {
        let (start, end) = epoch_span(self.start_time_seconds?, self.duration_seconds)?;

        Some(ContestRecord {
            name: self.name.clone(),
            url: format!("https://codeforces.com/contest/{}", self.id),
            start_time: to_listing_format(&start),
            end_time: to_listing_format(&end),
            duration: self.duration_seconds.to_string(),
            site: Site::CodeForces.name().to_string(),
            in_24_hours: String::new(),
            status: self.phase.clone(),
        })
    }
}

/// Turn an API response into records, keeping contests that are upcoming or running.
pub fn to_records(response: CodeforcesResponse) -> Result<Vec<ContestRecord>> {
    if response.status != "OK" {
        return Err(SourceError::UnexpectedError(format!(
            "codeforces api returned status {} cause [{}]",
            response.status,
            response.comment.unwrap_or_default()
        )));
    }

    Ok(response
        .result
        .iter()
        .filter(|contest| contest.phase == "BEFORE" || contest.phase == "CODING")
        .filter_map(CodeforcesContest::to_record)
        .collect())
}

pub struct CodeforcesSource {
    url: Url,
    client: Client,
}

impl CodeforcesSource {
    pub fn new(client: Client) -> Result<Self> {
        Ok(Self {
            url: Url::parse(CONTEST_LIST_URL)?,
            client,
        })
    }
}

#[async_trait]
impl SourceFetcher for CodeforcesSource {
    fn name(&self) -> &str {
        "codeforces"
    }

    async fn fetch_all(&self) -> Result<Vec<ContestRecord>> {
        tracing::info!("Start to retrieve contests from Codeforces API");
        let res = self
            .client
            .get(self.url.clone())
            .query(&[("gym", "false")])
            .send()
            .await?;

        // The API reports failures in the body, with a 400 status.
        let body = res.text().await?;
        let response: CodeforcesResponse = serde_json::from_str(&body)?;
        let records = to_records(response)?;
        tracing::info!("{} upcoming contests retrieved from Codeforces", records.len());

        Ok(records)
    }
}
