use crate::date::{epoch_span, to_listing_format};
use crate::model::ContestRecord;
use crate::site::Site;
use crate::source::{Result, SourceError, SourceFetcher};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

const CONTESTS_URL: &str = "https://kenkoooo.com/atcoder/resources/contests.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContestJson {
    pub id: String,
    pub start_epoch_second: i64,
    pub duration_second: i64,
    pub title: String,
    pub rate_change: String,
}

impl ContestJson {
    fn to_record(&self) -> Option<ContestRecord> {
        let (start, end) = epoch_span(self.start_epoch_second, self.duration_second)?;

        Some(ContestRecord {
            name: self.title.clone(),
            url: format!("https://atcoder.jp/contests/{}", self.id),
            start_time: to_listing_format(&start),
            end_time: to_listing_format(&end),
            duration: self.duration_second.to_string(),
            site: Site::AtCoder.name().to_string(),
            in_24_hours: String::new(),
            status: String::new(),
        })
    }
}

/// AtCoder contests as published by AtCoder Problems.
pub struct AtCoderProblemsSource {
    url: Url,
    client: Client,
}

impl AtCoderProblemsSource {
    pub fn new(client: Client) -> Result<Self> {
        Ok(Self {
            url: Url::parse(CONTESTS_URL)?,
            client,
        })
    }

    /// Retrieve the whole contest archive from AtCoder Problems.
    pub async fn fetch_contest_list(&self) -> Result<Vec<ContestJson>> {
        tracing::info!("Start to retrieve contests information from AtCoder Problems");
        let res = self.client.get(self.url.clone()).send().await?;
        if let Err(e) = res.error_for_status_ref() {
            let message = format!("error response returned from AtCoder Problems: {:?}", e);
            tracing::error!(message);
            return Err(SourceError::UnexpectedError(message));
        }

        let contests: Vec<ContestJson> = res.json().await?;
        tracing::info!(
            "{} contests information successfully retrieved.",
            contests.len()
        );

        Ok(contests)
    }
}

/// The full archive goes back to 2010; only contests that have not ended yet are listed.
pub fn to_records(contests: &[ContestJson], now: DateTime<Utc>) -> Vec<ContestRecord> {
    contests
        .iter()
        .filter(|contest| {
            contest
                .start_epoch_second
                .checked_add(contest.duration_second)
                .map_or(false, |end| end > now.timestamp())
        })
        .filter_map(ContestJson::to_record)
        .collect()
}

#[async_trait]
impl SourceFetcher for AtCoderProblemsSource {
    fn name(&self) -> &str {
        "atcoder"
    }

    async fn fetch_all(&self) -> Result<Vec<ContestRecord>> {
        let contests = self.fetch_contest_list().await?;
        Ok(to_records(&contests, Utc::now()))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_to_records() {
        let raw = r#"
        [
            {"id": "abc001", "start_epoch_second": 1381579200, "duration_second": 7200, "title": "AtCoder Beginner Contest 001", "rate_change": "-"},
            {"id": "abc365", "start_epoch_second": 1722688800, "duration_second": 6000, "title": "AtCoder Beginner Contest 365", "rate_change": " ~ 1999"},
            {"id": "broken", "start_epoch_second": 9223372036854775000, "duration_second": 9223372036854775000, "title": "Broken", "rate_change": "-"}
        ]
        "#;
        let contests: Vec<ContestJson> = serde_json::from_str(raw).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 8, 1, 0, 0, 0).unwrap();

        let records = to_records(&contests, now);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "AtCoder Beginner Contest 365");
        assert_eq!(records[0].url, "https://atcoder.jp/contests/abc365");
        assert_eq!(records[0].start_time, "2024-08-03T12:40:00.000Z");
        assert_eq!(records[0].end_time, "2024-08-03T14:20:00.000Z");
        assert_eq!(records[0].duration, "6000");
        assert_eq!(records[0].site, "AtCoder");
    }
}
