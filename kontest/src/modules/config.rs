use anyhow::{Context, Result};
use kontest_libs::source::{
    http_client, AtCoderProblemsSource, CodeforcesSource, KontestsSource,
};
use kontest_libs::SourceFetcher;
use std::{env, path::PathBuf, sync::Arc, time::Duration};

const DEFAULT_DATA_DIR: &str = ".kontest";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
pub const KNOWN_SOURCES: [&str; 3] = ["kontests", "atcoder", "codeforces"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub sources: Vec<String>,
    pub kontests_url: Option<String>,
    pub http_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = match lookup("KONTEST_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => {
                tracing::warn!(
                    "KONTEST_DATA_DIR environment variable is not set. Default value `{}` will be used.",
                    DEFAULT_DATA_DIR
                );
                PathBuf::from(DEFAULT_DATA_DIR)
            }
        };

        let sources: Vec<String> = match lookup("KONTEST_SOURCES") {
            Some(sources) => sources
                .split(',')
                .map(|source| source.trim().to_lowercase())
                .filter(|source| !source.is_empty())
                .collect(),
            None => KNOWN_SOURCES.iter().map(|source| source.to_string()).collect(),
        };
        if let Some(unknown) = sources
            .iter()
            .find(|source| !KNOWN_SOURCES.contains(&source.as_str()))
        {
            let message = format!(
                "unknown source `{}` in KONTEST_SOURCES. known sources are {}",
                unknown,
                KNOWN_SOURCES.join(", ")
            );
            tracing::error!(message);
            anyhow::bail!(message)
        }

        let http_timeout = match lookup("KONTEST_HTTP_TIMEOUT_SECS") {
            Some(secs) => secs.trim().parse::<u64>().with_context(|| {
                let message = format!("KONTEST_HTTP_TIMEOUT_SECS must be an integer: {}", secs);
                tracing::error!(message);
                message
            })?,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        Ok(Self {
            data_dir,
            sources,
            kontests_url: lookup("KONTEST_KONTESTS_URL").filter(|url| !url.trim().is_empty()),
            http_timeout: Duration::from_secs(http_timeout),
        })
    }

    /// Instantiate the enabled listing sources.
    pub fn build_sources(&self) -> Result<Vec<Arc<dyn SourceFetcher>>> {
        let client = http_client(self.http_timeout).with_context(|| {
            let message = "failed to build HTTP client.";
            tracing::error!(message);
            message
        })?;

        let mut sources: Vec<Arc<dyn SourceFetcher>> = Vec::new();
        for name in &self.sources {
            match name.as_str() {
                "kontests" => match &self.kontests_url {
                    Some(url) => {
                        let source = KontestsSource::new(url, client.clone()).with_context(|| {
                            let message = format!("invalid KONTEST_KONTESTS_URL: {}", url);
                            tracing::error!(message);
                            message
                        })?;
                        sources.push(Arc::new(source));
                    }
                    None => tracing::warn!(
                        "KONTEST_KONTESTS_URL is not set; kontests source is disabled."
                    ),
                },
                "atcoder" => sources.push(Arc::new(AtCoderProblemsSource::new(client.clone())?)),
                "codeforces" => sources.push(Arc::new(CodeforcesSource::new(client.clone())?)),
                _ => {}
            }
        }

        if sources.is_empty() {
            tracing::warn!("no contest source is enabled.");
        }
        Ok(sources)
    }
}
