use crate::model::ContestRecord;
use crate::source::{SourceError, SourceFetcher};
use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use std::sync::Arc;

/// A source that contributed nothing to an aggregate, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFailure {
    pub source: String,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct Aggregate {
    pub records: Vec<ContestRecord>,
    pub failures: Vec<SourceFailure>,
}

impl Aggregate {
    fn absorb(&mut self, source: String, result: Result<Vec<ContestRecord>, SourceError>) {
        match result {
            Ok(mut records) => {
                tracing::info!("{} contests collected from {}.", records.len(), source);
                self.records.append(&mut records);
            }
            Err(e) => {
                tracing::error!("failed to fetch contests from {}: {:?}", source, e);
                self.failures.push(SourceFailure {
                    source,
                    reason: e.to_string(),
                });
            }
        }
    }
}

pub struct Aggregator {
    sources: Vec<Arc<dyn SourceFetcher>>,
}

impl Aggregator {
    pub fn new(sources: Vec<Arc<dyn SourceFetcher>>) -> Self {
        Self { sources }
    }

    pub fn source_names(&self) -> Vec<String> {
        self.sources
            .iter()
            .map(|source| source.name().to_string())
            .collect()
    }

    /// Fetch every source concurrently and keep each outcome separate.
    pub async fn fetch_each(&self) -> Vec<(String, Result<Vec<ContestRecord>, SourceError>)> {
        let mut tasks: FuturesUnordered<_> = self
            .sources
            .iter()
            .map(|source| async move { (source.name().to_string(), source.fetch_all().await) })
            .collect();

        let mut outcomes = Vec::with_capacity(self.sources.len());
        while let Some(outcome) = tasks.next().await {
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Fetch every source and concatenate the records in completion order.
    ///
    /// A failing source contributes no records and a [`SourceFailure`]; it never aborts the batch.
    pub async fn fetch_all(&self) -> Aggregate {
        let mut aggregate = Aggregate::default();
        for (source, result) in self.fetch_each().await {
            aggregate.absorb(source, result);
        }

        tracing::info!(
            "{} contests aggregated from {} sources ({} failed).",
            aggregate.records.len(),
            self.sources.len(),
            aggregate.failures.len()
        );
        aggregate
    }
}
