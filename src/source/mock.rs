//! Mock fetcher for testing: serves preconfigured relations

use super::remote::{RemoteError, RemoteFetcher};
use crate::model::{KbId, RawRecord};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Entity URI prefix used for mock records
pub const MOCK_ENTITY_PREFIX: &str = "http://www.wikidata.org/entity/";

/// Mock remote source.
///
/// Answers each call from, in order of precedence:
/// 1. the next scripted response, if any remain;
/// 2. a timeout, if the request is larger than the configured limit;
/// 3. the registered relations of every requested id.
///
/// Every call is recorded so tests can assert on what was requested.
#[derive(Default)]
pub struct MockFetcher {
    relations: HashMap<KbId, Vec<RawRecord>>,
    script: Mutex<VecDeque<Result<Vec<RawRecord>, RemoteError>>>,
    timeout_above: Option<usize>,
    latency: Option<Duration>,
    calls: Mutex<Vec<Vec<KbId>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a relation of `id` served on every request for it.
    pub fn with_relation(mut self, id: &str, name: &str, target: &str) -> Self {
        let record = RawRecord::triple(&format!("{}{}", MOCK_ENTITY_PREFIX, id), name, target);
        self.relations.entry(KbId::new(id)).or_default().push(record);
        self
    }

    /// Register a raw record returned whenever `id` is requested.
    pub fn with_record(mut self, id: &str, record: RawRecord) -> Self {
        self.relations.entry(KbId::new(id)).or_default().push(record);
        self
    }

    /// Queue a response for the next unanswered call.
    pub fn with_response(self, response: Result<Vec<RawRecord>, RemoteError>) -> Self {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(response);
        self
    }

    /// Time out every request for more than `max_ids` ids.
    pub fn with_timeout_above(mut self, max_ids: usize) -> Self {
        self.timeout_above = Some(max_ids);
        self
    }

    /// Sleep before answering each call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Ids requested by each call, in call order.
    pub fn calls(&self) -> Vec<Vec<KbId>> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl RemoteFetcher for MockFetcher {
    async fn fetch(&self, ids: &[KbId]) -> Result<Vec<RawRecord>, RemoteError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ids.to_vec());

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let scripted = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        if let Some(response) = scripted {
            return response;
        }

        if let Some(max) = self.timeout_above {
            if ids.len() > max {
                return Err(RemoteError::Timeout);
            }
        }

        Ok(ids
            .iter()
            .filter_map(|id| self.relations.get(id))
            .flatten()
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Relation;

    #[tokio::test]
    async fn serves_registered_relations() {
        let fetcher = MockFetcher::new()
            .with_relation("Q1", "occupation", "writer")
            .with_relation("Q2", "country", "Germany");

        let records = fetcher.fetch(&[KbId::new("Q1"), KbId::new("Q3")]).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(
            Relation::try_from(&records[0]).unwrap(),
            Relation::new("Q1", "occupation", "writer")
        );
        assert_eq!(fetcher.calls(), vec![vec![KbId::new("Q1"), KbId::new("Q3")]]);
    }

    #[tokio::test]
    async fn scripted_responses_take_precedence() {
        let fetcher = MockFetcher::new()
            .with_relation("Q1", "occupation", "writer")
            .with_response(Err(RemoteError::Timeout));

        let first = fetcher.fetch(&[KbId::new("Q1")]).await;
        assert_eq!(first, Err(RemoteError::Timeout));

        let second = fetcher.fetch(&[KbId::new("Q1")]).await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(fetcher.call_count(), 2);
    }

    #[tokio::test]
    async fn large_requests_time_out() {
        let fetcher = MockFetcher::new()
            .with_relation("Q1", "occupation", "writer")
            .with_timeout_above(1);

        let ids = [KbId::new("Q1"), KbId::new("Q2")];
        assert_eq!(fetcher.fetch(&ids).await, Err(RemoteError::Timeout));
        assert!(fetcher.fetch(&ids[..1]).await.is_ok());
    }
}
