//! SPARQL endpoint fetcher (Wikidata query service)
//!
//! Sends one query per batch, selecting every statement of the requested
//! entities together with English labels for the property and value.
//! In-flight requests are capped at the endpoint's concurrency budget.

use super::remote::{RemoteError, RemoteFetcher};
use crate::config::EndpointConfig;
use crate::model::{KbId, RawRecord, NAME_FIELD, SOURCE_FIELD, TARGET_FIELD};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client as HttpClient, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::debug;

const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";

#[derive(Debug, Deserialize)]
struct SparqlResponse {
    results: SparqlResults,
}

#[derive(Debug, Deserialize)]
struct SparqlResults {
    bindings: Vec<HashMap<String, SparqlTerm>>,
}

#[derive(Debug, Deserialize)]
struct SparqlTerm {
    value: String,
}

impl SparqlResponse {
    fn into_records(self) -> Vec<RawRecord> {
        self.results
            .bindings
            .into_iter()
            .map(|binding| {
                binding
                    .into_iter()
                    .map(|(key, term)| (key, term.value))
                    .collect::<RawRecord>()
            })
            .collect()
    }
}

/// Build the statement query for `ids`.
pub fn relations_query(ids: &[KbId]) -> String {
    let values: Vec<String> = ids.iter().map(|id| format!("(wd:{})", id)).collect();
    format!(
        "SELECT DISTINCT ?{source} ?{name} ?{target} WHERE {{ \
         VALUES (?{source}) {{ {values} }} \
         ?{source} ?p ?statement . \
         ?statement ?ps ?ps_ . \
         ?wd wikibase:claim ?p . \
         ?wd wikibase:statementProperty ?ps . \
         SERVICE wikibase:label {{ bd:serviceParam wikibase:language \"en\" }} \
         }} ORDER BY ?wd ?statement ?ps_",
        source = SOURCE_FIELD,
        name = NAME_FIELD,
        target = TARGET_FIELD,
        values = values.join(" "),
    )
}

/// Parse a SPARQL JSON results document into raw records.
pub fn parse_results(body: &str) -> Result<Vec<RawRecord>, RemoteError> {
    let response: SparqlResponse =
        serde_json::from_str(body).map_err(|e| RemoteError::Protocol(e.to_string()))?;
    Ok(response.into_records())
}

/// Map a non-success HTTP status to a remote error.
fn classify_status(status: StatusCode) -> Option<RemoteError> {
    if status.is_success() {
        return None;
    }
    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS | StatusCode::GATEWAY_TIMEOUT => {
            Some(RemoteError::Timeout)
        }
        other => Some(RemoteError::Transport(format!("HTTP {}", other))),
    }
}

fn classify_error(error: reqwest::Error) -> RemoteError {
    if error.is_timeout() {
        RemoteError::Timeout
    } else if error.is_decode() {
        RemoteError::Protocol(error.to_string())
    } else {
        RemoteError::Transport(error.to_string())
    }
}

/// Remote fetcher backed by a SPARQL endpoint.
#[derive(Clone)]
pub struct SparqlFetcher {
    http_client: HttpClient,
    url: String,
    permits: Arc<Semaphore>,
}

impl std::fmt::Debug for SparqlFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SparqlFetcher")
            .field("url", &self.url)
            .field("available_permits", &self.permits.available_permits())
            .finish()
    }
}

impl SparqlFetcher {
    pub fn new(config: &EndpointConfig) -> Result<Self, RemoteError> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            url: config.url.clone(),
            permits: Arc::new(Semaphore::new(config.concurrent_requests.max(1))),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RemoteFetcher for SparqlFetcher {
    async fn fetch(&self, ids: &[KbId]) -> Result<Vec<RawRecord>, RemoteError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        debug!(ids = ids.len(), url = %self.url, "Sending SPARQL query");
        let query = relations_query(ids);
        let response = self
            .http_client
            .post(&self.url)
            .header(ACCEPT, SPARQL_RESULTS_JSON)
            .form(&[("query", query.as_str())])
            .send()
            .await
            .map_err(classify_error)?;

        if let Some(error) = classify_status(response.status()) {
            return Err(error);
        }

        let body: SparqlResponse = response.json().await.map_err(classify_error)?;
        Ok(body.into_records())
    }
}
