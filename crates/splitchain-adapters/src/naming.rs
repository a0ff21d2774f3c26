//! Naming-service adapters.

use crate::http::{build_http_client, truncate};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use splitchain_core::{NameService, SplitchainError};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// In-memory alias table for demos and local runs.
#[derive(Debug, Clone, Default)]
pub struct StaticNameService {
    entries: HashMap<String, String>,
}

impl StaticNameService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut service = Self::new();
        for (alias, address) in entries {
            service.insert(alias.as_ref(), address);
        }
        service
    }

    pub fn with_alias(mut self, alias: &str, address: impl Into<String>) -> Self {
        self.insert(alias, address);
        self
    }

    pub fn insert(&mut self, alias: &str, address: impl Into<String>) {
        self.entries
            .insert(alias.trim().to_ascii_lowercase(), address.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl NameService for StaticNameService {
    fn service_id(&self) -> &'static str {
        "static"
    }

    async fn lookup(&self, alias: &str) -> Result<Option<String>, SplitchainError> {
        Ok(self.entries.get(&alias.to_ascii_lowercase()).cloned())
    }
}

#[derive(Debug, Deserialize)]
struct NameRecord {
    address: Option<String>,
}

/// Naming service reached over HTTP: `GET {endpoint}/{alias}` answering
/// `{"address": "0x..."}`. A 404 means the name does not exist.
#[derive(Debug, Clone)]
pub struct HttpNameService {
    client: Client,
    endpoint: String,
}

impl HttpNameService {
    pub fn new(endpoint: impl Into<String>, request_timeout: Duration) -> Result<Self, SplitchainError> {
        let endpoint = endpoint.into();
        if endpoint.trim().is_empty() {
            return Err(SplitchainError::Config(
                "naming service endpoint must not be empty".to_string(),
            ));
        }
        Ok(Self {
            client: build_http_client(request_timeout)?,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl NameService for HttpNameService {
    fn service_id(&self) -> &'static str {
        "http"
    }

    async fn lookup(&self, alias: &str) -> Result<Option<String>, SplitchainError> {
        let url = format!("{}/{}", self.endpoint, alias);
        debug!(url = %url, "querying naming service");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SplitchainError::resolution(alias, format!("naming request failed: {}", e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SplitchainError::resolution(
                alias,
                format!("naming service error {}: {}", status, truncate(&body, 320)),
            ));
        }

        let record: NameRecord = response.json().await.map_err(|e| {
            SplitchainError::resolution(alias, format!("invalid naming service response: {}", e))
        })?;
        Ok(record.address.filter(|address| !address.trim().is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ALICE: &str = "0x1a2B3c4d5E6f7a8B9c0D1e2F3a4b5c6d7e8f9a0B";

    #[tokio::test]
    async fn static_lookup_ignores_alias_case() {
        let names = StaticNameService::new().with_alias("Alice.ETH", ALICE);
        assert_eq!(names.lookup("alice.eth").await.unwrap().as_deref(), Some(ALICE));
        assert_eq!(names.lookup("bob.eth").await.unwrap(), None);
    }

    #[tokio::test]
    async fn http_lookup_reads_address_field() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/names/alice.eth"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "address": ALICE })))
            .mount(&server)
            .await;

        let names =
            HttpNameService::new(format!("{}/names/", server.uri()), Duration::from_secs(5)).unwrap();
        assert_eq!(names.lookup("alice.eth").await.unwrap().as_deref(), Some(ALICE));
    }

    #[tokio::test]
    async fn http_not_found_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let names = HttpNameService::new(server.uri(), Duration::from_secs(5)).unwrap();
        assert_eq!(names.lookup("scam.eth").await.unwrap(), None);
    }

    #[tokio::test]
    async fn http_server_error_names_alias() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let names = HttpNameService::new(server.uri(), Duration::from_secs(5)).unwrap();
        let err = names.lookup("alice.eth").await.unwrap_err();
        assert!(matches!(err, SplitchainError::Resolution { ref identifier, .. } if identifier == "alice.eth"));
        assert!(err.to_string().contains("upstream down"));
    }

    #[test]
    fn empty_endpoint_is_a_config_error() {
        assert!(matches!(
            HttpNameService::new("  ", Duration::from_secs(1)),
            Err(SplitchainError::Config(_))
        ));
    }
}
