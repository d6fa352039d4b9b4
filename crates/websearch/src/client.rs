//! Web search client for the two supported backends.
//!
//! Self-hosted wire contract:
//! `GET <endpoint>/search?q=<query>&format=json` → `{ "results": [{ title, url, content|snippet }] }`
//!
//! Hosted API wire contract:
//! `POST <endpoint>` with `{"q": <query>}` and `X-API-KEY` → `{ "organic": [{ title, link, snippet }] }`

use crate::types::{BackendKind, SearchOutcome, SearchResult};
use ragomatic_core::WebSearchSettings;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// Identifying user agent sent to search backends.
pub const USER_AGENT: &str = concat!("ragomatic/", env!("CARGO_PKG_VERSION"));

/// Characters of an unparseable body kept in error messages.
const BODY_SNIPPET_CHARS: usize = 200;

/// Why a self-hosted request failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelfHostedError {
    /// HTTP 403, usually the service's bot limiter
    BotDetection,
    HttpStatus(u16),
    /// Connection refused, DNS failure or timeout
    Unreachable(String),
    /// 2xx response whose body is not JSON; holds the start of the body
    NonJson(String),
}

impl std::fmt::Display for SelfHostedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BotDetection => write!(
                f,
                "self-hosted search rejected the request with HTTP 403 (bot detection); \
                 allow the JSON format and relax the limiter in the service settings"
            ),
            Self::HttpStatus(code) => write!(f, "self-hosted search returned HTTP {}", code),
            Self::Unreachable(reason) => write!(f, "self-hosted search unreachable: {}", reason),
            Self::NonJson(snippet) => {
                write!(f, "self-hosted search returned a non-JSON body: {}", snippet)
            }
        }
    }
}

/// Anything that can run a web query against a resolved backend.
#[async_trait::async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str, backend: BackendKind) -> SearchOutcome;
}

/// HTTP implementation of [`WebSearch`].
#[derive(Debug, Clone)]
pub struct WebSearchClient {
    client: reqwest::Client,
    self_hosted_endpoint: String,
    hosted_endpoint: String,
    hosted_key: Option<String>,
    max_results: usize,
    timeout: Duration,
}

impl WebSearchClient {
    /// Build from settings; the hosted key is read from the configured env var.
    pub fn new(settings: &WebSearchSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            self_hosted_endpoint: settings.self_hosted_endpoint.trim_end_matches('/').to_string(),
            hosted_endpoint: settings.hosted_endpoint.clone(),
            hosted_key: settings.hosted_api_key(),
            max_results: settings.max_results,
            timeout: Duration::from_secs(settings.timeout_secs),
        }
    }

    pub fn with_hosted_key(mut self, key: Option<String>) -> Self {
        self.hosted_key = key;
        self
    }

    async fn search_hosted(&self, query: &str) -> SearchOutcome {
        let Some(key) = self.hosted_key.as_deref() else {
            tracing::debug!("Hosted search skipped: no API key");
            return SearchOutcome::ok(Vec::new());
        };

        let response = self
            .client
            .post(&self.hosted_endpoint)
            .header("X-API-KEY", key)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .json(&serde_json::json!({ "q": query }))
            .timeout(self.timeout)
            .send()
            .await;

        let response = match response {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                tracing::warn!("Hosted search returned HTTP {}", r.status());
                return SearchOutcome::ok(Vec::new());
            }
            Err(e) => {
                tracing::warn!("Hosted search request failed: {}", e);
                return SearchOutcome::ok(Vec::new());
            }
        };

        let parsed: HostedResponse = match response.json().await {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Hosted search body could not be parsed: {}", e);
                return SearchOutcome::ok(Vec::new());
            }
        };

        let results = parsed
            .organic
            .unwrap_or_default()
            .into_iter()
            .map(|r| SearchResult::new(r.title, r.link, r.snippet));

        SearchOutcome::ok(keep_displayable(results, self.max_results))
    }

    async fn search_self_hosted(&self, query: &str) -> SearchOutcome {
        let body =
            match fetch_self_hosted(&self.client, &self.self_hosted_endpoint, query, self.timeout)
                .await
            {
                Ok(body) => body,
                Err(e) => return SearchOutcome::failed(e.to_string()),
            };

        let results = body
            .get("results")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .map(|item| {
                        let text = |key: &str| {
                            item.get(key)
                                .and_then(Value::as_str)
                                .filter(|s| !s.trim().is_empty())
                                .map(str::to_string)
                        };
                        SearchResult::new(
                            text("title"),
                            text("url"),
                            text("content").or_else(|| text("snippet")),
                        )
                    })
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        let results = keep_displayable(results, self.max_results);
        if results.is_empty() {
            return SearchOutcome::failed(format!(
                "self-hosted search returned zero results for \"{}\"",
                query
            ));
        }

        SearchOutcome::ok(results)
    }
}

#[async_trait::async_trait]
impl WebSearch for WebSearchClient {
    async fn search(&self, query: &str, backend: BackendKind) -> SearchOutcome {
        tracing::debug!("Web search via {}: {}", backend, query);

        let outcome = match backend {
            BackendKind::HostedApi => self.search_hosted(query).await,
            BackendKind::SelfHosted => self.search_self_hosted(query).await,
        };

        tracing::info!(
            backend = backend.as_str(),
            results = outcome.results.len(),
            error = outcome.error.as_deref().unwrap_or(""),
            "Web search finished"
        );

        outcome
    }
}

#[derive(Debug, Deserialize)]
struct HostedResponse {
    organic: Option<Vec<HostedResult>>,
}

#[derive(Debug, Deserialize)]
struct HostedResult {
    title: Option<String>,
    link: Option<String>,
    snippet: Option<String>,
}

fn keep_displayable(
    results: impl IntoIterator<Item = SearchResult>,
    max_results: usize,
) -> Vec<SearchResult> {
    results
        .into_iter()
        .filter(SearchResult::is_displayable)
        .take(max_results)
        .collect()
}

/// One GET against the self-hosted search endpoint, returning the parsed JSON body.
///
/// Shared by the client and the health probe so both classify failures the
/// same way.
pub(crate) async fn fetch_self_hosted(
    client: &reqwest::Client,
    endpoint: &str,
    query: &str,
    timeout: Duration,
) -> Result<Value, SelfHostedError> {
    let url = format!("{}/search", endpoint.trim_end_matches('/'));

    let response = client
        .get(&url)
        .query(&[("q", query), ("format", "json")])
        .header(reqwest::header::USER_AGENT, USER_AGENT)
        .header(reqwest::header::ACCEPT, "application/json")
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                SelfHostedError::Unreachable(format!(
                    "no response from {} within {}s",
                    endpoint,
                    timeout.as_secs()
                ))
            } else {
                SelfHostedError::Unreachable(format!("{} ({})", endpoint, e))
            }
        })?;

    let status = response.status();
    if status == reqwest::StatusCode::FORBIDDEN {
        return Err(SelfHostedError::BotDetection);
    }
    if !status.is_success() {
        return Err(SelfHostedError::HttpStatus(status.as_u16()));
    }

    let body = response
        .text()
        .await
        .map_err(|e| SelfHostedError::Unreachable(format!("{} ({})", endpoint, e)))?;

    serde_json::from_str(&body).map_err(|_| SelfHostedError::NonJson(body_snippet(&body)))
}

fn body_snippet(body: &str) -> String {
    body.trim().chars().take(BODY_SNIPPET_CHARS).collect()
}
