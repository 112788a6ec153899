//! HTTP adapter implementing `KnowledgeGraph` against an external discovery
//! service (spec §4.11, `KgBackend::Http`).
//!
//! Grounded on the teacher's `crates/kg::rest::RestSerialMemoryClient`: a
//! pooled `reqwest::Client`, retry with exponential backoff on transient
//! (5xx / timeout) failures, no retry on 4xx, and a trace event per attempt.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use sentinel_domain::config::KgConfig;
use sentinel_domain::error::{Error, Result};
use sentinel_domain::trace::TraceEvent;
use sentinel_domain::types::{DiscoveryStatus, Severity};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::provider::KnowledgeGraph;
use crate::types::{Discovery, SearchQuery};

const MAX_RETRIES: u32 = 3;

/// A REST-based client for an external knowledge-graph service.
///
/// Created once and reused for the process lifetime; the underlying
/// `reqwest::Client` keeps its own connection pool.
#[derive(Debug, Clone)]
pub struct HttpKnowledgeGraph {
    http: Client,
    base_url: String,
    auth_token: Option<String>,
}

impl HttpKnowledgeGraph {
    pub fn new(cfg: &KgConfig) -> Result<Self> {
        let base_url = cfg
            .base_url
            .as_deref()
            .ok_or_else(|| Error::Config("kg.base_url required when backend = http".into()))?
            .trim_end_matches('/')
            .to_owned();

        let auth_token = cfg
            .auth_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok());

        let http = Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            auth_token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn decorate(&self, rb: RequestBuilder) -> RequestBuilder {
        let trace_id = Uuid::new_v4().to_string();
        let mut rb = rb.header("X-Trace-Id", &trace_id);
        if let Some(ref token) = self.auth_token {
            rb = rb.bearer_auth(token);
        }
        rb
    }

    /// Execute a request with retry + exponential backoff on transient errors.
    ///
    /// Retries on 5xx status codes and on timeouts/connection errors. Does
    /// **not** retry on 4xx (client errors are permanent). Emits a
    /// `TraceEvent::KnowledgeGraphCall` after every attempt.
    async fn execute_with_retry(
        &self,
        endpoint: &str,
        build_request: impl Fn() -> RequestBuilder,
    ) -> Result<Response> {
        let mut last_err: Option<Error> = None;

        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                let backoff = Duration::from_millis(100 * 2u64.pow(attempt - 1));
                tokio::time::sleep(backoff).await;
            }

            let start = Instant::now();
            let rb = self.decorate(build_request());
            let result = rb.send().await;
            let duration_ms = start.elapsed().as_millis() as u64;

            match result {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    TraceEvent::KnowledgeGraphCall {
                        endpoint: endpoint.to_owned(),
                        status,
                        duration_ms,
                    }
                    .emit();

                    if resp.status().is_server_error() {
                        let body = resp.text().await.unwrap_or_default();
                        last_err = Some(Error::ServiceUnavailable(format!(
                            "{endpoint} returned {status}: {body}"
                        )));
                        continue;
                    }

                    if resp.status().is_client_error() {
                        let resp_status = resp.status();
                        let body = resp.text().await.unwrap_or_default();
                        if resp_status == StatusCode::UNAUTHORIZED
                            || resp_status == StatusCode::FORBIDDEN
                        {
                            return Err(Error::AuthRequired(format!(
                                "{endpoint} auth failed ({status}): {body}"
                            )));
                        }
                        return Err(Error::Other(format!(
                            "{endpoint} returned {status}: {body}"
                        )));
                    }

                    return Ok(resp);
                }
                Err(e) => {
                    let status = e.status().map(|s| s.as_u16()).unwrap_or(0);
                    TraceEvent::KnowledgeGraphCall {
                        endpoint: endpoint.to_owned(),
                        status,
                        duration_ms,
                    }
                    .emit();

                    last_err = Some(from_reqwest(e));
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| Error::Http(format!("{endpoint}: all retries exhausted"))))
    }
}

fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}

#[derive(Debug, Serialize)]
struct StoreRequest<'a> {
    author_uuid: String,
    summary: &'a str,
    details: &'a str,
    tags: &'a [String],
    severity: &'static str,
    kind: &'a str,
}

#[derive(Debug, Deserialize)]
struct StoreResponse {
    id: Uuid,
}

#[derive(Debug, Serialize)]
struct SearchRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    severity: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    author: Option<String>,
    limit: usize,
}

#[derive(Debug, Serialize)]
struct UpdateStatusRequest {
    status: &'static str,
    updater: String,
}

#[async_trait]
impl KnowledgeGraph for HttpKnowledgeGraph {
    async fn store(
        &self,
        author: Uuid,
        summary: &str,
        details: &str,
        tags: &[String],
        severity: Severity,
        kind: &str,
    ) -> Result<Uuid> {
        let url = self.url("/discoveries");
        let body = StoreRequest {
            author_uuid: author.to_string(),
            summary,
            details,
            tags,
            severity: severity.as_str(),
            kind,
        };
        let resp = self
            .execute_with_retry("POST /discoveries", || self.http.post(&url).json(&body))
            .await?;
        let parsed: StoreResponse = resp
            .json()
            .await
            .map_err(|e| Error::Http(format!("parse store response: {e}")))?;

        TraceEvent::KnowledgeDiscoveryStored {
            discovery_id: parsed.id.to_string(),
            author_uuid: author.to_string(),
        }
        .emit();

        Ok(parsed.id)
    }

    async fn search(&self, query: SearchQuery) -> Result<Vec<Discovery>> {
        let url = self.url("/discoveries/search");
        let body = SearchRequest {
            query: query.text,
            tags: query.tags,
            severity: query.severity.map(|s| s.as_str()),
            author: query.author.map(|a| a.to_string()),
            limit: if query.limit == 0 { 100 } else { query.limit },
        };
        let resp = self
            .execute_with_retry("POST /discoveries/search", || {
                self.http.post(&url).json(&body)
            })
            .await?;
        resp.json()
            .await
            .map_err(|e| Error::Http(format!("parse search response: {e}")))
    }

    async fn update_status(
        &self,
        discovery_id: Uuid,
        new_status: DiscoveryStatus,
        updater: Uuid,
    ) -> Result<()> {
        let url = self.url(&format!("/discoveries/{discovery_id}/status"));
        let body = UpdateStatusRequest {
            status: new_status.as_str(),
            updater: updater.to_string(),
        };
        self.execute_with_retry(&format!("PATCH /discoveries/{discovery_id}/status"), || {
            self.http.patch(&url).json(&body)
        })
        .await?;
        Ok(())
    }
}
