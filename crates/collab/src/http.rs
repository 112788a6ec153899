//! HTTP adapters implementing [`SemanticEmbedder`] and
//! [`DialecticCollaborator`] against an external model service
//! (`CollabBackend::Http`).
//!
//! Grounded on `sentinel_kg::http::HttpKnowledgeGraph`: a pooled
//! `reqwest::Client`, bearer auth from an env var, and a bounded timeout.
//! Unlike the knowledge-graph client this adapter does not retry — a
//! stalled embedding or dialectic-assist call should surface immediately
//! so the caller can fall back rather than stall a governance update.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use sentinel_domain::config::CollabConfig;
use sentinel_domain::error::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::dialectic::{CollaboratorOutput, DialecticCollaborator, ThesisInput};
use crate::embedder::SemanticEmbedder;

#[derive(Debug, Clone)]
pub struct HttpEmbedder {
    http: Client,
    base_url: String,
    auth_token: Option<String>,
    dim: usize,
}

impl HttpEmbedder {
    pub fn new(cfg: &CollabConfig) -> Result<Self> {
        let base_url = cfg
            .base_url
            .as_deref()
            .ok_or_else(|| Error::Config("collab.base_url required when backend = http".into()))?
            .trim_end_matches('/')
            .to_owned();
        let auth_token = cfg
            .auth_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok());
        let http = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            auth_token,
            dim: cfg.embedding_dim,
        })
    }

    fn decorate(&self, rb: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => rb.bearer_auth(token),
            None => rb,
        }
    }
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    text: &'a str,
    dim: usize,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    vector: Vec<f64>,
}

#[async_trait]
impl SemanticEmbedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f64>> {
        let url = format!("{}/embed", self.base_url);
        let rb = self.decorate(self.http.post(&url).json(&EmbedRequest {
            text,
            dim: self.dim,
        }));
        let resp = rb
            .send()
            .await
            .map_err(|e| Error::Http(format!("POST /embed: {e}")))?;
        if !resp.status().is_success() {
            return Err(Error::ServiceUnavailable(format!(
                "POST /embed returned {}",
                resp.status()
            )));
        }
        let parsed: EmbedResponse = resp
            .json()
            .await
            .map_err(|e| Error::Http(format!("parse embed response: {e}")))?;
        Ok(parsed.vector)
    }

    fn dim(&self) -> usize {
        self.dim
    }
}

#[derive(Debug, Clone)]
pub struct HttpDialecticCollaborator {
    http: Client,
    base_url: String,
    auth_token: Option<String>,
}

impl HttpDialecticCollaborator {
    pub fn new(cfg: &CollabConfig) -> Result<Self> {
        let base_url = cfg
            .base_url
            .as_deref()
            .ok_or_else(|| Error::Config("collab.base_url required when backend = http".into()))?
            .trim_end_matches('/')
            .to_owned();
        let auth_token = cfg
            .auth_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok());
        let http = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            auth_token,
        })
    }

    fn decorate(&self, rb: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => rb.bearer_auth(token),
            None => rb,
        }
    }
}

#[derive(Debug, Serialize)]
struct ThesisRequest<'a> {
    reasoning: &'a str,
    proposed_conditions: &'a [String],
    root_cause: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct SynthesisRequest<'a> {
    thesis: ThesisRequest<'a>,
    antithesis: &'a CollaboratorOutput,
}

#[async_trait]
impl DialecticCollaborator for HttpDialecticCollaborator {
    async fn antithesis(&self, thesis: ThesisInput<'_>) -> Result<CollaboratorOutput> {
        let url = format!("{}/antithesis", self.base_url);
        let body = ThesisRequest {
            reasoning: thesis.reasoning,
            proposed_conditions: thesis.proposed_conditions,
            root_cause: thesis.root_cause,
        };
        let resp = self
            .decorate(self.http.post(&url).json(&body))
            .send()
            .await
            .map_err(|e| Error::Http(format!("POST /antithesis: {e}")))?;
        if !resp.status().is_success() {
            return Err(Error::ServiceUnavailable(format!(
                "POST /antithesis returned {}",
                resp.status()
            )));
        }
        resp.json()
            .await
            .map_err(|e| Error::Http(format!("parse antithesis response: {e}")))
    }

    async fn synthesis(
        &self,
        thesis: ThesisInput<'_>,
        antithesis: &CollaboratorOutput,
    ) -> Result<CollaboratorOutput> {
        let url = format!("{}/synthesis", self.base_url);
        let body = SynthesisRequest {
            thesis: ThesisRequest {
                reasoning: thesis.reasoning,
                proposed_conditions: thesis.proposed_conditions,
                root_cause: thesis.root_cause,
            },
            antithesis,
        };
        let resp = self
            .decorate(self.http.post(&url).json(&body))
            .send()
            .await
            .map_err(|e| Error::Http(format!("POST /synthesis: {e}")))?;
        if !resp.status().is_success() {
            return Err(Error::ServiceUnavailable(format!(
                "POST /synthesis returned {}",
                resp.status()
            )));
        }
        resp.json()
            .await
            .map_err(|e| Error::Http(format!("parse synthesis response: {e}")))
    }
}
