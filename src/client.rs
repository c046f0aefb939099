use crate::config::ServiceConfig;
use crate::model::{AnalyzeResponse, ErrorBody, RankedTask, SuggestResponse};
use anyhow::{Context, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const FALLBACK_ERROR: &str = "Server Error";

/// Failure of a single call to the prioritization service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The service answered with a non-success status.
    #[error("{message}")]
    Rejected { status: u16, message: String },
    /// The request could not complete.
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    /// A success response whose body is not what the contract promises.
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Percent-encode a query parameter value.
fn encode_param(s: &str) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char);
            }
            _ => {
                let _ = write!(out, "%{:02X}", b);
            }
        }
    }
    out
}

/// HTTP client for the `analyze` and `suggest` endpoints.
pub struct ServiceClient {
    base_url: String,
    client: Client,
    suggest_strategy: bool,
}

impl ServiceClient {
    pub fn new(service: &ServiceConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = service.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().context("Failed to build HTTP client")?;
        Ok(Self {
            base_url: service.base_url.trim().trim_end_matches('/').to_string(),
            client,
            suggest_strategy: service.supports_suggest_strategy,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `POST {base}/analyze/?strategy=..` with the candidate set as body.
    pub async fn analyze(
        &self,
        tasks: &[Value],
        strategy: &str,
    ) -> std::result::Result<Vec<RankedTask>, ServiceError> {
        let url = format!(
            "{}/analyze/?strategy={}",
            self.base_url,
            encode_param(strategy)
        );
        debug!("POST {} ({} tasks)", url, tasks.len());
        let resp = self.client.post(&url).json(tasks).send().await?;
        let body: AnalyzeResponse = Self::decode(resp).await?;
        Ok(body.tasks)
    }

    /// `GET {base}/suggest/`, with `?strategy=..` when the service takes one.
    pub async fn suggest(
        &self,
        strategy: &str,
    ) -> std::result::Result<SuggestResponse, ServiceError> {
        let mut url = format!("{}/suggest/", self.base_url);
        if self.suggest_strategy {
            url.push_str(&format!("?strategy={}", encode_param(strategy)));
        }
        debug!("GET {}", url);
        let resp = self.client.get(&url).send().await?;
        Self::decode(resp).await
    }

    async fn decode<T: DeserializeOwned>(
        resp: reqwest::Response,
    ) -> std::result::Result<T, ServiceError> {
        let status = resp.status();
        let bytes = resp.bytes().await?;
        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&bytes)
                .ok()
                .and_then(|body| body.error)
                .filter(|msg| !msg.is_empty())
                .unwrap_or_else(|| FALLBACK_ERROR.to_string());
            return Err(ServiceError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}
