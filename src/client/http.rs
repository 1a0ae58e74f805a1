//! HTTP transport and retry layer
//!
//! A GET-only transport behind a trait so tests can script responses, and a
//! bounded-retry wrapper shared by both API clients. Rate limiting (HTTP
//! 429) backs off on a longer schedule than ordinary failures and always
//! consumes an attempt.

use crate::config::RetryConfig;
use crate::error::{AnalysisError, Result};
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Raw outcome of one GET attempt
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// One-shot GET capability
#[cfg_attr(test, automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str, params: &[(String, String)]) -> Result<HttpResponse>;
}

/// Transport backed by a reqwest client
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    /// Build a transport with a per-attempt timeout and optional bearer auth
    pub fn new(timeout: Duration, bearer_token: Option<&str>) -> Result<Self> {
        let mut builder = Client::builder().timeout(timeout);

        if let Some(token) = bearer_token {
            let mut headers = HeaderMap::new();
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| AnalysisError::Config(format!("invalid API key: {e}")))?;
            headers.insert(AUTHORIZATION, value);
            builder = builder.default_headers(headers);
        }

        Ok(Self {
            http: builder.build()?,
        })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str, params: &[(String, String)]) -> Result<HttpResponse> {
        let resp = self.http.get(url).query(params).send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        Ok(HttpResponse { status, body })
    }
}

/// Retry schedule: attempt indexes are zero-based
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts per call
    pub max_attempts: u32,
    /// Exponential backoff base in seconds
    pub backoff_base: f64,
}

impl RetryPolicy {
    pub fn from_config(retry: &RetryConfig) -> Self {
        Self {
            max_attempts: retry.max_attempts,
            backoff_base: retry.backoff_base,
        }
    }

    /// Delay before the next attempt after a transport or status failure
    pub fn transport_delay(&self, attempt: u32) -> Duration {
        Self::to_duration(self.backoff_base.powi(attempt as i32))
    }

    /// Delay after a 429 before the next attempt
    pub fn rate_limit_delay(&self, attempt: u32) -> Duration {
        Self::to_duration(self.backoff_base.powi(attempt as i32 + 1))
    }

    fn to_duration(secs: f64) -> Duration {
        // Overflow protection: misconfigured bases must not panic the sleep
        Duration::from_secs_f64(secs.clamp(0.0, 3600.0))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: 2.0,
        }
    }
}

/// GET-with-retries wrapper around a transport
pub struct RetryingClient {
    transport: Arc<dyn HttpTransport>,
    policy: RetryPolicy,
}

impl RetryingClient {
    pub fn new(transport: Arc<dyn HttpTransport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    /// Perform a GET and decode the JSON body, retrying per policy
    ///
    /// Exhausted attempts surface the last captured error; the caller
    /// decides whether that is fatal or just a failed data point.
    pub async fn get_json(&self, url: &str, params: &[(String, String)]) -> Result<serde_json::Value> {
        let mut last_error: Option<AnalysisError> = None;

        for attempt in 0..self.policy.max_attempts {
            match self.transport.get(url, params).await {
                Ok(resp) if resp.status == 429 => {
                    let delay = self.policy.rate_limit_delay(attempt);
                    warn!(
                        "Rate limited on {} (attempt {}/{}), backing off {:.1}s",
                        url,
                        attempt + 1,
                        self.policy.max_attempts,
                        delay.as_secs_f64()
                    );
                    last_error = Some(AnalysisError::RateLimited);
                    tokio::time::sleep(delay).await;
                    continue;
                }
                Ok(resp) if (200..300).contains(&resp.status) => {
                    match serde_json::from_str(&resp.body) {
                        Ok(value) => return Ok(value),
                        Err(e) => {
                            warn!(
                                "Undecodable body from {} (attempt {}/{}): {}",
                                url,
                                attempt + 1,
                                self.policy.max_attempts,
                                e
                            );
                            last_error = Some(AnalysisError::Json(e));
                        }
                    }
                }
                Ok(resp) => {
                    warn!(
                        "HTTP {} from {} (attempt {}/{})",
                        resp.status,
                        url,
                        attempt + 1,
                        self.policy.max_attempts
                    );
                    last_error = Some(AnalysisError::Api(format!(
                        "HTTP {} from {}",
                        resp.status, url
                    )));
                }
                Err(e) => {
                    warn!(
                        "Attempt {}/{} failed for {}: {}",
                        attempt + 1,
                        self.policy.max_attempts,
                        url,
                        e
                    );
                    last_error = Some(e);
                }
            }

            if attempt + 1 < self.policy.max_attempts {
                tokio::time::sleep(self.policy.transport_delay(attempt)).await;
            }
        }

        Err(last_error.unwrap_or_else(|| AnalysisError::Api("max retries exceeded".to_string())))
    }
}
