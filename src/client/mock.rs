//! Scripted HTTP transport for testing
//!
//! Plays back a queue of canned responses and records every request, so
//! client and analyzer tests run without network access.

use crate::client::http::{HttpResponse, HttpTransport};
use crate::error::{AnalysisError, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// One recorded request: URL plus query parameters
pub type RecordedRequest = (String, Vec<(String, String)>);

struct ScriptState {
    responses: VecDeque<Result<HttpResponse>>,
    requests: Vec<RecordedRequest>,
}

/// Transport that replays a fixed script of responses
///
/// Responses are consumed in push order, one per request. Running past the
/// end of the script fails the request loudly.
pub struct ScriptedTransport {
    state: Mutex<ScriptState>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ScriptState {
                responses: VecDeque::new(),
                requests: Vec::new(),
            }),
        }
    }

    /// Queue a response with the given status and raw body
    pub fn push_response(self, status: u16, body: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .responses
            .push_back(Ok(HttpResponse {
                status,
                body: body.to_string(),
            }));
        self
    }

    /// Queue a 200 response carrying the given JSON body
    pub fn push_json(self, body: serde_json::Value) -> Self {
        self.push_response(200, &body.to_string())
    }

    /// Queue the same 200 JSON response several times in a row
    pub fn push_json_repeated(mut self, body: serde_json::Value, count: usize) -> Self {
        for _ in 0..count {
            self = self.push_response(200, &body.to_string());
        }
        self
    }

    /// Queue a transport-level failure
    pub fn push_error(self, message: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .responses
            .push_back(Err(AnalysisError::Api(message.to_string())));
        self
    }

    /// Requests seen so far, in push order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Responses still queued
    pub fn remaining(&self) -> usize {
        self.state.lock().unwrap().responses.len()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn get(&self, url: &str, params: &[(String, String)]) -> Result<HttpResponse> {
        let mut state = self.state.lock().unwrap();
        state.requests.push((url.to_string(), params.to_vec()));
        state
            .responses
            .pop_front()
            .unwrap_or_else(|| Err(AnalysisError::Api(format!("no scripted response for {url}"))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_replays_responses_in_order() {
        let transport = ScriptedTransport::new()
            .push_json(json!({"first": 1}))
            .push_response(429, "slow down")
            .push_error("connection reset");

        let first = transport.get("http://x/a", &[]).await.unwrap();
        assert_eq!(first.status, 200);
        assert_eq!(first.body, r#"{"first":1}"#);

        let second = transport.get("http://x/b", &[]).await.unwrap();
        assert_eq!(second.status, 429);

        let third = transport.get("http://x/c", &[]).await;
        assert!(third.is_err());
        assert_eq!(transport.remaining(), 0);
    }

    #[tokio::test]
    async fn test_records_urls_and_params() {
        let transport = ScriptedTransport::new().push_json(json!({}));
        let params = vec![("amount".to_string(), "50".to_string())];

        transport.get("http://x/order", &params).await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0, "http://x/order");
        assert_eq!(requests[0].1, params);
    }

    #[tokio::test]
    async fn test_exhausted_script_fails_loudly() {
        let transport = ScriptedTransport::new();
        let result = transport.get("http://x/a", &[]).await;
        assert!(result.is_err());
    }
}
