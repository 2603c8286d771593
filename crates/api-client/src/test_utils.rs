//! Test utilities and fixtures for BuyLocal API testing
//!
//! This module provides a recording transport that doubles as a call-count
//! spy, canned envelope bodies, and a ready-wired [`ApiContext`].

use crate::config::{StaticConfig, TestModeSwitch};
use crate::descriptor::{ApiContext, FixedClock};
use crate::http::{ApiClient, ApiClientConfig, HttpTransport, TransportError, TransportRequest, TransportResponse};
use crate::session::SessionWriter;
use crate::NetworkErrorKind;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Base URL used by fixture clients
pub const TEST_BASE_URL: &str = "https://api.buylocal.test";

/// Scripted reply for one transport call
#[derive(Debug, Clone)]
pub enum Reply {
    /// The server answered
    Response(TransportResponse),
    /// No response was received
    Failure(TransportError),
}

/// Transport that records every request and answers from a script
///
/// Once the script runs out it answers `200 {}`.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    requests: Mutex<Vec<TransportRequest>>,
    script: Mutex<VecDeque<Reply>>,
}

impl RecordingTransport {
    /// Create an empty transport
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a JSON reply
    pub fn respond_json(&self, status: u16, body: Value) {
        self.script.lock().push_back(Reply::Response(responses::json(status, &body)));
    }

    /// Queue a transport failure
    pub fn fail(&self, kind: NetworkErrorKind, message: &str) {
        self.script
            .lock()
            .push_back(Reply::Failure(TransportError::new(kind, message)));
    }

    /// Number of requests seen so far
    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// All requests seen so far
    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().clone()
    }

    /// The most recent request
    pub fn last_request(&self) -> Option<TransportRequest> {
        self.requests.lock().last().cloned()
    }
}

#[async_trait]
impl HttpTransport for RecordingTransport {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        self.requests.lock().push(request);
        match self.script.lock().pop_front() {
            Some(Reply::Response(response)) => Ok(response),
            Some(Reply::Failure(error)) => Err(error),
            None => Ok(responses::json(200, &serde_json::json!({}))),
        }
    }
}

/// Canned transport responses
pub mod responses {
    use super::*;

    /// A JSON response with the given status
    pub fn json(status: u16, body: &Value) -> TransportResponse {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        TransportResponse { status, headers, body: body.to_string().into_bytes() }
    }
}

/// Canned backend envelopes
pub mod envelopes {
    use serde_json::{json, Value};

    /// Successful login envelope with the token under `data.token`
    pub fn login(email: &str, token: &str) -> Value {
        json!({
            "message": "Login successful",
            "data": {
                "token": token,
                "user": {
                    "id": "user-1",
                    "email": email,
                    "firstName": "Ada",
                    "lastName": "Lovelace",
                    "isVerified": true
                }
            }
        })
    }

    /// Envelope carrying only a message
    pub fn message(text: &str) -> Value {
        json!({ "message": text })
    }

    /// Error body as the backend sends it
    pub fn error(text: &str) -> Value {
        json!({ "message": text, "error": "Error" })
    }
}

/// An [`ApiContext`] over a recording transport
pub struct TestHarness {
    /// Context handed to descriptors
    pub ctx: ApiContext,
    /// Spy on outgoing requests
    pub transport: Arc<RecordingTransport>,
    /// Session writer
    pub session: SessionWriter,
    /// Mutable configuration (toggle `TEST_MODE` here)
    pub config: StaticConfig,
}

impl TestHarness {
    /// Live mode, empty session, clock fixed at 2024-01-01T00:00:00Z
    pub fn new() -> Self {
        let transport = RecordingTransport::new();
        let session = SessionWriter::new();
        let config = StaticConfig::new().with(crate::config::API_URL, TEST_BASE_URL);
        config.set_test_mode(false);

        let client = ApiClient::with_transport(ApiClientConfig::new(TEST_BASE_URL), transport.clone());
        let clock = Utc
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .map(FixedClock)
            .unwrap_or(FixedClock(Utc::now()));
        let ctx = ApiContext::new(client, session.handle(), TestModeSwitch::new(Arc::new(config.clone())))
            .with_clock(Arc::new(clock));

        Self { ctx, transport, session, config }
    }

    /// Same harness with test mode on
    pub fn mocked() -> Self {
        let harness = Self::new();
        harness.config.set_test_mode(true);
        harness
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::ApiRequest;

    #[tokio::test]
    async fn test_script_then_default() {
        let harness = TestHarness::new();
        harness.transport.respond_json(201, envelopes::message("created"));

        let first = harness.ctx.client().send(ApiRequest::post("/a")).await.unwrap();
        assert_eq!(first.status, 201);

        let second = harness.ctx.client().send(ApiRequest::get("/b")).await.unwrap();
        assert_eq!(second.status, 200);

        assert_eq!(harness.transport.call_count(), 2);
        assert_eq!(
            harness.transport.last_request().unwrap().url,
            format!("{}/b", TEST_BASE_URL)
        );
    }

    #[tokio::test]
    async fn test_scripted_failure() {
        let harness = TestHarness::new();
        harness.transport.fail(NetworkErrorKind::Timeout, "deadline elapsed");

        let err = harness.ctx.client().send(ApiRequest::get("/slow")).await.unwrap_err();
        assert!(err.is_network_error());
    }

    #[test]
    fn test_mocked_harness() {
        assert_eq!(TestHarness::mocked().ctx.strategy(), crate::Strategy::Mock);
        assert_eq!(TestHarness::new().ctx.strategy(), crate::Strategy::Live);
    }
}
