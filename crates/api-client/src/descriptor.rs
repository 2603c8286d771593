//! Request descriptors
//!
//! A descriptor defines one named backend operation: how to validate its
//! input, how to build the live request, how to normalize the response, and
//! what to return instead when test mode is on. [`ApiContext::invoke`] runs
//! exactly one of the two paths per call.
//!
//! # Example
//!
//! ```rust
//! use api_client::descriptor::{MockEnv, RequestDescriptor};
//! use api_client::{ApiRequest, Envelope, RawResponse, Result};
//!
//! struct Ping;
//!
//! impl RequestDescriptor for Ping {
//!     type Input = ();
//!     type Output = String;
//!     const NAME: &'static str = "ping";
//!
//!     fn authenticated(&self) -> bool {
//!         false
//!     }
//!
//!     fn mock(&self, _input: &(), _env: &MockEnv) -> Result<String> {
//!         Ok("pong".to_string())
//!     }
//!
//!     fn request(&self, _input: &()) -> Result<ApiRequest> {
//!         Ok(ApiRequest::get("/ping"))
//!     }
//!
//!     fn normalize(&self, response: &RawResponse) -> Result<String> {
//!         Envelope::parse(response)?.require("/message")
//!     }
//! }
//! ```

use crate::config::TestModeSwitch;
use crate::http::{ApiClient, ApiRequest, RawResponse};
use crate::session::SessionHandle;
use crate::Result;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Which path an invocation takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Deterministic synthetic result, no network
    Mock,
    /// One HTTP call to the backend
    Live,
}

impl Strategy {
    /// Resolve from the switch, reading it now
    pub fn resolve(switch: &TestModeSwitch) -> Self {
        if switch.is_test_mode() {
            Strategy::Mock
        } else {
            Strategy::Live
        }
    }
}

/// Source of the time injected into mock producers
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current instant
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Inputs a mock producer may use besides its own arguments
///
/// Only display values (synthetic ids, timestamps) come from here, so two
/// producers given the same `MockEnv` and input return equal results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockEnv {
    now: DateTime<Utc>,
}

impl MockEnv {
    /// Create an environment at a given instant
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    /// The injected instant
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Milliseconds since the Unix epoch
    pub fn timestamp_millis(&self) -> i64 {
        self.now.timestamp_millis()
    }

    /// An id such as `order_1700000000000`
    pub fn synthetic_id(&self, prefix: &str) -> String {
        format!("{}_{}", prefix, self.timestamp_millis())
    }
}

/// One named backend operation
pub trait RequestDescriptor: Send + Sync {
    /// Caller-supplied arguments
    type Input: Send + Sync;

    /// Value returned on success
    type Output: Send;

    /// Name used in logs
    const NAME: &'static str;

    /// Whether the bearer token is attached on the live path
    fn authenticated(&self) -> bool {
        true
    }

    /// Preconditions checked before either path runs
    fn validate(&self, _input: &Self::Input) -> Result<()> {
        Ok(())
    }

    /// Synthetic result used in test mode
    fn mock(&self, input: &Self::Input, env: &MockEnv) -> Result<Self::Output>;

    /// The one HTTP request issued in live mode
    fn request(&self, input: &Self::Input) -> Result<ApiRequest>;

    /// Map the response envelope into the output type
    fn normalize(&self, response: &RawResponse) -> Result<Self::Output>;
}

/// Everything an invocation needs, passed by reference to every screen
#[derive(Debug, Clone)]
pub struct ApiContext {
    client: ApiClient,
    session: SessionHandle,
    test_mode: TestModeSwitch,
    clock: Arc<dyn Clock>,
    mock_latency: Duration,
}

impl ApiContext {
    /// Create a context with the system clock and no mock latency
    pub fn new(client: ApiClient, session: SessionHandle, test_mode: TestModeSwitch) -> Self {
        Self {
            client,
            session,
            test_mode,
            clock: Arc::new(SystemClock),
            mock_latency: Duration::ZERO,
        }
    }

    /// Replace the clock fed to mock producers
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Delay mock results to simulate network latency
    pub fn with_mock_latency(mut self, latency: Duration) -> Self {
        self.mock_latency = latency;
        self
    }

    /// The strategy the next invocation would take
    pub fn strategy(&self) -> Strategy {
        Strategy::resolve(&self.test_mode)
    }

    /// The shared HTTP client
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Read access to the session
    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// Invoke a descriptor once
    ///
    /// The test-mode switch is read on every call. Errors from validation,
    /// the network or normalization are returned unchanged.
    pub async fn invoke<D: RequestDescriptor>(&self, descriptor: &D, input: D::Input) -> Result<D::Output> {
        let strategy = self.strategy();
        debug!(descriptor = D::NAME, ?strategy, "invoking request");

        descriptor.validate(&input)?;

        match strategy {
            Strategy::Mock => {
                if !self.mock_latency.is_zero() {
                    tokio::time::sleep(self.mock_latency).await;
                }
                let env = MockEnv::new(self.clock.now());
                descriptor.mock(&input, &env)
            }
            Strategy::Live => {
                let mut request = descriptor.request(&input)?;
                if descriptor.authenticated() {
                    let token = self.session.current_access_token();
                    // No session: send no Authorization header at all
                    if !token.is_empty() {
                        request = request.bearer(&token);
                    }
                }

                let response = match self.client.send(request).await {
                    Ok(response) => response,
                    Err(err) => {
                        warn!(descriptor = D::NAME, error = %err, "request failed");
                        return Err(err);
                    }
                };

                descriptor.normalize(&response)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StaticConfig;
    use crate::envelope::Envelope;
    use crate::http::{ApiClientConfig, MockHttpTransport, TransportResponse};
    use crate::session::{Session, SessionWriter};
    use crate::ApiError;
    use chrono::TimeZone;
    use std::collections::HashMap;

    struct Echo;

    impl RequestDescriptor for Echo {
        type Input = String;
        type Output = String;
        const NAME: &'static str = "echo";

        fn validate(&self, input: &String) -> Result<()> {
            if input.is_empty() {
                return Err(ApiError::validation("input is required"));
            }
            Ok(())
        }

        fn mock(&self, input: &String, env: &MockEnv) -> Result<String> {
            Ok(format!("{}:{}", input, env.synthetic_id("mock")))
        }

        fn request(&self, input: &String) -> Result<ApiRequest> {
            ApiRequest::post("/echo").json(&serde_json::json!({ "text": input }))
        }

        fn normalize(&self, response: &RawResponse) -> Result<String> {
            Envelope::parse(response)?.require("/data/text")
        }
    }

    fn ok_body() -> TransportResponse {
        TransportResponse {
            status: 200,
            headers: HashMap::new(),
            body: br#"{"data":{"text":"live"}}"#.to_vec(),
        }
    }

    fn context(transport: MockHttpTransport, config: &StaticConfig) -> (ApiContext, SessionWriter) {
        let writer = SessionWriter::new();
        let client = ApiClient::with_transport(ApiClientConfig::default(), Arc::new(transport));
        let clock = FixedClock(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        let ctx = ApiContext::new(client, writer.handle(), TestModeSwitch::new(Arc::new(config.clone())))
            .with_clock(Arc::new(clock));
        (ctx, writer)
    }

    #[tokio::test]
    async fn test_mock_path_skips_transport() {
        let mut transport = MockHttpTransport::new();
        transport.expect_execute().times(0);

        let config = StaticConfig::new();
        config.set_test_mode(true);
        let (ctx, _writer) = context(transport, &config);

        let out = ctx.invoke(&Echo, "hi".to_string()).await.unwrap();
        assert_eq!(out, "hi:mock_1704067200000");
    }

    #[tokio::test]
    async fn test_live_path_calls_once() {
        let mut transport = MockHttpTransport::new();
        transport.expect_execute().times(1).returning(|_| Ok(ok_body()));

        let (ctx, _writer) = context(transport, &StaticConfig::new());
        assert_eq!(ctx.invoke(&Echo, "hi".to_string()).await.unwrap(), "live");
    }

    #[tokio::test]
    async fn test_switch_toggle_between_calls() {
        let mut transport = MockHttpTransport::new();
        transport.expect_execute().times(1).returning(|_| Ok(ok_body()));

        let config = StaticConfig::new();
        config.set_test_mode(true);
        let (ctx, _writer) = context(transport, &config);

        assert_eq!(ctx.strategy(), Strategy::Mock);
        assert!(ctx.invoke(&Echo, "a".to_string()).await.unwrap().starts_with("a:mock_"));

        config.set_test_mode(false);
        assert_eq!(ctx.strategy(), Strategy::Live);
        assert_eq!(ctx.invoke(&Echo, "a".to_string()).await.unwrap(), "live");
    }

    #[tokio::test]
    async fn test_validation_applies_to_both_paths() {
        let mut transport = MockHttpTransport::new();
        transport.expect_execute().times(0);

        let config = StaticConfig::new();
        let (ctx, _writer) = context(transport, &config);

        let live = ctx.invoke(&Echo, String::new()).await.unwrap_err();
        config.set_test_mode(true);
        let mock = ctx.invoke(&Echo, String::new()).await.unwrap_err();

        assert_eq!(live, mock);
        assert!(matches!(live, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn test_bearer_attached_at_call_time() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_execute()
            .withf(|req| req.header("Authorization") == Some("Bearer tok_2"))
            .times(1)
            .returning(|_| Ok(ok_body()));

        let (ctx, writer) = context(transport, &StaticConfig::new());
        writer.set_session(Session::new("tok_1"));
        writer.update_access_token("tok_2");

        ctx.invoke(&Echo, "hi".to_string()).await.unwrap();
    }

    #[tokio::test]
    async fn test_no_header_without_token() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_execute()
            .withf(|req| req.header("Authorization").is_none())
            .times(1)
            .returning(|_| Ok(ok_body()));

        let (ctx, _writer) = context(transport, &StaticConfig::new());
        ctx.invoke(&Echo, "hi".to_string()).await.unwrap();
    }

    #[tokio::test]
    async fn test_errors_propagate_unchanged() {
        let mut transport = MockHttpTransport::new();
        transport.expect_execute().times(1).returning(|_| {
            Ok(TransportResponse { status: 503, headers: HashMap::new(), body: b"down".to_vec() })
        });

        let (ctx, _writer) = context(transport, &StaticConfig::new());
        let err = ctx.invoke(&Echo, "hi".to_string()).await.unwrap_err();
        assert_eq!(err, ApiError::http(503, "down"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_latency() {
        let transport = MockHttpTransport::new();
        let config = StaticConfig::new();
        config.set_test_mode(true);
        let (ctx, _writer) = context(transport, &config);
        let ctx = ctx.with_mock_latency(Duration::from_millis(800));

        let started = tokio::time::Instant::now();
        ctx.invoke(&Echo, "hi".to_string()).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(800));
    }

    #[test]
    fn test_mock_env_synthetic_id() {
        let env = MockEnv::new(Utc.timestamp_millis_opt(1_700_000_000_123).unwrap());
        assert_eq!(env.synthetic_id("order"), "order_1700000000123");
    }
}
