//! HTTP client configuration
//!
//! This module owns the single configured client every descriptor talks
//! through: base URL, default headers, timeout, and the one place where
//! transport failures and error statuses are classified into [`ApiError`].
//! There is no retry at this layer.

use crate::config::{self, ConfigSource};
use crate::{ApiError, NetworkErrorKind, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// Request Types
// =============================================================================

/// HTTP method for API requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// GET request
    Get,
    /// POST request
    Post,
    /// PUT request
    Put,
    /// PATCH request
    Patch,
    /// DELETE request
    Delete,
}

impl HttpMethod {
    /// Method name as sent on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// A single backend request, relative to the configured base URL
///
/// # Examples
/// ```
/// use api_client::http::{ApiRequest, HttpMethod};
///
/// let request = ApiRequest::get("/products").query("brand", "b-1").bearer("tok");
/// assert_eq!(request.method, HttpMethod::Get);
/// assert_eq!(request.headers.get("Authorization").map(String::as_str), Some("Bearer tok"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// HTTP method
    pub method: HttpMethod,
    /// Path below the base URL (e.g., "/auth/login")
    pub path: String,
    /// Query parameters, in insertion order
    pub query: Vec<(String, String)>,
    /// Request headers
    pub headers: HashMap<String, String>,
    /// JSON body
    pub body: Option<Vec<u8>>,
}

impl ApiRequest {
    /// Create a request with an explicit method
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HashMap::new(),
            body: None,
        }
    }

    /// Create a GET request
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// Create a POST request
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    /// Create a PUT request
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    /// Create a PATCH request
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, path)
    }

    /// Create a DELETE request
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Add a query parameter
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Add a query parameter when the value is present
    pub fn query_opt(self, key: impl Into<String>, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.query(key, value.to_string()),
            None => self,
        }
    }

    /// Add a header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Attach a bearer token
    pub fn bearer(self, token: &str) -> Self {
        self.header("Authorization", format!("Bearer {}", token))
    }

    /// Set the request body from JSON
    pub fn json<T: Serialize>(mut self, value: &T) -> Result<Self> {
        let body = serde_json::to_vec(value).map_err(|e| ApiError::Encoding(e.to_string()))?;
        self.body = Some(body);
        self.headers
            .insert("Content-Type".to_string(), "application/json".to_string());
        Ok(self)
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// Successful (2xx) response as received from the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers, lowercase names
    pub headers: HashMap<String, String>,
    /// Response body
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Create a new response
    pub fn new(status: u16, headers: HashMap<String, String>, body: Vec<u8>) -> Self {
        Self { status, headers, body }
    }

    /// Build a 200 response from a JSON value
    pub fn json_ok(value: &serde_json::Value) -> Self {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        Self::new(200, headers, value.to_string().into_bytes())
    }

    /// Get a header value
    pub fn header(&self, key: &str) -> Option<&String> {
        self.headers.get(&key.to_ascii_lowercase())
    }

    /// Body as lossy UTF-8
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body)
            .map_err(|e| ApiError::malformed(format!("invalid JSON body: {}", e)))
    }
}

// =============================================================================
// Client Configuration
// =============================================================================

/// Configuration for the API client
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base service URL (e.g., "https://api.buylocal.app")
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
    /// Custom headers to include in all requests
    pub default_headers: HashMap<String, String>,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        let mut default_headers = HashMap::new();
        default_headers.insert("Accept".to_string(), "application/json".to_string());

        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout: Duration::from_secs(30),
            user_agent: format!("BuyLocal/{}", env!("CARGO_PKG_VERSION")),
            default_headers,
        }
    }
}

impl ApiClientConfig {
    /// Create a new config with a base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Build from process configuration
    ///
    /// `API_URL` is required; `API_TIMEOUT_SECS` overrides the timeout.
    pub fn from_source(source: &dyn ConfigSource) -> Result<Self> {
        let base_url = source
            .get(config::API_URL)
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ApiError::Config(format!("{} is not set", config::API_URL)))?;

        let mut built = Self::new(base_url);
        if let Some(secs) = config::parse::<u64>(source, config::API_TIMEOUT_SECS) {
            built.timeout = Duration::from_secs(secs);
        }
        Ok(built)
    }

    /// Set the timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Add a default header
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(key.into(), value.into());
        self
    }

    /// Join the base URL and a request path
    pub fn url_for(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }
}

// =============================================================================
// Transport
// =============================================================================

/// A fully resolved request handed to the transport
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    /// HTTP method
    pub method: HttpMethod,
    /// Absolute URL
    pub url: String,
    /// Query parameters
    pub query: Vec<(String, String)>,
    /// Merged headers (defaults first, request headers win)
    pub headers: HashMap<String, String>,
    /// Request body
    pub body: Option<Vec<u8>>,
}

impl TransportRequest {
    /// Get a header value
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value.as_str())
    }
}

/// Whatever the server sent back, error statuses included
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers, lowercase names
    pub headers: HashMap<String, String>,
    /// Response body
    pub body: Vec<u8>,
}

/// Failure to obtain any response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    /// Failure class
    pub kind: NetworkErrorKind,
    /// Human-readable detail
    pub message: String,
}

impl TransportError {
    /// Create a new transport error
    pub fn new(kind: NetworkErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }
}

/// The seam between the client and the network
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Perform exactly one HTTP exchange
    async fn execute(
        &self,
        request: TransportRequest,
    ) -> std::result::Result<TransportResponse, TransportError>;
}

/// Production transport backed by reqwest
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a reqwest client honoring the configured timeout and user agent
    pub fn new(config: &ApiClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| ApiError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    fn classify(error: &reqwest::Error) -> NetworkErrorKind {
        if error.is_timeout() {
            NetworkErrorKind::Timeout
        } else if error.is_connect() {
            NetworkErrorKind::Connect
        } else {
            NetworkErrorKind::Other
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(
        &self,
        request: TransportRequest,
    ) -> std::result::Result<TransportResponse, TransportError> {
        let mut req = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
            HttpMethod::Put => self.client.put(&request.url),
            HttpMethod::Patch => self.client.patch(&request.url),
            HttpMethod::Delete => self.client.delete(&request.url),
        };

        if !request.query.is_empty() {
            req = req.query(&request.query);
        }

        for (key, value) in &request.headers {
            req = req.header(key, value);
        }

        if let Some(body) = request.body {
            req = req.body(body);
        }

        let response = req.send().await.map_err(|e| {
            TransportError::new(Self::classify(&e), format!("Request failed: {}", e))
        })?;

        let status = response.status().as_u16();
        let mut headers = HashMap::new();
        for (key, value) in response.headers() {
            if let Ok(value_str) = value.to_str() {
                headers.insert(key.as_str().to_ascii_lowercase(), value_str.to_string());
            }
        }

        let body = response.bytes().await.map_err(|e| {
            TransportError::new(Self::classify(&e), format!("Failed to read response: {}", e))
        })?;

        Ok(TransportResponse { status, headers, body: body.to_vec() })
    }
}

// =============================================================================
// API Client
// =============================================================================

/// The shared client every descriptor sends through
///
/// # Examples
/// ```
/// use api_client::http::{ApiClient, ApiClientConfig};
///
/// let client = ApiClient::new(ApiClientConfig::new("https://api.buylocal.app")).unwrap();
/// assert_eq!(client.base_url(), "https://api.buylocal.app");
/// ```
#[derive(Clone)]
pub struct ApiClient {
    config: ApiClientConfig,
    transport: Arc<dyn HttpTransport>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient").field("config", &self.config).finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client with the reqwest transport
    pub fn new(config: ApiClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(&config)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a client over a custom transport
    pub fn with_transport(config: ApiClientConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self { config, transport }
    }

    /// Issue one request
    ///
    /// Fails with [`ApiError::Network`] when no response arrives and with
    /// [`ApiError::Http`] for any non-2xx status.
    pub async fn send(&self, request: ApiRequest) -> Result<RawResponse> {
        let mut headers = self.config.default_headers.clone();
        headers.extend(request.headers);

        let transport_request = TransportRequest {
            method: request.method,
            url: self.config.url_for(&request.path),
            query: request.query,
            headers,
            body: request.body,
        };

        tracing::trace!(
            method = transport_request.method.as_str(),
            url = %transport_request.url,
            "sending request"
        );

        let response = self
            .transport
            .execute(transport_request)
            .await
            .map_err(|e| ApiError::network(e.kind, e.message))?;

        if !(200..300).contains(&response.status) {
            let body = String::from_utf8_lossy(&response.body).into_owned();
            return Err(ApiError::http(response.status, body));
        }

        Ok(RawResponse::new(response.status, response.headers, response.body))
    }

    /// Get the client configuration
    pub fn config(&self) -> &ApiClientConfig {
        &self.config
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }
}

// =============================================================================
// Tests
// =============================================================================
