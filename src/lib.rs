//! BuyLocal client application
//!
//! [`App`] wires the request layer from process configuration: the HTTP
//! client, the shared session, the test-mode switch and the notification
//! channel. Screens take the pieces they need from it.
//!
//! # Example
//!
//! ```rust,no_run
//! use app_core::catalog::{ListProducts, ProductQuery};
//! use app_state::run_with_feedback;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     buylocal::init_tracing();
//!     let app = buylocal::App::from_env()?;
//!     app.start().await;
//!
//!     let notifier = app.notifier();
//!     let page = run_with_feedback(
//!         &notifier,
//!         Some("Loading products"),
//!         app.context().invoke(&ListProducts, ProductQuery::default()),
//!         |_| None,
//!     )
//!     .await?;
//!     println!("{} products", page.products.len());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

use anyhow::Context;
use api_client::config::{self, ConfigSource, EnvConfig, TestModeSwitch};
use api_client::{ApiClient, ApiClientConfig, ApiContext, HttpTransport, Session, SessionWriter};
use app_core::AuthService;
use app_state::{NotificationProvider, NotifierHandle};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// The wired request layer for one app instance
#[derive(Debug)]
pub struct App {
    ctx: ApiContext,
    auth: AuthService,
    notifications: NotificationProvider,
}

impl App {
    /// Build from the process environment
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_source(Arc::new(EnvConfig))
    }

    /// Build from any configuration source using the reqwest transport
    ///
    /// # Errors
    ///
    /// Fails when `API_URL` is missing or the HTTP client cannot be built.
    pub fn from_source(source: Arc<dyn ConfigSource>) -> anyhow::Result<Self> {
        let client_config = client_config(source.as_ref())?;
        let client = ApiClient::new(client_config).context("failed to build HTTP client")?;
        Ok(Self::assemble(source, client))
    }

    /// Build with a caller-supplied transport
    pub fn with_transport(source: Arc<dyn ConfigSource>, transport: Arc<dyn HttpTransport>) -> anyhow::Result<Self> {
        let client_config = client_config(source.as_ref())?;
        Ok(Self::assemble(source, ApiClient::with_transport(client_config, transport)))
    }

    fn assemble(source: Arc<dyn ConfigSource>, client: ApiClient) -> Self {
        let mock_latency = config::parse::<u64>(source.as_ref(), config::MOCK_LATENCY_MS)
            .map(Duration::from_millis)
            .unwrap_or_default();
        let session_path = source.get(config::SESSION_PATH).filter(|path| !path.trim().is_empty());

        let writer = SessionWriter::new();
        let ctx = ApiContext::new(client, writer.handle(), TestModeSwitch::new(source))
            .with_mock_latency(mock_latency);

        let mut auth = AuthService::new(ctx.clone(), writer);
        if let Some(path) = session_path {
            auth = auth.with_store(path);
        }

        info!(base_url = %ctx.client().base_url(), strategy = ?ctx.strategy(), "request layer ready");
        Self { ctx, auth, notifications: NotificationProvider::new() }
    }

    /// Restore the saved session, if any
    pub async fn start(&self) -> Option<Session> {
        self.auth.hydrate().await
    }

    /// Context to invoke descriptors with
    pub fn context(&self) -> &ApiContext {
        &self.ctx
    }

    /// Login, logout and token refresh
    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    /// The notification channel owner
    pub fn notifications(&self) -> &NotificationProvider {
        &self.notifications
    }

    /// A handle for one screen
    pub fn notifier(&self) -> NotifierHandle {
        self.notifications.handle()
    }
}

fn client_config(source: &dyn ConfigSource) -> anyhow::Result<ApiClientConfig> {
    ApiClientConfig::from_source(source).context("invalid API client configuration")
}

/// Install the global tracing subscriber
///
/// Honors `RUST_LOG`, defaulting to `info`. Calling it twice is harmless.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(e) = fmt().with_env_filter(filter).try_init() {
        tracing::debug!(error = %e, "tracing already initialised");
    }
}
