//! Authentication descriptors and the session-owning auth service
//!
//! Login, registration, email verification and password recovery are plain
//! descriptors. [`AuthService`] wraps the ones that change who is signed in
//! and is the only place the session token is written.

use crate::models::{Ack, User};
use crate::validation;
use api_client::descriptor::{ApiContext, MockEnv, RequestDescriptor};
use api_client::{ApiError, ApiRequest, Envelope, RawResponse, Session, SessionHandle, SessionWriter};
use serde::{Deserialize, Serialize};
use storage::{JsonStore, PersistenceError};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Authentication service error types
#[derive(Debug, Error)]
pub enum AuthError {
    /// The backend call failed
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The session file could not be written or removed
    #[error("Session storage error: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Result type for authentication operations
pub type Result<T> = std::result::Result<T, AuthError>;

fn user_at(envelope: &Envelope) -> api_client::Result<Option<User>> {
    match envelope.optional("/data/user")? {
        Some(user) => Ok(Some(user)),
        None => envelope.optional("/user"),
    }
}

// =============================================================================
// Login
// =============================================================================

/// Login parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginInput {
    /// Account email
    pub email: String,
    /// Account password
    pub password: String,
}

/// Login result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResult {
    /// Backend message, if any
    pub message: Option<String>,
    /// The signed-in user
    pub user: User,
    /// Access token; absent when the backend withholds it (e.g. unverified accounts)
    pub token: Option<String>,
}

/// `POST /auth/login`
#[derive(Debug, Clone, Copy, Default)]
pub struct Login;

impl RequestDescriptor for Login {
    type Input = LoginInput;
    type Output = LoginResult;
    const NAME: &'static str = "auth.login";

    fn authenticated(&self) -> bool {
        false
    }

    fn validate(&self, input: &LoginInput) -> api_client::Result<()> {
        validation::email(&input.email)?;
        validation::require_non_empty("Password", &input.password)
    }

    fn mock(&self, input: &LoginInput, env: &MockEnv) -> api_client::Result<LoginResult> {
        Ok(LoginResult {
            message: Some("Login successful".to_string()),
            user: User {
                id: env.synthetic_id("user"),
                email: input.email.clone(),
                first_name: Some("Test".to_string()),
                last_name: Some("Shopper".to_string()),
                phone: None,
                is_verified: true,
            },
            token: Some(format!("mock_access_token_{}", env.timestamp_millis())),
        })
    }

    fn request(&self, input: &LoginInput) -> api_client::Result<ApiRequest> {
        ApiRequest::post("/auth/login").json(input)
    }

    fn normalize(&self, response: &RawResponse) -> api_client::Result<LoginResult> {
        let envelope = Envelope::parse(response)?;
        let user = user_at(&envelope)?
            .ok_or_else(|| ApiError::malformed("missing required field /data/user"))?;

        Ok(LoginResult {
            message: envelope.message().map(str::to_string),
            user,
            token: envelope.first_string(&["/data/token", "/data/accessToken", "/token"]),
        })
    }
}

// =============================================================================
// Registration and verification
// =============================================================================

/// Account creation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Account email
    pub email: String,
    /// Chosen password
    pub password: String,
    /// Contact number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Registration result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterResult {
    /// Message to show, usually asking for the emailed code
    pub message: String,
    /// The created account, when the backend returns it
    pub user: Option<User>,
}

/// `POST /auth/register`
#[derive(Debug, Clone, Copy, Default)]
pub struct Register;

impl RequestDescriptor for Register {
    type Input = RegisterInput;
    type Output = RegisterResult;
    const NAME: &'static str = "auth.register";

    fn authenticated(&self) -> bool {
        false
    }

    fn validate(&self, input: &RegisterInput) -> api_client::Result<()> {
        validation::require_non_empty("First name", &input.first_name)?;
        validation::require_non_empty("Last name", &input.last_name)?;
        validation::email(&input.email)?;
        validation::new_password(&input.password)
    }

    fn mock(&self, input: &RegisterInput, env: &MockEnv) -> api_client::Result<RegisterResult> {
        Ok(RegisterResult {
            message: "Registration successful. Check your email for a verification code.".to_string(),
            user: Some(User {
                id: env.synthetic_id("user"),
                email: input.email.clone(),
                first_name: Some(input.first_name.clone()),
                last_name: Some(input.last_name.clone()),
                phone: input.phone.clone(),
                is_verified: false,
            }),
        })
    }

    fn request(&self, input: &RegisterInput) -> api_client::Result<ApiRequest> {
        ApiRequest::post("/auth/register").json(input)
    }

    fn normalize(&self, response: &RawResponse) -> api_client::Result<RegisterResult> {
        let envelope = Envelope::parse(response)?;
        Ok(RegisterResult {
            message: envelope
                .message()
                .unwrap_or("Registration successful")
                .to_string(),
            user: user_at(&envelope)?,
        })
    }
}

/// Email plus the emailed code
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyEmailInput {
    /// Account email
    pub email: String,
    /// Six-digit code
    pub code: String,
}

/// `POST /auth/verify-email`
#[derive(Debug, Clone, Copy, Default)]
pub struct VerifyEmail;

impl RequestDescriptor for VerifyEmail {
    type Input = VerifyEmailInput;
    type Output = Ack;
    const NAME: &'static str = "auth.verifyEmail";

    fn authenticated(&self) -> bool {
        false
    }

    fn validate(&self, input: &VerifyEmailInput) -> api_client::Result<()> {
        validation::email(&input.email)?;
        validation::verification_code(&input.code)
    }

    fn mock(&self, _input: &VerifyEmailInput, _env: &MockEnv) -> api_client::Result<Ack> {
        Ok(Ack::new("Email verified successfully!"))
    }

    fn request(&self, input: &VerifyEmailInput) -> api_client::Result<ApiRequest> {
        ApiRequest::post("/auth/verify-email").json(input)
    }

    fn normalize(&self, response: &RawResponse) -> api_client::Result<Ack> {
        Ack::from_response(response, "Email verified successfully!")
    }
}

/// Just an email address
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailInput {
    /// Account email
    pub email: String,
}

impl EmailInput {
    /// Wrap an address
    pub fn new(email: impl Into<String>) -> Self {
        Self { email: email.into() }
    }
}

/// `POST /auth/resend-code`
#[derive(Debug, Clone, Copy, Default)]
pub struct ResendCode;

impl RequestDescriptor for ResendCode {
    type Input = EmailInput;
    type Output = Ack;
    const NAME: &'static str = "auth.resendCode";

    fn authenticated(&self) -> bool {
        false
    }

    fn validate(&self, input: &EmailInput) -> api_client::Result<()> {
        validation::email(&input.email)
    }

    fn mock(&self, _input: &EmailInput, _env: &MockEnv) -> api_client::Result<Ack> {
        Ok(Ack::new("A new verification code has been sent to your email"))
    }

    fn request(&self, input: &EmailInput) -> api_client::Result<ApiRequest> {
        ApiRequest::post("/auth/resend-code").json(input)
    }

    fn normalize(&self, response: &RawResponse) -> api_client::Result<Ack> {
        Ack::from_response(response, "Verification code sent")
    }
}

// =============================================================================
// Password recovery
// =============================================================================

/// `POST /auth/forgot-password`
#[derive(Debug, Clone, Copy, Default)]
pub struct ForgotPassword;

impl RequestDescriptor for ForgotPassword {
    type Input = EmailInput;
    type Output = Ack;
    const NAME: &'static str = "auth.forgotPassword";

    fn authenticated(&self) -> bool {
        false
    }

    fn validate(&self, input: &EmailInput) -> api_client::Result<()> {
        validation::email(&input.email)
    }

    fn mock(&self, _input: &EmailInput, _env: &MockEnv) -> api_client::Result<Ack> {
        Ok(Ack::new("Password reset code sent to your email"))
    }

    fn request(&self, input: &EmailInput) -> api_client::Result<ApiRequest> {
        ApiRequest::post("/auth/forgot-password").json(input)
    }

    fn normalize(&self, response: &RawResponse) -> api_client::Result<Ack> {
        Ack::from_response(response, "Password reset code sent to your email")
    }
}

/// Reset code plus the replacement password
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordInput {
    /// Account email
    pub email: String,
    /// Six-digit reset code
    pub code: String,
    /// Replacement password
    pub new_password: String,
}

/// `POST /auth/reset-password`
#[derive(Debug, Clone, Copy, Default)]
pub struct ResetPassword;

impl RequestDescriptor for ResetPassword {
    type Input = ResetPasswordInput;
    type Output = Ack;
    const NAME: &'static str = "auth.resetPassword";

    fn authenticated(&self) -> bool {
        false
    }

    fn validate(&self, input: &ResetPasswordInput) -> api_client::Result<()> {
        validation::email(&input.email)?;
        validation::verification_code(&input.code)?;
        validation::new_password(&input.new_password)
    }

    fn mock(&self, _input: &ResetPasswordInput, _env: &MockEnv) -> api_client::Result<Ack> {
        Ok(Ack::new("Password reset successfully"))
    }

    fn request(&self, input: &ResetPasswordInput) -> api_client::Result<ApiRequest> {
        ApiRequest::post("/auth/reset-password").json(input)
    }

    fn normalize(&self, response: &RawResponse) -> api_client::Result<Ack> {
        Ack::from_response(response, "Password reset successfully")
    }
}

/// `POST /auth/logout`
#[derive(Debug, Clone, Copy, Default)]
pub struct Logout;

impl RequestDescriptor for Logout {
    type Input = ();
    type Output = Ack;
    const NAME: &'static str = "auth.logout";

    fn mock(&self, _input: &(), _env: &MockEnv) -> api_client::Result<Ack> {
        Ok(Ack::new("Logged out successfully"))
    }

    fn request(&self, _input: &()) -> api_client::Result<ApiRequest> {
        Ok(ApiRequest::post("/auth/logout"))
    }

    fn normalize(&self, response: &RawResponse) -> api_client::Result<Ack> {
        Ack::from_response(response, "Logged out successfully")
    }
}

// =============================================================================
// Service
// =============================================================================

/// Authentication service
///
/// Owns the [`SessionWriter`]. The [`ApiContext`] passed in must read from
/// the same session, i.e. be built with `writer.handle()`.
///
/// # Example
///
/// ```rust,no_run
/// use api_client::{ApiClient, ApiClientConfig, ApiContext, EnvConfig, SessionWriter, TestModeSwitch};
/// use app_core::auth::{AuthService, LoginInput};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let writer = SessionWriter::new();
///     let client = ApiClient::new(ApiClientConfig::from_source(&EnvConfig)?)?;
///     let ctx = ApiContext::new(client, writer.handle(), TestModeSwitch::new(Arc::new(EnvConfig)));
///
///     let auth = AuthService::new(ctx, writer).with_store("session.json");
///     auth.hydrate().await;
///
///     let result = auth
///         .login(LoginInput { email: "a@b.com".into(), password: "secret".into() })
///         .await?;
///     println!("Signed in as {}", result.user.email);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct AuthService {
    ctx: ApiContext,
    writer: SessionWriter,
    store: Option<JsonStore<Session>>,
}

impl AuthService {
    /// Create a service that keeps the session in memory only
    pub fn new(ctx: ApiContext, writer: SessionWriter) -> Self {
        Self { ctx, writer, store: None }
    }

    /// Persist the session at `path` across restarts
    pub fn with_store(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.store = Some(JsonStore::new(path));
        self
    }

    /// Read access to the session
    pub fn session(&self) -> SessionHandle {
        self.writer.handle()
    }

    /// The context used for invocations
    pub fn context(&self) -> &ApiContext {
        &self.ctx
    }

    /// Restore a saved session, if any
    ///
    /// A damaged or outdated session file is removed and treated as signed
    /// out rather than failing startup.
    pub async fn hydrate(&self) -> Option<Session> {
        let store = self.store.as_ref()?;

        match store.load().await {
            Ok(Some(session)) => {
                debug!(user_id = ?session.user_id, "restored saved session");
                self.writer.set_session(session.clone());
                Some(session)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, path = %store.path().display(), "discarding unreadable session");
                if let Err(e) = store.clear().await {
                    warn!(error = %e, "failed to remove session file");
                }
                None
            }
        }
    }

    /// Login with credentials
    ///
    /// On success the returned token becomes the current session and is
    /// persisted. A login that yields no token leaves the session untouched.
    ///
    /// # Errors
    ///
    /// - `AuthError::Api` - validation, network, HTTP or malformed-response failure
    /// - `AuthError::Persistence` - the session could not be saved
    pub async fn login(&self, input: LoginInput) -> Result<LoginResult> {
        let result = self.ctx.invoke(&Login, input).await?;

        match &result.token {
            Some(token) => {
                let session = Session::new(token.clone())
                    .with_user_id(result.user.id.clone())
                    .with_email(result.user.email.clone());
                if let Some(store) = &self.store {
                    store.save(&session).await?;
                }
                self.writer.set_session(session);
                info!(user_id = %result.user.id, "signed in");
            }
            None => debug!(user_id = %result.user.id, "login returned no token"),
        }

        Ok(result)
    }

    /// Replace the access token, keeping the rest of the session
    ///
    /// Returns `false` when nobody is signed in. The in-memory token only
    /// changes once the refreshed session is saved.
    pub async fn refresh_token(&self, token: impl Into<String>) -> Result<bool> {
        let Some(mut session) = self.writer.handle().session() else {
            return Ok(false);
        };
        session.access_token = token.into();
        if let Some(store) = &self.store {
            store.save(&session).await?;
        }
        self.writer.set_session(session);
        Ok(true)
    }

    /// Sign out
    ///
    /// The backend is told first; the local session is cleared whatever it
    /// answers.
    pub async fn logout(&self) -> Result<()> {
        if self.writer.handle().is_authenticated() {
            if let Err(e) = self.ctx.invoke(&Logout, ()).await {
                warn!(error = %e, "backend logout failed, clearing local session");
            }
        }

        self.writer.clear();
        if let Some(store) = &self.store {
            store.clear().await?;
        }
        info!("signed out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use api_client::test_utils::{envelopes, RecordingTransport, TestHarness};
    use api_client::HttpMethod;
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn credentials(email: &str) -> LoginInput {
        LoginInput { email: email.to_string(), password: "x".to_string() }
    }

    fn service(harness: TestHarness) -> (AuthService, Arc<RecordingTransport>) {
        let TestHarness { ctx, transport, session, .. } = harness;
        (AuthService::new(ctx, session), transport)
    }

    #[tokio::test]
    async fn test_mock_login() {
        let harness = TestHarness::mocked();

        let result = harness.ctx.invoke(&Login, credentials("a@b.com")).await.unwrap();

        assert_eq!(result.user.email, "a@b.com");
        assert!(result.user.is_verified);
        let token = result.token.unwrap();
        let suffix = token.strip_prefix("mock_access_token_").unwrap();
        assert!(!suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(harness.transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_mock_login_is_deterministic() {
        let harness = TestHarness::mocked();

        let first = harness.ctx.invoke(&Login, credentials("a@b.com")).await.unwrap();
        let second = harness.ctx.invoke(&Login, credentials("a@b.com")).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_live_login_request() {
        let harness = TestHarness::new();
        harness.transport.respond_json(200, envelopes::login("a@b.com", "tok_1"));

        let result = harness.ctx.invoke(&Login, credentials("a@b.com")).await.unwrap();

        assert_eq!(result.token.as_deref(), Some("tok_1"));
        assert_eq!(result.message.as_deref(), Some("Login successful"));
        let request = harness.transport.last_request().unwrap();
        assert_eq!(request.method, HttpMethod::Post);
        assert!(request.url.ends_with("/auth/login"));
        assert!(request.header("Authorization").is_none());
        let body: serde_json::Value = serde_json::from_slice(&request.body.unwrap()).unwrap();
        assert_eq!(body, json!({"email": "a@b.com", "password": "x"}));
    }

    #[tokio::test]
    async fn test_login_without_user_is_malformed() {
        let harness = TestHarness::new();
        harness
            .transport
            .respond_json(200, json!({"message": "ok", "data": {"token": "tok"}}));

        let err = harness.ctx.invoke(&Login, credentials("a@b.com")).await.unwrap_err();
        assert!(matches!(err, ApiError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_login_tolerates_missing_token() {
        let harness = TestHarness::new();
        harness.transport.respond_json(
            200,
            json!({"message": "Please verify your email", "data": {"user": {"id": "u1", "email": "a@b.com"}}}),
        );

        let result = harness.ctx.invoke(&Login, credentials("a@b.com")).await.unwrap();
        assert!(result.token.is_none());
        assert!(!result.user.is_verified);
    }

    #[tokio::test]
    async fn test_verify_code_length() {
        let harness = TestHarness::mocked();
        let input = |code: &str| VerifyEmailInput { email: "a@b.com".into(), code: code.into() };

        let err = harness.ctx.invoke(&VerifyEmail, input("12345")).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let ack = harness.ctx.invoke(&VerifyEmail, input("123456")).await.unwrap();
        assert_eq!(ack.message, "Email verified successfully!");
    }

    #[tokio::test]
    async fn test_verify_validation_same_in_live_mode() {
        let harness = TestHarness::new();
        let input = VerifyEmailInput { email: "a@b.com".into(), code: "12".into() };

        let err = harness.ctx.invoke(&VerifyEmail, input).await.unwrap_err();
        assert_eq!(err, ApiError::validation("Verification code must be 6 digits"));
        assert_eq!(harness.transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_register_live_body() {
        let harness = TestHarness::new();
        harness.transport.respond_json(201, envelopes::message("Check your inbox"));

        let result = harness
            .ctx
            .invoke(
                &Register,
                RegisterInput {
                    first_name: "Ada".into(),
                    last_name: "Lovelace".into(),
                    email: "ada@b.com".into(),
                    password: "analytical".into(),
                    phone: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(result.message, "Check your inbox");
        assert!(result.user.is_none());
        let body: serde_json::Value =
            serde_json::from_slice(&harness.transport.last_request().unwrap().body.unwrap()).unwrap();
        assert_eq!(body["firstName"], "Ada");
        assert!(body.get("phone").is_none());
    }

    #[tokio::test]
    async fn test_reset_password_rules() {
        let harness = TestHarness::mocked();
        let short = ResetPasswordInput { email: "a@b.com".into(), code: "123456".into(), new_password: "short".into() };
        assert!(harness.ctx.invoke(&ResetPassword, short).await.is_err());

        let ok = ResetPasswordInput { email: "a@b.com".into(), code: "123456".into(), new_password: "much-longer".into() };
        assert_eq!(harness.ctx.invoke(&ResetPassword, ok).await.unwrap().message, "Password reset successfully");
    }

    #[tokio::test]
    async fn test_service_login_stores_and_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        let (auth, transport) = service(TestHarness::new());
        let auth = auth.with_store(&path);
        transport.respond_json(200, envelopes::login("a@b.com", "tok_live"));

        auth.login(credentials("a@b.com")).await.unwrap();

        assert_eq!(auth.session().current_access_token(), "tok_live");
        let saved = JsonStore::<Session>::new(&path).load().await.unwrap().unwrap();
        assert_eq!(saved.access_token, "tok_live");
        assert_eq!(saved.email.as_deref(), Some("a@b.com"));
    }

    #[tokio::test]
    async fn test_login_unsaved_session_stays_signed_out() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        tokio::fs::write(&blocker, "").await.unwrap();
        let (auth, transport) = service(TestHarness::new());
        let auth = auth.with_store(blocker.join("session.json"));
        transport.respond_json(200, envelopes::login("a@b.com", "tok_live"));

        let err = auth.login(credentials("a@b.com")).await.unwrap_err();

        assert!(matches!(err, AuthError::Persistence(_)));
        assert_eq!(auth.session().current_access_token(), "");
        assert!(!auth.session().is_authenticated());
    }

    #[tokio::test]
    async fn test_service_failed_login_keeps_session_empty() {
        let (auth, transport) = service(TestHarness::new());
        transport.respond_json(401, envelopes::error("Invalid credentials"));

        let err = auth.login(credentials("a@b.com")).await.unwrap_err();

        assert!(matches!(err, AuthError::Api(ApiError::Http { status_code: 401, .. })));
        assert_eq!(auth.session().current_access_token(), "");
    }

    #[tokio::test]
    async fn test_logout_clears_even_when_backend_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        let (auth, transport) = service(TestHarness::new());
        let auth = auth.with_store(&path);

        transport.respond_json(200, envelopes::login("a@b.com", "tok_live"));
        auth.login(credentials("a@b.com")).await.unwrap();

        transport.respond_json(500, envelopes::error("boom"));
        auth.logout().await.unwrap();

        assert!(!auth.session().is_authenticated());
        assert!(!path.exists());
        let logout_request = transport.last_request().unwrap();
        assert!(logout_request.url.ends_with("/auth/logout"));
        assert_eq!(logout_request.header("Authorization"), Some("Bearer tok_live"));
    }

    #[tokio::test]
    async fn test_logout_without_session_skips_backend() {
        let (auth, transport) = service(TestHarness::new());
        auth.logout().await.unwrap();
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_hydrate_discards_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        tokio::fs::write(&path, "{ truncated").await.unwrap();

        let (auth, _transport) = service(TestHarness::new());
        let auth = auth.with_store(&path);

        assert!(auth.hydrate().await.is_none());
        assert!(!auth.session().is_authenticated());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_refresh_token_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        let (auth, _transport) = service(TestHarness::mocked());
        let auth = auth.with_store(&path);

        assert!(!auth.refresh_token("early").await.unwrap());

        auth.login(credentials("a@b.com")).await.unwrap();
        assert!(auth.refresh_token("tok_rotated").await.unwrap());

        let saved = JsonStore::<Session>::new(&path).load().await.unwrap().unwrap();
        assert_eq!(saved.access_token, "tok_rotated");
    }

    #[tokio::test]
    async fn test_refresh_keeps_old_token_when_save_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        let (auth, _transport) = service(TestHarness::mocked());
        let auth = auth.with_store(&path);
        let signed_in = auth.login(credentials("a@b.com")).await.unwrap();
        let original = signed_in.token.unwrap();

        // a directory where the temp file goes makes the write fail
        tokio::fs::create_dir(path.with_extension("tmp")).await.unwrap();

        let err = auth.refresh_token("tok_rotated").await.unwrap_err();

        assert!(matches!(err, AuthError::Persistence(_)));
        assert_eq!(auth.session().current_access_token(), original);
        let saved = JsonStore::<Session>::new(&path).load().await.unwrap().unwrap();
        assert_eq!(saved.access_token, original);
    }
}
