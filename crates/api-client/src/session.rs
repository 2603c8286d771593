//! Session token accessor
//!
//! The current session lives behind a [`SessionWriter`], which only the
//! authentication flow holds. Everything else gets a read-only
//! [`SessionHandle`]; both point at the same slot.
//!
//! # Example
//!
//! ```rust
//! use api_client::session::{Session, SessionWriter};
//!
//! let writer = SessionWriter::new();
//! let handle = writer.handle();
//! assert_eq!(handle.current_access_token(), "");
//!
//! writer.set_session(Session::new("tok_123"));
//! assert_eq!(handle.current_access_token(), "tok_123");
//!
//! writer.clear();
//! assert!(!handle.is_authenticated());
//! ```

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// An authenticated session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Bearer token sent with authenticated requests
    pub access_token: String,

    /// Backend user id, when the login response carried one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// Account email
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// When this session was established
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Create a session holding only a token
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            user_id: None,
            email: None,
            created_at: Utc::now(),
        }
    }

    /// Attach the user id
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Attach the email
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

type Slot = Arc<RwLock<Option<Session>>>;

/// Read-only access to the current session
#[derive(Debug, Clone, Default)]
pub struct SessionHandle {
    slot: Slot,
}

impl SessionHandle {
    /// Token of the current session, or an empty string when signed out
    pub fn current_access_token(&self) -> String {
        self.slot
            .read()
            .as_ref()
            .map(|session| session.access_token.clone())
            .unwrap_or_default()
    }

    /// Snapshot of the current session
    pub fn session(&self) -> Option<Session> {
        self.slot.read().clone()
    }

    /// Whether a non-empty token is held
    pub fn is_authenticated(&self) -> bool {
        self.slot
            .read()
            .as_ref()
            .is_some_and(|session| !session.access_token.is_empty())
    }
}

/// Write access to the current session
#[derive(Debug, Default)]
pub struct SessionWriter {
    slot: Slot,
}

impl SessionWriter {
    /// Create an empty session slot
    pub fn new() -> Self {
        Self::default()
    }

    /// A read-only handle onto this slot
    pub fn handle(&self) -> SessionHandle {
        SessionHandle { slot: Arc::clone(&self.slot) }
    }

    /// Replace the current session (login or hydration)
    pub fn set_session(&self, session: Session) {
        *self.slot.write() = Some(session);
    }

    /// Swap in a refreshed token, keeping the rest of the session
    ///
    /// Returns `false` when no session exists.
    pub fn update_access_token(&self, access_token: impl Into<String>) -> bool {
        match self.slot.write().as_mut() {
            Some(session) => {
                session.access_token = access_token.into();
                true
            }
            None => false,
        }
    }

    /// Drop the current session (logout)
    pub fn clear(&self) -> Option<Session> {
        self.slot.write().take()
    }
}
