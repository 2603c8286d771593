//! Routing request outcomes into the notification channel
//!
//! Descriptors never touch the channel themselves. Screens wrap an
//! invocation in [`run_with_feedback`], which raises the spinner, raises
//! exactly one toast for the outcome, and always lowers the spinner again.

use crate::notifier::{ChannelError, NotifierHandle};
use api_client::{ApiError, NetworkErrorKind};
use serde_json::Value;
use std::future::Future;
use thiserror::Error;

/// Errors surfaced by [`run_with_feedback`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedbackError {
    /// The request failed; its toast has already been raised
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The channel was unavailable, so the request was not started
    #[error(transparent)]
    Channel(#[from] ChannelError),
}

/// Result type for feedback-wrapped operations
pub type Result<T> = std::result::Result<T, FeedbackError>;

/// Translate an error into the text shown in a toast
pub fn extract_error(error: &ApiError) -> String {
    match error {
        ApiError::Http { status_code, body } => {
            message_from_body(body).unwrap_or_else(|| status_fallback(*status_code))
        }
        ApiError::Network { kind: NetworkErrorKind::Timeout, .. } => {
            "The request timed out. Please try again.".to_string()
        }
        ApiError::Network { .. } => {
            "Unable to reach the server. Check your internet connection.".to_string()
        }
        ApiError::MalformedResponse(_) => {
            "We received an unexpected response from the server.".to_string()
        }
        ApiError::Validation(message) => message.clone(),
        ApiError::Config(_) => "The app is not configured correctly.".to_string(),
        ApiError::Encoding(_) => "Something went wrong preparing your request.".to_string(),
    }
}

/// Pull `message`, `error`, or the first `errors[].msg|message` out of a JSON body
fn message_from_body(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let non_empty = |v: &Value| v.as_str().filter(|s| !s.trim().is_empty()).map(str::to_string);

    value
        .get("message")
        .and_then(non_empty)
        .or_else(|| value.get("error").and_then(non_empty))
        .or_else(|| {
            value
                .get("errors")?
                .as_array()?
                .iter()
                .find_map(|entry| entry.get("msg").or_else(|| entry.get("message")).and_then(non_empty))
        })
}

fn status_fallback(status: u16) -> String {
    match status {
        400 => "The request was invalid.".to_string(),
        401 => "Your session has expired. Please log in again.".to_string(),
        403 => "You do not have permission to do that.".to_string(),
        404 => "We couldn't find what you were looking for.".to_string(),
        409 => "That conflicts with an existing record.".to_string(),
        500..=599 => "Something went wrong on our end. Please try again later.".to_string(),
        other => format!("Request failed with status {}.", other),
    }
}

/// Lowers the spinner exactly once, even if the future is dropped mid-flight
struct LoadingGuard<'a> {
    notifier: &'a NotifierHandle,
    armed: bool,
}

impl LoadingGuard<'_> {
    fn finish(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if std::mem::take(&mut self.armed) {
            if let Err(e) = self.notifier.set_loading(false, None) {
                tracing::debug!("loader already torn down: {}", e);
            }
        }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Run one invocation with spinner and toast handling
///
/// `success_message` picks the toast text for a successful result; `None`
/// raises no success toast. Failures raise the extracted error message and
/// are returned unchanged inside [`FeedbackError::Api`].
pub async fn run_with_feedback<T, Fut, M>(
    notifier: &NotifierHandle,
    loading_text: Option<&str>,
    operation: Fut,
    success_message: M,
) -> Result<T>
where
    Fut: Future<Output = api_client::Result<T>>,
    M: FnOnce(&T) -> Option<String>,
{
    notifier.set_loading(true, loading_text)?;
    let guard = LoadingGuard { notifier, armed: true };

    let outcome = operation.await;
    guard.finish();

    // The request has already completed; a channel torn down meanwhile only
    // loses the toast, never the outcome.
    match outcome {
        Ok(value) => {
            if let Some(message) = success_message(&value) {
                if let Err(e) = notifier.set_success(message) {
                    tracing::debug!("success toast dropped: {}", e);
                }
            }
            Ok(value)
        }
        Err(err) => {
            tracing::warn!(error = %err, "operation failed");
            if let Err(e) = notifier.set_error(extract_error(&err)) {
                tracing::debug!("error toast dropped: {}", e);
            }
            Err(FeedbackError::Api(err))
        }
    }
}
