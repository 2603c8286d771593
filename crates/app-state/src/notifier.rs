//! Global loader and notification channel
//!
//! One [`NotificationProvider`] exists per app scope. Screens receive
//! [`NotifierHandle`]s that toggle the blocking spinner and raise one-shot
//! error/success pulses; the presentation layer renders from
//! [`NotificationState`] snapshots or from the [`ChannelEvent`] stream.
//!
//! Handles hold only a weak reference: once the provider is gone every
//! operation fails with [`ChannelError::NotInitialized`].
//!
//! # Example
//!
//! ```rust
//! use app_state::notifier::NotificationProvider;
//!
//! let provider = NotificationProvider::new();
//! let notifier = provider.handle();
//!
//! notifier.set_loading(true, Some("Signing in...")).unwrap();
//! notifier.set_error("Invalid credentials").unwrap();
//! notifier.set_loading(false, None).unwrap();
//!
//! let state = provider.snapshot();
//! assert!(!state.loading);
//! assert_eq!(state.error.as_deref(), Some("Invalid credentials"));
//! ```

use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use thiserror::Error;
use tokio::sync::broadcast;

/// Capacity of the event stream before slow subscribers lag
const EVENT_CAPACITY: usize = 64;

/// Channel errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// The handle is detached or its provider was dropped
    #[error("Notification channel used outside an active provider")]
    NotInitialized,
}

/// Result type for channel operations
pub type Result<T> = std::result::Result<T, ChannelError>;

/// The single process-wide loader/notification record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationState {
    /// Whether a blocking operation is in flight
    pub loading: bool,
    /// Caption under the spinner
    pub loading_text: String,
    /// Pending error toast
    pub error: Option<String>,
    /// Pending success toast
    pub success: Option<String>,
    /// Whether the blocking overlay may cover the screen
    pub show_page: bool,
}

impl Default for NotificationState {
    fn default() -> Self {
        Self {
            loading: false,
            loading_text: String::new(),
            error: None,
            success: None,
            show_page: true,
        }
    }
}

impl NotificationState {
    /// Whether the blocking overlay should be drawn
    pub fn overlay_visible(&self) -> bool {
        self.loading && self.show_page
    }
}

/// Change notifications for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// `loading` was set
    Loading {
        /// New flag
        loading: bool,
        /// Caption, empty when idle
        text: String,
    },
    /// An error pulse was raised
    Error(String),
    /// A success pulse was raised
    Success(String),
    /// Pending pulses were dropped
    PulsesCleared,
    /// `show_page` changed
    ShowPage(bool),
}

#[derive(Debug)]
struct Shared {
    state: Mutex<NotificationState>,
    events: broadcast::Sender<ChannelEvent>,
}

impl Shared {
    fn update<F>(&self, event: ChannelEvent, f: F)
    where
        F: FnOnce(&mut NotificationState),
    {
        {
            let mut state = self.state.lock();
            f(&mut state);
        }
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

/// Owner of the channel for one app scope
#[derive(Debug)]
pub struct NotificationProvider {
    shared: Arc<Shared>,
}

impl NotificationProvider {
    /// Open a new scope with the default state
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(NotificationState::default()),
                events,
            }),
        }
    }

    /// A handle bound to this scope
    pub fn handle(&self) -> NotifierHandle {
        NotifierHandle { shared: Arc::downgrade(&self.shared) }
    }

    /// Current state
    pub fn snapshot(&self) -> NotificationState {
        self.shared.state.lock().clone()
    }
}

impl Default for NotificationProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// A screen's access to the channel
///
/// `NotifierHandle::default()` is detached and fails every call.
#[derive(Debug, Clone, Default)]
pub struct NotifierHandle {
    shared: Weak<Shared>,
}

impl NotifierHandle {
    /// A handle bound to no provider
    pub fn detached() -> Self {
        Self::default()
    }

    fn shared(&self) -> Result<Arc<Shared>> {
        self.shared.upgrade().ok_or(ChannelError::NotInitialized)
    }

    /// Whether the provider is still alive
    pub fn is_active(&self) -> bool {
        self.shared.strong_count() > 0
    }

    /// Enter or leave the loading state
    ///
    /// Leaving always clears the caption, whatever pulses were raised meanwhile.
    pub fn set_loading(&self, loading: bool, text: Option<&str>) -> Result<()> {
        let text = if loading { text.unwrap_or_default().to_string() } else { String::new() };
        let event = ChannelEvent::Loading { loading, text: text.clone() };
        self.shared()?.update(event, |state| {
            state.loading = loading;
            state.loading_text = text;
        });
        Ok(())
    }

    /// Raise an error pulse
    pub fn set_error(&self, message: impl Into<String>) -> Result<()> {
        let message = message.into();
        self.shared()?
            .update(ChannelEvent::Error(message.clone()), |state| state.error = Some(message));
        Ok(())
    }

    /// Raise a success pulse
    pub fn set_success(&self, message: impl Into<String>) -> Result<()> {
        let message = message.into();
        self.shared()?
            .update(ChannelEvent::Success(message.clone()), |state| state.success = Some(message));
        Ok(())
    }

    /// Allow or suppress the blocking overlay
    pub fn set_show_page(&self, show: bool) -> Result<()> {
        self.shared()?
            .update(ChannelEvent::ShowPage(show), |state| state.show_page = show);
        Ok(())
    }

    /// Current state
    pub fn snapshot(&self) -> Result<NotificationState> {
        Ok(self.shared()?.state.lock().clone())
    }

    /// Consume the pending error, if any
    pub fn take_error(&self) -> Result<Option<String>> {
        Ok(self.shared()?.state.lock().error.take())
    }

    /// Consume the pending success message, if any
    pub fn take_success(&self) -> Result<Option<String>> {
        Ok(self.shared()?.state.lock().success.take())
    }

    /// Drop both pending pulses
    pub fn clear_pulses(&self) -> Result<()> {
        self.shared()?.update(ChannelEvent::PulsesCleared, |state| {
            state.error = None;
            state.success = None;
        });
        Ok(())
    }

    /// Stream of subsequent changes
    pub fn subscribe(&self) -> Result<broadcast::Receiver<ChannelEvent>> {
        Ok(self.shared()?.events.subscribe())
    }

    /// Register a consuming component
    ///
    /// Dropping the returned guard clears pending pulses and restores
    /// `show_page`, so no consumer can hide the overlay for others.
    pub fn attach(&self) -> Result<ChannelConsumer> {
        self.shared()?;
        Ok(ChannelConsumer { handle: self.clone() })
    }
}

/// Lifetime of one consuming component
#[derive(Debug)]
pub struct ChannelConsumer {
    handle: NotifierHandle,
}

impl ChannelConsumer {
    /// The underlying handle
    pub fn handle(&self) -> &NotifierHandle {
        &self.handle
    }
}

impl std::ops::Deref for ChannelConsumer {
    type Target = NotifierHandle;

    fn deref(&self) -> &Self::Target {
        &self.handle
    }
}

impl Drop for ChannelConsumer {
    fn drop(&mut self) {
        // Provider may already be gone at teardown
        if let Ok(shared) = self.handle.shared() {
            shared.update(ChannelEvent::PulsesCleared, |state| {
                state.error = None;
                state.success = None;
            });
            shared.update(ChannelEvent::ShowPage(true), |state| state.show_page = true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state() {
        let provider = NotificationProvider::new();
        let state = provider.snapshot();
        assert!(!state.loading);
        assert!(state.show_page);
        assert!(state.error.is_none() && state.success.is_none());
    }

    #[test]
    fn test_loading_cleared_regardless_of_pulses() {
        let provider = NotificationProvider::new();
        let notifier = provider.handle();

        notifier.set_loading(true, Some("x")).unwrap();
        assert_eq!(provider.snapshot().loading_text, "x");
        notifier.set_error("boom").unwrap();
        notifier.set_success("done").unwrap();
        notifier.set_loading(false, Some("ignored")).unwrap();

        let state = provider.snapshot();
        assert!(!state.loading);
        assert_eq!(state.loading_text, "");
        assert_eq!(state.error.as_deref(), Some("boom"));
        assert_eq!(state.success.as_deref(), Some("done"));
    }

    #[test]
    fn test_pulses_are_one_shot() {
        let provider = NotificationProvider::new();
        let notifier = provider.handle();

        notifier.set_error("boom").unwrap();
        assert_eq!(notifier.take_error().unwrap().as_deref(), Some("boom"));
        assert_eq!(notifier.take_error().unwrap(), None);

        notifier.set_success("saved").unwrap();
        assert_eq!(notifier.take_success().unwrap().as_deref(), Some("saved"));
        assert_eq!(notifier.take_success().unwrap(), None);
    }

    #[test]
    fn test_last_write_wins() {
        let provider = NotificationProvider::new();
        let first = provider.handle();
        let second = provider.handle();

        first.set_loading(true, Some("first")).unwrap();
        second.set_loading(true, Some("second")).unwrap();
        second.set_loading(false, None).unwrap();

        assert!(!provider.snapshot().loading);
    }

    #[test]
    fn test_consumer_teardown_restores_overlay() {
        let provider = NotificationProvider::new();
        let notifier = provider.handle();

        {
            let consumer = notifier.attach().unwrap();
            consumer.set_show_page(false).unwrap();
            consumer.set_loading(true, None).unwrap();
            consumer.set_error("resend failed").unwrap();

            let state = provider.snapshot();
            assert!(state.loading && !state.overlay_visible());
        }

        let state = provider.snapshot();
        assert!(state.show_page);
        assert!(state.error.is_none());
        assert!(state.overlay_visible());
    }

    #[test]
    fn test_detached_handle() {
        let notifier = NotifierHandle::detached();
        assert!(!notifier.is_active());
        assert_eq!(notifier.set_loading(true, None), Err(ChannelError::NotInitialized));
        assert_eq!(notifier.snapshot(), Err(ChannelError::NotInitialized));
        assert!(notifier.attach().is_err());
    }

    #[test]
    fn test_handle_outlives_provider() {
        let provider = NotificationProvider::new();
        let notifier = provider.handle();
        let consumer = notifier.attach().unwrap();
        drop(provider);

        assert_eq!(notifier.set_success("late"), Err(ChannelError::NotInitialized));
        // Teardown after the provider is gone must not panic
        drop(consumer);
    }

    #[tokio::test]
    async fn test_event_stream() {
        let provider = NotificationProvider::new();
        let notifier = provider.handle();
        let mut events = notifier.subscribe().unwrap();

        notifier.set_loading(true, Some("Loading products")).unwrap();
        notifier.set_success("Loaded").unwrap();

        assert_eq!(
            events.recv().await.unwrap(),
            ChannelEvent::Loading { loading: true, text: "Loading products".to_string() }
        );
        assert_eq!(events.recv().await.unwrap(), ChannelEvent::Success("Loaded".to_string()));
    }
}
