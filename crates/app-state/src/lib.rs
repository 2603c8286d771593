//! Application state management for BuyLocal
//!
//! This crate provides the global loader/notification channel and the
//! helper screens use to route request outcomes into it.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod feedback;
pub mod notifier;

pub use feedback::{extract_error, run_with_feedback, FeedbackError};
pub use notifier::{ChannelConsumer, ChannelError, ChannelEvent, NotificationProvider, NotificationState, NotifierHandle};
