//! Storage layer for BuyLocal
//!
//! This crate provides versioned file persistence for state that must
//! survive a restart, such as the signed-in session.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod persistence;

pub use persistence::{JsonStore, PersistenceError};
