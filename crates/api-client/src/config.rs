//! Process configuration and the test-mode switch
//!
//! Configuration is read through a [`ConfigSource`] on every lookup rather
//! than snapshotted at startup, so flipping `TEST_MODE` between two calls
//! changes the behavior of the second call.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Base URL of the BuyLocal backend
pub const API_URL: &str = "API_URL";
/// String-typed boolean selecting mock responses
pub const TEST_MODE: &str = "TEST_MODE";
/// Request timeout in whole seconds
pub const API_TIMEOUT_SECS: &str = "API_TIMEOUT_SECS";
/// Simulated latency of mock responses in milliseconds
pub const MOCK_LATENCY_MS: &str = "MOCK_LATENCY_MS";
/// Location of the persisted session file
pub const SESSION_PATH: &str = "SESSION_PATH";

/// A source of string-typed configuration values
pub trait ConfigSource: Send + Sync + fmt::Debug {
    /// Look up a key, returning `None` when unset
    fn get(&self, key: &str) -> Option<String>;
}

/// Look up a key and parse it, treating unparsable values as unset
pub fn parse<T: std::str::FromStr>(source: &dyn ConfigSource, key: &str) -> Option<T> {
    source.get(key).and_then(|raw| raw.trim().parse().ok())
}

/// Reads the process environment at call time
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvConfig;

impl ConfigSource for EnvConfig {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// In-memory configuration that can be changed while the app runs
///
/// Clones share the same values.
#[derive(Debug, Clone, Default)]
pub struct StaticConfig {
    values: Arc<RwLock<HashMap<String, String>>>,
}

impl StaticConfig {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter
    pub fn with(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Set a value
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.values.write().insert(key.into(), value.into());
    }

    /// Remove a value
    pub fn unset(&self, key: &str) {
        self.values.write().remove(key);
    }

    /// Convenience for toggling `TEST_MODE`
    pub fn set_test_mode(&self, enabled: bool) {
        self.set(TEST_MODE, if enabled { "true" } else { "false" });
    }
}

impl ConfigSource for StaticConfig {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }
}

/// Decides per invocation whether descriptors run their mock path
#[derive(Debug, Clone)]
pub struct TestModeSwitch {
    source: Arc<dyn ConfigSource>,
}

impl TestModeSwitch {
    /// Create a switch backed by a configuration source
    pub fn new(source: Arc<dyn ConfigSource>) -> Self {
        Self { source }
    }

    /// Read `TEST_MODE` now. Only a case-insensitive `"true"` enables it.
    pub fn is_test_mode(&self) -> bool {
        self.source
            .get(TEST_MODE)
            .is_some_and(|value| value.trim().eq_ignore_ascii_case("true"))
    }
}
