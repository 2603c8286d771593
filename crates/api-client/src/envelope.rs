//! Response envelope normalization
//!
//! The backend wraps payloads as `{message?, data|user|response?}`.
//! Lookups use JSON pointers into the whole body so descriptors can reach
//! nested fields such as `/data/user` or `/data/token`. A missing required
//! field is a [`ApiError::MalformedResponse`]; a missing optional one is not.

use crate::http::RawResponse;
use crate::{ApiError, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Keys that may carry the payload, in lookup order
const PAYLOAD_KEYS: [&str; 3] = ["data", "user", "response"];

/// A parsed backend envelope
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    body: Value,
}

impl Envelope {
    /// Parse a response body; it must be a JSON object
    pub fn parse(response: &RawResponse) -> Result<Self> {
        let body: Value = response.json()?;
        Self::from_value(body)
    }

    /// Wrap an already decoded body
    pub fn from_value(body: Value) -> Result<Self> {
        if !body.is_object() {
            return Err(ApiError::malformed("response envelope is not an object"));
        }
        Ok(Self { body })
    }

    /// The backend's human-readable message
    pub fn message(&self) -> Option<&str> {
        self.body.get("message").and_then(Value::as_str)
    }

    /// The payload under the first of `data`, `user`, `response` present
    pub fn payload(&self) -> Option<&Value> {
        PAYLOAD_KEYS
            .iter()
            .find_map(|key| self.body.get(*key).filter(|value| !value.is_null()))
    }

    /// Decode the payload, which must be present
    pub fn require_payload<T: DeserializeOwned>(&self) -> Result<T> {
        let value = self
            .payload()
            .ok_or_else(|| ApiError::malformed("response has no data, user or response field"))?;
        decode(value.clone(), "payload")
    }

    /// Decode the value at a JSON pointer, which must be present
    pub fn require<T: DeserializeOwned>(&self, pointer: &str) -> Result<T> {
        match self.lookup(pointer) {
            Some(value) => decode(value.clone(), pointer),
            None => Err(ApiError::malformed(format!("missing required field {}", pointer))),
        }
    }

    /// Decode the value at a JSON pointer if present and non-null
    ///
    /// A present value of the wrong shape is still an error.
    pub fn optional<T: DeserializeOwned>(&self, pointer: &str) -> Result<Option<T>> {
        self.lookup(pointer)
            .map(|value| decode(value.clone(), pointer))
            .transpose()
    }

    /// First non-empty string among several candidate pointers
    pub fn first_string(&self, pointers: &[&str]) -> Option<String> {
        pointers
            .iter()
            .filter_map(|pointer| self.lookup(pointer))
            .filter_map(Value::as_str)
            .find(|value| !value.is_empty())
            .map(str::to_string)
    }

    /// The whole decoded body
    pub fn body(&self) -> &Value {
        &self.body
    }

    fn lookup(&self, pointer: &str) -> Option<&Value> {
        self.body.pointer(pointer).filter(|value| !value.is_null())
    }
}

fn decode<T: DeserializeOwned>(value: Value, at: &str) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| ApiError::malformed(format!("unexpected shape at {}: {}", at, e)))
}
