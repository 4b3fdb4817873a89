use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::race::RaceTimeout;

/// Configuration errors raised before any network activity.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("timeout_ms must be greater than zero")]
    ZeroTimeout,
    #[error("invalid timeout '{value}', expected a whole number of milliseconds")]
    InvalidTimeout { value: String },
    #[error("base URL for {backend} cannot be empty")]
    EmptyBaseUrl { backend: &'static str },
    #[error("base URL for {backend} must start with http:// or https://: '{value}'")]
    InvalidBaseUrl { backend: &'static str, value: String },
    #[error("invalid flag value for {name}: '{value}'")]
    InvalidFlag { name: &'static str, value: String },
    #[error("invalid source '{value}', expected one of brasilapi, viacep")]
    InvalidSource { value: String },
}

/// Why a single backend produced no address.
///
/// These never reach the race outcome; they exist for logging and straggler
/// reports only.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("upstream returned status {0}")]
    Status(u16),
    #[error("upstream reported the postal code as not found")]
    NotFound,
    #[error("response body could not be decoded: {0}")]
    Decode(String),
    #[error("request cancelled before a response arrived")]
    Cancelled,
}

impl From<serde_json::Error> for FetchError {
    fn from(error: serde_json::Error) -> Self {
        Self::Decode(error.to_string())
    }
}

impl Serialize for FetchError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// Everything [`crate::resolve`] can fail with.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Timeout(#[from] RaceTimeout),
}
