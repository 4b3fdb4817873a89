//! Lookup configuration.
//!
//! # Environment Variables
//!
//! | Field | Env Var | Default |
//! |-------|---------|---------|
//! | `postal_code` | `CEPRACE_POSTAL_CODE` | `54325251` |
//! | `timeout_ms` | `CEPRACE_TIMEOUT_MS` | `1000` |
//! | `brasilapi_base_url` | `CEPRACE_BRASILAPI_URL` | `https://brasilapi.com.br` |
//! | `viacep_base_url` | `CEPRACE_VIACEP_URL` | `http://viacep.com.br` |
//! | `cancel_losers_on_win` | `CEPRACE_CANCEL_LOSERS` | `false` |

use std::env;
use std::time::Duration;

use serde::Serialize;

use crate::adapters::{BrasilApiAdapter, ViaCepAdapter};
use crate::ConfigError;

pub const DEFAULT_POSTAL_CODE: &str = "54325251";
pub const DEFAULT_TIMEOUT_MS: u64 = 1_000;

const ENV_POSTAL_CODE: &str = "CEPRACE_POSTAL_CODE";
const ENV_TIMEOUT_MS: &str = "CEPRACE_TIMEOUT_MS";
const ENV_BRASILAPI_URL: &str = "CEPRACE_BRASILAPI_URL";
const ENV_VIACEP_URL: &str = "CEPRACE_VIACEP_URL";
const ENV_CANCEL_LOSERS: &str = "CEPRACE_CANCEL_LOSERS";

/// Everything one lookup needs, passed explicitly at call time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupConfig {
    pub postal_code: String,
    pub timeout_ms: u64,
    pub brasilapi_base_url: String,
    pub viacep_base_url: String,
    /// Abort the losing requests as soon as a winner is picked instead of
    /// leaving them to the overall deadline.
    pub cancel_losers_on_win: bool,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            postal_code: String::from(DEFAULT_POSTAL_CODE),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            brasilapi_base_url: String::from(BrasilApiAdapter::DEFAULT_BASE_URL),
            viacep_base_url: String::from(ViaCepAdapter::DEFAULT_BASE_URL),
            cancel_losers_on_win: false,
        }
    }
}

impl LookupConfig {
    /// Defaults overlaid with the `CEPRACE_*` process environment.
    pub fn with_env_overrides() -> Result<Self, ConfigError> {
        Self::default().apply_env(|name| env::var(name).ok())
    }

    /// Overlay values from `lookup`; unset or blank variables are skipped.
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        if let Some(postal_code) = read(ENV_POSTAL_CODE) {
            self.postal_code = postal_code;
        }
        if let Some(raw) = read(ENV_TIMEOUT_MS) {
            self.timeout_ms = raw
                .parse()
                .map_err(|_| ConfigError::InvalidTimeout { value: raw.clone() })?;
        }
        if let Some(url) = read(ENV_BRASILAPI_URL) {
            self.brasilapi_base_url = url;
        }
        if let Some(url) = read(ENV_VIACEP_URL) {
            self.viacep_base_url = url;
        }
        if let Some(raw) = read(ENV_CANCEL_LOSERS) {
            self.cancel_losers_on_win = parse_flag(ENV_CANCEL_LOSERS, &raw)?;
        }

        Ok(self)
    }

    pub fn with_postal_code(mut self, postal_code: impl Into<String>) -> Self {
        self.postal_code = postal_code.into();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_brasilapi_base_url(mut self, url: impl Into<String>) -> Self {
        self.brasilapi_base_url = url.into();
        self
    }

    pub fn with_viacep_base_url(mut self, url: impl Into<String>) -> Self {
        self.viacep_base_url = url.into();
        self
    }

    pub fn with_cancel_losers_on_win(mut self, enabled: bool) -> Self {
        self.cancel_losers_on_win = enabled;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Postal codes are passed through as-is; only the budget and backend
    /// URLs are checked.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        validate_base_url("brasilapi", &self.brasilapi_base_url)?;
        validate_base_url("viacep", &self.viacep_base_url)?;
        Ok(())
    }
}

fn validate_base_url(backend: &'static str, url: &str) -> Result<(), ConfigError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::EmptyBaseUrl { backend });
    }

    let has_host = ["http://", "https://"]
        .iter()
        .filter_map(|scheme| trimmed.strip_prefix(scheme))
        .any(|rest| !rest.is_empty());
    if !has_host {
        return Err(ConfigError::InvalidBaseUrl {
            backend,
            value: trimmed.to_owned(),
        });
    }

    Ok(())
}

fn parse_flag(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            name,
            value: raw.to_owned(),
        }),
    }
}
