//! # ceprace Core
//!
//! Resolve a Brazilian postal code (CEP) by racing redundant address
//! backends and keeping the first usable answer.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Backend adapters (BrasilAPI, ViaCEP) |
//! | [`config`] | Lookup configuration and environment overrides |
//! | [`data_source`] | Address source trait |
//! | [`domain`] | Normalized [`Address`] |
//! | [`error`] | Config and per-backend fetch errors |
//! | [`http_client`] | HTTP transport seam (reqwest / scripted) |
//! | [`race`] | Race coordinator |
//! | [`source`] | Backend identifiers |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ceprace_core::LookupConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = LookupConfig::default().with_postal_code("01001000");
//!     let success = ceprace_core::resolve(&config).await?;
//!     println!("{} via {}", success.address.street, success.winner);
//!     Ok(())
//! }
//! ```
//!
//! ## Failure Model
//!
//! A backend that errors, answers "not found", or sends garbage simply never
//! delivers. The only failure a caller sees is [`RaceTimeout`]. Per-backend
//! causes are emitted as `tracing` debug events and can be collected from
//! [`Stragglers::settle`].

pub mod adapters;
pub mod config;
pub mod data_source;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod race;
pub mod source;

pub use adapters::{BrasilApiAdapter, ViaCepAdapter};

pub use config::{LookupConfig, DEFAULT_POSTAL_CODE, DEFAULT_TIMEOUT_MS};

pub use data_source::{AddressSource, FetchFuture};

pub use domain::Address;

pub use error::{ConfigError, FetchError, LookupError};

pub use http_client::{
    HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient, ScriptedHttpClient,
    ScriptedReply,
};

pub use race::{
    contend, ContenderReport, Delivery, RaceCoordinator, RaceResult, RaceSuccess, RaceTimeout,
    Stragglers,
};

pub use source::ProviderId;

/// Validate `config` and race both backends with a fresh reqwest client.
pub async fn resolve(config: &LookupConfig) -> Result<RaceSuccess, LookupError> {
    config.validate()?;
    let coordinator = RaceCoordinator::from_config(config);
    Ok(coordinator
        .race(&config.postal_code, config.timeout())
        .await?)
}
