//! Address source trait.
//!
//! Every backend adapter implements [`AddressSource`]: it turns a postal code
//! into a normalized [`Address`] or a tagged [`FetchError`]. Racing,
//! cancellation and channel delivery live in [`crate::race`], so an adapter
//! only has to know its own URL template and wire format.
//!
//! # Example
//!
//! ```rust,ignore
//! use ceprace_core::{AddressSource, ViaCepAdapter};
//!
//! async fn lookup(adapter: &ViaCepAdapter) {
//!     match adapter.fetch("01001000").await {
//!         Ok(address) => println!("{} ({})", address.street, address.source_label()),
//!         Err(error) => eprintln!("viacep: {error}"),
//!     }
//! }
//! ```

use std::future::Future;
use std::pin::Pin;

use crate::{Address, FetchError, ProviderId};

pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<Address, FetchError>> + Send + 'a>>;

/// Backend adapter contract.
pub trait AddressSource: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Fully resolved request URL for `postal_code`.
    fn endpoint(&self, postal_code: &str) -> String;

    /// Fetch and normalize one address. Dropping the future aborts the
    /// underlying request.
    fn fetch<'a>(&'a self, postal_code: &'a str) -> FetchFuture<'a>;
}
