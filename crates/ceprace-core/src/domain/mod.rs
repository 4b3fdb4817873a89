//! # Domain Models
//!
//! The normalized shape every backend is folded into.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Address`] | One resolved address, tagged with the backend that produced it |

mod address;

pub use address::Address;
