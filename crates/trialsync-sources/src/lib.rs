//! Source adapters for the two trial registries.
//!
//! Each adapter turns one registry's native format into the canonical records
//! of [`trialsync_core::study`]:
//!
//! - [`us`]: JSON API, one page per run, no retry.
//! - [`eu`]: HTML search page, bounded retry, label/value extraction.
//!
//! Network access goes through the [`Fetch`] trait so parsers and retry
//! policy can be exercised without a network.

pub mod error;
pub mod eu;
pub mod fetch;
pub mod us;

pub use error::{Error, Result};
pub use fetch::{Fetch, HttpFetcher};
