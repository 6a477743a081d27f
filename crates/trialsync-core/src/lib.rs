//! Core types and trait definitions for trialsync.
//!
//! This crate is free of HTTP and database dependencies. The source adapters,
//! the SQLite store, the query API and the ingestion binary all depend on it.

// Native `async fn` in traits; the store trait spells out `Send` futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod store;
pub mod study;
pub mod view;

pub use error::{Error, Result};
