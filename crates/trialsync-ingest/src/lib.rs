//! Ingestion driver for trialsync.
//!
//! [`Pipeline`] runs each source adapter end to end (fetch → parse → ensure
//! table → insert) and then redefines the combined view. [`Scheduler`] owns a
//! pipeline and repeats it on a fixed interval. The `trialsync` binary wires
//! both to [`Settings`].

pub mod config;
pub mod pipeline;
pub mod scheduler;

pub use crate::config::Settings;
pub use pipeline::{Pipeline, RunReport, SourceReport};
pub use scheduler::Scheduler;
