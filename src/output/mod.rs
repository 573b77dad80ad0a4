//! Output module for scrape results
//!
//! This module defines the result records and the sink they are persisted
//! to after every successful scrape.

mod json_sink;
mod result;

pub use json_sink::JsonFileSink;
pub use result::{format_elapsed, Comment, ScrapeResult};

use crate::ScrapeError;
use async_trait::async_trait;

/// Destination for assembled scrape results
///
/// A sink holds at most one record; persisting replaces whatever was stored.
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Stores the result, replacing any previous record
    async fn persist(&self, result: &ScrapeResult) -> Result<(), ScrapeError>;

    /// Reads back the stored record, if any
    async fn load(&self) -> Result<Option<ScrapeResult>, ScrapeError>;
}
