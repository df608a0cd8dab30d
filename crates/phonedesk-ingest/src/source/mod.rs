//! Paginated row sources
//!
//! A [`RowSource`] hands out the upstream table one page at a time, in a
//! stable order, so a rerun after a partial failure revisits the same records
//! in the same sequence.

pub mod postgres;

use crate::error::SourceError;
use crate::record::RawRecord;
use async_trait::async_trait;

pub use postgres::{PgRowSource, SourceConfig};

/// Paginated reader over the upstream records
#[async_trait]
pub trait RowSource: Send {
    /// Next page of at most `page_size` records.
    ///
    /// A page shorter than `page_size` is the last one; an empty page means
    /// the source is exhausted.
    async fn next_page(&mut self, page_size: usize) -> Result<Vec<RawRecord>, SourceError>;
}

/// Row source over records held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryRowSource {
    records: Vec<RawRecord>,
    cursor: usize,
    pages_served: usize,
}

impl MemoryRowSource {
    pub fn new(records: Vec<RawRecord>) -> Self {
        Self {
            records,
            cursor: 0,
            pages_served: 0,
        }
    }

    /// Number of `next_page` calls answered so far
    pub fn pages_served(&self) -> usize {
        self.pages_served
    }
}

#[async_trait]
impl RowSource for MemoryRowSource {
    async fn next_page(&mut self, page_size: usize) -> Result<Vec<RawRecord>, SourceError> {
        let end = self.cursor.saturating_add(page_size).min(self.records.len());
        let page = self.records[self.cursor..end].to_vec();
        self.cursor = end;
        self.pages_served += 1;
        Ok(page)
    }
}
