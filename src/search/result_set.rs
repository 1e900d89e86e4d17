//! Lazily executed search results.
//!
//! A [`SearchResultSet`] is a query that has not run yet. Binding it to a page window with
//! [`SearchResultSet::slice`] and calling [`BoundSearch::execute`] performs the one and only
//! backend round trip of a request. The total hit count is only reachable through the
//! [`ExecutedSlice`] that execution returns, so it cannot be read early and always comes from
//! the same snapshot as the items.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{cursor::PageBounds, query::QueryExpression};
use crate::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalHits {
    pub value: u64,
    /// `false` when the engine only guarantees `value` as a lower bound.
    pub exact: bool,
}

impl TotalHits {
    pub fn exact(value: u64) -> Self {
        Self { value, exact: true }
    }

    pub fn lower_bound(value: u64) -> Self {
        Self {
            value,
            exact: false,
        }
    }
}

/// Raw response of a single search call.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHits {
    pub documents: Vec<Value>,
    pub total: TotalHits,
}

/// Search engine client.
///
/// Implementations must return the total hit count from the same call that returns the
/// documents, never from a separate count request.
#[async_trait]
pub trait SearchClient: Send + Sync {
    async fn search(
        &self,
        index: &str,
        query: &QueryExpression,
        from: u64,
        size: u64,
    ) -> Result<SearchHits, EngineError>;
}

pub struct SearchResultSet<'a> {
    client: &'a dyn SearchClient,
    index: &'a str,
    query: QueryExpression,
}

impl<'a> SearchResultSet<'a> {
    pub fn new(client: &'a dyn SearchClient, index: &'a str, query: QueryExpression) -> Self {
        Self {
            client,
            index,
            query,
        }
    }

    pub fn slice(self, bounds: PageBounds) -> BoundSearch<'a> {
        BoundSearch {
            set: self,
            bounds,
        }
    }
}

/// A result set bound to `[start_index, end_index)`, ready to run once.
pub struct BoundSearch<'a> {
    set: SearchResultSet<'a>,
    bounds: PageBounds,
}

impl BoundSearch<'_> {
    pub async fn execute(self) -> Result<ExecutedSlice<Value>, EngineError> {
        let hits = self
            .set
            .client
            .search(
                self.set.index,
                &self.set.query,
                self.bounds.start_index,
                self.bounds.limit(),
            )
            .await?;
        let mut documents = hits.documents;
        documents.truncate(self.bounds.limit() as usize);
        Ok(ExecutedSlice::new(documents, hits.total))
    }
}

/// Items of one executed page together with the total count of the same execution.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedSlice<T> {
    items: Vec<T>,
    total_hits: TotalHits,
}

impl<T> ExecutedSlice<T> {
    pub fn new(items: Vec<T>, total_hits: TotalHits) -> Self {
        Self { items, total_hits }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), TotalHits::exact(0))
    }

    pub fn total_hits(&self) -> TotalHits {
        self.total_hits
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}
