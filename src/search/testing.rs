//! In-memory search clients for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{
    query::QueryExpression,
    result_set::{SearchClient, SearchHits, TotalHits},
};
use crate::error::EngineError;

/// Serves a fixed, relevance-ordered document list regardless of the query.
pub struct StaticClient {
    documents: Vec<Value>,
    calls: AtomicUsize,
}

impl StaticClient {
    pub fn with_documents(count: usize) -> Self {
        Self {
            documents: (0..count).map(|id| json!({ "id": id })).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchClient for StaticClient {
    async fn search(
        &self,
        _index: &str,
        _query: &QueryExpression,
        from: u64,
        size: u64,
    ) -> Result<SearchHits, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(SearchHits {
            documents: self
                .documents
                .iter()
                .skip(from as usize)
                .take(size as usize)
                .cloned()
                .collect(),
            total: TotalHits::exact(self.documents.len() as u64),
        })
    }
}

pub struct FailingClient;

#[async_trait]
impl SearchClient for FailingClient {
    async fn search(
        &self,
        _index: &str,
        _query: &QueryExpression,
        _from: u64,
        _size: u64,
    ) -> Result<SearchHits, EngineError> {
        Err(EngineError::Rejected {
            status: 503,
            reason: "all shards failed".into(),
        })
    }
}
