//! Paginated full-text search.
//!
//! - `cursor`: page / page size parsing and index window arithmetic.
//! - `result_set`: the search client contract and lazily executed result sets.
//! - `engine`: shapes one executed slice into a `count` / `next` / `previous` envelope.
//! - `links`: query-parameter rewriting for navigation links.
//! - `query`: engine query expressions and per-entity builders.
//! - `registry`: entity-type lookup of index, builder and serializer.
//! - `elastic`: HTTP client for Elasticsearch-compatible engines.

pub mod cursor;
pub mod elastic;
pub mod engine;
pub mod links;
pub mod query;
pub mod registry;
pub mod result_set;

#[cfg(test)]
pub(crate) mod testing;

pub use cursor::{PageBounds, PageCursor, PageRequest, PaginationConfig};
pub use elastic::ElasticsearchClient;
pub use engine::PaginationEngine;
pub use query::{
    ArticleQuery, CategoryQuery, Fuzziness, QueryBuildError, QueryExpression,
    QueryExpressionBuilder, UserQuery,
};
pub use registry::{SearchRegistry, SearchTarget};
pub use result_set::{ExecutedSlice, SearchClient, SearchHits, SearchResultSet, TotalHits};
