use std::{collections::HashMap, sync::Arc};

use serde_json::Value;

use super::query::{ArticleQuery, CategoryQuery, QueryExpressionBuilder, UserQuery};
use crate::types::{serialize_document, Article, Category, User};

/// Turns a raw index document into its wire representation.
pub type DocumentSerializer = fn(Value) -> Result<Value, serde_json::Error>;

/// Everything needed to search one entity type.
#[derive(Clone)]
pub struct SearchTarget {
    pub index: String,
    pub builder: Arc<dyn QueryExpressionBuilder>,
    pub serializer: DocumentSerializer,
}

impl SearchTarget {
    pub fn new(
        index: impl Into<String>,
        builder: impl QueryExpressionBuilder + 'static,
        serializer: DocumentSerializer,
    ) -> Self {
        Self {
            index: index.into(),
            builder: Arc::new(builder),
            serializer,
        }
    }
}

/// Search targets keyed by the entity-type path segment.
#[derive(Clone, Default)]
pub struct SearchRegistry {
    targets: HashMap<String, SearchTarget>,
}

impl SearchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// `user`, `category` and `article` over the given indices.
    pub fn standard(user_index: &str, category_index: &str, article_index: &str) -> Self {
        Self::new()
            .register(
                "user",
                SearchTarget::new(user_index, UserQuery, serialize_document::<User>),
            )
            .register(
                "category",
                SearchTarget::new(category_index, CategoryQuery, serialize_document::<Category>),
            )
            .register(
                "article",
                SearchTarget::new(article_index, ArticleQuery, serialize_document::<Article>),
            )
    }

    pub fn register(mut self, entity_type: impl Into<String>, target: SearchTarget) -> Self {
        self.targets.insert(entity_type.into(), target);
        self
    }

    pub fn get(&self, entity_type: &str) -> Option<&SearchTarget> {
        self.targets.get(entity_type)
    }

    pub fn entity_types(&self) -> impl Iterator<Item = &str> {
        self.targets.keys().map(String::as_str)
    }
}
