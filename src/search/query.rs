//! Search engine query expressions and the per-entity strategies that build them.
//!
//! Expressions serialize to the Elasticsearch query DSL. Each entity type supplies its own
//! [`QueryExpressionBuilder`]; the pagination engine never looks inside an expression.

use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};
use thiserror::Error;

/// Longest accepted query term, in characters.
pub const MAX_QUERY_CHARS: usize = 1024;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryBuildError {
    #[error("query contains control characters")]
    ControlCharacter,

    #[error("query is longer than {max} characters")]
    TooLong { max: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fuzziness {
    /// Edit distance derived from term length by the engine.
    Auto,
    Edits(u8),
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryExpression {
    MatchNone,
    Match {
        field: String,
        query: String,
    },
    MultiMatch {
        query: String,
        fields: Vec<String>,
        fuzziness: Option<Fuzziness>,
    },
    Bool {
        should: Vec<QueryExpression>,
        minimum_should_match: u32,
    },
}

impl QueryExpression {
    pub fn matches(field: impl Into<String>, query: impl Into<String>) -> Self {
        Self::Match {
            field: field.into(),
            query: query.into(),
        }
    }

    pub fn multi_match<F: Into<String>>(
        query: impl Into<String>,
        fields: impl IntoIterator<Item = F>,
    ) -> Self {
        Self::MultiMatch {
            query: query.into(),
            fields: fields.into_iter().map(Into::into).collect(),
            fuzziness: None,
        }
    }

    /// Sets fuzziness on a multi-match; other expressions are returned unchanged.
    pub fn fuzzy(self, fuzziness: Fuzziness) -> Self {
        match self {
            Self::MultiMatch { query, fields, .. } => Self::MultiMatch {
                query,
                fields,
                fuzziness: Some(fuzziness),
            },
            other => other,
        }
    }

    pub fn any_of(should: Vec<QueryExpression>) -> Self {
        Self::Bool {
            should,
            minimum_should_match: 1,
        }
    }

    pub fn to_dsl(&self) -> Value {
        match self {
            Self::MatchNone => json!({ "match_none": {} }),
            Self::Match { field, query } => {
                let mut clause = Map::new();
                clause.insert(field.clone(), json!(query));
                json!({ "match": clause })
            }
            Self::MultiMatch {
                query,
                fields,
                fuzziness,
            } => {
                let mut body = json!({ "query": query, "fields": fields });
                match fuzziness {
                    Some(Fuzziness::Auto) => body["fuzziness"] = json!("AUTO"),
                    Some(Fuzziness::Edits(edits)) => body["fuzziness"] = json!(edits),
                    None => {}
                }
                json!({ "multi_match": body })
            }
            Self::Bool {
                should,
                minimum_should_match,
            } => json!({
                "bool": {
                    "should": should.iter().map(Self::to_dsl).collect::<Vec<_>>(),
                    "minimum_should_match": minimum_should_match,
                }
            }),
        }
    }
}

impl Serialize for QueryExpression {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_dsl().serialize(serializer)
    }
}

/// Builds the engine expression for one entity type from a raw query string.
pub trait QueryExpressionBuilder: Send + Sync {
    fn build(&self, query: &str) -> Result<QueryExpression, QueryBuildError>;
}

/// Validates a raw term. Returns `None` for a blank term, which matches nothing.
pub fn normalize_term(query: &str) -> Result<Option<&str>, QueryBuildError> {
    if query.chars().any(char::is_control) {
        return Err(QueryBuildError::ControlCharacter);
    }
    if query.chars().count() > MAX_QUERY_CHARS {
        return Err(QueryBuildError::TooLong {
            max: MAX_QUERY_CHARS,
        });
    }
    let term = query.trim();
    Ok((!term.is_empty()).then_some(term))
}

/// At least one of username, first name or last name must match.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserQuery;

impl QueryExpressionBuilder for UserQuery {
    fn build(&self, query: &str) -> Result<QueryExpression, QueryBuildError> {
        let Some(term) = normalize_term(query)? else {
            return Ok(QueryExpression::MatchNone);
        };
        Ok(QueryExpression::any_of(
            ["username", "first_name", "last_name"]
                .into_iter()
                .map(|field| QueryExpression::matches(field, term))
                .collect(),
        ))
    }
}

/// Fuzzy match over name and description.
#[derive(Debug, Clone, Copy, Default)]
pub struct CategoryQuery;

impl QueryExpressionBuilder for CategoryQuery {
    fn build(&self, query: &str) -> Result<QueryExpression, QueryBuildError> {
        let Some(term) = normalize_term(query)? else {
            return Ok(QueryExpression::MatchNone);
        };
        Ok(QueryExpression::multi_match(term, ["name", "description"]).fuzzy(Fuzziness::Auto))
    }
}

/// Exact multi-field match over title, author, type and content.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArticleQuery;

impl QueryExpressionBuilder for ArticleQuery {
    fn build(&self, query: &str) -> Result<QueryExpression, QueryBuildError> {
        let Some(term) = normalize_term(query)? else {
            return Ok(QueryExpression::MatchNone);
        };
        Ok(QueryExpression::multi_match(
            term,
            ["title", "author", "type", "content"],
        ))
    }
}
