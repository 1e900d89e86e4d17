//! Relational read path used by the fallback search route.

use async_trait::async_trait;
use deadpool_postgres::Pool as PostgresPool;
use log::{debug, warn};

use crate::{
    error::EngineError,
    search::{ExecutedSlice, PageBounds, TotalHits},
    types::{Article, ArticleType},
};

/// Substring search over stored articles.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Articles whose title or content contains `needle`, ordered by id, restricted to
    /// `bounds`, together with the total number of matching articles.
    async fn find_containing(
        &self,
        needle: &str,
        bounds: PageBounds,
    ) -> Result<ExecutedSlice<Article>, EngineError>;
}

const FIND_CONTAINING: &str = "
    WITH matched AS (
        SELECT a.id::bigint AS id, a.title, u.username AS author, a.type, a.content
        FROM core_article a
        INNER JOIN auth_user u ON u.id = a.author_id
        WHERE a.title LIKE $1 ESCAPE '\\' OR a.content LIKE $1 ESCAPE '\\'
    )
    SELECT total.count AS total, page.*
    FROM (SELECT COUNT(*) AS count FROM matched) total
    LEFT JOIN LATERAL (
        SELECT * FROM matched ORDER BY id OFFSET $2 LIMIT $3
    ) page ON TRUE
";

const FIND_CONTAINING_INSENSITIVE: &str = "
    WITH matched AS (
        SELECT a.id::bigint AS id, a.title, u.username AS author, a.type, a.content
        FROM core_article a
        INNER JOIN auth_user u ON u.id = a.author_id
        WHERE a.title ILIKE $1 ESCAPE '\\' OR a.content ILIKE $1 ESCAPE '\\'
    )
    SELECT total.count AS total, page.*
    FROM (SELECT COUNT(*) AS count FROM matched) total
    LEFT JOIN LATERAL (
        SELECT * FROM matched ORDER BY id OFFSET $2 LIMIT $3
    ) page ON TRUE
";

#[derive(Clone)]
pub struct PostgresArticleStore {
    pool: PostgresPool,
    case_insensitive: bool,
}

impl PostgresArticleStore {
    pub fn new(pool: PostgresPool, case_insensitive: bool) -> Self {
        Self {
            pool,
            case_insensitive,
        }
    }

    fn statement(&self) -> &'static str {
        match self.case_insensitive {
            true => FIND_CONTAINING_INSENSITIVE,
            false => FIND_CONTAINING,
        }
    }
}

#[async_trait]
impl ArticleStore for PostgresArticleStore {
    async fn find_containing(
        &self,
        needle: &str,
        bounds: PageBounds,
    ) -> Result<ExecutedSlice<Article>, EngineError> {
        let postgres = self.pool.get().await?;
        let pattern = format!("%{}%", escape_like(needle));
        let offset = i64::try_from(bounds.start_index).unwrap_or(i64::MAX);
        let limit = i64::try_from(bounds.limit()).unwrap_or(i64::MAX);
        debug!("Substring search for {:?} at offset {} limit {}", needle, offset, limit);

        // A single statement yields the count and the page from one snapshot. The count row
        // is still present, with NULL page columns, when the page is past the end.
        let rows = postgres
            .query(self.statement(), &[&pattern, &offset, &limit])
            .await?;

        let mut total = 0i64;
        let mut articles = Vec::with_capacity(rows.len());
        for row in rows {
            total = row.try_get::<_, i64>("total")?;
            let Some(id) = row.try_get::<_, Option<i64>>("id")? else {
                continue;
            };
            articles.push(Article {
                id,
                title: row.try_get::<_, String>("title")?,
                author: row.try_get::<_, String>("author")?,
                kind: article_type(id, &row.try_get::<_, String>("type")?),
                content: row.try_get::<_, String>("content")?,
            });
        }

        Ok(ExecutedSlice::new(
            articles,
            TotalHits::exact(total.max(0) as u64),
        ))
    }
}

fn article_type(id: i64, raw: &str) -> ArticleType {
    raw.parse().unwrap_or_else(|e| {
        warn!("Article {} has {}, rendering it as {}", id, e, ArticleType::default());
        ArticleType::default()
    })
}

/// Escape LIKE wildcards so `needle` matches literally.
pub fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
