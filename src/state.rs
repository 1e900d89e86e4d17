use std::sync::Arc;

use anyhow::Result;
use deadpool_postgres::Runtime;
use log::info;
use once_cell::sync::Lazy;
use redis::Client as RedisClient;
use redis_pool::{RedisPool, SingleRedisPool};
use tokio_postgres::NoTls;
use url::Url;

use crate::{
    config::{Config, CONFIG},
    search::{ElasticsearchClient, PaginationEngine, SearchClient, SearchRegistry},
    store::{ArticleStore, PostgresArticleStore},
};

pub static STATE: Lazy<State> = Lazy::new(|| State::new(&CONFIG).expect("Failed to create state"));

pub type AppState = State;

#[derive(Clone)]
pub struct State {
    pub search: Arc<dyn SearchClient>,
    pub registry: Arc<SearchRegistry>,
    pub articles: Arc<dyn ArticleStore>,
    pub paginator: PaginationEngine,
    pub redis_pool: Option<SingleRedisPool>,
    pub public_url: Option<Url>,
    /// Render server-side error details into response bodies.
    pub expose_errors: bool,
}

impl State {
    pub fn new(config: &Config) -> Result<Self> {
        let mut search = ElasticsearchClient::new(
            &config.elasticsearch.url,
            config.search_timeout(),
            config.elasticsearch.max_result_window,
        )?;
        if let Some(username) = &config.elasticsearch.username {
            search = search.with_basic_auth(username.clone(), config.elasticsearch.password.clone());
        }

        let postgres_pool = config
            .postgres_config()
            .create_pool(Some(Runtime::Tokio1), NoTls)?;

        let redis_pool = match &config.redis {
            Some(url) => {
                info!("Response cache enabled");
                Some(RedisPool::from(RedisClient::open(url.as_str())?))
            }
            None => None,
        };

        Ok(Self {
            search: Arc::new(search),
            registry: Arc::new(SearchRegistry::standard(
                &config.elasticsearch.user_index,
                &config.elasticsearch.category_index,
                &config.elasticsearch.article_index,
            )),
            articles: Arc::new(PostgresArticleStore::new(
                postgres_pool,
                config.fallback_case_insensitive,
            )),
            paginator: PaginationEngine::new(config.pagination_config()),
            redis_pool,
            public_url: config.public_url.as_deref().map(Url::parse).transpose()?,
            expose_errors: config.is_dev,
        })
    }
}
