use std::{fmt::Debug, str::FromStr, time::Duration};

use deadpool_postgres::{Config as PostgresConfig, ManagerConfig, RecyclingMethod};
use dotenvy::var;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use structstruck::strike;

use crate::search::PaginationConfig;

pub static CONFIG: Lazy<Config> = Lazy::new(Config::new);

strike! {
    #[strikethrough[derive(Debug, Clone, Serialize, Deserialize, Default)]]
    pub struct Config {
        pub elasticsearch:
            pub struct {
                pub url: String,
                pub username: Option<String>,
                pub password: Option<String>,
                pub timeout_ms: u64,
                pub max_result_window: u64,
                pub user_index: String,
                pub category_index: String,
                pub article_index: String,
            }
        ,
        pub postgres:
            pub struct {
                pub host: String,
                pub username: String,
                pub password: String,
                pub db: String,
            }
        ,
        pub pagination:
            pub struct {
                pub page_size: u64,
                pub max_page_size: Option<u64>,
                pub strict: bool,
            }
        ,
        pub fallback_case_insensitive: bool,
        pub redis: Option<String>,
        pub public_url: Option<String>,
        pub port: u16,
        pub is_dev: bool,
    }
}

impl Config {
    pub fn new() -> Self {
        Config {
            elasticsearch: Elasticsearch {
                url: var("ELASTICSEARCH_URL").unwrap_or("http://localhost:9200".to_string()),
                username: var("ELASTICSEARCH_USERNAME").ok(),
                password: var("ELASTICSEARCH_PASSWORD").ok(),
                timeout_ms: parse_or("ELASTICSEARCH_TIMEOUT_MS", 5000),
                // Pages past the window come back empty while `count` still reports every hit.
                max_result_window: parse_or("ELASTICSEARCH_MAX_RESULT_WINDOW", 10_000),
                user_index: var("USER_INDEX").unwrap_or("users".to_string()),
                category_index: var("CATEGORY_INDEX").unwrap_or("categories".to_string()),
                article_index: var("ARTICLE_INDEX").unwrap_or("articles".to_string()),
            },
            postgres: Postgres {
                host: var("POSTGRES_HOST").expect("POSTGRES_HOST must be set"),
                username: var("POSTGRES_USERNAME").expect("POSTGRES_USERNAME must be set"),
                password: var("POSTGRES_PASSWORD").expect("POSTGRES_PASSWORD must be set"),
                db: var("POSTGRES_DB").expect("POSTGRES_DB must be set"),
            },
            pagination: Pagination {
                page_size: parse_or("PAGE_SIZE", 10),
                // 0 disables the cap
                max_page_size: Some(parse_or("MAX_PAGE_SIZE", 100)).filter(|max| *max > 0),
                strict: flag("STRICT_PAGES"),
            },
            fallback_case_insensitive: flag("FALLBACK_CASE_INSENSITIVE"),
            redis: var("REDIS_URL").ok(),
            public_url: var("PUBLIC_URL").ok(),
            port: var("PORT")
                .unwrap_or("8080".to_string())
                .parse()
                .expect("PORT must be a number"),
            is_dev: var("MODE").map(|m| m == "dev").unwrap_or_default(),
        }
    }

    pub fn postgres_config(&self) -> PostgresConfig {
        self.into()
    }

    pub fn pagination_config(&self) -> PaginationConfig {
        PaginationConfig {
            default_page_size: self.pagination.page_size,
            max_page_size: self.pagination.max_page_size,
            strict: self.pagination.strict,
        }
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_millis(self.elasticsearch.timeout_ms)
    }
}

impl From<&Config> for PostgresConfig {
    fn from(val: &Config) -> Self {
        PostgresConfig {
            host: Some(val.postgres.host.to_string()),
            user: Some(val.postgres.username.to_string()),
            password: Some(val.postgres.password.to_string()),
            dbname: Some(val.postgres.db.to_string()),
            manager: Some(ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            }),
            ..Default::default()
        }
    }
}

fn parse_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Debug,
{
    match var(key) {
        Ok(value) => value
            .parse()
            .unwrap_or_else(|e| panic!("{} must be a number: {:?}", key, e)),
        Err(_) => default,
    }
}

fn flag(key: &str) -> bool {
    var(key)
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or_default()
}
