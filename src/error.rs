use anyhow::{anyhow, Error};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use log::error;
use thiserror::Error as ThisError;

use crate::search::QueryBuildError;

#[derive(Debug)]
pub struct AppError {
    status: Option<StatusCode>,
    error: Error,
    expose: bool,
}

impl AppError {
    pub fn new(err: Error) -> Self {
        Self {
            status: None,
            error: err,
            expose: false,
        }
    }

    pub fn status<E: Into<anyhow::Error>>(status: StatusCode, err: E) -> Self {
        Self {
            status: Some(status),
            error: err.into(),
            expose: false,
        }
    }

    pub fn not_found() -> Self {
        Self::status(StatusCode::NOT_FOUND, anyhow!("Not Found"))
    }

    /// Maps a search failure onto its response status. Server-side details are only
    /// rendered into the body when `expose` is set; they are always logged.
    pub fn search(err: SearchError, expose: bool) -> Self {
        Self {
            status: Some(err.status()),
            error: err.into(),
            expose,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("{} {:?}", status, self.error);
            if !self.expose {
                return (status, "Internal Server Error").into_response();
            }
        }
        (status, format!("{}", self.error)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::new(err.into())
    }
}

#[derive(ThisError, Debug)]
pub enum SearchError {
    #[error("Invalid page: {0}")]
    InvalidPage(String),

    #[error("Invalid page size: {0}")]
    InvalidPageSize(String),

    #[error("Invalid page.")]
    PageNotFound { page_number: u64 },

    #[error("Failed to build query: {0}")]
    QueryBuild(#[from] QueryBuildError),

    #[error("Search backend failure: {0}")]
    Engine(#[from] EngineError),

    #[error("Failed to serialize result: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Invalid request URL: {0}")]
    RequestUrl(#[from] url::ParseError),
}

impl SearchError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidPage(_) | Self::InvalidPageSize(_) | Self::RequestUrl(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::PageNotFound { .. } => StatusCode::NOT_FOUND,
            // Query construction failures are reported like backend failures.
            Self::QueryBuild(_) | Self::Engine(_) | Self::Serialize(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Failure of the single round trip to a search backend (engine or relational store).
#[derive(ThisError, Debug)]
pub enum EngineError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("search engine rejected request with status {status}: {reason}")]
    Rejected { status: u16, reason: String },

    #[error("malformed search engine response: {0}")]
    MalformedResponse(String),

    #[error("database error: {0}")]
    Store(#[from] tokio_postgres::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),
}
