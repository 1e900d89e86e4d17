//! Substring search against the relational store, for comparison with the engine-backed
//! routes. Responses have the same envelope and link rules.

use axum::{
    http::{HeaderMap, Uri},
    Json,
};
use url::Url;

use crate::{
    error::{AppError, SearchError},
    search::{links::request_url, query::normalize_term, ExecutedSlice},
    state::AppState,
    types::{Article, PageParams, PaginationEnvelope},
};

/// Entity-type segment routed to the relational store.
pub const ENTITY_TYPE: &str = "article-django";

pub async fn respond(
    state: &AppState,
    query: &str,
    params: &PageParams,
    headers: &HeaderMap,
    uri: &Uri,
) -> Result<Json<PaginationEnvelope<Article>>, AppError> {
    let url = request_url(state.public_url.as_ref(), headers, uri)
        .map_err(|err| AppError::search(err.into(), state.expose_errors))?;
    handle(state, query, params, &url)
        .await
        .map(Json)
        .map_err(|err| AppError::search(err, state.expose_errors))
}

pub async fn handle(
    state: &AppState,
    query: &str,
    params: &PageParams,
    request_url: &Url,
) -> Result<PaginationEnvelope<Article>, SearchError> {
    let request = state.paginator.page_request(params)?;
    // Validated like engine terms, but matched as given.
    let slice = match normalize_term(query)? {
        Some(_) => {
            state
                .articles
                .find_containing(query, request.bounds())
                .await?
        }
        None => ExecutedSlice::empty(),
    };
    state.paginator.envelope(request, slice, request_url)
}
