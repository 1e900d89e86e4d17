use axum::{
    extract::{OriginalUri, Path, Query, State},
    http::{HeaderMap, Uri},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use log::debug;
use serde_json::Value;
use url::Url;

use super::fallback;
use crate::{
    error::{AppError, SearchError},
    middleware::SearchResponseCache,
    search::{links::request_url, SearchResultSet, SearchTarget},
    state::AppState,
    types::{PageParams, PaginationEnvelope},
};

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/:entity_type/", get(search_empty))
        .route("/:entity_type/:query/", get(search))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            SearchResponseCache::handler,
        ))
}

pub async fn search(
    Path((entity_type, query)): Path<(String, String)>,
    Query(params): Query<PageParams>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    dispatch(&state, &entity_type, &query, &params, &headers, &uri).await
}

/// `/search/{entity_type}/` searches for the empty string.
pub async fn search_empty(
    Path(entity_type): Path<String>,
    Query(params): Query<PageParams>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    dispatch(&state, &entity_type, "", &params, &headers, &uri).await
}

async fn dispatch(
    state: &AppState,
    entity_type: &str,
    query: &str,
    params: &PageParams,
    headers: &HeaderMap,
    uri: &Uri,
) -> Result<Response, AppError> {
    if entity_type == fallback::ENTITY_TYPE {
        return fallback::respond(state, query, params, headers, uri)
            .await
            .map(IntoResponse::into_response);
    }
    search_entity(state, entity_type, query, params, headers, uri)
        .await
        .map(IntoResponse::into_response)
}

async fn search_entity(
    state: &AppState,
    entity_type: &str,
    query: &str,
    params: &PageParams,
    headers: &HeaderMap,
    uri: &Uri,
) -> Result<Json<PaginationEnvelope<Value>>, AppError> {
    let target = state
        .registry
        .get(entity_type)
        .ok_or_else(AppError::not_found)?;
    debug!("Searching {} for {:?}", entity_type, query);

    let url = request_url(state.public_url.as_ref(), headers, uri)
        .map_err(|err| AppError::search(err.into(), state.expose_errors))?;
    handle(state, target, query, params, &url)
        .await
        .map(Json)
        .map_err(|err| AppError::search(err, state.expose_errors))
}

/// Parse the page, build the entity's expression, run one slice and serialize it.
pub async fn handle(
    state: &AppState,
    target: &SearchTarget,
    query: &str,
    params: &PageParams,
    request_url: &Url,
) -> Result<PaginationEnvelope<Value>, SearchError> {
    let request = state.paginator.page_request(params)?;
    let expression = target.builder.build(query)?;
    let result_set = SearchResultSet::new(state.search.as_ref(), &target.index, expression);
    let page = state
        .paginator
        .paginate(result_set, request, request_url)
        .await?;
    page.try_map(target.serializer)
        .map_err(SearchError::Serialize)
}
