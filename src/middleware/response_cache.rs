use axum::{
    body::Body,
    extract::{OriginalUri, Request, State},
    http::Method,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use http_body_util::BodyExt;
use log::{debug, warn};
use redis::AsyncCommands;
use serde_json::{from_str, Value};
use url::Url;

use crate::{error::AppError, search::links::request_url, state::AppState};

/// To be used with search endpoints
pub type SearchResponseCache = ResponseCache<10>;

/// Caches successful JSON responses in Redis for `CACHE_TTL` seconds, keyed by the absolute
/// request URL the links are built from, and the method.
/// Passes through when no Redis pool is configured or Redis is unavailable.
#[derive(Copy, Clone)]
pub struct ResponseCache<const CACHE_TTL: u32>;

impl<const CACHE_TTL: u32> ResponseCache<CACHE_TTL> {
    pub async fn handler(
        State(state): State<AppState>,
        OriginalUri(uri): OriginalUri,
        request: Request,
        next: Next,
    ) -> Result<Response, AppError> {
        let Some(pool) = state.redis_pool.as_ref() else {
            return Ok(next.run(request).await);
        };
        let mut redis = match pool.aquire().await {
            Ok(redis) => redis,
            Err(e) => {
                warn!("Response cache unavailable: {}", e);
                return Ok(next.run(request).await);
            }
        };

        let key = match request_url(state.public_url.as_ref(), request.headers(), &uri) {
            Ok(url) => cache_key(&url, request.method()),
            // The handler rejects the request itself.
            Err(_) => return Ok(next.run(request).await),
        };

        match redis.get::<&str, Option<String>>(&key).await {
            Ok(Some(cached_response)) => {
                debug!("Response cache hit for {}", key);
                return Ok(Json(from_str::<Value>(&cached_response)?).into_response());
            }
            Ok(None) => {}
            Err(e) => warn!("Response cache read failed for {}: {}", key, e),
        }

        let response = next.run(request).await;
        let (parts, body) = response.into_parts();

        // check if error, if so, return response as is
        if parts.status.is_client_error() || parts.status.is_server_error() {
            return Ok(Response::from_parts(parts, body));
        }

        let bytes = body.collect().await?.to_bytes();
        let Json(body) = Json::<Value>::from_bytes(&bytes)?;
        redis
            .set_ex::<&str, String, ()>(&key, serde_json::to_string(&body)?, CACHE_TTL as u64)
            .await
            .ok();
        Ok(Response::from_parts(parts, Body::from(bytes)))
    }
}

pub fn cache_key(url: &Url, method: &Method) -> String {
    format!("search:{}:{}", url, method)
}
