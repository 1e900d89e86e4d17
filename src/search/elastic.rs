//! Elasticsearch-compatible search client.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde_json::{json, Value};
use url::Url;

use super::{
    query::QueryExpression,
    result_set::{SearchClient, SearchHits, TotalHits},
};
use crate::error::EngineError;

#[derive(Debug, Clone)]
pub struct ElasticsearchClient {
    http: Client,
    base_url: Url,
    credentials: Option<(String, Option<String>)>,
    max_result_window: u64,
}

impl ElasticsearchClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        max_result_window: u64,
    ) -> Result<Self, anyhow::Error> {
        let mut base_url = Url::parse(base_url)?;
        // `Url::join` replaces the last segment unless the path ends with a slash.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            http: Client::builder().timeout(timeout).build()?,
            base_url,
            credentials: None,
            max_result_window,
        })
    }

    pub fn with_basic_auth(mut self, username: String, password: Option<String>) -> Self {
        self.credentials = Some((username, password));
        self
    }
}

#[async_trait]
impl SearchClient for ElasticsearchClient {
    async fn search(
        &self,
        index: &str,
        query: &QueryExpression,
        from: u64,
        size: u64,
    ) -> Result<SearchHits, EngineError> {
        let url = self
            .base_url
            .join(&format!("{}/_search", index))
            .map_err(|e| EngineError::MalformedResponse(format!("invalid index URL: {}", e)))?;
        let body = search_body(query, from, size, self.max_result_window);
        debug!("POST {} {}", url, body);

        let mut request = self.http.post(url).json(&body);
        if let Some((username, password)) = &self.credentials {
            request = request.basic_auth(username, password.as_ref());
        }
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let reason = response.text().await.unwrap_or_default();
            return Err(EngineError::Rejected {
                status: status.as_u16(),
                reason,
            });
        }
        parse_response(response.json::<Value>().await?)
    }
}

/// Builds the `_search` request body. `track_total_hits` makes the engine return the exact
/// total with the slice. Windows reaching past `max_result_window` are clamped, and a window
/// starting past it is sent as `size: 0`, which still returns the total. Items beyond the
/// window are unreachable through paging, so the clamp is logged.
pub fn search_body(query: &QueryExpression, from: u64, size: u64, max_result_window: u64) -> Value {
    let (from, size) = if from >= max_result_window {
        warn!(
            "Slice at offset {} is past the result window of {}, returning no items",
            from, max_result_window
        );
        (0, 0)
    } else if size > max_result_window - from {
        warn!(
            "Slice of {} at offset {} truncated to the result window of {}",
            size, from, max_result_window
        );
        (from, max_result_window - from)
    } else {
        (from, size)
    };
    json!({
        "query": query,
        "from": from,
        "size": size,
        "track_total_hits": true,
    })
}

pub fn parse_response(body: Value) -> Result<SearchHits, EngineError> {
    let hits = body
        .get("hits")
        .ok_or_else(|| EngineError::MalformedResponse("missing `hits`".into()))?;

    let total = match hits.get("total") {
        // Pre-7.0 engines report a bare number.
        Some(Value::Number(n)) => n.as_u64().map(TotalHits::exact),
        Some(Value::Object(total)) => total.get("value").and_then(Value::as_u64).map(|value| {
            match total.get("relation").and_then(Value::as_str) {
                Some("gte") => TotalHits::lower_bound(value),
                _ => TotalHits::exact(value),
            }
        }),
        _ => None,
    }
    .ok_or_else(|| EngineError::MalformedResponse("missing `hits.total`".into()))?;

    let documents = hits
        .get("hits")
        .and_then(Value::as_array)
        .ok_or_else(|| EngineError::MalformedResponse("missing `hits.hits`".into()))?
        .iter()
        .map(hit_document)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SearchHits { documents, total })
}

/// `_source` of a hit, with `id` filled in from `_id` when the source does not carry one.
fn hit_document(hit: &Value) -> Result<Value, EngineError> {
    let mut source = hit
        .get("_source")
        .cloned()
        .ok_or_else(|| EngineError::MalformedResponse("hit without `_source`".into()))?;
    if let (Some(document), Some(id)) = (source.as_object_mut(), hit.get("_id")) {
        if !document.contains_key("id") {
            let id = match id.as_str().map(str::parse::<i64>) {
                Some(Ok(numeric)) => json!(numeric),
                _ => id.clone(),
            };
            document.insert("id".into(), id);
        }
    }
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_requests_exact_total_with_slice() {
        let body = search_body(&QueryExpression::MatchNone, 20, 10, 10_000);
        assert_eq!(
            body,
            json!({
                "query": { "match_none": {} },
                "from": 20,
                "size": 10,
                "track_total_hits": true,
            })
        );
    }

    #[test]
    fn body_is_clamped_to_result_window() {
        let body = search_body(&QueryExpression::MatchNone, 9_995, 10, 10_000);
        assert_eq!(body["from"], json!(9_995));
        assert_eq!(body["size"], json!(5));

        let body = search_body(&QueryExpression::MatchNone, 10_000, 10, 10_000);
        assert_eq!(body["from"], json!(0));
        assert_eq!(body["size"], json!(0));
    }

    #[test]
    fn window_edges() {
        let body = search_body(&QueryExpression::MatchNone, 9_990, 10, 10_000);
        assert_eq!((body["from"].clone(), body["size"].clone()), (json!(9_990), json!(10)));

        let body = search_body(&QueryExpression::MatchNone, 9_999, 10, 10_000);
        assert_eq!((body["from"].clone(), body["size"].clone()), (json!(9_999), json!(1)));

        let body = search_body(&QueryExpression::MatchNone, 25_000, 10, 10_000);
        assert_eq!((body["from"].clone(), body["size"].clone()), (json!(0), json!(0)));
    }

    #[test]
    fn parses_hits_and_exact_total() {
        let hits = parse_response(json!({
            "took": 3,
            "hits": {
                "total": { "value": 25, "relation": "eq" },
                "hits": [
                    { "_id": "4", "_score": 2.0, "_source": { "title": "a" } },
                    { "_id": "9", "_score": 1.0, "_source": { "id": 9, "title": "b" } },
                ]
            }
        }))
        .unwrap();
        assert_eq!(hits.total, TotalHits::exact(25));
        assert_eq!(
            hits.documents,
            vec![
                json!({ "id": 4, "title": "a" }),
                json!({ "id": 9, "title": "b" })
            ]
        );
    }

    #[test]
    fn lower_bound_total() {
        let hits = parse_response(json!({
            "hits": { "total": { "value": 10000, "relation": "gte" }, "hits": [] }
        }))
        .unwrap();
        assert_eq!(hits.total, TotalHits::lower_bound(10_000));
    }

    #[test]
    fn legacy_numeric_total() {
        let hits = parse_response(json!({ "hits": { "total": 3, "hits": [] } })).unwrap();
        assert_eq!(hits.total, TotalHits::exact(3));
    }

    #[test]
    fn non_numeric_id_is_kept_as_string() {
        let hits = parse_response(json!({
            "hits": { "total": 1, "hits": [{ "_id": "abc", "_source": {} }] }
        }))
        .unwrap();
        assert_eq!(hits.documents[0], json!({ "id": "abc" }));
    }

    #[test]
    fn malformed_responses_are_errors() {
        for body in [
            json!({}),
            json!({ "hits": { "hits": [] } }),
            json!({ "hits": { "total": 1 } }),
            json!({ "hits": { "total": 1, "hits": [{ "_id": "1" }] } }),
        ] {
            assert!(matches!(
                parse_response(body),
                Err(EngineError::MalformedResponse(_))
            ));
        }
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        let client =
            ElasticsearchClient::new("http://es:9200/prefix", Duration::from_secs(1), 10_000)
                .unwrap();
        assert_eq!(
            client.base_url.join("articles/_search").unwrap().as_str(),
            "http://es:9200/prefix/articles/_search"
        );
    }
}
