//! URL helpers for building absolute next/previous links.

use axum::http::{header::HOST, HeaderMap, Uri};
use log::debug;
use url::Url;

/// Rebuild the absolute URL of the current request.
///
/// `public_url` wins when configured, and its path is kept as a prefix of the request path.
/// Otherwise the scheme and host come from forwarding headers when present, so links stay
/// correct behind reverse proxies. Chained proxies append to those headers; the first entry
/// is the client-facing one.
pub fn request_url(
    public_url: Option<&Url>,
    headers: &HeaderMap,
    uri: &Uri,
) -> Result<Url, url::ParseError> {
    if let Some(base) = public_url {
        let mut url = base.clone();
        let prefix = base.path().trim_end_matches('/');
        url.set_path(&format!("{}{}", prefix, uri.path()));
        url.set_query(uri.query());
        url.set_fragment(None);
        return Ok(url);
    }

    let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    let scheme = first_forwarded(headers, "x-forwarded-proto")
        .or_else(|| first_forwarded(headers, "x-forwarded-scheme"))
        .filter(|s| s.eq_ignore_ascii_case("http") || s.eq_ignore_ascii_case("https"))
        .or_else(|| uri.scheme_str())
        .unwrap_or("http");

    if let Some(host) = first_forwarded(headers, "x-forwarded-host") {
        match absolute(scheme, host, path_and_query) {
            Ok(url) => return Ok(url),
            Err(e) => debug!("Ignoring X-Forwarded-Host {:?}: {}", host, e),
        }
    }

    let host = headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .or_else(|| uri.authority().map(|a| a.as_str()))
        .unwrap_or("localhost");
    absolute(scheme, host, path_and_query)
}

fn first_forwarded<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn absolute(scheme: &str, host: &str, path_and_query: &str) -> Result<Url, url::ParseError> {
    // Only an authority may sit between the scheme and the request path.
    if host.contains(['/', '?', '#', '@', '\\']) {
        return Err(url::ParseError::InvalidDomainCharacter);
    }
    Url::parse(&format!("{}://{}{}", scheme, host, path_and_query))
}

/// Set `key` to `value`, keeping every other parameter in place. The parameter is appended
/// when it was not present.
pub fn replace_query_param(url: &Url, key: &str, value: impl ToString) -> Url {
    rewrite_query(url, key, Some(value.to_string()))
}

/// Drop every occurrence of `key`. The `?` disappears with the last parameter.
pub fn remove_query_param(url: &Url, key: &str) -> Url {
    rewrite_query(url, key, None)
}

fn rewrite_query(url: &Url, key: &str, value: Option<String>) -> Url {
    let mut pairs: Vec<(String, String)> = Vec::new();
    let mut pending = value;
    for (k, v) in url.query_pairs() {
        if k == key {
            if let Some(value) = pending.take() {
                pairs.push((k.into_owned(), value));
            }
            continue;
        }
        pairs.push((k.into_owned(), v.into_owned()));
    }
    if let Some(value) = pending {
        pairs.push((key.to_string(), value));
    }

    let mut url = url.clone();
    if pairs.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(&pairs);
    }
    url
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn replace_existing_param_in_place() {
        let out = replace_query_param(
            &url("http://api.example.org/search/article/rust/?page=2&page_size=5&sort=x"),
            "page",
            3,
        );
        assert_eq!(
            out.as_str(),
            "http://api.example.org/search/article/rust/?page=3&page_size=5&sort=x"
        );
    }

    #[test]
    fn replace_appends_missing_param() {
        let out = replace_query_param(
            &url("http://api.example.org/search/article/rust/?page_size=5"),
            "page",
            2,
        );
        assert_eq!(
            out.as_str(),
            "http://api.example.org/search/article/rust/?page_size=5&page=2"
        );

        let out = replace_query_param(&url("http://api.example.org/search/user/a/"), "page", 2);
        assert_eq!(out.as_str(), "http://api.example.org/search/user/a/?page=2");
    }

    #[test]
    fn replace_collapses_duplicates() {
        let out = replace_query_param(&url("http://h/p/?page=1&x=1&page=9"), "page", 4);
        assert_eq!(out.as_str(), "http://h/p/?page=4&x=1");
    }

    #[test]
    fn remove_param_keeps_others() {
        let out = remove_query_param(&url("http://h/p/?page=2&page_size=5"), "page");
        assert_eq!(out.as_str(), "http://h/p/?page_size=5");
    }

    #[test]
    fn remove_last_param_drops_query() {
        let out = remove_query_param(&url("http://h/search/article/rust/?page=2"), "page");
        assert_eq!(out.as_str(), "http://h/search/article/rust/");
    }

    #[test]
    fn request_url_from_host_header() {
        let mut headers = HeaderMap::new();
        headers.insert("host", HeaderValue::from_static("api.example.org"));
        let uri: Uri = "/search/article/rust%20lang/?page=2".parse().unwrap();
        let out = request_url(None, &headers, &uri).unwrap();
        assert_eq!(
            out.as_str(),
            "http://api.example.org/search/article/rust%20lang/?page=2"
        );
    }

    #[test]
    fn request_url_prefers_forwarding_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("host", HeaderValue::from_static("10.0.0.4:8080"));
        headers.insert("x-forwarded-proto", HeaderValue::from_static("https"));
        headers.insert("x-forwarded-host", HeaderValue::from_static("search.example.org"));
        let uri: Uri = "/search/user/ferris/".parse().unwrap();
        let out = request_url(None, &headers, &uri).unwrap();
        assert_eq!(out.as_str(), "https://search.example.org/search/user/ferris/");
    }

    #[test]
    fn request_url_prefers_public_url() {
        let mut headers = HeaderMap::new();
        headers.insert("host", HeaderValue::from_static("internal:8080"));
        let public = url("https://public.example.org");
        let uri: Uri = "/search/category/db/?page=3".parse().unwrap();
        let out = request_url(Some(&public), &headers, &uri).unwrap();
        assert_eq!(
            out.as_str(),
            "https://public.example.org/search/category/db/?page=3"
        );
    }

    #[test]
    fn request_url_takes_first_entry_of_chained_forwarding_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("host", HeaderValue::from_static("10.0.0.4:8080"));
        headers.insert("x-forwarded-proto", HeaderValue::from_static("https, http"));
        headers.insert(
            "x-forwarded-host",
            HeaderValue::from_static(" search.example.org , lb.internal"),
        );
        let uri: Uri = "/search/article/rust/?page=2".parse().unwrap();
        let out = request_url(None, &headers, &uri).unwrap();
        assert_eq!(out.as_str(), "https://search.example.org/search/article/rust/?page=2");
    }

    #[test]
    fn request_url_falls_back_to_host_on_unusable_forwarding_headers() {
        let uri: Uri = "/search/user/ferris/".parse().unwrap();

        let mut headers = HeaderMap::new();
        headers.insert("host", HeaderValue::from_static("api.example.org"));
        headers.insert("x-forwarded-proto", HeaderValue::from_static(" , https"));
        headers.insert("x-forwarded-host", HeaderValue::from_static(", lb.internal"));
        let out = request_url(None, &headers, &uri).unwrap();
        assert_eq!(out.as_str(), "http://api.example.org/search/user/ferris/");

        headers.insert("x-forwarded-proto", HeaderValue::from_static("gopher"));
        headers.insert("x-forwarded-host", HeaderValue::from_static("evil.org/path"));
        let out = request_url(None, &headers, &uri).unwrap();
        assert_eq!(out.as_str(), "http://api.example.org/search/user/ferris/");

        headers.insert("x-forwarded-host", HeaderValue::from_static("bad host"));
        let out = request_url(None, &headers, &uri).unwrap();
        assert_eq!(out.as_str(), "http://api.example.org/search/user/ferris/");
    }

    #[test]
    fn request_url_keeps_public_url_path_prefix() {
        let uri: Uri = "/search/category/db/?page=3".parse().unwrap();
        for public in ["https://x.org/api", "https://x.org/api/"] {
            let out = request_url(Some(&url(public)), &HeaderMap::new(), &uri).unwrap();
            assert_eq!(out.as_str(), "https://x.org/api/search/category/db/?page=3");
        }
    }
}
