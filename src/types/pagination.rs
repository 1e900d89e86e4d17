use serde::{Deserialize, Serialize};

/// Raw `page` / `page_size` query parameters. Kept as strings so that a present but
/// malformed value can be told apart from an absent one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
    pub page_size: Option<String>,
}

/// Response envelope shared by every search route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginationEnvelope<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> PaginationEnvelope<T> {
    pub fn try_map<U, E>(
        self,
        f: impl FnMut(T) -> Result<U, E>,
    ) -> Result<PaginationEnvelope<U>, E> {
        Ok(PaginationEnvelope {
            count: self.count,
            next: self.next,
            previous: self.previous,
            results: self.results.into_iter().map(f).collect::<Result<_, _>>()?,
        })
    }
}
