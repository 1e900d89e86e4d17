//! Page-number pagination over lazily counted search results.

use log::debug;
use serde_json::Value;
use url::Url;

use super::{
    cursor::{PageRequest, PaginationConfig, PAGE_QUERY_PARAM},
    links::{remove_query_param, replace_query_param},
    result_set::{ExecutedSlice, SearchResultSet},
};
use crate::{
    error::SearchError,
    types::{PageParams, PaginationEnvelope},
};

/// Stateless between calls; one instance is shared by every request.
#[derive(Debug, Clone, Default)]
pub struct PaginationEngine {
    config: PaginationConfig,
}

impl PaginationEngine {
    pub fn new(config: PaginationConfig) -> Self {
        Self { config }
    }

    pub fn page_request(&self, params: &PageParams) -> Result<PageRequest, SearchError> {
        PageRequest::from_params(params, &self.config)
    }

    /// Runs `result_set` for the requested page and shapes the envelope.
    ///
    /// Exactly one slice is executed; `count` is taken from that execution.
    pub async fn paginate(
        &self,
        result_set: SearchResultSet<'_>,
        request: PageRequest,
        request_url: &Url,
    ) -> Result<PaginationEnvelope<Value>, SearchError> {
        let bounds = request.bounds();
        debug!(
            "Executing page {} (size {}) as [{}, {})",
            request.page_number, request.page_size, bounds.start_index, bounds.end_index
        );
        let slice = result_set.slice(bounds).execute().await?;
        self.envelope(request, slice, request_url)
    }

    /// Shapes an already executed slice into an envelope with navigation links.
    pub fn envelope<T>(
        &self,
        request: PageRequest,
        slice: ExecutedSlice<T>,
        request_url: &Url,
    ) -> Result<PaginationEnvelope<T>, SearchError> {
        let bounds = request.bounds();
        let total = slice.total_hits();
        let count = total.value;
        if !total.exact {
            debug!("Total hit count {} is a lower bound", count);
        }

        // Page 1 always exists, even for an empty result.
        if self.config.strict && request.page_number > 1 && bounds.start_index >= count {
            return Err(SearchError::PageNotFound {
                page_number: request.page_number,
            });
        }

        let next = (bounds.end_index < count).then(|| {
            replace_query_param(request_url, PAGE_QUERY_PARAM, request.page_number + 1)
                .to_string()
        });

        let previous = (!request.is_first()).then(|| {
            let page_number = request.page_number - 1;
            if page_number == 1 {
                remove_query_param(request_url, PAGE_QUERY_PARAM).to_string()
            } else {
                replace_query_param(request_url, PAGE_QUERY_PARAM, page_number).to_string()
            }
        });

        let mut results = slice.into_items();
        results.truncate(request.page_size as usize);

        Ok(PaginationEnvelope {
            count,
            next,
            previous,
            results,
        })
    }
}
