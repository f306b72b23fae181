//! Paginated search runner.
//!
//! Drives a vendor page stream until a row cap is reached or the vendor
//! stops returning next-page links. Rows keep vendor order; the last page
//! is truncated so the result never exceeds the cap. Any vendor error
//! aborts the whole run and no partial rows are returned.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::domain::errors::{AdapterError, AdapterResult};
use crate::domain::models::{SearchEndpoint, SearchRequest};
use crate::domain::ports::{ApiError, LaceworkApi, Page};

/// Remediation hint and documentation link attached to vendor errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorContext {
    pub hint: String,
    pub doc_url: String,
}

impl VendorContext {
    pub fn new(hint: impl Into<String>, doc_url: impl Into<String>) -> Self {
        Self {
            hint: hint.into(),
            doc_url: doc_url.into(),
        }
    }

    pub fn for_endpoint(endpoint: SearchEndpoint) -> Self {
        Self::new(endpoint.hint(), endpoint.doc_url())
    }

    /// Wrap a vendor error into the host-facing error.
    pub fn wrap(&self, err: ApiError) -> AdapterError {
        AdapterError::vendor(err.to_string(), self.hint.clone(), self.doc_url.clone())
    }
}

/// Rows accumulated by a search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOutcome {
    pub rows: Vec<Value>,
    pub total: usize,
    pub pages: usize,
}

/// Runs paginated searches against a [`LaceworkApi`].
#[derive(Clone)]
pub struct SearchRunner {
    api: Arc<dyn LaceworkApi>,
}

impl SearchRunner {
    pub fn new(api: Arc<dyn LaceworkApi>) -> Self {
        Self { api }
    }

    /// Run `request` against `endpoint`, keeping at most `limit` rows.
    pub async fn run(
        &self,
        endpoint: SearchEndpoint,
        request: &SearchRequest,
        limit: usize,
    ) -> AdapterResult<SearchOutcome> {
        if limit == 0 {
            return Ok(SearchOutcome::default());
        }

        let context = VendorContext::for_endpoint(endpoint);
        let first = self
            .api
            .search(endpoint, request)
            .await
            .map_err(|e| context.wrap(e))?;
        let outcome = self.drain(first, limit, &context).await?;

        info!(
            resource = endpoint.resource(),
            rows = outcome.total,
            pages = outcome.pages,
            limit,
            "search complete"
        );
        Ok(outcome)
    }

    /// Accumulate `first` and every following page, up to `limit` rows.
    pub async fn drain(
        &self,
        first: Page,
        limit: usize,
        context: &VendorContext,
    ) -> AdapterResult<SearchOutcome> {
        let mut rows: Vec<Value> = Vec::new();
        let mut pages = 0usize;
        let mut page = first;
        let mut previous_url: Option<String> = None;

        loop {
            pages += 1;
            let take = limit.saturating_sub(rows.len());
            rows.extend(page.data.into_iter().take(take));
            debug!(page = pages, accumulated = rows.len(), "appended page");

            if rows.len() >= limit {
                break;
            }

            let Some(next) = page.next_page else {
                break;
            };
            if previous_url.as_deref() == Some(next.as_str()) {
                debug!(url = %next, "vendor repeated a next-page link, stopping");
                break;
            }

            page = self.api.next_page(&next).await.map_err(|e| context.wrap(e))?;
            previous_url = Some(next);
        }

        Ok(SearchOutcome {
            total: rows.len(),
            rows,
            pages,
        })
    }
}
