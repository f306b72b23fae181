use async_trait::async_trait;
use serde_json::Value;

use crate::domain::models::{ReportQuery, SearchEndpoint, SearchRequest, TimeFilter};
use crate::domain::ports::errors::ApiResult;

/// One page of a paginated vendor response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub data: Vec<Value>,
    /// Absolute URL of the next page, if the vendor reported one.
    pub next_page: Option<String>,
}

impl Page {
    pub fn last(data: Vec<Value>) -> Self {
        Self {
            data,
            next_page: None,
        }
    }
}

/// Port for the Lacework REST API.
///
/// Every handler receives an implementation of this trait instead of
/// reaching for a process-wide client. Paginated endpoints return the
/// first [`Page`]; callers walk the rest with [`next_page`](Self::next_page).
#[async_trait]
pub trait LaceworkApi: Send + Sync {
    /// `GET /api/v2/UserProfile`.
    async fn user_profile(&self) -> ApiResult<Value>;

    /// First page of `GET /api/v2/Alerts` for a time window.
    async fn alerts(&self, window: &TimeFilter) -> ApiResult<Page>;

    /// `GET /api/v2/Alerts/{id}?scope=...`, returning the `data` payload.
    async fn alert_details(&self, alert_id: &str, scope: &str) -> ApiResult<Value>;

    /// `GET /api/v2/Reports`, returning the whole response body.
    async fn report(&self, query: &ReportQuery) -> ApiResult<Value>;

    /// `GET /api/v2/Configs/GcpProjects`, returning the `data` payload.
    async fn gcp_projects(&self, org_id: &str) -> ApiResult<Value>;

    /// First page of a `POST /api/v2/<resource>/search`.
    async fn search(&self, endpoint: SearchEndpoint, request: &SearchRequest) -> ApiResult<Page>;

    /// Follow a next-page link returned by a previous page.
    async fn next_page(&self, url: &str) -> ApiResult<Page>;

    /// `POST /api/v2/Queries/validate`, returning the `data` payload.
    async fn validate_query(&self, query_text: &str) -> ApiResult<Value>;

    /// `POST /api/v2/Queries/execute`, returning the result rows.
    async fn execute_query(&self, query_text: &str, window: &TimeFilter) -> ApiResult<Vec<Value>>;
}
