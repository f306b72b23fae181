//! Lacework API v2 request and response payloads.
//!
//! These structs map to the wire JSON and are internal to the HTTP
//! client; services only see [`Page`](crate::domain::ports::Page) and
//! plain `serde_json::Value` records.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /api/v2/access/tokens`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenRequest {
    pub key_id: String,
    pub expiry_time: u64,
}

/// Response of `POST /api/v2/access/tokens`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    pub token: String,
    #[serde(default)]
    pub expires_at: Option<String>,
}

/// Generic `{data, paging}` envelope returned by list and search endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PagedResponse {
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub paging: Option<Paging>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paging {
    #[serde(default)]
    pub rows: Option<u64>,
    #[serde(default)]
    pub total_rows: Option<u64>,
    #[serde(default)]
    pub urls: Option<PagingUrls>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagingUrls {
    #[serde(default)]
    pub next_page: Option<String>,
}

impl PagedResponse {
    /// Link to the following page, ignoring empty strings.
    pub fn next_page(&self) -> Option<String> {
        self.paging
            .as_ref()
            .and_then(|p| p.urls.as_ref())
            .and_then(|u| u.next_page.clone())
            .filter(|url| !url.is_empty())
    }
}

/// Body of `POST /api/v2/Queries/validate`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateQueryRequest<'a> {
    pub query_text: &'a str,
}

/// Body of `POST /api/v2/Queries/execute`.
#[derive(Debug, Clone, Serialize)]
pub struct ExecuteQueryRequest<'a> {
    pub query: QueryText<'a>,
    pub arguments: Vec<QueryArgument<'a>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryText<'a> {
    pub query_text: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryArgument<'a> {
    pub name: &'static str,
    pub value: &'a str,
}
