//! Lacework HTTP client.
//!
//! Wraps the Lacework REST API v2. Authentication exchanges the API key
//! and secret for a short-lived bearer token, which is refreshed shortly
//! before it expires. A configured sub-account is sent as the
//! `Account-Name` header on every call.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::domain::errors::{AdapterError, AdapterResult};
use crate::domain::models::{ApiConfig, ReportQuery, SearchEndpoint, SearchRequest, TimeFilter};
use crate::domain::ports::{ApiError, ApiResult, LaceworkApi, Page};
use crate::infrastructure::logging::scrub_secrets;

use super::models::{
    AccessTokenRequest, AccessTokenResponse, ExecuteQueryRequest, PagedResponse, QueryArgument,
    QueryText, ValidateQueryRequest,
};

/// Lifetime requested for access tokens, in seconds.
const TOKEN_EXPIRY_SECS: u64 = 3_600;

/// Tokens this close to expiry are refreshed before use.
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

/// Connection settings for [`LaceworkClient`].
#[derive(Clone)]
pub struct LaceworkClientConfig {
    /// Account name (`acme`) or full host (`acme.lacework.net`).
    pub account: String,
    /// Optional sub-account sent as `Account-Name`.
    pub subaccount: Option<String>,
    pub api_key: String,
    pub api_secret: String,
    /// Overrides the URL derived from `account`; used for tests and proxies.
    pub base_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for LaceworkClientConfig {
    fn default() -> Self {
        Self {
            account: String::new(),
            subaccount: None,
            api_key: String::new(),
            api_secret: String::new(),
            base_url: None,
            timeout_secs: 60,
        }
    }
}

impl From<&ApiConfig> for LaceworkClientConfig {
    fn from(config: &ApiConfig) -> Self {
        Self {
            account: config.account.clone(),
            subaccount: config.subaccount.clone().filter(|s| !s.is_empty()),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            base_url: config.base_url.clone(),
            timeout_secs: config.timeout_secs,
        }
    }
}

impl std::fmt::Debug for LaceworkClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LaceworkClientConfig")
            .field("account", &self.account)
            .field("subaccount", &self.subaccount)
            .field("api_key", &"[REDACTED]")
            .field("api_secret", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl LaceworkClientConfig {
    /// Base URL for API calls, without a trailing slash.
    pub fn resolved_base_url(&self) -> String {
        if let Some(url) = self.base_url.as_deref().filter(|u| !u.is_empty()) {
            return url.trim_end_matches('/').to_string();
        }

        let account = self
            .account
            .trim()
            .trim_start_matches("https://")
            .trim_end_matches('/');
        if account.contains('.') {
            format!("https://{account}")
        } else {
            format!("https://{account}.lacework.net")
        }
    }
}

#[derive(Debug, Clone)]
struct AccessToken {
    token: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - chrono::Duration::seconds(TOKEN_REFRESH_MARGIN_SECS) > now
    }
}

/// HTTP client for the Lacework REST API v2.
pub struct LaceworkClient {
    http: Client,
    base_url: String,
    subaccount: Option<String>,
    api_key: String,
    api_secret: String,
    token: Mutex<Option<AccessToken>>,
}

impl std::fmt::Debug for LaceworkClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LaceworkClient")
            .field("base_url", &self.base_url)
            .field("subaccount", &self.subaccount)
            .finish_non_exhaustive()
    }
}

impl LaceworkClient {
    /// Build a client without contacting the API.
    pub fn new(config: LaceworkClientConfig) -> AdapterResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(4)
            .build()
            .map_err(|e| AdapterError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: config.resolved_base_url(),
            http,
            subaccount: config.subaccount.filter(|s| !s.is_empty()),
            api_key: config.api_key,
            api_secret: config.api_secret,
            token: Mutex::new(None),
        })
    }

    /// Build a client and obtain the first access token.
    ///
    /// Any failure here is reported as [`AdapterError::AuthenticationFailure`].
    pub async fn connect(config: LaceworkClientConfig) -> AdapterResult<Self> {
        let client = Self::new(config)?;
        client
            .bearer_token()
            .await
            .map_err(|e| AdapterError::AuthenticationFailure(e.to_string()))?;
        info!(base_url = %client.base_url, "authenticated against Lacework API");
        Ok(client)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch_token(&self) -> ApiResult<AccessToken> {
        let url = format!("{}/api/v2/access/tokens", self.base_url);
        let body = AccessTokenRequest {
            key_id: self.api_key.clone(),
            expiry_time: TOKEN_EXPIRY_SECS,
        };

        let resp = self
            .http
            .post(&url)
            .header("X-LW-UAKS", &self.api_secret)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::Network(scrub_secrets(&e.to_string())))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status.as_u16(), scrub_secrets(&text)));
        }

        let token: AccessTokenResponse = resp
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("access token: {e}")))?;

        let expires_at = token
            .expires_at
            .as_deref()
            .and_then(|s| s.parse::<DateTime<Utc>>().ok())
            .unwrap_or_else(|| {
                Utc::now() + chrono::Duration::seconds(TOKEN_EXPIRY_SECS as i64)
            });

        debug!(%expires_at, "obtained Lacework access token");
        Ok(AccessToken {
            token: token.token,
            expires_at,
        })
    }

    async fn bearer_token(&self) -> ApiResult<String> {
        let mut guard = self.token.lock().await;
        if let Some(token) = guard.as_ref().filter(|t| t.is_fresh(Utc::now())) {
            return Ok(token.token.clone());
        }

        let token = self.fetch_token().await?;
        let value = token.token.clone();
        *guard = Some(token);
        Ok(value)
    }

    async fn authorized(&self, method: Method, url: &str) -> ApiResult<RequestBuilder> {
        let token = self.bearer_token().await?;
        let mut req = self
            .http
            .request(method, url)
            .header("Authorization", format!("Bearer {token}"))
            .header("Content-Type", "application/json");
        if let Some(sub) = &self.subaccount {
            req = req.header("Account-Name", sub);
        }
        Ok(req)
    }

    async fn send(&self, req: RequestBuilder) -> ApiResult<Value> {
        let resp = req
            .send()
            .await
            .map_err(|e| ApiError::Network(scrub_secrets(&e.to_string())))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let err = ApiError::from_status(status.as_u16(), scrub_secrets(&body));
            warn!(status = status.as_u16(), error = %err, "Lacework API call failed");
            return Err(err);
        }

        resp.json::<Value>()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> ApiResult<Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "GET");
        let req = self.authorized(Method::GET, &url).await?.query(query);
        self.send(req).await
    }

    async fn post<B: Serialize + Sync>(&self, path: &str, body: &B) -> ApiResult<Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "POST");
        let req = self.authorized(Method::POST, &url).await?.json(body);
        self.send(req).await
    }

    fn into_page(body: Value) -> ApiResult<Page> {
        let resp: PagedResponse = serde_json::from_value(body)
            .map_err(|e| ApiError::InvalidResponse(format!("paged response: {e}")))?;
        let next_page = resp.next_page();

        if let Some(paging) = &resp.paging {
            debug!(rows = ?paging.rows, total_rows = ?paging.total_rows, "received page");
        }

        let data = match resp.data {
            Value::Array(rows) => rows,
            Value::Null => Vec::new(),
            other => vec![other],
        };
        Ok(Page { data, next_page })
    }

    fn data_of(mut body: Value) -> Value {
        body.get_mut("data").map(Value::take).unwrap_or(Value::Null)
    }
}

#[async_trait]
impl LaceworkApi for LaceworkClient {
    #[instrument(skip(self))]
    async fn user_profile(&self) -> ApiResult<Value> {
        self.get("/api/v2/UserProfile", &[]).await
    }

    #[instrument(skip(self))]
    async fn alerts(&self, window: &TimeFilter) -> ApiResult<Page> {
        let query = [
            ("startTime", window.start_time.clone()),
            ("endTime", window.end_time.clone()),
        ];
        let body = self.get("/api/v2/Alerts", &query).await?;
        Self::into_page(body)
    }

    #[instrument(skip(self))]
    async fn alert_details(&self, alert_id: &str, scope: &str) -> ApiResult<Value> {
        let path = format!("/api/v2/Alerts/{}", urlencoding::encode(alert_id));
        let body = self.get(&path, &[("scope", scope.to_string())]).await?;
        Ok(Self::data_of(body))
    }

    #[instrument(skip(self))]
    async fn report(&self, query: &ReportQuery) -> ApiResult<Value> {
        self.get("/api/v2/Reports", &query.query_pairs()).await
    }

    #[instrument(skip(self))]
    async fn gcp_projects(&self, org_id: &str) -> ApiResult<Value> {
        let body = self
            .get("/api/v2/Configs/GcpProjects", &[("orgId", org_id.to_string())])
            .await?;
        Ok(Self::data_of(body))
    }

    #[instrument(skip(self, request), fields(resource = endpoint.resource()))]
    async fn search(&self, endpoint: SearchEndpoint, request: &SearchRequest) -> ApiResult<Page> {
        let body = self.post(&endpoint.path(), request).await?;
        Self::into_page(body)
    }

    async fn next_page(&self, url: &str) -> ApiResult<Page> {
        debug!(%url, "following next page");
        let req = self.authorized(Method::GET, url).await?;
        let body = self.send(req).await?;
        Self::into_page(body)
    }

    #[instrument(skip(self, query_text))]
    async fn validate_query(&self, query_text: &str) -> ApiResult<Value> {
        let body = self
            .post("/api/v2/Queries/validate", &ValidateQueryRequest { query_text })
            .await?;
        Ok(Self::data_of(body))
    }

    #[instrument(skip(self, query_text))]
    async fn execute_query(&self, query_text: &str, window: &TimeFilter) -> ApiResult<Vec<Value>> {
        let request = ExecuteQueryRequest {
            query: QueryText { query_text },
            arguments: vec![
                QueryArgument {
                    name: "StartTimeRange",
                    value: &window.start_time,
                },
                QueryArgument {
                    name: "EndTimeRange",
                    value: &window.end_time,
                },
            ],
        };
        let body = self.post("/api/v2/Queries/execute", &request).await?;
        Ok(Self::into_page(body)?.data)
    }
}
