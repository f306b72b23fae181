//! In-memory Lacework API for testing.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::domain::models::{ReportQuery, SearchEndpoint, SearchRequest, TimeFilter};
use crate::domain::ports::{ApiError, ApiResult, LaceworkApi, Page};

/// Scripted responses plus a log of every call made.
#[derive(Debug, Default)]
pub struct MockLaceworkApi {
    profile: Option<Value>,
    alert_pages: Vec<Vec<Value>>,
    details: HashMap<String, Value>,
    failing_details: HashSet<String>,
    report: Option<Value>,
    gcp_projects: Value,
    search_pages: HashMap<SearchEndpoint, Vec<Vec<Value>>>,
    search_error: Option<ApiError>,
    validation: Option<Value>,
    query_rows: Vec<Value>,
    query_error: Option<ApiError>,
    calls: Mutex<Vec<String>>,
    searches: Mutex<Vec<(SearchEndpoint, SearchRequest)>>,
    queries: Mutex<Vec<(String, TimeFilter)>>,
}

impl MockLaceworkApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(mut self, profile: Value) -> Self {
        self.profile = Some(profile);
        self
    }

    /// Alerts served as a single page.
    pub fn with_alerts(mut self, alerts: Vec<Value>) -> Self {
        self.alert_pages = vec![alerts];
        self
    }

    /// Alerts served across several pages.
    pub fn with_alert_pages(mut self, pages: Vec<Vec<Value>>) -> Self {
        self.alert_pages = pages;
        self
    }

    pub fn with_details(mut self, alert_id: impl Into<String>, details: Value) -> Self {
        self.details.insert(alert_id.into(), details);
        self
    }

    /// Make the detail fetch for one alert fail with a server error.
    pub fn with_failing_details(mut self, alert_id: impl Into<String>) -> Self {
        self.failing_details.insert(alert_id.into());
        self
    }

    pub fn with_report(mut self, report: Value) -> Self {
        self.report = Some(report);
        self
    }

    pub fn with_gcp_projects(mut self, projects: Value) -> Self {
        self.gcp_projects = projects;
        self
    }

    pub fn with_search_pages(mut self, endpoint: SearchEndpoint, pages: Vec<Vec<Value>>) -> Self {
        self.search_pages.insert(endpoint, pages);
        self
    }

    pub fn with_search_error(mut self, error: ApiError) -> Self {
        self.search_error = Some(error);
        self
    }

    pub fn with_validation(mut self, data: Value) -> Self {
        self.validation = Some(data);
        self
    }

    pub fn with_query_rows(mut self, rows: Vec<Value>) -> Self {
        self.query_rows = rows;
        self
    }

    pub fn with_query_error(mut self, error: ApiError) -> Self {
        self.query_error = Some(error);
        self
    }

    /// Names of the calls made so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of calls whose name starts with `prefix`.
    pub fn call_count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    /// Search requests received, in order.
    pub fn searches(&self) -> Vec<(SearchEndpoint, SearchRequest)> {
        self.searches.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// LQL queries executed, with their time windows.
    pub fn queries(&self) -> Vec<(String, TimeFilter)> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }

    fn record(&self, call: String) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn page_of(pages: &[Vec<Value>], prefix: &str, index: usize) -> Page {
        let data = pages.get(index).cloned().unwrap_or_default();
        let next_page = (index + 1 < pages.len()).then(|| format!("{prefix}/{}", index + 1));
        Page { data, next_page }
    }
}

#[async_trait]
impl LaceworkApi for MockLaceworkApi {
    async fn user_profile(&self) -> ApiResult<Value> {
        self.record("user_profile".into());
        self.profile
            .clone()
            .ok_or_else(|| ApiError::Unauthorized("no profile scripted".into()))
    }

    async fn alerts(&self, window: &TimeFilter) -> ApiResult<Page> {
        self.record(format!("alerts {} {}", window.start_time, window.end_time));
        Ok(Self::page_of(&self.alert_pages, "mock://alerts", 0))
    }

    async fn alert_details(&self, alert_id: &str, scope: &str) -> ApiResult<Value> {
        self.record(format!("alert_details {alert_id} {scope}"));
        if self.failing_details.contains(alert_id) {
            return Err(ApiError::Server(500, format!("details for {alert_id} unavailable")));
        }
        Ok(self
            .details
            .get(alert_id)
            .cloned()
            .unwrap_or_else(|| json!({"alertId": alert_id})))
    }

    async fn report(&self, query: &ReportQuery) -> ApiResult<Value> {
        self.record(format!("report {:?}", query.report_type));
        Ok(self.report.clone().unwrap_or_else(|| json!({"data": []})))
    }

    async fn gcp_projects(&self, org_id: &str) -> ApiResult<Value> {
        self.record(format!("gcp_projects {org_id}"));
        Ok(self.gcp_projects.clone())
    }

    async fn search(&self, endpoint: SearchEndpoint, request: &SearchRequest) -> ApiResult<Page> {
        self.record(format!("search {}", endpoint.resource()));
        if let Ok(mut searches) = self.searches.lock() {
            searches.push((endpoint, request.clone()));
        }
        if let Some(err) = &self.search_error {
            return Err(err.clone());
        }
        let pages = self.search_pages.get(&endpoint).cloned().unwrap_or_default();
        Ok(Self::page_of(
            &pages,
            &format!("mock://search/{}", endpoint.resource()),
            0,
        ))
    }

    async fn next_page(&self, url: &str) -> ApiResult<Page> {
        self.record(format!("next_page {url}"));
        let (prefix, index) = url
            .rsplit_once('/')
            .and_then(|(p, i)| i.parse::<usize>().ok().map(|i| (p, i)))
            .ok_or_else(|| ApiError::NotFound(url.to_string()))?;

        if prefix == "mock://alerts" {
            return Ok(Self::page_of(&self.alert_pages, prefix, index));
        }

        let resource = prefix
            .strip_prefix("mock://search/")
            .ok_or_else(|| ApiError::NotFound(url.to_string()))?;
        let pages = self
            .search_pages
            .iter()
            .find(|(endpoint, _)| endpoint.resource() == resource)
            .map(|(_, pages)| pages.clone())
            .ok_or_else(|| ApiError::NotFound(url.to_string()))?;
        Ok(Self::page_of(&pages, prefix, index))
    }

    async fn validate_query(&self, query_text: &str) -> ApiResult<Value> {
        self.record("validate_query".into());
        self.validation.clone().ok_or_else(|| {
            ApiError::BadRequest(format!("query does not compile: {query_text}"))
        })
    }

    async fn execute_query(&self, query_text: &str, window: &TimeFilter) -> ApiResult<Vec<Value>> {
        self.record("execute_query".into());
        if let Ok(mut queries) = self.queries.lock() {
            queries.push((query_text.to_string(), window.clone()));
        }
        if let Some(err) = &self.query_error {
            return Err(err.clone());
        }
        Ok(self.query_rows.clone())
    }
}
