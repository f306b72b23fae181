//! LQL query validation and execution.

use serde_json::{json, Value};
use tracing::info;

use crate::domain::errors::AdapterResult;
use crate::domain::models::{operation_doc_url, TimeFilter};
use crate::domain::ports::LaceworkApi;
use crate::services::search_runner::VendorContext;

fn context(action: &str, what: &str) -> VendorContext {
    VendorContext::new(
        format!(
            "The Queries/{action} {what}must follow the structure outlined in the Lacework API \
             documentation"
        ),
        operation_doc_url("Queries", action),
    )
}

/// Validate `query_text`, returning `{queryId, query}`.
pub async fn validate(api: &dyn LaceworkApi, query_text: &str) -> AdapterResult<Value> {
    let data = api
        .validate_query(query_text)
        .await
        .map_err(|e| context("validate", "search parameters ").wrap(e))?;

    Ok(json!({
        "queryId": data.get("queryId").cloned().unwrap_or(Value::Null),
        "query": data.get("queryText").cloned().unwrap_or(Value::Null),
    }))
}

/// Execute `query_text` over `window`, returning every row.
pub async fn execute(
    api: &dyn LaceworkApi,
    query_text: &str,
    window: &TimeFilter,
) -> AdapterResult<Vec<Value>> {
    let rows = api
        .execute_query(query_text, window)
        .await
        .map_err(|e| context("execute", "parameters ").wrap(e))?;
    info!(rows = rows.len(), "LQL query executed");
    Ok(rows)
}
