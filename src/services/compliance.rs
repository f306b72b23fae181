//! Compliance report shaping.

use serde_json::Value;

use crate::domain::models::ResultEntry;
use crate::services::result_formatter::ResultFormatter;

pub const COMPLIANCE_CONTEXT_KEY: &str = "Lacework.Compliance(val.reportTime === obj.reportTime)";

pub const NO_COMPLIANCE_DATA: &str = "No compliance data was returned.";

const SUMMARY_TITLE: &str = "Compliance Summary";

/// Split a comma-separated recommendation id list, dropping blanks.
pub fn parse_rec_ids(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

/// Shape a `Reports` response into a host entry.
///
/// Only the first report is kept. When `rec_ids` is non-empty its
/// `recommendations` are narrowed to those ids. An empty `data` array
/// yields an error entry.
pub fn format_compliance_data(response: Value, rec_ids: &[String]) -> ResultEntry {
    let Some(mut report) = first_report(response) else {
        return ResultEntry::error(NO_COMPLIANCE_DATA);
    };

    if !rec_ids.is_empty() {
        if let Some(Value::Array(recommendations)) = report.get_mut("recommendations") {
            recommendations.retain(|rec| {
                rec.get("REC_ID")
                    .map(value_text)
                    .is_some_and(|id| rec_ids.contains(&id))
            });
        }
    }

    let summary = report.get("summary").cloned().unwrap_or(Value::Null);
    ResultFormatter::entry(SUMMARY_TITLE, report, COMPLIANCE_CONTEXT_KEY, Some(&summary))
}

fn first_report(response: Value) -> Option<Value> {
    match response {
        Value::Object(mut body) => match body.remove("data") {
            Some(Value::Array(reports)) => reports.into_iter().next(),
            _ => None,
        },
        _ => None,
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
