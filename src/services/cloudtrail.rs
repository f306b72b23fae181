//! CloudTrail search over LQL, summarized as statistics or saved to a file.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::domain::errors::{AdapterError, AdapterResult};
use crate::domain::models::{ResultEntry, TimeFilter};
use crate::domain::ports::LaceworkApi;
use crate::services::lql;
use crate::services::result_formatter::ResultFormatter;

pub const CLOUDTRAIL_CONTEXT_KEY: &str = "Lacework.CloudTrail.search()";

/// Prefix of the JSON file written for `output=file`.
pub const CLOUDTRAIL_FILE_PREFIX: &str = "cloudtrail";

const ENTRY_TITLE: &str = "Lacework CloudTrail search data";

const QUERY_TEMPLATE: &str = r"
    {
      source { CloudTrailRawEvents E }
      filter {
        [[filter]]
      }
      return distinct {
        EVENT:eventName::String as eventName, EVENT:eventTime::String as eventTime,
        EVENT:recipientAccountAlias::String as accountAlias, EVENT:eventID::String as eventID,
        EVENT:recipientAccountId::String as accountId, EVENT:sourceIPAddress::String as sourceIPAddress,
        EVENT:userIdentity.userName::String as userName, EVENT:userAgent::String as userAgent
      }
    }";

/// What the search hands back to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CloudTrailOutput {
    #[default]
    Stats,
    File,
}

impl FromStr for CloudTrailOutput {
    type Err = AdapterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "stats" => Ok(Self::Stats),
            "file" => Ok(Self::File),
            other => Err(AdapterError::InvalidArgument(format!(
                "output must be 'stats' or 'file', got '{other}'"
            ))),
        }
    }
}

/// AWS account ids are exactly twelve digits.
pub fn validate_account_id(account_id: &str) -> AdapterResult<()> {
    if account_id.len() == 12 && account_id.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(AdapterError::InvalidArgument(format!(
            "account_id must be a 12-digit AWS account id, got '{account_id}'"
        )))
    }
}

/// Principal ids are quoted into the query and may not contain `'` or `\`.
pub fn validate_principal_id(principal_id: &str) -> AdapterResult<()> {
    if principal_id.contains(['\'', '\\']) {
        return Err(AdapterError::InvalidArgument(format!(
            "principal_id may not contain quotes or backslashes, got '{principal_id}'"
        )));
    }
    Ok(())
}

/// File name for one `output=file` run.
pub fn cloudtrail_file_name(file_id: &Uuid) -> String {
    format!("{CLOUDTRAIL_FILE_PREFIX}-{file_id}.json")
}

/// Build the LQL query for one account, optionally narrowed to a principal.
///
/// Callers validate both ids first.
pub fn cloudtrail_query(account_id: &str, principal_id: Option<&str>) -> String {
    let mut filter = format!("E.EVENT:recipientAccountId = '{account_id}' ");
    if let Some(principal) = principal_id.filter(|p| !p.is_empty()) {
        filter.push_str(&format!("and E.EVENT:userIdentity.principalId = '{principal}' "));
    }
    QUERY_TEMPLATE.replace("[[filter]]", &filter)
}

/// Summary of a CloudTrail result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CloudTrailStats {
    pub record_count: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_user_agents: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_events: Option<String>,
    pub start_time: String,
    pub end_time: String,
    pub query: String,
    pub account_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal_id: Option<String>,
}

impl CloudTrailStats {
    pub fn from_rows(
        rows: &[Value],
        window: &TimeFilter,
        query: &str,
        account_id: &str,
        principal_id: Option<&str>,
    ) -> Self {
        Self {
            record_count: rows.len().to_string(),
            unique_user_agents: tally(rows, "USERAGENT", "userAgent"),
            unique_events: tally(rows, "EVENTNAME", "eventName"),
            start_time: window.start_time.clone(),
            end_time: window.end_time.clone(),
            query: query.split_whitespace().collect::<Vec<_>>().join(" "),
            account_id: account_id.to_string(),
            principal_id: principal_id.filter(|p| !p.is_empty()).map(str::to_string),
        }
    }
}

/// `"<count> - <value>\n"` per distinct value, most common first.
///
/// Ties keep first-seen order. Rows without the column (or with null) are
/// skipped; `None` when nothing was counted.
fn tally(rows: &[Value], column: &str, alias: &str) -> Option<String> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for row in rows {
        let Some(value) = row
            .get(column)
            .filter(|v| !v.is_null())
            .or_else(|| row.get(alias).filter(|v| !v.is_null()))
        else {
            continue;
        };
        let key = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        match counts.iter_mut().find(|(k, _)| *k == key) {
            Some((_, n)) => *n += 1,
            None => counts.push((key, 1)),
        }
    }

    if counts.is_empty() {
        return None;
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    Some(
        counts
            .into_iter()
            .map(|(value, n)| format!("{n} - {value}\n"))
            .collect(),
    )
}

/// Runs the CloudTrail template query and shapes its result.
pub struct CloudTrailSearch<'a> {
    api: &'a dyn LaceworkApi,
    output_dir: &'a Path,
}

impl<'a> CloudTrailSearch<'a> {
    pub fn new(api: &'a dyn LaceworkApi, output_dir: &'a Path) -> Self {
        Self { api, output_dir }
    }

    pub async fn run(
        &self,
        account_id: &str,
        principal_id: Option<&str>,
        window: &TimeFilter,
        output: CloudTrailOutput,
    ) -> AdapterResult<ResultEntry> {
        validate_account_id(account_id)?;
        if let Some(principal) = principal_id {
            validate_principal_id(principal)?;
        }

        let query = cloudtrail_query(account_id, principal_id);
        let rows = lql::execute(self.api, &query, window).await?;

        match output {
            CloudTrailOutput::File => self.write_file(&rows).await,
            CloudTrailOutput::Stats => {
                let stats = CloudTrailStats::from_rows(&rows, window, &query, account_id, principal_id);
                Ok(ResultFormatter::entry(
                    ENTRY_TITLE,
                    serde_json::to_value(stats)?,
                    CLOUDTRAIL_CONTEXT_KEY,
                    None,
                ))
            }
        }
    }

    async fn write_file(&self, rows: &[Value]) -> AdapterResult<ResultEntry> {
        let file_id = Uuid::new_v4();
        let name = cloudtrail_file_name(&file_id);
        let path: PathBuf = self.output_dir.join(&name);
        let body = serde_json::to_vec(rows)?;
        tokio::fs::create_dir_all(self.output_dir)
            .await
            .map_err(|e| AdapterError::Output(format!("{}: {e}", self.output_dir.display())))?;
        tokio::fs::write(&path, body)
            .await
            .map_err(|e| AdapterError::Output(format!("{}: {e}", path.display())))?;

        info!(path = %path.display(), rows = rows.len(), "CloudTrail rows written");
        Ok(ResultEntry::file(name, file_id.to_string()))
    }
}
