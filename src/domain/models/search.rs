//! Search request model shared by every `*/search` endpoint.
//!
//! Filters and return-field lists arrive from the host as loosely typed
//! arguments; they are validated into [`FilterClause`] and plain field
//! names here, at the boundary, before any request is built.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::errors::{AdapterError, AdapterResult};

/// Default cap on accumulated rows for a paginated search.
pub const DEFAULT_ROW_LIMIT: usize = 500_000;

/// Root of the vendor's API reference, used in remediation hints.
pub const API_DOCS_BASE: &str = "https://yourlacework.lacework.net/api/v2/docs";

/// Comparison operators accepted by Lacework search filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterExpression {
    Eq,
    Ne,
    In,
    NotIn,
    Like,
    Ilike,
    NotLike,
    NotIlike,
    Rlike,
    NotRlike,
    Gt,
    Ge,
    Lt,
    Le,
    Between,
}

impl FilterExpression {
    /// Operators that take a `values` list rather than a single `value`.
    pub const fn is_multi_valued(self) -> bool {
        matches!(self, Self::In | Self::NotIn | Self::Between)
    }
}

/// One `{field, expression, value}` filter clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterClause {
    pub field: String,
    pub expression: FilterExpression,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<Value>>,
}

impl FilterClause {
    /// Equality clause, the form used by every convenience argument.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            expression: FilterExpression::Eq,
            value: Some(value.into()),
            values: None,
        }
    }

    /// Check that the clause carries the operand shape its operator needs.
    pub fn validate(&self) -> AdapterResult<()> {
        if self.field.trim().is_empty() {
            return Err(AdapterError::InvalidArgument(
                "filter clause has an empty field name".to_string(),
            ));
        }

        if self.expression.is_multi_valued() {
            match &self.values {
                Some(values) if !values.is_empty() => {}
                _ => {
                    return Err(AdapterError::InvalidArgument(format!(
                        "filter on '{}' uses a list operator and requires a non-empty 'values'",
                        self.field
                    )))
                }
            }
            if self.expression == FilterExpression::Between
                && self.values.as_ref().map(Vec::len) != Some(2)
            {
                return Err(AdapterError::InvalidArgument(format!(
                    "filter on '{}' uses 'between' and requires exactly two values",
                    self.field
                )));
            }
        } else if self.value.is_none() {
            return Err(AdapterError::InvalidArgument(format!(
                "filter on '{}' requires a 'value'",
                self.field
            )));
        }

        Ok(())
    }
}

/// Parse a host-supplied filter list.
///
/// Accepts either a JSON array or a string containing one.
pub fn parse_filters(raw: &Value) -> AdapterResult<Vec<FilterClause>> {
    let list = decode_list(raw, "filters")?;
    let clauses: Vec<FilterClause> = list
        .into_iter()
        .map(|item| {
            serde_json::from_value::<FilterClause>(item).map_err(|e| {
                AdapterError::InvalidArgument(format!("malformed filter clause: {e}"))
            })
        })
        .collect::<AdapterResult<_>>()?;

    for clause in &clauses {
        clause.validate()?;
    }
    Ok(clauses)
}

/// Parse a host-supplied list of returned field names.
pub fn parse_returns(raw: &Value) -> AdapterResult<Vec<String>> {
    decode_list(raw, "returns")?
        .into_iter()
        .map(|item| match item {
            Value::String(s) if !s.trim().is_empty() => Ok(s),
            other => Err(AdapterError::InvalidArgument(format!(
                "returns must be a list of field names, got {other}"
            ))),
        })
        .collect()
}

fn decode_list(raw: &Value, name: &str) -> AdapterResult<Vec<Value>> {
    let decoded = match raw {
        Value::String(s) if s.trim().is_empty() => return Ok(Vec::new()),
        Value::String(s) => serde_json::from_str::<Value>(s).map_err(|e| {
            AdapterError::InvalidArgument(format!("{name} is not a valid JSON list: {e}"))
        })?,
        Value::Null => return Ok(Vec::new()),
        other => other.clone(),
    };

    match decoded {
        Value::Array(items) => Ok(items),
        other => Err(AdapterError::InvalidArgument(format!(
            "{name} must be a JSON list, got {other}"
        ))),
    }
}

/// Time range of a search, already rendered in the vendor's format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeFilter {
    pub start_time: String,
    pub end_time: String,
}

/// Body of a `*/search` request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub time_filter: TimeFilter,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<FilterClause>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub returns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csp: Option<String>,
}

impl SearchRequest {
    pub fn new(time_filter: TimeFilter) -> Self {
        Self {
            time_filter,
            filters: Vec::new(),
            returns: Vec::new(),
            csp: None,
        }
    }

    pub fn with_filters(mut self, filters: Vec<FilterClause>) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_returns(mut self, returns: Vec<String>) -> Self {
        self.returns = returns;
        self
    }

    pub fn with_csp(mut self, csp: impl Into<String>) -> Self {
        self.csp = Some(csp.into());
        self
    }
}

/// The paginated `*/search` endpoints the adapter knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchEndpoint {
    ContainerVulnerabilities,
    HostVulnerabilities,
    ChangedFiles,
    Connections,
    Dns,
    UserLogins,
    Machines,
    MachineDetails,
    Processes,
    CommandLines,
    Inventory,
}

impl SearchEndpoint {
    /// Resource path below `/api/v2/`, without the trailing `/search`.
    pub const fn resource(self) -> &'static str {
        match self {
            Self::ContainerVulnerabilities => "Vulnerabilities/Containers",
            Self::HostVulnerabilities => "Vulnerabilities/Hosts",
            Self::ChangedFiles => "Activities/ChangedFiles",
            Self::Connections => "Activities/Connections",
            Self::Dns => "Activities/DNSs",
            Self::UserLogins => "Activities/UserLogins",
            Self::Machines => "Entities/Machines",
            Self::MachineDetails => "Entities/MachineDetails",
            Self::Processes => "Entities/Processes",
            Self::CommandLines => "Entities/CommandLines",
            Self::Inventory => "Inventory",
        }
    }

    /// Full request path, e.g. `/api/v2/Entities/Machines/search`.
    pub fn path(self) -> String {
        format!("/api/v2/{}/search", self.resource())
    }

    /// Remediation hint attached to vendor errors from this endpoint.
    pub fn hint(self) -> String {
        match self {
            Self::ContainerVulnerabilities | Self::HostVulnerabilities => {
                "The vulnerability search parameters must follow the structure outlined in the \
                 Lacework API documentation"
                    .to_string()
            }
            Self::Inventory => "The Inventory/search parameters must follow the structure \
                                outlined in the Lacework API documentation"
                .to_string(),
            other => format!(
                "The {} search parameters must follow the structure outlined in the Lacework \
                 API documentation",
                other.resource()
            ),
        }
    }

    /// Link to the endpoint's section of the API reference.
    pub fn doc_url(self) -> String {
        match self {
            Self::ContainerVulnerabilities | Self::HostVulnerabilities => {
                format!("{API_DOCS_BASE}#tag/Vulnerabilities")
            }
            other => operation_doc_url(other.resource(), "search"),
        }
    }
}

/// Documentation anchor for an API tag such as `Alerts` or `Reports`.
pub fn tag_doc_url(tag: &str) -> String {
    format!("{API_DOCS_BASE}/#tag/{tag}")
}

/// Documentation anchor for a `POST /api/v2/<resource>/<action>` operation.
pub fn operation_doc_url(resource: &str, action: &str) -> String {
    let tag = resource.split('/').next().unwrap_or(resource);
    let escaped = format!("/api/v2/{resource}/{action}").replace('/', "~1");
    format!("{API_DOCS_BASE}/#tag/{tag}/paths/{escaped}/post")
}
