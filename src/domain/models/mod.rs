//! Domain models for the Lacework adapter.

pub mod alert;
pub mod config;
pub mod entry;
pub mod report;
pub mod search;
pub mod severity;

pub use alert::{Alert, Incident};
pub use config::{
    ApiConfig, Config, FetchConfig, LogFormat, LoggingConfig, RotationPolicy,
};
pub use entry::{ContentFormat, EntryType, ResultEntry};
pub use report::ReportQuery;
pub use search::{
    operation_doc_url, parse_filters, parse_returns, tag_doc_url, FilterClause, FilterExpression,
    SearchEndpoint, SearchRequest, TimeFilter, DEFAULT_ROW_LIMIT,
};
pub use severity::{severity_rank, Severity};
