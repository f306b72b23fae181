//! Host command handlers.
//!
//! Each handler reads its arguments through [`CommandArgs`], calls the
//! Lacework API port and shapes the answer into a [`ResultEntry`].

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info, instrument};

use crate::domain::errors::{AdapterError, AdapterResult};
use crate::domain::models::{
    parse_filters, parse_returns, tag_doc_url, FilterClause, ReportQuery, ResultEntry,
    SearchEndpoint, SearchRequest, DEFAULT_ROW_LIMIT,
};
use crate::domain::ports::LaceworkApi;
use crate::services::cloudtrail::{CloudTrailOutput, CloudTrailSearch};
use crate::services::compliance::{format_compliance_data, parse_rec_ids};
use crate::services::lql;
use crate::services::result_formatter::{add_fingerprints, ResultFormatter};
use crate::services::search_runner::{SearchRunner, VendorContext};
use crate::services::time_window::TimeWindow;

/// Every command the adapter answers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandName {
    TestModule,
    FetchIncidents,
    AwsComplianceAssessment,
    AzureComplianceAssessment,
    GcpComplianceAssessment,
    ComplianceReport,
    GcpProjectsByOrganization,
    ContainerVulnerabilities,
    HostVulnerabilities,
    AlertDetails,
    ActivitiesChangedFiles,
    ActivitiesConnections,
    ActivitiesDns,
    ActivitiesUserLogins,
    EntitiesMachines,
    EntitiesMachineDetails,
    EntitiesProcesses,
    EntitiesCommandLines,
    QueriesValidate,
    QueriesExecute,
    InventorySearch,
    CloudTrailSearch,
}

impl CommandName {
    pub const ALL: [Self; 22] = [
        Self::TestModule,
        Self::FetchIncidents,
        Self::AwsComplianceAssessment,
        Self::AzureComplianceAssessment,
        Self::GcpComplianceAssessment,
        Self::ComplianceReport,
        Self::GcpProjectsByOrganization,
        Self::ContainerVulnerabilities,
        Self::HostVulnerabilities,
        Self::AlertDetails,
        Self::ActivitiesChangedFiles,
        Self::ActivitiesConnections,
        Self::ActivitiesDns,
        Self::ActivitiesUserLogins,
        Self::EntitiesMachines,
        Self::EntitiesMachineDetails,
        Self::EntitiesProcesses,
        Self::EntitiesCommandLines,
        Self::QueriesValidate,
        Self::QueriesExecute,
        Self::InventorySearch,
        Self::CloudTrailSearch,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TestModule => "test-module",
            Self::FetchIncidents => "fetch-incidents",
            Self::AwsComplianceAssessment => "lw-get-aws-compliance-assessment",
            Self::AzureComplianceAssessment => "lw-get-azure-compliance-assessment",
            Self::GcpComplianceAssessment => "lw-get-gcp-compliance-assessment",
            Self::ComplianceReport => "lw-get-compliance-report",
            Self::GcpProjectsByOrganization => "lw-get-gcp-projects-by-organization",
            Self::ContainerVulnerabilities => "lw-get-container-vulnerabilities",
            Self::HostVulnerabilities => "lw-get-host-vulnerabilities",
            Self::AlertDetails => "lw-get-alert-details",
            Self::ActivitiesChangedFiles => "lw-get-activities-changedfiles",
            Self::ActivitiesConnections => "lw-get-activities-connections",
            Self::ActivitiesDns => "lw-get-activities-dns",
            Self::ActivitiesUserLogins => "lw-get-activities-userlogins",
            Self::EntitiesMachines => "lw-get-entities-machines",
            Self::EntitiesMachineDetails => "lw-get-entities-machinedetails",
            Self::EntitiesProcesses => "lw-get-entities-processes",
            Self::EntitiesCommandLines => "lw-get-entities-commandlines",
            Self::QueriesValidate => "lw-get-queries-validate",
            Self::QueriesExecute => "lw-get-queries-execute",
            Self::InventorySearch => "lw-get-inventory-search",
            Self::CloudTrailSearch => "lw-get-cloudtrail-search",
        }
    }
}

impl FromStr for CommandName {
    type Err = AdapterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| AdapterError::UnknownCommand(s.to_string()))
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed access to a command's argument map.
///
/// Blank strings and nulls read as absent. Numbers are accepted wherever a
/// string is expected.
#[derive(Debug, Clone, Default)]
pub struct CommandArgs {
    args: Map<String, Value>,
}

impl CommandArgs {
    pub fn new(args: Map<String, Value>) -> Self {
        Self { args }
    }

    /// Accept a JSON object; null reads as no arguments.
    pub fn from_value(value: Value) -> AdapterResult<Self> {
        match value {
            Value::Object(args) => Ok(Self::new(args)),
            Value::Null => Ok(Self::default()),
            other => Err(AdapterError::InvalidArgument(format!(
                "command arguments must be a JSON object, got {other}"
            ))),
        }
    }

    /// The raw value of `name`, unless blank.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.args.get(name).filter(|v| match v {
            Value::Null => false,
            Value::String(s) => !s.trim().is_empty(),
            _ => true,
        })
    }

    pub fn get_str(&self, name: &str) -> Option<String> {
        self.value(name).map(|v| match v {
            Value::String(s) => s.trim().to_string(),
            other => other.to_string(),
        })
    }

    pub fn require_str(&self, name: &str) -> AdapterResult<String> {
        self.get_str(name)
            .ok_or_else(|| AdapterError::InvalidArgument(format!("{name} is required")))
    }

    /// Row cap from `limit`, defaulting to `default`.
    pub fn limit(&self, default: usize) -> AdapterResult<usize> {
        let Some(raw) = self.value("limit") else {
            return Ok(default);
        };
        let parsed = match raw {
            Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
            Value::String(s) => s.trim().parse::<usize>().ok(),
            _ => None,
        };
        parsed.ok_or_else(|| {
            AdapterError::InvalidArgument(format!("limit must be a non-negative integer, got {raw}"))
        })
    }

    pub fn filters(&self) -> AdapterResult<Vec<FilterClause>> {
        self.value("filters").map_or_else(|| Ok(Vec::new()), parse_filters)
    }

    pub fn returns(&self) -> AdapterResult<Vec<String>> {
        self.value("returns").map_or_else(|| Ok(Vec::new()), parse_returns)
    }

    /// Comma-separated string or JSON array of recommendation ids.
    pub fn rec_ids(&self) -> Vec<String> {
        match self.value("rec_id") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s.trim().to_string()),
                    Value::Null => None,
                    other => Some(other.to_string()),
                })
                .filter(|s| !s.is_empty())
                .collect(),
            Some(Value::String(s)) => parse_rec_ids(s),
            Some(other) => vec![other.to_string()],
            None => Vec::new(),
        }
    }

    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.get_str("start_time"), self.get_str("end_time"))
    }
}

/// How a `*/search` command maps onto its endpoint.
struct SearchCommand {
    endpoint: SearchEndpoint,
    title: &'static str,
    context_key: &'static str,
    /// `(argument, filter field)` pairs turned into `eq` clauses, in order.
    conveniences: &'static [(&'static str, &'static str)],
    fingerprint: bool,
}

const CONTAINER_VULNERABILITIES: SearchCommand = SearchCommand {
    endpoint: SearchEndpoint::ContainerVulnerabilities,
    title: "Lacework Vulnerability Data for Containers",
    context_key: "Lacework.Vulnerability.Container(val.vulnHash === obj.vulnHash)",
    conveniences: &[],
    fingerprint: true,
};

const HOST_VULNERABILITIES: SearchCommand = SearchCommand {
    endpoint: SearchEndpoint::HostVulnerabilities,
    title: "Lacework Vulnerability Data for Hosts",
    context_key: "Lacework.Vulnerability.Host(val.vulnHash === obj.vulnHash)",
    conveniences: &[],
    fingerprint: true,
};

const CHANGED_FILES: SearchCommand = SearchCommand {
    endpoint: SearchEndpoint::ChangedFiles,
    title: "Lacework changed files from activities data",
    context_key: "Lacework.Activities.ChangedFiles()",
    conveniences: &[("mid", "mid")],
    fingerprint: false,
};

const CONNECTIONS: SearchCommand = SearchCommand {
    endpoint: SearchEndpoint::Connections,
    title: "Lacework connections from activities data",
    context_key: "Lacework.Activities.Connections()",
    conveniences: &[("src_mid", "srcEntityId.mid"), ("dst_mid", "dstEntityId.mid")],
    fingerprint: false,
};

const DNS: SearchCommand = SearchCommand {
    endpoint: SearchEndpoint::Dns,
    title: "Lacework DNS data",
    context_key: "Lacework.Activities.DNSs()",
    conveniences: &[("mid", "mid")],
    fingerprint: false,
};

const USER_LOGINS: SearchCommand = SearchCommand {
    endpoint: SearchEndpoint::UserLogins,
    title: "Lacework user login data",
    context_key: "Lacework.Activities.UserLogins()",
    conveniences: &[("mid", "mid"), ("username", "username")],
    fingerprint: false,
};

const MACHINES: SearchCommand = SearchCommand {
    endpoint: SearchEndpoint::Machines,
    title: "Lacework machine data",
    context_key: "Lacework.Entities.Machines()",
    conveniences: &[
        ("mid", "mid"),
        ("hostname", "hostname"),
        ("internal_ip", "machineTags.InternalIp"),
        ("external_ip", "machineTags.ExternalIp"),
    ],
    fingerprint: false,
};

const MACHINE_DETAILS: SearchCommand = SearchCommand {
    endpoint: SearchEndpoint::MachineDetails,
    title: "Lacework machine details data",
    context_key: "Lacework.Entities.MachineDetails()",
    conveniences: &[("mid", "mid")],
    fingerprint: false,
};

const PROCESSES: SearchCommand = SearchCommand {
    endpoint: SearchEndpoint::Processes,
    title: "Lacework process data",
    context_key: "Lacework.Entities.Processes()",
    conveniences: &[("mid", "mid"), ("pid", "pid"), ("ppid", "ppid")],
    fingerprint: false,
};

const COMMAND_LINES: SearchCommand = SearchCommand {
    endpoint: SearchEndpoint::CommandLines,
    title: "Lacework command line data",
    context_key: "Lacework.Entities.CommandLines()",
    conveniences: &[("cmdlineHash", "cmdlineHash")],
    fingerprint: false,
};

const INVENTORY: SearchCommand = SearchCommand {
    endpoint: SearchEndpoint::Inventory,
    title: "Lacework cloud inventory search data",
    context_key: "Lacework.Inventory.search()",
    conveniences: &[
        ("resource_id", "resourceId"),
        ("account_id", "cloudDetails.accountID"),
    ],
    fingerprint: false,
};

const PROFILE_KEYS: [&str; 3] = ["username", "url", "accounts"];

/// Settings the handlers need beyond the API itself.
#[derive(Debug, Clone)]
pub struct HandlerSettings {
    pub row_limit: usize,
    pub output_dir: PathBuf,
}

impl Default for HandlerSettings {
    fn default() -> Self {
        Self {
            row_limit: DEFAULT_ROW_LIMIT,
            output_dir: PathBuf::from("."),
        }
    }
}

/// Handlers for every command except `fetch-incidents`.
pub struct CommandHandlers {
    api: Arc<dyn LaceworkApi>,
    settings: HandlerSettings,
}

impl CommandHandlers {
    pub fn new(api: Arc<dyn LaceworkApi>, settings: HandlerSettings) -> Self {
        Self { api, settings }
    }

    /// Run a result-producing command.
    #[instrument(skip(self, args), fields(command = %name))]
    pub async fn handle(&self, name: CommandName, args: &CommandArgs) -> AdapterResult<ResultEntry> {
        match name {
            CommandName::AwsComplianceAssessment => {
                let query = ReportQuery::default_template(
                    args.get_str("report_type").unwrap_or_else(|| "AWS_CIS_S3".into()),
                )
                .with_primary(args.get_str("account_id"));
                self.compliance(query, args).await
            }
            CommandName::AzureComplianceAssessment => {
                let query = ReportQuery::default_template(
                    args.get_str("report_type").unwrap_or_else(|| "AZURE_CIS".into()),
                )
                .with_primary(args.get_str("tenant_id"))
                .with_secondary(args.get_str("subscription_id"));
                self.compliance(query, args).await
            }
            CommandName::GcpComplianceAssessment => {
                let query = ReportQuery::default_template(
                    args.get_str("report_type").unwrap_or_else(|| "GCP_CIS".into()),
                )
                .with_secondary(args.get_str("project_id"));
                self.compliance(query, args).await
            }
            CommandName::ComplianceReport => {
                let query = ReportQuery {
                    primary_query_id: args.get_str("primary_query_id"),
                    secondary_query_id: args.get_str("secondary_query_id"),
                    report_type: args.get_str("report_type"),
                    report_name: args.get_str("report_name"),
                    template_name: args.get_str("template_name"),
                };
                self.compliance(query, args).await
            }
            CommandName::GcpProjectsByOrganization => self.gcp_projects(args).await,
            CommandName::ContainerVulnerabilities => {
                self.search(&CONTAINER_VULNERABILITIES, args).await
            }
            CommandName::HostVulnerabilities => self.search(&HOST_VULNERABILITIES, args).await,
            CommandName::AlertDetails => self.alert_details(args).await,
            CommandName::ActivitiesChangedFiles => self.search(&CHANGED_FILES, args).await,
            CommandName::ActivitiesConnections => self.search(&CONNECTIONS, args).await,
            CommandName::ActivitiesDns => self.search(&DNS, args).await,
            CommandName::ActivitiesUserLogins => self.search(&USER_LOGINS, args).await,
            CommandName::EntitiesMachines => self.search(&MACHINES, args).await,
            CommandName::EntitiesMachineDetails => self.search(&MACHINE_DETAILS, args).await,
            CommandName::EntitiesProcesses => self.search(&PROCESSES, args).await,
            CommandName::EntitiesCommandLines => self.search(&COMMAND_LINES, args).await,
            CommandName::QueriesValidate => self.queries_validate(args).await,
            CommandName::QueriesExecute => self.queries_execute(args).await,
            CommandName::InventorySearch => self.search(&INVENTORY, args).await,
            CommandName::CloudTrailSearch => self.cloudtrail(args).await,
            CommandName::TestModule | CommandName::FetchIncidents => Err(
                AdapterError::InvalidArgument(format!("{name} does not produce a result entry")),
            ),
        }
    }

    /// Connectivity check: the user profile must carry the expected keys.
    pub async fn test_module(&self) -> AdapterResult<()> {
        let body = self
            .api
            .user_profile()
            .await
            .map_err(|e| AdapterError::AuthenticationFailure(e.to_string()))?;
        let profile = body.get("data").and_then(|d| d.get(0));
        debug!(?profile, "user profile");

        let missing: Vec<&str> = PROFILE_KEYS
            .into_iter()
            .filter(|key| profile.and_then(|p| p.get(*key)).is_none())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AdapterError::AuthenticationFailure(format!(
                "user profile is missing {}",
                missing.join(", ")
            )))
        }
    }

    async fn compliance(&self, query: ReportQuery, args: &CommandArgs) -> AdapterResult<ResultEntry> {
        let context = VendorContext::new(
            "Unable to retrieve the compliance report",
            tag_doc_url("Reports"),
        );
        let response = self.api.report(&query).await.map_err(|e| context.wrap(e))?;
        Ok(format_compliance_data(response, &args.rec_ids()))
    }

    async fn gcp_projects(&self, args: &CommandArgs) -> AdapterResult<ResultEntry> {
        let org_id = args.require_str("organization_id")?;
        let context = VendorContext::new(
            "Unable to list GCP projects for the organization",
            tag_doc_url("Configs"),
        );
        let data = self
            .api
            .gcp_projects(&org_id)
            .await
            .map_err(|e| context.wrap(e))?;
        Ok(ResultFormatter::entry(
            &format!("Google Cloud Platform Projects for Organization {org_id}"),
            data,
            "Lacework.GCP(val.organization === obj.organization)",
            None,
        ))
    }

    async fn alert_details(&self, args: &CommandArgs) -> AdapterResult<ResultEntry> {
        let alert_id = args.require_str("alert_id")?;
        let scope = args.get_str("scope").unwrap_or_else(|| "Details".into());
        let context = VendorContext::new("Unable to retrieve alert details", tag_doc_url("Alerts"));
        let data = self
            .api
            .alert_details(&alert_id, &scope)
            .await
            .map_err(|e| context.wrap(e))?;
        Ok(ResultFormatter::entry(
            &format!("Lacework Alert {alert_id}"),
            data,
            "Lacework.Alert(val.alertId === obj.alertId)",
            None,
        ))
    }

    async fn search(&self, command: &SearchCommand, args: &CommandArgs) -> AdapterResult<ResultEntry> {
        let mut filters = args.filters()?;
        for (arg, field) in command.conveniences {
            if let Some(value) = args.value(arg) {
                filters.push(FilterClause::eq(*field, value.clone()));
            }
        }

        let mut request = SearchRequest::new(args.window().resolve_now()?)
            .with_filters(filters)
            .with_returns(args.returns()?);
        if command.endpoint == SearchEndpoint::Inventory {
            request = request.with_csp(args.require_str("csp")?);
        }

        let limit = args.limit(self.settings.row_limit)?;
        let mut rows = SearchRunner::new(self.api.clone())
            .run(command.endpoint, &request, limit)
            .await?
            .rows;
        if command.fingerprint {
            add_fingerprints(&mut rows);
        }

        Ok(ResultFormatter::entry(
            command.title,
            Value::Array(rows),
            command.context_key,
            None,
        ))
    }

    async fn queries_validate(&self, args: &CommandArgs) -> AdapterResult<ResultEntry> {
        let query = args.require_str("query")?;
        let data = lql::validate(self.api.as_ref(), &query).await?;
        Ok(ResultFormatter::entry(
            "Lacework query validation",
            data,
            "Lacework.Queries.validate()",
            None,
        ))
    }

    async fn queries_execute(&self, args: &CommandArgs) -> AdapterResult<ResultEntry> {
        let query = args.require_str("query")?;
        let window = args.window().resolve_now()?;
        let rows = lql::execute(self.api.as_ref(), &query, &window).await?;
        Ok(ResultFormatter::entry(
            "Lacework LQL query data",
            Value::Array(rows),
            "Lacework.Queries.execute()",
            None,
        ))
    }

    async fn cloudtrail(&self, args: &CommandArgs) -> AdapterResult<ResultEntry> {
        let account_id = args.require_str("account_id")?;
        let principal_id = args.get_str("principal_id");
        let output = args
            .get_str("output")
            .map_or(Ok(CloudTrailOutput::default()), |o| o.parse())?;
        let window = args.window().resolve_now()?;

        info!(%account_id, ?output, "CloudTrail search");
        CloudTrailSearch::new(self.api.as_ref(), &self.settings.output_dir)
            .run(&account_id, principal_id.as_deref(), &window, output)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::lacework::MockLaceworkApi;
    use crate::domain::models::FilterExpression;
    use crate::domain::ports::ApiError;
    use serde_json::json;

    fn args(value: Value) -> CommandArgs {
        CommandArgs::from_value(value).unwrap()
    }

    fn handlers(mock: MockLaceworkApi) -> (CommandHandlers, Arc<MockLaceworkApi>) {
        let api = Arc::new(mock);
        (
            CommandHandlers::new(api.clone(), HandlerSettings::default()),
            api,
        )
    }

    #[test]
    fn test_command_names_round_trip() {
        for name in CommandName::ALL {
            assert_eq!(name.as_str().parse::<CommandName>().unwrap(), name);
        }
        assert!(matches!(
            "lw-get-nothing".parse::<CommandName>(),
            Err(AdapterError::UnknownCommand(_))
        ));
    }

    #[test]
    fn test_args_blank_values_are_absent() {
        let a = args(json!({"mid": "  ", "pid": 42, "scope": null, "hostname": "web-1"}));
        assert_eq!(a.get_str("mid"), None);
        assert_eq!(a.get_str("pid").as_deref(), Some("42"));
        assert_eq!(a.get_str("scope"), None);
        assert_eq!(a.get_str("hostname").as_deref(), Some("web-1"));
        assert!(a.require_str("alert_id").is_err());
    }

    #[test]
    fn test_args_limit() {
        assert_eq!(args(json!({})).limit(500).unwrap(), 500);
        assert_eq!(args(json!({"limit": "25"})).limit(500).unwrap(), 25);
        assert_eq!(args(json!({"limit": 0})).limit(500).unwrap(), 0);
        assert!(args(json!({"limit": "many"})).limit(500).is_err());
        assert!(args(json!({"limit": -1})).limit(500).is_err());
    }

    #[test]
    fn test_args_rec_ids() {
        assert_eq!(args(json!({"rec_id": "a, b"})).rec_ids(), vec!["a", "b"]);
        assert_eq!(args(json!({"rec_id": ["a", "b"]})).rec_ids(), vec!["a", "b"]);
        assert!(args(json!({})).rec_ids().is_empty());
    }

    #[test]
    fn test_args_must_be_object() {
        assert!(CommandArgs::from_value(json!([1])).is_err());
        assert!(CommandArgs::from_value(Value::Null).is_ok());
    }

    #[tokio::test]
    async fn test_convenience_filters_follow_caller_filters() {
        let (handlers, api) = handlers(MockLaceworkApi::new());
        let a = args(json!({
            "filters": r#"[{"field": "os", "expression": "eq", "value": "linux"}]"#,
            "external_ip": "1.2.3.4",
            "mid": 7,
            "hostname": "web-1",
        }));

        handlers.handle(CommandName::EntitiesMachines, &a).await.unwrap();

        let (endpoint, request) = api.searches().remove(0);
        assert_eq!(endpoint, SearchEndpoint::Machines);
        let fields: Vec<&str> = request.filters.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(fields, vec!["os", "mid", "hostname", "machineTags.ExternalIp"]);
        assert!(request.filters[1..]
            .iter()
            .all(|f| f.expression == FilterExpression::Eq));
        assert_eq!(request.filters[1].value, Some(json!(7)));
    }

    #[tokio::test]
    async fn test_no_filters_omits_section() {
        let (handlers, api) = handlers(MockLaceworkApi::new());
        handlers
            .handle(CommandName::ActivitiesDns, &args(json!({})))
            .await
            .unwrap();
        let (_, request) = api.searches().remove(0);
        let body = serde_json::to_value(&request).unwrap();
        assert!(body.get("filters").is_none());
        assert!(body.get("returns").is_none());
    }

    #[tokio::test]
    async fn test_inventory_requires_csp_and_maps_ids() {
        let (handlers, api) = handlers(MockLaceworkApi::new());
        let err = handlers
            .handle(CommandName::InventorySearch, &args(json!({})))
            .await
            .unwrap_err();
        assert!(err.is_invalid_input());

        handlers
            .handle(
                CommandName::InventorySearch,
                &args(json!({"csp": "AWS", "resource_id": "arn:x", "account_id": "123"})),
            )
            .await
            .unwrap();
        let (_, request) = api.searches().remove(0);
        assert_eq!(request.csp.as_deref(), Some("AWS"));
        let fields: Vec<&str> = request.filters.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(fields, vec!["resourceId", "cloudDetails.accountID"]);
    }

    #[tokio::test]
    async fn test_vulnerabilities_get_fingerprints() {
        let (handlers, _) = handlers(MockLaceworkApi::new().with_search_pages(
            SearchEndpoint::HostVulnerabilities,
            vec![vec![json!({"vulnId": "CVE-1"}), json!({"vulnId": "CVE-2"})]],
        ));
        let entry = handlers
            .handle(CommandName::HostVulnerabilities, &args(json!({"limit": 1})))
            .await
            .unwrap();
        let rows = entry.contents.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["vulnHash"].as_str().unwrap().len(), 64);
        assert!(entry
            .entry_context
            .contains_key("Lacework.Vulnerability.Host(val.vulnHash === obj.vulnHash)"));
    }

    #[tokio::test]
    async fn test_search_with_no_rows_reports_none_found() {
        let (handlers, _) = handlers(MockLaceworkApi::new());
        let entry = handlers
            .handle(CommandName::EntitiesProcesses, &args(json!({"pid": "10"})))
            .await
            .unwrap();
        assert_eq!(entry.human_readable.as_deref(), Some("No results were found"));
    }

    #[tokio::test]
    async fn test_malformed_filters_rejected_before_vendor() {
        let (handlers, api) = handlers(MockLaceworkApi::new());
        let err = handlers
            .handle(
                CommandName::ActivitiesChangedFiles,
                &args(json!({"filters": "[{'field': 'mid'}]"})),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::InvalidArgument(_)));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_alert_details_defaults_scope() {
        let (handlers, api) = handlers(
            MockLaceworkApi::new().with_details("31", json!({"alertId": 31, "alertType": "X"})),
        );
        let entry = handlers
            .handle(CommandName::AlertDetails, &args(json!({"alert_id": 31})))
            .await
            .unwrap();
        assert_eq!(api.calls(), vec!["alert_details 31 Details".to_string()]);
        assert!(entry.human_readable.unwrap().starts_with("### Lacework Alert 31"));
    }

    #[tokio::test]
    async fn test_aws_compliance_uses_default_report_type() {
        let (handlers, api) = handlers(MockLaceworkApi::new());
        let entry = handlers
            .handle(
                CommandName::AwsComplianceAssessment,
                &args(json!({"account_id": "123"})),
            )
            .await
            .unwrap();
        assert!(entry.is_error());
        assert_eq!(api.calls(), vec![r#"report Some("AWS_CIS_S3")"#.to_string()]);
    }

    #[tokio::test]
    async fn test_test_module_checks_profile_keys() {
        let (ok, _) = handlers(MockLaceworkApi::new().with_profile(json!({
            "data": [{"username": "u", "url": "acme.lacework.net", "accounts": []}]
        })));
        assert!(ok.test_module().await.is_ok());

        let (partial, _) =
            handlers(MockLaceworkApi::new().with_profile(json!({"data": [{"username": "u"}]})));
        let err = partial.test_module().await.unwrap_err();
        assert!(err.to_string().contains("url, accounts"));

        let (denied, _) = handlers(MockLaceworkApi::new());
        assert!(matches!(
            denied.test_module().await,
            Err(AdapterError::AuthenticationFailure(_))
        ));
    }

    #[tokio::test]
    async fn test_vendor_errors_surface_with_docs() {
        let (handlers, _) = handlers(
            MockLaceworkApi::new().with_search_error(ApiError::BadRequest("unknown field".into())),
        );
        let err = handlers
            .handle(CommandName::ActivitiesUserLogins, &args(json!({"username": "root"})))
            .await
            .unwrap_err();
        assert!(err
            .to_string()
            .contains("~1api~1v2~1Activities~1UserLogins~1search/post"));
    }

    #[tokio::test]
    async fn test_queries_execute_entry() {
        let (handlers, api) =
            handlers(MockLaceworkApi::new().with_query_rows(vec![json!({"a": 1})]));
        let entry = handlers
            .handle(
                CommandName::QueriesExecute,
                &args(json!({"query": "{ source { X } }", "start_time": "2024-01-01T00:00:00Z"})),
            )
            .await
            .unwrap();
        assert_eq!(entry.contents, json!([{"a": 1}]));
        assert_eq!(api.queries()[0].1.start_time, "2024-01-01T00:00:00Z");
    }

    #[tokio::test]
    async fn test_cloudtrail_rejects_injected_ids() {
        let (handlers, api) = handlers(MockLaceworkApi::new().with_query_rows(vec![json!({"a": 1})]));

        for bad in [
            json!({"account_id": "123' or E.EVENT:recipientAccountId <> '0"}),
            json!({"account_id": "12345"}),
            json!({"account_id": "123456789012", "principal_id": "x' or '1' = '1"}),
            json!({"account_id": "123456789012", "principal_id": "x\\"}),
        ] {
            let err = handlers
                .handle(CommandName::CloudTrailSearch, &args(bad.clone()))
                .await
                .unwrap_err();
            assert!(matches!(err, AdapterError::InvalidArgument(_)), "{bad} accepted");
        }
        assert!(api.queries().is_empty());

        handlers
            .handle(
                CommandName::CloudTrailSearch,
                &args(json!({"account_id": "123456789012", "principal_id": "AIDAEXAMPLE"})),
            )
            .await
            .unwrap();
        assert_eq!(api.queries().len(), 1);
    }
}
