//! Routes a host command name to its handler.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use crate::domain::errors::AdapterResult;
use crate::domain::models::{Config, ResultEntry, Severity};
use crate::domain::ports::{CursorStore, LaceworkApi};
use crate::services::{
    CommandArgs, CommandHandlers, CommandName, HandlerSettings, IncidentPoller, PollOutcome,
};

/// What a dispatched command hands back to the host.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    /// `test-module` succeeded.
    Ok,
    Entry(ResultEntry),
    Incidents(PollOutcome),
}

impl CommandOutcome {
    /// The host payload written to stdout.
    pub fn payload(&self) -> Value {
        match self {
            Self::Ok => json!("ok"),
            Self::Entry(entry) => serde_json::to_value(entry).unwrap_or(Value::Null),
            Self::Incidents(outcome) => json!({
                "incidents": outcome.incidents,
                "lastRun": {"max_alert_id": outcome.cursor},
            }),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Entry(entry) if entry.is_error())
    }
}

/// Dispatches host commands against one Lacework API connection.
pub struct CommandDispatcher {
    handlers: CommandHandlers,
    poller: IncidentPoller,
}

impl CommandDispatcher {
    /// Wire handlers and the poller from `config`.
    ///
    /// Fails with `InvalidSeverity` when the configured threshold is unknown.
    pub fn new(
        api: Arc<dyn LaceworkApi>,
        store: Arc<dyn CursorStore>,
        config: &Config,
    ) -> AdapterResult<Self> {
        let threshold: Severity = config.fetch.severity_threshold.parse()?;
        let settings = HandlerSettings {
            row_limit: config.row_limit,
            output_dir: config.output_dir.clone(),
        };

        Ok(Self {
            handlers: CommandHandlers::new(api.clone(), settings),
            poller: IncidentPoller::new(api, store, threshold, config.fetch.history_days),
        })
    }

    /// Run command `name` with the JSON argument object `args`.
    #[instrument(skip(self, args))]
    pub async fn dispatch(&self, name: &str, args: Value) -> AdapterResult<CommandOutcome> {
        let command: CommandName = name.parse()?;
        let args = CommandArgs::from_value(args)?;
        debug!(%command, "dispatching");

        match command {
            CommandName::TestModule => {
                self.handlers.test_module().await?;
                Ok(CommandOutcome::Ok)
            }
            CommandName::FetchIncidents => {
                let outcome = self.poller.poll(Utc::now()).await?;
                Ok(CommandOutcome::Incidents(outcome))
            }
            other => Ok(CommandOutcome::Entry(self.handlers.handle(other, &args).await?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::lacework::MockLaceworkApi;
    use crate::adapters::state::MemoryCursorStore;
    use crate::domain::errors::AdapterError;

    fn dispatcher(mock: MockLaceworkApi, cursor: u64) -> (CommandDispatcher, Arc<MemoryCursorStore>) {
        let store = Arc::new(MemoryCursorStore::new(cursor));
        let dispatcher =
            CommandDispatcher::new(Arc::new(mock), store.clone(), &Config::default()).unwrap();
        (dispatcher, store)
    }

    #[tokio::test]
    async fn test_unknown_command() {
        let (dispatcher, _) = dispatcher(MockLaceworkApi::new(), 0);
        let err = dispatcher.dispatch("lw-get-everything", json!({})).await.unwrap_err();
        assert!(matches!(err, AdapterError::UnknownCommand(ref name) if name == "lw-get-everything"));
    }

    #[tokio::test]
    async fn test_test_module_returns_ok() {
        let mock = MockLaceworkApi::new().with_profile(json!({
            "data": [{"username": "u", "url": "acme.lacework.net", "accounts": [{"accountName": "ACME"}]}]
        }));
        let (dispatcher, _) = dispatcher(mock, 0);
        let outcome = dispatcher.dispatch("test-module", Value::Null).await.unwrap();
        assert_eq!(outcome, CommandOutcome::Ok);
        assert_eq!(outcome.payload(), json!("ok"));
    }

    #[tokio::test]
    async fn test_fetch_incidents_payload() {
        let mock = MockLaceworkApi::new().with_alerts(vec![
            json!({"alertId": 40, "severity": "Critical", "alertType": "NewUser", "startTime": "t"}),
            json!({"alertId": 41, "severity": "Low", "alertType": "Noise", "startTime": "t"}),
        ]);
        let (dispatcher, store) = dispatcher(mock, 39);

        let outcome = dispatcher.dispatch("fetch-incidents", json!({})).await.unwrap();

        let payload = outcome.payload();
        assert_eq!(payload["lastRun"]["max_alert_id"], 40);
        assert_eq!(payload["incidents"][0]["name"], "Lacework Event: NewUser");
        assert!(payload["incidents"][0]["rawJSON"].is_string());
        assert_eq!(payload["incidents"].as_array().unwrap().len(), 1);
        assert_eq!(store.current(), 40);
    }

    #[tokio::test]
    async fn test_entry_command() {
        let mock = MockLaceworkApi::new().with_gcp_projects(json!([
            {"organization": "org-1", "projects": ["p-1", "p-2"]}
        ]));
        let (dispatcher, _) = dispatcher(mock, 0);

        let outcome = dispatcher
            .dispatch(
                "lw-get-gcp-projects-by-organization",
                json!({"organization_id": "org-1"}),
            )
            .await
            .unwrap();

        let payload = outcome.payload();
        assert_eq!(payload["Type"], 1);
        assert_eq!(
            payload["EntryContext"]["Lacework.GCP(val.organization === obj.organization)"][0]
                ["organization"],
            "org-1"
        );
        assert!(payload["HumanReadable"]
            .as_str()
            .unwrap()
            .starts_with("### Google Cloud Platform Projects for Organization org-1"));
    }

    #[tokio::test]
    async fn test_compliance_error_entry_is_flagged() {
        let (dispatcher, _) = dispatcher(MockLaceworkApi::new(), 0);
        let outcome = dispatcher
            .dispatch("lw-get-gcp-compliance-assessment", json!({"project_id": "p"}))
            .await
            .unwrap();
        assert!(outcome.is_error());
    }

    #[test]
    fn test_bad_threshold_rejected() {
        let mut config = Config::default();
        config.fetch.severity_threshold = "severe".into();
        let result = CommandDispatcher::new(
            Arc::new(MockLaceworkApi::new()),
            Arc::new(MemoryCursorStore::new(0)),
            &config,
        );
        assert!(matches!(result, Err(AdapterError::InvalidSeverity(_))));
    }
}
