//! Incident polling.
//!
//! Each run loads the cursor, pulls alerts for the lookback window, keeps
//! those at or above the severity threshold with an id beyond the cursor,
//! fetches their details and turns them into incidents. The cursor is
//! written once, after every detail fetch has succeeded.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::domain::errors::AdapterResult;
use crate::domain::models::{tag_doc_url, Alert, Incident, Severity};
use crate::domain::ports::{CursorStore, LaceworkApi};
use crate::services::search_runner::{SearchRunner, VendorContext};
use crate::services::time_window::TimeWindow;

/// Detail scope requested for every polled alert.
pub const DETAILS_SCOPE: &str = "Details";

/// Incidents produced by one run and the cursor after it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollOutcome {
    pub incidents: Vec<Incident>,
    pub cursor: u64,
}

/// Turns new Lacework alerts into host incidents.
pub struct IncidentPoller {
    api: Arc<dyn LaceworkApi>,
    store: Arc<dyn CursorStore>,
    threshold: Severity,
    lookback_days: u32,
}

impl IncidentPoller {
    pub fn new(
        api: Arc<dyn LaceworkApi>,
        store: Arc<dyn CursorStore>,
        threshold: Severity,
        lookback_days: u32,
    ) -> Self {
        Self {
            api,
            store,
            threshold,
            lookback_days,
        }
    }

    /// Run one polling pass as of `now`.
    #[instrument(skip(self), fields(threshold = %self.threshold, lookback_days = self.lookback_days))]
    pub async fn poll(&self, now: DateTime<Utc>) -> AdapterResult<PollOutcome> {
        let cursor = self.store.load().await?;
        let window = TimeWindow::last_days(self.lookback_days).resolve(now)?;
        let context = VendorContext::new("Unable to retrieve Lacework alerts", tag_doc_url("Alerts"));

        let first = self
            .api
            .alerts(&window)
            .await
            .map_err(|e| context.wrap(e))?;
        let listed = SearchRunner::new(self.api.clone())
            .drain(first, usize::MAX, &context)
            .await?;
        debug!(alerts = listed.total, cursor, "alerts listed");

        let mut incidents = Vec::new();
        let mut next_cursor = cursor;

        for raw in listed.rows {
            let alert: Alert = serde_json::from_value(raw)?;
            let severity: Severity = alert.severity.parse()?;
            if !severity.meets(self.threshold) || alert.alert_id <= cursor {
                continue;
            }

            let details = self.details(&alert, &context).await?;
            incidents.push(Incident::from_alert(&alert, &details)?);
            next_cursor = next_cursor.max(alert.alert_id);
        }

        if next_cursor != cursor {
            self.store.save(next_cursor).await?;
        }

        info!(
            incidents = incidents.len(),
            previous_cursor = cursor,
            cursor = next_cursor,
            "poll complete"
        );
        Ok(PollOutcome {
            incidents,
            cursor: next_cursor,
        })
    }

    async fn details(&self, alert: &Alert, context: &VendorContext) -> AdapterResult<Value> {
        self.api
            .alert_details(&alert.alert_id.to_string(), DETAILS_SCOPE)
            .await
            .map_err(|e| context.wrap(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::lacework::MockLaceworkApi;
    use crate::adapters::state::MemoryCursorStore;
    use crate::domain::errors::AdapterError;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
    }

    fn alert(id: u64, severity: &str, kind: &str) -> Value {
        json!({
            "alertId": id,
            "severity": severity,
            "alertType": kind,
            "startTime": format!("2024-01-15T0{}:00:00.000Z", id % 10),
        })
    }

    fn scenario() -> MockLaceworkApi {
        MockLaceworkApi::new()
            .with_alerts(vec![
                alert(5, "Critical", "NewViolations"),
                alert(7, "Low", "ChangedFile"),
                alert(9, "High", "SuspiciousLogin"),
            ])
            .with_details("9", json!({"alertId": 9, "entityMap": {"User": []}}))
    }

    fn poller(
        mock: MockLaceworkApi,
        cursor: u64,
        threshold: Severity,
    ) -> (IncidentPoller, Arc<MockLaceworkApi>, Arc<MemoryCursorStore>) {
        let api = Arc::new(mock);
        let store = Arc::new(MemoryCursorStore::new(cursor));
        (
            IncidentPoller::new(api.clone(), store.clone(), threshold, 1),
            api,
            store,
        )
    }

    #[tokio::test]
    async fn test_emits_alerts_meeting_threshold() {
        let (poller, api, store) = poller(scenario(), 0, Severity::High);

        let outcome = poller.poll(now()).await.unwrap();

        let names: Vec<&str> = outcome.incidents.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Lacework Event: NewViolations", "Lacework Event: SuspiciousLogin"]
        );
        assert_eq!(outcome.cursor, 9);
        assert_eq!(store.current(), 9);
        assert_eq!(store.save_count(), 1);
        assert_eq!(api.call_count("alert_details"), 2);
        assert!(api.calls().contains(&"alert_details 9 Details".to_string()));
    }

    #[tokio::test]
    async fn test_incident_carries_details_and_start_time() {
        let (poller, _, _) = poller(scenario(), 6, Severity::High);

        let outcome = poller.poll(now()).await.unwrap();

        assert_eq!(outcome.incidents.len(), 1);
        let incident = &outcome.incidents[0];
        assert_eq!(incident.occurred, "2024-01-15T09:00:00.000Z");
        let raw: Value = serde_json::from_str(&incident.raw_json).unwrap();
        assert_eq!(raw, json!({"alertId": 9, "entityMap": {"User": []}}));
    }

    #[tokio::test]
    async fn test_repeat_run_is_idempotent() {
        let (poller, _, store) = poller(scenario(), 0, Severity::High);

        poller.poll(now()).await.unwrap();
        let second = poller.poll(now()).await.unwrap();

        assert!(second.incidents.is_empty());
        assert_eq!(second.cursor, 9);
        // Unchanged cursor is not rewritten.
        assert_eq!(store.save_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_alert_set_keeps_cursor() {
        let (poller, api, store) = poller(MockLaceworkApi::new(), 42, Severity::Info);

        let outcome = poller.poll(now()).await.unwrap();

        assert!(outcome.incidents.is_empty());
        assert_eq!(outcome.cursor, 42);
        assert_eq!(store.save_count(), 0);
        assert_eq!(api.call_count("alert_details"), 0);
    }

    #[tokio::test]
    async fn test_filtered_alerts_do_not_move_cursor() {
        let mock = MockLaceworkApi::new().with_alerts(vec![
            alert(3, "High", "A"),
            alert(11, "Info", "B"),
        ]);
        let (poller, _, store) = poller(mock, 0, Severity::High);

        let outcome = poller.poll(now()).await.unwrap();

        assert_eq!(outcome.incidents.len(), 1);
        assert_eq!(store.current(), 3);
    }

    #[tokio::test]
    async fn test_string_ids_and_multiple_pages() {
        let mock = MockLaceworkApi::new().with_alert_pages(vec![
            vec![json!({"alertId": "12", "severity": "critical", "alertType": "A", "startTime": "t1"})],
            vec![json!({"alertId": "15", "severity": "MEDIUM", "alertType": "B", "startTime": "t2"})],
        ]);
        let (poller, api, _) = poller(mock, 10, Severity::Medium);

        let outcome = poller.poll(now()).await.unwrap();

        assert_eq!(outcome.incidents.len(), 2);
        assert_eq!(outcome.cursor, 15);
        assert_eq!(api.call_count("next_page"), 1);
    }

    #[tokio::test]
    async fn test_unknown_alert_severity_fails_run() {
        let mock = MockLaceworkApi::new().with_alerts(vec![
            alert(5, "Critical", "A"),
            alert(6, "Severe", "B"),
        ]);
        let (poller, _, store) = poller(mock, 0, Severity::High);

        let err = poller.poll(now()).await.unwrap_err();

        assert!(matches!(err, AdapterError::InvalidSeverity(ref s) if s == "Severe"));
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test]
    async fn test_detail_failure_leaves_cursor_untouched() {
        let (poller, _, store) = poller(scenario().with_failing_details("9"), 0, Severity::High);

        let err = poller.poll(now()).await.unwrap_err();

        assert!(matches!(err, AdapterError::VendorApi { .. }));
        assert_eq!(store.current(), 0);
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test]
    async fn test_window_uses_lookback_days() {
        let api = Arc::new(MockLaceworkApi::new());
        let store = Arc::new(MemoryCursorStore::new(0));
        let poller = IncidentPoller::new(api.clone(), store, Severity::High, 3);

        poller.poll(now()).await.unwrap();

        assert_eq!(
            api.calls()[0],
            "alerts 2024-01-12T12:00:00Z 2024-01-15T12:00:00Z"
        );
    }

    #[tokio::test]
    async fn test_unrepresentable_lookback_fails_without_calls() {
        let api = Arc::new(scenario());
        let store = Arc::new(MemoryCursorStore::new(4));
        let poller = IncidentPoller::new(api.clone(), store.clone(), Severity::High, 100_000_000);

        let err = poller.poll(now()).await.unwrap_err();

        assert!(matches!(err, AdapterError::InvalidArgument(_)));
        assert_eq!(api.call_count("alerts"), 0);
        assert_eq!(store.save_count(), 0);
    }

    const LABELS: [&str; 5] =["critical", "high", "medium", "low", "info"];

    proptest! {
        #[test]
        fn prop_cursor_is_monotonic(
            alerts in proptest::collection::vec((1u64..200, 0usize..5), 0..20),
            initial in 0u64..200,
            threshold in 0usize..5,
        ) {
            let threshold: Severity = LABELS[threshold].parse().unwrap();
            let rows = alerts
                .iter()
                .map(|(id, sev)| alert(*id, LABELS[*sev], "T"))
                .collect();
            let (poller, _, store) = poller(
                MockLaceworkApi::new().with_alerts(rows),
                initial,
                threshold,
            );

            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let outcome = rt.block_on(poller.poll(now())).unwrap();

            let qualifying: Vec<u64> = alerts
                .iter()
                .filter(|(id, sev)| *id > initial && LABELS[*sev].parse::<Severity>().unwrap().meets(threshold))
                .map(|(id, _)| *id)
                .collect();
            prop_assert!(outcome.cursor >= initial);
            prop_assert_eq!(outcome.incidents.len(), qualifying.len());
            prop_assert_eq!(outcome.cursor, qualifying.iter().copied().max().unwrap_or(initial));
            prop_assert_eq!(store.current(), outcome.cursor);
        }
    }
}
