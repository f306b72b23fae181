//! Default start/end timestamps for vendor queries.

use chrono::{DateTime, Duration, Utc};

use crate::domain::errors::{AdapterError, AdapterResult};
use crate::domain::models::TimeFilter;

/// Timestamp format the Lacework API expects.
pub const LACEWORK_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Format a UTC instant with second precision.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(LACEWORK_DATE_FORMAT).to_string()
}

/// Builder for a query's time range.
///
/// Explicit bounds are passed through verbatim; missing ones default to
/// `now - span` and `now`.
#[derive(Debug, Clone)]
pub struct TimeWindow {
    start: Option<String>,
    end: Option<String>,
    span: Duration,
}

impl Default for TimeWindow {
    fn default() -> Self {
        Self {
            start: None,
            end: None,
            span: Duration::days(1),
        }
    }
}

impl TimeWindow {
    pub fn new(start: Option<String>, end: Option<String>) -> Self {
        Self {
            start: start.filter(|s| !s.trim().is_empty()),
            end: end.filter(|s| !s.trim().is_empty()),
            ..Self::default()
        }
    }

    /// Window covering the last `days` days.
    pub fn last_days(days: u32) -> Self {
        Self::default().with_span(Duration::days(i64::from(days)))
    }

    pub fn with_span(mut self, span: Duration) -> Self {
        self.span = span;
        self
    }

    /// Render both bounds relative to `now`.
    ///
    /// Fails when `now - span` falls outside the representable range.
    pub fn resolve(&self, now: DateTime<Utc>) -> AdapterResult<TimeFilter> {
        let start_time = match &self.start {
            Some(start) => start.clone(),
            None => {
                let start = now.checked_sub_signed(self.span).ok_or_else(|| {
                    AdapterError::InvalidArgument(format!(
                        "lookback of {} days reaches before the earliest supported date",
                        self.span.num_days()
                    ))
                })?;
                format_timestamp(start)
            }
        };

        Ok(TimeFilter {
            start_time,
            end_time: self.end.clone().unwrap_or_else(|| format_timestamp(now)),
        })
    }

    /// Render both bounds relative to the wall clock.
    pub fn resolve_now(&self) -> AdapterResult<TimeFilter> {
        self.resolve(Utc::now())
    }
}
