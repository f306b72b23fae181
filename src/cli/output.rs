//! Output formatting for the host.
//!
//! Stdout carries exactly one JSON document per run; logs go elsewhere.

use serde_json::Value;

use crate::cli::command_dispatcher::CommandOutcome;
use crate::domain::errors::AdapterError;
use crate::domain::models::ResultEntry;

pub trait CommandOutput {
    fn to_human(&self) -> String;
    fn to_json(&self) -> Value;
}

impl CommandOutput for CommandOutcome {
    fn to_human(&self) -> String {
        match self {
            Self::Ok => "ok".to_string(),
            Self::Entry(entry) => entry.to_human(),
            Self::Incidents(outcome) => format!(
                "{} new incident(s); cursor at alert {}",
                outcome.incidents.len(),
                outcome.cursor
            ),
        }
    }

    fn to_json(&self) -> Value {
        self.payload()
    }
}

impl CommandOutput for ResultEntry {
    fn to_human(&self) -> String {
        self.human_readable.clone().unwrap_or_else(|| match &self.contents {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Render `result` for stdout.
pub fn render<T: CommandOutput>(result: &T, human: bool) -> String {
    if human {
        result.to_human()
    } else {
        serde_json::to_string(&result.to_json()).unwrap_or_default()
    }
}

pub fn output<T: CommandOutput>(result: &T, human: bool) {
    println!("{}", render(result, human));
}

/// Print `err` as an error entry.
pub fn output_error(err: &AdapterError, human: bool) {
    output(&ResultEntry::error(err.to_string()), human);
}
