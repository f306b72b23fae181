//! Lacework alerts and the incidents created from them.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// An alert as returned by `GET /api/v2/Alerts`.
///
/// Only the fields the poller reasons about are typed; everything else
/// is kept verbatim in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    #[serde(deserialize_with = "deserialize_alert_id")]
    pub alert_id: u64,
    pub severity: String,
    #[serde(default)]
    pub alert_type: String,
    #[serde(default)]
    pub start_time: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The vendor sends ids as numbers in some payloads and numeric strings in others.
fn deserialize_alert_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Number(n) => Ok(n),
        RawId::Text(s) => s
            .trim()
            .parse::<u64>()
            .map_err(|e| serde::de::Error::custom(format!("invalid alertId '{s}': {e}"))),
    }
}

/// Host-side incident record built from a qualifying alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incident {
    pub name: String,
    pub occurred: String,
    #[serde(rename = "rawJSON")]
    pub raw_json: String,
}

impl Incident {
    /// Title prefix shared by every incident this adapter creates.
    pub const NAME_PREFIX: &'static str = "Lacework Event: ";

    /// Build an incident from an alert and its serialized details payload.
    pub fn from_alert(alert: &Alert, details: &Value) -> Result<Self, serde_json::Error> {
        Ok(Self {
            name: format!("{}{}", Self::NAME_PREFIX, alert.alert_type),
            occurred: alert.start_time.clone(),
            raw_json: serde_json::to_string(details)?,
        })
    }
}
