//! Result shaping for the host.
//!
//! Turns raw vendor JSON into a [`ResultEntry`]: the data goes into the
//! contents and the context map untouched, and a markdown table is rendered
//! for humans.

use std::fmt::Write as _;

use comfy_table::{presets, Cell, ContentArrangement, Table};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::domain::models::ResultEntry;

/// Human-readable text for an empty result.
pub const NO_RESULTS: &str = "No results were found";

/// Key under which a vulnerability fingerprint is stored.
pub const FINGERPRINT_KEY: &str = "vulnHash";

/// Builds host entries from vendor data.
pub struct ResultFormatter;

impl ResultFormatter {
    /// Build a note entry for `data`.
    ///
    /// The markdown table is rendered from `human_override` when given,
    /// otherwise from `data`. Empty data always renders [`NO_RESULTS`].
    pub fn entry(
        title: &str,
        data: Value,
        context_key: &str,
        human_override: Option<&Value>,
    ) -> ResultEntry {
        let human_readable = if is_empty_result(&data) {
            NO_RESULTS.to_string()
        } else {
            markdown_table(title, human_override.unwrap_or(&data))
        };

        let mut context = Map::new();
        context.insert(context_key.to_string(), data.clone());
        ResultEntry::note(data, human_readable, context)
    }
}

/// True for null, blank strings, and empty arrays or objects.
pub fn is_empty_result(data: &Value) -> bool {
    match data {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Render `data` as `### title` followed by a markdown table.
///
/// Objects become one row each; scalars land in a single `Value` column.
/// Columns appear in first-seen order across all rows.
pub fn markdown_table(title: &str, data: &Value) -> String {
    let rows = table_rows(data);
    if rows.is_empty() {
        return format!("### {title}\n**No entries.**\n");
    }

    let mut headers: Vec<String> = Vec::new();
    for row in &rows {
        for key in row.keys() {
            if !headers.iter().any(|h| h == key) {
                headers.push(key.clone());
            }
        }
    }

    let mut table = Table::new();
    table
        .load_preset(presets::ASCII_MARKDOWN)
        .set_content_arrangement(ContentArrangement::Disabled)
        .set_header(headers.iter().map(|h| Cell::new(escape_cell(h))));

    for row in &rows {
        table.add_row(
            headers
                .iter()
                .map(|h| Cell::new(row.get(h).map(render_cell).unwrap_or_default())),
        );
    }

    format!("### {title}\n{table}\n")
}

fn table_rows(data: &Value) -> Vec<Map<String, Value>> {
    let scalar_row = |value: &Value| {
        let mut row = Map::new();
        row.insert("Value".to_string(), value.clone());
        row
    };

    match data {
        Value::Null => Vec::new(),
        Value::Object(map) => vec![map.clone()],
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Object(map) => map.clone(),
                other => scalar_row(other),
            })
            .collect(),
        other => vec![scalar_row(other)],
    }
}

fn render_cell(value: &Value) -> String {
    let text = match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(_) | Value::Number(_) | Value::Array(_) | Value::Object(_) => value.to_string(),
    };
    escape_cell(&text)
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
        .replace("\r\n", "<br>")
        .replace('\n', "<br>")
}

/// Lower-hex SHA-256 of the record's canonical JSON (sorted keys, compact).
pub fn fingerprint(record: &Value) -> String {
    let digest = Sha256::digest(canonical(record).to_string().as_bytes());
    digest.iter().fold(String::with_capacity(64), |mut out, byte| {
        let _ = write!(out, "{byte:02x}");
        out
    })
}

/// Store a fingerprint under `vulnHash` in every object row.
///
/// Any existing `vulnHash` is ignored when hashing so that repeated calls
/// give the same value.
pub fn add_fingerprints(rows: &mut [Value]) {
    for row in rows.iter_mut() {
        let Value::Object(map) = row else {
            continue;
        };
        map.remove(FINGERPRINT_KEY);
        let hash = fingerprint(&Value::Object(map.clone()));
        map.insert(FINGERPRINT_KEY.to_string(), Value::String(hash));
    }
}

fn canonical(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let sorted = keys
                .into_iter()
                .map(|k| (k.clone(), canonical(&map[k])))
                .collect::<Map<String, Value>>();
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonical).collect()),
        other => other.clone(),
    }
}
