//! Host-facing result entries.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Entry kind as understood by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryType {
    Note,
    File,
    Error,
}

impl EntryType {
    pub const fn code(self) -> u8 {
        match self {
            Self::Note => 1,
            Self::File => 3,
            Self::Error => 4,
        }
    }
}

impl Serialize for EntryType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

/// Content encodings used in an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentFormat {
    Json,
    Text,
    Markdown,
}

/// A result entry: raw contents, markdown rendering and context data.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResultEntry {
    #[serde(rename = "Type")]
    pub entry_type: EntryType,
    pub contents_format: ContentFormat,
    pub contents: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readable_contents_format: Option<ContentFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub human_readable: Option<String>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub entry_context: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(rename = "FileID", skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
}

impl ResultEntry {
    /// A markdown note with context data.
    pub fn note(contents: Value, human_readable: String, entry_context: Map<String, Value>) -> Self {
        Self {
            entry_type: EntryType::Note,
            contents_format: ContentFormat::Json,
            contents,
            readable_contents_format: Some(ContentFormat::Markdown),
            human_readable: Some(human_readable),
            entry_context,
            file: None,
            file_id: None,
        }
    }

    /// A plain-text error entry.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            entry_type: EntryType::Error,
            contents_format: ContentFormat::Text,
            contents: Value::String(message.into()),
            readable_contents_format: None,
            human_readable: None,
            entry_context: Map::new(),
            file: None,
            file_id: None,
        }
    }

    /// A file entry pointing at content written by the adapter.
    pub fn file(name: impl Into<String>, file_id: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            entry_type: EntryType::File,
            contents_format: ContentFormat::Text,
            contents: Value::String(String::new()),
            readable_contents_format: None,
            human_readable: None,
            entry_context: Map::new(),
            file: Some(name),
            file_id: Some(file_id.into()),
        }
    }

    pub const fn is_error(&self) -> bool {
        matches!(self.entry_type, EntryType::Error)
    }
}
