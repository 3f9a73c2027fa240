use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// One incident extracted from an assessor report, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub data: HashMap<String, serde_json::Value>,
}

impl Record {
    pub fn get(&self, field: &str) -> Option<&serde_json::Value> {
        self.data.get(field)
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for Record {
    fn from(obj: serde_json::Map<String, serde_json::Value>) -> Self {
        Self {
            data: obj.into_iter().collect(),
        }
    }
}

/// Accepted shapes of a model reply. Anything else is a schema mismatch.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelReply {
    Single(Record),
    Many(Vec<Record>),
}

impl ModelReply {
    pub fn into_records(self) -> Vec<Record> {
        match self {
            Self::Single(record) => vec![record],
            Self::Many(records) => records,
        }
    }
}

impl TryFrom<serde_json::Value> for ModelReply {
    /// Description of the shape that was found instead.
    type Error = String;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        match value {
            serde_json::Value::Object(obj) => Ok(Self::Single(obj.into())),
            serde_json::Value::Array(items) => {
                let mut records = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        serde_json::Value::Object(obj) => records.push(obj.into()),
                        other => {
                            return Err(format!(
                                "a list containing a non-object element ({})",
                                json_kind(&other)
                            ))
                        }
                    }
                }
                Ok(Self::Many(records))
            }
            other => Err(json_kind(&other).to_string()),
        }
    }
}

pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "a list",
        serde_json::Value::Object(_) => "an object",
    }
}

/// How a report describing several incidents turns into rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum MultiIncidentPolicy {
    /// One output row per recovered record.
    #[default]
    Rows,
    /// All recovered records of a document collapse into one row.
    Merge,
}

impl std::fmt::Display for MultiIncidentPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rows => write!(f, "rows"),
            Self::Merge => write!(f, "merge"),
        }
    }
}

/// Fixed-order projection of a record plus the document it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputRow {
    pub fields: Vec<String>,
    pub source_file: String,
}

impl OutputRow {
    pub fn to_csv_record(&self) -> Vec<&str> {
        self.fields
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.source_file.as_str()))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default)]
pub struct DocumentListing {
    pub documents: Vec<SourceDocument>,
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub json_response: bool,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            json_response: true,
        }
    }
}

/// A single call to the generative model: instructions plus one document.
#[derive(Debug, Clone)]
pub struct GenerationRequest<'a> {
    pub instruction: &'a str,
    pub payload: &'a [u8],
    pub mime_type: &'a str,
    pub params: GenerationParams,
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub rows: Vec<OutputRow>,
    pub incidents: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub output_path: String,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Rows taken from model replies; error rows are not counted.
    pub rows_extracted: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn attempted(&self) -> usize {
        self.succeeded + self.failed
    }

    /// Every data row in the output, one error row per failed document included.
    pub fn rows_written(&self) -> usize {
        self.rows_extracted + self.failed
    }
}
