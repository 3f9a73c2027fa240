use crate::domain::model::{MultiIncidentPolicy, OutputRow, Record};
use crate::domain::schema::{CLAIM_COLUMNS, CLAIM_NUMBER_FIELD, NULL_PLACEHOLDER};
use crate::utils::error::Result;
use regex::Regex;

/// Maps recovered records onto the fixed claim columns.
pub struct RowNormalizer {
    policy: MultiIncidentPolicy,
    merge_separator: String,
    error_marker: String,
    mobilt_claim: Regex,
    general_claim: Regex,
}

impl RowNormalizer {
    pub fn new(
        policy: MultiIncidentPolicy,
        merge_separator: impl Into<String>,
        error_marker: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            policy,
            merge_separator: merge_separator.into(),
            error_marker: error_marker.into(),
            mobilt_claim: Regex::new(r"GIT:\s*MOBILT-(\d+-\d+)\s*VERSION")?,
            general_claim: Regex::new(r"([A-Za-z]{1,3}\d{2}-\d+-\d+)")?,
        })
    }

    /// Rows for one document's records under the configured policy.
    pub fn rows_for(&self, records: &[Record], source: &str) -> Vec<OutputRow> {
        match self.policy {
            MultiIncidentPolicy::Rows => records
                .iter()
                .map(|record| self.normalize_row(record, source))
                .collect(),
            MultiIncidentPolicy::Merge if records.is_empty() => Vec::new(),
            MultiIncidentPolicy::Merge => vec![self.merge_rows(records, source)],
        }
    }

    pub fn normalize_row(&self, record: &Record, source: &str) -> OutputRow {
        let fields = CLAIM_COLUMNS
            .iter()
            .map(|column| {
                let value = normalize_value(record.get(column));
                if *column == CLAIM_NUMBER_FIELD {
                    self.reconcile_claim_number(value)
                } else {
                    value
                }
            })
            .collect();

        OutputRow {
            fields,
            source_file: source.to_string(),
        }
    }

    /// Placeholder row written when a document could not be processed.
    pub fn error_row(&self, source: &str) -> OutputRow {
        OutputRow {
            fields: vec![self.error_marker.clone(); CLAIM_COLUMNS.len()],
            source_file: source.to_string(),
        }
    }

    fn merge_rows(&self, records: &[Record], source: &str) -> OutputRow {
        let rows: Vec<OutputRow> = records
            .iter()
            .map(|record| self.normalize_row(record, source))
            .collect();

        let fields = (0..CLAIM_COLUMNS.len())
            .map(|i| {
                let mut values: Vec<&str> = Vec::new();
                for row in &rows {
                    let value = row.fields[i].as_str();
                    if value != NULL_PLACEHOLDER && !values.contains(&value) {
                        values.push(value);
                    }
                }
                if values.is_empty() {
                    NULL_PLACEHOLDER.to_string()
                } else {
                    values.join(self.merge_separator.as_str())
                }
            })
            .collect();

        OutputRow {
            fields,
            source_file: source.to_string(),
        }
    }

    fn reconcile_claim_number(&self, value: String) -> String {
        if let Some(caps) = self.mobilt_claim.captures(&value) {
            return caps[1].to_string();
        }
        if let Some(caps) = self.general_claim.captures(&value) {
            return caps[1].to_string();
        }
        value
    }
}

/// Stringifies one field value, collapsing every flavour of "nothing" to "null".
pub fn normalize_value(value: Option<&serde_json::Value>) -> String {
    let text = match value {
        None | Some(serde_json::Value::Null) => return NULL_PLACEHOLDER.to_string(),
        Some(serde_json::Value::String(s)) => s.trim().to_string(),
        // 巢狀值轉回精簡 JSON
        Some(other) => other.to_string(),
    };

    if is_placeholder(&text) {
        NULL_PLACEHOLDER.to_string()
    } else {
        text
    }
}

fn is_placeholder(text: &str) -> bool {
    text.is_empty() || text.eq_ignore_ascii_case("none") || text.eq_ignore_ascii_case("null")
}
