//! Recovery of JSON records from model replies.
//!
//! Replies are supposed to be a JSON object or a list of objects, but the
//! model sometimes wraps them in code fences or surrounds them with prose.
//! Precedence is fixed: direct parse, then the first list-of-objects
//! pattern, then the first object pattern, then failure.
//!
//! The pattern scan is greedy across the whole text, so a reply containing
//! two separate JSON-like fragments can be mis-bracketed. That case ends in
//! a recovery error rather than a guess.

use crate::domain::model::{ModelReply, Record};
use crate::utils::error::{EtlError, Result};
use regex::Regex;

const SHORT_EXCERPT: usize = 100;
const LONG_EXCERPT: usize = 200;

pub struct JsonRecovery {
    list_pattern: Regex,
    object_pattern: Regex,
}

impl JsonRecovery {
    pub fn new() -> Result<Self> {
        Ok(Self {
            list_pattern: Regex::new(r"(?s)\[\s*\{.*\}\s*\]")?,
            object_pattern: Regex::new(r"(?s)\{.*\}")?,
        })
    }

    /// Turns a raw reply into records. `document` only feeds error messages.
    pub fn recover(&self, text: &str, document: &str) -> Result<Vec<Record>> {
        let text = strip_code_fences(text);

        let parse_error = match serde_json::from_str::<serde_json::Value>(text) {
            Ok(value) => return accept(value, text, document),
            Err(e) => e,
        };

        tracing::debug!(
            "Direct JSON parse failed for {}: {}. Looking for embedded JSON",
            document,
            parse_error
        );

        let candidate = self
            .list_pattern
            .find(text)
            .or_else(|| self.object_pattern.find(text))
            .map(|m| m.as_str())
            .ok_or_else(|| EtlError::JsonRecoveryError {
                document: document.to_string(),
                reason: format!("no JSON structure found ({parse_error})"),
                excerpt: excerpt(text, LONG_EXCERPT),
            })?;

        let value = serde_json::from_str::<serde_json::Value>(candidate).map_err(|e| {
            EtlError::JsonRecoveryError {
                document: document.to_string(),
                reason: format!("embedded JSON is malformed: {e}"),
                excerpt: excerpt(candidate, SHORT_EXCERPT),
            }
        })?;

        let records = accept(value, candidate, document)?;
        tracing::info!(
            "Recovered embedded JSON for {} ({} record(s))",
            document,
            records.len()
        );
        Ok(records)
    }
}

fn accept(value: serde_json::Value, text: &str, document: &str) -> Result<Vec<Record>> {
    ModelReply::try_from(value)
        .map(ModelReply::into_records)
        .map_err(|found| EtlError::SchemaMismatchError {
            document: document.to_string(),
            found,
            excerpt: excerpt(text, SHORT_EXCERPT),
        })
}

/// Removes a surrounding markdown code fence, with or without a language tag.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest
        .trim_start_matches(|c: char| c.is_ascii_alphanumeric())
        .trim();
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// First `max_chars` characters of `text`, marked when cut.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recovery() -> JsonRecovery {
        JsonRecovery::new().unwrap()
    }

    #[test]
    fn test_strip_json_fence() {
        assert_eq!(
            strip_code_fences("```json\n{\"ClaimNumber\":\"X\"}\n```"),
            "{\"ClaimNumber\":\"X\"}"
        );
    }

    #[test]
    fn test_strip_bare_fence_and_unfenced_text() {
        assert_eq!(strip_code_fences("```\n[{}]\n```"), "[{}]");
        assert_eq!(strip_code_fences("  {\"a\": 1}  "), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}"), "{\"a\": 1}");
    }

    #[test]
    fn test_fenced_object_parses_to_single_record() {
        let records = recovery()
            .recover("```json\n{\"ClaimNumber\":\"X\"}\n```", "a.pdf")
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("ClaimNumber").unwrap(), "X");
    }

    #[test]
    fn test_direct_list_parses_every_object() {
        let records = recovery()
            .recover(r#"[{"Insured": "A"}, {"Insured": "B"}]"#, "a.pdf")
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].get("Insured").unwrap(), "B");
    }

    #[test]
    fn test_embedded_object_is_recovered() {
        let records = recovery()
            .recover(
                "Here is the result: {\"Insured\": \"Jane Doe\"} Thank you.",
                "a.pdf",
            )
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("Insured").unwrap(), "Jane Doe");
    }

    #[test]
    fn test_embedded_list_wins_over_object() {
        let text = "Result:\n[{\"Incident\": \"Theft\"}, {\"Incident\": \"Fire\"}]\nDone.";
        let records = recovery().recover(text, "a.pdf").unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_no_structure_names_document() {
        let err = recovery()
            .recover("I could not read this report.", "broken.pdf")
            .unwrap_err();
        match err {
            EtlError::JsonRecoveryError {
                document, excerpt, ..
            } => {
                assert_eq!(document, "broken.pdf");
                assert!(excerpt.starts_with("I could not"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_two_fragments_are_mis_bracketed() {
        let err = recovery()
            .recover("first {\"a\": 1} then {\"b\": 2}", "a.pdf")
            .unwrap_err();
        assert!(matches!(err, EtlError::JsonRecoveryError { .. }));
    }

    #[test]
    fn test_scalar_reply_is_schema_mismatch() {
        let err = recovery().recover("\"just a string\"", "a.pdf").unwrap_err();
        assert!(matches!(err, EtlError::SchemaMismatchError { ref found, .. } if found == "a string"));
    }

    #[test]
    fn test_list_of_scalars_is_schema_mismatch() {
        let err = recovery().recover("[1, 2, 3]", "a.pdf").unwrap_err();
        assert!(matches!(err, EtlError::SchemaMismatchError { .. }));
    }

    #[test]
    fn test_excerpt_cuts_on_char_boundary() {
        assert_eq!(excerpt("short", 10), "short");
        assert_eq!(excerpt("ééééé", 2), "éé...");
    }
}
