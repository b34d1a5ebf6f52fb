use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::{error, warn};

use crate::domain::reports::value_objects::ReportSummary;

/// Unquoted asterisk runs produced by redaction upstream, e.g. `"dob": ***`.
/// They make the stored text unparsable, so they are rewritten to a quoted
/// placeholder before parsing.
static REDACTED_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#":\s*\*+(\s*[,}\]])"#).expect("valid regex"));

/// Deserialize the stored previous-tests documents.
///
/// Read paths degrade gracefully: whatever is malformed is logged and
/// treated as "no data", never surfaced to the caller. Legacy rows store
/// the documents as a text blob (sometimes JSON-encoded twice); current
/// rows store the array directly.
pub fn parse_stored_reports(stored: Option<&Value>) -> Vec<Value> {
    match stored {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(reports)) => reports.clone(),
        Some(Value::String(raw)) => parse_report_text(raw),
        Some(other) => {
            warn!("Loaded reports is not a list: {}", type_name(other));
            Vec::new()
        }
    }
}

fn parse_report_text(raw: &str) -> Vec<Value> {
    if raw.is_empty() {
        return Vec::new();
    }

    let sanitized = REDACTED_TOKEN.replace_all(raw, r#": "REDACTED"$1"#);

    let parsed: Value = match serde_json::from_str(&sanitized) {
        Ok(value) => value,
        Err(err) => {
            error!("JSON decode error loading reports: {err}");
            return Vec::new();
        }
    };

    // Double-encoded text: a JSON string containing another JSON document.
    let parsed = match parsed {
        Value::String(inner) => match serde_json::from_str(&inner) {
            Ok(value) => value,
            Err(err) => {
                error!("JSON decode error loading reports: {err}");
                return Vec::new();
            }
        },
        other => other,
    };

    match parsed {
        Value::Array(reports) => reports,
        other => {
            warn!("Loaded reports is not a list: {}", type_name(&other));
            Vec::new()
        }
    }
}

/// Format stored documents for display: the tagged filename plus the FHIR
/// resource types found among the document keys.
pub fn summarize_reports(reports: &[Value]) -> Vec<ReportSummary> {
    reports
        .iter()
        .map(|report| match report {
            Value::Object(map) => {
                let file_name = map
                    .get("filename")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown")
                    .to_string();

                let mut resource_keys: Vec<&str> = map
                    .keys()
                    .filter(|key| {
                        key.as_str() != "filename"
                            && key.chars().next().is_some_and(char::is_uppercase)
                    })
                    .map(String::as_str)
                    .collect();
                resource_keys.sort_unstable();

                let resource_type = if resource_keys.is_empty() {
                    "Bundle".to_string()
                } else {
                    resource_keys.join(", ")
                };

                ReportSummary {
                    file_name,
                    resource_type,
                    content: report.clone(),
                }
            }
            other => ReportSummary {
                file_name: "Unknown".to_string(),
                resource_type: "Unknown".to_string(),
                content: other.clone(),
            },
        })
        .collect()
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
