//! Parse VLM output into a complete field map

use crate::error::ExtractorError;
use kartei_domain::{FieldMap, FieldSchema};
use serde_json::Value;
use tracing::debug;

/// Parse the model's message content into a field map for `schema`
///
/// Every configured field ends up in the map: missing keys and `null`
/// become an empty string, numbers and booleans keep their JSON text.
/// Nested arrays or objects for a configured field are rejected.
pub fn parse_fields(content: &str, schema: &FieldSchema) -> Result<FieldMap, ExtractorError> {
    let json_str = strip_code_fence(content);

    let json: Value = serde_json::from_str(json_str)?;

    let mut object = match json {
        Value::Object(map) => map,
        other => {
            return Err(ExtractorError::Parse(format!(
                "Expected JSON object, got {}",
                type_name(&other)
            )))
        }
    };

    // Reject unusable values before building anything; a record is
    // either complete or absent.
    for name in schema.names() {
        match object.get(name) {
            Some(value) if value.is_array() || value.is_object() => {
                return Err(ExtractorError::Parse(format!(
                    "Field '{}' holds {} instead of text",
                    name,
                    type_name(value)
                )));
            }
            _ => {}
        }
    }

    let fields = schema.field_map(|name| object.remove(name).map(into_text));

    if !object.is_empty() {
        let extra: Vec<&str> = object.keys().map(String::as_str).collect();
        debug!(?extra, "Dropping keys outside the schema");
    }

    Ok(fields)
}

/// Remove an optional markdown code fence around the content
///
/// Handles ```` ```json ````, bare ```` ``` ```` and a missing closing fence.
pub fn strip_code_fence(content: &str) -> &str {
    let mut trimmed = content.trim();

    if let Some(rest) = trimmed.strip_prefix("```json") {
        trimmed = rest;
    } else if let Some(rest) = trimmed.strip_prefix("```") {
        trimmed = rest;
    }
    if let Some(rest) = trimmed.strip_suffix("```") {
        trimmed = rest;
    }

    trimmed.trim()
}

fn into_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> FieldSchema {
        FieldSchema::new(["Komponist", "Signatur", "Titel"], ["Signatur", "Komponist"]).unwrap()
    }

    #[test]
    fn test_parse_valid_json() {
        let response = r#"{"Komponist": "Zimmermann, Rolf", "Signatur": "Spez.12.433", "Titel": ""}"#;

        let fields = parse_fields(response, &schema()).unwrap();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields.get("Komponist"), Some("Zimmermann, Rolf"));
        assert_eq!(fields.get("Signatur"), Some("Spez.12.433"));
        assert_eq!(fields.get("Titel"), Some(""));
    }

    #[test]
    fn test_parse_json_with_markdown_wrapper() {
        let response = "```json\n{\"Komponist\": \"Bach\", \"Signatur\": \"TOB 1728\", \"Titel\": \"x\"}\n```";

        let fields = parse_fields(response, &schema()).unwrap();
        assert_eq!(fields.get("Signatur"), Some("TOB 1728"));
    }

    #[test]
    fn test_missing_and_null_fields_become_empty() {
        let response = r#"{"Komponist": null}"#;

        let fields = parse_fields(response, &schema()).unwrap();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields.get("Komponist"), Some(""));
        assert_eq!(fields.get("Titel"), Some(""));
    }

    #[test]
    fn test_scalars_keep_json_text_and_extra_keys_dropped() {
        let response = r#"{"Titel": 42, "Signatur": true, "Unbekannt": "x"}"#;

        let fields = parse_fields(response, &schema()).unwrap();
        assert_eq!(fields.get("Titel"), Some("42"));
        assert_eq!(fields.get("Signatur"), Some("true"));
        assert_eq!(fields.get("Unbekannt"), None);
    }

    #[test]
    fn test_parse_invalid_json() {
        let result = parse_fields("Ich kann die Karte nicht lesen.", &schema());
        assert!(matches!(result, Err(ExtractorError::Parse(_))));
    }

    #[test]
    fn test_parse_json_not_object() {
        let result = parse_fields(r#"["Bach"]"#, &schema());
        match result {
            Err(ExtractorError::Parse(msg)) => assert!(msg.contains("an array")),
            other => panic!("Expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_nested_field_rejected() {
        let result = parse_fields(r#"{"Titel": {"de": "Lied"}}"#, &schema());
        assert!(matches!(result, Err(ExtractorError::Parse(_))));
    }

    #[test]
    fn test_strip_code_fence_variants() {
        assert_eq!(strip_code_fence(r#"{"k": "v"}"#), r#"{"k": "v"}"#);
        assert_eq!(strip_code_fence("```json\n{\"k\": 1}\n```"), "{\"k\": 1}");
        assert_eq!(strip_code_fence("```\n{\"k\": 1}\n```"), "{\"k\": 1}");
        assert_eq!(strip_code_fence("  ```json{\"k\": 1}```  "), "{\"k\": 1}");
        assert_eq!(strip_code_fence("```json\n{\"k\": 1}"), "{\"k\": 1}");
    }
}
