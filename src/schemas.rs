//! Structured-output contract for the analysis call
//!
//! The schema uses the OpenAPI subset Gemini accepts as `responseSchema`.
//! [`validate`] checks a decoded payload against that same subset so a reply
//! missing required keys is rejected before anything downstream sees it.

use serde_json::{Value, json};
use thiserror::Error;

fn string_array() -> Value {
    json!({ "type": "ARRAY", "items": { "type": "STRING" } })
}

/// `responseSchema` for the analysis call; every property is required.
pub fn analysis_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "strategicAdvice": {
                "type": "OBJECT",
                "properties": {
                    "permissionCheck": { "type": "STRING" },
                    "segmentationSuggestions": string_array()
                },
                "required": ["permissionCheck", "segmentationSuggestions"]
            },
            "feedback": {
                "type": "OBJECT",
                "properties": {
                    "good": string_array(),
                    "improvements": string_array(),
                    "checklist": string_array()
                },
                "required": ["good", "improvements", "checklist"]
            },
            "optimizedDraft": {
                "type": "OBJECT",
                "properties": {
                    "subjectLines": string_array(),
                    "preheader": { "type": "STRING" },
                    "content": { "type": "STRING" }
                },
                "required": ["subjectLines", "preheader", "content"]
            }
        },
        "required": ["strategicAdvice", "feedback", "optimizedDraft"]
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaViolation {
    #[error("{path}: missing required key")]
    Missing { path: String },
    #[error("{path}: expected {expected}, found {found}")]
    WrongType {
        path: String,
        expected: String,
        found: &'static str,
    },
}

impl SchemaViolation {
    pub fn path(&self) -> &str {
        match self {
            SchemaViolation::Missing { path } | SchemaViolation::WrongType { path, .. } => path,
        }
    }
}

/// Check `value` against a schema built from OBJECT/ARRAY/STRING/NUMBER/
/// INTEGER/BOOLEAN nodes. Required keys are checked before descending.
pub fn validate(value: &Value, schema: &Value) -> Result<(), SchemaViolation> {
    validate_at(value, schema, "$")
}

fn validate_at(value: &Value, schema: &Value, path: &str) -> Result<(), SchemaViolation> {
    let expected = schema["type"].as_str().unwrap_or("");
    let ok = match expected {
        "OBJECT" => value.is_object(),
        "ARRAY" => value.is_array(),
        "STRING" => value.is_string(),
        "NUMBER" => value.is_number(),
        "INTEGER" => value.is_i64() || value.is_u64(),
        "BOOLEAN" => value.is_boolean(),
        // untyped node accepts anything
        _ => true,
    };
    if !ok {
        return Err(SchemaViolation::WrongType {
            path: path.to_string(),
            expected: expected.to_string(),
            found: json_type_name(value),
        });
    }

    if let Some(obj) = value.as_object() {
        if let Some(required) = schema["required"].as_array() {
            for key in required.iter().filter_map(Value::as_str) {
                if !obj.contains_key(key) {
                    return Err(SchemaViolation::Missing {
                        path: child_path(path, key),
                    });
                }
            }
        }
        if let Some(props) = schema["properties"].as_object() {
            for (key, prop_schema) in props {
                if let Some(child) = obj.get(key) {
                    validate_at(child, prop_schema, &child_path(path, key))?;
                }
            }
        }
    }

    if let (Some(items), Some(item_schema)) = (value.as_array(), schema.get("items")) {
        for (i, item) in items.iter().enumerate() {
            validate_at(item, item_schema, &format!("{path}[{i}]"))?;
        }
    }

    Ok(())
}

fn child_path(parent: &str, key: &str) -> String {
    if parent == "$" {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
