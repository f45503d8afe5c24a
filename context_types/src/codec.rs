//! JSON encoding of editor contexts
//!
//! Decoding is strict about shape: wrong types, missing fields, unknown
//! mode tags, malformed terminal sizes and a buffer id repeated inside
//! `buffers` all fail with `MalformedContext`, never coerced. Unknown extra fields are ignored so
//! newer producers remain readable.

use crate::context::EditorContext;
use crate::error::ContextResult;
use crate::validate::{Validated, ValidationPolicy};
use serde_json::Value;
use tracing::debug;

/// Encodes a context as compact JSON
pub fn encode(context: &EditorContext) -> ContextResult<Vec<u8>> {
    Ok(serde_json::to_vec(context)?)
}

/// Encodes a context as indented JSON
pub fn encode_pretty(context: &EditorContext) -> ContextResult<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(context)?)
}

pub fn to_value(context: &EditorContext) -> ContextResult<Value> {
    Ok(serde_json::to_value(context)?)
}

/// Decodes a context, checking shape only
pub fn decode(bytes: &[u8]) -> ContextResult<EditorContext> {
    let context: EditorContext = serde_json::from_slice(bytes)?;
    debug!(
        buffers = context.buffers().len(),
        shown = context.buffers_to_show().len(),
        "decoded snapshot"
    );
    Ok(context)
}

pub fn from_value(value: Value) -> ContextResult<EditorContext> {
    Ok(serde_json::from_value(value)?)
}

/// Decodes a context and applies a validation policy
pub fn decode_with(bytes: &[u8], policy: ValidationPolicy) -> ContextResult<Validated> {
    policy.enforce(decode(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TerminalSize;
    use crate::mode::EditorMode;
    use serde_json::json;

    fn minimal() -> Value {
        json!({
            "buffers": {},
            "buffersToShow": [],
            "focusBuffer": "",
            "editorMode": "Normal",
            "terminalSize": [0, 0],
            "commandsHist": []
        })
    }

    #[test]
    fn test_decode_minimal() {
        let ctx = from_value(minimal()).unwrap();
        assert_eq!(ctx, EditorContext::empty());
    }

    #[test]
    fn test_missing_field_is_malformed() {
        for field in [
            "buffers",
            "buffersToShow",
            "focusBuffer",
            "editorMode",
            "terminalSize",
            "commandsHist",
        ] {
            let mut value = minimal();
            value.as_object_mut().unwrap().remove(field);
            let err = from_value(value).unwrap_err();
            assert!(err.is_malformed(), "{} should be required", field);
        }
    }

    #[test]
    fn test_wrong_types_are_malformed() {
        let mut value = minimal();
        value["focusBuffer"] = json!(7);
        assert!(from_value(value).unwrap_err().is_malformed());

        let mut value = minimal();
        value["commandsHist"] = json!("q");
        assert!(from_value(value).unwrap_err().is_malformed());

        let mut value = minimal();
        value["buffers"] = json!({ "main": 1 });
        assert!(from_value(value).unwrap_err().is_malformed());
    }

    #[test]
    fn test_snake_case_names_rejected() {
        let value = json!({
            "buffers": {},
            "buffers_to_show": [],
            "focus_buffer": "",
            "editor_mode": "Normal",
            "terminal_size": [0, 0],
            "commands_hist": []
        });
        assert!(from_value(value).unwrap_err().is_malformed());
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let mut value = minimal();
        value["revision"] = json!(3);
        assert!(from_value(value).is_ok());
    }

    #[test]
    fn test_duplicate_buffer_id_is_malformed() {
        let bytes = br#"{
            "buffers": { "main": null, "main": null },
            "buffersToShow": [],
            "focusBuffer": "",
            "editorMode": "Normal",
            "terminalSize": [0, 0],
            "commandsHist": []
        }"#;
        let err = decode(bytes).unwrap_err();
        assert!(err.is_malformed());
        assert!(err.to_string().contains("duplicate buffer id \"main\""));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode(b"not json").unwrap_err().is_malformed());
        assert!(decode(b"").unwrap_err().is_malformed());
        assert!(decode(b"[]").unwrap_err().is_malformed());
    }

    #[test]
    fn test_encode_field_names() {
        let value = to_value(&EditorContext::empty()).unwrap();
        assert_eq!(value, minimal());
    }

    #[test]
    fn test_pretty_and_compact_agree() {
        let ctx = EditorContext::new(
            Default::default(),
            Vec::new(),
            "",
            EditorMode::Command,
            TerminalSize::new(120, 40),
            vec!["wq".into()],
        );
        let compact = decode(&encode(&ctx).unwrap()).unwrap();
        let pretty = decode(&encode_pretty(&ctx).unwrap()).unwrap();
        assert_eq!(compact, pretty);
    }

    #[test]
    fn test_decode_with_policy() {
        let mut value = minimal();
        value["buffersToShow"] = json!(["main"]);
        value["focusBuffer"] = json!("main");
        let bytes = serde_json::to_vec(&value).unwrap();

        let err = decode_with(&bytes, ValidationPolicy::Strict).unwrap_err();
        assert!(err.is_inconsistent());

        let validated = decode_with(&bytes, ValidationPolicy::Lenient).unwrap();
        assert_eq!(validated.repairs.len(), 1);
        assert!(validated.context.buffer("main").unwrap().is_unset());
    }
}
