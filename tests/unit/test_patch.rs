//! Unit tests for the patch module
//!
//! Tests cover:
//! - Precedence of patch values over base values
//! - Base values filling missing and null keys at every depth
//! - Wholesale replacement of arrays and scalars
//! - Parse and shape errors naming the offending document

use serde_json::{json, Value};
use sg_cli::errors::{Document, PatchError};
use sg_cli::patch::{merge_documents, merge_values, patch_document, patch_json};

fn merged(base: &str, patch: &str) -> Value {
    serde_json::from_str(&patch_json(base, patch).unwrap()).unwrap()
}

// ============================================================================
// Merge semantics
// ============================================================================

mod merge_tests {
    use super::*;

    #[test]
    fn test_depth_one_precedence() {
        assert_eq!(
            merged(r#"{"a": 1, "b": 2}"#, r#"{"a": 10}"#),
            json!({"a": 10, "b": 2})
        );
    }

    #[test]
    fn test_nested_merge() {
        let base = r#"{"ResourceName": "vpc", "EnvironmentVariables": {"REGION": "eu-west-1", "STAGE": "dev"}}"#;
        let patch = r#"{"EnvironmentVariables": {"STAGE": "prod", "OWNER": "ops"}}"#;
        assert_eq!(
            merged(base, patch),
            json!({
                "ResourceName": "vpc",
                "EnvironmentVariables": {"REGION": "eu-west-1", "STAGE": "prod", "OWNER": "ops"}
            })
        );
    }

    #[test]
    fn test_deep_nesting_fills_gaps() {
        let base = r#"{"a": {"b": {"c": {"d": 1, "e": 2}}}}"#;
        let patch = r#"{"a": {"b": {"c": {"e": 3}}}}"#;
        assert_eq!(merged(base, patch), json!({"a": {"b": {"c": {"d": 1, "e": 3}}}}));
    }

    #[test]
    fn test_null_in_patch_is_absent() {
        assert_eq!(
            merged(r#"{"a": {"b": 1}, "c": 2}"#, r#"{"a": null, "c": null}"#),
            json!({"a": {"b": 1}, "c": 2})
        );
    }

    #[test]
    fn test_null_in_patch_without_base_key_is_kept() {
        assert_eq!(merged(r#"{}"#, r#"{"a": null}"#), json!({"a": null}));
    }

    #[test]
    fn test_arrays_replace() {
        assert_eq!(
            merged(r#"{"Tags": ["a", "b", "c"]}"#, r#"{"Tags": ["z"]}"#),
            json!({"Tags": ["z"]})
        );
        assert_eq!(
            merged(r#"{"Tags": ["a"]}"#, r#"{"Tags": []}"#),
            json!({"Tags": []})
        );
    }

    #[test]
    fn test_arrays_of_objects_are_not_merged() {
        assert_eq!(
            merged(
                r#"{"Steps": [{"name": "plan", "timeout": 30}]}"#,
                r#"{"Steps": [{"name": "apply"}]}"#
            ),
            json!({"Steps": [{"name": "apply"}]})
        );
    }

    #[test]
    fn test_patch_only_keys_pass_through() {
        assert_eq!(
            merged(r#"{"a": 1}"#, r#"{"b": {"c": [1, 2]}}"#),
            json!({"a": 1, "b": {"c": [1, 2]}})
        );
    }

    #[test]
    fn test_type_mismatch_keeps_patch_value() {
        assert_eq!(merged(r#"{"a": {"b": 1}}"#, r#"{"a": 5}"#), json!({"a": 5}));
        assert_eq!(merged(r#"{"a": {"b": 1}}"#, r#"{"a": [1]}"#), json!({"a": [1]}));
        assert_eq!(
            merged(r#"{"a": 5}"#, r#"{"a": {"b": 1}}"#),
            json!({"a": {"b": 1}})
        );
    }

    #[test]
    fn test_scalar_types_replace() {
        assert_eq!(
            merged(r#"{"a": "x", "b": true, "c": 1.5}"#, r#"{"a": 1, "b": false, "c": "s"}"#),
            json!({"a": 1, "b": false, "c": "s"})
        );
    }

    #[test]
    fn test_empty_patch_keeps_base_including_nulls() {
        let base = r#"{"a": null, "b": {"c": null, "d": [null]}}"#;
        assert_eq!(merged(base, "{}"), serde_json::from_str::<Value>(base).unwrap());
    }

    #[test]
    fn test_self_merge_is_stable() {
        let doc = r#"{"a": 1, "b": {"c": [1, {"d": 2}]}, "e": "x"}"#;
        assert_eq!(merged(doc, doc), serde_json::from_str::<Value>(doc).unwrap());
    }

    #[test]
    fn test_output_is_compact_json() {
        let out = patch_json(r#"{ "a" : 1 }"#, r#"{ "b" : [ 1, 2 ] }"#).unwrap();
        assert!(!out.contains(' '));
        assert!(!out.contains('\n'));
    }

    #[test]
    fn test_unicode_and_escapes_survive() {
        let out = merged(r#"{"name": "café"}"#, r#"{"note": "line\nbreak \"q\""}"#);
        assert_eq!(out, json!({"name": "café", "note": "line\nbreak \"q\""}));
    }
}

// ============================================================================
// Errors
// ============================================================================

mod error_tests {
    use super::*;

    #[test]
    fn test_invalid_base_json() {
        let err = patch_json("{not json", "{}").unwrap_err();
        assert!(matches!(err, PatchError::Parse { .. }));
        assert_eq!(err.document(), Document::Base);
    }

    #[test]
    fn test_invalid_patch_json() {
        let err = patch_json("{}", r#"{"a": }"#).unwrap_err();
        assert!(matches!(err, PatchError::Parse { .. }));
        assert_eq!(err.document(), Document::Patch);
        assert!(err
            .to_string()
            .starts_with("patch JSON is not valid, please verify the JSON input"));
    }

    #[test]
    fn test_empty_input_is_parse_error() {
        assert!(matches!(
            patch_json("", "{}").unwrap_err(),
            PatchError::Parse { .. }
        ));
    }

    #[test]
    fn test_non_object_roots() {
        for (base, patch, document, found) in [
            ("[1]", "{}", Document::Base, "array"),
            ("{}", "\"text\"", Document::Patch, "string"),
            ("null", "{}", Document::Base, "null"),
            ("{}", "42", Document::Patch, "number"),
        ] {
            match patch_json(base, patch).unwrap_err() {
                PatchError::Shape {
                    document: d,
                    found: f,
                } => {
                    assert_eq!(d, document);
                    assert_eq!(f, found);
                }
                other => panic!("expected shape error, got {:?}", other),
            }
        }
    }
}

// ============================================================================
// Value level API
// ============================================================================

mod value_api_tests {
    use super::*;

    #[test]
    fn test_patch_document_matches_patch_json() {
        let base = r#"{"a": {"b": 1}}"#;
        let patch = r#"{"a": {"c": 2}}"#;
        let doc = patch_document(base, patch).unwrap();
        assert_eq!(doc.to_string(), patch_json(base, patch).unwrap());
    }

    #[test]
    fn test_merge_documents() {
        let out = merge_documents(&json!({"a": 1, "b": 2}), &json!({"b": 3})).unwrap();
        assert_eq!(out, json!({"a": 1, "b": 3}));
    }

    #[test]
    fn test_merge_documents_rejects_non_objects() {
        let err = merge_documents(&json!({}), &json!([1])).unwrap_err();
        assert_eq!(err.document(), Document::Patch);
    }

    #[test]
    fn test_merge_values_absent_and_null() {
        let base = json!({"x": 1});
        assert_eq!(merge_values(&base, None), base);
        assert_eq!(merge_values(&base, Some(Value::Null)), base);
        assert_eq!(merge_values(&json!(1), Some(json!(2))), json!(2));
    }
}
