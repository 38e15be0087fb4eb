use minimal_honeycomb_core::document::{format_document, format_value};
use minimal_honeycomb_core::{HoneycombError, Selection};
use serde_json::json;

#[test]
fn loose_shape_converts_to_typed_tree() {
    let shape = Selection::from_value(&json!([
        "id",
        {"owner": ["name", {"address": ["city"]}]},
        {"tags": ["label"]}
    ]))
    .expect("shape should convert");

    assert_eq!(
        shape,
        vec![
            Selection::field("id"),
            Selection::nested(
                "owner",
                vec![
                    Selection::field("name"),
                    Selection::nested("address", vec![Selection::field("city")]),
                ]
            ),
            Selection::nested("tags", vec![Selection::field("label")]),
        ]
    );
}

#[test]
fn format_value_renders_braces_and_trailing_newlines() {
    let text = format_value(&json!(["id", {"owner": ["name"]}])).expect("shape should render");
    assert_eq!(text, "id\nowner {\n  name\n}\n");
}

#[test]
fn mapping_with_two_keys_is_rejected() {
    let err = Selection::from_value(&json!([{"owner": ["name"], "tags": ["label"]}])).unwrap_err();
    assert!(matches!(err, HoneycombError::InvalidShape(_)), "got {err:?}");
}

#[test]
fn empty_mapping_is_rejected() {
    let err = Selection::from_value(&json!(["id", {}])).unwrap_err();
    assert!(matches!(err, HoneycombError::InvalidShape(_)), "got {err:?}");
}

#[test]
fn non_string_leaf_is_rejected() {
    let err = Selection::from_value(&json!(["id", 3])).unwrap_err();
    assert!(matches!(err, HoneycombError::InvalidShape(_)), "got {err:?}");
}

#[test]
fn nested_node_without_children_is_rejected() {
    let err = Selection::from_value(&json!([{"owner": []}])).unwrap_err();
    assert!(matches!(err, HoneycombError::InvalidShape(_)), "got {err:?}");
}

#[test]
fn format_document_rejects_empty_shape() {
    let err = format_document(&[]).unwrap_err();
    assert!(matches!(err, HoneycombError::InvalidShape(_)), "got {err:?}");
}

#[test]
fn format_document_rejects_nested_node_without_children() {
    let shape = vec![Selection::field("id"), Selection::nested("owner", vec![])];
    let err = format_document(&shape).unwrap_err();
    assert!(matches!(err, HoneycombError::InvalidShape(_)), "got {err:?}");
}

#[test]
fn format_document_renders_typed_tree() {
    let shape = vec![Selection::nested("owner", vec![Selection::field("name")])];
    assert_eq!(format_document(&shape).expect("shape should render"), "owner {\n  name\n}\n");
}
