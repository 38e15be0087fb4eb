use minimal_honeycomb_core::request::{
    build_compound_document, build_query_document, variables_string,
};
use minimal_honeycomb_core::{Argument, Arguments, ChildRequest, HoneycombError, RequestType, Selection};
use serde_json::{json, Value};

fn id_and_name() -> Vec<Selection> {
    vec![Selection::field("id"), Selection::field("name")]
}

fn datapoint_arguments(data: Value) -> Arguments {
    Arguments::new().with(
        "datapoint",
        Argument::new(
            "DatapointInput",
            json!({
                "source": "sensor-1",
                "file": {"data": data, "contentType": "application/json"}
            }),
        ),
    )
}

#[test]
fn request_without_arguments_has_bare_signature_and_call() {
    let built = build_query_document(RequestType::Query, "listWidgets", None, &id_and_name())
        .expect("document should build");

    assert_eq!(
        built.document,
        "query listWidgets {\n  listWidgets {\n    id\n    name\n  }\n}\n"
    );
    assert!(built.variables.is_empty());
    assert!(built.attachments.is_empty());
}

#[test]
fn request_with_arguments_declares_and_binds_each_in_order() {
    let arguments = Arguments::new()
        .with("widgetId", Argument::new("ID!", json!("w-1")))
        .with("filter", Argument::new("WidgetFilter", json!({"colour": "red"})));

    let built = build_query_document(
        RequestType::Query,
        "getWidget",
        Some(&arguments),
        &[Selection::field("id")],
    )
    .expect("document should build");

    assert_eq!(
        built.document,
        "query getWidget($widgetId: ID!, $filter: WidgetFilter) {\n  getWidget(widgetId: $widgetId, filter: $filter) {\n    id\n  }\n}\n"
    );
    let keys: Vec<_> = built.variables.keys().cloned().collect();
    assert_eq!(keys, vec!["widgetId", "filter"]);
    assert_eq!(built.variables["widgetId"], json!("w-1"));
    assert_eq!(built.variables["filter"], json!({"colour": "red"}));
}

#[test]
fn nested_return_shape_is_rendered_inside_the_call() {
    let shape = vec![
        Selection::field("id"),
        Selection::nested("owner", vec![Selection::field("name")]),
    ];
    let built = build_query_document(RequestType::Mutation, "touchWidget", None, &shape)
        .expect("document should build");
    assert_eq!(
        built.document,
        "mutation touchWidget {\n  touchWidget {\n    id\n    owner {\n      name\n    }\n  }\n}\n"
    );
}

#[test]
fn page_argument_is_rejected() {
    let arguments = Arguments::new()
        .with("filter", Argument::new("WidgetFilter", json!({})))
        .with("page", Argument::new("PaginationInput", json!({"max": 5})));

    let err = build_query_document(
        RequestType::Query,
        "listWidgets",
        Some(&arguments),
        &id_and_name(),
    )
    .unwrap_err();

    assert!(matches!(err, HoneycombError::InvalidArgument(_)), "got {err:?}");
}

#[test]
fn empty_return_shape_is_rejected() {
    let err = build_query_document(RequestType::Query, "listWidgets", None, &[]).unwrap_err();
    assert!(matches!(err, HoneycombError::InvalidShape(_)), "got {err:?}");
}

#[test]
fn create_datapoint_moves_data_into_an_attachment() {
    let arguments = datapoint_arguments(json!([{"a": 1}, {"a": 2}]));

    let built = build_query_document(
        RequestType::Mutation,
        "createDatapoint",
        Some(&arguments),
        &[Selection::field("data_id")],
    )
    .expect("document should build");

    assert_eq!(built.attachments.len(), 1);
    let attachment = &built.attachments[0];
    assert_eq!(attachment.map_path, "variables.datapoint.file.data");
    assert_eq!(attachment.content, r#"[{"a":1},{"a":2}]"#);
    assert_eq!(attachment.content_type, "application/json");
    assert_eq!(
        built.variables["datapoint"]["file"]["data"],
        Value::String(attachment.token.clone())
    );
    assert_eq!(
        built.variables["datapoint"]["file"]["contentType"],
        json!("application/json")
    );
    assert_eq!(built.variables["datapoint"]["source"], json!("sensor-1"));
}

#[test]
fn create_datapoint_without_data_fails() {
    let arguments = Arguments::new().with(
        "datapoint",
        Argument::new(
            "DatapointInput",
            json!({"file": {"contentType": "text/plain"}}),
        ),
    );

    let err = build_query_document(
        RequestType::Mutation,
        "createDatapoint",
        Some(&arguments),
        &[Selection::field("data_id")],
    )
    .unwrap_err();

    assert!(
        matches!(
            err,
            HoneycombError::MissingUploadField {
                field: "datapoint.file.data",
                ..
            }
        ),
        "got {err:?}"
    );
}

#[test]
fn compound_children_sharing_an_argument_name_get_index_suffixes() {
    let children = vec![
        ChildRequest::new("getWidget", "widget", vec![Selection::field("id")])
            .with_arguments(Arguments::new().with("id", Argument::new("ID", json!("a")))),
        ChildRequest::new("getWidget", "widget", vec![Selection::field("id")])
            .with_arguments(Arguments::new().with("id", Argument::new("ID", json!("b")))),
    ];

    let built = build_compound_document(RequestType::Query, "widgets", &children)
        .expect("compound document should build");

    assert_eq!(
        built.document,
        "query widgets($id_0: ID, $id_1: ID) {\n  widget_0: getWidget(id: $id_0) {\n    id\n  }\n  widget_1: getWidget(id: $id_1) {\n    id\n  }\n}\n"
    );
    assert_eq!(built.variables.len(), 2);
    assert_eq!(built.variables["id_0"], json!("a"));
    assert_eq!(built.variables["id_1"], json!("b"));
}

#[test]
fn compound_children_without_arguments_render_bare_aliases() {
    let children = vec![
        ChildRequest::new("listWidgets", "widgets", vec![Selection::field("id")]),
        ChildRequest::new("listGadgets", "gadgets", vec![Selection::field("id")]),
    ];

    let built = build_compound_document(RequestType::Query, "everything", &children)
        .expect("compound document should build");

    assert_eq!(
        built.document,
        "query everything {\n  widgets_0: listWidgets {\n    id\n  }\n  gadgets_1: listGadgets {\n    id\n  }\n}\n"
    );
    assert_eq!(children[1].child_string(1), "gadgets_1: listGadgets");
}

#[test]
fn compound_create_datapoints_get_one_attachment_each() {
    let children = vec![
        ChildRequest::new("createDatapoint", "datapoint", vec![Selection::field("data_id")])
            .with_arguments(datapoint_arguments(json!({"n": 0}))),
        ChildRequest::new("createDatapoint", "datapoint", vec![Selection::field("data_id")])
            .with_arguments(datapoint_arguments(json!({"n": 1}))),
    ];

    let built = build_compound_document(RequestType::Mutation, "createDatapoints", &children)
        .expect("compound document should build");

    let paths: Vec<_> = built.attachments.iter().map(|a| a.map_path.as_str()).collect();
    assert_eq!(
        paths,
        vec!["variables.datapoint_0.file.data", "variables.datapoint_1.file.data"]
    );
    assert_ne!(built.attachments[0].token, built.attachments[1].token);
    for (index, attachment) in built.attachments.iter().enumerate() {
        assert_eq!(attachment.content, format!(r#"{{"n":{index}}}"#));
        assert_eq!(
            built.variables[&format!("datapoint_{index}")]["file"]["data"],
            Value::String(attachment.token.clone())
        );
    }
    assert!(built
        .document
        .starts_with("mutation createDatapoints($datapoint_0: DatapointInput, $datapoint_1: DatapointInput) {\n"));
}

#[test]
fn compound_request_needs_children() {
    let err = build_compound_document(RequestType::Query, "nothing", &[]).unwrap_err();
    assert!(matches!(err, HoneycombError::InvalidShape(_)), "got {err:?}");
}

#[test]
fn variables_string_uses_four_space_indent() {
    let arguments = Arguments::new().with("widgetId", Argument::new("ID!", json!("w-1")));
    let text = variables_string("getWidget", Some(&arguments)).expect("variables render");
    assert_eq!(text, "{\n    \"widgetId\": \"w-1\"\n}");
}

#[test]
fn arguments_from_value_keep_file_order() {
    let value = json!({
        "zeta": {"type": "String", "value": "z"},
        "alpha": {"type": "Int", "value": 1}
    });
    let arguments = Arguments::from_value(&value).expect("arguments parse");
    let names: Vec<_> = arguments.iter().map(|(name, _)| name.to_string()).collect();
    assert_eq!(names, vec!["zeta", "alpha"]);
    assert_eq!(arguments.get("alpha").map(|a| a.type_name.as_str()), Some("Int"));

    let err = Arguments::from_value(&json!({"broken": {"value": 1}})).unwrap_err();
    assert!(matches!(err, HoneycombError::InvalidArgument(_)), "got {err:?}");
}
