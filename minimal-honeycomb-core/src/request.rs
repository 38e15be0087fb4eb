//! Request builder: turns request descriptions into query/mutation documents
//! plus the variable bindings they are sent with.
//!
//! The builder is schema-agnostic. Argument type names and return shapes are
//! opaque caller-provided fragments; nothing is checked against a schema.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::contract::Attachment;
use crate::document::{format_document, validate_shape, Selection};
use crate::error::{HoneycombError, Result};
use crate::upload;

/// Argument names the caller may not supply; they belong to the pagination engine.
pub const RESERVED_ARGUMENT_NAMES: &[&str] = &["page"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestType {
    Query,
    Mutation,
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestType::Query => f.write_str("query"),
            RequestType::Mutation => f.write_str("mutation"),
        }
    }
}

/// A typed argument value. `type_name` is a schema type token such as
/// `PaginationInput` or `DatapointInput!`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Argument {
    #[serde(rename = "type")]
    pub type_name: String,
    pub value: Value,
}

impl Argument {
    pub fn new(type_name: impl Into<String>, value: Value) -> Self {
        Self {
            type_name: type_name.into(),
            value,
        }
    }
}

/// Arguments of one request, unique by name, kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    entries: Vec<(String, Argument)>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an argument, replacing any previous one with the same name in place.
    pub fn insert(&mut self, name: impl Into<String>, argument: Argument) {
        let name = name.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = argument,
            None => self.entries.push((name, argument)),
        }
    }

    pub fn with(mut self, name: impl Into<String>, argument: Argument) -> Self {
        self.insert(name, argument);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Argument> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, argument)| argument)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Argument)> {
        self.entries.iter().map(|(name, argument)| (name.as_str(), argument))
    }

    /// Builds arguments from a `name -> {type, value}` mapping, keeping its order.
    pub fn from_value(value: &Value) -> Result<Self> {
        let map = value.as_object().ok_or_else(|| {
            HoneycombError::InvalidArgument(format!("arguments must be a mapping, got {value}"))
        })?;
        let mut arguments = Arguments::new();
        for (name, info) in map {
            let argument: Argument = serde_json::from_value(info.clone()).map_err(|e| {
                HoneycombError::InvalidArgument(format!(
                    "argument {name} must carry a type and a value: {e}"
                ))
            })?;
            arguments.insert(name.clone(), argument);
        }
        Ok(arguments)
    }

    /// Fails if any reserved name is present.
    pub fn check_reserved(&self) -> Result<()> {
        match self
            .entries
            .iter()
            .find(|(name, _)| RESERVED_ARGUMENT_NAMES.contains(&name.as_str()))
        {
            Some((name, _)) => Err(HoneycombError::InvalidArgument(format!(
                "specifying {name} is redundant; pagination is driven by the page size and sort arguments"
            ))),
            None => Ok(()),
        }
    }

    /// Variable bindings: argument name to raw value, type tags stripped.
    pub fn variables(&self) -> Map<String, Value> {
        self.entries
            .iter()
            .map(|(name, argument)| (name.clone(), argument.value.clone()))
            .collect()
    }
}

/// A built document ready for a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltRequest {
    pub document: String,
    pub variables: Map<String, Value>,
    pub attachments: Vec<Attachment>,
}

impl BuiltRequest {
    /// Variables rendered as 4-space indented JSON.
    pub fn variables_string(&self) -> Result<String> {
        pretty_json(&Value::Object(self.variables.clone()))
    }
}

/// One sub-operation of a compound document.
#[derive(Debug, Clone, PartialEq)]
pub struct ChildRequest {
    pub name: String,
    pub arguments: Option<Arguments>,
    /// Alias prefix; the rendered alias is `<return_object_name>_<index>`.
    pub return_object_name: String,
    pub return_shape: Vec<Selection>,
}

impl ChildRequest {
    pub fn new(
        name: impl Into<String>,
        return_object_name: impl Into<String>,
        return_shape: Vec<Selection>,
    ) -> Self {
        Self {
            name: name.into(),
            arguments: None,
            return_object_name: return_object_name.into(),
            return_shape,
        }
    }

    pub fn with_arguments(mut self, arguments: Arguments) -> Self {
        self.arguments = Some(arguments);
        self
    }

    /// The aliased call line for this child at position `index`.
    pub fn child_string(&self, index: usize) -> String {
        match self.arguments.as_ref().filter(|arguments| !arguments.is_empty()) {
            Some(arguments) => {
                let bindings = arguments
                    .iter()
                    .map(|(name, _)| format!("{name}: ${name}_{index}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!(
                    "{}_{index}: {}({bindings})",
                    self.return_object_name, self.name
                )
            }
            None => format!("{}_{index}: {}", self.return_object_name, self.name),
        }
    }
}

/// Builds a single-request document. Rejects reserved argument names.
pub fn build_query_document(
    request_type: RequestType,
    request_name: &str,
    arguments: Option<&Arguments>,
    return_shape: &[Selection],
) -> Result<BuiltRequest> {
    if let Some(arguments) = arguments {
        arguments.check_reserved()?;
    }
    build_request(request_type, request_name, arguments, return_shape)
}

/// Builds a single-request document without the reserved-name check.
pub(crate) fn build_request(
    request_type: RequestType,
    request_name: &str,
    arguments: Option<&Arguments>,
    return_shape: &[Selection],
) -> Result<BuiltRequest> {
    validate_shape(return_shape)?;
    let arguments = arguments.filter(|arguments| !arguments.is_empty());

    let (top_level, second_level) = match arguments {
        Some(arguments) => {
            let declarations = arguments
                .iter()
                .map(|(name, argument)| format!("${name}: {}", argument.type_name))
                .collect::<Vec<_>>()
                .join(", ");
            let bindings = arguments
                .iter()
                .map(|(name, _)| format!("{name}: ${name}"))
                .collect::<Vec<_>>()
                .join(", ");
            (
                format!("{request_type} {request_name}({declarations})"),
                format!("{request_name}({bindings})"),
            )
        }
        None => (
            format!("{request_type} {request_name}"),
            request_name.to_string(),
        ),
    };

    let document = format_document(&[Selection::nested(
        top_level,
        vec![Selection::nested(second_level, return_shape.to_vec())],
    )])?;

    let mut variables = arguments.map(Arguments::variables).unwrap_or_default();
    let mut attachments = Vec::new();
    if request_name == upload::UPLOAD_REQUEST_NAME {
        let map_path = format!("variables.{}.file.data", upload::UPLOAD_ARGUMENT_NAME);
        attachments.push(upload::stage_upload(request_name, &mut variables, map_path)?);
    }

    debug!(
        request_name,
        variable_count = variables.len(),
        attachment_count = attachments.len(),
        "Built request document"
    );

    Ok(BuiltRequest {
        document,
        variables,
        attachments,
    })
}

/// Builds one document running every child as a sibling aliased call.
///
/// Argument declarations of all children are hoisted into the parent
/// signature with the child index appended (`argName_i`); the variables are
/// re-keyed the same way.
pub fn build_compound_document(
    parent_type: RequestType,
    parent_name: &str,
    children: &[ChildRequest],
) -> Result<BuiltRequest> {
    if children.is_empty() {
        return Err(HoneycombError::InvalidShape(format!(
            "compound request {parent_name} has no child requests"
        )));
    }

    let mut declarations = Vec::new();
    let mut child_selections = Vec::with_capacity(children.len());
    let mut variables = Map::new();
    let mut attachments = Vec::new();

    for (index, child) in children.iter().enumerate() {
        validate_shape(&child.return_shape)?;

        let mut child_variables = Map::new();
        if let Some(arguments) = &child.arguments {
            for (name, argument) in arguments.iter() {
                declarations.push(format!("${name}_{index}: {}", argument.type_name));
            }
            child_variables = arguments.variables();
        }

        if child.name == upload::UPLOAD_REQUEST_NAME {
            let map_path = format!(
                "variables.{}_{index}.file.data",
                upload::UPLOAD_ARGUMENT_NAME
            );
            attachments.push(upload::stage_upload(
                &child.name,
                &mut child_variables,
                map_path,
            )?);
        }

        for (name, value) in child_variables {
            variables.insert(format!("{name}_{index}"), value);
        }

        child_selections.push(Selection::nested(
            child.child_string(index),
            child.return_shape.clone(),
        ));
    }

    let top_level = if declarations.is_empty() {
        format!("{parent_type} {parent_name}")
    } else {
        format!("{parent_type} {parent_name}({})", declarations.join(", "))
    };

    let document = format_document(&[Selection::nested(top_level, child_selections)])?;

    debug!(
        parent_name,
        child_count = children.len(),
        variable_count = variables.len(),
        attachment_count = attachments.len(),
        "Built compound request document"
    );

    Ok(BuiltRequest {
        document,
        variables,
        attachments,
    })
}

/// The variables a single request would be sent with, as 4-space indented JSON.
///
/// Runs the upload indirection, so a `createDatapoint` request shows the
/// generated token in place of its data.
pub fn variables_string(
    request_name: &str,
    arguments: Option<&Arguments>,
) -> Result<String> {
    let mut variables = arguments.map(Arguments::variables).unwrap_or_default();
    if request_name == upload::UPLOAD_REQUEST_NAME {
        let map_path = format!("variables.{}.file.data", upload::UPLOAD_ARGUMENT_NAME);
        upload::stage_upload(request_name, &mut variables, map_path)?;
    }
    pretty_json(&Value::Object(variables))
}

fn pretty_json(value: &Value) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut ser)
        .map_err(|e| HoneycombError::InvalidArgument(format!("variables are not serialisable: {e}")))?;
    String::from_utf8(buf)
        .map_err(|e| HoneycombError::InvalidArgument(format!("variables are not valid UTF-8: {e}")))
}
