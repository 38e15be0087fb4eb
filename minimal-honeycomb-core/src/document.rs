//! Return shapes and the document formatter.
//!
//! A return shape is an ordered tree of [`Selection`]s. A leaf is a bare field
//! name; a nested node is a single key with its child selections. Rendering is
//! a pure function producing the indented text block handed to the transport:
//!
//! ```text
//! listWidgets {
//!   id
//!   owner {
//!     name
//!   }
//! }
//! ```
//!
//! Typed trees cannot express a mapping with zero or several keys, so that
//! invariant is only checked where loosely typed data comes in
//! ([`Selection::from_value`]). Emptiness is checked by [`validate_shape`].

use serde_json::Value;

use crate::error::{HoneycombError, Result};

/// Indentation emitted per nesting level.
pub const INDENT: &str = "  ";

/// One node of a return shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Field(String),
    Nested {
        name: String,
        children: Vec<Selection>,
    },
}

impl Selection {
    pub fn field(name: impl Into<String>) -> Self {
        Selection::Field(name.into())
    }

    pub fn nested(name: impl Into<String>, children: Vec<Selection>) -> Self {
        Selection::Nested {
            name: name.into(),
            children,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Selection::Field(name) => name,
            Selection::Nested { name, .. } => name,
        }
    }

    /// Converts a loosely typed shape (a JSON or YAML list of strings and
    /// single-key mappings) into a typed return shape.
    pub fn from_value(value: &Value) -> Result<Vec<Selection>> {
        let items = value.as_array().ok_or_else(|| {
            HoneycombError::InvalidShape(format!("expected a list of selections, got {value}"))
        })?;
        let shape = items
            .iter()
            .map(Selection::from_item)
            .collect::<Result<Vec<_>>>()?;
        validate_shape(&shape)?;
        Ok(shape)
    }

    fn from_item(item: &Value) -> Result<Selection> {
        match item {
            Value::String(name) => Ok(Selection::Field(name.clone())),
            Value::Object(map) => {
                if map.is_empty() {
                    return Err(HoneycombError::InvalidShape(
                        "object for formatting has zero length".to_string(),
                    ));
                }
                if map.len() > 1 {
                    return Err(HoneycombError::InvalidShape(format!(
                        "multiple objects with children must be represented by separate mappings, got keys {:?}",
                        map.keys().collect::<Vec<_>>()
                    )));
                }
                let (name, children) = map.iter().next().ok_or_else(|| {
                    HoneycombError::InvalidShape("object for formatting has zero length".to_string())
                })?;
                Ok(Selection::Nested {
                    name: name.clone(),
                    children: Selection::from_value(children)?,
                })
            }
            other => Err(HoneycombError::InvalidShape(format!(
                "selection must be a field name or a single-key mapping, got {other}"
            ))),
        }
    }
}

/// Rejects empty shapes at any level of the tree.
pub fn validate_shape(shape: &[Selection]) -> Result<()> {
    if shape.is_empty() {
        return Err(HoneycombError::InvalidShape(
            "return shape has no selections".to_string(),
        ));
    }
    for selection in shape {
        if selection.name().is_empty() {
            return Err(HoneycombError::InvalidShape(
                "selection has an empty name".to_string(),
            ));
        }
        if let Selection::Nested { name, children } = selection {
            if children.is_empty() {
                return Err(HoneycombError::InvalidShape(format!(
                    "selection {name} has no children"
                )));
            }
            validate_shape(children)?;
        }
    }
    Ok(())
}

/// Renders a shape starting at nesting level zero.
///
/// Fails with `InvalidShape` under the same rules as [`validate_shape`].
pub fn format_document(shape: &[Selection]) -> Result<String> {
    validate_shape(shape)?;
    let mut out = String::new();
    write_level(&mut out, shape, 0);
    Ok(out)
}

/// Converts and renders a loosely typed shape in one step.
pub fn format_value(value: &Value) -> Result<String> {
    format_document(&Selection::from_value(value)?)
}

fn write_level(out: &mut String, shape: &[Selection], level: usize) {
    let indent = INDENT.repeat(level);
    for selection in shape {
        match selection {
            Selection::Field(name) => {
                out.push_str(&indent);
                out.push_str(name);
                out.push('\n');
            }
            Selection::Nested { name, children } => {
                out.push_str(&indent);
                out.push_str(name);
                out.push_str(" {\n");
                write_level(out, children, level + 1);
                out.push_str(&indent);
                out.push_str("}\n");
            }
        }
    }
}
