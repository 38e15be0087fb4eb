//! Side-channel staging for `createDatapoint` payloads.
//!
//! The transport keeps structured JSON variables apart from raw payload
//! channels. Before a datapoint is sent, its `file.data` value is serialised
//! to JSON text, moved into an [`Attachment`] under a fresh hex token, and the
//! token is left in the variables as the join key.

use serde_json::{Map, Value};
use tracing::debug;
use uuid::Uuid;

use crate::contract::Attachment;
use crate::error::{HoneycombError, Result};

/// The only request whose variables carry an upload.
pub const UPLOAD_REQUEST_NAME: &str = "createDatapoint";

/// Argument holding the datapoint (and its `file`).
pub const UPLOAD_ARGUMENT_NAME: &str = "datapoint";

/// Moves `<datapoint>.file.data` out of `variables` into an attachment keyed by `map_path`.
///
/// `file.contentType` is read but left in place.
pub fn stage_upload(
    request_name: &str,
    variables: &mut Map<String, Value>,
    map_path: String,
) -> Result<Attachment> {
    let missing = |field: &'static str| HoneycombError::MissingUploadField {
        request_name: request_name.to_string(),
        field,
    };

    let file = variables
        .get_mut(UPLOAD_ARGUMENT_NAME)
        .and_then(|datapoint| datapoint.get_mut("file"))
        .and_then(Value::as_object_mut)
        .ok_or_else(|| missing("datapoint.file.data"))?;

    let data = match file.get("data") {
        Some(data) if !data.is_null() => data,
        _ => return Err(missing("datapoint.file.data")),
    };

    let content_type = match file.get("contentType") {
        Some(Value::String(content_type)) => content_type.clone(),
        _ => return Err(missing("datapoint.file.contentType")),
    };

    let content = serde_json::to_string(data).map_err(|e| {
        HoneycombError::InvalidArgument(format!("datapoint.file.data is not serialisable: {e}"))
    })?;

    let token = Uuid::new_v4().simple().to_string();
    file.insert("data".to_string(), Value::String(token.clone()));

    debug!(
        map_path = %map_path,
        token = %token,
        content_len = content.len(),
        "Staged upload attachment"
    );

    Ok(Attachment {
        map_path,
        token,
        content,
        content_type,
    })
}
