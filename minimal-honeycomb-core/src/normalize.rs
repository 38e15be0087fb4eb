//! Payload normaliser: flattens `file.data` blobs into one record per decoded unit.
//!
//! A blob may be an object, a list, JSON text, or newline-delimited JSON, and
//! these can nest arbitrarily (a list of JSON strings, a JSON string holding a
//! list, ...). Decoding is best effort. Each strategy in [`DECODERS`] either
//! claims the value or passes; a value no strategy claims yields nothing.

use serde_json::{Map, Value};
use tracing::{debug, info};

/// A record as returned by the service.
pub type Record = Map<String, Value>;

/// Key under which each decoded unit is attached to its parent record.
pub const PARSED_DATA_KEY: &str = "parsed_data";

type Decoder = fn(&Value) -> Option<Vec<Record>>;

/// Decoding strategies in the order they are tried.
const DECODERS: &[Decoder] = &[decode_object, decode_list, decode_json_text, decode_lines];

/// Expands every record carrying `file.data` into one record per decoded unit.
///
/// The expanded records keep all original fields, with `data` removed from
/// `file`, plus the decoded unit under `parsed_data`. A record whose blob
/// decodes to nothing disappears. Records without a blob pass through as-is.
/// If the original record already has a `parsed_data` field it is overwritten.
pub fn normalize(records: Vec<Record>) -> Vec<Record> {
    info!(count = records.len(), "Parsing datapoints");
    let mut out = Vec::with_capacity(records.len());
    for mut record in records {
        let blob = match take_blob(&mut record) {
            Some(blob) => blob,
            None => {
                out.push(record);
                continue;
            }
        };
        let units = decode_blob(&blob);
        if units.is_empty() {
            debug!("Datapoint blob decoded to no records; dropping datapoint");
        }
        for unit in units {
            let mut expanded = record.clone();
            expanded.insert(PARSED_DATA_KEY.to_string(), Value::Object(unit));
            out.push(expanded);
        }
    }
    out
}

/// Decodes a blob into zero or more objects, depth first and order preserving.
pub fn decode_blob(blob: &Value) -> Vec<Record> {
    DECODERS
        .iter()
        .find_map(|decode| decode(blob))
        .unwrap_or_default()
}

fn take_blob(record: &mut Record) -> Option<Value> {
    let file = record.get_mut("file")?.as_object_mut()?;
    match file.get("data") {
        None | Some(Value::Null) => None,
        Some(_) => file.remove("data"),
    }
}

fn decode_object(value: &Value) -> Option<Vec<Record>> {
    value.as_object().map(|object| vec![object.clone()])
}

fn decode_list(value: &Value) -> Option<Vec<Record>> {
    value
        .as_array()
        .map(|items| items.iter().flat_map(decode_blob).collect())
}

fn decode_json_text(value: &Value) -> Option<Vec<Record>> {
    let text = value.as_str()?;
    let parsed: Value = serde_json::from_str(text).ok()?;
    Some(decode_blob(&parsed))
}

fn decode_lines(value: &Value) -> Option<Vec<Record>> {
    let text = value.as_str()?;
    // A single line has already failed as JSON; splitting it again changes nothing.
    if !text.contains('\n') {
        return None;
    }
    Some(
        text.split('\n')
            .filter(|line| !line.is_empty())
            .flat_map(|line| decode_blob(&Value::String(line.to_string())))
            .collect(),
    )
}
