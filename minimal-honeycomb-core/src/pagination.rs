//! Cursor pagination with identifier-based deduplication.
//!
//! One fetch is a strictly sequential loop: build the page request, await the
//! transport, validate the page, merge new records, advance the cursor. The
//! accumulator, the seen-identifier set and the cursor are locals of
//! [`fetch_all`]; nothing is shared between fetches.
//!
//! The loop stops on the first empty page or the first page without a
//! cursor. A server that keeps returning non-empty pages with a cursor keeps
//! the loop going; there is no iteration cap.

use std::collections::HashSet;

use serde_json::{json, Value};
use tracing::{debug, error, info};

use crate::contract::{PageEvent, PageObserver, Transport};
use crate::document::{validate_shape, Selection};
use crate::error::{HoneycombError, Result};
use crate::normalize::Record;
use crate::request::{build_request, Argument, Arguments, BuiltRequest, RequestType};

pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Name and schema type of the synthesized pagination argument.
pub const PAGE_ARGUMENT_NAME: &str = "page";
pub const PAGE_ARGUMENT_TYPE: &str = "PaginationInput";

/// Description of a paginated fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub request_name: String,
    pub arguments: Option<Arguments>,
    /// Fields requested for each record, rendered under `data`.
    pub return_data: Vec<Selection>,
    /// Field whose value identifies a record across pages.
    pub id_field_name: String,
    pub page_size: u32,
    pub sort: Option<Value>,
}

impl FetchRequest {
    pub fn new(
        request_name: impl Into<String>,
        return_data: Vec<Selection>,
        id_field_name: impl Into<String>,
    ) -> Self {
        Self {
            request_name: request_name.into(),
            arguments: None,
            return_data,
            id_field_name: id_field_name.into(),
            page_size: DEFAULT_PAGE_SIZE,
            sort: None,
        }
    }

    pub fn with_arguments(mut self, arguments: Arguments) -> Self {
        self.arguments = Some(arguments);
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_sort(mut self, sort: Value) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Return shape of one page: the caller's fields under `data`, plus `page_info`.
    pub fn page_shape(&self) -> Vec<Selection> {
        vec![
            Selection::nested("data", self.return_data.clone()),
            Selection::nested(
                "page_info",
                vec![Selection::field("count"), Selection::field("cursor")],
            ),
        ]
    }

    /// Caller arguments merged with the pagination argument for `cursor`.
    pub fn page_arguments(&self, cursor: Option<&Value>) -> Arguments {
        let mut arguments = self.arguments.clone().unwrap_or_default();
        arguments.insert(
            PAGE_ARGUMENT_NAME,
            Argument::new(
                PAGE_ARGUMENT_TYPE,
                json!({
                    "max": self.page_size,
                    "cursor": cursor.cloned().unwrap_or(Value::Null),
                    "sort": self.sort.clone().unwrap_or(Value::Null),
                }),
            ),
        );
        arguments
    }

    /// Rejects reserved argument names and empty return shapes.
    pub fn validate(&self) -> Result<()> {
        if let Some(arguments) = &self.arguments {
            arguments.check_reserved()?;
        }
        validate_shape(&self.return_data)
    }
}

/// Builds the document and variables for the page following `cursor`.
pub fn page_request(request: &FetchRequest, cursor: Option<&Value>) -> Result<BuiltRequest> {
    let arguments = request.page_arguments(cursor);
    build_request(
        RequestType::Query,
        &request.request_name,
        Some(&arguments),
        &request.page_shape(),
    )
}

/// One validated page.
struct Page {
    records: Vec<Value>,
    cursor: Option<Value>,
}

/// Fetches every page of `request` and returns the deduplicated records in
/// first-seen order.
///
/// Any transport or validation failure aborts the fetch; records accumulated
/// so far are discarded.
pub async fn fetch_all<T, O>(transport: &T, observer: &O, request: &FetchRequest) -> Result<Vec<Record>>
where
    T: Transport + ?Sized,
    O: PageObserver + ?Sized,
{
    request.validate()?;

    let mut cursor: Option<Value> = None;
    let mut records: Vec<Record> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut page_index = 0usize;

    loop {
        let built = page_request(request, cursor.as_ref())?;

        info!(request_name = %request.request_name, page_index, "[FETCH] Sending request");
        let response = transport
            .execute(&built.document, &built.variables, &built.attachments)
            .await
            .map_err(|e| {
                error!(page_index, error = %e, "[FETCH][ERROR] Transport failed");
                HoneycombError::Transport(e)
            })?;

        let result = extract_request_result(response, &request.request_name)?;
        let page = parse_page(result)?;
        let record_count = page.records.len();

        if record_count == 0 {
            observer.page_fetched(&PageEvent {
                page_index,
                record_count,
                new_record_count: 0,
            });
            info!(page_index, "[FETCH] Request returned no data points. Terminating fetch");
            break;
        }

        let mut new_record_count = 0usize;
        for datum in page.records {
            let record = match datum {
                Value::Object(record) => record,
                _ => {
                    return Err(HoneycombError::MissingIdentifierField {
                        field: request.id_field_name.clone(),
                    })
                }
            };
            let id = record.get(&request.id_field_name).ok_or_else(|| {
                HoneycombError::MissingIdentifierField {
                    field: request.id_field_name.clone(),
                }
            })?;
            if seen.insert(identity_key(id)) {
                new_record_count += 1;
                records.push(record);
            }
        }

        observer.page_fetched(&PageEvent {
            page_index,
            record_count,
            new_record_count,
        });

        match page.cursor {
            Some(next) => {
                debug!(page_index, cursor = %next, "[FETCH] Advancing cursor");
                cursor = Some(next);
                page_index += 1;
            }
            None => {
                info!(page_index, "[FETCH] No cursor returned. Terminating fetch");
                break;
            }
        }
    }

    observer.fetch_completed(records.len());
    Ok(records)
}

/// Hashable identity of an identifier value.
///
/// Numbers compare by value, so `1` and `1.0` are one record. Everything else
/// keys on its JSON text, which keeps `1` and `"1"` apart.
fn identity_key(id: &Value) -> String {
    // Largest magnitude at which every integer is exactly representable as f64.
    const EXACT_F64_INTEGER: f64 = 9_007_199_254_740_992.0;

    match id {
        Value::Number(number) if number.is_f64() => match number.as_f64() {
            Some(float) if float.fract() == 0.0 && float.abs() <= EXACT_F64_INTEGER => {
                (float as i64).to_string()
            }
            _ => number.to_string(),
        },
        other => other.to_string(),
    }
}

/// Picks the member named after the request out of a transport response.
pub(crate) fn extract_request_result(mut response: Value, request_name: &str) -> Result<Value> {
    match response.as_object_mut().and_then(|map| map.remove(request_name)) {
        Some(result) => Ok(result),
        None => Err(HoneycombError::MalformedResponse(format!(
            "missing {request_name} in {response}"
        ))),
    }
}

fn parse_page(result: Value) -> Result<Page> {
    let malformed = |what: &str| HoneycombError::MalformedResponse(format!("{what} in {result}"));

    let page_info = result
        .get("page_info")
        .and_then(Value::as_object)
        .ok_or_else(|| malformed("missing page_info"))?;
    let count = page_info
        .get("count")
        .ok_or_else(|| malformed("missing page_info.count"))?
        .as_u64()
        .ok_or_else(|| malformed("page_info.count is not a non-negative integer"))?;
    let cursor = match page_info.get("cursor") {
        Some(Value::Null) => None,
        Some(cursor) => Some(cursor.clone()),
        None => return Err(malformed("missing page_info.cursor")),
    };
    let records = match result.get("data") {
        Some(Value::Array(records)) => records.clone(),
        Some(_) => return Err(malformed("expected list for data")),
        None => return Err(malformed("missing data")),
    };

    if records.len() as u64 != count {
        return Err(HoneycombError::CountMismatch {
            reported: count,
            received: records.len(),
        });
    }

    Ok(Page { records, cursor })
}
