//! `load_config` module: loads a YAML fetch job and adapts it into a core [`FetchRequest`].
//!
//! This is the only place where untrusted YAML is parsed. Loosely typed pieces
//! (argument mappings, return-shape trees) are converted into the core's typed
//! descriptions here, so shape and argument errors surface before any request
//! is sent. Credentials never live in the job file; they come from the
//! environment (see [`minimal_honeycomb_core::config`]).
//!
//! Example job:
//!
//! ```yaml
//! request_name: findDatapoints
//! arguments:
//!   query:
//!     type: QueryExpression!
//!     value:
//!       field: source
//!       operator: EQ
//!       value: sensor-1
//! return_data:
//!   - data_id
//!   - timestamp
//!   - file:
//!       - contentType
//!       - data
//! id_field: data_id
//! page_size: 500
//! parse: true
//! ```

use anyhow::{Context, Result};
use minimal_honeycomb_core::pagination::DEFAULT_PAGE_SIZE;
use minimal_honeycomb_core::{Arguments, FetchRequest, Selection};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{error, info};

#[derive(Debug, Deserialize)]
struct RawJob {
    request_name: String,
    #[serde(default)]
    arguments: Option<Value>,
    return_data: Value,
    id_field: String,
    #[serde(default)]
    page_size: Option<u32>,
    #[serde(default)]
    sort: Option<Value>,
    #[serde(default)]
    parse: bool,
}

/// A loaded job: what to fetch and whether to normalise the result.
#[derive(Debug)]
pub struct FetchJob {
    pub request: FetchRequest,
    pub parse: bool,
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<FetchJob> {
    let path_ref = path.as_ref();
    info!(job_path = ?path_ref, "Loading fetch job from file");

    let content = fs::read_to_string(path_ref).map_err(|e| {
        error!(error = ?e, job_path = ?path_ref, "Failed to read job file");
        anyhow::anyhow!("Failed to read job file {:?}: {}", path_ref, e)
    })?;

    let raw: RawJob = serde_yaml::from_str(&content).map_err(|e| {
        error!(error = ?e, job_path = ?path_ref, "Failed to parse job YAML");
        anyhow::anyhow!("Failed to parse job YAML: {e}")
    })?;

    let return_data = Selection::from_value(&raw.return_data)
        .with_context(|| format!("Invalid return_data in {:?}", path_ref))?;

    let mut request = FetchRequest::new(raw.request_name, return_data, raw.id_field)
        .with_page_size(raw.page_size.unwrap_or(DEFAULT_PAGE_SIZE));

    match raw.arguments {
        Some(Value::Null) | None => {}
        Some(value) => {
            let arguments = Arguments::from_value(&value)
                .with_context(|| format!("Invalid arguments in {:?}", path_ref))?;
            request = request.with_arguments(arguments);
        }
    }

    if let Some(sort) = raw.sort.filter(|sort| !sort.is_null()) {
        request = request.with_sort(sort);
    }

    request
        .validate()
        .with_context(|| format!("Invalid fetch job {:?}", path_ref))?;

    info!(
        request_name = %request.request_name,
        id_field = %request.id_field_name,
        page_size = request.page_size,
        parse = raw.parse,
        "Fetch job loaded"
    );

    Ok(FetchJob {
        request,
        parse: raw.parse,
    })
}
