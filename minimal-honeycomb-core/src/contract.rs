//! # contract: narrow interfaces the core calls through
//!
//! The core never talks to the network and never owns credentials. It hands a
//! rendered document, its variables and any side-channel attachments to a
//! [`Transport`], and it reports pagination progress to a [`PageObserver`].
//!
//! ## Mocking & Testing
//! - Both traits are annotated for `mockall`; the generated `MockTransport` and
//!   `MockPageObserver` are exported under the default `test-export-mocks`
//!   feature so integration tests and downstream crates can use them.

use async_trait::async_trait;
use serde_json::{Map, Value};

use mockall::automock;

use crate::error::TransportError;

/// A binary/text payload sent beside the JSON variables.
///
/// The variables hold `token` where the payload used to be; `map_path` tells
/// the remote side which variable the payload belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Path of the replaced value, e.g. `variables.datapoint.file.data`.
    pub map_path: String,
    /// Generated hex identifier, also used as the upload file name.
    pub token: String,
    /// JSON serialisation of the original value.
    pub content: String,
    pub content_type: String,
}

/// Executes documents against the remote endpoint.
///
/// Implementors own authentication and the wire encoding of attachments. The
/// returned value is the response's data object, so for a single request it
/// must carry a member named after the request.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(
        &self,
        document: &str,
        variables: &Map<String, Value>,
        attachments: &[Attachment],
    ) -> Result<Value, TransportError>;
}

/// Progress of one page of a paginated fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageEvent {
    pub page_index: usize,
    pub record_count: usize,
    pub new_record_count: usize,
}

/// Structured event sink for the pagination engine.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait PageObserver: Send + Sync {
    /// Called once for every page received, including the final empty one.
    fn page_fetched(&self, event: &PageEvent);

    /// Called once when a fetch terminates normally.
    fn fetch_completed(&self, total: usize);
}

/// Default observer: forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl PageObserver for TracingObserver {
    fn page_fetched(&self, event: &PageEvent) {
        tracing::info!(
            page_index = event.page_index,
            record_count = event.record_count,
            new_record_count = event.new_record_count,
            "[FETCH] Page received"
        );
    }

    fn fetch_completed(&self, total: usize) {
        tracing::info!(total, "[FETCH] Fetched data points total");
    }
}
