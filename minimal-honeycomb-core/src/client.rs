//! Client facade binding the builder, pagination engine and normaliser to one transport.

use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info};

use crate::contract::{PageObserver, TracingObserver, Transport};
use crate::document::Selection;
use crate::error::{HoneycombError, Result};
use crate::normalize::{self, Record};
use crate::pagination::{self, extract_request_result, FetchRequest};
use crate::request::{build_compound_document, build_query_document, Arguments, ChildRequest, RequestType};

pub struct HoneycombClient<T> {
    transport: T,
    observer: Arc<dyn PageObserver>,
}

impl<T: Transport> HoneycombClient<T> {
    /// Creates a client reporting pagination progress through `tracing`.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            observer: Arc::new(TracingObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn PageObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Builds and executes a single request, returning the member of the
    /// response named after the request.
    pub async fn request(
        &self,
        request_type: RequestType,
        request_name: &str,
        arguments: Option<&Arguments>,
        return_shape: &[Selection],
    ) -> Result<Value> {
        let built = build_query_document(request_type, request_name, arguments, return_shape)?;
        info!(
            %request_type,
            request_name,
            attachments = built.attachments.len(),
            "Sending request"
        );
        let response = self
            .transport
            .execute(&built.document, &built.variables, &built.attachments)
            .await
            .map_err(|e| {
                error!(request_name, error = %e, "[ERROR] Request failed");
                HoneycombError::Transport(e)
            })?;
        extract_request_result(response, request_name)
    }

    /// Builds and executes a compound request; the whole response is returned
    /// since each child answers under its own alias.
    pub async fn compound_request(
        &self,
        parent_type: RequestType,
        parent_name: &str,
        children: &[ChildRequest],
    ) -> Result<Value> {
        let built = build_compound_document(parent_type, parent_name, children)?;
        info!(
            %parent_type,
            parent_name,
            children = children.len(),
            attachments = built.attachments.len(),
            "Sending compound request"
        );
        self.transport
            .execute(&built.document, &built.variables, &built.attachments)
            .await
            .map_err(|e| {
                error!(parent_name, error = %e, "[ERROR] Compound request failed");
                HoneycombError::Transport(e)
            })
    }

    /// Walks every page of `request`; see [`pagination::fetch_all`].
    pub async fn fetch_data(&self, request: &FetchRequest) -> Result<Vec<Record>> {
        pagination::fetch_all(&self.transport, self.observer.as_ref(), request).await
    }

    /// Expands `file.data` blobs; see [`normalize::normalize`].
    pub fn parse_datapoints(&self, records: Vec<Record>) -> Vec<Record> {
        normalize::normalize(records)
    }
}
