#![doc = "minimal-honeycomb-core: query synthesis, cursor pagination and payload normalisation for the Honeycomb data service."]

//! This crate holds all logic that does not touch the network. Documents are
//! built from typed request descriptions, executed through the
//! [`contract::Transport`] trait, paginated until the service runs dry, and
//! optionally flattened from their encoded `file.data` payloads.
//!
//! # Usage
//! Wrap a transport in [`client::HoneycombClient`] and call `fetch_data`,
//! `request` or `compound_request`. The concrete HTTP transport lives in the
//! `minimal-honeycomb` crate.

pub mod client;
pub mod config;
pub mod contract;
pub mod document;
pub mod error;
pub mod normalize;
pub mod pagination;
pub mod request;
pub mod upload;

pub use client::HoneycombClient;
pub use config::{ClientConfig, ClientSettings};
pub use contract::{Attachment, PageEvent, PageObserver, TracingObserver, Transport};
pub use document::Selection;
pub use error::{HoneycombError, Result, TransportError};
pub use normalize::Record;
pub use pagination::FetchRequest;
pub use request::{Argument, Arguments, BuiltRequest, ChildRequest, RequestType};
