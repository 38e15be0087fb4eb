//! Error taxonomy for the Honeycomb client core.
//!
//! Every variant is terminal: the operation that produced it is abandoned and
//! nothing is retried at this layer. The payload normaliser never produces any
//! of these; it degrades to "no records" instead.

use thiserror::Error;

/// Error type returned by [`crate::contract::Transport`] implementations.
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

pub type Result<T, E = HoneycombError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum HoneycombError {
    /// A required credential or setting was neither passed nor found in the environment.
    #[error("{setting} not specified and environment variable {env_var} not set")]
    Configuration {
        setting: &'static str,
        env_var: &'static str,
    },

    /// Reserved argument name or malformed argument structure.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Return shape is empty or a mapping node does not carry exactly one key.
    #[error("invalid return shape: {0}")]
    InvalidShape(String),

    #[error("{request_name} arguments do not contain {field} field")]
    MissingUploadField {
        request_name: String,
        field: &'static str,
    },

    #[error("received unexpected response from Honeycomb: {0}")]
    MalformedResponse(String),

    #[error("Honeycomb reported count as {reported} but received {received} data points")]
    CountMismatch { reported: u64, received: usize },

    #[error("returned datum does not contain field {field}")]
    MissingIdentifierField { field: String },

    #[error("transport failed: {0}")]
    Transport(#[source] TransportError),
}

impl From<TransportError> for HoneycombError {
    fn from(e: TransportError) -> Self {
        HoneycombError::Transport(e)
    }
}
