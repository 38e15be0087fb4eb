//! Connection settings for the Honeycomb endpoint.
//!
//! Five settings are required. Each is taken from the explicit value when one
//! is given, otherwise from its environment variable. All five are resolved up
//! front and the first missing one is reported by name.

use std::env;
use std::fmt;

use tracing::{error, info};

use crate::error::{HoneycombError, Result};

pub const URI_ENV: &str = "HONEYCOMB_URI";
pub const TOKEN_URI_ENV: &str = "HONEYCOMB_TOKEN_URI";
pub const AUDIENCE_ENV: &str = "HONEYCOMB_AUDIENCE";
pub const CLIENT_ID_ENV: &str = "HONEYCOMB_CLIENT_ID";
pub const CLIENT_SECRET_ENV: &str = "HONEYCOMB_CLIENT_SECRET";

/// Explicit values; `None` means "fall back to the environment".
#[derive(Debug, Clone, Default)]
pub struct ClientSettings {
    pub uri: Option<String>,
    pub token_uri: Option<String>,
    pub audience: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

/// Fully resolved settings.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub uri: String,
    pub token_uri: String,
    pub audience: String,
    pub client_id: String,
    pub client_secret: String,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("uri", &self.uri)
            .field("token_uri", &self.token_uri)
            .field("audience", &self.audience)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

impl ClientConfig {
    pub fn resolve(settings: ClientSettings) -> Result<Self> {
        let config = ClientConfig {
            uri: setting(settings.uri, "Honeycomb URI", URI_ENV)?,
            token_uri: setting(settings.token_uri, "Honeycomb token URI", TOKEN_URI_ENV)?,
            audience: setting(settings.audience, "Honeycomb audience", AUDIENCE_ENV)?,
            client_id: setting(settings.client_id, "Honeycomb client ID", CLIENT_ID_ENV)?,
            client_secret: setting(
                settings.client_secret,
                "Honeycomb client secret",
                CLIENT_SECRET_ENV,
            )?,
        };
        info!(
            uri = %config.uri,
            token_uri = %config.token_uri,
            audience = %config.audience,
            client_secret_set = !config.client_secret.is_empty(),
            "Resolved Honeycomb client configuration"
        );
        Ok(config)
    }

    pub fn from_env() -> Result<Self> {
        Self::resolve(ClientSettings::default())
    }
}

fn setting(explicit: Option<String>, name: &'static str, env_var: &'static str) -> Result<String> {
    if let Some(value) = explicit {
        return Ok(value);
    }
    env::var(env_var).map_err(|e| {
        error!(error = ?e, setting = name, env_var, "Required setting missing");
        HoneycombError::Configuration {
            setting: name,
            env_var,
        }
    })
}
