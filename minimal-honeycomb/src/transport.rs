#![doc = "HTTP transport: bridges the core `Transport` contract to the Honeycomb GraphQL endpoint."]
//
//! # HTTP Transport (CLI <-> Core)
//!
//! [`HttpTransport`] implements [`minimal_honeycomb_core::Transport`] with `reqwest`.
//!
//! - Credentials: OAuth2 client-credentials grant against the configured token
//!   URI. The access token is fetched on first use and kept for the lifetime of
//!   the transport; it is never refreshed.
//! - Plain requests are sent as a JSON body `{query, variables}`.
//! - Requests with attachments follow the GraphQL multipart request layout:
//!   an `operations` part, a `map` part, then one file part per attachment.
//! - A non-2xx status, a non-JSON body or a non-empty `errors` array is an error.
//!   Nothing is retried.

use async_trait::async_trait;
use minimal_honeycomb_core::{Attachment, ClientConfig, Transport, TransportError};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::sync::OnceCell;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<Value>>,
}

pub struct HttpTransport {
    http: reqwest::Client,
    config: ClientConfig,
    access_token: OnceCell<String>,
}

impl HttpTransport {
    pub fn new(config: ClientConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder().build().map_err(|e| {
            tracing::error!(error = ?e, "Failed to build HTTP client");
            e
        })?;
        tracing::info!(uri = %config.uri, "Initialized HttpTransport");
        Ok(HttpTransport {
            http,
            config,
            access_token: OnceCell::new(),
        })
    }

    async fn access_token(&self) -> Result<&str, TransportError> {
        let token = self
            .access_token
            .get_or_try_init(|| self.request_token())
            .await?;
        Ok(token.as_str())
    }

    async fn request_token(&self) -> Result<String, TransportError> {
        tracing::info!(
            token_uri = %self.config.token_uri,
            audience = %self.config.audience,
            "Requesting access token"
        );
        let response = self
            .http
            .post(&self.config.token_uri)
            .json(&json!({
                "grant_type": "client_credentials",
                "audience": self.config.audience,
                "client_id": self.config.client_id,
                "client_secret": self.config.client_secret,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, "Token request rejected");
            return Err(format!("token request failed with status {status}: {body}").into());
        }
        let token: TokenResponse = response.json().await?;
        tracing::info!("Access token acquired");
        Ok(token.access_token)
    }

    fn multipart_form(
        document: &str,
        variables: &Map<String, Value>,
        attachments: &[Attachment],
    ) -> Result<Form, TransportError> {
        let operations = json!({ "query": document, "variables": variables });
        let map: Map<String, Value> = attachments
            .iter()
            .enumerate()
            .map(|(index, attachment)| (index.to_string(), json!([attachment.map_path])))
            .collect();

        let mut form = Form::new()
            .text("operations", operations.to_string())
            .text("map", Value::Object(map).to_string());
        for (index, attachment) in attachments.iter().enumerate() {
            let part = Part::text(attachment.content.clone())
                .file_name(attachment.token.clone())
                .mime_str(&attachment.content_type)?;
            form = form.part(index.to_string(), part);
        }
        Ok(form)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(
        &self,
        document: &str,
        variables: &Map<String, Value>,
        attachments: &[Attachment],
    ) -> Result<Value, TransportError> {
        let token = self.access_token().await?;
        let request = self.http.post(&self.config.uri).bearer_auth(token);

        let request = if attachments.is_empty() {
            request.json(&json!({ "query": document, "variables": variables }))
        } else {
            tracing::debug!(attachments = attachments.len(), "Sending multipart request");
            request.multipart(Self::multipart_form(document, variables, attachments)?)
        };

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            tracing::error!(%status, "Honeycomb request rejected");
            return Err(format!("request failed with status {status}: {body}").into());
        }

        let parsed: GraphqlResponse = serde_json::from_str(&body).map_err(|e| {
            tracing::error!(error = %e, "Honeycomb response is not JSON");
            e
        })?;
        if let Some(errors) = parsed.errors.filter(|errors| !errors.is_empty()) {
            tracing::error!(errors = errors.len(), "Honeycomb returned GraphQL errors");
            return Err(format!("GraphQL errors: {}", Value::Array(errors)).into());
        }
        Ok(parsed.data.unwrap_or(Value::Null))
    }
}
