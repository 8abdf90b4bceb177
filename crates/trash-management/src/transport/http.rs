use super::{Transport, TransportError};
use crate::config::ServiceConfig;
use crate::model::{CallDescriptor, HttpMethod};
use async_trait::async_trait;
use reqwest::header::{HeaderValue, CACHE_CONTROL};
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use topic_bus::{empty_payload, Payload};
use tracing::{debug, trace};

/// Talks to the repository through the web tier's proxy.
pub struct HttpTransport {
    client: Client,
    proxy_uri: String,
}

impl HttpTransport {
    pub fn new(config: &ServiceConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;
        Ok(Self {
            client,
            proxy_uri: config.proxy_uri.clone(),
        })
    }

    /// Joins the proxy URI and a relative endpoint with exactly one slash.
    pub fn url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.proxy_uri.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, call: CallDescriptor) -> Result<Payload, TransportError> {
        let url = self.url(&call.endpoint);
        debug!(method = %call.method, %url, "Backend call");

        let mut request = match call.method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
        };
        if !call.query_parameters.is_empty() {
            request = request.query(call.query_parameters.as_slice());
        }
        if let Some(body) = &call.body {
            request = request.json(body);
        }
        if call.prevent_cache {
            request = request.header(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))?;
        trace!(%url, status = status.as_u16(), bytes = text.len(), "Backend response");

        if status.is_success() {
            decode_body(&text)
        } else {
            let body = decode_body(&text).unwrap_or_else(|_| json!({ "message": text }));
            Err(TransportError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}

/// An empty body decodes to `{}`.
fn decode_body(text: &str) -> Result<Payload, TransportError> {
    if text.trim().is_empty() {
        return Ok(empty_payload());
    }
    serde_json::from_str(text).map_err(|e| TransportError::Decode(e.to_string()))
}
