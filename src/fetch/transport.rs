//! Transport seam between the orchestrator and the network
//!
//! The orchestrator only needs "issue a request, get a status and a JSON body".
//! `HttpTransport` does that over reqwest; tests plug in scripted fakes.

use reqwest::Client;
use serde_json::Value;
use std::future::Future;

use super::{Request, TransportError};

/// Status and decoded body of one HTTP exchange
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Value,
}

impl TransportResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn ok(body: Value) -> Self {
        Self::new(200, body)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Anything that can carry a single attempt of a `Request`
pub trait Transport: Send + Sync + 'static {
    fn issue(
        &self,
        request: &Request,
    ) -> impl Future<Output = Result<TransportResponse, TransportError>> + Send;
}

/// reqwest-backed transport
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: Client,
    base_url: Option<String>,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport with a custom HTTP client
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            base_url: None,
        }
    }

    /// Prefix applied to request URLs that are not absolute
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    fn resolve(&self, url: &str) -> String {
        match &self.base_url {
            Some(base) if !url.contains("://") => format!(
                "{}/{}",
                base.trim_end_matches('/'),
                url.trim_start_matches('/')
            ),
            _ => url.to_string(),
        }
    }
}

impl Transport for HttpTransport {
    async fn issue(&self, request: &Request) -> Result<TransportResponse, TransportError> {
        let url = self.resolve(&request.url);
        let mut builder = self.client.request(request.method.into(), url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        let body = parse_body(status, &text)?;

        Ok(TransportResponse { status, body })
    }
}

/// Decodes a response body
///
/// Empty bodies and bodies of failed responses become `Null`; failed responses are
/// reported by status alone and their bodies are often HTML.
fn parse_body(status: u16, text: &str) -> Result<Value, TransportError> {
    if text.trim().is_empty() || !(200..300).contains(&status) {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(text)?)
}
