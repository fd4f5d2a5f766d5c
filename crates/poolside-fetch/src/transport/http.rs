//! reqwest-backed transport

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::target::{Method, RequestDescriptor};
use crate::transport::{Transport, TransportError, TransportResponse};

/// HTTP transport over a shared `reqwest::Client`
///
/// Relative target URLs are resolved against the configured base URL.
/// Bodies that are not JSON are handed back as a JSON string so error
/// pages still reach the controller.
#[derive(Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Option<Url>,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(base_url: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            client: reqwest::Client::new(),
            base_url: Some(Url::parse(base_url)?),
        })
    }

    pub fn with_client(client: reqwest::Client, base_url: Option<Url>) -> Self {
        Self { client, base_url }
    }

    fn resolve(&self, url: &str) -> Result<Url, TransportError> {
        match Url::parse(url) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => self
                .base_url
                .as_ref()
                .ok_or_else(|| {
                    TransportError::NoResponse(format!("relative URL without base: {}", url))
                })?
                .join(url)
                .map_err(|e| TransportError::NoResponse(e.to_string())),
            Err(e) => Err(TransportError::NoResponse(e.to_string())),
        }
    }
}

fn reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn decode_body(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        descriptor: RequestDescriptor,
        cancel: CancellationToken,
    ) -> Result<TransportResponse, TransportError> {
        let url = self.resolve(&descriptor.url)?;
        tracing::debug!(method = %descriptor.method, %url, "sending request");

        let mut request = self.client.request(reqwest_method(descriptor.method), url);
        for (name, value) in &descriptor.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &descriptor.body {
            request = request.json(body);
        }

        let exchange = async {
            let response = request
                .send()
                .await
                .map_err(|e| TransportError::NoResponse(e.to_string()))?;
            let status = response.status().as_u16();
            let bytes = response
                .bytes()
                .await
                .map_err(|e| TransportError::NoResponse(e.to_string()))?;

            Ok(TransportResponse::new(status, decode_body(&bytes)))
        };

        tokio::select! {
            _ = cancel.cancelled() => Err(TransportError::Aborted),
            result = exchange => result,
        }
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
