//! Native HTTP transport implementation using reqwest.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::time::Duration;
use tracing::{debug, error};

use super::transport::HttpTransport;
use crate::api::{HttpMethod, HttpResponse, NetworkRequest, RawResponse, TransportError};
use crate::error::{ClientError, Result};
use crate::options::Config;

/// Header identifying the client library
pub const CLIENT_HEADER: &str = "x-stream-client";

/// Native HTTP transport
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport with the given timeout and client header
    pub fn new(timeout: Duration, client_header: &str) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        let value = HeaderValue::from_str(client_header)
            .map_err(|e| ClientError::config(format!("Invalid client header: {}", e)))?;
        default_headers.insert(HeaderName::from_static(CLIENT_HEADER), value);

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(default_headers)
            .build()
            .map_err(|e| ClientError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Create a transport from the client configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.request_timeout, &config.client_header)
    }

    /// Wrap an already configured reqwest client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn build(&self, request: NetworkRequest) -> reqwest::RequestBuilder {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        builder
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: NetworkRequest) -> RawResponse {
        debug!("Sending {} {}", request.method, request.url.path());

        let response = match self.build(request).send().await {
            Ok(response) => response,
            Err(e) => {
                error!("HTTP request failed: {:?}", e);
                let status = e.status().map(|s| s.as_u16());
                let error = if e.is_timeout() {
                    TransportError::timeout(e.to_string())
                } else {
                    TransportError::new(e.to_string())
                };
                return RawResponse::failure(status, error);
            }
        };

        let http_response = HttpResponse {
            status: response.status().as_u16(),
            url: Some(response.url().to_string()),
        };

        match response.bytes().await {
            Ok(bytes) => RawResponse {
                data: Some(bytes.to_vec()),
                response: Some(http_response),
                error: None,
            },
            Err(e) => {
                error!("Failed to read response body: {:?}", e);
                RawResponse {
                    data: None,
                    response: Some(http_response),
                    error: Some(TransportError::new(e.to_string())),
                }
            }
        }
    }
}
