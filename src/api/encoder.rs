//! Encoding of endpoints into transport-ready requests.

use super::endpoint::{AnyEndpoint, Body, HttpMethod};
use super::provider::{
    ConnectionDetailsProvider, ConnectionDetailsSlot, ConnectionIdWaiter, ProviderRegistration,
};
use super::query::{self, QueryItem, Queryable};
use super::ApiKey;
use crate::connection::ConnectionId;
use crate::error::{ClientError, Result};
use crate::options::Config;
use async_trait::async_trait;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

pub const API_KEY_QUERY_ITEM: &str = "api_key";
pub const CONNECTION_ID_QUERY_ITEM: &str = "connection_id";
pub const STREAM_AUTH_TYPE_HEADER: &str = "Stream-Auth-Type";
pub const AUTHORIZATION_HEADER: &str = "Authorization";
pub const CONTENT_TYPE_HEADER: &str = "Content-Type";
pub const CONTENT_ENCODING_HEADER: &str = "Content-Encoding";

/// A fully encoded request, ready to hand to a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Vec<u8>>,
}

impl NetworkRequest {
    pub fn new(method: HttpMethod, url: Url) -> Self {
        Self {
            method,
            url,
            headers: BTreeMap::new(),
            body: None,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// First value of a query parameter, percent-decoded
    pub fn query_value(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    /// All decoded query parameters in order
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(name.to_string(), value.into());
    }
}

/// Turns endpoints into network requests
#[async_trait]
pub trait RequestEncoder: Send + Sync {
    /// Encode `endpoint`. Suspends while a required connection id is pending.
    async fn encode_request(&self, endpoint: &AnyEndpoint) -> Result<NetworkRequest>;

    /// The slot this encoder asks for connection details, if it has one
    fn provider_slot(&self) -> Option<ConnectionDetailsSlot> {
        None
    }
}

/// The default encoder: API key, auth headers, JSON bodies and connection ids
pub struct DefaultRequestEncoder {
    base_url: Url,
    api_key: ApiKey,
    gzip_requests: bool,
    connection_id_timeout: Option<Duration>,
    connection_details: ConnectionDetailsSlot,
}

impl DefaultRequestEncoder {
    /// Create a new encoder
    pub fn new(base_url: Url, api_key: ApiKey) -> Self {
        Self {
            base_url,
            api_key,
            gzip_requests: false,
            connection_id_timeout: None,
            connection_details: ConnectionDetailsSlot::new(),
        }
    }

    /// Create an encoder from the client configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.base_url.clone(), config.api_key.clone())
            .gzip_requests(config.gzip_requests)
            .connection_id_timeout(config.connection_id_timeout)
    }

    /// Builder pattern: gzip bodies when it makes them smaller
    pub fn gzip_requests(mut self, enabled: bool) -> Self {
        self.gzip_requests = enabled;
        self
    }

    /// Builder pattern: bound the wait for a connection id
    pub fn connection_id_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connection_id_timeout = timeout;
        self
    }

    /// Builder pattern: share a provider slot with other components
    pub fn with_connection_details(mut self, slot: ConnectionDetailsSlot) -> Self {
        self.connection_details = slot;
        self
    }

    /// Register the provider of connection ids and tokens
    pub fn register_provider<P>(&self, provider: &Arc<P>) -> ProviderRegistration
    where
        P: ConnectionDetailsProvider + 'static,
    {
        self.connection_details.register(provider)
    }

    pub fn connection_details(&self) -> &ConnectionDetailsSlot {
        &self.connection_details
    }

    /// Everything that can be encoded without asking the provider
    fn encode_base(&self, endpoint: &AnyEndpoint) -> Result<NetworkRequest> {
        let url = self.encode_request_url(&endpoint.path)?;
        let mut request = NetworkRequest::new(endpoint.method, url);

        append_query_items(
            &mut request.url,
            &[QueryItem::new(API_KEY_QUERY_ITEM, self.api_key.as_str())],
        );
        append_query_items(&mut request.url, &endpoint.query_items);

        self.encode_body(&mut request, endpoint)?;
        Ok(request)
    }

    fn encode_request_url(&self, path: &str) -> Result<Url> {
        if self.base_url.cannot_be_a_base() {
            return Err(ClientError::invalid_url(format!(
                "URL can't be created from base: {}",
                self.base_url
            )));
        }

        let mut url = self.base_url.clone();
        url.set_query(None);
        url.set_fragment(None);
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                ClientError::invalid_url(format!("Can't append path '{}' to {}", path, self.base_url))
            })?;
            segments.pop_if_empty();
            // Paths arrive percent-encoded; `push` encodes again
            for segment in path.split('/').filter(|s| !s.is_empty()) {
                let segment = urlencoding::decode(segment).map_err(|e| {
                    ClientError::invalid_url(format!("Invalid path segment '{}': {}", segment, e))
                })?;
                segments.push(&segment);
            }
        }
        Ok(url)
    }

    fn encode_body(&self, request: &mut NetworkRequest, endpoint: &AnyEndpoint) -> Result<()> {
        if !endpoint.method.has_body() {
            let items = match &endpoint.body {
                None => return Ok(()),
                Some(Body::Json(value)) => value.to_query_items()?,
                Some(Body::Raw(bytes)) => query::from_json_bytes(bytes)?,
            };
            append_query_items(&mut request.url, &items);
            return Ok(());
        }

        // The API rejects body methods without a JSON body, even an empty one
        let json = match &endpoint.body {
            None => b"{}".to_vec(),
            Some(Body::Json(value)) => serde_json::to_vec(value)?,
            Some(Body::Raw(bytes)) => bytes.clone(),
        };
        request.set_header(CONTENT_TYPE_HEADER, "application/json");

        if self.gzip_requests {
            if let Some(compressed) = gzip_if_smaller(&json) {
                request.set_header(CONTENT_ENCODING_HEADER, "gzip");
                request.body = Some(compressed);
                return Ok(());
            }
        }
        request.body = Some(json);
        Ok(())
    }

    fn add_authorization(
        &self,
        request: &mut NetworkRequest,
        endpoint: &AnyEndpoint,
        provider: Option<&dyn ConnectionDetailsProvider>,
    ) {
        let token = if endpoint.requires_token {
            provider.and_then(|p| p.provide_token())
        } else {
            None
        };

        match token {
            Some(token) if !token.is_anonymous() => {
                request.set_header(STREAM_AUTH_TYPE_HEADER, "jwt");
                request.set_header(AUTHORIZATION_HEADER, token.raw_value());
            }
            _ => request.set_header(STREAM_AUTH_TYPE_HEADER, "anonymous"),
        }
    }

    async fn await_connection_id(&self, waiter: ConnectionIdWaiter) -> Result<ConnectionId> {
        let outcome = match self.connection_id_timeout {
            Some(limit) => match tokio::time::timeout(limit, waiter).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!("Timed out after {:?} waiting for a connection id", limit);
                    return Err(ClientError::missing_connection_id(format!(
                        "Timed out after {:?} waiting for `connection_id`",
                        limit
                    )));
                }
            },
            None => waiter.await,
        };

        match outcome {
            Ok(Some(connection_id)) => Ok(connection_id),
            Ok(None) => Err(ClientError::missing_connection_id(
                "Failed to get `connection_id`, request can't be created.",
            )),
            Err(_) => Err(ClientError::missing_connection_id(
                "Connection details provider went away before providing a `connection_id`",
            )),
        }
    }
}

#[async_trait]
impl RequestEncoder for DefaultRequestEncoder {
    async fn encode_request(&self, endpoint: &AnyEndpoint) -> Result<NetworkRequest> {
        let mut request = self.encode_base(endpoint)?;

        let provider = self.connection_details.current();
        self.add_authorization(&mut request, endpoint, provider.as_deref());

        if !endpoint.requires_connection_id {
            debug!("Encoded {} {}", request.method, endpoint.path);
            return Ok(request);
        }

        // Only the waiter is held across the await, never the provider
        let waiter = match provider {
            Some(provider) => provider.provide_connection_id(),
            None => {
                warn!(
                    "Endpoint '{}' requires a connection id but no provider is registered",
                    endpoint.path
                );
                return Err(ClientError::missing_connection_id(
                    "No connection details provider is registered",
                ));
            }
        };

        let connection_id = self.await_connection_id(waiter).await?;
        append_query_items(
            &mut request.url,
            &[QueryItem::new(CONNECTION_ID_QUERY_ITEM, connection_id.as_str())],
        );

        debug!(
            "Encoded {} {} with connection id",
            request.method, endpoint.path
        );
        Ok(request)
    }
    fn provider_slot(&self) -> Option<ConnectionDetailsSlot> {
        Some(self.connection_details.clone())
    }
}

impl std::fmt::Debug for DefaultRequestEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultRequestEncoder")
            .field("base_url", &self.base_url.as_str())
            .field("gzip_requests", &self.gzip_requests)
            .field("connection_id_timeout", &self.connection_id_timeout)
            .field("connection_details", &self.connection_details)
            .finish()
    }
}

/// Append items to the URL query; `+` in values ends up as `%2B`
fn append_query_items(url: &mut Url, items: &[QueryItem]) {
    if items.is_empty() {
        return;
    }
    let mut pairs = url.query_pairs_mut();
    for item in items {
        match &item.value {
            Some(value) => pairs.append_pair(&item.name, value),
            None => pairs.append_key_only(&item.name),
        };
    }
}

fn gzip_if_smaller(data: &[u8]) -> Option<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    if let Err(e) = encoder.write_all(data) {
        warn!("Failed to gzip request body: {}", e);
        return None;
    }
    match encoder.finish() {
        Ok(compressed) if compressed.len() < data.len() => Some(compressed),
        Ok(_) => None,
        Err(e) => {
            warn!("Failed to gzip request body: {}", e);
            None
        }
    }
}
