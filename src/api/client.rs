//! The API client: encode, send, decode.

use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::decoder::{decode_request_response, RequestDecoder};
use super::encoder::RequestEncoder;
use super::endpoint::{AnyEndpoint, Endpoint};
use super::provider::{ConnectionDetailsProvider, ConnectionDetailsSlot, ProviderRegistration};
use crate::error::{ClientError, Result};
use crate::transports::HttpTransport;

#[cfg(feature = "native")]
use super::decoder::DefaultRequestDecoder;
#[cfg(feature = "native")]
use super::encoder::DefaultRequestEncoder;
#[cfg(feature = "native")]
use crate::options::{ClientOptions, Config};

/// Collaborators shared between the client and its spawned requests
struct Pipeline {
    encoder: Arc<dyn RequestEncoder>,
    decoder: Arc<dyn RequestDecoder>,
    transport: Arc<dyn HttpTransport>,
    /// Log every encoded request at info level
    log_requests: bool,
}

impl Pipeline {
    async fn execute<R: DeserializeOwned>(&self, endpoint: &AnyEndpoint) -> Result<R> {
        debug!("Encoding {} {}", endpoint.method, endpoint.path);

        let request = match self.encoder.encode_request(endpoint).await {
            Ok(request) => request,
            Err(e) => {
                warn!("Failed to encode {} {}: {}", endpoint.method, endpoint.path, e);
                return Err(e);
            }
        };

        if self.log_requests {
            info!(
                "{} {} (headers: {:?}, body: {} bytes)",
                request.method,
                request.url,
                request.headers.keys().collect::<Vec<_>>(),
                request.body.as_ref().map_or(0, Vec::len)
            );
        }

        let raw = self.transport.execute(request).await;

        let result = decode_request_response(self.decoder.as_ref(), raw);
        if let Err(e) = &result {
            debug!("Request {} {} failed: {}", endpoint.method, endpoint.path, e);
        }
        result
    }
}

/// Executes endpoints against the chat API.
///
/// Each request is encoded (waiting for the realtime connection id if the
/// endpoint requires one), sent exactly once and decoded into the
/// endpoint's response type.
///
/// # Example
///
/// ```ignore
/// use chatlink_client::{endpoints, ApiClient, ClientOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = ApiClient::new(ClientOptions::new("your-api-key"))?;
///     let response = client.request(&endpoints::delete_message("msg-1", false)).await?;
///     Ok(())
/// }
/// ```
pub struct ApiClient {
    pipeline: Arc<Pipeline>,
    connection_details: ConnectionDetailsSlot,
    /// Closed on drop, which cancels spawned requests
    shutdown: watch::Sender<()>,
}

impl ApiClient {
    /// Create a client with the default encoder, decoder and reqwest
    /// transport
    #[cfg(feature = "native")]
    pub fn new(options: ClientOptions) -> Result<Self> {
        let config = Config::try_from(options)?;
        let connection_details = ConnectionDetailsSlot::new();

        let encoder =
            DefaultRequestEncoder::from_config(&config).with_connection_details(connection_details.clone());
        let transport = crate::transports::create_default_transport(&config)?;

        debug!("Creating API client for {}", config.base_url);

        Ok(Self::build(
            Arc::new(encoder),
            Arc::new(DefaultRequestDecoder::new()),
            transport,
            config.debug,
        ))
    }

    /// Create a client from explicit collaborators.
    ///
    /// Providers registered on the client go to the encoder's slot when it
    /// exposes one; otherwise use
    /// [`with_connection_details`](Self::with_connection_details).
    pub fn with_components(
        encoder: Arc<dyn RequestEncoder>,
        decoder: Arc<dyn RequestDecoder>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self::build(encoder, decoder, transport, false)
    }

    fn build(
        encoder: Arc<dyn RequestEncoder>,
        decoder: Arc<dyn RequestDecoder>,
        transport: Arc<dyn HttpTransport>,
        log_requests: bool,
    ) -> Self {
        let (shutdown, _) = watch::channel(());
        let connection_details = encoder.provider_slot().unwrap_or_default();
        Self {
            pipeline: Arc::new(Pipeline {
                encoder,
                decoder,
                transport,
                log_requests,
            }),
            connection_details,
            shutdown,
        }
    }

    /// Builder pattern: the slot [`register_provider`](Self::register_provider)
    /// writes to. Must be the slot the encoder reads from.
    pub fn with_connection_details(mut self, slot: ConnectionDetailsSlot) -> Self {
        self.connection_details = slot;
        self
    }

    /// Register the provider of connection ids and tokens.
    ///
    /// The client does not keep the provider alive; it stays registered
    /// until the returned guard is dropped.
    pub fn register_provider<P>(&self, provider: &Arc<P>) -> ProviderRegistration
    where
        P: ConnectionDetailsProvider + 'static,
    {
        self.connection_details.register(provider)
    }

    pub fn connection_details(&self) -> &ConnectionDetailsSlot {
        &self.connection_details
    }

    /// Execute `endpoint` and decode its response
    pub async fn request<R: DeserializeOwned>(&self, endpoint: &Endpoint<R>) -> Result<R> {
        self.pipeline.execute(endpoint.erased()).await
    }

    /// Execute `endpoint` on a spawned task and hand the result to
    /// `completion`.
    ///
    /// `completion` runs exactly once, on whatever thread finishes the
    /// request. If the client is dropped first it receives
    /// [`ClientError::Cancelled`].
    pub fn request_with_completion<R, F>(&self, endpoint: Endpoint<R>, completion: F)
    where
        R: DeserializeOwned + Send + 'static,
        F: FnOnce(Result<R>) + Send + 'static,
    {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                error!("Cannot spawn request outside of a tokio runtime: {}", e);
                completion(Err(ClientError::config(format!(
                    "No tokio runtime to run the request on: {}",
                    e
                ))));
                return;
            }
        };

        let pipeline = Arc::clone(&self.pipeline);
        let mut shutdown = self.shutdown.subscribe();
        let endpoint = AnyEndpoint::from(&endpoint);

        runtime.spawn(async move {
            let result = tokio::select! {
                result = pipeline.execute::<R>(&endpoint) => result,
                _ = shutdown.changed() => {
                    debug!("Cancelling {} {}", endpoint.method, endpoint.path);
                    Err(ClientError::cancelled("API client was dropped"))
                }
            };
            completion(result);
        });
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("connection_details", &self.connection_details)
            .field("in_flight", &self.shutdown.receiver_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{DefaultRequestDecoder, HttpMethod, NetworkRequest, RawResponse};
    use async_trait::async_trait;
    use serde_json::Value;
    use tokio::sync::oneshot;
    use url::Url;

    struct PassthroughEncoder;

    #[async_trait]
    impl RequestEncoder for PassthroughEncoder {
        async fn encode_request(&self, endpoint: &AnyEndpoint) -> Result<NetworkRequest> {
            let url = Url::parse("https://example.com/")?.join(&endpoint.path)?;
            Ok(NetworkRequest::new(endpoint.method, url))
        }
    }

    struct NeverTransport;

    #[async_trait]
    impl HttpTransport for NeverTransport {
        async fn execute(&self, _request: NetworkRequest) -> RawResponse {
            futures::future::pending().await
        }
    }

    fn client() -> ApiClient {
        ApiClient::with_components(
            Arc::new(PassthroughEncoder),
            Arc::new(DefaultRequestDecoder::new()),
            Arc::new(NeverTransport),
        )
    }

    #[tokio::test]
    async fn test_drop_cancels_spawned_request() {
        let client = client();
        let (tx, rx) = oneshot::channel();

        client.request_with_completion(
            Endpoint::<Value>::new("users", HttpMethod::Get),
            move |result| {
                let _ = tx.send(result);
            },
        );
        drop(client);

        let result = rx.await.unwrap();
        assert!(matches!(result, Err(ClientError::Cancelled { .. })));
    }

    #[test]
    fn test_completion_without_runtime_fails() {
        let client = client();
        let (tx, mut rx) = oneshot::channel();

        client.request_with_completion(
            Endpoint::<Value>::new("users", HttpMethod::Get),
            move |result| {
                let _ = tx.send(result);
            },
        );

        let result = rx.try_recv().unwrap();
        assert!(matches!(result, Err(ClientError::Configuration { .. })));
    }
}
