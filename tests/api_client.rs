//! Integration tests for the API client with spy collaborators.
//!
//! Run with: cargo test --test api_client -- --nocapture

use async_trait::async_trait;
use chatlink_client::api::HttpResponse;
use chatlink_client::{
    AnyEndpoint, ApiClient, ApiKey, ClientError, ConnectionId, ConnectionIdCoordinator,
    ConnectionState, DefaultRequestDecoder, DefaultRequestEncoder, Endpoint, HttpMethod,
    HttpTransport, NetworkRequest, RawResponse, RequestDecoder, RequestEncoder, Result,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use url::Url;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct TestUser {
    name: String,
}

fn test_request(endpoint: &AnyEndpoint) -> NetworkRequest {
    let url = Url::parse("https://chat.example.com/")
        .unwrap()
        .join(&endpoint.path)
        .unwrap();
    NetworkRequest::new(endpoint.method, url)
}

/// Records the endpoints it encodes; optionally fails
#[derive(Default)]
struct SpyEncoder {
    encoded: Mutex<Vec<AnyEndpoint>>,
    failure: Option<ClientError>,
}

#[async_trait]
impl RequestEncoder for SpyEncoder {
    async fn encode_request(&self, endpoint: &AnyEndpoint) -> Result<NetworkRequest> {
        self.encoded.lock().push(endpoint.clone());
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(test_request(endpoint)),
        }
    }
}

/// Records what it is asked to decode, then delegates to the default decoder
#[derive(Default)]
struct SpyDecoder {
    decoded: Mutex<Vec<RawResponse>>,
}

impl RequestDecoder for SpyDecoder {
    fn decode_json(&self, raw: RawResponse) -> Result<Value> {
        self.decoded.lock().push(raw.clone());
        DefaultRequestDecoder::new().decode_json(raw)
    }
}

/// Answers every request with a canned response
struct SpyTransport {
    response: RawResponse,
    requests: Mutex<Vec<NetworkRequest>>,
    calls: AtomicUsize,
}

impl SpyTransport {
    fn new(response: RawResponse) -> Arc<Self> {
        Arc::new(Self {
            response,
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HttpTransport for SpyTransport {
    async fn execute(&self, request: NetworkRequest) -> RawResponse {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request);
        self.response.clone()
    }
}

/// Holds every request until released
struct GatedTransport {
    started: mpsc::UnboundedSender<()>,
    release: tokio::sync::Notify,
}

#[async_trait]
impl HttpTransport for GatedTransport {
    async fn execute(&self, _request: NetworkRequest) -> RawResponse {
        let _ = self.started.send(());
        self.release.notified().await;
        RawResponse::success(200, br#"{"name": "Han"}"#.to_vec())
    }
}

fn luke_response() -> RawResponse {
    RawResponse {
        data: Some(br#"{"name": "Luke"}"#.to_vec()),
        response: Some(HttpResponse::new(234)),
        error: None,
    }
}

// ============================================================================
// Request Flow Tests
// ============================================================================

#[tokio::test]
async fn test_request_encodes_sends_and_decodes() {
    let encoder = Arc::new(SpyEncoder::default());
    let decoder = Arc::new(SpyDecoder::default());
    let transport = SpyTransport::new(luke_response());
    let client = ApiClient::with_components(encoder.clone(), decoder.clone(), transport.clone());

    let endpoint = Endpoint::<TestUser>::new("users", HttpMethod::Post)
        .json_body(&TestUser { name: "Leia".to_string() })
        .unwrap();
    let user = client.request(&endpoint).await.unwrap();

    assert_eq!(user, TestUser { name: "Luke".to_string() });

    assert_eq!(encoder.encoded.lock().as_slice(), &[endpoint.erased().clone()]);

    assert_eq!(transport.calls(), 1);
    assert_eq!(transport.requests.lock()[0].url.path(), "/users");

    let decoded = decoder.decoded.lock();
    assert_eq!(decoded.len(), 1);
    assert_eq!(decoded[0].status(), Some(234));
    assert_eq!(decoded[0].data.as_deref(), Some(&br#"{"name": "Luke"}"#[..]));

    println!("✓ Decoded {:?}", user);
}

#[tokio::test]
async fn test_encoder_failure_short_circuits() {
    let encoder = Arc::new(SpyEncoder {
        failure: Some(ClientError::missing_connection_id("not connected")),
        ..SpyEncoder::default()
    });
    let decoder = Arc::new(SpyDecoder::default());
    let transport = SpyTransport::new(luke_response());
    let client = ApiClient::with_components(encoder, decoder.clone(), transport.clone());

    let endpoint = Endpoint::<TestUser>::new("channels", HttpMethod::Get).requires_connection_id(true);
    let result = client.request(&endpoint).await;

    assert!(matches!(result, Err(ClientError::MissingConnectionId { .. })));
    assert_eq!(transport.calls(), 0);
    assert!(decoder.decoded.lock().is_empty());
}

#[tokio::test]
async fn test_server_error_is_surfaced() {
    let body = br#"{"code": 16, "message": "channel not found", "StatusCode": 404}"#;
    let transport = SpyTransport::new(RawResponse::success(404, body.to_vec()));
    let client = ApiClient::with_components(
        Arc::new(SpyEncoder::default()),
        Arc::new(DefaultRequestDecoder::new()),
        transport,
    );

    let endpoint = Endpoint::<TestUser>::new("channels/messaging/missing", HttpMethod::Get);
    let error = client.request(&endpoint).await.unwrap_err();

    let payload = error.server_payload().expect("expected a server error");
    assert_eq!(payload.code, 16);
    assert_eq!(payload.status_code, 404);
}

#[tokio::test]
async fn test_provider_registered_on_client_reaches_default_encoder() {
    let encoder = DefaultRequestEncoder::new(
        Url::parse("https://chat.example.com/").unwrap(),
        ApiKey::new("abc123").unwrap(),
    );
    let transport = SpyTransport::new(luke_response());
    let client = ApiClient::with_components(
        Arc::new(encoder),
        Arc::new(DefaultRequestDecoder::new()),
        transport.clone(),
    );

    let coordinator = Arc::new(ConnectionIdCoordinator::new(true));
    coordinator.update_connection_state(ConnectionState::Connected {
        connection_id: ConnectionId::new("conn-1"),
    });
    let _registration = client.register_provider(&coordinator);
    assert!(client.connection_details().is_registered());

    let endpoint = Endpoint::<TestUser>::new("channels", HttpMethod::Get).requires_connection_id(true);
    let user = client.request(&endpoint).await.unwrap();
    assert_eq!(user.name, "Luke");

    let requests = transport.requests.lock();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].url.query(),
        Some("api_key=abc123&connection_id=conn-1")
    );
}

// ============================================================================
// Completion Tests
// ============================================================================

#[tokio::test]
async fn test_completion_runs_exactly_once() {
    let transport = SpyTransport::new(luke_response());
    let client = ApiClient::with_components(
        Arc::new(SpyEncoder::default()),
        Arc::new(DefaultRequestDecoder::new()),
        transport.clone(),
    );

    let (tx, mut rx) = mpsc::unbounded_channel();
    client.request_with_completion(
        Endpoint::<TestUser>::new("users/luke", HttpMethod::Get),
        move |result| {
            let _ = tx.send(result);
        },
    );

    let result = rx.recv().await.expect("completion never ran");
    assert_eq!(result.unwrap().name, "Luke");

    // Sender was moved into the completion, so a closed channel means it ran once
    assert!(rx.recv().await.is_none());
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn test_completion_receives_encoder_failure() {
    let encoder = Arc::new(SpyEncoder {
        failure: Some(ClientError::invalid_json("bad body")),
        ..SpyEncoder::default()
    });
    let transport = SpyTransport::new(luke_response());
    let client =
        ApiClient::with_components(encoder, Arc::new(DefaultRequestDecoder::new()), transport.clone());

    let (tx, rx) = oneshot::channel();
    client.request_with_completion(
        Endpoint::<TestUser>::new("users", HttpMethod::Get),
        move |result| {
            let _ = tx.send(result);
        },
    );

    assert!(matches!(rx.await.unwrap(), Err(ClientError::InvalidJson { .. })));
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn test_dropping_client_cancels_in_flight_request() {
    let (started_tx, mut started_rx) = mpsc::unbounded_channel();
    let transport = Arc::new(GatedTransport {
        started: started_tx,
        release: tokio::sync::Notify::new(),
    });
    let client = ApiClient::with_components(
        Arc::new(SpyEncoder::default()),
        Arc::new(DefaultRequestDecoder::new()),
        transport.clone(),
    );

    let (tx, rx) = oneshot::channel();
    client.request_with_completion(
        Endpoint::<TestUser>::new("users/han", HttpMethod::Get),
        move |result| {
            let _ = tx.send(result);
        },
    );

    started_rx.recv().await.expect("request never reached the transport");
    drop(client);

    let result = tokio::time::timeout(Duration::from_secs(1), rx)
        .await
        .expect("completion never ran")
        .unwrap();
    assert!(matches!(result, Err(ClientError::Cancelled { .. })));

    // Releasing the transport afterwards must not produce a second completion
    transport.release.notify_waiters();
}

#[tokio::test]
async fn test_concurrent_requests_complete_independently() {
    let transport = SpyTransport::new(luke_response());
    let client = ApiClient::with_components(
        Arc::new(SpyEncoder::default()),
        Arc::new(DefaultRequestDecoder::new()),
        transport.clone(),
    );

    let (tx, mut rx) = mpsc::unbounded_channel();
    for i in 0..8 {
        let tx = tx.clone();
        client.request_with_completion(
            Endpoint::<TestUser>::new(format!("users/{}", i), HttpMethod::Get),
            move |result| {
                let _ = tx.send(result);
            },
        );
    }
    drop(tx);

    let mut completed = 0;
    while let Some(result) = rx.recv().await {
        assert!(result.is_ok());
        completed += 1;
    }
    assert_eq!(completed, 8);
    assert_eq!(transport.calls(), 8);
}
