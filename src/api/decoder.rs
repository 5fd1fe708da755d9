//! Decoding of raw transport output into typed responses.

use crate::error::{ClientError, ErrorPayload, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

/// Status line of an HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub url: Option<String>,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        Self { status, url: None }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Network-level failure reported by a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    pub message: String,
    pub is_timeout: bool,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_timeout: false,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_timeout: true,
        }
    }
}

/// Everything a transport hands back for one request.
///
/// Any combination may be present; an error may come with a response and
/// even with bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResponse {
    pub data: Option<Vec<u8>>,
    pub response: Option<HttpResponse>,
    pub error: Option<TransportError>,
}

impl RawResponse {
    /// A response with status and body
    pub fn success(status: u16, data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: Some(data.into()),
            response: Some(HttpResponse::new(status)),
            error: None,
        }
    }

    /// A transport failure, optionally with the status received before it
    pub fn failure(status: Option<u16>, error: TransportError) -> Self {
        Self {
            data: None,
            response: status.map(HttpResponse::new),
            error: Some(error),
        }
    }

    pub fn status(&self) -> Option<u16> {
        self.response.as_ref().map(|r| r.status)
    }
}

/// Turns transport output into a JSON value or an error
pub trait RequestDecoder: Send + Sync {
    fn decode_json(&self, raw: RawResponse) -> Result<Value>;
}

/// Decode `raw` into `T` through `decoder`
pub fn decode_request_response<T: DeserializeOwned>(
    decoder: &dyn RequestDecoder,
    raw: RawResponse,
) -> Result<T> {
    let value = decoder.decode_json(raw)?;
    serde_json::from_value(value).map_err(|e| ClientError::decoding(e.to_string()))
}

/// The default decoder
#[derive(Debug, Default, Clone)]
pub struct DefaultRequestDecoder;

impl DefaultRequestDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl RequestDecoder for DefaultRequestDecoder {
    fn decode_json(&self, raw: RawResponse) -> Result<Value> {
        let status = raw.status();

        // A transport error wins over whatever body came with it
        if let Some(error) = raw.error {
            warn!("Request failed (status: {:?}): {}", status, error.message);
            return Err(ClientError::transport(status, error.message));
        }

        let response = raw.response.ok_or_else(|| {
            ClientError::unexpected_response("Expecting an HTTP response, but got none")
        })?;

        let data = match raw.data {
            Some(data) if !data.is_empty() => data,
            _ => {
                return Err(ClientError::empty_body(format!(
                    "Response with status {} from {} has no body",
                    response.status,
                    response.url.as_deref().unwrap_or("<unknown URL>")
                )))
            }
        };

        debug!("Response {} ({} bytes)", response.status, data.len());

        if !response.is_success() {
            if let Ok(payload) = serde_json::from_slice::<ErrorPayload>(&data) {
                warn!("Server returned error: {}", payload);
                return Err(ClientError::Server(payload));
            }
            return Err(ClientError::transport(
                Some(response.status),
                format!(
                    "Request failed with status {}: {}",
                    response.status,
                    String::from_utf8_lossy(&data)
                ),
            ));
        }

        serde_json::from_slice(&data).map_err(|e| ClientError::decoding(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct TestUser {
        name: String,
    }

    fn decode<T: DeserializeOwned>(raw: RawResponse) -> Result<T> {
        decode_request_response(&DefaultRequestDecoder::new(), raw)
    }

    #[test]
    fn test_decodes_success_body() {
        let raw = RawResponse::success(200, br#"{"name": "Luke"}"#.to_vec());
        let user: TestUser = decode(raw).unwrap();
        assert_eq!(user.name, "Luke");
    }

    #[test]
    fn test_transport_error_takes_precedence() {
        let raw = RawResponse {
            data: Some(br#"{"name": "Luke"}"#.to_vec()),
            response: Some(HttpResponse::new(444)),
            error: Some(TransportError::new("connection reset")),
        };

        let err = decode::<TestUser>(raw).unwrap_err();
        assert_eq!(err, ClientError::transport(Some(444), "connection reset"));
    }

    #[test]
    fn test_server_error_payload() {
        let body = serde_json::to_vec(&json!({
            "code": 4,
            "message": "bad request",
            "StatusCode": 400
        }))
        .unwrap();

        let err = decode::<TestUser>(RawResponse::success(400, body)).unwrap_err();
        let payload = err.server_payload().unwrap();
        assert_eq!(payload.code, 4);
        assert_eq!(payload.status_code, 400);
    }

    #[test]
    fn test_unparsable_error_body_keeps_status() {
        let err = decode::<TestUser>(RawResponse::success(502, b"Bad Gateway".to_vec())).unwrap_err();
        assert!(matches!(err, ClientError::Transport { status: Some(502), .. }));
    }

    #[test]
    fn test_empty_body() {
        let err = decode::<TestUser>(RawResponse::success(200, Vec::new())).unwrap_err();
        assert!(matches!(err, ClientError::EmptyBody { .. }));
    }

    #[test]
    fn test_missing_response() {
        let err = decode::<TestUser>(RawResponse::default()).unwrap_err();
        assert!(matches!(err, ClientError::UnexpectedResponse { .. }));
    }

    #[test]
    fn test_schema_mismatch_is_decoding_error() {
        let raw = RawResponse::success(200, br#"{"id": 1}"#.to_vec());
        assert!(matches!(
            decode::<TestUser>(raw),
            Err(ClientError::Decoding { .. })
        ));

        let raw = RawResponse::success(200, b"not json".to_vec());
        assert!(matches!(
            decode::<TestUser>(raw),
            Err(ClientError::Decoding { .. })
        ));
    }
}
