//! # Chatlink Client
//!
//! The REST request pipeline of a realtime chat client.
//!
//! ## Features
//!
//! - Typed endpoints with query, body and auth requirements
//! - Requests gated on the connection id of a concurrently running realtime
//!   connection, queued across connect/disconnect cycles
//! - JWT or anonymous auth, optional gzip of request bodies
//! - Server error payloads decoded into typed errors
//! - Pluggable encoder, decoder and HTTP transport (reqwest by default)
//!
//! ## Example
//!
//! ```ignore
//! use chatlink_client::{
//!     endpoints, ApiClient, ClientOptions, ConnectionIdCoordinator, ConnectionState, Token,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ApiClient::new(ClientOptions::new("your-api-key"))?;
//!
//!     let coordinator = Arc::new(ConnectionIdCoordinator::new(true));
//!     coordinator.set_token(Some(Token::new("user-jwt")));
//!     let _registration = client.register_provider(&coordinator);
//!
//!     // Fed by the realtime connection
//!     coordinator.update_connection_state(ConnectionState::Connected {
//!         connection_id: "conn-1".into(),
//!     });
//!
//!     let query = endpoints::ChannelListQuery::new(serde_json::json!({})).watch(true);
//!     let page = client.request(&endpoints::channels(&query)?).await?;
//!     println!("{} channels", page.channels.len());
//!
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod api;
pub mod connection;
pub mod endpoints;
pub mod transports;

mod error;
mod options;

// Re-exports
pub use api::{
    AnyEndpoint, ApiClient, ApiKey, Body, ConnectionDetailsProvider, ConnectionDetailsSlot,
    DefaultRequestDecoder, DefaultRequestEncoder, Endpoint, HttpMethod, NetworkRequest,
    ProviderRegistration, QueryItem, Queryable, RawResponse, RequestDecoder, RequestEncoder,
    Token,
};
pub use connection::{ConnectionId, ConnectionIdCoordinator, ConnectionState, DisconnectReason};
pub use error::{ClientError, ErrorPayload, Result};
pub use options::{ClientOptions, Config, CLIENT_HEADER_VALUE, DEFAULT_BASE_URL};
pub use transports::HttpTransport;
#[cfg(feature = "native")]
pub use transports::ReqwestTransport;
