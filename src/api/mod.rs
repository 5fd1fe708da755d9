//! REST request pipeline.
//!
//! An [`Endpoint`] describes one call. The [`RequestEncoder`] turns it into
//! a [`NetworkRequest`], waiting for the realtime connection id when the
//! endpoint needs one, an [`HttpTransport`](crate::transports::HttpTransport)
//! executes it and the [`RequestDecoder`] turns the outcome into a typed
//! response. [`ApiClient`] drives the three.

mod client;
mod credentials;
mod decoder;
mod encoder;
mod endpoint;
mod provider;
pub mod query;

pub use client::ApiClient;
pub use credentials::{ApiKey, Token};
pub use decoder::{
    decode_request_response, DefaultRequestDecoder, HttpResponse, RawResponse, RequestDecoder,
    TransportError,
};
pub use encoder::{
    DefaultRequestEncoder, NetworkRequest, RequestEncoder, API_KEY_QUERY_ITEM,
    AUTHORIZATION_HEADER, CONNECTION_ID_QUERY_ITEM, CONTENT_ENCODING_HEADER, CONTENT_TYPE_HEADER,
    STREAM_AUTH_TYPE_HEADER,
};
pub use endpoint::{AnyEndpoint, Body, Endpoint, HttpMethod};
pub use provider::{
    resolved_waiter, ConnectionDetailsProvider, ConnectionDetailsSlot, ConnectionIdWaiter,
    ProviderRegistration,
};
pub use query::{QueryItem, Queryable};
