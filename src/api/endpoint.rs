//! Declarative description of a single API call.

use super::query::{QueryItem, Queryable};
use crate::error::Result;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;

/// HTTP method of an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// Whether the method carries a request body. Methods without one get
    /// their body flattened into query items instead.
    pub fn has_body(&self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of an endpoint
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Structured JSON value
    Json(Value),
    /// Pre-encoded JSON bytes, sent as-is
    Raw(Vec<u8>),
}

/// Untyped, comparable signature of an endpoint.
///
/// Carries everything the encoder needs plus the name of the expected
/// response type, so two signatures compare equal only when they describe
/// the same call expecting the same payload.
#[derive(Debug, Clone, PartialEq)]
pub struct AnyEndpoint {
    pub path: String,
    pub method: HttpMethod,
    pub query_items: Vec<QueryItem>,
    pub requires_connection_id: bool,
    pub requires_token: bool,
    pub body: Option<Body>,
    pub response_type: &'static str,
}

/// An API call expecting a response of type `R`.
///
/// Immutable once built; the builder methods consume and return the value.
pub struct Endpoint<R> {
    inner: AnyEndpoint,
    _response: PhantomData<fn() -> R>,
}

impl<R> Endpoint<R> {
    /// Create an endpoint with no query, no body, requiring a token but no
    /// connection id
    pub fn new(path: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            inner: AnyEndpoint {
                path: path.into(),
                method,
                query_items: Vec::new(),
                requires_connection_id: false,
                requires_token: true,
                body: None,
                response_type: std::any::type_name::<R>(),
            },
            _response: PhantomData,
        }
    }

    /// Builder pattern: append query items
    pub fn query<Q: Queryable + ?Sized>(mut self, query: &Q) -> Result<Self> {
        self.inner.query_items.extend(query.to_query_items()?);
        Ok(self)
    }

    /// Builder pattern: append a single query item
    pub fn query_item(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.inner.query_items.push(QueryItem::new(name, value));
        self
    }

    /// Builder pattern: set the body from any serializable value
    pub fn json_body<B: Serialize + ?Sized>(self, body: &B) -> Result<Self> {
        Ok(self.body(Body::Json(serde_json::to_value(body)?)))
    }

    /// Builder pattern: set pre-encoded JSON bytes as body
    pub fn raw_body(self, bytes: impl Into<Vec<u8>>) -> Self {
        self.body(Body::Raw(bytes.into()))
    }

    /// Builder pattern: set the body
    pub fn body(mut self, body: Body) -> Self {
        self.inner.body = Some(body);
        self
    }

    /// Builder pattern: require a live realtime connection id
    pub fn requires_connection_id(mut self, required: bool) -> Self {
        self.inner.requires_connection_id = required;
        self
    }

    /// Builder pattern: send the user token with the request
    pub fn requires_token(mut self, required: bool) -> Self {
        self.inner.requires_token = required;
        self
    }

    pub fn path(&self) -> &str {
        &self.inner.path
    }

    pub fn method(&self) -> HttpMethod {
        self.inner.method
    }

    pub fn query_items(&self) -> &[QueryItem] {
        &self.inner.query_items
    }

    pub fn body_payload(&self) -> Option<&Body> {
        self.inner.body.as_ref()
    }

    pub fn needs_connection_id(&self) -> bool {
        self.inner.requires_connection_id
    }

    pub fn needs_token(&self) -> bool {
        self.inner.requires_token
    }

    /// The untyped signature used by the encoder and for comparisons
    pub fn erased(&self) -> &AnyEndpoint {
        &self.inner
    }
}

impl<R> Clone for Endpoint<R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _response: PhantomData,
        }
    }
}

impl<R> PartialEq for Endpoint<R> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<R> fmt::Debug for Endpoint<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("path", &self.inner.path)
            .field("method", &self.inner.method)
            .field("query_items", &self.inner.query_items)
            .field("requires_connection_id", &self.inner.requires_connection_id)
            .field("requires_token", &self.inner.requires_token)
            .field("body", &self.inner.body)
            .field("response_type", &self.inner.response_type)
            .finish()
    }
}

impl<R> From<&Endpoint<R>> for AnyEndpoint {
    fn from(endpoint: &Endpoint<R>) -> Self {
        endpoint.inner.clone()
    }
}

impl<R> PartialEq<Endpoint<R>> for AnyEndpoint {
    fn eq(&self, other: &Endpoint<R>) -> bool {
        *self == other.inner
    }
}
