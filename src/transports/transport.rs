//! Transport trait definition.

use crate::api::{NetworkRequest, RawResponse};
use async_trait::async_trait;

/// The HTTP session requests are executed on.
///
/// A transport never fails on its own: whatever happened, including network
/// errors, is reported inside the [`RawResponse`] for the decoder to judge.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Execute one request
    async fn execute(&self, request: NetworkRequest) -> RawResponse;
}
