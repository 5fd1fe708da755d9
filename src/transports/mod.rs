//! HTTP transport implementations.
//!
//! The transport layer abstracts the HTTP session the API client talks
//! through and provides a common interface via the `HttpTransport` trait.

mod transport;

pub use transport::HttpTransport;

/// Native HTTP transport (reqwest)
#[cfg(feature = "native")]
pub mod native;

#[cfg(feature = "native")]
pub use native::ReqwestTransport;

/// Create the default transport for the given configuration
#[cfg(feature = "native")]
pub fn create_default_transport(
    config: &crate::options::Config,
) -> crate::error::Result<std::sync::Arc<dyn HttpTransport>> {
    Ok(std::sync::Arc::new(ReqwestTransport::from_config(config)?))
}
