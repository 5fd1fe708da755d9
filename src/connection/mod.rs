//! Realtime connection state and connection id coordination.

mod coordinator;
mod state;

pub use coordinator::ConnectionIdCoordinator;
pub use state::{ConnectionId, ConnectionState, DisconnectReason};
