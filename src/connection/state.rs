//! Realtime connection state as seen by the request pipeline.

use crate::error::ErrorPayload;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of the current realtime session, issued by the server while
/// connected
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConnectionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Why the realtime connection went down
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The server closed the connection with an error payload
    Server(ErrorPayload),
    /// Any other failure
    Other(String),
}

impl DisconnectReason {
    /// Disconnects caused by a rejected token are followed by a token
    /// refresh and reconnect
    pub fn is_token_invalid(&self) -> bool {
        match self {
            Self::Server(payload) => payload.is_token_invalid(),
            Self::Other(_) => false,
        }
    }
}

/// Realtime connection state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// Initial state, never transitioned to
    Initialized,
    /// Socket is being opened
    Connecting,
    /// Socket is open, waiting for the server to assign a connection id
    WaitingForConnectionId,
    /// Connection has been fully established
    Connected { connection_id: ConnectionId },
    /// Requested disconnection in progress
    Disconnecting,
    /// Connection dropped, a reconnect is scheduled
    WaitingForReconnect,
    /// Disconnected, optionally because of an error
    Disconnected { reason: Option<DisconnectReason> },
}

impl ConnectionState {
    /// Check if currently connecting or connected
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            Self::Connecting | Self::WaitingForConnectionId | Self::Connected { .. }
        )
    }

    /// Check if connected
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }

    /// The connection id, if connected
    pub fn connection_id(&self) -> Option<&ConnectionId> {
        match self {
            Self::Connected { connection_id } => Some(connection_id),
            _ => None,
        }
    }
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self::Initialized
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initialized => write!(f, "initialized"),
            Self::Connecting => write!(f, "connecting"),
            Self::WaitingForConnectionId => write!(f, "waiting_for_connection_id"),
            Self::Connected { .. } => write!(f, "connected"),
            Self::Disconnecting => write!(f, "disconnecting"),
            Self::WaitingForReconnect => write!(f, "waiting_for_reconnect"),
            Self::Disconnected { .. } => write!(f, "disconnected"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_only_when_connected() {
        let state = ConnectionState::Connected {
            connection_id: ConnectionId::new("conn-1"),
        };
        assert!(state.is_connected());
        assert_eq!(state.connection_id().map(ConnectionId::as_str), Some("conn-1"));

        assert!(ConnectionState::Connecting.connection_id().is_none());
        assert!(ConnectionState::Connecting.is_active());
        assert!(!ConnectionState::WaitingForReconnect.is_active());
    }

    #[test]
    fn test_token_invalid_disconnect() {
        let reason = DisconnectReason::Server(ErrorPayload {
            code: 40,
            message: "token expired".to_string(),
            status_code: 401,
        });
        assert!(reason.is_token_invalid());
        assert!(!DisconnectReason::Other("socket closed".to_string()).is_token_invalid());
    }

    #[test]
    fn test_display() {
        assert_eq!(ConnectionState::default().to_string(), "initialized");
        assert_eq!(
            ConnectionState::Disconnected { reason: None }.to_string(),
            "disconnected"
        );
    }
}
