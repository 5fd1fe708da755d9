//! Connection id coordination between the realtime connection and REST
//! requests.

use parking_lot::{Mutex, RwLock};
use std::mem;
use tokio::sync::oneshot;
use tracing::{debug, info};

use super::state::{ConnectionId, ConnectionState};
use crate::api::{resolved_waiter, ConnectionDetailsProvider, ConnectionIdWaiter, Token};
use crate::options::Config;

type Waiter = oneshot::Sender<Option<ConnectionId>>;

#[derive(Default)]
struct Inner {
    state: ConnectionState,
    connection_id: Option<ConnectionId>,
    waiters: Vec<Waiter>,
}

/// Tracks the realtime connection and answers connection id requests.
///
/// Requests arriving while no id is known are queued and answered once the
/// connection settles: with the id when it connects, with `None` when it
/// goes down for good. Dropping the coordinator answers every queued request
/// with `None`.
pub struct ConnectionIdCoordinator {
    inner: Mutex<Inner>,
    /// Token of the current user
    token: RwLock<Option<Token>>,
    /// Without a realtime connection no id will ever arrive
    realtime_enabled: bool,
}

impl ConnectionIdCoordinator {
    /// Create a new coordinator
    pub fn new(realtime_enabled: bool) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            token: RwLock::new(None),
            realtime_enabled,
        }
    }

    /// Create a coordinator from the client configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.realtime_enabled)
    }

    /// Get current state
    pub fn state(&self) -> ConnectionState {
        self.inner.lock().state.clone()
    }

    /// Get the current connection id
    pub fn connection_id(&self) -> Option<ConnectionId> {
        self.inner.lock().connection_id.clone()
    }

    /// Number of requests still waiting for a connection id
    pub fn pending_waiters(&self) -> usize {
        let mut inner = self.inner.lock();
        inner.waiters.retain(|w| !w.is_closed());
        inner.waiters.len()
    }

    /// Replace the cached token
    pub fn set_token(&self, token: Option<Token>) {
        *self.token.write() = token;
    }

    /// Feed a state change of the realtime connection
    pub fn update_connection_state(&self, new_state: ConnectionState) {
        // Waiters are kept across a token-expired disconnect; the reconnect
        // after the token refresh will answer them
        let (connection_id, notify) = match &new_state {
            ConnectionState::Connected { connection_id } => (Some(connection_id.clone()), true),
            ConnectionState::Disconnected { reason } => (
                None,
                !reason.as_ref().map(|r| r.is_token_invalid()).unwrap_or(false),
            ),
            ConnectionState::Initialized
            | ConnectionState::Connecting
            | ConnectionState::WaitingForConnectionId
            | ConnectionState::Disconnecting
            | ConnectionState::WaitingForReconnect => (None, false),
        };

        let (previous, drained) = {
            let mut inner = self.inner.lock();
            let previous = mem::replace(&mut inner.state, new_state.clone());
            inner.connection_id = connection_id.clone();
            let drained = if notify {
                mem::take(&mut inner.waiters)
            } else {
                Vec::new()
            };
            (previous, drained)
        };

        if previous != new_state {
            debug!("State changed: {} -> {}", previous, new_state);
        }
        if new_state.is_connected() {
            info!("Connection id available, resolving {} waiting request(s)", drained.len());
        }

        resolve(drained, connection_id);
    }

    /// Answer and clear every queued request
    pub fn complete_connection_id_waiters(&self, connection_id: Option<ConnectionId>) {
        let drained = mem::take(&mut self.inner.lock().waiters);
        resolve(drained, connection_id);
    }
}

fn resolve(waiters: Vec<Waiter>, connection_id: Option<ConnectionId>) {
    if waiters.is_empty() {
        return;
    }
    debug!(
        "Resolving {} connection id waiter(s) with {:?}",
        waiters.len(),
        connection_id
    );
    for waiter in waiters {
        // The request may have been cancelled meanwhile
        let _ = waiter.send(connection_id.clone());
    }
}

impl ConnectionDetailsProvider for ConnectionIdCoordinator {
    fn provide_connection_id(&self) -> ConnectionIdWaiter {
        if !self.realtime_enabled {
            return resolved_waiter(None);
        }

        let mut inner = self.inner.lock();
        if let Some(connection_id) = inner.connection_id.clone() {
            return resolved_waiter(Some(connection_id));
        }

        let (tx, rx) = oneshot::channel();
        inner.waiters.retain(|w| !w.is_closed());
        inner.waiters.push(tx);
        rx
    }

    fn provide_token(&self) -> Option<Token> {
        self.token.read().clone()
    }
}

impl Drop for ConnectionIdCoordinator {
    fn drop(&mut self) {
        let drained = mem::take(&mut self.inner.get_mut().waiters);
        resolve(drained, None);
    }
}

impl std::fmt::Debug for ConnectionIdCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("ConnectionIdCoordinator")
            .field("state", &inner.state)
            .field("connection_id", &inner.connection_id)
            .field("pending_waiters", &inner.waiters.len())
            .field("realtime_enabled", &self.realtime_enabled)
            .finish()
    }
}
