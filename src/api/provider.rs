//! The seam between the request encoder and the realtime connection.
//!
//! The realtime side implements [`ConnectionDetailsProvider`] and registers
//! itself with a [`ConnectionDetailsSlot`]. The slot never owns the provider:
//! the returned [`ProviderRegistration`] unregisters it when dropped, and a
//! provider that goes away on its own simply stops resolving.

use crate::api::Token;
use crate::connection::ConnectionId;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tokio::sync::oneshot;
use tracing::debug;

/// One-shot answer to a connection id request.
///
/// Resolves with `Some(id)` once connected, with `None` when the connection
/// will not be available, and with a receive error if the provider dropped
/// the sender without answering. The encoder treats the last two alike.
pub type ConnectionIdWaiter = oneshot::Receiver<Option<ConnectionId>>;

/// Supplies connection details to the request encoder
pub trait ConnectionDetailsProvider: Send + Sync {
    /// Ask for the current connection id. May already be resolved.
    fn provide_connection_id(&self) -> ConnectionIdWaiter;

    /// The currently cached token, if any
    fn provide_token(&self) -> Option<Token>;
}

/// A waiter that is already resolved with `connection_id`
pub fn resolved_waiter(connection_id: Option<ConnectionId>) -> ConnectionIdWaiter {
    let (tx, rx) = oneshot::channel();
    let _ = tx.send(connection_id);
    rx
}

#[derive(Default)]
struct SlotState {
    generation: u64,
    provider: Option<Weak<dyn ConnectionDetailsProvider>>,
}

/// Shared, non-owning holder of the current provider
#[derive(Clone, Default)]
pub struct ConnectionDetailsSlot {
    inner: Arc<Mutex<SlotState>>,
}

impl ConnectionDetailsSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `provider`, replacing any previous registration
    pub fn register<P>(&self, provider: &Arc<P>) -> ProviderRegistration
    where
        P: ConnectionDetailsProvider + 'static,
    {
        let weak = Arc::downgrade(provider);
        let weak: Weak<dyn ConnectionDetailsProvider> = weak;
        let mut state = self.inner.lock();
        state.generation += 1;
        state.provider = Some(weak);
        debug!("Registered connection details provider (generation {})", state.generation);

        ProviderRegistration {
            slot: Arc::downgrade(&self.inner),
            generation: state.generation,
        }
    }

    /// The registered provider, if it is still alive
    pub fn current(&self) -> Option<Arc<dyn ConnectionDetailsProvider>> {
        self.inner.lock().provider.as_ref().and_then(Weak::upgrade)
    }

    /// Check if a live provider is registered
    pub fn is_registered(&self) -> bool {
        self.current().is_some()
    }
}

impl std::fmt::Debug for ConnectionDetailsSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionDetailsSlot")
            .field("registered", &self.is_registered())
            .finish()
    }
}

/// Keeps a provider registered; unregisters on drop
#[must_use = "dropping the registration unregisters the provider"]
#[derive(Debug)]
pub struct ProviderRegistration {
    slot: Weak<Mutex<SlotState>>,
    generation: u64,
}

impl ProviderRegistration {
    /// Unregister now
    pub fn unregister(self) {}

    /// Check if this is still the slot's current registration
    pub fn is_active(&self) -> bool {
        self.slot
            .upgrade()
            .map(|slot| {
                let state = slot.lock();
                state.generation == self.generation && state.provider.is_some()
            })
            .unwrap_or(false)
    }
}

impl Drop for ProviderRegistration {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.upgrade() {
            let mut state = slot.lock();
            // A newer registration owns the slot now
            if state.generation == self.generation {
                state.provider = None;
                debug!("Unregistered connection details provider (generation {})", self.generation);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProvider(Option<ConnectionId>);

    impl ConnectionDetailsProvider for FixedProvider {
        fn provide_connection_id(&self) -> ConnectionIdWaiter {
            resolved_waiter(self.0.clone())
        }

        fn provide_token(&self) -> Option<Token> {
            None
        }
    }

    #[test]
    fn test_registration_drop_unregisters() {
        let slot = ConnectionDetailsSlot::new();
        let provider = Arc::new(FixedProvider(None));

        let registration = slot.register(&provider);
        assert!(slot.is_registered());
        assert!(registration.is_active());

        drop(registration);
        assert!(!slot.is_registered());
    }

    #[test]
    fn test_slot_does_not_own_provider() {
        let slot = ConnectionDetailsSlot::new();
        let provider = Arc::new(FixedProvider(None));
        let _registration = slot.register(&provider);

        assert_eq!(Arc::strong_count(&provider), 1);
        drop(provider);
        assert!(slot.current().is_none());
    }

    #[test]
    fn test_stale_registration_keeps_newer_provider() {
        let slot = ConnectionDetailsSlot::new();
        let first = Arc::new(FixedProvider(None));
        let second = Arc::new(FixedProvider(Some(ConnectionId::new("conn-2"))));

        let old = slot.register(&first);
        let new = slot.register(&second);
        assert!(!old.is_active());

        old.unregister();
        assert!(slot.is_registered());
        assert!(new.is_active());
    }

    #[tokio::test]
    async fn test_resolved_waiter() {
        let id = resolved_waiter(Some(ConnectionId::new("conn-1"))).await.unwrap();
        assert_eq!(id, Some(ConnectionId::new("conn-1")));
    }
}
