//! Online/offline signal consumed by the sync engine.
//!
//! The host (UI shell, platform layer) reports link state through
//! [`Connectivity::set_online`]; the sync engine polls the current state and
//! subscribes to became-online edges to trigger passes.

use std::sync::Arc;

use tokio::sync::watch;

/// Clonable handle over the process-wide connectivity state.
#[derive(Debug, Clone)]
pub struct Connectivity {
    sender: Arc<watch::Sender<bool>>,
}

impl Connectivity {
    /// Create a connectivity handle with the given initial state
    #[must_use]
    pub fn new(online: bool) -> Self {
        let (sender, _) = watch::channel(online);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Create a handle that starts out online
    #[must_use]
    pub fn assume_online() -> Self {
        Self::new(true)
    }

    /// Whether the process currently considers itself online
    #[must_use]
    pub fn is_online(&self) -> bool {
        *self.sender.borrow()
    }

    /// Report a link state change; no-op when the state is unchanged
    pub fn set_online(&self, online: bool) {
        self.sender.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });
    }

    /// Subscribe to state changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.sender.subscribe()
    }
}

impl Default for Connectivity {
    fn default() -> Self {
        Self::assume_online()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_online() {
        let connectivity = Connectivity::default();
        assert!(connectivity.is_online());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_subscriber_sees_online_edge() {
        let connectivity = Connectivity::new(false);
        let mut rx = connectivity.subscribe();

        connectivity.set_online(true);
        rx.changed().await.unwrap();
        assert!(*rx.borrow_and_update());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_unchanged_state_does_not_notify() {
        let connectivity = Connectivity::new(true);
        let rx = connectivity.subscribe();

        connectivity.set_online(true);
        assert!(!rx.has_changed().unwrap());
    }
}
