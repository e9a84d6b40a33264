use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

static NEXT_LINK_ID: AtomicU64 = AtomicU64::new(1);

/// Outbound half of the node's socket: an id plus a channel drained by the
/// socket task. Sending never blocks; the frame is dropped once the task is
/// gone.
#[derive(Debug, Clone)]
pub struct DeviceLink {
    id: u64,
    tx: mpsc::UnboundedSender<String>,
}

#[derive(Debug, Error)]
#[error("device link closed")]
pub struct LinkClosed;

impl DeviceLink {
    pub fn new(tx: mpsc::UnboundedSender<String>) -> Self {
        Self {
            id: NEXT_LINK_ID.fetch_add(1, Ordering::Relaxed),
            tx,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn send(&self, frame: String) -> Result<(), LinkClosed> {
        self.tx.send(frame).map_err(|_| LinkClosed)
    }
}

/// One-slot registry for the single node connection. A newer connection
/// supersedes the slot without closing the old socket; the old socket's task
/// tears itself down when its transport reports closure.
#[derive(Debug, Default)]
pub struct LinkRegistry {
    active: Mutex<Option<DeviceLink>>,
}

impl LinkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_active(&self, link: DeviceLink) {
        let mut active = self.active.lock().await;
        if let Some(previous) = active.replace(link) {
            debug!(superseded = previous.id(), "device link replaced");
        }
    }

    /// Clears the slot only when the closing link is still the registered
    /// one, so a late close from a superseded link cannot drop a newer link.
    pub async fn clear_if_current(&self, link: &DeviceLink) {
        let mut active = self.active.lock().await;
        if active.as_ref().map(DeviceLink::id) == Some(link.id()) {
            *active = None;
        }
    }

    pub async fn current(&self) -> Option<DeviceLink> {
        self.active.lock().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link() -> (DeviceLink, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (DeviceLink::new(tx), rx)
    }

    #[tokio::test]
    async fn starts_empty() {
        let registry = LinkRegistry::new();
        assert!(registry.current().await.is_none());
    }

    #[tokio::test]
    async fn newer_connection_supersedes_older() {
        let registry = LinkRegistry::new();
        let (a, _rx_a) = link();
        let (b, _rx_b) = link();

        registry.set_active(a).await;
        registry.set_active(b.clone()).await;

        assert_eq!(registry.current().await.map(|l| l.id()), Some(b.id()));
    }

    #[tokio::test]
    async fn stale_close_does_not_clobber_newer_link() {
        let registry = LinkRegistry::new();
        let (a, _rx_a) = link();
        let (b, _rx_b) = link();

        registry.set_active(a.clone()).await;
        registry.set_active(b.clone()).await;
        registry.clear_if_current(&a).await;

        assert_eq!(registry.current().await.map(|l| l.id()), Some(b.id()));
    }

    #[tokio::test]
    async fn close_of_current_empties_slot() {
        let registry = LinkRegistry::new();
        let (a, _rx_a) = link();

        registry.set_active(a.clone()).await;
        registry.clear_if_current(&a).await;

        assert!(registry.current().await.is_none());
    }

    #[tokio::test]
    async fn send_fails_once_receiver_is_gone() {
        let (l, rx) = link();
        drop(rx);

        assert!(l.send("{}".to_string()).is_err());
    }
}
