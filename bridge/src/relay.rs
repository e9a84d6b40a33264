use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use greenhouse_common::{DeviceCommand, SensorSnapshot};

use crate::link::LinkRegistry;

/// Maps web commands onto the snapshot and the (possibly absent) node link.
/// The snapshot flip is authoritative; delivery to the node is best-effort
/// and a failed send is logged, never surfaced to the HTTP caller.
pub struct CommandRelay {
    snapshot: Arc<Mutex<SensorSnapshot>>,
    links: Arc<LinkRegistry>,
}

impl CommandRelay {
    pub fn new(snapshot: Arc<Mutex<SensorSnapshot>>, links: Arc<LinkRegistry>) -> Self {
        Self { snapshot, links }
    }

    pub async fn snapshot(&self) -> SensorSnapshot {
        self.snapshot.lock().await.clone()
    }

    pub async fn toggle_relay(&self) -> bool {
        let relay_state = self.snapshot.lock().await.toggle_relay();
        self.forward(DeviceCommand::ToggleRelay { relay_state }).await;
        relay_state
    }

    pub async fn toggle_fan(&self) -> bool {
        let fan_state = self.snapshot.lock().await.toggle_fan();
        self.forward(DeviceCommand::ToggleFan { fan_state }).await;
        fan_state
    }

    async fn forward(&self, command: DeviceCommand) {
        let Some(link) = self.links.current().await else {
            debug!(?command, "no device link, command not forwarded");
            return;
        };

        match command.to_frame() {
            Ok(frame) => {
                if let Err(err) = link.send(frame) {
                    warn!(link = link.id(), "device command send failed: {err}");
                }
            }
            Err(err) => warn!("device command serialization failed: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::sync::mpsc;

    use crate::link::DeviceLink;

    fn relay() -> CommandRelay {
        CommandRelay::new(
            Arc::new(Mutex::new(SensorSnapshot::default())),
            Arc::new(LinkRegistry::new()),
        )
    }

    #[tokio::test]
    async fn toggle_relay_alternates_without_a_link() {
        let relay = relay();

        assert!(relay.toggle_relay().await);
        assert!(!relay.toggle_relay().await);
        assert!(relay.toggle_relay().await);
    }

    #[tokio::test]
    async fn toggles_do_not_affect_each_other() {
        let relay = relay();

        assert!(relay.toggle_fan().await);
        let snapshot = relay.snapshot().await;
        assert!(snapshot.fan_state);
        assert!(!snapshot.relay_state);
    }

    #[tokio::test]
    async fn forwards_frame_on_active_link() {
        let relay = relay();
        let (tx, mut rx) = mpsc::unbounded_channel();
        relay.links.set_active(DeviceLink::new(tx)).await;

        assert!(relay.toggle_fan().await);

        let frame = rx.recv().await.unwrap();
        assert_eq!(frame, r#"{"action":"toggleFan","fanState":true}"#);
    }

    #[tokio::test]
    async fn send_failure_does_not_roll_back_the_flip() {
        let relay = relay();
        let (tx, rx) = mpsc::unbounded_channel();
        relay.links.set_active(DeviceLink::new(tx)).await;
        drop(rx);

        assert!(relay.toggle_relay().await);
        assert!(relay.snapshot().await.relay_state);
    }

    #[tokio::test]
    async fn toggles_keep_working_after_disconnect() {
        let relay = relay();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let link = DeviceLink::new(tx);
        relay.links.set_active(link.clone()).await;

        assert!(relay.toggle_fan().await);
        assert_eq!(
            rx.recv().await.unwrap(),
            r#"{"action":"toggleFan","fanState":true}"#
        );

        relay.links.clear_if_current(&link).await;
        drop(rx);

        assert!(!relay.toggle_fan().await);
        assert!(!relay.snapshot().await.fan_state);
    }
}
