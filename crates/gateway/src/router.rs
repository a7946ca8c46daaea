//! Notification Router
//!
//! The live connection table: one `userId -> connectionHandle` mapping per
//! connected socket, rebuilt from scratch on every process start. Owned by
//! the composition root and shared by reference - deliberately not a
//! module-level singleton, so multi-process deployments can swap in a
//! pub/sub-backed implementation behind the same `Notifier` port.

use async_trait::async_trait;
use dashmap::DashMap;
use log::{debug, warn};
use rideline_core::{ConnectionId, RideEvent, UserId};
use rideline_ports::Notifier;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::messages::OutboundMessage;

/// Send side of one live connection.
///
/// Sending is non-blocking: a full or closed outbound queue counts as
/// not-delivered, never as an error.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    tx: mpsc::Sender<OutboundMessage>,
}

impl ConnectionHandle {
    pub fn new(tx: mpsc::Sender<OutboundMessage>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tx,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    fn send(&self, frame: OutboundMessage) -> bool {
        self.tx.try_send(frame).is_ok()
    }
}

/// Maps user identifiers to live connections and delivers events
#[derive(Default)]
pub struct NotificationRouter {
    connections: DashMap<UserId, ConnectionHandle>,
}

impl NotificationRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a connection to a user. A prior registration for the same user
    /// is superseded, not closed - its socket just stops receiving.
    pub fn register(&self, user_id: UserId, handle: ConnectionHandle) {
        if let Some(previous) = self.connections.insert(user_id, handle) {
            debug!(
                "connection superseded: user={user_id}, old_connection={}",
                previous.id()
            );
        }
    }

    /// Disconnect cleanup: drop whichever mapping points at this handle.
    /// Reverse scan is fine at expected connection-table sizes.
    pub fn unregister(&self, connection_id: ConnectionId) {
        self.connections
            .retain(|_, handle| handle.id() != connection_id);
    }

    pub fn is_connected(&self, user_id: UserId) -> bool {
        self.connections.contains_key(&user_id)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Push one frame to a user's live connection, if any
    pub fn deliver_frame(&self, user_id: UserId, frame: OutboundMessage) -> bool {
        match self.connections.get(&user_id) {
            Some(handle) => {
                let sent = handle.send(frame);
                if !sent {
                    warn!("outbound queue unavailable for user {user_id}");
                }
                sent
            }
            None => false,
        }
    }
}

#[async_trait]
impl Notifier for NotificationRouter {
    async fn deliver(&self, user_id: UserId, event: &RideEvent) -> bool {
        let frame = match OutboundMessage::from_event(event) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("could not frame {} for user {user_id}: {e}", event.name());
                return false;
            }
        };
        self.deliver_frame(user_id, frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rideline_core::{Coordinates, Ride};
    use rust_decimal_macros::dec;

    fn handle(capacity: usize) -> (ConnectionHandle, mpsc::Receiver<OutboundMessage>) {
        let (tx, rx) = mpsc::channel(capacity);
        (ConnectionHandle::new(tx), rx)
    }

    fn ride() -> Ride {
        Ride::new_with_time(
            Uuid::new_v4(),
            Coordinates::new(6.6885, -1.6244).unwrap(),
            Coordinates::new(5.6037, -0.1870).unwrap(),
            "Kumasi".to_string(),
            "Accra".to_string(),
            199.5,
            dec!(304.26),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn delivers_to_a_registered_user() {
        let router = NotificationRouter::new();
        let user = Uuid::new_v4();
        let (conn, mut rx) = handle(4);
        router.register(user, conn);

        let delivered = router.deliver(user, &RideEvent::RideAccepted(ride())).await;
        assert!(delivered);

        let frame = rx.recv().await.unwrap();
        assert_eq!(frame.event, "ride_accepted");
    }

    #[tokio::test]
    async fn missing_target_is_a_quiet_no_op() {
        let router = NotificationRouter::new();
        let delivered = router
            .deliver(Uuid::new_v4(), &RideEvent::RideAccepted(ride()))
            .await;
        assert!(!delivered);
    }

    #[tokio::test]
    async fn newer_registration_supersedes_the_old_one() {
        let router = NotificationRouter::new();
        let user = Uuid::new_v4();
        let (old_conn, mut old_rx) = handle(4);
        let (new_conn, mut new_rx) = handle(4);

        router.register(user, old_conn);
        router.register(user, new_conn);
        assert_eq!(router.connection_count(), 1);

        router.deliver(user, &RideEvent::RideAccepted(ride())).await;
        assert!(new_rx.recv().await.is_some());
        assert!(old_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn unregister_only_removes_the_matching_connection() {
        let router = NotificationRouter::new();
        let user = Uuid::new_v4();
        let (stale_conn, _stale_rx) = handle(4);
        let stale_id = stale_conn.id();
        let (live_conn, _live_rx) = handle(4);

        router.register(user, stale_conn);
        router.register(user, live_conn);

        // the stale handle no longer owns the mapping; unregistering it
        // must not tear down the live connection
        router.unregister(stale_id);
        assert!(router.is_connected(user));
    }

    #[tokio::test]
    async fn unregister_clears_the_mapping_on_disconnect() {
        let router = NotificationRouter::new();
        let user = Uuid::new_v4();
        let (conn, _rx) = handle(4);
        let id = conn.id();
        router.register(user, conn);

        router.unregister(id);
        assert!(!router.is_connected(user));
        assert!(
            !router.deliver(user, &RideEvent::RideAccepted(ride())).await
        );
    }

    #[tokio::test]
    async fn full_outbound_queue_counts_as_not_delivered() {
        let router = NotificationRouter::new();
        let user = Uuid::new_v4();
        let (conn, _rx) = handle(1);
        router.register(user, conn);

        assert!(router.deliver(user, &RideEvent::RideAccepted(ride())).await);
        // queue of one is now full and nobody is draining it
        assert!(!router.deliver(user, &RideEvent::RideAccepted(ride())).await);
    }
}
