use async_trait::async_trait;
use rideline_core::{RideEvent, UserId};

/// Port for pushing real-time events to a party's live connection.
///
/// "Not connected" is expected and common (app backgrounded, rider off
/// Wi-Fi), so delivery reports a boolean instead of failing. Dispatch
/// decisions never depend on the result: notifications are best-effort.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one event to `user_id`'s live connection.
    /// Returns false when no connected target was found.
    async fn deliver(&self, user_id: UserId, event: &RideEvent) -> bool;
}
