use rideline_core::UserId;
use serde::{Deserialize, Serialize};

/// Which side of a ride this connection belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientRole {
    Rider,
    Driver,
}

/// Inbound frames from a connected client.
///
/// The identity collaborator authenticated the user before the socket was
/// opened; the gateway trusts the `(user_id, role)` pair it registers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Bind this connection to a user; replaces any prior registration
    Register { user_id: UserId, role: ClientRole },
    /// Driver location ping; only meaningful on a driver-registered session
    LocationUpdate { latitude: f64, longitude: f64 },
}
