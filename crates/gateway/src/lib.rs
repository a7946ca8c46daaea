//! Rideline Gateway
//!
//! The transport-facing layer: accepts socket sessions, keeps the
//! user-to-connection registry, relays driver location pings into the
//! dispatch core, and delivers ride events to whoever is connected.
//!
//! The gateway depends on the dispatch core, never the reverse - dispatch
//! only sees the `Notifier` port.

pub mod error;
pub mod messages;
pub mod router;
pub mod socket;

// Re-export main types
pub use error::GatewayError;
pub use messages::{ClientMessage, ClientRole, OutboundMessage};
pub use router::{ConnectionHandle, NotificationRouter};
pub use socket::SocketGateway;
