//! Rideline Core Domain
//!
//! Pure domain types for the Rideline dispatch system.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod entities;
pub mod values;

// Re-export commonly used types at crate root
pub use entities::{DriverLocation, Ride, RideEvent, RideStatus};
pub use values::{ConnectionId, CoordinateError, Coordinates, RideId, Timestamp, UserId};
