//! Rideline Ports
//!
//! Port definitions (traits) for the Rideline dispatch system.
//! These define the boundaries between the dispatch core and its external
//! collaborators: the clock, the persistence layer and the transport layer.

mod clock;
mod error;
mod notifier;
mod repository;

pub use clock::Clock;
pub use error::{DispatchError, DispatchResult, StorageError, StorageResult};
pub use notifier::Notifier;
pub use repository::{DriverGuard, FieldWrite, RideGuard, RidePatch, RideRepository, StampField};
