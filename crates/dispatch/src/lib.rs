//! Rideline Dispatch
//!
//! The ride-dispatch core: matches ride requests to nearby drivers and
//! advances each ride through a strict, race-safe state machine.
//!
//! ## Architecture
//!
//! ```text
//! rider request ──► DispatchEngine ──► GeoEstimator (fare / distance)
//!                        │
//!                        ├──► RideStore ──► RideRepository (guarded CAS)
//!                        │        ▲
//!                        ├──► DriverRegistry (proximity scan)
//!                        │
//!                        └──► Notifier ──► driver / rider connections
//!
//! sweeper task ──► expire stale assignments ──► re-dispatch pending rides
//! ```
//!
//! Every status-changing write goes through `RideStore`, which expresses it
//! as a single atomic guarded update against the backing store - that is
//! what makes two drivers racing to accept the same ride resolve to exactly
//! one winner.

pub mod config;
pub mod engine;
pub mod memory;
pub mod registry;
pub mod store;
pub mod sweeper;

// Re-export main types
pub use config::DispatchConfig;
pub use engine::{CallerRole, DispatchEngine, DispatchOutcome, DispatchedRide, RideAction, RideRequest};
pub use memory::InMemoryRideRepository;
pub use registry::{DriverRegistry, NearbyDriver};
pub use store::RideStore;
pub use sweeper::spawn_sweeper;
