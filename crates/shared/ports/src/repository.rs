use async_trait::async_trait;
use rideline_core::{Ride, RideId, RideStatus, Timestamp, UserId};

use crate::error::StorageResult;

/// Expected assignment state for a guarded update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverGuard {
    /// The ride must have no driver assigned
    Unassigned,
    /// The ride must be assigned to exactly this driver
    Assigned(UserId),
    /// Assignment does not participate in the guard
    Any,
}

/// Precondition for a guarded update: the row's current status (and, where
/// it matters, its current assignment) must match or zero rows are affected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RideGuard {
    pub status: RideStatus,
    pub driver: DriverGuard,
}

impl RideGuard {
    pub fn new(status: RideStatus, driver: DriverGuard) -> Self {
        Self { status, driver }
    }
}

/// How a guarded update treats one nullable column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldWrite<T> {
    /// Leave the column as it is
    Keep,
    /// Write this value
    Set(T),
    /// Null the column
    Clear,
}

/// Which lifecycle timestamp a transition stamps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StampField {
    Accepted,
    DriverArrived,
    Started,
    Completed,
    Cancelled,
}

/// The new values a guarded update writes when its guard matches
#[derive(Debug, Clone, Copy)]
pub struct RidePatch {
    pub status: RideStatus,
    pub driver_id: FieldWrite<UserId>,
    pub assigned_at: FieldWrite<Timestamp>,
    /// At most one lifecycle timestamp written per transition
    pub stamp: Option<(StampField, Timestamp)>,
}

/// Persistence collaborator for ride records.
///
/// `update_guarded` is the contract everything else leans on: a single
/// atomic compare-and-set ("update where id = X and status = S and
/// driver_id = D") so that of two racing callers exactly one observes the
/// update applied and the other observes zero rows affected. The backing
/// store, not application locking, decides who won.
#[async_trait]
pub trait RideRepository: Send + Sync {
    async fn insert(&self, ride: Ride) -> StorageResult<()>;

    /// Plain read by id; `None` for unknown rides
    async fn fetch(&self, id: RideId) -> StorageResult<Option<Ride>>;

    /// Atomic conditional update. Returns the updated ride when the guard
    /// matched the current row, `None` when zero rows were affected
    /// (guard miss or unknown id).
    async fn update_guarded(
        &self,
        id: RideId,
        guard: RideGuard,
        patch: RidePatch,
    ) -> StorageResult<Option<Ride>>;

    /// All rides sitting in `requested` with no driver assigned
    /// (the re-dispatch sweep's work queue)
    async fn find_unassigned_requested(&self) -> StorageResult<Vec<Ride>>;

    /// Rides in `requested` whose assignment predates `cutoff`
    /// (candidates for acceptance-window expiry)
    async fn find_assigned_requested_before(&self, cutoff: Timestamp) -> StorageResult<Vec<Ride>>;

    /// The active ride (accepted / driver_arrived / ongoing) for a driver,
    /// if any; at most one can exist
    async fn find_active_for_driver(&self, driver_id: UserId) -> StorageResult<Option<Ride>>;
}
