//! In-memory ride repository
//!
//! Reference implementation of the persistence collaborator's contract.
//! Guarded updates hold the table's write lock for the whole
//! check-then-write, which gives the same "zero rows affected" semantics a
//! relational store provides with a conditional UPDATE. Used by the
//! composition root's default wiring and by tests.

use std::collections::HashMap;

use async_trait::async_trait;
use rideline_core::{Ride, RideId, RideStatus, Timestamp, UserId};
use rideline_ports::{
    DriverGuard, FieldWrite, RideGuard, RidePatch, RideRepository, StampField, StorageResult,
};
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemoryRideRepository {
    rides: RwLock<HashMap<RideId, Ride>>,
}

impl InMemoryRideRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn guard_matches(ride: &Ride, guard: &RideGuard) -> bool {
    if ride.status != guard.status {
        return false;
    }
    match guard.driver {
        DriverGuard::Unassigned => ride.driver_id.is_none(),
        DriverGuard::Assigned(driver) => ride.driver_id == Some(driver),
        DriverGuard::Any => true,
    }
}

fn write_field<T>(target: &mut Option<T>, write: FieldWrite<T>) {
    match write {
        FieldWrite::Keep => {}
        FieldWrite::Set(value) => *target = Some(value),
        FieldWrite::Clear => *target = None,
    }
}

fn apply_patch(ride: &mut Ride, patch: RidePatch) {
    ride.status = patch.status;
    write_field(&mut ride.driver_id, patch.driver_id);
    write_field(&mut ride.assigned_at, patch.assigned_at);
    if let Some((field, at)) = patch.stamp {
        let slot = match field {
            StampField::Accepted => &mut ride.accepted_at,
            StampField::DriverArrived => &mut ride.driver_arrived_at,
            StampField::Started => &mut ride.started_at,
            StampField::Completed => &mut ride.completed_at,
            StampField::Cancelled => &mut ride.cancelled_at,
        };
        *slot = Some(at);
    }
}

#[async_trait]
impl RideRepository for InMemoryRideRepository {
    async fn insert(&self, ride: Ride) -> StorageResult<()> {
        let mut rides = self.rides.write().await;
        rides.insert(ride.id, ride);
        Ok(())
    }

    async fn fetch(&self, id: RideId) -> StorageResult<Option<Ride>> {
        Ok(self.rides.read().await.get(&id).cloned())
    }

    async fn update_guarded(
        &self,
        id: RideId,
        guard: RideGuard,
        patch: RidePatch,
    ) -> StorageResult<Option<Ride>> {
        let mut rides = self.rides.write().await;
        match rides.get_mut(&id) {
            Some(ride) if guard_matches(ride, &guard) => {
                apply_patch(ride, patch);
                Ok(Some(ride.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn find_unassigned_requested(&self) -> StorageResult<Vec<Ride>> {
        let rides = self.rides.read().await;
        let mut pending: Vec<Ride> = rides
            .values()
            .filter(|ride| ride.status == RideStatus::Requested && ride.driver_id.is_none())
            .cloned()
            .collect();
        pending.sort_by_key(|ride| ride.requested_at);
        Ok(pending)
    }

    async fn find_assigned_requested_before(&self, cutoff: Timestamp) -> StorageResult<Vec<Ride>> {
        let rides = self.rides.read().await;
        let mut stale: Vec<Ride> = rides
            .values()
            .filter(|ride| {
                ride.status == RideStatus::Requested
                    && ride.driver_id.is_some()
                    && ride.assigned_at.is_some_and(|at| at < cutoff)
            })
            .cloned()
            .collect();
        stale.sort_by_key(|ride| ride.assigned_at);
        Ok(stale)
    }

    async fn find_active_for_driver(&self, driver_id: UserId) -> StorageResult<Option<Ride>> {
        let rides = self.rides.read().await;
        Ok(rides
            .values()
            .find(|ride| ride.is_active() && ride.is_assigned_to(driver_id))
            .cloned())
    }
}
