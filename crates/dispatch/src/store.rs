//! Ride Store
//!
//! Owns every ride mutation. Each transition is a single guarded update
//! against the backing store, so concurrent callers are linearized per ride
//! by the store itself - never by application locking. A caller whose guard
//! misses gets a typed error:
//!
//! - unknown ride            -> `NotFound`
//! - caller is not the party -> `Forbidden`
//! - the ride moved on       -> `Conflict`

use std::sync::Arc;

use log::info;
use rideline_core::{Coordinates, Ride, RideId, RideStatus, Timestamp, UserId};
use rideline_ports::{
    Clock, DispatchError, DispatchResult, DriverGuard, FieldWrite, RideGuard, RidePatch,
    RideRepository, StampField,
};
use rust_decimal::Decimal;

/// Application service for the ride state machine
pub struct RideStore {
    repository: Arc<dyn RideRepository>,
    clock: Arc<dyn Clock>,
}

impl RideStore {
    pub fn new(repository: Arc<dyn RideRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Create a new unassigned ride in `requested`
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        rider_id: UserId,
        pickup: Coordinates,
        dropoff: Coordinates,
        pickup_address: String,
        dropoff_address: String,
        distance_km: f64,
        estimated_fare: Decimal,
    ) -> DispatchResult<Ride> {
        let ride = Ride::new_with_time(
            rider_id,
            pickup,
            dropoff,
            pickup_address,
            dropoff_address,
            distance_km,
            estimated_fare,
            self.clock.now(),
        );
        self.repository.insert(ride.clone()).await?;
        info!(
            "ride created: id={}, rider={}, distance_km={:.2}, fare={}",
            ride.id, ride.rider_id, ride.distance_km, ride.estimated_fare
        );
        Ok(ride)
    }

    /// Read one ride
    pub async fn get(&self, id: RideId) -> DispatchResult<Ride> {
        self.repository
            .fetch(id)
            .await?
            .ok_or_else(|| DispatchError::NotFound(format!("ride {id}")))
    }

    /// Offer an unassigned `requested` ride to a driver.
    /// The ride stays `requested`; only the assignment is written.
    pub async fn assign(&self, id: RideId, driver_id: UserId) -> DispatchResult<Ride> {
        let guard = RideGuard::new(RideStatus::Requested, DriverGuard::Unassigned);
        let patch = RidePatch {
            status: RideStatus::Requested,
            driver_id: FieldWrite::Set(driver_id),
            assigned_at: FieldWrite::Set(self.clock.now()),
            stamp: None,
        };
        match self.repository.update_guarded(id, guard, patch).await? {
            Some(ride) => {
                info!("ride assigned: id={id}, driver={driver_id}");
                Ok(ride)
            }
            // no identity involved here: a miss is either a vanished row or
            // a ride that is no longer unassigned
            None => match self.repository.fetch(id).await {
                Ok(Some(current)) => Err(DispatchError::Conflict(format!(
                    "ride {id} is no longer unassigned (status {})",
                    current.status
                ))),
                Ok(None) => Err(DispatchError::NotFound(format!("ride {id}"))),
                Err(e) => Err(DispatchError::Storage(e)),
            },
        }
    }

    /// The assigned driver takes the ride: `requested` -> `accepted`.
    ///
    /// CAS-first: the caller's identity is part of the guard, so of two
    /// racing accepts exactly one wins and the loser is classified from the
    /// row it lost to.
    pub async fn accept(&self, id: RideId, driver_id: UserId) -> DispatchResult<Ride> {
        let guard = RideGuard::new(RideStatus::Requested, DriverGuard::Assigned(driver_id));
        let patch = RidePatch {
            status: RideStatus::Accepted,
            driver_id: FieldWrite::Keep,
            assigned_at: FieldWrite::Keep,
            stamp: Some((StampField::Accepted, self.clock.now())),
        };
        match self.repository.update_guarded(id, guard, patch).await? {
            Some(ride) => {
                info!("ride accepted: id={id}, driver={driver_id}");
                Ok(ride)
            }
            None => Err(self.classify_miss(id, driver_id, "accept").await),
        }
    }

    /// The assigned driver declines: assignment cleared, ride back to
    /// unassigned `requested`
    pub async fn reject(&self, id: RideId, driver_id: UserId) -> DispatchResult<Ride> {
        let ride = self.unassign(id, driver_id, "reject").await?;
        info!("ride rejected: id={id}, driver={driver_id}");
        Ok(ride)
    }

    /// Sweep an expired assignment back to unassigned `requested`
    /// (acceptance window ran out)
    pub async fn release_assignment(&self, id: RideId, driver_id: UserId) -> DispatchResult<Ride> {
        let ride = self.unassign(id, driver_id, "release").await?;
        info!("assignment expired: id={id}, driver={driver_id}");
        Ok(ride)
    }

    async fn unassign(&self, id: RideId, driver_id: UserId, action: &str) -> DispatchResult<Ride> {
        let guard = RideGuard::new(RideStatus::Requested, DriverGuard::Assigned(driver_id));
        let patch = RidePatch {
            status: RideStatus::Requested,
            driver_id: FieldWrite::Clear,
            assigned_at: FieldWrite::Clear,
            stamp: None,
        };
        match self.repository.update_guarded(id, guard, patch).await? {
            Some(ride) => Ok(ride),
            None => Err(self.classify_miss(id, driver_id, action).await),
        }
    }

    /// `accepted` -> `driver_arrived`, by the assigned driver
    pub async fn mark_driver_arrived(&self, id: RideId, driver_id: UserId) -> DispatchResult<Ride> {
        self.advance(
            id,
            driver_id,
            &[RideStatus::Accepted],
            RideStatus::DriverArrived,
            StampField::DriverArrived,
            "mark arrival for",
        )
        .await
    }

    /// `accepted` or `driver_arrived` -> `ongoing`, by the assigned driver.
    /// The arrival step may legitimately be skipped.
    pub async fn start_trip(&self, id: RideId, driver_id: UserId) -> DispatchResult<Ride> {
        self.advance(
            id,
            driver_id,
            &[RideStatus::Accepted, RideStatus::DriverArrived],
            RideStatus::Ongoing,
            StampField::Started,
            "start",
        )
        .await
    }

    /// `ongoing` -> `completed`, by the assigned driver
    pub async fn complete_trip(&self, id: RideId, driver_id: UserId) -> DispatchResult<Ride> {
        self.advance(
            id,
            driver_id,
            &[RideStatus::Ongoing],
            RideStatus::Completed,
            StampField::Completed,
            "complete",
        )
        .await
    }

    /// `requested` or `accepted` -> `cancelled_rider`, by the ride's rider
    pub async fn cancel_by_rider(&self, id: RideId, rider_id: UserId) -> DispatchResult<Ride> {
        let ride = self.get(id).await?;
        if ride.rider_id != rider_id {
            return Err(DispatchError::Forbidden(format!(
                "user {rider_id} is not the rider of ride {id}"
            )));
        }
        if !matches!(ride.status, RideStatus::Requested | RideStatus::Accepted) {
            return Err(DispatchError::Conflict(format!(
                "ride {id} is {} and can no longer be cancelled by the rider",
                ride.status
            )));
        }

        // Assignment may change under a requested ride without changing its
        // status, so the guard only pins the status.
        let guard = RideGuard::new(ride.status, DriverGuard::Any);
        let patch = RidePatch {
            status: RideStatus::CancelledByRider,
            driver_id: FieldWrite::Keep,
            assigned_at: FieldWrite::Keep,
            stamp: Some((StampField::Cancelled, self.clock.now())),
        };
        match self.repository.update_guarded(id, guard, patch).await? {
            Some(cancelled) => {
                info!("ride cancelled by rider: id={id}, rider={rider_id}");
                Ok(cancelled)
            }
            None => Err(DispatchError::Conflict(format!(
                "ride {id} changed while cancelling"
            ))),
        }
    }

    /// `accepted` or `driver_arrived` -> `cancelled_driver`, by the
    /// assigned driver
    pub async fn cancel_by_driver(&self, id: RideId, driver_id: UserId) -> DispatchResult<Ride> {
        let ride = self.get(id).await?;
        if !ride.is_assigned_to(driver_id) {
            return Err(DispatchError::Forbidden(format!(
                "driver {driver_id} is not assigned to ride {id}"
            )));
        }
        if !matches!(ride.status, RideStatus::Accepted | RideStatus::DriverArrived) {
            return Err(DispatchError::Conflict(format!(
                "ride {id} is {} and can no longer be cancelled by the driver",
                ride.status
            )));
        }

        let guard = RideGuard::new(ride.status, DriverGuard::Assigned(driver_id));
        let patch = RidePatch {
            status: RideStatus::CancelledByDriver,
            driver_id: FieldWrite::Keep,
            assigned_at: FieldWrite::Keep,
            stamp: Some((StampField::Cancelled, self.clock.now())),
        };
        match self.repository.update_guarded(id, guard, patch).await? {
            Some(cancelled) => {
                info!("ride cancelled by driver: id={id}, driver={driver_id}");
                Ok(cancelled)
            }
            None => Err(DispatchError::Conflict(format!(
                "ride {id} changed while cancelling"
            ))),
        }
    }

    // ============ Queries ============

    /// The active ride (accepted / driver_arrived / ongoing) for a driver
    pub async fn active_ride_for_driver(&self, driver_id: UserId) -> DispatchResult<Option<Ride>> {
        Ok(self.repository.find_active_for_driver(driver_id).await?)
    }

    /// Unassigned `requested` rides awaiting dispatch
    pub async fn unassigned_requested(&self) -> DispatchResult<Vec<Ride>> {
        Ok(self.repository.find_unassigned_requested().await?)
    }

    /// Assigned-but-unaccepted rides whose assignment predates `cutoff`
    pub async fn stale_assignments(&self, cutoff: Timestamp) -> DispatchResult<Vec<Ride>> {
        Ok(self.repository.find_assigned_requested_before(cutoff).await?)
    }

    // ============ Internals ============

    /// Driver-progress transition: identity pre-checked against a snapshot
    /// for a precise error, then the CAS repeats both checks atomically.
    async fn advance(
        &self,
        id: RideId,
        driver_id: UserId,
        allowed: &[RideStatus],
        next: RideStatus,
        stamp: StampField,
        action: &str,
    ) -> DispatchResult<Ride> {
        let ride = self.get(id).await?;
        if !ride.is_assigned_to(driver_id) {
            return Err(DispatchError::Forbidden(format!(
                "driver {driver_id} is not assigned to ride {id}"
            )));
        }
        if !allowed.contains(&ride.status) {
            return Err(DispatchError::Conflict(format!(
                "cannot {action} ride {id}: status is {}",
                ride.status
            )));
        }

        let guard = RideGuard::new(ride.status, DriverGuard::Assigned(driver_id));
        let patch = RidePatch {
            status: next,
            driver_id: FieldWrite::Keep,
            assigned_at: FieldWrite::Keep,
            stamp: Some((stamp, self.clock.now())),
        };
        match self.repository.update_guarded(id, guard, patch).await? {
            Some(updated) => {
                info!("ride status updated: id={id}, status={next}, driver={driver_id}");
                Ok(updated)
            }
            None => Err(DispatchError::Conflict(format!(
                "ride {id} changed while trying to {action} it"
            ))),
        }
    }

    /// A guarded update on the assignment missed: decide whether the caller
    /// was unauthorized or simply lost a race.
    async fn classify_miss(&self, id: RideId, driver_id: UserId, action: &str) -> DispatchError {
        match self.repository.fetch(id).await {
            Ok(Some(ride)) => {
                if ride.status == RideStatus::Requested && !ride.is_assigned_to(driver_id) {
                    DispatchError::Forbidden(format!(
                        "driver {driver_id} is not assigned to ride {id}"
                    ))
                } else {
                    DispatchError::Conflict(format!(
                        "cannot {action} ride {id}: status is {}",
                        ride.status
                    ))
                }
            }
            Ok(None) => DispatchError::NotFound(format!("ride {id}")),
            Err(e) => DispatchError::Storage(e),
        }
    }
}
