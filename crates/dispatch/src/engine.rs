//! Dispatch Engine
//!
//! Orchestrates the ride lifecycle: estimate, create, match, notify, and
//! the guarded transitions that follow. Notification delivery is
//! best-effort by design - an assignment stands even when the driver's app
//! is offline, because the driver will see the pending ride on reconnect.

use std::sync::Arc;

use log::{debug, info, warn};
use rideline_core::{Coordinates, Ride, RideEvent, RideId, RideStatus, UserId};
use rideline_geo::FareSchedule;
use rideline_ports::{Clock, DispatchError, DispatchResult, Notifier};
use serde::{Deserialize, Serialize};

use crate::config::DispatchConfig;
use crate::registry::DriverRegistry;
use crate::store::RideStore;

/// A rider's inbound request, raw and unvalidated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RideRequest {
    pub rider_id: UserId,
    pub pickup_latitude: f64,
    pub pickup_longitude: f64,
    pub dropoff_latitude: f64,
    pub dropoff_longitude: f64,
    pub pickup_address: String,
    pub dropoff_address: String,
}

/// Driver-initiated lifecycle advances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RideAction {
    DriverArrived,
    StartTrip,
    CompleteTrip,
}

/// Who is asking to cancel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallerRole {
    Rider,
    Driver,
}

/// What a matching pass did with one ride
#[derive(Debug, Clone)]
pub enum DispatchOutcome {
    /// Nearest candidate assigned; `notified` reports whether the push
    /// reached a live connection
    Assigned {
        driver_id: UserId,
        distance_km: f64,
        notified: bool,
    },
    /// No candidates within the search radius; the ride stays `requested`
    /// and unassigned until a driver comes online and a sweep retries
    NoDriversAvailable,
    /// Someone else dispatched (or advanced) the ride first
    AlreadyDispatched,
}

/// A ride plus what dispatch did with it
#[derive(Debug, Clone)]
pub struct DispatchedRide {
    pub ride: Ride,
    pub outcome: DispatchOutcome,
}

/// The dispatch orchestrator - the contract other layers call
pub struct DispatchEngine {
    store: Arc<RideStore>,
    registry: Arc<DriverRegistry>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    fares: FareSchedule,
    config: DispatchConfig,
}

impl DispatchEngine {
    pub fn new(
        store: Arc<RideStore>,
        registry: Arc<DriverRegistry>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        fares: FareSchedule,
        config: DispatchConfig,
    ) -> Self {
        Self {
            store,
            registry,
            notifier,
            clock,
            fares,
            config,
        }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Create a ride from a rider's request and try to dispatch it
    pub async fn request_ride(&self, request: RideRequest) -> DispatchResult<DispatchedRide> {
        let pickup = Coordinates::new(request.pickup_latitude, request.pickup_longitude)
            .map_err(|e| DispatchError::Validation(format!("pickup: {e}")))?;
        let dropoff = Coordinates::new(request.dropoff_latitude, request.dropoff_longitude)
            .map_err(|e| DispatchError::Validation(format!("dropoff: {e}")))?;

        let distance_km = rideline_geo::distance_km(&pickup, &dropoff);
        let estimated_fare = self.fares.estimate(distance_km);

        let ride = self
            .store
            .create(
                request.rider_id,
                pickup,
                dropoff,
                request.pickup_address,
                request.dropoff_address,
                distance_km,
                estimated_fare,
            )
            .await?;

        self.dispatch(ride).await
    }

    /// One matching pass over an unassigned `requested` ride: nearest
    /// candidate wins, then gets a `new_ride_request` push.
    async fn dispatch(&self, ride: Ride) -> DispatchResult<DispatchedRide> {
        let candidates = self
            .registry
            .find_nearby(&ride.pickup, self.config.search_radius_km);

        let Some(best) = candidates.first() else {
            warn!(
                "no drivers available for ride {} within {} km",
                ride.id, self.config.search_radius_km
            );
            return Ok(DispatchedRide {
                ride,
                outcome: DispatchOutcome::NoDriversAvailable,
            });
        };

        match self.store.assign(ride.id, best.driver_id).await {
            Ok(assigned) => {
                let notified = self
                    .notifier
                    .deliver(best.driver_id, &RideEvent::NewRideRequest(assigned.clone()))
                    .await;
                if !notified {
                    // deliberate at-least-once policy: the assignment stands
                    warn!(
                        "driver {} not connected; ride {} awaits them on reconnect",
                        best.driver_id, assigned.id
                    );
                }
                info!(
                    "ride {} dispatched to driver {} at {:.2} km",
                    assigned.id, best.driver_id, best.distance_km
                );
                Ok(DispatchedRide {
                    ride: assigned,
                    outcome: DispatchOutcome::Assigned {
                        driver_id: best.driver_id,
                        distance_km: best.distance_km,
                        notified,
                    },
                })
            }
            Err(DispatchError::Conflict(_)) => {
                debug!("ride {} was handled elsewhere while matching", ride.id);
                let current = self.store.get(ride.id).await?;
                Ok(DispatchedRide {
                    ride: current,
                    outcome: DispatchOutcome::AlreadyDispatched,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Explicit re-trigger of the matching pass for one ride
    /// (after a rejection, or any manual retry)
    pub async fn redispatch(&self, ride_id: RideId) -> DispatchResult<DispatchedRide> {
        let ride = self.store.get(ride_id).await?;
        if ride.status != RideStatus::Requested || ride.driver_id.is_some() {
            return Ok(DispatchedRide {
                ride,
                outcome: DispatchOutcome::AlreadyDispatched,
            });
        }
        self.dispatch(ride).await
    }

    /// Matching sweep over every unassigned `requested` ride.
    /// Idempotent and race-safe: each assignment is its own guarded update,
    /// so a concurrent dispatcher simply wins some of them.
    pub async fn dispatch_pending(&self) -> DispatchResult<usize> {
        let pending = self.store.unassigned_requested().await?;
        let mut assigned = 0;
        for ride in pending {
            if let DispatchOutcome::Assigned { .. } = self.dispatch(ride).await?.outcome {
                assigned += 1;
            }
        }
        Ok(assigned)
    }

    /// Sweep assignments that outlived the acceptance window back to
    /// unassigned `requested`. No-op when the window is disabled.
    pub async fn expire_stale_assignments(&self) -> DispatchResult<usize> {
        let Some(timeout_secs) = self.config.accept_timeout_secs else {
            return Ok(0);
        };
        let cutoff = self.clock.now() - chrono::Duration::seconds(timeout_secs as i64);

        let stale = self.store.stale_assignments(cutoff).await?;
        let mut released = 0;
        for ride in stale {
            let Some(driver_id) = ride.driver_id else {
                continue;
            };
            match self.store.release_assignment(ride.id, driver_id).await {
                Ok(_) => released += 1,
                // the driver accepted (or the ride moved) in the meantime
                Err(DispatchError::Conflict(_))
                | Err(DispatchError::Forbidden(_))
                | Err(DispatchError::NotFound(_)) => {
                    debug!("ride {} no longer stale, skipping expiry", ride.id);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(released)
    }

    /// The assigned driver takes the ride
    pub async fn accept_ride(&self, ride_id: RideId, driver_id: UserId) -> DispatchResult<Ride> {
        let ride = self.store.accept(ride_id, driver_id).await?;

        // busy drivers leave the candidate pool; best-effort, the ride row
        // stays the source of truth
        if let Err(e) = self.registry.set_availability(driver_id, false) {
            warn!("could not mark driver {driver_id} busy: {e}");
        }

        self.notify_rider(&RideEvent::RideAccepted(ride.clone())).await;
        Ok(ride)
    }

    /// The assigned driver declines; re-dispatch is a separate, retryable
    /// step (the sweeper, or an explicit `redispatch` call)
    pub async fn reject_ride(&self, ride_id: RideId, driver_id: UserId) -> DispatchResult<Ride> {
        self.store.reject(ride_id, driver_id).await
    }

    /// Driver-initiated lifecycle advance
    pub async fn advance_ride_status(
        &self,
        ride_id: RideId,
        driver_id: UserId,
        action: RideAction,
    ) -> DispatchResult<Ride> {
        let ride = match action {
            RideAction::DriverArrived => self.store.mark_driver_arrived(ride_id, driver_id).await?,
            RideAction::StartTrip => self.store.start_trip(ride_id, driver_id).await?,
            RideAction::CompleteTrip => self.store.complete_trip(ride_id, driver_id).await?,
        };

        if action == RideAction::CompleteTrip {
            if let Err(e) = self.registry.set_availability(driver_id, true) {
                warn!("could not return driver {driver_id} to the pool: {e}");
            }
        }

        self.notify_rider(&RideEvent::RideStatusUpdated(ride.clone())).await;
        Ok(ride)
    }

    /// Cancel by either party, each with its own legal window
    pub async fn cancel_ride(
        &self,
        ride_id: RideId,
        caller_id: UserId,
        role: CallerRole,
    ) -> DispatchResult<Ride> {
        match role {
            CallerRole::Rider => {
                let ride = self.store.cancel_by_rider(ride_id, caller_id).await?;
                if let Some(driver_id) = ride.driver_id {
                    let delivered = self
                        .notifier
                        .deliver(driver_id, &RideEvent::RideStatusUpdated(ride.clone()))
                        .await;
                    if !delivered {
                        debug!("driver {driver_id} not connected for cancel of ride {ride_id}");
                    }
                }
                Ok(ride)
            }
            CallerRole::Driver => {
                let ride = self.store.cancel_by_driver(ride_id, caller_id).await?;
                if let Err(e) = self.registry.set_availability(caller_id, true) {
                    warn!("could not return driver {caller_id} to the pool: {e}");
                }
                self.notify_rider(&RideEvent::RideCancelledByDriver(ride.clone())).await;
                Ok(ride)
            }
        }
    }

    async fn notify_rider(&self, event: &RideEvent) {
        let rider_id = event.ride().rider_id;
        if !self.notifier.deliver(rider_id, event).await {
            debug!("rider {rider_id} not connected for {}", event.name());
        }
    }
}
