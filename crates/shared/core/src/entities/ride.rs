use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::RideStatus;
use crate::values::{Coordinates, RideId, Timestamp, UserId};

/// One trip request, from creation to a terminal outcome.
///
/// Rides are never deleted; terminal states are retained as history.
/// All status changes go through the ride store's guarded transitions, so a
/// `Ride` value in hand is always a snapshot that may already be stale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ride {
    pub id: RideId,
    pub rider_id: UserId,
    /// Assigned driver; `None` while unassigned (initial state, and again
    /// after a rejection or an expired assignment)
    pub driver_id: Option<UserId>,
    pub pickup: Coordinates,
    pub dropoff: Coordinates,
    pub pickup_address: String,
    pub dropoff_address: String,
    pub status: RideStatus,
    pub estimated_fare: Decimal,
    pub distance_km: f64,
    pub requested_at: Timestamp,
    /// When the current assignment was made; cleared on unassign
    pub assigned_at: Option<Timestamp>,
    pub accepted_at: Option<Timestamp>,
    pub driver_arrived_at: Option<Timestamp>,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub cancelled_at: Option<Timestamp>,
}

impl Ride {
    /// Create a new unassigned ride in `requested` with an explicit timestamp
    #[allow(clippy::too_many_arguments)]
    pub fn new_with_time(
        rider_id: UserId,
        pickup: Coordinates,
        dropoff: Coordinates,
        pickup_address: String,
        dropoff_address: String,
        distance_km: f64,
        estimated_fare: Decimal,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            rider_id,
            driver_id: None,
            pickup,
            dropoff,
            pickup_address,
            dropoff_address,
            status: RideStatus::Requested,
            estimated_fare,
            distance_km,
            requested_at: timestamp,
            assigned_at: None,
            accepted_at: None,
            driver_arrived_at: None,
            started_at: None,
            completed_at: None,
            cancelled_at: None,
        }
    }

    /// Returns true if `driver` is the currently assigned driver
    pub fn is_assigned_to(&self, driver: UserId) -> bool {
        self.driver_id == Some(driver)
    }

    /// Returns true while a driver is actively working this ride
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}
