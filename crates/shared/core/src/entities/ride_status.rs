use serde::{Deserialize, Serialize};

/// Ride lifecycle status
///
/// The legal edges are enforced by the ride store's guarded transitions;
/// this type only names the states and classifies them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RideStatus {
    /// Requested by a rider; may or may not have a driver assigned yet.
    /// Re-entrant: a rejected or expired assignment cycles back here.
    #[serde(rename = "requested")]
    Requested,
    /// The assigned driver accepted the request
    #[serde(rename = "accepted")]
    Accepted,
    /// The driver reported arrival at the pickup point
    #[serde(rename = "driver_arrived")]
    DriverArrived,
    /// Trip in progress
    #[serde(rename = "ongoing")]
    Ongoing,
    /// Trip finished normally
    #[serde(rename = "completed")]
    Completed,
    /// Cancelled by the rider before the trip started
    #[serde(rename = "cancelled_rider")]
    CancelledByRider,
    /// Cancelled by the assigned driver before the trip started
    #[serde(rename = "cancelled_driver")]
    CancelledByDriver,
}

impl RideStatus {
    /// Returns true if no further transition is permitted from this state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RideStatus::Completed | RideStatus::CancelledByRider | RideStatus::CancelledByDriver
        )
    }

    /// Returns true while a driver is actively working the ride
    /// (accepted through trip-in-progress)
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            RideStatus::Accepted | RideStatus::DriverArrived | RideStatus::Ongoing
        )
    }
}

impl std::fmt::Display for RideStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RideStatus::Requested => "requested",
            RideStatus::Accepted => "accepted",
            RideStatus::DriverArrived => "driver_arrived",
            RideStatus::Ongoing => "ongoing",
            RideStatus::Completed => "completed",
            RideStatus::CancelledByRider => "cancelled_rider",
            RideStatus::CancelledByDriver => "cancelled_driver",
        };
        f.write_str(name)
    }
}
