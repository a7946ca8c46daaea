use super::Ride;

/// Real-time events pushed to a party's live connection.
///
/// Each event carries the full current ride record as payload; the event
/// name is the wire-level discriminator clients switch on.
#[derive(Debug, Clone)]
pub enum RideEvent {
    /// To the assigned driver: a new ride awaits a decision
    NewRideRequest(Ride),
    /// To the rider: the assigned driver accepted
    RideAccepted(Ride),
    /// To the rider (or, on a rider cancel, the assigned driver): the ride
    /// advanced to a new status
    RideStatusUpdated(Ride),
    /// To the rider: the assigned driver cancelled
    RideCancelledByDriver(Ride),
}

impl RideEvent {
    /// Wire-level event name
    pub fn name(&self) -> &'static str {
        match self {
            RideEvent::NewRideRequest(_) => "new_ride_request",
            RideEvent::RideAccepted(_) => "ride_accepted",
            RideEvent::RideStatusUpdated(_) => "ride_status_updated",
            RideEvent::RideCancelledByDriver(_) => "ride_cancelled_by_driver",
        }
    }

    /// The ride snapshot this event carries
    pub fn ride(&self) -> &Ride {
        match self {
            RideEvent::NewRideRequest(ride)
            | RideEvent::RideAccepted(ride)
            | RideEvent::RideStatusUpdated(ride)
            | RideEvent::RideCancelledByDriver(ride) => ride,
        }
    }
}
