use rideline_core::{RideEvent, RideId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// Outbound frame: an event name plus its JSON payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub event: String,
    pub payload: serde_json::Value,
}

impl OutboundMessage {
    /// Frame a ride event; the payload is the full current ride record
    pub fn from_event(event: &RideEvent) -> Result<Self, GatewayError> {
        Ok(Self {
            event: event.name().to_string(),
            payload: serde_json::to_value(event.ride())?,
        })
    }

    /// Frame a live driver position for the rider of an active ride
    pub fn driver_location(
        ride_id: RideId,
        driver_id: UserId,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            event: "driver_location_updated".to_string(),
            payload: serde_json::json!({
                "ride_id": ride_id,
                "driver_id": driver_id,
                "latitude": latitude,
                "longitude": longitude,
            }),
        }
    }
}
