use serde::{Deserialize, Serialize};

use crate::values::{Coordinates, Timestamp, UserId};

/// Live state of one provisioned driver.
///
/// Driver identities come from the identity collaborator; this record only
/// tracks what dispatch needs: where the driver is and whether they can be
/// offered a ride.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverLocation {
    pub driver_id: UserId,
    /// Last reported position; `None` until the first location update
    pub position: Option<Coordinates>,
    pub is_available: bool,
    pub is_verified: bool,
    pub last_updated_at: Option<Timestamp>,
}

impl DriverLocation {
    pub fn new(driver_id: UserId, is_verified: bool) -> Self {
        Self {
            driver_id,
            position: None,
            is_available: false,
            is_verified,
            last_updated_at: None,
        }
    }

    /// A driver is a dispatch candidate only when available, verified and
    /// located
    pub fn is_candidate(&self) -> bool {
        self.is_available && self.is_verified && self.position.is_some()
    }
}
