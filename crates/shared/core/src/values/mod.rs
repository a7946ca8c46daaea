mod coordinates;

pub use coordinates::{CoordinateError, Coordinates};

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Unique identifier for a ride
pub type RideId = Uuid;

/// Unique identifier for a rider or driver
/// Issued by the identity collaborator; never minted here
pub type UserId = Uuid;

/// Unique identifier for a live socket connection
pub type ConnectionId = Uuid;

/// Timestamp in UTC
pub type Timestamp = DateTime<Utc>;
