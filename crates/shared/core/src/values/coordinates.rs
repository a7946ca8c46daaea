use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejected coordinate input
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoordinateError {
    #[error("latitude {0} out of range [-90, 90]")]
    Latitude(f64),

    #[error("longitude {0} out of range [-180, 180]")]
    Longitude(f64),
}

/// A validated geographic point.
///
/// Construction is the only validation gate: every `Coordinates` value in
/// the system holds a finite latitude in [-90, 90] and longitude in
/// [-180, 180], so downstream geo math never has to re-check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinateError::Latitude(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinateError::Longitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}
