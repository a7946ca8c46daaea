//! Rideline Geo
//!
//! Pure distance and fare estimation. No side effects, no I/O: coordinates
//! are validated at construction in `rideline-core`, so everything here is
//! total over its inputs.

mod fare;
mod haversine;

pub use fare::FareSchedule;
pub use haversine::{EARTH_RADIUS_KM, distance_km};
