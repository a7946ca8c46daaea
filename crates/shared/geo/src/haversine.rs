use rideline_core::Coordinates;

/// Mean earth radius in kilometers
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points using the haversine formula
pub fn distance_km(a: &Coordinates, b: &Coordinates) -> f64 {
    let (lat1, lon1) = (a.latitude().to_radians(), a.longitude().to_radians());
    let (lat2, lon2) = (b.latitude().to_radians(), b.longitude().to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let sin_dlat = (dlat * 0.5).sin();
    let sin_dlon = (dlon * 0.5).sin();
    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}
