//! Driver Registry
//!
//! Live table of every provisioned driver's location and availability.
//! Shared by all request-handling tasks; the map handles its own locking.
//! Proximity search is a full scan - fine at moderate fleet sizes, and the
//! contract (filtered, distance-annotated, deterministically ordered) leaves
//! room to swap in a spatial index later.

use std::sync::Arc;

use dashmap::DashMap;
use log::{debug, info};
use rideline_core::{Coordinates, DriverLocation, UserId};
use rideline_ports::{Clock, DispatchError, DispatchResult};

/// One proximity-query hit, annotated with the computed distance
#[derive(Debug, Clone)]
pub struct NearbyDriver {
    pub driver_id: UserId,
    pub position: Coordinates,
    pub distance_km: f64,
}

/// Tracks each driver's live location and availability flag
pub struct DriverRegistry {
    drivers: DashMap<UserId, DriverLocation>,
    clock: Arc<dyn Clock>,
}

impl DriverRegistry {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            drivers: DashMap::new(),
            clock,
        }
    }

    /// Provision a driver identity (from the identity collaborator).
    /// Drivers come online unavailable and unlocated.
    pub fn register(&self, driver_id: UserId, is_verified: bool) {
        info!("driver registered: id={driver_id}, verified={is_verified}");
        self.drivers
            .insert(driver_id, DriverLocation::new(driver_id, is_verified));
    }

    pub fn is_registered(&self, driver_id: UserId) -> bool {
        self.drivers.contains_key(&driver_id)
    }

    /// Upsert a driver's position; unknown drivers are rejected (identities
    /// are provisioned externally, never created from a location ping)
    pub fn update_location(&self, driver_id: UserId, lat: f64, lon: f64) -> DispatchResult<()> {
        let position =
            Coordinates::new(lat, lon).map_err(|e| DispatchError::Validation(e.to_string()))?;

        match self.drivers.get_mut(&driver_id) {
            Some(mut entry) => {
                entry.position = Some(position);
                entry.last_updated_at = Some(self.clock.now());
                debug!("driver location updated: id={driver_id}, lat={lat}, lon={lon}");
                Ok(())
            }
            None => Err(DispatchError::NotFound(format!("driver {driver_id}"))),
        }
    }

    /// Idempotent availability toggle; returns the new state
    pub fn set_availability(&self, driver_id: UserId, available: bool) -> DispatchResult<bool> {
        match self.drivers.get_mut(&driver_id) {
            Some(mut entry) => {
                entry.is_available = available;
                entry.last_updated_at = Some(self.clock.now());
                info!("driver availability: id={driver_id}, available={available}");
                Ok(available)
            }
            None => Err(DispatchError::NotFound(format!("driver {driver_id}"))),
        }
    }

    /// Snapshot of one driver's record
    pub fn get(&self, driver_id: UserId) -> Option<DriverLocation> {
        self.drivers.get(&driver_id).map(|entry| entry.clone())
    }

    /// All candidates (available + verified + located) within `radius_km`
    /// of `origin`, ordered ascending by distance, ties broken by driver id
    /// so results are deterministic.
    pub fn find_nearby(&self, origin: &Coordinates, radius_km: f64) -> Vec<NearbyDriver> {
        let mut hits: Vec<NearbyDriver> = self
            .drivers
            .iter()
            .filter(|entry| entry.is_candidate())
            .filter_map(|entry| {
                let position = entry.position?;
                let distance_km = rideline_geo::distance_km(origin, &position);
                (distance_km <= radius_km).then_some(NearbyDriver {
                    driver_id: entry.driver_id,
                    position,
                    distance_km,
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance_km
                .total_cmp(&b.distance_km)
                .then_with(|| a.driver_id.cmp(&b.driver_id))
        });
        hits
    }
}
