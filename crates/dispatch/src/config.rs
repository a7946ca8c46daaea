use serde::{Deserialize, Serialize};

/// Dispatch policy knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Candidate search radius around the pickup point
    pub search_radius_km: f64,
    /// How long an assigned driver gets to accept before the assignment is
    /// swept back to unassigned. `None` disables the acceptance window.
    pub accept_timeout_secs: Option<u64>,
    /// How often the sweeper expires stale assignments and re-dispatches
    /// unassigned rides
    pub sweep_interval_secs: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            search_radius_km: 10.0,
            accept_timeout_secs: Some(120),
            sweep_interval_secs: 30,
        }
    }
}
