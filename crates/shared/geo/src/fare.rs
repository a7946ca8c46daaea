use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Linear fare model: `base_fare + distance_km * rate_per_km`
///
/// Amounts are in the reference currency unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FareSchedule {
    pub base_fare: Decimal,
    pub rate_per_km: Decimal,
}

impl Default for FareSchedule {
    fn default() -> Self {
        Self {
            base_fare: dec!(5.00),
            rate_per_km: dec!(1.50),
        }
    }
}

impl FareSchedule {
    /// Fare estimate for a trip, rounded to 2 decimal places.
    ///
    /// `distance_km` comes from the haversine over validated coordinates and
    /// is therefore finite and non-negative.
    pub fn estimate(&self, distance_km: f64) -> Decimal {
        let distance = Decimal::from_f64(distance_km).unwrap_or_default();
        (self.base_fare + distance * self.rate_per_km).round_dp(2)
    }
}
