//! Fare estimation.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Flat fee charged on every ride (2.00).
pub const BASE_FARE: Decimal = Decimal::from_parts(200, 0, 0, false, 2);

/// Charge per kilometre travelled (1.50).
pub const PER_KM_RATE: Decimal = Decimal::from_parts(150, 0, 0, false, 2);

/// Charge per minute of travel (0.50).
pub const PER_MINUTE_RATE: Decimal = Decimal::from_parts(50, 0, 0, false, 2);

/// Rounds a monetary or distance amount to two decimal places, half away from zero.
pub fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Computes the fare for a trip: base + per-km × distance + per-minute × duration.
pub fn estimate_fare(distance_km: Decimal, duration_minutes: u32) -> Decimal {
    let minutes = Decimal::from(duration_minutes);
    round_cents(BASE_FARE + PER_KM_RATE * distance_km + PER_MINUTE_RATE * minutes)
}

/// Trip figures a ride is priced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FareQuote {
    /// Route distance in kilometres.
    pub distance_km: Decimal,
    /// Estimated travel time in minutes.
    pub duration_minutes: u32,
    /// Price for the trip.
    pub fare: Decimal,
}

impl FareQuote {
    /// Prices a trip from its route figures.
    pub fn new(distance_km: Decimal, duration_minutes: u32) -> Self {
        let distance_km = round_cents(distance_km);
        Self {
            distance_km,
            duration_minutes,
            fare: estimate_fare(distance_km, duration_minutes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_constants() {
        assert_eq!(BASE_FARE, Decimal::new(2, 0));
        assert_eq!(PER_KM_RATE, Decimal::new(15, 1));
        assert_eq!(PER_MINUTE_RATE, Decimal::new(5, 1));
    }

    #[test]
    fn test_ten_km_twenty_minutes() {
        let fare = estimate_fare(Decimal::new(10, 0), 20);
        assert_eq!(fare, Decimal::new(2700, 2));
        assert_eq!(fare.to_string(), "27.00");
    }

    #[test]
    fn test_zero_trip_costs_base_fare() {
        assert_eq!(estimate_fare(Decimal::ZERO, 0), BASE_FARE);
    }

    #[test]
    fn test_fractional_distance_rounds_to_cents() {
        // 2 + 3.333 * 1.5 + 7 * 0.5 = 10.4995 -> 10.50
        let fare = estimate_fare(Decimal::new(3333, 3), 7);
        assert_eq!(fare, Decimal::new(1050, 2));
    }

    #[test]
    fn test_quote_rounds_distance_before_pricing() {
        let quote = FareQuote::new(Decimal::new(12345, 3), 15);
        assert_eq!(quote.distance_km, Decimal::new(1235, 2));
        // 2 + 12.35 * 1.5 + 15 * 0.5 = 28.025 -> 28.03
        assert_eq!(quote.fare, Decimal::new(2803, 2));
    }
}
