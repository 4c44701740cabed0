//! Server-side fare quoting.
//!
//! Clients may supply their own routing figures (from a maps widget, say), but
//! those are only trusted after checking them against the straight-line
//! distance between pickup and dropoff. The fare itself is always computed
//! here.

use entities::{FareQuote, GeoPoint, Place};
use rust_decimal::Decimal;

use crate::error::{ServerError, ServerResult};
use crate::services::routing::RoutingProvider;

/// Longest trip the service will price.
pub const MAX_TRIP_KM: f64 = 1000.0;
/// Longest trip duration the service will price (one day).
pub const MAX_TRIP_MINUTES: u32 = 1440;
/// Fastest plausible average speed over a trip.
pub const MAX_AVERAGE_SPEED_KMH: f64 = 200.0;

/// Checks that a place has valid coordinates.
pub fn check_point(place: &Place, field: &str) -> ServerResult<GeoPoint> {
    let point = place.point();
    if !point.is_valid() {
        return Err(ServerError::invalid(format!("{field} coordinates are out of range")));
    }
    Ok(point)
}

/// Checks a pickup/dropoff pair for a ride request.
pub fn check_trip(pickup: &Place, dropoff: &Place) -> ServerResult<(GeoPoint, GeoPoint)> {
    let from = check_point(pickup, "pickup")?;
    let to = check_point(dropoff, "dropoff")?;
    if pickup.address.trim().is_empty() {
        return Err(ServerError::invalid("pickup address is required"));
    }
    if dropoff.address.trim().is_empty() {
        return Err(ServerError::invalid("dropoff address is required"));
    }
    if from == to {
        return Err(ServerError::invalid("pickup and dropoff must differ"));
    }
    Ok((from, to))
}

/// Checks a client-supplied distance against the great-circle distance `direct_km`.
///
/// The distance must be positive however short the trip.
pub fn check_distance(direct_km: f64, distance_km: f64) -> ServerResult<()> {
    let lower = (direct_km * 0.95 - 0.05).max(0.0);
    let upper = (direct_km * 4.0 + 2.0).min(MAX_TRIP_KM);
    if !distance_km.is_finite() || distance_km <= 0.0 || distance_km < lower || distance_km > upper
    {
        return Err(ServerError::invalid(format!(
            "distance_km must be positive and between {lower:.2} and {upper:.2}"
        )));
    }
    Ok(())
}

/// Checks a client-supplied duration for the given distance.
pub fn check_duration(distance_km: f64, duration_minutes: u32) -> ServerResult<()> {
    if !(1..=MAX_TRIP_MINUTES).contains(&duration_minutes) {
        return Err(ServerError::invalid(format!(
            "duration_minutes must be between 1 and {MAX_TRIP_MINUTES}"
        )));
    }
    let speed_kmh = distance_km / (f64::from(duration_minutes) / 60.0);
    if speed_kmh > MAX_AVERAGE_SPEED_KMH {
        return Err(ServerError::invalid(
            "duration_minutes is too short for the distance",
        ));
    }
    Ok(())
}

/// Prices a trip, using client routing figures where given and the routing
/// provider for whatever is missing.
pub async fn quote(
    router: &dyn RoutingProvider,
    from: GeoPoint,
    to: GeoPoint,
    distance_km: Option<f64>,
    duration_minutes: Option<u32>,
) -> ServerResult<FareQuote> {
    let direct_km = from.distance_km(&to);
    if let Some(distance) = distance_km {
        check_distance(direct_km, distance)?;
    }

    let (distance, minutes) = match (distance_km, duration_minutes) {
        (Some(distance), Some(minutes)) => (distance, minutes),
        (distance, minutes) => {
            let route = router.route(from, to).await?;
            (
                distance.unwrap_or(route.distance_km),
                minutes.unwrap_or(route.duration_minutes),
            )
        }
    };
    if duration_minutes.is_some() {
        check_duration(distance, minutes)?;
    }

    let distance = Decimal::from_f64_retain(distance)
        .ok_or_else(|| ServerError::invalid("distance_km is not a number"))?;
    Ok(FareQuote::new(distance, minutes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::routing::StraightLineRouter;

    fn place(lat: f64, lng: f64) -> Place {
        Place::new(lat, lng, "somewhere")
    }

    #[test]
    fn test_distance_bounds() {
        assert!(check_distance(10.0, 9.46).is_ok());
        assert!(check_distance(10.0, 42.0).is_ok());
        assert!(check_distance(10.0, 9.0).is_err());
        assert!(check_distance(10.0, 42.1).is_err());
        assert!(check_distance(10.0, f64::NAN).is_err());
        // The cap wins over the multiplier on long trips.
        assert!(check_distance(600.0, 1001.0).is_err());
    }

    #[test]
    fn test_short_trips_need_a_positive_distance() {
        assert!(check_distance(0.001, 0.01).is_ok());
        assert!(check_distance(0.001, 0.0).is_err());
        assert!(check_distance(0.001, -0.04).is_err());
    }

    #[test]
    fn test_duration_bounds() {
        assert!(check_duration(10.0, 20).is_ok());
        assert!(check_duration(10.0, 0).is_err());
        assert!(check_duration(10.0, 1441).is_err());
        // 100 km in 10 minutes is 600 km/h.
        assert!(check_duration(100.0, 10).is_err());
    }

    #[test]
    fn test_check_trip() {
        assert!(check_trip(&place(1.0, 1.0), &place(1.0, 1.1)).is_ok());
        assert!(check_trip(&place(1.0, 1.0), &place(1.0, 1.0)).is_err());
        assert!(check_trip(&place(91.0, 1.0), &place(1.0, 1.0)).is_err());
        assert!(check_trip(&Place::new(1.0, 1.0, " "), &place(1.0, 1.1)).is_err());
    }

    #[tokio::test]
    async fn test_client_figures_are_priced() {
        let from = GeoPoint::new(0.0, 0.0);
        let to = GeoPoint::new(0.0, 0.09);
        // ~10 km apart.
        let quote = quote(&StraightLineRouter::new(), from, to, Some(10.0), Some(20))
            .await
            .unwrap();

        assert_eq!(quote.distance_km, Decimal::new(1000, 2));
        assert_eq!(quote.duration_minutes, 20);
        assert_eq!(quote.fare, Decimal::new(2700, 2));
    }

    #[tokio::test]
    async fn test_missing_figures_come_from_router() {
        let from = GeoPoint::new(0.0, 0.0);
        let to = GeoPoint::new(0.0, 0.1);
        let quote = quote(&StraightLineRouter::new(), from, to, None, None)
            .await
            .unwrap();

        assert_eq!(quote.distance_km, Decimal::new(1446, 2));
        assert_eq!(quote.duration_minutes, 29);
    }

    #[tokio::test]
    async fn test_implausible_distance_is_rejected() {
        let from = GeoPoint::new(0.0, 0.0);
        let to = GeoPoint::new(0.0, 0.09);
        let err = quote(&StraightLineRouter::new(), from, to, Some(0.5), None)
            .await
            .unwrap_err();

        assert!(matches!(err, ServerError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_negative_distance_is_not_priced() {
        let from = GeoPoint::new(0.0, 0.0);
        let to = GeoPoint::new(0.0, 0.00001);
        let router = StraightLineRouter::new();

        for distance in [-0.04, 0.0] {
            let err = quote(&router, from, to, Some(distance), Some(1))
                .await
                .unwrap_err();
            assert!(matches!(err, ServerError::InvalidRequest(_)));
        }
    }
}
