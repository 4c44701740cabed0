//! Route distance and duration estimation.

use async_trait::async_trait;
use entities::GeoPoint;

use crate::error::ServerResult;

/// Road distances run longer than the great-circle distance by about this factor.
pub const ROAD_DETOUR_FACTOR: f64 = 1.3;

/// Assumed average urban driving speed.
pub const AVERAGE_SPEED_KMH: f64 = 30.0;

/// Distance and travel time between two points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteEstimate {
    pub distance_km: f64,
    pub duration_minutes: u32,
}

/// Source of route figures for fare estimation.
///
/// A hosted maps provider can be plugged in here; the server ships with
/// [`StraightLineRouter`].
#[async_trait]
pub trait RoutingProvider: Send + Sync + 'static {
    /// Estimates driving distance and duration from `from` to `to`.
    async fn route(&self, from: GeoPoint, to: GeoPoint) -> ServerResult<RouteEstimate>;
}

/// Estimates routes from the great-circle distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct StraightLineRouter;

impl StraightLineRouter {
    /// Creates a new router.
    pub fn new() -> Self {
        Self
    }

    fn estimate(from: GeoPoint, to: GeoPoint) -> RouteEstimate {
        let distance_km = from.distance_km(&to) * ROAD_DETOUR_FACTOR;
        let minutes = (distance_km / AVERAGE_SPEED_KMH * 60.0).ceil();
        // Saturating float-to-int cast; at least one minute.
        let duration_minutes = (minutes as u32).max(1);

        RouteEstimate {
            distance_km,
            duration_minutes,
        }
    }
}

#[async_trait]
impl RoutingProvider for StraightLineRouter {
    async fn route(&self, from: GeoPoint, to: GeoPoint) -> ServerResult<RouteEstimate> {
        Ok(Self::estimate(from, to))
    }
}
