//! Simulated driver positions for the driver-search screen.
//!
//! There is no dispatch backend: nearby drivers are fabricated by offsetting
//! the pickup point at random. The random source is injected so callers can
//! seed it and get repeatable results.

use rand::Rng;
use serde::Serialize;

use crate::distance::estimate_km;
use crate::error::CoreError;
use crate::geo::GeoPoint;

#[derive(Debug, Clone, PartialEq)]
pub struct DriverSearch {
    pub count: usize,
    /// Largest random offset from the pickup point, in degrees.
    pub max_offset_deg: f64,
    pub average_speed_kmh: f64,
}

impl Default for DriverSearch {
    fn default() -> Self {
        Self {
            count: 5,
            max_offset_deg: 0.02,
            average_speed_kmh: 30.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbyDriver {
    pub position: GeoPoint,
    pub distance_km: f64,
    pub eta_minutes: u32,
}

/// Places `search.count` drivers around `origin`, nearest first.
///
/// # Errors
///
/// Returns [`CoreError::InvalidInput`] when the origin or the search
/// parameters are not finite, or when the offset or speed is not positive.
pub fn simulate_nearby_drivers<R: Rng>(
    rng: &mut R,
    origin: GeoPoint,
    search: &DriverSearch,
) -> Result<Vec<NearbyDriver>, CoreError> {
    if !origin.latitude.is_finite() || !origin.longitude.is_finite() {
        return Err(CoreError::invalid("origin", "coordinates must be finite"));
    }
    if !(search.max_offset_deg.is_finite() && search.max_offset_deg > 0.0) {
        return Err(CoreError::invalid(
            "max_offset_deg",
            format!("expected a positive number, got {}", search.max_offset_deg),
        ));
    }
    if !(search.average_speed_kmh.is_finite() && search.average_speed_kmh > 0.0) {
        return Err(CoreError::invalid(
            "average_speed_kmh",
            format!(
                "expected a positive number, got {}",
                search.average_speed_kmh
            ),
        ));
    }

    let max = search.max_offset_deg;
    let mut drivers = (0..search.count)
        .map(|_| {
            let d_lat = rng.random_range(-max..=max);
            let d_lng = rng.random_range(-max..=max);
            let distance_km = estimate_km(d_lat.abs().max(d_lng.abs()))?;
            Ok(NearbyDriver {
                position: GeoPoint::new(origin.latitude + d_lat, origin.longitude + d_lng),
                distance_km,
                eta_minutes: eta_minutes(distance_km, search.average_speed_kmh),
            })
        })
        .collect::<Result<Vec<_>, CoreError>>()?;

    drivers.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    tracing::debug!(count = drivers.len(), "simulated nearby drivers");
    Ok(drivers)
}

/// Whole minutes to cover `distance_km`, never less than one.
fn eta_minutes(distance_km: f64, speed_kmh: f64) -> u32 {
    let minutes = (distance_km / speed_kmh * 60.0).ceil();
    // Offsets are bounded by the search radius, far below u32::MAX minutes.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let minutes = minutes as u32;
    minutes.max(1)
}
