//! Distance helpers.
//!
//! [`estimate_km`] is the flat-earth shortcut used to turn a coordinate
//! offset into a human readable distance; [`haversine_km`] is the great
//! circle distance used for route lengths.

use crate::error::CoreError;
use crate::geo::GeoPoint;

/// Approximate kilometres per degree of latitude.
pub const KM_PER_DEGREE: f64 = 111.0;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Converts a coordinate delta in degrees into kilometres, rounded to one
/// decimal place. The sign of the delta is ignored.
///
/// # Errors
///
/// Returns [`CoreError::InvalidInput`] when `delta_degrees` is NaN or infinite.
pub fn estimate_km(delta_degrees: f64) -> Result<f64, CoreError> {
    if !delta_degrees.is_finite() {
        return Err(CoreError::invalid(
            "delta_degrees",
            format!("expected a finite number, got {delta_degrees}"),
        ));
    }
    Ok(round_tenths(delta_degrees.abs() * KM_PER_DEGREE))
}

/// Great circle distance between two points in kilometres.
#[must_use]
pub fn haversine_km(start: &GeoPoint, end: &GeoPoint) -> f64 {
    let d_lat = (end.latitude - start.latitude).to_radians();
    let d_lng = (end.longitude - start.longitude).to_radians();
    let lat1 = start.latitude.to_radians();
    let lat2 = end.latitude.to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + (d_lng / 2.0).sin().powi(2) * lat1.cos() * lat2.cos();
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
