//! Driving routes built from directions API responses.
//!
//! The map layer draws [`Route::points`] as an overlay and zooms to
//! [`Route::region`]; the summary screens show [`Route::length_km`].

use serde::Serialize;
use serde_json::Value;

use crate::distance::haversine_km;
use crate::error::CoreError;
use crate::geo::{Bounds, GeoPoint, MapRegion};
use crate::polyline;

/// Padding applied around a route when fitting the map to it.
pub const DEFAULT_REGION_PADDING: f64 = 0.2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    pub points: Vec<GeoPoint>,
}

impl Route {
    /// Decodes an encoded polyline into a route.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Decode`] when the polyline is malformed.
    pub fn from_encoded(encoded: &str) -> Result<Self, CoreError> {
        let points = polyline::decode(encoded)?;
        Ok(Self { points })
    }

    /// Builds a route from the first route of a directions API response.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidInput`] when the response has no overview
    /// polyline, or [`CoreError::Decode`] when it is malformed.
    pub fn from_directions(response: &Value) -> Result<Self, CoreError> {
        Self::from_encoded(overview_polyline(response)?)
    }

    /// Total length in kilometres along the decoded points.
    #[must_use]
    pub fn length_km(&self) -> f64 {
        self.points
            .windows(2)
            .map(|pair| haversine_km(&pair[0], &pair[1]))
            .sum()
    }

    #[must_use]
    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::around(&self.points)
    }

    /// Map region fitting the whole route, or `None` for an empty route.
    #[must_use]
    pub fn region(&self) -> Option<MapRegion> {
        self.bounds().map(|b| b.region(DEFAULT_REGION_PADDING))
    }

    #[must_use]
    pub fn origin(&self) -> Option<&GeoPoint> {
        self.points.first()
    }

    #[must_use]
    pub fn destination(&self) -> Option<&GeoPoint> {
        self.points.last()
    }
}

/// Extracts `routes[0].overview_polyline.points` from a directions response.
///
/// # Errors
///
/// Returns [`CoreError::InvalidInput`] when the field is absent or not a
/// string, including responses with an empty `routes` array.
pub fn overview_polyline(response: &Value) -> Result<&str, CoreError> {
    response
        .pointer("/routes/0/overview_polyline/points")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            let status = response
                .get("status")
                .and_then(Value::as_str)
                .unwrap_or("unknown");
            CoreError::invalid(
                "routes[0].overview_polyline.points",
                format!("missing from directions response (status: {status})"),
            )
        })
}
