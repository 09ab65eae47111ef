//! Geographic value types shared by the polyline, route and driver modules.

use serde::{Deserialize, Serialize};

/// A WGS84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns `true` when both coordinates are within `tolerance` degrees of
    /// `other`.
    #[must_use]
    pub fn approx_eq(&self, other: &GeoPoint, tolerance: f64) -> bool {
        (self.latitude - other.latitude).abs() <= tolerance
            && (self.longitude - other.longitude).abs() <= tolerance
    }
}

/// Axis-aligned bounding box around a set of points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Smallest box containing every point, or `None` for an empty slice.
    #[must_use]
    pub fn around(points: &[GeoPoint]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let seed = Self {
            min_lat: first.latitude,
            max_lat: first.latitude,
            min_lng: first.longitude,
            max_lng: first.longitude,
        };
        Some(rest.iter().fold(seed, |b, p| Self {
            min_lat: b.min_lat.min(p.latitude),
            max_lat: b.max_lat.max(p.latitude),
            min_lng: b.min_lng.min(p.longitude),
            max_lng: b.max_lng.max(p.longitude),
        }))
    }

    #[must_use]
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }

    /// Map region that fits the box with `padding` expressed as a fraction of
    /// each span (e.g. `0.2` adds 20%). A degenerate box still gets a
    /// non-zero span so the map layer can zoom to it.
    #[must_use]
    pub fn region(&self, padding: f64) -> MapRegion {
        let scale = 1.0 + padding.max(0.0);
        MapRegion {
            center: self.center(),
            latitude_delta: ((self.max_lat - self.min_lat) * scale).max(MIN_REGION_DELTA),
            longitude_delta: ((self.max_lng - self.min_lng) * scale).max(MIN_REGION_DELTA),
        }
    }
}

/// Smallest span a [`MapRegion`] is allowed to have, roughly 100 m.
pub const MIN_REGION_DELTA: f64 = 0.001;

/// Center-plus-span description of the visible map area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapRegion {
    pub center: GeoPoint,
    pub latitude_delta: f64,
    pub longitude_delta: f64,
}
