//! Spherical bounding-box construction for the trending API query.
//!
//! The API filters by a lat/lon box rather than a radius, so the
//! configured center + radius is converted with the spherical-earth
//! approximation. Near the poles the longitude span degenerates; the
//! box then covers the full longitude range.

use citizen_watch_incident_models::LatLon;

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A lat/lon box as the trending API expects it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Southern edge, degrees.
    pub lower_lat: f64,
    /// Western edge, degrees.
    pub lower_lon: f64,
    /// Northern edge, degrees.
    pub upper_lat: f64,
    /// Eastern edge, degrees.
    pub upper_lon: f64,
}

/// Computes the bounding box covering `radius_km` around `center`.
#[must_use]
pub fn bounding_box(center: LatLon, radius_km: f64) -> BoundingBox {
    let delta_lat = radius_km / EARTH_RADIUS_KM;
    let cos_lat = center.lat.to_radians().cos();
    let delta_lon = if cos_lat.abs() < 1e-10 {
        // At the poles longitude is meaningless; span the full range.
        std::f64::consts::PI
    } else {
        radius_km / (EARTH_RADIUS_KM * cos_lat)
    };

    BoundingBox {
        lower_lat: center.lat - delta_lat.to_degrees(),
        lower_lon: center.lon - delta_lon.to_degrees(),
        upper_lat: center.lat + delta_lat.to_degrees(),
        upper_lon: center.lon + delta_lon.to_degrees(),
    }
}
