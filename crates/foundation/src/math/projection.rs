//! Spherical (Web) Mercator projection between lat/lng and world pixels.
//!
//! World pixels at zoom `z` span `TILE_SIZE * 2^z` on each axis, origin at the
//! north-west corner, y growing southwards.

use super::Point;

/// Sphere radius used by Web Mercator (meters).
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Latitude beyond which Web Mercator is clamped.
pub const MAX_LATITUDE_DEG: f64 = 85.051_128_779_806_6;

pub const TILE_SIZE: f64 = 256.0;

/// Geographic coordinate in degrees.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Pixel scale of the whole world at `zoom`.
pub fn zoom_scale(zoom: f64) -> f64 {
    TILE_SIZE * zoom.exp2()
}

/// Inverse of [`zoom_scale`].
pub fn scale_zoom(scale: f64) -> f64 {
    (scale / TILE_SIZE).log2()
}

/// Projects to spherical mercator meters.
pub fn mercator_meters(ll: LatLng) -> Point {
    let lat = ll.lat.clamp(-MAX_LATITUDE_DEG, MAX_LATITUDE_DEG).to_radians();
    let sin = lat.sin();
    Point::new(
        EARTH_RADIUS_M * ll.lng.to_radians(),
        EARTH_RADIUS_M * ((1.0 + sin) / (1.0 - sin)).ln() / 2.0,
    )
}

pub fn mercator_meters_to_lat_lng(m: Point) -> LatLng {
    let lat = 2.0 * (m.y / EARTH_RADIUS_M).exp().atan() - std::f64::consts::FRAC_PI_2;
    LatLng::new(lat.to_degrees(), (m.x / EARTH_RADIUS_M).to_degrees())
}

/// Lat/lng to world pixels at `zoom`.
pub fn project(ll: LatLng, zoom: f64) -> Point {
    let m = mercator_meters(ll);
    let k = 0.5 / (std::f64::consts::PI * EARTH_RADIUS_M);
    let s = zoom_scale(zoom);
    Point::new(s * (k * m.x + 0.5), s * (-k * m.y + 0.5))
}

/// World pixels at `zoom` to lat/lng.
pub fn unproject(p: Point, zoom: f64) -> LatLng {
    let k = 0.5 / (std::f64::consts::PI * EARTH_RADIUS_M);
    let s = zoom_scale(zoom);
    let m = Point::new((p.x / s - 0.5) / k, (p.y / s - 0.5) / -k);
    mercator_meters_to_lat_lng(m)
}
