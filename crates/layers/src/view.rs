use foundation::math::{LatLng, Point};

/// The slice of map state a layer needs to decide what to draw.
pub trait MapView {
    /// Viewport size in pixels.
    fn size(&self) -> Point;

    fn zoom(&self) -> f64;

    fn center(&self) -> LatLng;

    /// Target zoom of a running zoom animation.
    fn animating_zoom(&self) -> Option<f64>;

    fn project(&self, ll: LatLng, zoom: f64) -> Point;

    /// Scale factor between two zoom levels.
    fn zoom_scale(&self, to_zoom: f64, from_zoom: f64) -> f64;

    fn container_point_to_layer_point(&self, p: Point) -> Point;

    fn rotation_enabled(&self) -> bool;
}
