//! The unrotated map a [`RotatableMap`](crate::RotatableMap) wraps.
//!
//! [`BaseMap`] carries the north-up defaults for every coordinate conversion;
//! the rotatable wrapper only overrides what the bearing changes.

use foundation::math::{LatLng, Point, projection};

/// How a view change reaches the host.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ViewChangeKind {
    /// Immediate move, e.g. a frame of a pinch.
    Move,
    /// Start of an animated zoom toward the target.
    Animate,
    /// Hard reset: the map pane is back at the origin.
    Reset,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewChange {
    pub center: LatLng,
    pub zoom: f64,
    pub pixel_origin: Point,
    pub kind: ViewChangeKind,
}

pub trait BaseMap {
    /// Viewport size in pixels.
    fn size(&self) -> Point;

    /// Position of the map pane relative to the container.
    fn map_pane_pos(&self) -> Point;

    fn set_map_pane_pos(&mut self, pos: Point);

    fn zoom(&self) -> f64;

    fn center(&self) -> LatLng;

    /// World pixel of the layer-space origin.
    fn pixel_origin(&self) -> Point;

    fn min_zoom(&self) -> f64;

    fn max_zoom(&self) -> f64;

    fn zoom_snap(&self) -> f64 {
        1.0
    }

    /// Target zoom of a running zoom animation.
    fn animating_zoom(&self) -> Option<f64>;

    fn apply_view(&mut self, change: ViewChange);

    /// Cancels any running pan animation.
    fn stop(&mut self) {}

    fn project(&self, ll: LatLng, zoom: f64) -> Point {
        projection::project(ll, zoom)
    }

    fn unproject(&self, p: Point, zoom: f64) -> LatLng {
        projection::unproject(p, zoom)
    }

    fn zoom_scale(&self, to_zoom: f64, from_zoom: f64) -> f64 {
        projection::zoom_scale(to_zoom) / projection::zoom_scale(from_zoom)
    }

    fn scale_zoom(&self, scale: f64, from_zoom: f64) -> f64 {
        projection::scale_zoom(scale * projection::zoom_scale(from_zoom))
    }

    /// Snaps to `zoom_snap` then clamps to the zoom range.
    fn limit_zoom(&self, zoom: f64) -> f64 {
        let snap = self.zoom_snap();
        let snapped = if snap > 0.0 {
            (zoom / snap).round() * snap
        } else {
            zoom
        };
        snapped.clamp(self.min_zoom(), self.max_zoom())
    }

    fn container_point_to_layer_point(&self, p: Point) -> Point {
        p - self.map_pane_pos()
    }

    fn layer_point_to_container_point(&self, p: Point) -> Point {
        p + self.map_pane_pos()
    }

    /// Pixel origin that puts `center` in the middle of the viewport at `zoom`.
    fn new_pixel_origin(&self, center: LatLng, zoom: f64) -> Point {
        (self.project(center, zoom) - self.size() / 2.0 + self.map_pane_pos()).round()
    }
}

/// In-memory host used by tests and headless callers.
#[derive(Debug, Clone, PartialEq)]
pub struct PlainMap {
    size: Point,
    center: LatLng,
    zoom: f64,
    min_zoom: f64,
    max_zoom: f64,
    zoom_snap: f64,
    map_pane_pos: Point,
    pixel_origin: Point,
    animating_to: Option<f64>,
    last_change: Option<ViewChangeKind>,
}

impl PlainMap {
    pub fn new(size: Point, center: LatLng, zoom: f64) -> Self {
        let mut map = Self {
            size,
            center,
            zoom,
            min_zoom: 0.0,
            max_zoom: 18.0,
            zoom_snap: 1.0,
            map_pane_pos: Point::ORIGIN,
            pixel_origin: Point::ORIGIN,
            animating_to: None,
            last_change: None,
        };
        map.pixel_origin = map.new_pixel_origin(center, zoom);
        map
    }

    pub fn with_zoom_range(mut self, min_zoom: f64, max_zoom: f64, zoom_snap: f64) -> Self {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self.zoom_snap = zoom_snap;
        self
    }

    pub fn set_size(&mut self, size: Point) {
        self.size = size;
    }

    pub fn last_change(&self) -> Option<ViewChangeKind> {
        self.last_change
    }
}

impl BaseMap for PlainMap {
    fn size(&self) -> Point {
        self.size
    }

    fn map_pane_pos(&self) -> Point {
        self.map_pane_pos
    }

    fn set_map_pane_pos(&mut self, pos: Point) {
        self.map_pane_pos = pos;
    }

    fn zoom(&self) -> f64 {
        self.zoom
    }

    fn center(&self) -> LatLng {
        self.center
    }

    fn pixel_origin(&self) -> Point {
        self.pixel_origin
    }

    fn min_zoom(&self) -> f64 {
        self.min_zoom
    }

    fn max_zoom(&self) -> f64 {
        self.max_zoom
    }

    fn zoom_snap(&self) -> f64 {
        self.zoom_snap
    }

    fn animating_zoom(&self) -> Option<f64> {
        self.animating_to
    }

    fn apply_view(&mut self, change: ViewChange) {
        self.last_change = Some(change.kind);
        match change.kind {
            ViewChangeKind::Animate => {
                self.animating_to = Some(change.zoom);
            }
            ViewChangeKind::Move | ViewChangeKind::Reset => {
                self.animating_to = None;
                self.center = change.center;
                self.zoom = change.zoom;
                self.pixel_origin = change.pixel_origin;
            }
        }
    }
}
