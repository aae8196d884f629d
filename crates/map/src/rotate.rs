//! Bearing-aware map state.
//!
//! World panes sit under a rotate pane whose position `R` is kept already
//! rotated about the viewport-center pivot. For map pane position `M` and
//! bearing `θ`:
//!
//! ```text
//! layer     = (container - M).rotate_about(-θ, R) - R
//! container = M + R + layer.rotate(θ)
//! ```

use foundation::math::{Bearing, LatLng, Point};
use layers::{MapView, PaneName, PaneTree};
use runtime::{Event, EventBus, Frame, FrameScheduler, MapEvent};

use crate::config::{ConfigError, MapOptions};
use crate::host::{BaseMap, ViewChange, ViewChangeKind};

/// Latest pinch sample, applied on the next animation frame.
#[derive(Debug, Clone, PartialEq)]
pub struct PinchFrame {
    pub bearing_deg: Option<f64>,
    pub view: Option<(LatLng, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FrameTask {
    Pinch(PinchFrame),
}

pub struct RotatableMap<H> {
    host: H,
    options: MapOptions,
    bearing: Bearing,
    pivot: Point,
    rotate_pane_pos: Point,
    panes: PaneTree,
    events: EventBus,
    frames: FrameScheduler<FrameTask>,
    frame: Frame,
    scroll_wheel_zoom: bool,
    zoom_anim: Option<(LatLng, f64)>,
}

impl<H: BaseMap> RotatableMap<H> {
    pub fn new(host: H, options: MapOptions) -> Result<Self, ConfigError> {
        options.validate()?;
        let panes = PaneTree::new(options.rotate, options.marker_zoom_animation);
        let mut map = Self {
            host,
            bearing: Bearing::NORTH_UP,
            pivot: Point::ORIGIN,
            rotate_pane_pos: Point::ORIGIN,
            panes,
            events: EventBus::new(),
            frames: FrameScheduler::new(),
            frame: Frame::new(0, 0.0),
            scroll_wheel_zoom: options.scroll_wheel_zoom,
            zoom_anim: None,
            options,
        };
        map.sync_map_pane();
        if map.options.rotate {
            map.set_bearing(map.options.bearing);
        }
        Ok(map)
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn options(&self) -> &MapOptions {
        &self.options
    }

    pub fn panes(&self) -> &PaneTree {
        &self.panes
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain()
    }

    pub fn frame(&self) -> Frame {
        self.frame
    }

    pub(crate) fn frames_mut(&mut self) -> &mut FrameScheduler<FrameTask> {
        &mut self.frames
    }

    pub fn pending_frame_tasks(&self) -> usize {
        self.frames.pending_count()
    }

    /// True when the map was built rotatable and the backend can transform.
    pub fn rotation_enabled(&self) -> bool {
        self.options.rotate && self.options.transforms_supported
    }

    /// Sets the bearing in degrees. No-op when rotation is disabled.
    pub fn set_bearing(&mut self, theta_deg: f64) {
        debug_assert!(theta_deg.is_finite(), "bearing must be finite");
        if !self.rotation_enabled() {
            return;
        }
        self.pivot = -self.host.map_pane_pos() + self.host.size() / 2.0;
        let unrotated = self
            .rotate_pane_pos
            .rotate_about(-self.bearing.radians(), self.pivot);

        self.bearing = Bearing::from_degrees(theta_deg);
        self.rotate_pane_pos = unrotated.rotate_about(self.bearing.radians(), self.pivot);
        self.panes
            .set_position(PaneName::Rotate, unrotated, self.bearing, self.pivot);

        tracing::debug!(bearing_deg = theta_deg, "set bearing");
        self.events.emit(
            self.frame,
            MapEvent::Rotate {
                bearing_deg: theta_deg,
            },
        );
    }

    /// Current bearing in degrees.
    pub fn bearing(&self) -> f64 {
        self.bearing.degrees()
    }

    pub fn bearing_rad(&self) -> f64 {
        self.bearing.radians()
    }

    pub fn pivot(&self) -> Point {
        self.pivot
    }

    pub fn rotate_pane_pos(&self) -> Point {
        self.rotate_pane_pos
    }

    pub fn size(&self) -> Point {
        self.host.size()
    }

    pub fn zoom(&self) -> f64 {
        self.host.zoom()
    }

    pub fn is_animating_zoom(&self) -> bool {
        self.host.animating_zoom().is_some()
    }

    pub fn container_point_to_layer_point(&self, p: Point) -> Point {
        if !self.options.rotate {
            return self.host.container_point_to_layer_point(p);
        }
        (p - self.host.map_pane_pos()).rotate_about(-self.bearing.radians(), self.rotate_pane_pos)
            - self.rotate_pane_pos
    }

    pub fn layer_point_to_container_point(&self, p: Point) -> Point {
        if !self.options.rotate {
            return self.host.layer_point_to_container_point(p);
        }
        self.host.map_pane_pos() + self.rotate_pane_pos + p.rotate(self.bearing.radians())
    }

    pub fn layer_point_to_lat_lng(&self, p: Point) -> LatLng {
        self.host
            .unproject(p + self.host.pixel_origin(), self.host.zoom())
    }

    pub fn lat_lng_to_layer_point(&self, ll: LatLng) -> Point {
        self.host.project(ll, self.host.zoom()) - self.host.pixel_origin()
    }

    pub fn container_point_to_lat_lng(&self, p: Point) -> LatLng {
        self.layer_point_to_lat_lng(self.container_point_to_layer_point(p))
    }

    pub fn lat_lng_to_container_point(&self, ll: LatLng) -> Point {
        self.layer_point_to_container_point(self.lat_lng_to_layer_point(ll))
    }

    /// Geographic position under the viewport center.
    pub fn center(&self) -> LatLng {
        self.container_point_to_lat_lng(self.host.size() / 2.0)
    }

    /// Pixel origin that keeps `center` under the viewport center at `zoom`.
    pub fn new_pixel_origin(&self, center: LatLng, zoom: f64) -> Point {
        if !self.options.rotate {
            return self.host.new_pixel_origin(center, zoom);
        }
        let theta = self.bearing.radians();
        (self.host.project(center, zoom).rotate(theta) - self.host.size() / 2.0
            + self.host.map_pane_pos()
            + self.rotate_pane_pos)
            .rotate(-theta)
            .round()
    }

    pub fn scroll_wheel_zoom_enabled(&self) -> bool {
        self.scroll_wheel_zoom
    }

    pub fn set_scroll_wheel_zoom(&mut self, enabled: bool) {
        if self.scroll_wheel_zoom != enabled {
            tracing::trace!(enabled, "scroll wheel zoom toggled");
        }
        self.scroll_wheel_zoom = enabled;
    }

    /// Back to whatever the map was configured with.
    pub fn restore_scroll_wheel_zoom(&mut self) {
        self.set_scroll_wheel_zoom(self.options.scroll_wheel_zoom);
    }

    /// Drags the map pane by `offset` container pixels.
    pub fn pan_by(&mut self, offset: Point) {
        let pos = self.host.map_pane_pos() - offset;
        self.host.set_map_pane_pos(pos);
        self.sync_map_pane();
        self.events.emit(self.frame, MapEvent::Move);
    }

    pub fn move_start(&mut self, zoom_changed: bool) {
        if zoom_changed {
            self.events.emit(self.frame, MapEvent::ZoomStart);
        }
        self.events.emit(self.frame, MapEvent::MoveStart);
    }

    pub fn move_end(&mut self) {
        self.events.emit(self.frame, MapEvent::MoveEnd);
    }

    /// Moves the view without animation, recomputing the pixel origin.
    pub fn move_to(&mut self, center: LatLng, zoom: f64) {
        let pixel_origin = self.new_pixel_origin(center, zoom);
        self.host.apply_view(ViewChange {
            center,
            zoom,
            pixel_origin,
            kind: ViewChangeKind::Move,
        });
        self.events.emit(self.frame, MapEvent::Move);
    }

    /// Starts an animated zoom; [`finish_zoom_animation`](Self::finish_zoom_animation)
    /// lands it.
    pub fn animate_zoom(&mut self, center: LatLng, zoom: f64) {
        let pixel_origin = self.new_pixel_origin(center, zoom);
        self.zoom_anim = Some((center, zoom));
        self.host.apply_view(ViewChange {
            center,
            zoom,
            pixel_origin,
            kind: ViewChangeKind::Animate,
        });
        tracing::debug!(zoom, "zoom animation started");
        self.events.emit(self.frame, MapEvent::ZoomAnim { zoom });
    }

    /// Completes a running zoom animation. Returns `false` if none was running.
    pub fn finish_zoom_animation(&mut self) -> bool {
        let Some((center, zoom)) = self.zoom_anim.take() else {
            return false;
        };
        self.move_to(center, zoom);
        self.events.emit(self.frame, MapEvent::ZoomEnd);
        self.events.emit(self.frame, MapEvent::MoveEnd);
        true
    }

    /// Zooms about the current center. Ignored while a zoom animation runs.
    pub fn set_zoom(&mut self, zoom: f64) {
        let zoom = self.host.limit_zoom(zoom);
        if zoom == self.host.zoom() || self.is_animating_zoom() {
            return;
        }
        let center = self.center();
        if self.options.zoom_animation {
            self.move_start(true);
            self.animate_zoom(center, zoom);
        } else {
            self.reset_view(center, zoom);
        }
    }

    /// Jumps to a view, putting the map pane back at the origin.
    pub fn reset_view(&mut self, center: LatLng, zoom: f64) {
        self.zoom_anim = None;
        self.host.set_map_pane_pos(Point::ORIGIN);
        self.sync_map_pane();

        let zoom_changed = self.host.zoom() != zoom;
        self.move_start(zoom_changed);
        let pixel_origin = self.new_pixel_origin(center, zoom);
        self.host.apply_view(ViewChange {
            center,
            zoom,
            pixel_origin,
            kind: ViewChangeKind::Reset,
        });
        self.events.emit(self.frame, MapEvent::Move);
        if zoom_changed {
            self.events.emit(self.frame, MapEvent::ZoomEnd);
        }
        self.move_end();
        self.events.emit(self.frame, MapEvent::ViewReset);
    }

    /// Cancels any running pan animation on the host.
    pub fn stop(&mut self) {
        self.host.stop();
    }

    /// Advances one animation frame and runs the work scheduled for it.
    pub fn run_animation_frame(&mut self, dt_s: f64) -> Frame {
        self.frame = self.frame.advance(dt_s);
        for task in self.frames.run_frame() {
            match task {
                FrameTask::Pinch(pinch) => {
                    if let Some(bearing) = pinch.bearing_deg {
                        self.set_bearing(bearing);
                    }
                    if let Some((center, zoom)) = pinch.view {
                        self.move_to(center, zoom);
                    }
                }
            }
        }
        self.frame
    }

    fn sync_map_pane(&mut self) {
        let pos = self.host.map_pane_pos();
        self.panes
            .set_position(PaneName::Map, pos, Bearing::NORTH_UP, Point::ORIGIN);
    }
}

impl<H: BaseMap> MapView for RotatableMap<H> {
    fn size(&self) -> Point {
        RotatableMap::size(self)
    }

    fn zoom(&self) -> f64 {
        RotatableMap::zoom(self)
    }

    fn center(&self) -> LatLng {
        RotatableMap::center(self)
    }

    fn animating_zoom(&self) -> Option<f64> {
        self.host.animating_zoom()
    }

    fn project(&self, ll: LatLng, zoom: f64) -> Point {
        self.host.project(ll, zoom)
    }

    fn zoom_scale(&self, to_zoom: f64, from_zoom: f64) -> f64 {
        self.host.zoom_scale(to_zoom, from_zoom)
    }

    fn container_point_to_layer_point(&self, p: Point) -> Point {
        RotatableMap::container_point_to_layer_point(self, p)
    }

    fn rotation_enabled(&self) -> bool {
        RotatableMap::rotation_enabled(self)
    }
}
