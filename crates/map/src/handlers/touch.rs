//! Two-finger rotate and pinch-zoom.
//!
//! Touch moves only record the latest gesture sample; the map applies it on
//! the next animation frame, so a burst of moves between two frames costs a
//! single bearing change and a single view move.

use foundation::math::{LatLng, Point};
use runtime::LatestTask;

use super::Handler;
use crate::config::{MapOptions, TouchZoom};
use crate::host::BaseMap;
use crate::rotate::{FrameTask, PinchFrame, RotatableMap};

/// Finger-pair angle in radians, `atan(x / y)` of the vector between them.
///
/// Only defined modulo 180°: callers add 180° when `v.y < 0` to pick the
/// half-turn. Across `v.y == 0` the angle jumps by 180° and the correction
/// flips, so the two cancel except at exactly `-0.0`.
pub fn finger_angle(v: Point) -> f64 {
    (v.x / v.y).atan()
}

#[derive(Debug)]
pub struct GestureSession {
    center_point: Point,
    start_center: LatLng,
    pinch_anchor: Option<LatLng>,
    start_dist: f64,
    start_zoom: f64,
    start_angle: f64,
    start_bearing: f64,
    zooming: bool,
    rotating: bool,
    moved: bool,
    bearing: Option<f64>,
    view: Option<(LatLng, f64)>,
    pending: LatestTask,
}

impl GestureSession {
    pub fn is_zooming(&self) -> bool {
        self.zooming
    }

    pub fn is_rotating(&self) -> bool {
        self.rotating
    }

    pub fn has_moved(&self) -> bool {
        self.moved
    }

    /// Latest bearing target in degrees.
    pub fn target_bearing(&self) -> Option<f64> {
        self.bearing
    }

    /// Latest center and zoom target.
    pub fn target_view(&self) -> Option<(LatLng, f64)> {
        self.view
    }
}

#[derive(Debug, Default)]
pub enum GestureState {
    #[default]
    Idle,
    Active(GestureSession),
}

#[derive(Debug)]
pub struct TouchGestures {
    enabled: bool,
    rotate: bool,
    zoom: bool,
    state: GestureState,
}

impl TouchGestures {
    pub fn new(options: &MapOptions) -> Self {
        let rotate = options.touch_rotate;
        let zoom = options.touch_zoom != TouchZoom::Disabled;
        Self {
            enabled: rotate || zoom,
            rotate,
            zoom,
            state: GestureState::Idle,
        }
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, GestureState::Active(_))
    }

    pub fn rotate(&self) -> bool {
        self.rotate
    }

    /// Takes effect from the next gesture.
    pub fn set_rotate(&mut self, rotate: bool) {
        self.rotate = rotate;
    }

    pub fn zoom(&self) -> bool {
        self.zoom
    }

    /// Takes effect from the next gesture.
    pub fn set_zoom(&mut self, zoom: bool) {
        self.zoom = zoom;
    }

    /// Returns `true` when the gesture was claimed and default handling
    /// should be suppressed.
    pub fn on_touch_start<H: BaseMap>(
        &mut self,
        map: &mut RotatableMap<H>,
        touches: &[Point],
    ) -> bool {
        if !self.enabled || !(self.rotate || self.zoom) || self.is_active() {
            return false;
        }
        let &[p1, p2] = touches else {
            return false;
        };
        if map.is_animating_zoom() {
            return false;
        }

        let vector = p1 - p2;
        let center_point = map.size() / 2.0;
        let start_dist = p1.distance_to(p2);
        let zooming = self.zoom && start_dist > 0.0;

        let pinch_anchor = if zooming && map.options().touch_zoom != TouchZoom::Center {
            Some(map.container_point_to_lat_lng(p1.midpoint(p2)))
        } else {
            None
        };

        let mut start_bearing = map.bearing();
        if vector.y < 0.0 {
            start_bearing += 180.0;
        }

        let session = GestureSession {
            center_point,
            start_center: map.container_point_to_lat_lng(center_point),
            pinch_anchor,
            start_dist,
            start_zoom: map.zoom(),
            start_angle: finger_angle(vector),
            start_bearing,
            zooming,
            rotating: self.rotate,
            moved: false,
            bearing: None,
            view: None,
            pending: LatestTask::new(),
        };

        map.stop();
        tracing::debug!(
            zooming = session.zooming,
            rotating = session.rotating,
            "touch gesture started"
        );
        self.state = GestureState::Active(session);
        true
    }

    /// Records a move sample. Leaving the two-finger state ends the gesture.
    pub fn on_touch_move<H: BaseMap>(
        &mut self,
        map: &mut RotatableMap<H>,
        touches: &[Point],
    ) -> bool {
        if !self.is_active() {
            return false;
        }
        let &[p1, p2] = touches else {
            self.on_touch_end(map);
            return false;
        };
        let GestureState::Active(session) = &mut self.state else {
            return false;
        };

        let vector = p1 - p2;
        let mut changed = false;

        if session.rotating {
            let mut delta = (finger_angle(vector) - session.start_angle).to_degrees();
            if vector.y < 0.0 {
                delta += 180.0;
            }
            if delta.is_finite() && delta != 0.0 {
                session.bearing = Some(session.start_bearing - delta);
                changed = true;
            }
        }

        let scale = p1.distance_to(p2) / session.start_dist;
        // Fingers that meet have no zoom; the last view target stands.
        if session.zooming && scale.is_finite() && scale > 0.0 {
            let host = map.host();
            let mut zoom = host.scale_zoom(scale, session.start_zoom);
            let options = map.options();
            if !options.bounce_at_zoom_limits
                && ((zoom < host.min_zoom() && scale < 1.0)
                    || (zoom > host.max_zoom() && scale > 1.0))
            {
                zoom = host.limit_zoom(zoom);
            }

            let center = match session.pinch_anchor {
                Some(anchor) if options.touch_zoom != TouchZoom::Center => {
                    let offset = p1.midpoint(p2) - session.center_point;
                    if scale == 1.0 && offset == Point::ORIGIN {
                        None
                    } else {
                        // The target bearing, so the offset lines up with the
                        // frame this sample is applied in.
                        let bearing = session.bearing.unwrap_or_else(|| map.bearing());
                        let world =
                            host.project(anchor, zoom) - offset.rotate(-bearing.to_radians());
                        Some(host.unproject(world, zoom))
                    }
                }
                _ if scale == 1.0 => None,
                _ => Some(session.start_center),
            };
            if let Some(center) = center.filter(|c| c.lat.is_finite() && c.lng.is_finite()) {
                session.view = Some((center, zoom));
                changed = true;
            }
        }

        if !changed {
            return false;
        }

        if !session.moved {
            map.move_start(true);
            session.moved = true;
        }

        tracing::trace!(
            bearing_deg = ?session.bearing,
            zoom = ?session.view.map(|(_, z)| z),
            "touch gesture sample"
        );
        let task = FrameTask::Pinch(PinchFrame {
            bearing_deg: session.bearing,
            view: session.view,
        });
        session.pending.schedule(map.frames_mut(), task);
        true
    }

    /// Ends the gesture: lands the last sample and settles the zoom.
    pub fn on_touch_end<H: BaseMap>(&mut self, map: &mut RotatableMap<H>) {
        let GestureState::Active(mut session) = std::mem::take(&mut self.state) else {
            return;
        };
        let pending = session.pending.cancel(map.frames_mut());
        if !session.moved {
            tracing::debug!("touch gesture ended without moving");
            return;
        }

        if let Some(FrameTask::Pinch(PinchFrame {
            bearing_deg: Some(bearing),
            ..
        })) = pending
        {
            map.set_bearing(bearing);
        }

        match session.view {
            Some((center, zoom)) if session.zooming => {
                let zoom = map.host().limit_zoom(zoom);
                tracing::debug!(zoom, "touch gesture ended");
                if map.options().zoom_animation {
                    map.animate_zoom(center, zoom);
                } else {
                    map.reset_view(center, zoom);
                }
            }
            _ => {
                tracing::debug!(bearing_deg = map.bearing(), "touch gesture ended");
                map.move_end();
            }
        }
    }
}

impl Handler for TouchGestures {
    fn enabled(&self) -> bool {
        self.enabled
    }

    fn enable<H: BaseMap>(&mut self, _map: &mut RotatableMap<H>) {
        self.enabled = true;
    }

    fn disable<H: BaseMap>(&mut self, map: &mut RotatableMap<H>) {
        self.enabled = false;
        if let GestureState::Active(mut session) = std::mem::take(&mut self.state) {
            session.pending.cancel(map.frames_mut());
            tracing::debug!("touch gesture cancelled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{GestureState, TouchGestures, finger_angle};
    use crate::config::{MapOptions, TouchZoom};
    use crate::handlers::Handler;
    use crate::host::{BaseMap, PlainMap, ViewChangeKind};
    use crate::rotate::RotatableMap;
    use foundation::math::{LatLng, Point};
    use pretty_assertions::assert_eq;

    fn assert_close(a: f64, b: f64, eps: f64) {
        assert!((a - b).abs() <= eps, "expected {a} ~= {b} (eps={eps})");
    }

    fn setup(options: MapOptions) -> (RotatableMap<PlainMap>, TouchGestures) {
        let host = PlainMap::new(Point::new(400.0, 300.0), LatLng::new(20.0, 30.0), 10.0);
        let gestures = TouchGestures::new(&options);
        let mut map = RotatableMap::new(host, options).unwrap();
        map.drain_events();
        (map, gestures)
    }

    fn rotate_only() -> MapOptions {
        MapOptions {
            touch_rotate: true,
            touch_zoom: TouchZoom::Disabled,
            ..MapOptions::rotatable()
        }
    }

    fn rotate_and_pinch() -> MapOptions {
        MapOptions {
            touch_rotate: true,
            ..MapOptions::rotatable()
        }
    }

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn twist_and_spread_scenario() {
        let (mut map, mut gestures) = setup(rotate_and_pinch());
        map.set_bearing(10.0);
        map.drain_events();

        assert!(gestures.on_touch_start(&mut map, &[p(100.0, 200.0), p(140.0, 160.0)]));
        assert!(gestures.on_touch_move(&mut map, &[p(100.0, 160.0), p(180.0, 200.0)]));

        let GestureState::Active(session) = gestures.state() else {
            panic!("gesture should be active");
        };
        // vector (-80, -40): atan(2) - (-45°) + 180° below the axis.
        let delta = 2f64.atan().to_degrees() + 45.0 + 180.0;
        assert_close(session.target_bearing().unwrap(), 10.0 - delta, 1e-9);
        let scale = (80f64.hypot(40.0)) / (40f64.hypot(40.0));
        let (_, zoom) = session.target_view().unwrap();
        assert_close(zoom, 10.0 + scale.log2(), 1e-9);

        // Nothing is applied before the frame runs.
        assert_close(map.bearing(), 10.0, 1e-9);
        assert_eq!(map.events().count("rotate"), 0);
        assert_eq!(map.events().count("movestart"), 1);

        map.run_animation_frame(1.0 / 60.0);
        assert_close(map.bearing(), 10.0 - delta, 1e-9);
        assert_close(map.zoom(), 10.0 + scale.log2(), 1e-9);
        assert_close((map.bearing() - 10.0).rem_euclid(360.0), 71.565_051_177, 1e-6);
    }

    #[test]
    fn bearing_applies_once_per_frame() {
        let (mut map, mut gestures) = setup(rotate_only());
        gestures.on_touch_start(&mut map, &[p(100.0, 100.0), p(100.0, 200.0)]);
        for i in 1..=5 {
            let dx = i as f64 * 10.0;
            assert!(gestures.on_touch_move(&mut map, &[p(100.0 + dx, 100.0), p(100.0, 200.0)]));
        }
        assert_eq!(map.events().count("rotate"), 0);
        assert_eq!(map.pending_frame_tasks(), 1);

        map.run_animation_frame(1.0 / 60.0);
        assert_eq!(map.events().count("rotate"), 1);
        // vector (50, -100) against (0, -100): a clockwise twist.
        assert_close(map.bearing(), 0.5f64.atan().to_degrees(), 1e-9);

        map.run_animation_frame(1.0 / 60.0);
        assert_eq!(map.events().count("rotate"), 1);
    }

    #[test]
    fn zero_movement_end_changes_nothing() {
        let (mut map, mut gestures) = setup(rotate_and_pinch());
        let touches = [p(260.0, 190.0), p(120.0, 80.0)];
        assert!(gestures.on_touch_start(&mut map, &touches));
        assert!(!gestures.on_touch_move(&mut map, &touches));
        gestures.on_touch_end(&mut map);

        assert!(!gestures.is_active());
        assert_eq!(map.bearing(), 0.0);
        assert_eq!(map.zoom(), 10.0);
        assert_eq!(map.pending_frame_tasks(), 0);
        assert!(map.events().events().is_empty());

        // Below the axis the half-turn corrections cancel to the same bearing.
        let flipped = [p(120.0, 80.0), p(260.0, 190.0)];
        gestures.on_touch_start(&mut map, &flipped);
        gestures.on_touch_move(&mut map, &flipped);
        gestures.on_touch_end(&mut map);
        assert_close(map.bearing(), 0.0, 1e-9);
        assert_eq!(map.zoom(), 10.0);
        assert_eq!(map.pending_frame_tasks(), 0);
    }

    #[test]
    fn end_lands_pending_bearing_and_animates_zoom() {
        let (mut map, mut gestures) = setup(rotate_and_pinch());
        gestures.on_touch_start(&mut map, &[p(150.0, 150.0), p(250.0, 150.0)]);
        gestures.on_touch_move(&mut map, &[p(120.0, 120.0), p(280.0, 180.0)]);
        let target = match gestures.state() {
            GestureState::Active(s) => s.target_bearing().unwrap(),
            GestureState::Idle => panic!("gesture should be active"),
        };

        gestures.on_touch_end(&mut map);
        assert_eq!(map.pending_frame_tasks(), 0);
        assert_close(map.bearing(), target, 1e-9);
        assert!(map.is_animating_zoom());
        assert_eq!(map.host().animating_zoom(), Some(11.0));
        assert_eq!(map.events().count("zoomanim"), 1);

        map.finish_zoom_animation();
        assert_eq!(map.zoom(), 11.0);
    }

    #[test]
    fn end_without_zoom_animation_resets_view() {
        let options = MapOptions {
            zoom_animation: false,
            ..rotate_and_pinch()
        };
        let (mut map, mut gestures) = setup(options);
        gestures.on_touch_start(&mut map, &[p(150.0, 150.0), p(250.0, 150.0)]);
        gestures.on_touch_move(&mut map, &[p(100.0, 150.0), p(300.0, 150.0)]);
        map.run_animation_frame(1.0 / 60.0);
        assert_close(map.zoom(), 11.0, 1e-9);

        gestures.on_touch_end(&mut map);
        assert_eq!(map.host().last_change(), Some(ViewChangeKind::Reset));
        assert_eq!(map.zoom(), 11.0);
        assert_eq!(map.events().count("viewreset"), 1);
    }

    #[test]
    fn rotate_only_gesture_ends_with_moveend() {
        let (mut map, mut gestures) = setup(rotate_only());
        gestures.on_touch_start(&mut map, &[p(100.0, 100.0), p(100.0, 200.0)]);
        gestures.on_touch_move(&mut map, &[p(150.0, 100.0), p(100.0, 200.0)]);
        gestures.on_touch_end(&mut map);

        assert!(map.bearing() != 0.0);
        assert_eq!(map.zoom(), 10.0);
        assert_eq!(map.events().count("movestart"), 1);
        assert_eq!(map.events().count("moveend"), 1);
    }

    #[test]
    fn pinch_keeps_anchor_under_fingers() {
        let options = MapOptions {
            touch_zoom: TouchZoom::Pinch,
            ..MapOptions::rotatable()
        };
        let (mut map, mut gestures) = setup(options);
        map.set_bearing(30.0);
        let start = [p(100.0, 100.0), p(200.0, 100.0)];
        gestures.on_touch_start(&mut map, &start);
        let anchor = map.container_point_to_lat_lng(p(150.0, 100.0));

        let moved = [p(60.0, 140.0), p(260.0, 140.0)];
        gestures.on_touch_move(&mut map, &moved);
        map.run_animation_frame(1.0 / 60.0);

        assert_close(map.zoom(), 11.0, 1e-9);
        let under_fingers = map.lat_lng_to_container_point(anchor);
        assert!(under_fingers.distance_to(p(160.0, 140.0)) < 1.5);
    }

    #[test]
    fn center_mode_holds_center() {
        let options = MapOptions {
            touch_zoom: TouchZoom::Center,
            ..MapOptions::rotatable()
        };
        let (mut map, mut gestures) = setup(options);
        let before = map.center();
        gestures.on_touch_start(&mut map, &[p(100.0, 100.0), p(200.0, 100.0)]);
        gestures.on_touch_move(&mut map, &[p(0.0, 220.0), p(200.0, 220.0)]);
        map.run_animation_frame(1.0 / 60.0);

        assert_close(map.zoom(), 11.0, 1e-9);
        let after = map.center();
        assert_close(after.lat, before.lat, 1e-3);
        assert_close(after.lng, before.lng, 1e-3);
    }

    #[test]
    fn zoom_limits_without_bounce() {
        let options = MapOptions {
            bounce_at_zoom_limits: false,
            touch_zoom: TouchZoom::Center,
            ..MapOptions::rotatable()
        };
        let host = PlainMap::new(Point::new(400.0, 300.0), LatLng::default(), 17.5)
            .with_zoom_range(0.0, 18.0, 1.0);
        let mut map = RotatableMap::new(host, options.clone()).unwrap();
        let mut gestures = TouchGestures::new(&options);

        gestures.on_touch_start(&mut map, &[p(100.0, 100.0), p(200.0, 100.0)]);
        gestures.on_touch_move(&mut map, &[p(0.0, 100.0), p(400.0, 100.0)]);
        map.run_animation_frame(1.0 / 60.0);
        assert_eq!(map.zoom(), 18.0);
    }

    #[test]
    fn lifting_a_finger_ends_the_gesture() {
        let (mut map, mut gestures) = setup(rotate_only());
        gestures.on_touch_start(&mut map, &[p(100.0, 100.0), p(100.0, 200.0)]);
        gestures.on_touch_move(&mut map, &[p(130.0, 100.0), p(100.0, 200.0)]);
        assert!(!gestures.on_touch_move(&mut map, &[p(130.0, 100.0)]));

        assert!(!gestures.is_active());
        assert_eq!(map.pending_frame_tasks(), 0);
        assert!(map.bearing() != 0.0);
    }

    #[test]
    fn start_requires_exactly_two_idle_fingers() {
        let (mut map, mut gestures) = setup(rotate_and_pinch());
        assert!(!gestures.on_touch_start(&mut map, &[p(1.0, 1.0)]));
        assert!(!gestures.on_touch_start(&mut map, &[p(1.0, 1.0), p(2.0, 2.0), p(3.0, 3.0)]));
        assert!(gestures.on_touch_start(&mut map, &[p(1.0, 1.0), p(50.0, 2.0)]));
        assert!(!gestures.on_touch_start(&mut map, &[p(1.0, 1.0), p(50.0, 2.0)]));

        gestures.on_touch_end(&mut map);
        map.animate_zoom(LatLng::default(), 12.0);
        assert!(!gestures.on_touch_start(&mut map, &[p(1.0, 1.0), p(50.0, 2.0)]));
    }

    #[test]
    fn disable_cancels_pending_sample() {
        let (mut map, mut gestures) = setup(rotate_only());
        gestures.on_touch_start(&mut map, &[p(100.0, 100.0), p(100.0, 200.0)]);
        gestures.on_touch_move(&mut map, &[p(140.0, 100.0), p(100.0, 200.0)]);
        assert_eq!(map.pending_frame_tasks(), 1);

        gestures.disable(&mut map);
        assert!(!gestures.enabled());
        assert!(!gestures.is_active());
        assert_eq!(map.pending_frame_tasks(), 0);
        map.run_animation_frame(1.0 / 60.0);
        assert_eq!(map.bearing(), 0.0);
        assert!(!gestures.on_touch_start(&mut map, &[p(100.0, 100.0), p(100.0, 200.0)]));
    }

    #[test]
    fn twist_across_horizontal_axis_keeps_bearing() {
        let (mut map, mut gestures) = setup(rotate_only());
        map.set_bearing(25.0);

        // Finger vector (100, 1e-9) tipping over to (100, -1e-9).
        assert!(gestures.on_touch_start(&mut map, &[p(150.0, 1e-9), p(50.0, 0.0)]));
        assert!(gestures.on_touch_move(&mut map, &[p(150.0, -1e-9), p(50.0, 0.0)]));
        let GestureState::Active(session) = gestures.state() else {
            panic!("gesture should be active");
        };
        assert_close(session.target_bearing().unwrap(), 25.0, 1e-6);

        map.run_animation_frame(1.0 / 60.0);
        assert_close(map.bearing(), 25.0, 1e-6);
    }

    #[test]
    fn finger_angle_at_negative_zero() {
        // -0.0 is not below the axis but divides to -inf.
        assert_close(finger_angle(Point::new(100.0, -0.0)).to_degrees(), -90.0, 1e-9);
        assert_close(finger_angle(Point::new(100.0, 0.0)).to_degrees(), 90.0, 1e-9);
    }

    #[test]
    fn zoom_limits_follow_host_range() {
        let options = MapOptions {
            bounce_at_zoom_limits: false,
            touch_zoom: TouchZoom::Center,
            ..MapOptions::rotatable()
        };
        let host = PlainMap::new(Point::new(400.0, 300.0), LatLng::default(), 9.5)
            .with_zoom_range(0.0, 10.0, 1.0);
        let mut map = RotatableMap::new(host, options.clone()).unwrap();
        let mut gestures = TouchGestures::new(&options);

        gestures.on_touch_start(&mut map, &[p(150.0, 100.0), p(250.0, 100.0)]);
        gestures.on_touch_move(&mut map, &[p(0.0, 100.0), p(400.0, 100.0)]);
        map.run_animation_frame(1.0 / 60.0);
        assert_eq!(map.zoom(), 10.0);
        assert!(map.zoom() <= map.host().max_zoom());
    }

    #[test]
    fn fingers_meeting_keep_last_view() {
        let (mut map, mut gestures) = setup(rotate_and_pinch());
        gestures.on_touch_start(&mut map, &[p(100.0, 100.0), p(200.0, 100.0)]);
        assert!(gestures.on_touch_move(&mut map, &[p(130.0, 100.0), p(170.0, 100.0)]));
        assert!(!gestures.on_touch_move(&mut map, &[p(150.0, 100.0), p(150.0, 100.0)]));
        assert_eq!(map.pending_frame_tasks(), 1);

        map.run_animation_frame(1.0 / 60.0);
        assert_close(map.zoom(), 10.0 + 0.4f64.log2(), 1e-9);
        assert!(map.host().pixel_origin().x.is_finite());
        assert!(map.host().pixel_origin().y.is_finite());

        gestures.on_touch_end(&mut map);
        map.finish_zoom_animation();
        let center = map.host().center();
        assert!(center.lat.is_finite() && center.lng.is_finite());
        assert_eq!(map.zoom(), 9.0);
        assert_eq!(map.bearing(), 0.0);
    }

    #[test]
    fn disabled_modes_do_not_claim_touches() {
        let options = MapOptions {
            touch_rotate: false,
            touch_zoom: TouchZoom::Disabled,
            ..MapOptions::rotatable()
        };
        let (mut map, mut gestures) = setup(options);
        assert!(!gestures.enabled());
        assert!(!gestures.on_touch_start(&mut map, &[p(1.0, 1.0), p(50.0, 2.0)]));

        gestures.enable(&mut map);
        assert!(!gestures.on_touch_start(&mut map, &[p(1.0, 1.0), p(50.0, 2.0)]));
        gestures.set_rotate(true);
        assert!(gestures.rotate());
        assert!(gestures.on_touch_start(&mut map, &[p(1.0, 1.0), p(50.0, 2.0)]));
    }
}
