use foundation::time::Time;
use runtime::Throttle;

use super::Handler;
use crate::config::MapOptions;
use crate::host::BaseMap;
use crate::rotate::RotatableMap;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct WheelInput {
    pub delta_y: f64,
    pub shift_key: bool,
    pub time: Time,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WheelState {
    Idle,
    /// Shift is held; the wheel rotates instead of zooming.
    Rotating,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WheelOutcome {
    /// Not ours; default wheel handling (zoom, page scroll) proceeds.
    Ignored,
    Rotated,
    /// Consumed but held back by the throttle.
    Throttled,
}

impl WheelOutcome {
    pub fn prevents_default(self) -> bool {
        !matches!(self, WheelOutcome::Ignored)
    }
}

/// Shift + wheel rotates the map by a fixed step per event.
#[derive(Debug, Clone)]
pub struct ShiftKeyRotate {
    enabled: bool,
    state: WheelState,
    step_deg: f64,
    throttle: Throttle,
    queued_sign: f64,
}

impl ShiftKeyRotate {
    pub fn new(options: &MapOptions) -> Self {
        Self {
            enabled: options.shift_key_rotate,
            state: WheelState::Idle,
            step_deg: options.rotate_step_deg,
            throttle: Throttle::from_millis(options.wheel_rotate_throttle_ms),
            queued_sign: 0.0,
        }
    }

    pub fn state(&self) -> WheelState {
        self.state
    }

    pub fn on_wheel<H: BaseMap>(
        &mut self,
        map: &mut RotatableMap<H>,
        input: WheelInput,
    ) -> WheelOutcome {
        if !self.enabled {
            return WheelOutcome::Ignored;
        }
        if !input.shift_key {
            self.state = WheelState::Idle;
            map.restore_scroll_wheel_zoom();
            return WheelOutcome::Ignored;
        }

        self.state = WheelState::Rotating;
        map.set_scroll_wheel_zoom(false);
        let sign = wheel_sign(input.delta_y);
        if !self.throttle.call(input.time) {
            self.queued_sign = sign;
            return WheelOutcome::Throttled;
        }
        self.step(map, sign);
        WheelOutcome::Rotated
    }

    /// Runs the rotation step the throttle held back, once it is due.
    pub fn poll<H: BaseMap>(&mut self, map: &mut RotatableMap<H>, now: Time) -> bool {
        if !self.enabled || !self.throttle.poll(now) {
            return false;
        }
        let sign = std::mem::take(&mut self.queued_sign);
        self.step(map, sign);
        true
    }

    fn step<H: BaseMap>(&self, map: &mut RotatableMap<H>, sign: f64) {
        let bearing = map.bearing() + sign * self.step_deg;
        tracing::trace!(bearing_deg = bearing, "wheel rotate");
        map.set_bearing(bearing);
    }
}

impl Handler for ShiftKeyRotate {
    fn enabled(&self) -> bool {
        self.enabled
    }

    fn enable<H: BaseMap>(&mut self, _map: &mut RotatableMap<H>) {
        self.enabled = true;
    }

    fn disable<H: BaseMap>(&mut self, map: &mut RotatableMap<H>) {
        self.enabled = false;
        self.state = WheelState::Idle;
        self.throttle.reset();
        self.queued_sign = 0.0;
        map.restore_scroll_wheel_zoom();
    }
}

/// Sign of a wheel delta, with zero mapping to zero.
fn wheel_sign(delta: f64) -> f64 {
    if delta > 0.0 {
        1.0
    } else if delta < 0.0 {
        -1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::{ShiftKeyRotate, WheelInput, WheelOutcome, WheelState};
    use crate::config::MapOptions;
    use crate::handlers::Handler;
    use crate::host::PlainMap;
    use crate::rotate::RotatableMap;
    use foundation::math::{LatLng, Point};
    use foundation::time::Time;

    fn assert_close(a: f64, b: f64, eps: f64) {
        assert!((a - b).abs() <= eps, "expected {a} ~= {b} (eps={eps})");
    }

    fn map_with(options: MapOptions) -> RotatableMap<PlainMap> {
        let host = PlainMap::new(Point::new(400.0, 300.0), LatLng::default(), 3.0);
        RotatableMap::new(host, options).unwrap()
    }

    fn wheel(delta_y: f64, shift_key: bool, t: f64) -> WheelInput {
        WheelInput {
            delta_y,
            shift_key,
            time: Time(t),
        }
    }

    #[test]
    fn shift_wheel_rotates_by_step() {
        let options = MapOptions::rotatable();
        let mut map = map_with(options.clone());
        let mut handler = ShiftKeyRotate::new(&options);

        let outcome = handler.on_wheel(&mut map, wheel(1.0, true, 0.0));
        assert_eq!(outcome, WheelOutcome::Rotated);
        assert!(outcome.prevents_default());
        assert_close(map.bearing(), 5.0, 1e-9);
        assert!(!map.scroll_wheel_zoom_enabled());
        assert_eq!(handler.state(), WheelState::Rotating);

        handler.on_wheel(&mut map, wheel(-120.0, true, 1.0));
        handler.on_wheel(&mut map, wheel(-3.0, true, 2.0));
        assert_close(map.bearing(), -5.0, 1e-9);
    }

    #[test]
    fn zero_delta_keeps_bearing() {
        let options = MapOptions::rotatable();
        let mut map = map_with(options.clone());
        let mut handler = ShiftKeyRotate::new(&options);
        handler.on_wheel(&mut map, wheel(0.0, true, 0.0));
        assert_close(map.bearing(), 0.0, 1e-12);
    }

    #[test]
    fn plain_wheel_restores_scroll_zoom() {
        let options = MapOptions::rotatable();
        let mut map = map_with(options.clone());
        let mut handler = ShiftKeyRotate::new(&options);
        handler.on_wheel(&mut map, wheel(1.0, true, 0.0));
        assert!(!map.scroll_wheel_zoom_enabled());

        let outcome = handler.on_wheel(&mut map, wheel(1.0, false, 0.5));
        assert_eq!(outcome, WheelOutcome::Ignored);
        assert!(!outcome.prevents_default());
        assert!(map.scroll_wheel_zoom_enabled());
        assert_eq!(handler.state(), WheelState::Idle);
        assert_close(map.bearing(), 5.0, 1e-9);
    }

    #[test]
    fn custom_step() {
        let options = MapOptions {
            rotate_step_deg: 15.0,
            ..MapOptions::rotatable()
        };
        let mut map = map_with(options.clone());
        let mut handler = ShiftKeyRotate::new(&options);
        handler.on_wheel(&mut map, wheel(-1.0, true, 0.0));
        assert_close(map.bearing(), -15.0, 1e-9);
    }

    #[test]
    fn throttle_collapses_bursts_into_trailing_step() {
        let options = MapOptions {
            wheel_rotate_throttle_ms: 100.0,
            ..MapOptions::rotatable()
        };
        let mut map = map_with(options.clone());
        let mut handler = ShiftKeyRotate::new(&options);

        assert_eq!(
            handler.on_wheel(&mut map, wheel(1.0, true, 0.0)),
            WheelOutcome::Rotated
        );
        let held = handler.on_wheel(&mut map, wheel(1.0, true, 0.01));
        assert_eq!(held, WheelOutcome::Throttled);
        assert!(held.prevents_default());
        handler.on_wheel(&mut map, wheel(1.0, true, 0.02));
        assert_close(map.bearing(), 5.0, 1e-9);

        assert!(!handler.poll(&mut map, Time(0.05)));
        assert!(handler.poll(&mut map, Time(0.1)));
        assert_close(map.bearing(), 10.0, 1e-9);
        assert!(!handler.poll(&mut map, Time(0.3)));
    }

    #[test]
    fn disabled_handler_ignores_wheel() {
        let options = MapOptions::rotatable();
        let mut map = map_with(options.clone());
        let mut handler = ShiftKeyRotate::new(&options);
        handler.on_wheel(&mut map, wheel(1.0, true, 0.0));

        handler.disable(&mut map);
        assert!(!handler.enabled());
        assert!(map.scroll_wheel_zoom_enabled());
        assert_eq!(
            handler.on_wheel(&mut map, wheel(1.0, true, 1.0)),
            WheelOutcome::Ignored
        );
        assert_close(map.bearing(), 5.0, 1e-9);

        handler.enable(&mut map);
        handler.on_wheel(&mut map, wheel(1.0, true, 2.0));
        assert_close(map.bearing(), 10.0, 1e-9);
    }

    #[test]
    fn no_rotation_without_rotatable_map() {
        let options = MapOptions::default();
        let mut map = map_with(options.clone());
        let mut handler = ShiftKeyRotate::new(&options);
        handler.on_wheel(&mut map, wheel(1.0, true, 0.0));
        assert_eq!(map.bearing(), 0.0);
    }
}
