use console_error_panic_hook::set_once;
use std::cell::RefCell;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Layer};
use tracing_web::MakeWebConsoleWriter;
use wasm_bindgen::prelude::*;
use web_sys::{AddEventListenerOptions, Document, HtmlElement, TouchEvent, WheelEvent, Window};

use foundation::math::{LatLng, Point};
use foundation::time::Time;
use layers::grid::{GridLayer, GridOptions};
use map::handlers::{Handler, ShiftKeyRotate, TouchGestures, WheelInput};
use map::{MapOptions, PlainMap, RotatableMap};

mod dom;
use dom::DomPanes;

/// How long the browser is given to run a zoom transition.
const ZOOM_ANIMATION_S: f64 = 0.25;

struct ViewerState {
    document: Document,
    container: HtmlElement,
    map: RotatableMap<PlainMap>,
    wheel: ShiftKeyRotate,
    touch: TouchGestures,
    grid: GridLayer,
    dom: DomPanes,
    last_frame: Option<Time>,
    zoom_anim_started: Option<Time>,
}

struct Listeners {
    container: HtmlElement,
    document: Document,
    wheel: Closure<dyn FnMut(WheelEvent)>,
    touch_start: Closure<dyn FnMut(TouchEvent)>,
    touch_move: Closure<dyn FnMut(TouchEvent)>,
    touch_end: Closure<dyn FnMut(TouchEvent)>,
}

struct FrameLoop {
    callback: Closure<dyn FnMut(f64)>,
    request_id: Option<i32>,
}

thread_local! {
    static STATE: RefCell<Option<ViewerState>> = const { RefCell::new(None) };
    static LISTENERS: RefCell<Option<Listeners>> = const { RefCell::new(None) };
    static FRAME_LOOP: RefCell<Option<FrameLoop>> = const { RefCell::new(None) };
}

fn init_logging() {
    let filter = EnvFilter::new("info");
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .without_time()
        .with_writer(MakeWebConsoleWriter::new())
        .with_filter(filter);
    // A second call (hot reload) finds the subscriber already set.
    let _ = tracing_subscriber::registry().with(fmt_layer).try_init();
}

fn window() -> Result<Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))
}

fn now(window: &Window) -> Time {
    window
        .performance()
        .map(|p| Time::from_millis(p.now()))
        .unwrap_or_default()
}

fn with_viewer<R>(f: impl FnOnce(&mut ViewerState) -> R) -> Option<R> {
    STATE.with(|cell| cell.borrow_mut().as_mut().map(f))
}

fn log_js_error(context: &str, err: JsValue) {
    tracing::error!(error = ?err, "{context}");
}

impl ViewerState {
    /// Container-relative positions of the active touches.
    fn touch_points(&self, e: &TouchEvent) -> Vec<Point> {
        let rect = self.container.get_bounding_client_rect();
        let touches = e.touches();
        (0..touches.length())
            .filter_map(|i| touches.get(i))
            .map(|t| {
                Point::new(
                    t.client_x() as f64 - rect.left(),
                    t.client_y() as f64 - rect.top(),
                )
            })
            .collect()
    }

    fn on_wheel(&mut self, e: &WheelEvent, time: Time) {
        let input = WheelInput {
            delta_y: e.delta_y(),
            shift_key: e.shift_key(),
            time,
        };
        if self.wheel.on_wheel(&mut self.map, input).prevents_default() {
            e.prevent_default();
            return;
        }
        // Plain wheel zooms one level per event unless shift rotation turned it off.
        if !input.shift_key && input.delta_y != 0.0 && self.map.scroll_wheel_zoom_enabled() {
            e.prevent_default();
            let zoom = self.map.zoom() - input.delta_y.signum();
            self.map.set_zoom(zoom);
        }
    }

    fn on_touch_start(&mut self, e: &TouchEvent) {
        let points = self.touch_points(e);
        if self.touch.on_touch_start(&mut self.map, &points) {
            e.prevent_default();
        }
    }

    fn on_touch_move(&mut self, e: &TouchEvent) {
        let points = self.touch_points(e);
        if self.touch.on_touch_move(&mut self.map, &points) {
            e.prevent_default();
        }
    }

    fn on_touch_end(&mut self) {
        self.touch.on_touch_end(&mut self.map);
    }

    fn on_frame(&mut self, time: Time) -> Result<(), JsValue> {
        let dt = self
            .last_frame
            .map(|last| time.seconds_since(last))
            .unwrap_or(1.0 / 60.0);
        self.last_frame = Some(time);

        self.map.run_animation_frame(dt);
        self.wheel.poll(&mut self.map, time);

        if self.map.is_animating_zoom() {
            let started = *self.zoom_anim_started.get_or_insert(time);
            if time.seconds_since(started) >= ZOOM_ANIMATION_S {
                self.map.finish_zoom_animation();
                self.zoom_anim_started = None;
            }
        }

        for event in self.map.drain_events() {
            if let Some(diff) = self.grid.handle_event(&self.map, &event.event, time) {
                self.dom.apply_tile_diff(&self.document, &diff)?;
            }
        }
        if let Some(diff) = self.grid.poll(&self.map, time) {
            self.dom.apply_tile_diff(&self.document, &diff)?;
        }

        self.dom.render(&self.map)?;
        self.dom.position_tiles(&self.map, &self.grid)
    }
}

fn request_frame(window: &Window) -> Result<(), JsValue> {
    FRAME_LOOP.with(|cell| {
        let mut slot = cell.borrow_mut();
        let Some(frame_loop) = slot.as_mut() else {
            return Ok(());
        };
        let id = window.request_animation_frame(frame_loop.callback.as_ref().unchecked_ref())?;
        frame_loop.request_id = Some(id);
        Ok(())
    })
}

fn start_frame_loop(window: &Window) -> Result<(), JsValue> {
    let callback = Closure::wrap(Box::new(move |ts: f64| {
        let Some(window) = web_sys::window() else {
            return;
        };
        if let Some(Err(err)) = with_viewer(|v| v.on_frame(Time::from_millis(ts))) {
            log_js_error("frame failed", err);
        }
        if let Err(err) = request_frame(&window) {
            log_js_error("requestAnimationFrame failed", err);
        }
    }) as Box<dyn FnMut(f64)>);

    FRAME_LOOP.with(|cell| {
        *cell.borrow_mut() = Some(FrameLoop {
            callback,
            request_id: None,
        });
    });
    request_frame(window)
}

fn install_listeners(document: &Document, container: &HtmlElement) -> Result<(), JsValue> {
    let wheel = Closure::wrap(Box::new(move |e: WheelEvent| {
        let Ok(window) = window() else {
            return;
        };
        let time = now(&window);
        with_viewer(|v| v.on_wheel(&e, time));
    }) as Box<dyn FnMut(_)>);
    let touch_start = Closure::wrap(Box::new(move |e: TouchEvent| {
        with_viewer(|v| v.on_touch_start(&e));
    }) as Box<dyn FnMut(_)>);
    let touch_move = Closure::wrap(Box::new(move |e: TouchEvent| {
        with_viewer(|v| v.on_touch_move(&e));
    }) as Box<dyn FnMut(_)>);
    let touch_end = Closure::wrap(Box::new(move |_e: TouchEvent| {
        with_viewer(|v| v.on_touch_end());
    }) as Box<dyn FnMut(_)>);

    // Wheel and touchmove call preventDefault, so they must not be passive.
    let active = AddEventListenerOptions::new();
    active.set_passive(false);
    container.add_event_listener_with_callback_and_add_event_listener_options(
        "wheel",
        wheel.as_ref().unchecked_ref(),
        &active,
    )?;
    container.add_event_listener_with_callback_and_add_event_listener_options(
        "touchstart",
        touch_start.as_ref().unchecked_ref(),
        &active,
    )?;
    document.add_event_listener_with_callback_and_add_event_listener_options(
        "touchmove",
        touch_move.as_ref().unchecked_ref(),
        &active,
    )?;
    document.add_event_listener_with_callback("touchend", touch_end.as_ref().unchecked_ref())?;
    document.add_event_listener_with_callback("touchcancel", touch_end.as_ref().unchecked_ref())?;

    LISTENERS.with(|cell| {
        *cell.borrow_mut() = Some(Listeners {
            container: container.clone(),
            document: document.clone(),
            wheel,
            touch_start,
            touch_move,
            touch_end,
        });
    });
    Ok(())
}

fn remove_listeners() {
    let Some(l) = LISTENERS.with(|cell| cell.borrow_mut().take()) else {
        return;
    };
    let _ = l
        .container
        .remove_event_listener_with_callback("wheel", l.wheel.as_ref().unchecked_ref());
    let _ = l
        .container
        .remove_event_listener_with_callback("touchstart", l.touch_start.as_ref().unchecked_ref());
    let _ = l
        .document
        .remove_event_listener_with_callback("touchmove", l.touch_move.as_ref().unchecked_ref());
    let _ = l
        .document
        .remove_event_listener_with_callback("touchend", l.touch_end.as_ref().unchecked_ref());
    let _ = l
        .document
        .remove_event_listener_with_callback("touchcancel", l.touch_end.as_ref().unchecked_ref());
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    set_once();
    init_logging();
    Ok(())
}

/// Mounts a map into the element with id `container_id`.
///
/// `options_json` is a (possibly empty) JSON object of map options.
#[wasm_bindgen]
pub fn mount(
    container_id: &str,
    options_json: &str,
    lat: f64,
    lng: f64,
    zoom: f64,
) -> Result<(), JsValue> {
    stop();

    let options = if options_json.trim().is_empty() {
        MapOptions::default()
    } else {
        MapOptions::from_json(options_json).map_err(|e| JsValue::from_str(&e.to_string()))?
    };

    let window = window()?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let container: HtmlElement = document
        .get_element_by_id(container_id)
        .ok_or_else(|| JsValue::from_str(&format!("no element with id {container_id}")))?
        .dyn_into()?;
    container.style().set_property("overflow", "hidden")?;
    container.style().set_property("position", "relative")?;
    container.style().set_property("touch-action", "none")?;

    let size = Point::new(
        container.client_width() as f64,
        container.client_height() as f64,
    );
    let host = PlainMap::new(size, LatLng::new(lat, lng), zoom).with_zoom_range(
        options.min_zoom,
        options.max_zoom,
        options.zoom_snap,
    );
    let wheel = ShiftKeyRotate::new(&options);
    let touch = TouchGestures::new(&options);
    let map = RotatableMap::new(host, options).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let mut dom = DomPanes::build(&document, &container, map.panes())?;
    let mut grid = GridLayer::new(1, GridOptions::default());
    dom.apply_tile_diff(&document, &grid.refresh(&map))?;

    tracing::info!(
        container = container_id,
        rotate = map.options().rotate,
        "map mounted"
    );
    STATE.with(|cell| {
        *cell.borrow_mut() = Some(ViewerState {
            document: document.clone(),
            container: container.clone(),
            map,
            wheel,
            touch,
            grid,
            dom,
            last_frame: None,
            zoom_anim_started: None,
        });
    });

    install_listeners(&document, &container)?;
    start_frame_loop(&window)
}

#[wasm_bindgen]
pub fn set_bearing(theta_deg: f64) {
    with_viewer(|v| v.map.set_bearing(theta_deg));
}

#[wasm_bindgen]
pub fn get_bearing() -> f64 {
    with_viewer(|v| v.map.bearing()).unwrap_or(0.0)
}

/// Re-reads the container size after a layout change.
#[wasm_bindgen]
pub fn invalidate_size() {
    with_viewer(|v| {
        let size = Point::new(
            v.container.client_width() as f64,
            v.container.client_height() as f64,
        );
        v.map.host_mut().set_size(size);
        v.map.move_end();
    });
}

#[wasm_bindgen]
pub fn set_touch_rotate(enabled: bool) {
    with_viewer(|v| {
        v.touch.set_rotate(enabled);
        if enabled && !v.touch.enabled() {
            v.touch.enable(&mut v.map);
        }
    });
}

#[wasm_bindgen]
pub fn set_shift_key_rotate(enabled: bool) {
    with_viewer(|v| {
        if enabled {
            v.wheel.enable(&mut v.map);
        } else {
            v.wheel.disable(&mut v.map);
        }
    });
}

/// Detaches every listener, cancels the frame loop and removes the panes.
#[wasm_bindgen]
pub fn stop() {
    remove_listeners();

    if let Some(frame_loop) = FRAME_LOOP.with(|cell| cell.borrow_mut().take()) {
        if let (Some(id), Ok(window)) = (frame_loop.request_id, window()) {
            let _ = window.cancel_animation_frame(id);
        }
    }

    if let Some(mut viewer) = STATE.with(|cell| cell.borrow_mut().take()) {
        viewer.touch.disable(&mut viewer.map);
        viewer.wheel.disable(&mut viewer.map);
        viewer.dom.remove();
        tracing::info!("map stopped");
    }
}
