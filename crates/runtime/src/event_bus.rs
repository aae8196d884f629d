use crate::frame::Frame;

/// Events fired by the map.
///
/// Layers and overlays consume these to recompute what they draw; `Rotate` is
/// fired on every bearing change.
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    Rotate { bearing_deg: f64 },
    MoveStart,
    Move,
    MoveEnd,
    ZoomStart,
    ZoomAnim { zoom: f64 },
    ZoomEnd,
    ViewReset,
}

impl MapEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            MapEvent::Rotate { .. } => "rotate",
            MapEvent::MoveStart => "movestart",
            MapEvent::Move => "move",
            MapEvent::MoveEnd => "moveend",
            MapEvent::ZoomStart => "zoomstart",
            MapEvent::ZoomAnim { .. } => "zoomanim",
            MapEvent::ZoomEnd => "zoomend",
            MapEvent::ViewReset => "viewreset",
        }
    }
}

/// An event stamped with the frame it was fired in.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub frame_index: u64,
    pub event: MapEvent,
}

/// Ordered event queue. The host drains it once per turn and dispatches to layers.
#[derive(Debug, Default)]
pub struct EventBus {
    events: Vec<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, frame: Frame, event: MapEvent) {
        tracing::trace!(frame = frame.index, kind = event.kind(), "map event");
        self.events.push(Event {
            frame_index: frame.index,
            event,
        });
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn count(&self, kind: &str) -> usize {
        self.events.iter().filter(|e| e.event.kind() == kind).count()
    }

    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}
