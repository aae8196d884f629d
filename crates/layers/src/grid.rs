//! Tiled grid layer: which tiles cover the (possibly rotated) viewport.

use std::collections::BTreeSet;

use foundation::bounds::Bounds;
use foundation::math::{LatLng, Point};
use foundation::time::Time;
use runtime::event_bus::MapEvent;
use runtime::throttle::Throttle;
use serde::{Deserialize, Serialize};

use crate::layer::{Layer, LayerId, LayerKind};
use crate::view::MapView;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridOptions {
    pub tile_size: f64,
    /// Minimum time between tile refreshes while the map keeps rotating.
    pub update_interval_ms: f64,
    /// Only refresh once the map is idle; rotation does not refresh at all.
    pub update_when_idle: bool,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            tile_size: 256.0,
            update_interval_ms: 200.0,
            update_when_idle: false,
            min_zoom: 0.0,
            max_zoom: 18.0,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileCoord {
    pub x: i64,
    pub y: i64,
    pub z: i32,
}

impl TileCoord {
    pub fn new(x: i64, y: i64, z: i32) -> Self {
        Self { x, y, z }
    }
}

/// Tiles that appeared and disappeared in a refresh.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TileDiff {
    pub added: Vec<TileCoord>,
    pub removed: Vec<TileCoord>,
}

impl TileDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct GridLayer {
    id: LayerId,
    pub options: GridOptions,
    tiles: BTreeSet<TileCoord>,
    rotate_throttle: Throttle,
}

impl GridLayer {
    pub fn new(id: u64, options: GridOptions) -> Self {
        let rotate_throttle = Throttle::from_millis(options.update_interval_ms);
        Self {
            id: LayerId(id),
            options,
            tiles: BTreeSet::new(),
            rotate_throttle,
        }
    }

    pub fn tiles(&self) -> impl Iterator<Item = &TileCoord> {
        self.tiles.iter()
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Integer zoom the tiles are requested at for a given map zoom.
    pub fn tile_zoom(&self, map_zoom: f64) -> i32 {
        map_zoom
            .round()
            .clamp(self.options.min_zoom, self.options.max_zoom) as i32
    }

    /// Pixel bounds (at tile zoom) that tiles must cover around `center`.
    ///
    /// A rotated viewport covers the axis-aligned box around its four rotated
    /// corners, so those corners are mapped into layer space and boxed rather
    /// than taking the viewport size as is.
    pub fn tiled_pixel_bounds(&self, view: &impl MapView, center: LatLng) -> Bounds {
        let map_zoom = match view.animating_zoom() {
            Some(target) => target.max(view.zoom()),
            None => view.zoom(),
        };
        let tile_zoom = f64::from(self.tile_zoom(view.zoom()));
        let scale = view.zoom_scale(map_zoom, tile_zoom);
        let pixel_center = view.project(center, tile_zoom).floor();
        let size = view.size();

        let half_size = if view.rotation_enabled() {
            let corners = [
                Point::new(0.0, 0.0),
                Point::new(size.x, 0.0),
                Point::new(0.0, size.y),
                Point::new(size.x, size.y),
            ]
            .map(|c| view.container_point_to_layer_point(c).floor());
            match Bounds::from_points(corners) {
                Some(b) => b.size() / (scale * 2.0),
                None => size / (scale * 2.0),
            }
        } else {
            size / (scale * 2.0)
        };

        Bounds::new(pixel_center - half_size, pixel_center + half_size)
    }

    /// Tile index range covering pixel bounds (inclusive on both ends).
    pub fn tile_range(&self, bounds: Bounds) -> Bounds {
        let ts = self.options.tile_size;
        Bounds::new(
            (bounds.min / ts).floor(),
            Point::new(
                (bounds.max.x / ts).ceil() - 1.0,
                (bounds.max.y / ts).ceil() - 1.0,
            ),
        )
    }

    /// Recomputes the visible tile set for the view's current center.
    pub fn refresh(&mut self, view: &impl MapView) -> TileDiff {
        let z = self.tile_zoom(view.zoom());
        let range = self.tile_range(self.tiled_pixel_bounds(view, view.center()));
        let rows = 2f64.powi(z);

        let mut next = BTreeSet::new();
        let (x0, x1) = (range.min.x as i64, range.max.x as i64);
        let y0 = range.min.y.max(0.0) as i64;
        let y1 = range.max.y.min(rows - 1.0) as i64;
        for y in y0..=y1 {
            for x in x0..=x1 {
                next.insert(TileCoord::new(x, y, z));
            }
        }

        let diff = TileDiff {
            added: next.difference(&self.tiles).copied().collect(),
            removed: self.tiles.difference(&next).copied().collect(),
        };
        tracing::trace!(
            layer = self.id.0,
            added = diff.added.len(),
            removed = diff.removed.len(),
            "refreshed tiles"
        );
        self.tiles = next;
        diff
    }

    /// Reacts to a map event. Returns the tile diff when a refresh ran.
    pub fn handle_event(
        &mut self,
        view: &impl MapView,
        event: &MapEvent,
        now: Time,
    ) -> Option<TileDiff> {
        match event {
            MapEvent::Rotate { .. } => {
                if self.options.update_when_idle || !view.rotation_enabled() {
                    return None;
                }
                if self.rotate_throttle.call(now) {
                    Some(self.refresh(view))
                } else {
                    None
                }
            }
            MapEvent::MoveEnd | MapEvent::ViewReset => Some(self.refresh(view)),
            _ => None,
        }
    }

    /// Runs a refresh left pending by the rotate throttle once it is due.
    pub fn poll(&mut self, view: &impl MapView, now: Time) -> Option<TileDiff> {
        if self.rotate_throttle.poll(now) {
            Some(self.refresh(view))
        } else {
            None
        }
    }
}

impl Layer for GridLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    fn kind(&self) -> LayerKind {
        LayerKind::Tile
    }
}
