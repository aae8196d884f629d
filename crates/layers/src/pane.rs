//! Pane tree and pane transforms.
//!
//! With rotation enabled, world content (tiles, vector overlays) lives under
//! `rotatePane` and turns with the bearing, while screen-up content (marker
//! icons, shadows, tooltips, popups) lives under `norotatePane`. Without
//! rotation every pane hangs directly off `mapPane`.

use foundation::math::{Bearing, Point};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PaneName {
    Map,
    Rotate,
    NoRotate,
    Tile,
    Overlay,
    Shadow,
    Marker,
    Tooltip,
    Popup,
}

impl PaneName {
    pub fn as_str(self) -> &'static str {
        match self {
            PaneName::Map => "mapPane",
            PaneName::Rotate => "rotatePane",
            PaneName::NoRotate => "norotatePane",
            PaneName::Tile => "tilePane",
            PaneName::Overlay => "overlayPane",
            PaneName::Shadow => "shadowPane",
            PaneName::Marker => "markerPane",
            PaneName::Tooltip => "tooltipPane",
            PaneName::Popup => "popupPane",
        }
    }

    pub fn z_index(self) -> Option<i32> {
        match self {
            PaneName::Map | PaneName::Rotate | PaneName::NoRotate => None,
            PaneName::Tile => Some(200),
            PaneName::Overlay => Some(400),
            PaneName::Shadow => Some(500),
            PaneName::Marker => Some(600),
            PaneName::Tooltip => Some(650),
            PaneName::Popup => Some(700),
        }
    }
}

/// Translate + optional scale + rotate, applied with a top-left transform origin.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct PaneTransform {
    pub translate: Point,
    pub scale: Option<f64>,
    /// Radians.
    pub rotation: f64,
}

impl PaneTransform {
    pub fn identity() -> Self {
        Self::default()
    }

    /// Transform that places a pane whose unrotated position is `pos`.
    ///
    /// North-up panes get a pixel-rounded translation only. A rotated pane is
    /// translated to `pos` turned about `pivot` by the bearing, then rotated.
    pub fn positioned(pos: Point, bearing: Bearing, pivot: Point) -> Self {
        if bearing.is_north_up() {
            return Self {
                translate: pos.round(),
                scale: None,
                rotation: 0.0,
            };
        }
        Self {
            translate: pos.rotate_about(bearing.radians(), pivot),
            scale: None,
            rotation: bearing.radians(),
        }
    }

    /// Maps a point in the pane's own space into its parent's space.
    pub fn apply(&self, p: Point) -> Point {
        let scaled = match self.scale {
            Some(s) => p * s,
            None => p,
        };
        self.translate + scaled.rotate(self.rotation)
    }

    /// CSS `transform` value.
    pub fn to_css(&self) -> String {
        let mut css = format!(
            "translate3d({}px,{}px,0)",
            self.translate.x, self.translate.y
        );
        if let Some(s) = self.scale {
            css.push_str(&format!(" scale({s})"));
        }
        if self.rotation != 0.0 {
            css.push_str(&format!(" rotate({}rad)", self.rotation));
        }
        css
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pane {
    pub name: PaneName,
    pub parent: Option<PaneName>,
    pub z_index: Option<i32>,
    /// Unrotated position last set on the pane.
    pub position: Point,
    pub transform: PaneTransform,
    /// Hidden while a zoom animation runs.
    pub zoom_hide: bool,
}

impl Pane {
    fn new(name: PaneName, parent: Option<PaneName>) -> Self {
        Self {
            name,
            parent,
            z_index: name.z_index(),
            position: Point::ORIGIN,
            transform: PaneTransform::identity(),
            zoom_hide: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaneTree {
    panes: Vec<Pane>,
    rotate: bool,
}

impl PaneTree {
    pub fn new(rotate: bool, marker_zoom_animation: bool) -> Self {
        let mut panes = vec![Pane::new(PaneName::Map, None)];

        let (world_parent, screen_parent) = if rotate {
            panes.push(Pane::new(PaneName::Rotate, Some(PaneName::Map)));
            panes.push(Pane::new(PaneName::NoRotate, Some(PaneName::Map)));
            (PaneName::Rotate, PaneName::NoRotate)
        } else {
            (PaneName::Map, PaneName::Map)
        };

        for name in [PaneName::Tile, PaneName::Overlay] {
            panes.push(Pane::new(name, Some(world_parent)));
        }
        for name in [
            PaneName::Shadow,
            PaneName::Marker,
            PaneName::Tooltip,
            PaneName::Popup,
        ] {
            panes.push(Pane::new(name, Some(screen_parent)));
        }

        if !marker_zoom_animation {
            for pane in panes.iter_mut() {
                if matches!(pane.name, PaneName::Marker | PaneName::Shadow) {
                    pane.zoom_hide = true;
                }
            }
        }

        tracing::debug!(rotate, panes = panes.len(), "created pane tree");
        Self { panes, rotate }
    }

    pub fn is_rotatable(&self) -> bool {
        self.rotate
    }

    pub fn get(&self, name: PaneName) -> Option<&Pane> {
        self.panes.iter().find(|p| p.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pane> {
        self.panes.iter()
    }

    pub fn children(&self, name: PaneName) -> impl Iterator<Item = &Pane> {
        self.panes.iter().filter(move |p| p.parent == Some(name))
    }

    /// True when content in `name` turns with the bearing.
    pub fn is_rotated(&self, name: PaneName) -> bool {
        let mut current = Some(name);
        while let Some(n) = current {
            if n == PaneName::Rotate {
                return true;
            }
            current = self.get(n).and_then(|p| p.parent);
        }
        false
    }

    /// Positions a pane. Returns `false` if the tree has no such pane.
    pub fn set_position(
        &mut self,
        name: PaneName,
        pos: Point,
        bearing: Bearing,
        pivot: Point,
    ) -> bool {
        let Some(pane) = self.panes.iter_mut().find(|p| p.name == name) else {
            return false;
        };
        pane.position = pos;
        pane.transform = PaneTransform::positioned(pos, bearing, pivot);
        true
    }

    /// Maps a point in `name`'s local space to container space.
    pub fn to_container(&self, name: PaneName, p: Point) -> Point {
        let mut out = p;
        let mut current = Some(name);
        while let Some(n) = current {
            let Some(pane) = self.get(n) else {
                break;
            };
            out = pane.transform.apply(out);
            current = pane.parent;
        }
        out
    }
}
