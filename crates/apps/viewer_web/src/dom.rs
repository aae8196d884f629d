use std::collections::BTreeMap;

use foundation::math::Point;
use layers::grid::{GridLayer, TileCoord, TileDiff};
use layers::{PaneName, PaneTree};
use map::{BaseMap, PlainMap, RotatableMap};
use wasm_bindgen::prelude::*;
use web_sys::{Document, HtmlElement};

/// DOM mirror of the pane tree plus the tile elements of one grid layer.
pub struct DomPanes {
    panes: BTreeMap<PaneName, HtmlElement>,
    tiles: BTreeMap<TileCoord, HtmlElement>,
}

fn create_div(document: &Document, class: &str) -> Result<HtmlElement, JsValue> {
    let el: HtmlElement = document.create_element("div")?.dyn_into()?;
    el.set_class_name(class);
    Ok(el)
}

impl DomPanes {
    pub fn build(
        document: &Document,
        container: &HtmlElement,
        tree: &PaneTree,
    ) -> Result<Self, JsValue> {
        let mut panes = BTreeMap::new();
        for pane in tree.iter() {
            let el = create_div(document, &format!("atlas-pane atlas-{}", pane.name.as_str()))?;
            let style = el.style();
            style.set_property("position", "absolute")?;
            style.set_property("left", "0")?;
            style.set_property("top", "0")?;
            style.set_property("transform-origin", "0 0")?;
            if let Some(z) = pane.z_index {
                style.set_property("z-index", &z.to_string())?;
            }

            let parent = match pane.parent.and_then(|p| panes.get(&p)) {
                Some(parent) => parent,
                None => container,
            };
            parent.append_child(&el)?;
            panes.insert(pane.name, el);
        }
        Ok(Self {
            panes,
            tiles: BTreeMap::new(),
        })
    }

    /// Writes every pane transform, hiding zoom-hide panes mid-animation.
    pub fn render(&self, map: &RotatableMap<PlainMap>) -> Result<(), JsValue> {
        let animating = map.is_animating_zoom();
        for pane in map.panes().iter() {
            let Some(el) = self.panes.get(&pane.name) else {
                continue;
            };
            let style = el.style();
            style.set_property("transform", &pane.transform.to_css())?;
            let hidden = animating && pane.zoom_hide;
            style.set_property("visibility", if hidden { "hidden" } else { "visible" })?;
        }
        Ok(())
    }

    pub fn apply_tile_diff(&mut self, document: &Document, diff: &TileDiff) -> Result<(), JsValue> {
        for coord in &diff.removed {
            if let Some(el) = self.tiles.remove(coord) {
                el.remove();
            }
        }
        let Some(tile_pane) = self.panes.get(&PaneName::Tile) else {
            return Ok(());
        };
        for coord in &diff.added {
            let el = create_div(document, "atlas-tile")?;
            el.set_text_content(Some(&format!("{}/{}/{}", coord.z, coord.x, coord.y)));
            let style = el.style();
            style.set_property("position", "absolute")?;
            style.set_property("box-sizing", "border-box")?;
            style.set_property("border", "1px solid rgba(0,0,0,0.2)")?;
            tile_pane.append_child(&el)?;
            self.tiles.insert(*coord, el);
        }
        Ok(())
    }

    /// Places tiles in layer space for the map's current zoom and origin.
    pub fn position_tiles(
        &self,
        map: &RotatableMap<PlainMap>,
        grid: &GridLayer,
    ) -> Result<(), JsValue> {
        let host = map.host();
        let tile_size = grid.options.tile_size;
        for (coord, el) in &self.tiles {
            let scale = host.zoom_scale(host.zoom(), coord.z as f64);
            let size = tile_size * scale;
            let world = Point::new(coord.x as f64, coord.y as f64) * size;
            let pos = world - host.pixel_origin();
            let style = el.style();
            style.set_property("width", &format!("{size}px"))?;
            style.set_property("height", &format!("{size}px"))?;
            style.set_property("transform", &format!("translate3d({}px,{}px,0)", pos.x, pos.y))?;
        }
        Ok(())
    }

    pub fn remove(self) {
        if let Some(map_pane) = self.panes.get(&PaneName::Map) {
            map_pane.remove();
        }
    }
}
