use crate::pane::PaneName;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct LayerId(pub u64);

/// What a layer draws, which decides the pane it is mounted in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Tile,
    Vector,
    MarkerShadow,
    Marker,
    Tooltip,
    Popup,
}

impl LayerKind {
    pub fn default_pane(self) -> PaneName {
        match self {
            LayerKind::Tile => PaneName::Tile,
            LayerKind::Vector => PaneName::Overlay,
            LayerKind::MarkerShadow => PaneName::Shadow,
            LayerKind::Marker => PaneName::Marker,
            LayerKind::Tooltip => PaneName::Tooltip,
            LayerKind::Popup => PaneName::Popup,
        }
    }
}

pub trait Layer {
    fn id(&self) -> LayerId;

    fn kind(&self) -> LayerKind;

    fn pane(&self) -> PaneName {
        self.kind().default_pane()
    }
}
