use serde::{Deserialize, Serialize};

/// How a two-finger pinch picks the zoom center.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TouchZoom {
    Disabled,
    /// Zoom about the pinch midpoint, following the fingers.
    #[default]
    Pinch,
    /// Zoom about the viewport center.
    Center,
}

/// Map construction options. Fixed for the lifetime of a map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapOptions {
    /// Build the rotated pane tree and allow bearing changes.
    pub rotate: bool,
    /// Initial bearing in degrees.
    pub bearing: f64,
    /// Shift + wheel rotates.
    pub shift_key_rotate: bool,
    /// Two-finger twist rotates.
    pub touch_rotate: bool,
    pub touch_zoom: TouchZoom,
    /// Degrees per wheel notch.
    pub rotate_step_deg: f64,
    /// Minimum time between wheel rotation steps; 0 disables throttling.
    pub wheel_rotate_throttle_ms: f64,
    pub scroll_wheel_zoom: bool,
    /// Let pinch zoom overshoot min/max zoom until the gesture ends.
    pub bounce_at_zoom_limits: bool,
    /// Animate the final zoom snap of a pinch instead of resetting the view.
    pub zoom_animation: bool,
    pub marker_zoom_animation: bool,
    /// Whether the rendering backend can apply 2D transforms.
    pub transforms_supported: bool,
    /// Zoom range and snap for building a host map. Once the map exists the
    /// host's own [`BaseMap::min_zoom`](crate::BaseMap::min_zoom) and
    /// friends are the only range consulted.
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Zoom levels snap to multiples of this; 0 disables snapping.
    pub zoom_snap: f64,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            rotate: false,
            bearing: 0.0,
            shift_key_rotate: true,
            touch_rotate: false,
            touch_zoom: TouchZoom::Pinch,
            rotate_step_deg: 5.0,
            wheel_rotate_throttle_ms: 0.0,
            scroll_wheel_zoom: true,
            bounce_at_zoom_limits: true,
            zoom_animation: true,
            marker_zoom_animation: true,
            transforms_supported: true,
            min_zoom: 0.0,
            max_zoom: 18.0,
            zoom_snap: 1.0,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("malformed map options: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("bearing must be finite, got {0}")]
    NonFiniteBearing(f64),
    #[error("rotate step must be a positive number of degrees, got {0}")]
    InvalidRotateStep(f64),
    #[error("wheel rotate throttle must be a non-negative number of ms, got {0}")]
    InvalidThrottle(f64),
    #[error("zoom range is empty: min {min} > max {max}")]
    InvalidZoomRange { min: f64, max: f64 },
    #[error("zoom snap must be a non-negative number, got {0}")]
    InvalidZoomSnap(f64),
}

impl MapOptions {
    /// A rotatable map with the default interaction set.
    pub fn rotatable() -> Self {
        Self {
            rotate: true,
            ..Self::default()
        }
    }

    /// Parses a (possibly partial) JSON object; missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let options: MapOptions = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.bearing.is_finite() {
            return Err(ConfigError::NonFiniteBearing(self.bearing));
        }
        if !(self.rotate_step_deg.is_finite() && self.rotate_step_deg > 0.0) {
            return Err(ConfigError::InvalidRotateStep(self.rotate_step_deg));
        }
        if !(self.wheel_rotate_throttle_ms.is_finite() && self.wheel_rotate_throttle_ms >= 0.0) {
            return Err(ConfigError::InvalidThrottle(self.wheel_rotate_throttle_ms));
        }
        if !(self.min_zoom <= self.max_zoom) {
            return Err(ConfigError::InvalidZoomRange {
                min: self.min_zoom,
                max: self.max_zoom,
            });
        }
        if !(self.zoom_snap.is_finite() && self.zoom_snap >= 0.0) {
            return Err(ConfigError::InvalidZoomSnap(self.zoom_snap));
        }
        Ok(())
    }
}
