//! Input handlers that drive a [`RotatableMap`].

pub mod touch;
pub mod wheel;

pub use touch::*;
pub use wheel::*;

use crate::host::BaseMap;
use crate::rotate::RotatableMap;

/// An input handler that can be switched on and off at runtime.
pub trait Handler {
    fn enabled(&self) -> bool;

    fn enable<H: BaseMap>(&mut self, map: &mut RotatableMap<H>);

    /// Disabling drops any in-flight interaction state.
    fn disable<H: BaseMap>(&mut self, map: &mut RotatableMap<H>);
}
