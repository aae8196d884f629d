pub mod event_bus;
pub mod frame;
pub mod latest;
pub mod throttle;

pub use event_bus::*;
pub use frame::*;
pub use latest::*;
pub use throttle::*;
