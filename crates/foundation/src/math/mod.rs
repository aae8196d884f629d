pub mod bearing;
pub mod point;
pub mod projection;

pub use bearing::*;
pub use point::*;
pub use projection::*;
