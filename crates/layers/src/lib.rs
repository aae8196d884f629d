pub mod grid;
pub mod layer;
pub mod pane;
pub mod view;

pub use layer::*;
pub use pane::*;
pub use view::*;
