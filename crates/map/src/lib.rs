pub mod config;
pub mod handlers;
pub mod host;
pub mod rotate;

pub use config::*;
pub use host::*;
pub use rotate::*;
