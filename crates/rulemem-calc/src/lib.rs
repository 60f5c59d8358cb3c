pub mod calculator;
pub mod defs;
pub mod routing;

pub use calculator::*;
pub use defs::*;
pub use routing::*;
