pub mod collection;
pub mod dsl;
pub mod executor;
pub mod filters;
pub mod rule;
pub mod site;

pub use collection::*;
pub use dsl::*;
pub use executor::*;
pub use filters::*;
pub use rule::*;
pub use site::*;
