mod coerce;
mod error;
mod paths;
mod policy;
mod staging;
mod store;
mod validate;

pub use error::*;
pub use paths::*;
pub use policy::*;
pub use staging::*;
pub use store::*;
