mod controller;
mod logger;
mod observed;
mod stack;

pub use controller::*;
pub use logger::*;
pub use observed::*;
pub use stack::*;
