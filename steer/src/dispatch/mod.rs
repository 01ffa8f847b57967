mod dispatching;
mod ecma;
mod rule;

pub use dispatching::*;
pub use ecma::*;
pub use rule::*;
