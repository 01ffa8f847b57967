pub mod config;
pub mod context;
pub mod dispatch;
pub mod drift;
pub mod external;
pub mod script;
