mod literal;
mod pac;

pub use literal::*;
pub use pac::*;
use thiserror::Error;

/// Comment marker identifying scripts this program generated.
pub const SCRIPT_SENTINEL: &str = "steer:managed-pac";

#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("Literal encoding error: {0}")]
    Literal(#[from] serde_json::Error),
}
