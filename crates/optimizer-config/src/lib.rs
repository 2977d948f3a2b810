// optimizer-config/src/lib.rs

use thiserror::Error;

pub mod loader;
pub mod types;

pub use loader::{load_config, ConfigLoader};
pub use types::*;

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("Parse error: {0}")]
	ParseError(String),

	#[error("Validation error: {0}")]
	ValidationError(String),
}
