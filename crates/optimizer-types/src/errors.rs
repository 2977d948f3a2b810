//! Error types for the optimization engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, OptimizerError>;

/// Coarse classification of an [`OptimizerError`].
///
/// There is no timeout kind: an exhausted search budget is reported
/// as a flag on a successful result, never as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
	InvalidInput,
	NotFound,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OptimizerError {
	#[error("Invalid input: {0}")]
	InvalidInput(String),

	#[error("Invalid pool {pool}: {reason}")]
	InvalidPool { pool: String, reason: String },

	#[error("Input amount must be positive")]
	ZeroInput,

	#[error("Invalid quantity: {0}")]
	InvalidQuantity(f64),

	#[error("No path from {origin} to {destination} within {max_hops} hops")]
	NoPathFound {
		origin: String,
		destination: String,
		max_hops: usize,
	},
}

impl OptimizerError {
	pub fn invalid(msg: impl Into<String>) -> Self {
		Self::InvalidInput(msg.into())
	}

	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::InvalidInput(_)
			| Self::InvalidPool { .. }
			| Self::ZeroInput
			| Self::InvalidQuantity(_) => ErrorKind::InvalidInput,
			Self::NoPathFound { .. } => ErrorKind::NotFound,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_error_kinds() {
		assert_eq!(OptimizerError::ZeroInput.kind(), ErrorKind::InvalidInput);
		assert_eq!(
			OptimizerError::InvalidQuantity(-1.0).kind(),
			ErrorKind::InvalidInput
		);
		let err = OptimizerError::NoPathFound {
			origin: "A".into(),
			destination: "C".into(),
			max_hops: 3,
		};
		assert_eq!(err.kind(), ErrorKind::NotFound);
		assert_eq!(err.to_string(), "No path from A to C within 3 hops");
	}
}
