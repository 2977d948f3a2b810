//! Common types used throughout the engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque asset identifier.
pub type Asset = String;

/// Resource dimension name used by budgets and candidate costs.
pub type ResourceKind = String;

/// Which of the two algorithms of a solver produced the better outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Winner {
	Classical,
	Optimized,
}

impl Winner {
	/// The optimized algorithm wins only when it is strictly better.
	pub fn optimized_if(strictly_better: bool) -> Self {
		if strictly_better {
			Self::Optimized
		} else {
			Self::Classical
		}
	}
}

impl fmt::Display for Winner {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Classical => write!(f, "classical"),
			Self::Optimized => write!(f, "optimized"),
		}
	}
}

/// The solver families offered by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SolverKind {
	PathSearch,
	Scheduler,
	Selector,
	Partitioner,
	Scorer,
}

impl SolverKind {
	pub const ALL: [SolverKind; 5] = [
		Self::PathSearch,
		Self::Scheduler,
		Self::Selector,
		Self::Partitioner,
		Self::Scorer,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::PathSearch => "path-search",
			Self::Scheduler => "scheduler",
			Self::Selector => "selector",
			Self::Partitioner => "partitioner",
			Self::Scorer => "scorer",
		}
	}
}

impl fmt::Display for SolverKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Percentage gain of `candidate` over `baseline`; zero when the baseline is
/// not positive.
pub fn improvement_pct(baseline: f64, candidate: f64) -> f64 {
	if baseline > 0.0 {
		(candidate - baseline) / baseline * 100.0
	} else {
		0.0
	}
}

/// Percentage reduction of `candidate` relative to `baseline`; zero when the
/// baseline is not positive.
pub fn reduction_pct(baseline: f64, candidate: f64) -> f64 {
	if baseline > 0.0 {
		(baseline - candidate) / baseline * 100.0
	} else {
		0.0
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_winner_serialization() {
		let json = serde_json::to_string(&Winner::Optimized).unwrap();
		assert_eq!(json, "\"optimized\"");
		assert_eq!(Winner::optimized_if(false), Winner::Classical);
	}

	#[test]
	fn test_percentages() {
		assert_eq!(improvement_pct(100.0, 110.0), 10.0);
		assert_eq!(improvement_pct(0.0, 110.0), 0.0);
		assert_eq!(reduction_pct(5.0, 3.0), 40.0);
		assert_eq!(reduction_pct(0.0, 0.0), 0.0);
	}

	#[test]
	fn test_solver_kind_names() {
		let json = serde_json::to_string(&SolverKind::PathSearch).unwrap();
		assert_eq!(json, "\"path-search\"");
		for kind in SolverKind::ALL {
			let back: SolverKind =
				serde_json::from_str(&format!("\"{}\"", kind.as_str())).unwrap();
			assert_eq!(back, kind);
		}
	}
}
