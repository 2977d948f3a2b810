//! Shared two-algorithm runner.
//!
//! Every solver implements [`DualSolver`]; [`run_comparison`] validates the
//! request once, runs the classical and the optimized algorithm on the same
//! problem, times each one and hands both outcomes to the solver's own
//! comparator.

use optimizer_monitoring::{metrics::millis, time_operation};
use optimizer_types::{Result, SolverKind};
use tracing::debug;

/// An algorithm outcome with the wall-clock time it took.
#[derive(Debug, Clone, PartialEq)]
pub struct Timed<T> {
	pub value: T,
	pub elapsed_ms: f64,
}

/// A solver offering a baseline and a stronger algorithm for one problem.
pub trait DualSolver {
	type Request;
	/// Validated, owned copy of the request.
	type Problem;
	type Outcome;
	type Response;

	const KIND: SolverKind;

	/// Reject malformed requests before any algorithm runs.
	fn validate(&self, request: &Self::Request) -> Result<Self::Problem>;

	fn classical(&self, problem: &Self::Problem) -> Self::Outcome;

	fn optimized(&self, problem: &Self::Problem) -> Self::Outcome;

	/// Merge both outcomes into a response.
	fn compare(
		&self,
		problem: &Self::Problem,
		classical: Timed<Self::Outcome>,
		optimized: Timed<Self::Outcome>,
	) -> Result<Self::Response>;
}

/// Validate, run both algorithms and compare.
pub fn run_comparison<S: DualSolver>(solver: &S, request: &S::Request) -> Result<S::Response> {
	let problem = solver.validate(request)?;

	let (classical, classical_time) = time_operation!(
		format!("{}.classical", S::KIND),
		solver.classical(&problem)
	);
	let (optimized, optimized_time) = time_operation!(
		format!("{}.optimized", S::KIND),
		solver.optimized(&problem)
	);
	debug!(
		solver = %S::KIND,
		classical_ms = millis(classical_time),
		optimized_ms = millis(optimized_time),
		"Both algorithms finished"
	);

	solver.compare(
		&problem,
		Timed {
			value: classical,
			elapsed_ms: millis(classical_time),
		},
		Timed {
			value: optimized,
			elapsed_ms: millis(optimized_time),
		},
	)
}

#[cfg(test)]
mod tests {
	use super::*;
	use optimizer_types::OptimizerError;

	/// Sums a list two ways.
	struct Summer;

	impl DualSolver for Summer {
		type Request = Vec<i64>;
		type Problem = Vec<i64>;
		type Outcome = i64;
		type Response = (i64, i64, bool);

		const KIND: SolverKind = SolverKind::Scorer;

		fn validate(&self, request: &Vec<i64>) -> Result<Vec<i64>> {
			if request.is_empty() {
				return Err(OptimizerError::invalid("empty"));
			}
			Ok(request.clone())
		}

		fn classical(&self, problem: &Vec<i64>) -> i64 {
			problem[0]
		}

		fn optimized(&self, problem: &Vec<i64>) -> i64 {
			problem.iter().sum()
		}

		fn compare(
			&self,
			_problem: &Vec<i64>,
			classical: Timed<i64>,
			optimized: Timed<i64>,
		) -> Result<(i64, i64, bool)> {
			let timed = classical.elapsed_ms >= 0.0 && optimized.elapsed_ms >= 0.0;
			Ok((classical.value, optimized.value, timed))
		}
	}

	#[test]
	fn test_runs_both_algorithms() {
		let response = run_comparison(&Summer, &vec![2, 3, 4]).unwrap();
		assert_eq!(response, (2, 9, true));
	}

	#[test]
	fn test_validation_runs_first() {
		let err = run_comparison(&Summer, &Vec::new()).unwrap_err();
		assert_eq!(err, OptimizerError::invalid("empty"));
	}
}
