//! Step and wall-clock limits for long searches.

use std::time::{Duration, Instant};

/// Why a [`SearchBudget`] stopped a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
	StepLimit,
	Deadline,
}

/// Iteration cap plus a soft deadline.
///
/// Searches call [`SearchBudget::tick`] once per unit of work and poll
/// [`SearchBudget::exhausted`]; once exhausted the budget stays exhausted
/// and the search returns its best-so-far result.
#[derive(Debug, Clone)]
pub struct SearchBudget {
	max_steps: u64,
	steps: u64,
	/// `None` when the budget is too large to represent as an instant.
	deadline: Option<Instant>,
	stopped: Option<StopReason>,
}

impl SearchBudget {
	pub fn new(max_steps: u64, time_budget: Duration) -> Self {
		Self {
			max_steps,
			steps: 0,
			deadline: Instant::now().checked_add(time_budget),
			stopped: None,
		}
	}

	pub fn from_millis(max_steps: u64, time_budget_ms: u64) -> Self {
		Self::new(max_steps, Duration::from_millis(time_budget_ms))
	}

	/// Count one unit of work.
	pub fn tick(&mut self) {
		self.steps += 1;
	}

	pub fn steps(&self) -> u64 {
		self.steps
	}

	pub fn exhausted(&mut self) -> bool {
		if self.stopped.is_some() {
			return true;
		}
		if self.steps >= self.max_steps {
			self.stopped = Some(StopReason::StepLimit);
		} else if self.deadline.is_some_and(|d| Instant::now() >= d) {
			self.stopped = Some(StopReason::Deadline);
		}
		self.stopped.is_some()
	}

	pub fn stop_reason(&self) -> Option<StopReason> {
		self.stopped
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_step_limit() {
		let mut budget = SearchBudget::from_millis(3, 60_000);
		for _ in 0..3 {
			assert!(!budget.exhausted());
			budget.tick();
		}
		assert!(budget.exhausted());
		assert_eq!(budget.stop_reason(), Some(StopReason::StepLimit));
		assert_eq!(budget.steps(), 3);
	}

	#[test]
	fn test_deadline() {
		let mut budget = SearchBudget::new(u64::MAX, Duration::ZERO);
		assert!(budget.exhausted());
		assert_eq!(budget.stop_reason(), Some(StopReason::Deadline));
	}

	#[test]
	fn test_exhaustion_is_sticky() {
		let mut budget = SearchBudget::from_millis(0, 60_000);
		assert!(budget.exhausted());
		budget.tick();
		assert!(budget.exhausted());
		assert_eq!(budget.stop_reason(), Some(StopReason::StepLimit));
	}
}
