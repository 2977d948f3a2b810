//! Multi-budget selection requests and responses.

use crate::common::{ResourceKind, Winner};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Resource usage or capacity per resource kind.
pub type ResourceMap = BTreeMap<ResourceKind, f64>;

/// A selectable item with a value and per-kind costs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
	pub id: String,
	pub value: f64,
	/// Classical sort key, ascending (e.g. a health factor).
	#[serde(default)]
	pub priority: f64,
	#[serde(default)]
	pub costs: ResourceMap,
}

impl Candidate {
	pub fn new(id: impl Into<String>, value: f64) -> Self {
		Self {
			id: id.into(),
			value,
			priority: 0.0,
			costs: ResourceMap::new(),
		}
	}

	pub fn with_priority(mut self, priority: f64) -> Self {
		self.priority = priority;
		self
	}

	pub fn with_cost(mut self, kind: impl Into<ResourceKind>, amount: f64) -> Self {
		self.costs.insert(kind.into(), amount);
		self
	}

	/// Cost for `kind`; kinds the candidate does not mention cost nothing.
	pub fn cost(&self, kind: &str) -> f64 {
		self.costs.get(kind).copied().unwrap_or(0.0)
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionRequest {
	pub candidates: Vec<Candidate>,
	#[serde(alias = "budget")]
	pub budgets: ResourceMap,
	/// Seed for the randomized search; the configured seed is used when absent.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub seed: Option<u64>,
}

impl SelectionRequest {
	pub fn new(candidates: Vec<Candidate>, budgets: ResourceMap) -> Self {
		Self {
			candidates,
			budgets,
			seed: None,
		}
	}
}

/// Execution order entry for the chosen candidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyStep {
	pub candidate_id: String,
	pub priority: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionComparison {
	pub classical_selected: Vec<String>,
	pub classical_value: f64,
	pub classical_usage: ResourceMap,
	pub classical_time_ms: f64,
	pub optimized_selected: Vec<String>,
	pub optimized_value: f64,
	pub optimized_usage: ResourceMap,
	pub optimized_time_ms: f64,
	pub improvement_pct: f64,
	pub winner: Winner,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub classical_constraint_violation: Option<String>,
}

/// Which algorithm produced a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchMethod {
	PriorityScan,
	BranchAndBound,
	SimulatedAnnealing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionMetrics {
	pub method: SearchMethod,
	pub candidates_evaluated: usize,
	pub constraints_checked: usize,
	/// Branch-and-bound nodes or annealing iterations.
	pub search_steps: u64,
	pub timed_out: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionResponse {
	pub selected: Vec<String>,
	pub recovered_value: f64,
	pub resource_usage: ResourceMap,
	pub strategy: Vec<StrategyStep>,
	pub comparison: SelectionComparison,
	pub metrics: SelectionMetrics,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_missing_cost_is_zero() {
		let candidate = Candidate::new("pos_1", 10.0).with_cost("gas", 150_000.0);
		assert_eq!(candidate.cost("gas"), 150_000.0);
		assert_eq!(candidate.cost("USDC"), 0.0);
	}
}
