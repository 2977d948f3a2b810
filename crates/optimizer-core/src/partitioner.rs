//! Convex-cost batch partitioning.
//!
//! Splitting a quantity into `k` batches pays `k` fixed overheads but shrinks
//! the convex impact term. For a fixed `k` the near-equal split minimizes the
//! impact sum, so the search only has to scan `k`.

use crate::reporter::{DualSolver, Timed};
use optimizer_config::PartitionerConfig;
use optimizer_types::{
	improvement_pct, reduction_pct, Batch, BatchItem, ImpactParams, OptimizerError,
	PartitionComparison, PartitionMetrics, PartitionRequest, PartitionResponse, Result,
	SolverKind, Winner,
};
use std::collections::HashSet;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct PartitionProblem {
	quantity: f64,
	/// Present in task-list mode.
	items: Option<Vec<BatchItem>>,
	fixed_overhead: f64,
	impact: ImpactParams,
	max_batches: usize,
	max_impact_per_unit: Option<f64>,
}

/// One candidate partition and its cost breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchPlan {
	pub amounts: Vec<f64>,
	pub item_ids: Vec<Vec<String>>,
	pub impact: f64,
	pub overhead: f64,
	pub batch_counts_evaluated: usize,
	pub tolerance_exceeded: bool,
}

impl BatchPlan {
	pub fn batches(&self) -> usize {
		self.amounts.len()
	}

	pub fn cost(&self) -> f64 {
		self.impact + self.overhead
	}
}

/// `k` parts of `quantity`; the last part absorbs rounding.
pub fn near_equal_split(quantity: f64, k: usize) -> Vec<f64> {
	if k == 0 {
		return Vec::new();
	}
	let base = quantity / k as f64;
	let mut parts = vec![base; k];
	parts[k - 1] = quantity - base * (k - 1) as f64;
	parts
}

/// Longest-processing-time grouping: largest item first, each into the
/// currently lightest group.
pub fn lpt_groups(items: &[BatchItem], k: usize) -> (Vec<f64>, Vec<Vec<String>>) {
	let mut order: Vec<usize> = (0..items.len()).collect();
	order.sort_by(|&a, &b| items[b].amount.total_cmp(&items[a].amount));

	let mut loads = vec![0.0f64; k];
	let mut ids: Vec<Vec<String>> = vec![Vec::new(); k];
	for i in order {
		let lightest = (0..k)
			.min_by(|&a, &b| loads[a].total_cmp(&loads[b]).then(a.cmp(&b)))
			.unwrap_or(0);
		loads[lightest] += items[i].amount;
		ids[lightest].push(items[i].id.clone());
	}
	(loads, ids)
}

impl PartitionProblem {
	fn plan(&self, k: usize) -> BatchPlan {
		let (amounts, item_ids) = match &self.items {
			Some(items) => lpt_groups(items, k),
			None => (near_equal_split(self.quantity, k), vec![Vec::new(); k]),
		};
		let impact = amounts.iter().map(|&s| self.impact.impact(s)).sum();

		BatchPlan {
			impact,
			overhead: k as f64 * self.fixed_overhead,
			tolerance_exceeded: !self.within_tolerance(&amounts),
			amounts,
			item_ids,
			batch_counts_evaluated: 1,
		}
	}

	fn within_tolerance(&self, amounts: &[f64]) -> bool {
		let Some(limit) = self.max_impact_per_unit else {
			return true;
		};
		amounts
			.iter()
			.filter(|&&s| s > 0.0)
			.all(|&s| self.impact.impact(s) / s <= limit)
	}
}

pub struct Partitioner {
	config: PartitionerConfig,
}

impl Partitioner {
	pub fn new(config: PartitionerConfig) -> Self {
		Self { config }
	}
}

impl DualSolver for Partitioner {
	type Request = PartitionRequest;
	type Problem = PartitionProblem;
	type Outcome = BatchPlan;
	type Response = PartitionResponse;

	const KIND: SolverKind = SolverKind::Partitioner;

	fn validate(&self, request: &PartitionRequest) -> Result<PartitionProblem> {
		let params = request.impact_params;
		if !(params.coefficient.is_finite() && params.coefficient > 0.0) {
			return Err(OptimizerError::invalid("impactParams.coefficient must be positive"));
		}
		if !(params.exponent.is_finite() && params.exponent > 1.0) {
			return Err(OptimizerError::invalid("impactParams.exponent must be greater than 1"));
		}
		if !(request.fixed_overhead.is_finite() && request.fixed_overhead >= 0.0) {
			return Err(OptimizerError::invalid("fixedOverhead must be non-negative"));
		}
		if request.max_batches == 0 {
			return Err(OptimizerError::invalid("maxBatches must be at least 1"));
		}
		if let Some(limit) = request.max_impact_per_unit {
			if !(limit.is_finite() && limit > 0.0) {
				return Err(OptimizerError::invalid("maxImpactPerUnit must be positive"));
			}
		}

		let (quantity, items) = match (request.quantity, request.items.is_empty()) {
			(Some(_), false) => {
				return Err(OptimizerError::invalid("give either quantity or items, not both"))
			}
			(None, true) => return Err(OptimizerError::invalid("quantity or items is required")),
			(Some(quantity), true) => {
				if !(quantity.is_finite() && quantity > 0.0) {
					return Err(OptimizerError::InvalidQuantity(quantity));
				}
				(quantity, None)
			}
			(None, false) => {
				let mut seen = HashSet::new();
				for item in &request.items {
					if item.id.is_empty() || !seen.insert(item.id.as_str()) {
						return Err(OptimizerError::invalid(format!(
							"item id {:?} is empty or duplicated",
							item.id
						)));
					}
					if !(item.amount.is_finite() && item.amount > 0.0) {
						return Err(OptimizerError::invalid(format!(
							"item {} must have a positive amount",
							item.id
						)));
					}
				}
				let total: f64 = request.items.iter().map(|i| i.amount).sum();
				(total, Some(request.items.clone()))
			}
		};

		let mut max_batches = request.max_batches;
		if max_batches > self.config.max_batches_cap {
			warn!(
				requested = max_batches,
				cap = self.config.max_batches_cap,
				"maxBatches above the configured cap, clamping"
			);
			max_batches = self.config.max_batches_cap;
		}
		if let Some(items) = &items {
			max_batches = max_batches.min(items.len());
		}

		Ok(PartitionProblem {
			quantity,
			items,
			fixed_overhead: request.fixed_overhead,
			impact: params,
			max_batches,
			max_impact_per_unit: request.max_impact_per_unit,
		})
	}

	fn classical(&self, problem: &PartitionProblem) -> BatchPlan {
		problem.plan(1)
	}

	fn optimized(&self, problem: &PartitionProblem) -> BatchPlan {
		let plans: Vec<BatchPlan> = (1..=problem.max_batches).map(|k| problem.plan(k)).collect();

		// Strict comparison keeps the smaller k on ties
		let cheapest = |feasible_only: bool| {
			plans
				.iter()
				.filter(|p| !feasible_only || !p.tolerance_exceeded)
				.fold(None::<&BatchPlan>, |best, plan| match best {
					Some(current) if plan.cost() >= current.cost() => Some(current),
					_ => Some(plan),
				})
		};

		let mut chosen = match cheapest(true).or_else(|| cheapest(false)) {
			Some(plan) => plan.clone(),
			None => problem.plan(1),
		};
		chosen.batch_counts_evaluated = plans.len();

		if chosen.tolerance_exceeded {
			warn!(
				limit = ?problem.max_impact_per_unit,
				"No batch count meets the impact tolerance, using the cheapest"
			);
		}
		debug!(
			batches = chosen.batches(),
			cost = chosen.cost(),
			"Partition search finished"
		);
		chosen
	}

	fn compare(
		&self,
		problem: &PartitionProblem,
		classical: Timed<BatchPlan>,
		optimized: Timed<BatchPlan>,
	) -> Result<PartitionResponse> {
		let classical_plan = &classical.value;
		let optimized_plan = &optimized.value;
		// A plan within the impact tolerance always beats one that is not
		let optimized_better = match (
			classical_plan.tolerance_exceeded,
			optimized_plan.tolerance_exceeded,
		) {
			(true, false) => true,
			(false, true) => false,
			_ => optimized_plan.cost() < classical_plan.cost(),
		};
		let winner = Winner::optimized_if(optimized_better);

		let chosen = match winner {
			Winner::Optimized => optimized_plan,
			Winner::Classical => classical_plan,
		};
		let batches = chosen
			.amounts
			.iter()
			.zip(&chosen.item_ids)
			.enumerate()
			.map(|(index, (&amount, ids))| Batch {
				batch_index: index,
				amount,
				slot: index + 1,
				item_ids: ids.clone(),
			})
			.collect();

		Ok(PartitionResponse {
			batches,
			comparison: PartitionComparison {
				classical_batches: classical_plan.batches(),
				classical_cost: classical_plan.cost(),
				classical_impact: classical_plan.impact,
				classical_overhead: classical_plan.overhead,
				classical_time_ms: classical.elapsed_ms,
				optimized_batches: optimized_plan.batches(),
				optimized_cost: optimized_plan.cost(),
				optimized_impact: optimized_plan.impact,
				optimized_overhead: optimized_plan.overhead,
				optimized_time_ms: optimized.elapsed_ms,
				reduction_pct: reduction_pct(classical_plan.cost(), optimized_plan.cost()),
				overhead_increase_pct: improvement_pct(
					classical_plan.overhead,
					optimized_plan.overhead,
				),
				winner,
			},
			metrics: PartitionMetrics {
				quantity: problem.quantity,
				batch_counts_evaluated: optimized_plan.batch_counts_evaluated,
				tolerance_exceeded: chosen.tolerance_exceeded,
			},
		})
	}
}
