//! Multi-budget candidate selection.
//!
//! The classical selector walks candidates by ascending priority and takes
//! whatever still fits. The optimized selector maximizes total value: it runs
//! branch-and-bound on small instances and seeded simulated annealing on
//! large ones.

use crate::budget::{SearchBudget, StopReason};
use crate::reporter::{DualSolver, Timed};
use optimizer_config::SelectorConfig;
use optimizer_types::{
	improvement_pct, OptimizerError, ResourceMap, Result, SearchMethod, SelectionComparison,
	SelectionMetrics, SelectionRequest, SelectionResponse, SolverKind, StrategyStep, Winner,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Validated selection input with costs laid out per budgeted kind.
#[derive(Debug, Clone)]
pub struct SelectionProblem {
	ids: Vec<String>,
	values: Vec<f64>,
	priorities: Vec<f64>,
	kinds: Vec<String>,
	capacity: Vec<f64>,
	/// `costs[i][k]` is candidate `i`'s cost in `kinds[k]`.
	costs: Vec<Vec<f64>>,
	seed: u64,
}

impl SelectionProblem {
	fn len(&self) -> usize {
		self.ids.len()
	}

	fn fits(&self, usage: &[f64], candidate: usize) -> bool {
		self.first_overflow(usage, candidate).is_none()
	}

	/// First budgeted kind that `candidate` would push over capacity.
	fn first_overflow(&self, usage: &[f64], candidate: usize) -> Option<usize> {
		(0..self.kinds.len()).find(|&k| usage[k] + self.costs[candidate][k] > self.capacity[k])
	}

	fn add(&self, usage: &mut [f64], candidate: usize) {
		for (k, used) in usage.iter_mut().enumerate() {
			*used += self.costs[candidate][k];
		}
	}

	fn remove(&self, usage: &mut [f64], candidate: usize) {
		for (k, used) in usage.iter_mut().enumerate() {
			*used -= self.costs[candidate][k];
		}
	}

	fn feasible(&self, usage: &[f64]) -> bool {
		usage.iter().zip(&self.capacity).all(|(u, c)| u <= c)
	}

	/// Candidates worth searching: positive value and individually affordable.
	fn eligible(&self) -> Vec<usize> {
		let empty = vec![0.0; self.kinds.len()];
		(0..self.len())
			.filter(|&i| self.values[i] > 0.0 && self.fits(&empty, i))
			.collect()
	}

	/// Value over capacity-normalized cost, used to order the search.
	fn density(&self, candidate: usize) -> f64 {
		let weight: f64 = (0..self.kinds.len())
			.map(|k| {
				if self.capacity[k] > 0.0 {
					self.costs[candidate][k] / self.capacity[k]
				} else {
					0.0
				}
			})
			.sum();
		self.values[candidate] / weight.max(1e-12)
	}

	/// Eligible candidates by descending density, ties by input order.
	fn by_density(&self) -> Vec<usize> {
		let mut order = self.eligible();
		order.sort_by(|&a, &b| self.density(b).total_cmp(&self.density(a)));
		order
	}
}

/// A selection produced by one algorithm.
#[derive(Debug, Clone)]
pub struct SelectionOutcome {
	pub chosen: Vec<bool>,
	pub value: f64,
	pub usage: Vec<f64>,
	/// Candidates the classical scan skipped, with the kind that overflowed.
	pub skipped: Vec<(usize, usize)>,
	pub method: SearchMethod,
	pub search_steps: u64,
	pub timed_out: bool,
}

impl SelectionOutcome {
	fn from_chosen(problem: &SelectionProblem, chosen: Vec<bool>, method: SearchMethod) -> Self {
		let mut usage = vec![0.0; problem.kinds.len()];
		let mut value = 0.0;
		for (i, _) in chosen.iter().enumerate().filter(|(_, &c)| c) {
			problem.add(&mut usage, i);
			value += problem.values[i];
		}
		Self {
			chosen,
			value,
			usage,
			skipped: Vec::new(),
			method,
			search_steps: 0,
			timed_out: false,
		}
	}

	fn selected_ids(&self, problem: &SelectionProblem) -> Vec<String> {
		self.chosen
			.iter()
			.enumerate()
			.filter(|(_, &c)| c)
			.map(|(i, _)| problem.ids[i].clone())
			.collect()
	}

	fn usage_map(&self, problem: &SelectionProblem) -> ResourceMap {
		problem
			.kinds
			.iter()
			.cloned()
			.zip(self.usage.iter().copied())
			.collect()
	}
}

/// Greedy pass in density order; the starting point of both searches.
fn density_greedy(problem: &SelectionProblem, order: &[usize]) -> Vec<bool> {
	let mut chosen = vec![false; problem.len()];
	let mut usage = vec![0.0; problem.kinds.len()];
	for &i in order {
		if problem.fits(&usage, i) {
			problem.add(&mut usage, i);
			chosen[i] = true;
		}
	}
	chosen
}

/// Branch-and-bound state over the density-ordered candidates.
struct BranchAndBound<'a> {
	problem: &'a SelectionProblem,
	order: &'a [usize],
	/// Per kind, candidate positions in `order` by descending value per unit of that kind.
	ratio_orders: Vec<Vec<usize>>,
	budget: SearchBudget,
	best_value: f64,
	best: Vec<bool>,
	current: Vec<bool>,
	usage: Vec<f64>,
}

impl<'a> BranchAndBound<'a> {
	fn new(problem: &'a SelectionProblem, order: &'a [usize], budget: SearchBudget) -> Self {
		let ratio_orders = (0..problem.kinds.len())
			.map(|k| {
				let mut positions: Vec<usize> = (0..order.len()).collect();
				let ratio = |pos: usize| {
					let i = order[pos];
					let cost = problem.costs[i][k];
					if cost > 0.0 {
						problem.values[i] / cost
					} else {
						f64::INFINITY
					}
				};
				positions.sort_by(|&a, &b| ratio(b).total_cmp(&ratio(a)));
				positions
			})
			.collect();

		let incumbent = density_greedy(problem, order);
		let best_value = incumbent
			.iter()
			.enumerate()
			.filter(|(_, &c)| c)
			.map(|(i, _)| problem.values[i])
			.sum();

		Self {
			problem,
			order,
			ratio_orders,
			budget,
			best_value,
			best: incumbent,
			current: vec![false; problem.len()],
			usage: vec![0.0; problem.kinds.len()],
		}
	}

	/// Optimistic value reachable from position `depth` onward.
	fn bound(&self, depth: usize) -> f64 {
		let problem = self.problem;
		let remaining = || self.order[depth..].iter().copied();

		let mut bound: f64 = remaining()
			.filter(|&i| problem.fits(&self.usage, i))
			.map(|i| problem.values[i])
			.sum();

		for (k, positions) in self.ratio_orders.iter().enumerate() {
			let mut room = problem.capacity[k] - self.usage[k];
			let mut relaxed = 0.0;
			for &pos in positions {
				if pos < depth {
					continue;
				}
				let i = self.order[pos];
				if !problem.fits(&self.usage, i) {
					continue;
				}
				let cost = problem.costs[i][k];
				if cost <= room {
					relaxed += problem.values[i];
					room -= cost;
				} else {
					relaxed += problem.values[i] * room / cost;
					break;
				}
			}
			bound = bound.min(relaxed);
		}

		bound
	}

	fn search(&mut self, depth: usize, value: f64) {
		if self.budget.exhausted() {
			return;
		}
		self.budget.tick();

		if value > self.best_value {
			self.best_value = value;
			self.best = self.current.clone();
		}
		if depth == self.order.len() || value + self.bound(depth) <= self.best_value {
			return;
		}

		let candidate = self.order[depth];
		if self.problem.fits(&self.usage, candidate) {
			self.problem.add(&mut self.usage, candidate);
			self.current[candidate] = true;
			self.search(depth + 1, value + self.problem.values[candidate]);
			self.current[candidate] = false;
			self.problem.remove(&mut self.usage, candidate);
		}
		self.search(depth + 1, value);
	}
}

/// Annealing schedule.
#[derive(Debug, Clone, Copy)]
pub struct AnnealParams {
	pub iterations: u64,
	pub initial_temperature: f64,
	pub cooling_rate: f64,
	pub time_budget_ms: u64,
}

/// Seeded simulated annealing over selections.
///
/// Each move toggles one eligible candidate. Adding may overflow a budget, in
/// which case the lowest-density selected candidates are dropped until the
/// selection fits again. Moves are accepted by the Metropolis criterion.
pub fn anneal<R: Rng + ?Sized>(
	problem: &SelectionProblem,
	params: AnnealParams,
	rng: &mut R,
) -> SelectionOutcome {
	let order = problem.by_density();
	let mut current = density_greedy(problem, &order);
	let mut usage = vec![0.0; problem.kinds.len()];
	let mut value = 0.0;
	for i in (0..problem.len()).filter(|&i| current[i]) {
		problem.add(&mut usage, i);
		value += problem.values[i];
	}

	let mut best = current.clone();
	let mut best_value = value;
	let mut budget = SearchBudget::from_millis(params.iterations, params.time_budget_ms);

	if order.is_empty() {
		return SelectionOutcome::from_chosen(problem, best, SearchMethod::SimulatedAnnealing);
	}

	let mean_value = order.iter().map(|&i| problem.values[i]).sum::<f64>() / order.len() as f64;
	let mut temperature = params.initial_temperature * mean_value.max(f64::MIN_POSITIVE);

	while !budget.exhausted() {
		budget.tick();

		let pick = order[rng.gen_range(0..order.len())];
		let mut next = current.clone();
		let mut next_usage = usage.clone();
		let mut next_value = value;

		if next[pick] {
			next[pick] = false;
			problem.remove(&mut next_usage, pick);
			next_value -= problem.values[pick];
		} else {
			next[pick] = true;
			problem.add(&mut next_usage, pick);
			next_value += problem.values[pick];

			// Repair: drop the weakest other selections until feasible
			for &drop in order.iter().rev() {
				if problem.feasible(&next_usage) {
					break;
				}
				if drop != pick && next[drop] {
					next[drop] = false;
					problem.remove(&mut next_usage, drop);
					next_value -= problem.values[drop];
				}
			}
			if !problem.feasible(&next_usage) {
				temperature *= params.cooling_rate;
				continue;
			}
		}

		let delta = next_value - value;
		let accept = delta >= 0.0 || rng.gen::<f64>() < (delta / temperature).exp();
		if accept {
			current = next;
			usage = next_usage;
			value = next_value;
			if value > best_value {
				best_value = value;
				best = current.clone();
			}
		}

		temperature *= params.cooling_rate;
	}

	let mut outcome = SelectionOutcome::from_chosen(problem, best, SearchMethod::SimulatedAnnealing);
	outcome.search_steps = budget.steps();
	outcome.timed_out = budget.stop_reason() == Some(StopReason::Deadline);
	outcome
}

pub struct Selector {
	config: SelectorConfig,
}

impl Selector {
	pub fn new(config: SelectorConfig) -> Self {
		Self { config }
	}

	fn branch_and_bound(&self, problem: &SelectionProblem) -> SelectionOutcome {
		let order = problem.by_density();
		let budget = SearchBudget::from_millis(self.config.node_budget, self.config.time_budget_ms);
		let mut search = BranchAndBound::new(problem, &order, budget);
		search.search(0, 0.0);

		let timed_out = search.budget.stop_reason().is_some();
		if timed_out {
			warn!(
				nodes = search.budget.steps(),
				"Branch-and-bound budget exhausted, returning best found so far"
			);
		}

		let mut outcome =
			SelectionOutcome::from_chosen(problem, search.best, SearchMethod::BranchAndBound);
		outcome.search_steps = search.budget.steps();
		outcome.timed_out = timed_out;
		outcome
	}
}

impl DualSolver for Selector {
	type Request = SelectionRequest;
	type Problem = SelectionProblem;
	type Outcome = SelectionOutcome;
	type Response = SelectionResponse;

	const KIND: SolverKind = SolverKind::Selector;

	fn validate(&self, request: &SelectionRequest) -> Result<SelectionProblem> {
		if request.candidates.is_empty() {
			return Err(OptimizerError::invalid("candidate list is empty"));
		}

		for (kind, &capacity) in &request.budgets {
			if !(capacity.is_finite() && capacity >= 0.0) {
				return Err(OptimizerError::invalid(format!(
					"budget for {} must be a non-negative number",
					kind
				)));
			}
		}

		let mut seen = HashSet::new();
		for candidate in &request.candidates {
			if candidate.id.is_empty() {
				return Err(OptimizerError::invalid("candidate id is empty"));
			}
			if !seen.insert(candidate.id.as_str()) {
				return Err(OptimizerError::invalid(format!(
					"duplicate candidate id {}",
					candidate.id
				)));
			}
			if !candidate.value.is_finite() || !candidate.priority.is_finite() {
				return Err(OptimizerError::invalid(format!(
					"candidate {} has a non-finite value or priority",
					candidate.id
				)));
			}
			if let Some((kind, _)) = candidate
				.costs
				.iter()
				.find(|(_, &cost)| !(cost.is_finite() && cost >= 0.0))
			{
				return Err(OptimizerError::invalid(format!(
					"candidate {} has an invalid {} cost",
					candidate.id, kind
				)));
			}
		}

		let kinds: Vec<String> = request.budgets.keys().cloned().collect();
		Ok(SelectionProblem {
			ids: request.candidates.iter().map(|c| c.id.clone()).collect(),
			values: request.candidates.iter().map(|c| c.value).collect(),
			priorities: request.candidates.iter().map(|c| c.priority).collect(),
			capacity: request.budgets.values().copied().collect(),
			costs: request
				.candidates
				.iter()
				.map(|c| kinds.iter().map(|k| c.cost(k)).collect())
				.collect(),
			kinds,
			seed: request.seed.unwrap_or(self.config.seed),
		})
	}

	fn classical(&self, problem: &SelectionProblem) -> SelectionOutcome {
		let mut order: Vec<usize> = (0..problem.len()).collect();
		order.sort_by(|&a, &b| problem.priorities[a].total_cmp(&problem.priorities[b]));

		let mut chosen = vec![false; problem.len()];
		let mut usage = vec![0.0; problem.kinds.len()];
		let mut skipped = Vec::new();
		for i in order {
			match problem.first_overflow(&usage, i) {
				None => {
					problem.add(&mut usage, i);
					chosen[i] = true;
				}
				Some(kind) => skipped.push((i, kind)),
			}
		}

		let mut outcome = SelectionOutcome::from_chosen(problem, chosen, SearchMethod::PriorityScan);
		outcome.skipped = skipped;
		outcome.search_steps = problem.len() as u64;
		outcome
	}

	fn optimized(&self, problem: &SelectionProblem) -> SelectionOutcome {
		if problem.len() <= self.config.exact_limit {
			self.branch_and_bound(problem)
		} else {
			debug!(
				candidates = problem.len(),
				seed = problem.seed,
				"Using simulated annealing"
			);
			let mut rng = StdRng::seed_from_u64(problem.seed);
			anneal(
				problem,
				AnnealParams {
					iterations: self.config.anneal_iterations,
					initial_temperature: self.config.initial_temperature,
					cooling_rate: self.config.cooling_rate,
					time_budget_ms: self.config.time_budget_ms,
				},
				&mut rng,
			)
		}
	}

	fn compare(
		&self,
		problem: &SelectionProblem,
		classical: Timed<SelectionOutcome>,
		optimized: Timed<SelectionOutcome>,
	) -> Result<SelectionResponse> {
		let classical_outcome = &classical.value;
		let optimized_outcome = &optimized.value;
		let winner = Winner::optimized_if(optimized_outcome.value > classical_outcome.value);

		let classical_selected = classical_outcome.selected_ids(problem);
		let optimized_selected = optimized_outcome.selected_ids(problem);
		let improvement = if classical_selected == optimized_selected {
			0.0
		} else {
			improvement_pct(classical_outcome.value, optimized_outcome.value)
		};

		let violation = classical_outcome
			.skipped
			.iter()
			.find(|(i, _)| optimized_outcome.chosen[*i])
			.map(|&(_, kind)| problem.kinds[kind].clone());

		let chosen = match winner {
			Winner::Optimized => optimized_outcome,
			Winner::Classical => classical_outcome,
		};

		let mut execution: Vec<usize> = (0..problem.len()).filter(|&i| chosen.chosen[i]).collect();
		execution.sort_by(|&a, &b| problem.values[b].total_cmp(&problem.values[a]));
		let strategy = execution
			.iter()
			.enumerate()
			.map(|(position, &i)| StrategyStep {
				candidate_id: problem.ids[i].clone(),
				priority: position + 1,
			})
			.collect();

		Ok(SelectionResponse {
			selected: chosen.selected_ids(problem),
			recovered_value: chosen.value,
			resource_usage: chosen.usage_map(problem),
			strategy,
			comparison: SelectionComparison {
				classical_value: classical_outcome.value,
				classical_usage: classical_outcome.usage_map(problem),
				classical_selected,
				classical_time_ms: classical.elapsed_ms,
				optimized_value: optimized_outcome.value,
				optimized_usage: optimized_outcome.usage_map(problem),
				optimized_selected,
				optimized_time_ms: optimized.elapsed_ms,
				improvement_pct: improvement,
				winner,
				classical_constraint_violation: violation,
			},
			metrics: SelectionMetrics {
				method: optimized_outcome.method,
				candidates_evaluated: problem.len(),
				constraints_checked: problem.kinds.len(),
				search_steps: optimized_outcome.search_steps,
				timed_out: optimized_outcome.timed_out,
			},
		})
	}
}
