//! Best-output route search over a pool graph.
//!
//! The classical search only looks at direct pools and two-hop bridges. The
//! optimized search enumerates every simple path up to the hop limit with a
//! depth-first walk, visiting neighbours in ascending pool id order.

use crate::budget::SearchBudget;
use crate::pricing::{price_route, validate_pool};
use crate::reporter::{DualSolver, Timed};
use optimizer_config::PathSearchConfig;
use optimizer_types::{
	improvement_pct, OptimizerError, PathComparison, PathQuote, PathSearchMetrics,
	PathSearchRequest, PathSearchResponse, Pool, Result, SolverKind, Winner,
};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::{debug, warn};

/// Validated path search input.
#[derive(Debug, Clone)]
pub struct PathProblem {
	/// Pools sorted by id.
	pools: Vec<Pool>,
	/// Pool indices per asset, ascending by pool id.
	adjacency: BTreeMap<String, Vec<usize>>,
	source: String,
	destinations: Vec<String>,
	amount_in: f64,
	max_hops: usize,
}

impl PathProblem {
	fn destination_label(&self) -> String {
		self.destinations.join("|")
	}

	fn neighbours(&self, asset: &str) -> &[usize] {
		self.adjacency.get(asset).map(Vec::as_slice).unwrap_or(&[])
	}
}

#[derive(Debug, Clone, Default)]
pub struct PathOutcome {
	pub best: Option<PathQuote>,
	pub paths_evaluated: u64,
	pub timed_out: bool,
}

impl PathOutcome {
	fn output(&self) -> f64 {
		self.best.as_ref().map(|q| q.output_amount).unwrap_or(0.0)
	}
}

/// Keep `candidate` if it beats `best`: more output, then fewer hops.
fn offer(best: &mut Option<PathQuote>, candidate: PathQuote) {
	let better = match best {
		None => true,
		Some(current) => {
			candidate.output_amount > current.output_amount
				|| (candidate.output_amount == current.output_amount
					&& candidate.hops() < current.hops())
		}
	};
	if better {
		*best = Some(candidate);
	}
}

pub struct PathSearch {
	config: PathSearchConfig,
}

impl PathSearch {
	pub fn new(config: PathSearchConfig) -> Self {
		Self { config }
	}

	fn classical_to(&self, problem: &PathProblem, destination: &str) -> Option<PathQuote> {
		let source = problem.source.as_str();
		let mut best = None;

		// Direct pools first so that a tie favours the single hop
		for &index in problem.neighbours(source) {
			if problem.pools[index].other_side(source).map(String::as_str) == Some(destination) {
				if let Ok(quote) =
					price_route(&problem.pools, &[source, destination], &[index], problem.amount_in)
				{
					offer(&mut best, quote);
				}
			}
		}

		// Bridges are two hops; a one-hop limit binds the baseline too
		if problem.max_hops < 2 {
			return best;
		}

		for &first in problem.neighbours(source) {
			let Some(middle) = problem.pools[first].other_side(source) else {
				continue;
			};
			let middle = middle.as_str();
			if middle == destination || middle == source {
				continue;
			}
			for &second in problem.neighbours(middle) {
				if problem.pools[second].other_side(middle).map(String::as_str) != Some(destination) {
					continue;
				}
				if let Ok(quote) = price_route(
					&problem.pools,
					&[source, middle, destination],
					&[first, second],
					problem.amount_in,
				) {
					offer(&mut best, quote);
				}
			}
		}

		best
	}

	fn walk<'p>(
		problem: &'p PathProblem,
		destination: &str,
		assets: &mut Vec<&'p str>,
		route: &mut Vec<usize>,
		best: &mut Option<PathQuote>,
		evaluated: &mut u64,
		budget: &mut SearchBudget,
	) {
		let Some(&current) = assets.last() else {
			return;
		};

		for &index in problem.neighbours(current) {
			if budget.exhausted() {
				return;
			}
			let Some(next) = problem.pools[index].other_side(current) else {
				continue;
			};
			let next = next.as_str();
			if assets.contains(&next) {
				continue;
			}

			assets.push(next);
			route.push(index);

			if next == destination {
				budget.tick();
				*evaluated += 1;
				if let Ok(quote) = price_route(&problem.pools, assets, route, problem.amount_in) {
					offer(best, quote);
				}
			} else if route.len() < problem.max_hops {
				Self::walk(problem, destination, assets, route, best, evaluated, budget);
			}

			assets.pop();
			route.pop();
		}
	}
}

/// Best quote per destination, ties going to the earlier destination.
fn best_over_destinations(quotes: Vec<Option<PathQuote>>) -> Option<PathQuote> {
	let mut best: Option<PathQuote> = None;
	for quote in quotes.into_iter().flatten() {
		let better = best
			.as_ref()
			.map_or(true, |current| quote.output_amount > current.output_amount);
		if better {
			best = Some(quote);
		}
	}
	best
}

impl DualSolver for PathSearch {
	type Request = PathSearchRequest;
	type Problem = PathProblem;
	type Outcome = PathOutcome;
	type Response = PathSearchResponse;

	const KIND: SolverKind = SolverKind::PathSearch;

	fn validate(&self, request: &PathSearchRequest) -> Result<PathProblem> {
		if request.source_asset.is_empty() {
			return Err(OptimizerError::invalid("sourceAsset is empty"));
		}
		if !(request.amount_in.is_finite() && request.amount_in > 0.0) {
			return Err(OptimizerError::ZeroInput);
		}

		let mut destinations: Vec<String> = Vec::new();
		if let Some(dest) = &request.dest_asset {
			destinations.push(dest.clone());
		}
		for dest in &request.dest_assets {
			if !destinations.contains(dest) {
				destinations.push(dest.clone());
			}
		}
		if destinations.is_empty() {
			return Err(OptimizerError::invalid("destAsset or destAssets is required"));
		}
		if destinations.iter().any(|d| d.is_empty() || *d == request.source_asset) {
			return Err(OptimizerError::invalid(
				"destination must be a non-empty asset other than the source",
			));
		}

		let requested = request.max_hops.unwrap_or(self.config.default_max_hops);
		if requested == 0 {
			return Err(OptimizerError::invalid("maxHops must be at least 1"));
		}
		let max_hops = if requested > self.config.max_hops_cap {
			warn!(
				requested,
				cap = self.config.max_hops_cap,
				"maxHops above the configured cap, clamping"
			);
			self.config.max_hops_cap
		} else {
			requested
		};

		let mut ids = HashSet::new();
		for pool in &request.pools {
			validate_pool(pool)?;
			if !ids.insert(pool.id.as_str()) {
				return Err(OptimizerError::InvalidPool {
					pool: pool.id.clone(),
					reason: "duplicate pool id".to_string(),
				});
			}
		}

		let mut pools = request.pools.clone();
		pools.sort_by(|a, b| a.id.cmp(&b.id));

		let mut adjacency: BTreeMap<String, Vec<usize>> = BTreeMap::new();
		for (index, pool) in pools.iter().enumerate() {
			adjacency.entry(pool.asset_a.clone()).or_default().push(index);
			adjacency.entry(pool.asset_b.clone()).or_default().push(index);
		}

		Ok(PathProblem {
			pools,
			adjacency,
			source: request.source_asset.clone(),
			destinations,
			amount_in: request.amount_in,
			max_hops,
		})
	}

	fn classical(&self, problem: &PathProblem) -> PathOutcome {
		let quotes = problem
			.destinations
			.iter()
			.map(|dest| self.classical_to(problem, dest))
			.collect();

		PathOutcome {
			best: best_over_destinations(quotes),
			paths_evaluated: 0,
			timed_out: false,
		}
	}

	fn optimized(&self, problem: &PathProblem) -> PathOutcome {
		let mut budget =
			SearchBudget::from_millis(self.config.max_paths, self.config.time_budget_ms);
		let mut evaluated = 0u64;
		let mut quotes = Vec::with_capacity(problem.destinations.len());

		for destination in &problem.destinations {
			let mut best = None;
			let mut assets = vec![problem.source.as_str()];
			let mut route = Vec::new();
			Self::walk(
				problem,
				destination,
				&mut assets,
				&mut route,
				&mut best,
				&mut evaluated,
				&mut budget,
			);
			quotes.push(best);
		}

		let timed_out = budget.stop_reason().is_some();
		if timed_out {
			warn!(
				paths_evaluated = evaluated,
				reason = ?budget.stop_reason(),
				"Path search budget exhausted, returning best found so far"
			);
		}
		debug!(paths_evaluated = evaluated, "Exhaustive path search finished");

		PathOutcome {
			best: best_over_destinations(quotes),
			paths_evaluated: evaluated,
			timed_out,
		}
	}

	fn compare(
		&self,
		problem: &PathProblem,
		classical: Timed<PathOutcome>,
		optimized: Timed<PathOutcome>,
	) -> Result<PathSearchResponse> {
		let classical_output = classical.value.output();
		let optimized_output = optimized.value.output();
		let winner = Winner::optimized_if(optimized_output > classical_output);

		let classical_path = classical
			.value
			.best
			.as_ref()
			.map(|q| q.path.clone())
			.unwrap_or_default();
		let optimized_path = optimized
			.value
			.best
			.as_ref()
			.map(|q| q.path.clone())
			.unwrap_or_default();

		let improvement = if classical_path == optimized_path {
			0.0
		} else {
			improvement_pct(classical_output, optimized_output)
		};

		let (preferred, fallback) = match winner {
			Winner::Optimized => (&optimized.value.best, &classical.value.best),
			Winner::Classical => (&classical.value.best, &optimized.value.best),
		};
		let chosen = preferred
			.as_ref()
			.or(fallback.as_ref())
			.cloned()
			.ok_or_else(|| OptimizerError::NoPathFound {
				origin: problem.source.clone(),
				destination: problem.destination_label(),
				max_hops: problem.max_hops,
			})?;

		let assets: BTreeSet<&str> = problem
			.pools
			.iter()
			.flat_map(|p| [p.asset_a.as_str(), p.asset_b.as_str()])
			.collect();

		Ok(PathSearchResponse {
			hops: chosen.hops(),
			output_amount: chosen.output_amount,
			optimal_path: chosen.path,
			legs: chosen.legs,
			comparison: PathComparison {
				classical_path,
				classical_output,
				classical_time_ms: classical.elapsed_ms,
				optimized_path,
				optimized_output,
				optimized_time_ms: optimized.elapsed_ms,
				improvement_pct: improvement,
				winner,
			},
			paths_evaluated: optimized.value.paths_evaluated,
			metrics: PathSearchMetrics {
				assets: assets.len(),
				pools: problem.pools.len(),
				max_hops: problem.max_hops,
				timed_out: optimized.value.timed_out,
			},
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::reporter::run_comparison;

	fn search() -> PathSearch {
		PathSearch::new(PathSearchConfig::default())
	}

	fn triangle_without_direct() -> Vec<Pool> {
		vec![
			Pool::new("ab", "A", "B", 10_000.0, 4_000.0, 30),
			Pool::new("bc", "B", "C", 4_000.0, 8_000.0, 30),
		]
	}

	/// Ladder where the three-hop route beats every route of two hops or fewer.
	fn ladder() -> Vec<Pool> {
		vec![
			Pool::new("p1", "A", "B", 10_000.0, 10_000.0, 30),
			Pool::new("p2", "B", "C", 10_000.0, 10_000.0, 30),
			Pool::new("p3", "C", "D", 10_000.0, 10_000.0, 30),
			Pool::new("p4", "A", "D", 10_000.0, 1_000.0, 30),
			Pool::new("p5", "A", "E", 10_000.0, 10_000.0, 30),
			Pool::new("p6", "E", "D", 10_000.0, 2_000.0, 30),
		]
	}

	#[test]
	fn test_two_hop_tie_goes_to_classical() {
		let request = PathSearchRequest::new(triangle_without_direct(), "A", "C", 1_000.0);
		let response = run_comparison(&search(), &request).unwrap();

		assert_eq!(response.optimal_path, vec!["A", "B", "C"]);
		assert_eq!(response.comparison.winner, Winner::Classical);
		assert_eq!(response.comparison.improvement_pct, 0.0);
		assert_eq!(response.comparison.classical_output, response.comparison.optimized_output);
		assert_eq!(response.hops, 2);
		assert_eq!(response.paths_evaluated, 1);
		assert_eq!(response.legs.len(), 2);
	}

	#[test]
	fn test_exhaustive_search_finds_longer_route() {
		let request = PathSearchRequest::new(ladder(), "A", "D", 100.0);
		let response = run_comparison(&search(), &request).unwrap();

		assert_eq!(response.comparison.classical_path, vec!["A", "E", "D"]);
		assert_eq!(response.paths_evaluated, 3);
		assert_eq!(response.optimal_path, vec!["A", "B", "C", "D"]);
		assert_eq!(response.comparison.winner, Winner::Optimized);
		assert!(response.comparison.optimized_output > response.comparison.classical_output);
		assert!(response.comparison.improvement_pct > 0.0);
		assert!(!response.metrics.timed_out);
	}

	#[test]
	fn test_classical_never_goes_beyond_two_hops() {
		let request = PathSearchRequest::new(ladder(), "A", "D", 100.0).with_max_hops(2);
		let response = run_comparison(&search(), &request).unwrap();
		assert_eq!(response.comparison.winner, Winner::Classical);
		assert_eq!(response.comparison.optimized_path, response.comparison.classical_path);

		let only_long = vec![
			Pool::new("p1", "A", "B", 1_000.0, 1_000.0, 30),
			Pool::new("p2", "B", "C", 1_000.0, 1_000.0, 30),
			Pool::new("p3", "C", "D", 1_000.0, 1_000.0, 30),
		];
		let request = PathSearchRequest::new(only_long, "A", "D", 10.0);
		let response = run_comparison(&search(), &request).unwrap();
		assert!(response.comparison.classical_path.is_empty());
		assert_eq!(response.comparison.classical_output, 0.0);
		assert_eq!(response.comparison.improvement_pct, 0.0);
		assert_eq!(response.comparison.winner, Winner::Optimized);
		assert_eq!(response.hops, 3);
	}

	#[test]
	fn test_single_hop_limit_applies_to_both_searches() {
		let pools = vec![
			Pool::new("ab", "A", "B", 10_000.0, 10_000.0, 30),
			Pool::new("ac", "A", "C", 100.0, 100.0, 30),
			Pool::new("bc", "B", "C", 10_000.0, 10_000.0, 30),
		];
		let request = PathSearchRequest::new(pools, "A", "C", 1_000.0).with_max_hops(1);
		let response = run_comparison(&search(), &request).unwrap();

		assert_eq!(response.comparison.classical_path, vec!["A", "C"]);
		assert_eq!(response.comparison.optimized_path, vec!["A", "C"]);
		assert!(response.comparison.optimized_output >= response.comparison.classical_output);
		assert_eq!(response.hops, 1);
		assert_eq!(response.metrics.max_hops, 1);

		let only_bridge = PathSearchRequest::new(triangle_without_direct(), "A", "C", 1_000.0)
			.with_max_hops(1);
		let err = run_comparison(&search(), &only_bridge).unwrap_err();
		assert!(matches!(err, OptimizerError::NoPathFound { max_hops: 1, .. }));
	}

	#[test]
	fn test_no_path_found() {
		let pools = vec![
			Pool::new("ab", "A", "B", 1_000.0, 1_000.0, 30),
			Pool::new("cd", "C", "D", 1_000.0, 1_000.0, 30),
		];
		let request = PathSearchRequest::new(pools, "A", "D", 10.0);
		let err = run_comparison(&search(), &request).unwrap_err();
		assert!(matches!(err, OptimizerError::NoPathFound { max_hops: 3, .. }));
	}

	#[test]
	fn test_request_validation() {
		let request = PathSearchRequest::new(triangle_without_direct(), "A", "C", 0.0);
		assert_eq!(search().validate(&request).unwrap_err(), OptimizerError::ZeroInput);

		let mut pools = triangle_without_direct();
		pools[0].reserve_b = -1.0;
		let request = PathSearchRequest::new(pools, "A", "C", 1.0);
		assert!(matches!(
			search().validate(&request),
			Err(OptimizerError::InvalidPool { .. })
		));

		let mut pools = triangle_without_direct();
		pools[1].id = "ab".to_string();
		let request = PathSearchRequest::new(pools, "A", "C", 1.0);
		assert!(search().validate(&request).is_err());

		let request = PathSearchRequest::new(triangle_without_direct(), "A", "A", 1.0);
		assert!(matches!(
			search().validate(&request),
			Err(OptimizerError::InvalidInput(_))
		));

		let request = PathSearchRequest::new(triangle_without_direct(), "A", "C", 1.0).with_max_hops(0);
		assert!(search().validate(&request).is_err());
	}

	#[test]
	fn test_max_hops_clamped_to_cap() {
		let request = PathSearchRequest::new(ladder(), "A", "D", 100.0).with_max_hops(50);
		let problem = search().validate(&request).unwrap();
		assert_eq!(problem.max_hops, 5);
	}

	#[test]
	fn test_pools_are_not_mutated_and_results_repeat() {
		let request = PathSearchRequest::new(ladder(), "A", "D", 100.0);
		let before = request.clone();
		let first = run_comparison(&search(), &request).unwrap();
		let second = run_comparison(&search(), &request).unwrap();

		assert_eq!(request, before);
		assert_eq!(first.optimal_path, second.optimal_path);
		assert_eq!(first.output_amount, second.output_amount);
		assert_eq!(first.paths_evaluated, second.paths_evaluated);
	}

	#[test]
	fn test_direct_pool_beats_deep_bridge() {
		let pools = vec![
			Pool::new("a1", "A", "B", 1_000.0, 1_000.0, 0),
			Pool::new("a2", "A", "C", 1_000.0, 1_000.0, 0),
			Pool::new("a3", "B", "C", 1e12, 1e12, 0),
		];
		let request = PathSearchRequest::new(pools, "A", "C", 10.0);
		let problem = search().validate(&request).unwrap();
		let outcome = search().optimized(&problem);
		let best = outcome.best.unwrap();
		// The bridge through the deep B-C pool loses only a rounding error
		assert_eq!(best.path, vec!["A", "C"]);
		assert_eq!(outcome.paths_evaluated, 2);
	}

	#[test]
	fn test_hedge_destinations() {
		let pools = vec![
			Pool::new("ab", "A", "B", 1_000.0, 1_000.0, 30),
			Pool::new("ac", "A", "C", 1_000.0, 3_000.0, 30),
		];
		let request = PathSearchRequest::new(pools, "A", "B", 10.0)
			.with_destinations(vec!["B".to_string(), "C".to_string()]);
		let response = run_comparison(&search(), &request).unwrap();
		assert_eq!(response.optimal_path, vec!["A", "C"]);
		assert_eq!(response.comparison.classical_path, vec!["A", "C"]);
		assert_eq!(response.comparison.winner, Winner::Classical);
	}

	#[test]
	fn test_path_budget_sets_timed_out() {
		let config = PathSearchConfig {
			max_paths: 1,
			..PathSearchConfig::default()
		};
		let request = PathSearchRequest::new(ladder(), "A", "D", 100.0);
		let response = run_comparison(&PathSearch::new(config), &request).unwrap();
		assert!(response.metrics.timed_out);
		assert_eq!(response.paths_evaluated, 1);
		assert!(!response.optimal_path.is_empty());
	}
}
