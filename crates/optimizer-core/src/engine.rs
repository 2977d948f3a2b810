//! Engine facade owning the configuration and every solver.

use crate::partitioner::Partitioner;
use crate::path_search::PathSearch;
use crate::reporter::run_comparison;
use crate::scheduler::Scheduler;
use crate::scorer::Scorer;
use crate::selector::Selector;
use optimizer_config::EngineConfig;
use optimizer_types::{
	EngineRequest, EngineResponse, PartitionRequest, PartitionResponse, PathSearchRequest,
	PathSearchResponse, Result, ScheduleRequest, ScheduleResponse, ScoringRequest,
	ScoringResponse, SelectionRequest, SelectionResponse,
};
use tracing::{info, instrument, warn};

/// Stateless entry point for all solvers.
///
/// Holds only read-only configuration, so one engine can be shared across
/// threads behind an `Arc` and called concurrently.
pub struct OptimizationEngine {
	config: EngineConfig,
	path_search: PathSearch,
	scheduler: Scheduler,
	selector: Selector,
	partitioner: Partitioner,
	scorer: Scorer,
}

impl OptimizationEngine {
	pub fn new(config: EngineConfig) -> Self {
		Self {
			path_search: PathSearch::new(config.path_search.clone()),
			scheduler: Scheduler::new(config.scheduler.clone()),
			selector: Selector::new(config.selector.clone()),
			partitioner: Partitioner::new(config.partitioner.clone()),
			scorer: Scorer::new(config.scorer.clone()),
			config,
		}
	}

	pub fn config(&self) -> &EngineConfig {
		&self.config
	}

	#[instrument(skip_all, fields(pools = request.pools.len(), source = %request.source_asset))]
	pub fn find_path(&self, request: &PathSearchRequest) -> Result<PathSearchResponse> {
		let response = run_comparison(&self.path_search, request)?;
		info!(
			hops = response.hops,
			paths_evaluated = response.paths_evaluated,
			winner = %response.comparison.winner,
			"Path search complete"
		);
		Ok(response)
	}

	#[instrument(skip_all, fields(tasks = request.tasks.len()))]
	pub fn schedule(&self, request: &ScheduleRequest) -> Result<ScheduleResponse> {
		let response = run_comparison(&self.scheduler, request)?;
		info!(
			slots = response.total_slots,
			conflicts = response.total_conflicts,
			winner = %response.comparison.winner,
			"Scheduling complete"
		);
		Ok(response)
	}

	#[instrument(skip_all, fields(candidates = request.candidates.len()))]
	pub fn select(&self, request: &SelectionRequest) -> Result<SelectionResponse> {
		let response = run_comparison(&self.selector, request)?;
		if let Some(kind) = &response.comparison.classical_constraint_violation {
			warn!(kind = %kind, "Priority order skipped candidates on a tight budget");
		}
		info!(
			selected = response.selected.len(),
			value = response.recovered_value,
			winner = %response.comparison.winner,
			"Selection complete"
		);
		Ok(response)
	}

	#[instrument(skip_all, fields(max_batches = request.max_batches))]
	pub fn partition(&self, request: &PartitionRequest) -> Result<PartitionResponse> {
		let response = run_comparison(&self.partitioner, request)?;
		info!(
			batches = response.batches.len(),
			reduction_pct = response.comparison.reduction_pct,
			winner = %response.comparison.winner,
			"Partitioning complete"
		);
		Ok(response)
	}

	#[instrument(skip_all, fields(candidates = request.candidates.len()))]
	pub fn score(&self, request: &ScoringRequest) -> Result<ScoringResponse> {
		let response = run_comparison(&self.scorer, request)?;
		info!(
			displacement = response.comparison.rank_displacement,
			winner = %response.comparison.winner,
			"Scoring complete"
		);
		Ok(response)
	}

	/// Dispatch an enveloped request to its solver.
	pub fn solve(&self, request: &EngineRequest) -> Result<EngineResponse> {
		match request {
			EngineRequest::PathSearch(r) => self.find_path(r).map(EngineResponse::PathSearch),
			EngineRequest::Scheduler(r) => self.schedule(r).map(EngineResponse::Scheduler),
			EngineRequest::Selector(r) => self.select(r).map(EngineResponse::Selector),
			EngineRequest::Partitioner(r) => self.partition(r).map(EngineResponse::Partitioner),
			EngineRequest::Scorer(r) => self.score(r).map(EngineResponse::Scorer),
		}
	}
}

impl Default for OptimizationEngine {
	fn default() -> Self {
		Self::new(EngineConfig::default())
	}
}
