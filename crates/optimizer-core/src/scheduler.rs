//! Conflict-free slot scheduling.
//!
//! Tasks become nodes of a conflict graph; a schedule is a proper coloring
//! of that graph where each color is an execution slot.

use crate::reporter::{DualSolver, Timed};
use optimizer_config::SchedulerConfig;
use optimizer_types::{
	reduction_pct, OptimizerError, Result, ScheduleComparison, ScheduleMetrics, ScheduleRequest,
	ScheduleResponse, SlotAssignment, SolverKind, Task, Winner,
};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Symmetric 0/1 adjacency matrix of a conflict graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictGraph {
	matrix: Vec<Vec<u8>>,
}

impl ConflictGraph {
	/// Pairwise conflict checks over all task pairs.
	pub fn from_tasks(tasks: &[Task]) -> Self {
		let n = tasks.len();
		let mut matrix = vec![vec![0u8; n]; n];
		for i in 0..n {
			for j in (i + 1)..n {
				if tasks[i].conflicts_with(&tasks[j]) {
					matrix[i][j] = 1;
					matrix[j][i] = 1;
				}
			}
		}
		Self { matrix }
	}

	/// Adopt a caller-supplied matrix after checking its shape.
	pub fn from_matrix(matrix: Vec<Vec<u8>>, n: usize) -> Result<Self> {
		if matrix.len() != n || matrix.iter().any(|row| row.len() != n) {
			return Err(OptimizerError::invalid(format!(
				"conflictMatrix must be {n}x{n}"
			)));
		}
		for i in 0..n {
			if matrix[i][i] != 0 {
				return Err(OptimizerError::invalid(
					"conflictMatrix diagonal must be zero",
				));
			}
			for j in 0..n {
				if matrix[i][j] > 1 {
					return Err(OptimizerError::invalid("conflictMatrix entries must be 0 or 1"));
				}
				if matrix[i][j] != matrix[j][i] {
					return Err(OptimizerError::invalid("conflictMatrix must be symmetric"));
				}
			}
		}
		Ok(Self { matrix })
	}

	pub fn len(&self) -> usize {
		self.matrix.len()
	}

	pub fn is_empty(&self) -> bool {
		self.matrix.is_empty()
	}

	pub fn conflicts(&self, i: usize, j: usize) -> bool {
		self.matrix[i][j] == 1
	}

	pub fn degree(&self, i: usize) -> usize {
		self.matrix[i].iter().filter(|&&v| v == 1).count()
	}

	pub fn edge_count(&self) -> usize {
		(0..self.len()).map(|i| self.degree(i)).sum::<usize>() / 2
	}

	pub fn max_degree(&self) -> usize {
		(0..self.len()).map(|i| self.degree(i)).max().unwrap_or(0)
	}

	/// Conflicting pairs that share a slot under `slots`.
	pub fn violations(&self, slots: &[u32]) -> usize {
		let n = self.len();
		let mut count = 0;
		for i in 0..n {
			for j in (i + 1)..n {
				if self.conflicts(i, j) && slots[i] == slots[j] {
					count += 1;
				}
			}
		}
		count
	}

	pub fn into_matrix(self) -> Vec<Vec<u8>> {
		self.matrix
	}
}

#[derive(Debug, Clone)]
pub struct ScheduleProblem {
	ids: Vec<String>,
	graph: ConflictGraph,
}

/// Slot (1-based) of each task, by input index.
pub type Coloring = Vec<u32>;

fn slot_count(coloring: &Coloring) -> usize {
	coloring.iter().copied().max().unwrap_or(0) as usize
}

pub struct Scheduler {
	config: SchedulerConfig,
}

impl Scheduler {
	pub fn new(config: SchedulerConfig) -> Self {
		Self { config }
	}
}

impl DualSolver for Scheduler {
	type Request = ScheduleRequest;
	type Problem = ScheduleProblem;
	type Outcome = Coloring;
	type Response = ScheduleResponse;

	const KIND: SolverKind = SolverKind::Scheduler;

	fn validate(&self, request: &ScheduleRequest) -> Result<ScheduleProblem> {
		let n = request.tasks.len();
		if n > self.config.max_tasks {
			return Err(OptimizerError::invalid(format!(
				"{} tasks exceeds the limit of {}",
				n, self.config.max_tasks
			)));
		}

		let mut seen = HashSet::new();
		for task in &request.tasks {
			if task.id.is_empty() {
				return Err(OptimizerError::invalid("task id is empty"));
			}
			if !seen.insert(task.id.as_str()) {
				return Err(OptimizerError::invalid(format!("duplicate task id {}", task.id)));
			}
		}

		let graph = match &request.conflict_matrix {
			Some(matrix) => ConflictGraph::from_matrix(matrix.clone(), n)?,
			None => ConflictGraph::from_tasks(&request.tasks),
		};

		Ok(ScheduleProblem {
			ids: request.tasks.iter().map(|t| t.id.clone()).collect(),
			graph,
		})
	}

	fn classical(&self, problem: &ScheduleProblem) -> Coloring {
		(1..=problem.ids.len() as u32).collect()
	}

	fn optimized(&self, problem: &ScheduleProblem) -> Coloring {
		let graph = &problem.graph;
		let n = graph.len();

		let mut order: Vec<usize> = (0..n).collect();
		// Stable sort keeps input order among equal degrees
		order.sort_by_key(|&i| std::cmp::Reverse(graph.degree(i)));

		let mut coloring = vec![0u32; n];
		for &task in &order {
			let used: HashSet<u32> = (0..n)
				.filter(|&other| coloring[other] != 0 && graph.conflicts(task, other))
				.map(|other| coloring[other])
				.collect();
			let slot = (1..).find(|slot| !used.contains(slot)).unwrap_or(1);
			coloring[task] = slot;
		}

		debug!(tasks = n, slots = slot_count(&coloring), "Greedy coloring finished");
		coloring
	}

	fn compare(
		&self,
		problem: &ScheduleProblem,
		classical: Timed<Coloring>,
		optimized: Timed<Coloring>,
	) -> Result<ScheduleResponse> {
		let graph = &problem.graph;
		let classical_slots = slot_count(&classical.value);
		let optimized_slots = slot_count(&optimized.value);
		let winner = Winner::optimized_if(optimized_slots < classical_slots);

		let chosen = match winner {
			Winner::Optimized => &optimized.value,
			Winner::Classical => &classical.value,
		};
		let mut by_slot: BTreeMap<u32, Vec<String>> = BTreeMap::new();
		for (index, &slot) in chosen.iter().enumerate() {
			by_slot.entry(slot).or_default().push(problem.ids[index].clone());
		}
		let schedule: Vec<SlotAssignment> = by_slot
			.into_iter()
			.map(|(slot, task_ids)| SlotAssignment { slot, task_ids })
			.collect();

		Ok(ScheduleResponse {
			total_slots: schedule.len(),
			schedule,
			total_conflicts: graph.edge_count(),
			comparison: ScheduleComparison {
				classical_slots,
				classical_conflicts_remaining: graph.violations(&classical.value),
				classical_time_ms: classical.elapsed_ms,
				optimized_slots,
				optimized_conflicts_remaining: graph.violations(&optimized.value),
				optimized_time_ms: optimized.elapsed_ms,
				reduction_pct: reduction_pct(classical_slots as f64, optimized_slots as f64),
				winner,
			},
			metrics: ScheduleMetrics {
				graph_nodes: graph.len(),
				graph_edges: graph.edge_count(),
				max_degree: graph.max_degree(),
			},
			conflict_matrix: graph.clone().into_matrix(),
		})
	}
}
