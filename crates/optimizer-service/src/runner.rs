//! Request file handling and concurrent batch solving.

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use optimizer_core::OptimizationEngine;
use optimizer_monitoring::metrics::{SolveMetricsCollector, SolveSample, Timer};
use optimizer_types::{EngineRequest, EngineResponse, ErrorKind, OptimizerError, SolverKind, Winner};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Structured error reported in place of a response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
	pub kind: ErrorKind,
	pub message: String,
}

impl From<&OptimizerError> for ErrorReport {
	fn from(err: &OptimizerError) -> Self {
		Self {
			kind: err.kind(),
			message: err.to_string(),
		}
	}
}

/// One batch result, in the position of its request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchEntry {
	pub index: usize,
	pub solver: SolverKind,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub result: Option<EngineResponse>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<ErrorReport>,
}

pub fn read_request(path: &Path) -> Result<EngineRequest> {
	let contents = std::fs::read_to_string(path)
		.with_context(|| format!("Failed to read request file: {:?}", path))?;
	serde_json::from_str(&contents).with_context(|| format!("Invalid request in {:?}", path))
}

pub fn read_batch(path: &Path) -> Result<Vec<EngineRequest>> {
	let contents = std::fs::read_to_string(path)
		.with_context(|| format!("Failed to read batch file: {:?}", path))?;
	serde_json::from_str(&contents)
		.with_context(|| format!("Batch file {:?} must hold a JSON array of requests", path))
}

/// Solve every request on the blocking pool, at most `concurrency` at a time.
///
/// Results come back in input order; a rejected request becomes an entry
/// with an error instead of failing the whole batch.
pub async fn run_batch(
	engine: Arc<OptimizationEngine>,
	requests: Vec<EngineRequest>,
	concurrency: usize,
	metrics: &SolveMetricsCollector,
) -> Result<Vec<BatchEntry>> {
	info!(requests = requests.len(), concurrency, "Starting batch");

	let mut solved = stream::iter(requests.into_iter().enumerate())
		.map(|(index, request)| {
			let engine = Arc::clone(&engine);
			tokio::task::spawn_blocking(move || {
				let timer = Timer::new();
				let result = engine.solve(&request);
				(index, request.kind(), result, timer.finish())
			})
		})
		.buffered(concurrency.max(1));

	let mut entries = Vec::new();
	while let Some(joined) = solved.next().await {
		let (index, kind, result, duration) = joined.context("Solver task failed")?;
		match result {
			Ok(response) => {
				metrics
					.record_solve(SolveSample {
						kind,
						duration,
						timed_out: response.timed_out(),
						optimized_won: response.winner() == Winner::Optimized,
					})
					.await;
				debug!(index, solver = %kind, "Request solved");
				entries.push(BatchEntry {
					index,
					solver: kind,
					result: Some(response),
					error: None,
				});
			}
			Err(err) => {
				metrics.record_error(kind).await;
				warn!(index, solver = %kind, error = %err, "Request rejected");
				entries.push(BatchEntry {
					index,
					solver: kind,
					result: None,
					error: Some(ErrorReport::from(&err)),
				});
			}
		}
	}

	info!(entries = entries.len(), "Batch finished");
	Ok(entries)
}

#[cfg(test)]
mod tests {
	use super::*;
	use optimizer_types::{
		ImpactParams, PartitionRequest, Pool, ScheduleRequest, SelectionRequest, Task,
	};
	use std::io::Write;

	fn requests() -> Vec<EngineRequest> {
		vec![
			EngineRequest::PathSearch(optimizer_types::PathSearchRequest::new(
				vec![
					Pool::new("ab", "A", "B", 10_000.0, 4_000.0, 30),
					Pool::new("bc", "B", "C", 4_000.0, 8_000.0, 30),
				],
				"A",
				"C",
				1_000.0,
			)),
			EngineRequest::Selector(SelectionRequest::new(Vec::new(), Default::default())),
			EngineRequest::Scheduler(ScheduleRequest::new(vec![
				Task::new("t1").writes(["R1"]),
				Task::new("t2").writes(["R2"]),
			])),
			EngineRequest::Partitioner(PartitionRequest::for_quantity(
				10_000.0,
				150_000.0,
				ImpactParams::quadratic(1.0),
			)),
		]
	}

	#[tokio::test]
	async fn test_batch_keeps_order_and_reports_errors_inline() {
		let engine = Arc::new(OptimizationEngine::default());
		let metrics = SolveMetricsCollector::new("test");
		let entries = run_batch(engine, requests(), 2, &metrics).await.unwrap();

		assert_eq!(entries.len(), 4);
		for (i, entry) in entries.iter().enumerate() {
			assert_eq!(entry.index, i);
		}
		assert_eq!(entries[0].solver, SolverKind::PathSearch);
		assert!(entries[0].result.is_some());

		let error = entries[1].error.as_ref().unwrap();
		assert_eq!(error.kind, ErrorKind::InvalidInput);
		assert!(entries[1].result.is_none());

		let stats = metrics.stats().await;
		assert_eq!(stats[&SolverKind::Selector].errors, 1);
		assert_eq!(stats[&SolverKind::Scheduler].solves, 1);
		assert_eq!(stats[&SolverKind::Partitioner].optimized_wins, 1);
	}

	#[tokio::test]
	async fn test_batch_entry_serialization() {
		let engine = Arc::new(OptimizationEngine::default());
		let metrics = SolveMetricsCollector::new("test");
		let entries = run_batch(engine, requests(), 1, &metrics).await.unwrap();

		let json = serde_json::to_value(&entries).unwrap();
		assert_eq!(json[1]["solver"], "selector");
		assert_eq!(json[1]["error"]["kind"], "invalidInput");
		assert!(json[1].get("result").is_none());
		assert_eq!(json[2]["result"]["solver"], "scheduler");
		assert_eq!(json[2]["result"]["response"]["totalSlots"], 1);
	}

	#[test]
	fn test_read_request_files() {
		let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
		write!(
			file,
			r#"{{"solver": "partitioner", "request": {{"quantity": 100.0, "fixedOverhead": 1.0, "impactParams": {{"coefficient": 0.01}}}}}}"#
		)
		.unwrap();
		let request = read_request(file.path()).unwrap();
		assert_eq!(request.kind(), SolverKind::Partitioner);

		// A single envelope is not a batch
		assert!(read_batch(file.path()).is_err());
		assert!(read_request(Path::new("/nonexistent/request.json")).is_err());
	}
}
