//! Tagged envelopes carrying any solver request or response.

use crate::common::{SolverKind, Winner};
use crate::partition::{PartitionRequest, PartitionResponse};
use crate::path::{PathSearchRequest, PathSearchResponse};
use crate::schedule::{ScheduleRequest, ScheduleResponse};
use crate::scoring::{ScoringRequest, ScoringResponse};
use crate::selection::{SelectionRequest, SelectionResponse};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "solver", content = "request", rename_all = "kebab-case")]
pub enum EngineRequest {
	PathSearch(PathSearchRequest),
	Scheduler(ScheduleRequest),
	Selector(SelectionRequest),
	Partitioner(PartitionRequest),
	Scorer(ScoringRequest),
}

impl EngineRequest {
	pub fn kind(&self) -> SolverKind {
		match self {
			Self::PathSearch(_) => SolverKind::PathSearch,
			Self::Scheduler(_) => SolverKind::Scheduler,
			Self::Selector(_) => SolverKind::Selector,
			Self::Partitioner(_) => SolverKind::Partitioner,
			Self::Scorer(_) => SolverKind::Scorer,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "solver", content = "response", rename_all = "kebab-case")]
pub enum EngineResponse {
	PathSearch(PathSearchResponse),
	Scheduler(ScheduleResponse),
	Selector(SelectionResponse),
	Partitioner(PartitionResponse),
	Scorer(ScoringResponse),
}

impl EngineResponse {
	pub fn kind(&self) -> SolverKind {
		match self {
			Self::PathSearch(_) => SolverKind::PathSearch,
			Self::Scheduler(_) => SolverKind::Scheduler,
			Self::Selector(_) => SolverKind::Selector,
			Self::Partitioner(_) => SolverKind::Partitioner,
			Self::Scorer(_) => SolverKind::Scorer,
		}
	}

	pub fn winner(&self) -> Winner {
		match self {
			Self::PathSearch(r) => r.comparison.winner,
			Self::Scheduler(r) => r.comparison.winner,
			Self::Selector(r) => r.comparison.winner,
			Self::Partitioner(r) => r.comparison.winner,
			Self::Scorer(r) => r.comparison.winner,
		}
	}

	/// Whether a search budget ran out while producing this response.
	pub fn timed_out(&self) -> bool {
		match self {
			Self::PathSearch(r) => r.metrics.timed_out,
			Self::Selector(r) => r.metrics.timed_out,
			Self::Scheduler(_) | Self::Partitioner(_) | Self::Scorer(_) => false,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_request_envelope_parsing() {
		let json = r#"{
			"solver": "scheduler",
			"request": {
				"tasks": [
					{"id": "t1", "writeSet": ["R1"]},
					{"id": "t2", "readSet": ["R1"]}
				]
			}
		}"#;
		let request: EngineRequest = serde_json::from_str(json).unwrap();
		assert_eq!(request.kind(), SolverKind::Scheduler);
		match request {
			EngineRequest::Scheduler(req) => assert_eq!(req.tasks.len(), 2),
			other => panic!("unexpected request: {:?}", other),
		}
	}

	#[test]
	fn test_path_request_graph_alias() {
		let json = r#"{
			"solver": "path-search",
			"request": {
				"graph": [{"id": "p1", "assetA": "A", "assetB": "B", "reserveA": 10.0, "reserveB": 20.0, "feeBasisPoints": 30}],
				"sourceAsset": "A",
				"destAsset": "B",
				"amountIn": 1.0
			}
		}"#;
		let request: EngineRequest = serde_json::from_str(json).unwrap();
		match request {
			EngineRequest::PathSearch(req) => {
				assert_eq!(req.pools.len(), 1);
				assert_eq!(req.max_hops, None);
			}
			other => panic!("unexpected request: {:?}", other),
		}
	}
}
