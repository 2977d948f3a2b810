//! Conflict scheduling requests and responses.

use crate::common::Winner;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// An operation with declared resource access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
	pub id: String,
	#[serde(default, alias = "reads")]
	pub read_set: BTreeSet<String>,
	#[serde(default, alias = "writes")]
	pub write_set: BTreeSet<String>,
}

impl Task {
	pub fn new(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			read_set: BTreeSet::new(),
			write_set: BTreeSet::new(),
		}
	}

	pub fn reads<I, S>(mut self, keys: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.read_set.extend(keys.into_iter().map(Into::into));
		self
	}

	pub fn writes<I, S>(mut self, keys: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.write_set.extend(keys.into_iter().map(Into::into));
		self
	}

	/// Write-write or read-write overlap in either direction.
	pub fn conflicts_with(&self, other: &Task) -> bool {
		let touches = |writes: &BTreeSet<String>, task: &Task| {
			writes
				.iter()
				.any(|key| task.write_set.contains(key) || task.read_set.contains(key))
		};
		touches(&self.write_set, other) || touches(&other.write_set, self)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
	#[serde(alias = "pendingOrders")]
	pub tasks: Vec<Task>,
	/// Precomputed conflict matrix; derived from the read/write sets when absent.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub conflict_matrix: Option<Vec<Vec<u8>>>,
}

impl ScheduleRequest {
	pub fn new(tasks: Vec<Task>) -> Self {
		Self {
			tasks,
			conflict_matrix: None,
		}
	}
}

/// Tasks sharing one execution slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotAssignment {
	pub slot: u32,
	pub task_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleComparison {
	pub classical_slots: usize,
	pub classical_conflicts_remaining: usize,
	pub classical_time_ms: f64,
	pub optimized_slots: usize,
	pub optimized_conflicts_remaining: usize,
	pub optimized_time_ms: f64,
	pub reduction_pct: f64,
	pub winner: Winner,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleMetrics {
	pub graph_nodes: usize,
	pub graph_edges: usize,
	pub max_degree: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
	pub schedule: Vec<SlotAssignment>,
	pub total_slots: usize,
	pub conflict_matrix: Vec<Vec<u8>>,
	pub total_conflicts: usize,
	pub comparison: ScheduleComparison,
	pub metrics: ScheduleMetrics,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_conflict_predicate() {
		let writer = Task::new("w").writes(["R1"]);
		let reader = Task::new("r").reads(["R1"]);
		let other_reader = Task::new("r2").reads(["R1"]);
		let unrelated = Task::new("u").writes(["R2"]);

		assert!(writer.conflicts_with(&reader));
		assert!(reader.conflicts_with(&writer));
		assert!(!reader.conflicts_with(&other_reader));
		assert!(!writer.conflicts_with(&unrelated));
	}

	#[test]
	fn test_task_aliases() {
		let json = r#"{"id":"o1","reads":["a"],"writes":["b"]}"#;
		let task: Task = serde_json::from_str(json).unwrap();
		assert!(task.read_set.contains("a"));
		assert!(task.write_set.contains("b"));
	}
}
