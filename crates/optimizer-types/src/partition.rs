//! Batch partitioning requests and responses.

use crate::common::Winner;
use serde::{Deserialize, Serialize};

/// Convex impact model: `impact(s) = coefficient * s^exponent`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactParams {
	pub coefficient: f64,
	#[serde(default = "default_exponent")]
	pub exponent: f64,
}

fn default_exponent() -> f64 {
	2.0
}

fn default_max_batches() -> usize {
	10
}

impl ImpactParams {
	pub fn quadratic(coefficient: f64) -> Self {
		Self {
			coefficient,
			exponent: 2.0,
		}
	}

	pub fn impact(&self, size: f64) -> f64 {
		self.coefficient * size.powf(self.exponent)
	}
}

/// A sized unit of work to be grouped instead of a scalar quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem {
	pub id: String,
	pub amount: f64,
}

impl BatchItem {
	pub fn new(id: impl Into<String>, amount: f64) -> Self {
		Self {
			id: id.into(),
			amount,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionRequest {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub quantity: Option<f64>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub items: Vec<BatchItem>,
	pub fixed_overhead: f64,
	pub impact_params: ImpactParams,
	#[serde(default = "default_max_batches")]
	pub max_batches: usize,
	/// Upper bound on `impact(s) / s` for any single batch.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub max_impact_per_unit: Option<f64>,
}

impl PartitionRequest {
	pub fn for_quantity(quantity: f64, fixed_overhead: f64, impact_params: ImpactParams) -> Self {
		Self {
			quantity: Some(quantity),
			items: Vec::new(),
			fixed_overhead,
			impact_params,
			max_batches: default_max_batches(),
			max_impact_per_unit: None,
		}
	}

	pub fn for_items(items: Vec<BatchItem>, fixed_overhead: f64, impact_params: ImpactParams) -> Self {
		Self {
			quantity: None,
			items,
			fixed_overhead,
			impact_params,
			max_batches: default_max_batches(),
			max_impact_per_unit: None,
		}
	}

	pub fn with_max_batches(mut self, max_batches: usize) -> Self {
		self.max_batches = max_batches;
		self
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
	pub batch_index: usize,
	pub amount: f64,
	pub slot: usize,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub item_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionComparison {
	pub classical_batches: usize,
	pub classical_cost: f64,
	pub classical_impact: f64,
	pub classical_overhead: f64,
	pub classical_time_ms: f64,
	pub optimized_batches: usize,
	pub optimized_cost: f64,
	pub optimized_impact: f64,
	pub optimized_overhead: f64,
	pub optimized_time_ms: f64,
	pub reduction_pct: f64,
	pub overhead_increase_pct: f64,
	pub winner: Winner,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionMetrics {
	pub quantity: f64,
	pub batch_counts_evaluated: usize,
	pub tolerance_exceeded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionResponse {
	pub batches: Vec<Batch>,
	pub comparison: PartitionComparison,
	pub metrics: PartitionMetrics,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_impact_is_convex() {
		let params = ImpactParams::quadratic(1.0);
		let whole = params.impact(100.0);
		let halves = 2.0 * params.impact(50.0);
		assert!(halves < whole);
	}

	#[test]
	fn test_request_defaults() {
		let json = r#"{"quantity":1000.0,"fixedOverhead":5.0,"impactParams":{"coefficient":0.1}}"#;
		let req: PartitionRequest = serde_json::from_str(json).unwrap();
		assert_eq!(req.max_batches, 10);
		assert_eq!(req.impact_params.exponent, 2.0);
		assert!(req.items.is_empty());
	}
}
