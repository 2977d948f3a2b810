//! Weighted scoring requests and responses.

use crate::common::Winner;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Map from feature name to signed weight.
pub type WeightProfile = BTreeMap<String, f64>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureVector {
	pub id: String,
	pub features: BTreeMap<String, f64>,
}

impl FeatureVector {
	pub fn new(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			features: BTreeMap::new(),
		}
	}

	pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
		self.features.insert(name.into(), value);
		self
	}
}

/// Fixed normalization domain for one feature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureBounds {
	pub min: f64,
	pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringRequest {
	pub candidates: Vec<FeatureVector>,
	pub classical_weights: WeightProfile,
	pub optimized_weights: WeightProfile,
	/// Recommendation threshold; the configured default is used when absent.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub threshold: Option<f64>,
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub feature_bounds: BTreeMap<String, FeatureBounds>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankEntry {
	pub id: String,
	pub classical_score: f64,
	pub classical_rank: usize,
	pub optimized_score: f64,
	pub optimized_rank: usize,
	pub recommended: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringComparison {
	pub classical_ranking: Vec<String>,
	pub optimized_ranking: Vec<String>,
	pub classical_avg_score: f64,
	pub optimized_avg_score: f64,
	pub rank_displacement: usize,
	pub factors_classical: usize,
	pub factors_optimized: usize,
	pub classical_time_ms: f64,
	pub optimized_time_ms: f64,
	pub winner: Winner,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringResponse {
	pub ranking: Vec<RankEntry>,
	pub threshold: f64,
	pub comparison: ScoringComparison,
}
