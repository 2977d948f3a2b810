//! Path search requests and responses.

use crate::common::{Asset, Winner};
use crate::graph::Pool;
use serde::{Deserialize, Serialize};

/// Best-output route request over a pool graph.
///
/// Either `dest_asset` or a non-empty `dest_assets` list must be given. With
/// a list, each algorithm picks the best route to any of the listed assets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathSearchRequest {
	#[serde(alias = "graph")]
	pub pools: Vec<Pool>,
	pub source_asset: Asset,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub dest_asset: Option<Asset>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub dest_assets: Vec<Asset>,
	pub amount_in: f64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub max_hops: Option<usize>,
}

impl PathSearchRequest {
	pub fn new(
		pools: Vec<Pool>,
		source_asset: impl Into<Asset>,
		dest_asset: impl Into<Asset>,
		amount_in: f64,
	) -> Self {
		Self {
			pools,
			source_asset: source_asset.into(),
			dest_asset: Some(dest_asset.into()),
			dest_assets: Vec::new(),
			amount_in,
			max_hops: None,
		}
	}

	pub fn with_max_hops(mut self, max_hops: usize) -> Self {
		self.max_hops = Some(max_hops);
		self
	}

	pub fn with_destinations(mut self, destinations: Vec<Asset>) -> Self {
		self.dest_asset = None;
		self.dest_assets = destinations;
		self
	}
}

/// One priced hop of a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteLeg {
	pub pool_id: String,
	pub asset_in: Asset,
	pub asset_out: Asset,
	pub amount_in: f64,
	pub amount_out: f64,
}

/// A fully priced route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathQuote {
	pub path: Vec<Asset>,
	pub legs: Vec<RouteLeg>,
	pub output_amount: f64,
}

impl PathQuote {
	pub fn hops(&self) -> usize {
		self.legs.len()
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathComparison {
	pub classical_path: Vec<Asset>,
	pub classical_output: f64,
	pub classical_time_ms: f64,
	pub optimized_path: Vec<Asset>,
	pub optimized_output: f64,
	pub optimized_time_ms: f64,
	pub improvement_pct: f64,
	pub winner: Winner,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathSearchMetrics {
	pub assets: usize,
	pub pools: usize,
	pub max_hops: usize,
	pub timed_out: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathSearchResponse {
	pub optimal_path: Vec<Asset>,
	pub output_amount: f64,
	pub hops: usize,
	pub legs: Vec<RouteLeg>,
	pub comparison: PathComparison,
	pub paths_evaluated: u64,
	pub metrics: PathSearchMetrics,
}
