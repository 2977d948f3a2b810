//! Liquidity pool graph types.

use crate::common::Asset;
use serde::{Deserialize, Serialize};

/// Basis-point denominator used by pool fees.
pub const FEE_DENOMINATOR_BPS: u32 = 10_000;

fn default_fee_bps() -> u32 {
	300
}

/// A constant-product pool connecting two assets.
///
/// Pools are immutable request snapshots; pricing works on a local copy of
/// the reserves so that evaluating one path never affects another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pool {
	pub id: String,
	pub asset_a: Asset,
	pub asset_b: Asset,
	pub reserve_a: f64,
	pub reserve_b: f64,
	#[serde(default = "default_fee_bps")]
	pub fee_basis_points: u32,
}

impl Pool {
	pub fn new(
		id: impl Into<String>,
		asset_a: impl Into<Asset>,
		asset_b: impl Into<Asset>,
		reserve_a: f64,
		reserve_b: f64,
		fee_basis_points: u32,
	) -> Self {
		Self {
			id: id.into(),
			asset_a: asset_a.into(),
			asset_b: asset_b.into(),
			reserve_a,
			reserve_b,
			fee_basis_points,
		}
	}

	/// The asset on the opposite side of `asset`, if the pool trades it.
	pub fn other_side(&self, asset: &str) -> Option<&Asset> {
		if self.asset_a == asset {
			Some(&self.asset_b)
		} else if self.asset_b == asset {
			Some(&self.asset_a)
		} else {
			None
		}
	}
}
