//! Constant-product pricing on a local reserve book.

use optimizer_types::{OptimizerError, PathQuote, Pool, Result, RouteLeg, FEE_DENOMINATOR_BPS};
use std::collections::HashMap;

/// Check the pool invariants: positive finite reserves, a fee below 100%
/// and two distinct assets.
pub fn validate_pool(pool: &Pool) -> Result<()> {
	let invalid = |reason: &str| OptimizerError::InvalidPool {
		pool: pool.id.clone(),
		reason: reason.to_string(),
	};

	if pool.id.is_empty() {
		return Err(invalid("pool id is empty"));
	}
	if pool.asset_a == pool.asset_b {
		return Err(invalid("both sides trade the same asset"));
	}
	if !(pool.reserve_a.is_finite() && pool.reserve_a > 0.0)
		|| !(pool.reserve_b.is_finite() && pool.reserve_b > 0.0)
	{
		return Err(invalid("reserves must be positive"));
	}
	if pool.fee_basis_points >= FEE_DENOMINATOR_BPS {
		return Err(invalid("fee must be below 10000 basis points"));
	}
	Ok(())
}

/// Output of selling `amount_in` into reserves `(reserve_in, reserve_out)`.
pub fn quote_out(reserve_in: f64, reserve_out: f64, fee_bps: u32, amount_in: f64) -> Result<f64> {
	if !(amount_in.is_finite() && amount_in > 0.0) {
		return Err(OptimizerError::ZeroInput);
	}
	if !(reserve_in > 0.0 && reserve_out > 0.0) || fee_bps >= FEE_DENOMINATOR_BPS {
		return Err(OptimizerError::InvalidPool {
			pool: String::new(),
			reason: "reserves must be positive".to_string(),
		});
	}

	let denominator = f64::from(FEE_DENOMINATOR_BPS);
	let effective = amount_in * (denominator - f64::from(fee_bps)) / denominator;
	Ok(reserve_out * effective / (reserve_in + effective))
}

/// Working copy of pool reserves for one path evaluation.
///
/// Reserves are copied from the request snapshot the first time a pool is
/// traded; the snapshot itself is never written.
pub struct ReserveBook<'a> {
	pools: &'a [Pool],
	touched: HashMap<usize, (f64, f64)>,
}

impl<'a> ReserveBook<'a> {
	pub fn new(pools: &'a [Pool]) -> Self {
		Self {
			pools,
			touched: HashMap::new(),
		}
	}

	/// Current `(reserve_a, reserve_b)` of the pool at `index`.
	pub fn reserves(&self, index: usize) -> Option<(f64, f64)> {
		self.touched
			.get(&index)
			.copied()
			.or_else(|| self.pools.get(index).map(|p| (p.reserve_a, p.reserve_b)))
	}

	/// Sell `amount_in` of `asset_in` into the pool and move the reserves.
	pub fn swap(&mut self, index: usize, asset_in: &str, amount_in: f64) -> Result<f64> {
		let pool = self
			.pools
			.get(index)
			.ok_or_else(|| OptimizerError::invalid(format!("unknown pool index {}", index)))?;
		let (reserve_a, reserve_b) = self.reserves(index).unwrap_or((pool.reserve_a, pool.reserve_b));

		let selling_a = if pool.asset_a == asset_in {
			true
		} else if pool.asset_b == asset_in {
			false
		} else {
			return Err(OptimizerError::InvalidPool {
				pool: pool.id.clone(),
				reason: format!("does not trade {}", asset_in),
			});
		};

		let (reserve_in, reserve_out) = if selling_a {
			(reserve_a, reserve_b)
		} else {
			(reserve_b, reserve_a)
		};
		let amount_out = quote_out(reserve_in, reserve_out, pool.fee_basis_points, amount_in)
			.map_err(|e| match e {
				OptimizerError::InvalidPool { reason, .. } => OptimizerError::InvalidPool {
					pool: pool.id.clone(),
					reason,
				},
				other => other,
			})?;

		let updated = if selling_a {
			(reserve_a + amount_in, reserve_b - amount_out)
		} else {
			(reserve_a - amount_out, reserve_b + amount_in)
		};
		self.touched.insert(index, updated);

		Ok(amount_out)
	}
}

/// Price a route on a fresh reserve book.
///
/// `assets` holds the visited assets in order and `pool_indices` the pool
/// used between each consecutive pair.
pub fn price_route(
	pools: &[Pool],
	assets: &[&str],
	pool_indices: &[usize],
	amount_in: f64,
) -> Result<PathQuote> {
	if assets.len() != pool_indices.len() + 1 || pool_indices.is_empty() {
		return Err(OptimizerError::invalid("route needs one pool per hop"));
	}

	let mut book = ReserveBook::new(pools);
	let mut amount = amount_in;
	let mut legs = Vec::with_capacity(pool_indices.len());

	for (hop, &index) in pool_indices.iter().enumerate() {
		let asset_in = assets[hop];
		let asset_out = assets[hop + 1];
		let amount_out = book.swap(index, asset_in, amount)?;
		legs.push(RouteLeg {
			pool_id: pools[index].id.clone(),
			asset_in: asset_in.to_string(),
			asset_out: asset_out.to_string(),
			amount_in: amount,
			amount_out,
		});
		amount = amount_out;
	}

	Ok(PathQuote {
		path: assets.iter().map(|a| a.to_string()).collect(),
		legs,
		output_amount: amount,
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	fn pools() -> Vec<Pool> {
		vec![
			Pool::new("ab", "A", "B", 10_000.0, 4_000.0, 30),
			Pool::new("bc", "B", "C", 4_000.0, 8_000.0, 30),
		]
	}

	#[test]
	fn test_quote_matches_constant_product() {
		let out = quote_out(10_000.0, 4_000.0, 30, 1_000.0).unwrap();
		let effective = 1_000.0 * 0.997;
		let expected = 4_000.0 * effective / (10_000.0 + effective);
		assert!((out - expected).abs() < 1e-9);
	}

	#[test]
	fn test_quote_rejects_bad_input() {
		assert_eq!(quote_out(1.0, 1.0, 30, 0.0), Err(OptimizerError::ZeroInput));
		assert_eq!(quote_out(1.0, 1.0, 30, -5.0), Err(OptimizerError::ZeroInput));
		assert!(matches!(
			quote_out(0.0, 1.0, 30, 1.0),
			Err(OptimizerError::InvalidPool { .. })
		));
	}

	#[test]
	fn test_validate_pool() {
		assert!(validate_pool(&Pool::new("p", "A", "B", 1.0, 1.0, 0)).is_ok());
		assert!(validate_pool(&Pool::new("p", "A", "B", 0.0, 1.0, 30)).is_err());
		assert!(validate_pool(&Pool::new("p", "A", "B", 1.0, f64::NAN, 30)).is_err());
		assert!(validate_pool(&Pool::new("p", "A", "B", 1.0, 1.0, 10_000)).is_err());
		assert!(validate_pool(&Pool::new("p", "A", "A", 1.0, 1.0, 30)).is_err());
	}

	#[test]
	fn test_swap_moves_local_reserves_only() {
		let pools = pools();
		let mut book = ReserveBook::new(&pools);
		let out = book.swap(0, "A", 1_000.0).unwrap();

		let (reserve_a, reserve_b) = book.reserves(0).unwrap();
		assert_eq!(reserve_a, 11_000.0);
		assert!((reserve_b - (4_000.0 - out)).abs() < 1e-9);
		// Snapshot untouched
		assert_eq!(pools[0].reserve_a, 10_000.0);

		// A second trade in the same direction gets a worse price
		let second = book.swap(0, "A", 1_000.0).unwrap();
		assert!(second < out);
	}

	#[test]
	fn test_swap_rejects_foreign_asset() {
		let pools = pools();
		let mut book = ReserveBook::new(&pools);
		assert!(matches!(
			book.swap(0, "C", 1.0),
			Err(OptimizerError::InvalidPool { .. })
		));
	}

	#[test]
	fn test_price_route_legs() {
		let pools = pools();
		let quote = price_route(&pools, &["A", "B", "C"], &[0, 1], 1_000.0).unwrap();
		assert_eq!(quote.hops(), 2);
		assert_eq!(quote.path, vec!["A", "B", "C"]);
		assert_eq!(quote.legs[0].amount_out, quote.legs[1].amount_in);
		assert_eq!(quote.legs[1].amount_out, quote.output_amount);
		assert_eq!(quote.legs[1].pool_id, "bc");
	}
}
