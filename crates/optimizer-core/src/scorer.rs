//! Weighted feature ranking under two weight profiles.

use crate::reporter::{DualSolver, Timed};
use optimizer_config::ScorerConfig;
use optimizer_types::{
	OptimizerError, RankEntry, Result, ScoringComparison, ScoringRequest, ScoringResponse,
	SolverKind, WeightProfile, Winner,
};
use std::collections::{BTreeMap, BTreeSet, HashSet};

#[derive(Debug, Clone)]
pub struct ScoringProblem {
	ids: Vec<String>,
	/// Normalized features per candidate, each in `[0, 1]`.
	normalized: Vec<BTreeMap<String, f64>>,
	classical_weights: WeightProfile,
	optimized_weights: WeightProfile,
	threshold: f64,
}

impl ScoringProblem {
	fn score(&self, weights: &WeightProfile) -> Vec<f64> {
		self.normalized
			.iter()
			.map(|features| {
				weights
					.iter()
					.map(|(name, weight)| features.get(name).copied().unwrap_or(0.0) * weight)
					.sum()
			})
			.collect()
	}
}

/// 1-based rank of each candidate by descending score, ties by input order.
pub fn ranks(scores: &[f64]) -> Vec<usize> {
	let mut order: Vec<usize> = (0..scores.len()).collect();
	order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
	let mut ranks = vec![0; scores.len()];
	for (position, index) in order.into_iter().enumerate() {
		ranks[index] = position + 1;
	}
	ranks
}

fn average(scores: &[f64]) -> f64 {
	if scores.is_empty() {
		0.0
	} else {
		scores.iter().sum::<f64>() / scores.len() as f64
	}
}

pub struct Scorer {
	config: ScorerConfig,
}

impl Scorer {
	pub fn new(config: ScorerConfig) -> Self {
		Self { config }
	}
}

impl DualSolver for Scorer {
	type Request = ScoringRequest;
	type Problem = ScoringProblem;
	type Outcome = Vec<f64>;
	type Response = ScoringResponse;

	const KIND: SolverKind = SolverKind::Scorer;

	fn validate(&self, request: &ScoringRequest) -> Result<ScoringProblem> {
		if request.candidates.is_empty() {
			return Err(OptimizerError::invalid("candidate list is empty"));
		}
		if request.classical_weights.is_empty() || request.optimized_weights.is_empty() {
			return Err(OptimizerError::invalid("weight profiles must not be empty"));
		}
		if let Some((name, _)) = request
			.classical_weights
			.iter()
			.chain(&request.optimized_weights)
			.find(|(_, w)| !w.is_finite())
		{
			return Err(OptimizerError::invalid(format!("weight for {} is not finite", name)));
		}

		let threshold = request.threshold.unwrap_or(self.config.default_threshold);
		if !threshold.is_finite() {
			return Err(OptimizerError::invalid("threshold must be finite"));
		}

		let names: BTreeSet<&String> = request
			.classical_weights
			.keys()
			.chain(request.optimized_weights.keys())
			.collect();

		let mut seen = HashSet::new();
		for candidate in &request.candidates {
			if candidate.id.is_empty() || !seen.insert(candidate.id.as_str()) {
				return Err(OptimizerError::invalid(format!(
					"candidate id {:?} is empty or duplicated",
					candidate.id
				)));
			}
			for name in &names {
				match candidate.features.get(*name) {
					Some(value) if value.is_finite() => {}
					Some(_) => {
						return Err(OptimizerError::invalid(format!(
							"feature {} of {} is not finite",
							name, candidate.id
						)))
					}
					None => {
						return Err(OptimizerError::invalid(format!(
							"candidate {} is missing feature {}",
							candidate.id, name
						)))
					}
				}
			}
		}

		let mut normalized = vec![BTreeMap::new(); request.candidates.len()];
		for name in names {
			let (min, max) = match request.feature_bounds.get(name) {
				Some(bounds) => {
					if !(bounds.min.is_finite() && bounds.max.is_finite() && bounds.min < bounds.max) {
						return Err(OptimizerError::invalid(format!(
							"bounds for {} must satisfy min < max",
							name
						)));
					}
					(bounds.min, bounds.max)
				}
				None => request.candidates.iter().fold(
					(f64::INFINITY, f64::NEG_INFINITY),
					|(lo, hi), c| {
						let v = c.features[name];
						(lo.min(v), hi.max(v))
					},
				),
			};

			for (slot, candidate) in normalized.iter_mut().zip(&request.candidates) {
				let value = candidate.features[name].clamp(min, max);
				let scaled = if max > min {
					(value - min) / (max - min)
				} else {
					0.5
				};
				slot.insert(name.clone(), scaled);
			}
		}

		Ok(ScoringProblem {
			ids: request.candidates.iter().map(|c| c.id.clone()).collect(),
			normalized,
			classical_weights: request.classical_weights.clone(),
			optimized_weights: request.optimized_weights.clone(),
			threshold,
		})
	}

	fn classical(&self, problem: &ScoringProblem) -> Vec<f64> {
		problem.score(&problem.classical_weights)
	}

	fn optimized(&self, problem: &ScoringProblem) -> Vec<f64> {
		problem.score(&problem.optimized_weights)
	}

	fn compare(
		&self,
		problem: &ScoringProblem,
		classical: Timed<Vec<f64>>,
		optimized: Timed<Vec<f64>>,
	) -> Result<ScoringResponse> {
		let classical_ranks = ranks(&classical.value);
		let optimized_ranks = ranks(&optimized.value);

		let mut ranking: Vec<RankEntry> = (0..problem.ids.len())
			.map(|i| RankEntry {
				id: problem.ids[i].clone(),
				classical_score: classical.value[i],
				classical_rank: classical_ranks[i],
				optimized_score: optimized.value[i],
				optimized_rank: optimized_ranks[i],
				recommended: optimized.value[i] >= problem.threshold,
			})
			.collect();
		ranking.sort_by_key(|entry| entry.optimized_rank);

		let ordered = |ranks: &[usize]| {
			let mut ids: Vec<(usize, String)> = ranks
				.iter()
				.zip(&problem.ids)
				.map(|(&rank, id)| (rank, id.clone()))
				.collect();
			ids.sort();
			ids.into_iter().map(|(_, id)| id).collect::<Vec<_>>()
		};

		let displacement = classical_ranks
			.iter()
			.zip(&optimized_ranks)
			.map(|(&a, &b)| a.abs_diff(b))
			.sum();
		let classical_avg = average(&classical.value);
		let optimized_avg = average(&optimized.value);

		Ok(ScoringResponse {
			ranking,
			threshold: problem.threshold,
			comparison: ScoringComparison {
				classical_ranking: ordered(&classical_ranks),
				optimized_ranking: ordered(&optimized_ranks),
				classical_avg_score: classical_avg,
				optimized_avg_score: optimized_avg,
				rank_displacement: displacement,
				factors_classical: problem.classical_weights.len(),
				factors_optimized: problem.optimized_weights.len(),
				classical_time_ms: classical.elapsed_ms,
				optimized_time_ms: optimized.elapsed_ms,
				winner: Winner::optimized_if(optimized_avg > classical_avg),
			},
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::reporter::run_comparison;
	use optimizer_types::{FeatureBounds, FeatureVector};

	fn scorer() -> Scorer {
		Scorer::new(ScorerConfig::default())
	}

	fn weights(entries: &[(&str, f64)]) -> WeightProfile {
		entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
	}

	fn vaults() -> ScoringRequest {
		ScoringRequest {
			candidates: vec![
				FeatureVector::new("aave").with("apy", 4.0).with("tvl", 9e9).with("risk", 2.0),
				FeatureVector::new("curve").with("apy", 8.0).with("tvl", 2e9).with("risk", 5.0),
				FeatureVector::new("degen").with("apy", 30.0).with("tvl", 1e7).with("risk", 9.0),
			],
			classical_weights: weights(&[("apy", 1.0)]),
			optimized_weights: weights(&[("apy", 0.5), ("tvl", 0.4), ("risk", -0.3)]),
			threshold: None,
			feature_bounds: BTreeMap::new(),
		}
	}

	#[test]
	fn test_two_profiles_rank_differently() {
		let response = run_comparison(&scorer(), &vaults()).unwrap();

		assert_eq!(response.comparison.classical_ranking, vec!["degen", "curve", "aave"]);
		assert_eq!(response.comparison.factors_classical, 1);
		assert_eq!(response.comparison.factors_optimized, 3);
		assert_eq!(response.threshold, 0.5);
		assert_eq!(response.ranking.len(), 3);
		for pair in response.ranking.windows(2) {
			assert!(pair[0].optimized_rank < pair[1].optimized_rank);
			assert!(pair[0].optimized_score >= pair[1].optimized_score);
		}
		for entry in &response.ranking {
			assert_eq!(entry.recommended, entry.optimized_score >= 0.5);
		}
		assert!(response.comparison.rank_displacement > 0);
	}

	#[test]
	fn test_min_max_normalization() {
		let response = run_comparison(&scorer(), &vaults()).unwrap();
		let degen = response.ranking.iter().find(|e| e.id == "degen").unwrap();
		let aave = response.ranking.iter().find(|e| e.id == "aave").unwrap();
		assert_eq!(degen.classical_score, 1.0);
		assert_eq!(aave.classical_score, 0.0);
	}

	#[test]
	fn test_constant_feature_is_half() {
		let request = ScoringRequest {
			candidates: vec![
				FeatureVector::new("a").with("x", 3.0),
				FeatureVector::new("b").with("x", 3.0),
			],
			classical_weights: weights(&[("x", 1.0)]),
			optimized_weights: weights(&[("x", 2.0)]),
			threshold: Some(1.0),
			feature_bounds: BTreeMap::new(),
		};
		let response = run_comparison(&scorer(), &request).unwrap();
		assert_eq!(response.ranking[0].id, "a");
		assert_eq!(response.ranking[0].classical_score, 0.5);
		assert_eq!(response.ranking[0].optimized_score, 1.0);
		assert!(response.ranking.iter().all(|e| e.recommended));
		assert_eq!(response.comparison.winner, Winner::Optimized);
		assert_eq!(response.comparison.rank_displacement, 0);
	}

	#[test]
	fn test_feature_bounds_clamp() {
		let mut request = vaults();
		request.feature_bounds.insert(
			"apy".to_string(),
			FeatureBounds {
				min: 0.0,
				max: 10.0,
			},
		);
		let response = run_comparison(&scorer(), &request).unwrap();
		let degen = response.ranking.iter().find(|e| e.id == "degen").unwrap();
		let curve = response.ranking.iter().find(|e| e.id == "curve").unwrap();
		assert_eq!(degen.classical_score, 1.0);
		assert!((curve.classical_score - 0.8).abs() < 1e-12);
	}

	#[test]
	fn test_ties_keep_input_order() {
		assert_eq!(ranks(&[1.0, 2.0, 1.0, 2.0]), vec![3, 1, 4, 2]);
	}

	#[test]
	fn test_invalid_requests() {
		let mut missing = vaults();
		missing.candidates[1].features.remove("risk");
		assert!(matches!(
			scorer().validate(&missing),
			Err(OptimizerError::InvalidInput(_))
		));

		let mut empty = vaults();
		empty.candidates.clear();
		assert!(scorer().validate(&empty).is_err());

		let mut no_profile = vaults();
		no_profile.classical_weights.clear();
		assert!(scorer().validate(&no_profile).is_err());

		let mut bad_bounds = vaults();
		bad_bounds
			.feature_bounds
			.insert("apy".to_string(), FeatureBounds { min: 5.0, max: 5.0 });
		assert!(scorer().validate(&bad_bounds).is_err());
	}
}
