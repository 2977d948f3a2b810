//! Configuration types for the engine.

use crate::ConfigError;
use serde::{Deserialize, Serialize};

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct EngineConfig {
	/// Engine identity and logging
	#[serde(default)]
	pub engine: EngineSettings,
	/// Route search limits
	#[serde(default)]
	pub path_search: PathSearchConfig,
	/// Conflict scheduling limits
	#[serde(default)]
	pub scheduler: SchedulerConfig,
	/// Candidate selection search settings
	#[serde(default)]
	pub selector: SelectorConfig,
	/// Batch partitioning limits
	#[serde(default)]
	pub partitioner: PartitionerConfig,
	/// Weighted scoring defaults
	#[serde(default)]
	pub scorer: ScorerConfig,
}

/// Engine identity and logging
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineSettings {
	/// Engine name for logging
	pub name: String,
	/// Log level (trace, debug, info, warn, error)
	pub log_level: String,
	/// Emit JSON log lines instead of pretty output
	pub json_logs: bool,
}

impl Default for EngineSettings {
	fn default() -> Self {
		Self {
			name: "execution-optimizer".to_string(),
			log_level: "info".to_string(),
			json_logs: false,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PathSearchConfig {
	/// Hop limit used when a request does not name one
	pub default_max_hops: usize,
	/// Largest hop limit a request may ask for; larger values are clamped
	pub max_hops_cap: usize,
	/// Maximum number of complete paths priced per search
	pub max_paths: u64,
	/// Soft wall-clock budget for the exhaustive search
	pub time_budget_ms: u64,
}

impl Default for PathSearchConfig {
	fn default() -> Self {
		Self {
			default_max_hops: 3,
			max_hops_cap: 5,
			max_paths: 100_000,
			time_budget_ms: 250,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SchedulerConfig {
	/// Task count above which requests are rejected (pairwise conflict checks are quadratic)
	pub max_tasks: usize,
}

impl Default for SchedulerConfig {
	fn default() -> Self {
		Self { max_tasks: 2_000 }
	}
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SelectorConfig {
	/// Largest candidate count solved by branch-and-bound; above it annealing is used
	pub exact_limit: usize,
	/// Maximum branch-and-bound nodes
	pub node_budget: u64,
	/// Annealing iterations
	pub anneal_iterations: u64,
	/// Starting temperature, relative to the mean candidate value
	pub initial_temperature: f64,
	/// Geometric cooling factor applied every iteration
	pub cooling_rate: f64,
	/// Seed for the annealing RNG when the request carries none
	pub seed: u64,
	/// Soft wall-clock budget for either search
	pub time_budget_ms: u64,
}

impl Default for SelectorConfig {
	fn default() -> Self {
		Self {
			exact_limit: 24,
			node_budget: 2_000_000,
			anneal_iterations: 20_000,
			initial_temperature: 1.0,
			cooling_rate: 0.999,
			seed: 42,
			time_budget_ms: 250,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PartitionerConfig {
	/// Upper bound on the number of batches searched
	pub max_batches_cap: usize,
}

impl Default for PartitionerConfig {
	fn default() -> Self {
		Self {
			max_batches_cap: 20,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScorerConfig {
	/// Recommendation threshold when a request carries none
	pub default_threshold: f64,
}

impl Default for ScorerConfig {
	fn default() -> Self {
		Self {
			default_threshold: 0.5,
		}
	}
}

impl EngineConfig {
	/// Check cross-field constraints.
	pub fn validate(&self) -> Result<(), ConfigError> {
		let path = &self.path_search;
		if !(2..=8).contains(&path.max_hops_cap) {
			return Err(ConfigError::ValidationError(format!(
				"path_search.max_hops_cap must be within 2..=8, got {}",
				path.max_hops_cap
			)));
		}
		if path.default_max_hops == 0 || path.default_max_hops > path.max_hops_cap {
			return Err(ConfigError::ValidationError(format!(
				"path_search.default_max_hops must be within 1..={}, got {}",
				path.max_hops_cap, path.default_max_hops
			)));
		}
		if path.max_paths == 0 {
			return Err(ConfigError::ValidationError(
				"path_search.max_paths must be positive".to_string(),
			));
		}

		if self.scheduler.max_tasks == 0 {
			return Err(ConfigError::ValidationError(
				"scheduler.max_tasks must be positive".to_string(),
			));
		}

		let selector = &self.selector;
		if !(selector.cooling_rate > 0.0 && selector.cooling_rate < 1.0) {
			return Err(ConfigError::ValidationError(format!(
				"selector.cooling_rate must be within (0, 1), got {}",
				selector.cooling_rate
			)));
		}
		if !(selector.initial_temperature.is_finite() && selector.initial_temperature > 0.0) {
			return Err(ConfigError::ValidationError(
				"selector.initial_temperature must be positive".to_string(),
			));
		}
		if selector.node_budget == 0 || selector.anneal_iterations == 0 {
			return Err(ConfigError::ValidationError(
				"selector budgets must be positive".to_string(),
			));
		}

		if self.partitioner.max_batches_cap == 0 {
			return Err(ConfigError::ValidationError(
				"partitioner.max_batches_cap must be positive".to_string(),
			));
		}

		if !self.scorer.default_threshold.is_finite() {
			return Err(ConfigError::ValidationError(
				"scorer.default_threshold must be finite".to_string(),
			));
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_config() {
		let config = EngineConfig::default();
		assert_eq!(config.engine.name, "execution-optimizer");
		assert_eq!(config.path_search.default_max_hops, 3);
		assert_eq!(config.path_search.max_hops_cap, 5);
		assert_eq!(config.partitioner.max_batches_cap, 20);
		assert!(config.validate().is_ok());
	}

	#[test]
	fn test_validation_rejects_bad_hops() {
		let mut config = EngineConfig::default();
		config.path_search.default_max_hops = 6;
		assert!(config.validate().is_err());

		let mut config = EngineConfig::default();
		config.path_search.max_hops_cap = 1;
		config.path_search.default_max_hops = 1;
		assert!(config.validate().is_err());
	}

	#[test]
	fn test_validation_rejects_bad_cooling() {
		let mut config = EngineConfig::default();
		config.selector.cooling_rate = 1.0;
		assert!(matches!(
			config.validate(),
			Err(ConfigError::ValidationError(_))
		));
	}
}
