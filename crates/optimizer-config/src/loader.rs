//! Configuration loading from files and environment.

use crate::types::EngineConfig;
use crate::ConfigError;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};

/// Prefix shared by every environment override.
pub const ENV_PREFIX: &str = "OPTIMIZER_";

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
	/// Load configuration from file
	pub fn from_file<P: AsRef<Path>>(path: P) -> Result<EngineConfig> {
		let path = path.as_ref();
		info!("Loading configuration from {:?}", path);

		let contents = std::fs::read_to_string(path)
			.with_context(|| format!("Failed to read config file: {:?}", path))?;

		let config = match path.extension().and_then(|s| s.to_str()) {
			Some("toml") => Self::from_toml(&contents)?,
			Some("json") => Self::from_json(&contents)?,
			Some("yaml") | Some("yml") => Self::from_yaml(&contents)?,
			_ => anyhow::bail!("Unsupported config format: {:?}", path),
		};

		config.validate()?;
		Ok(config)
	}

	/// Load from TOML string
	pub fn from_toml(contents: &str) -> Result<EngineConfig> {
		toml::from_str(contents)
			.map_err(|e| ConfigError::ParseError(e.to_string()))
			.context("Failed to parse TOML")
	}

	/// Load from JSON string
	pub fn from_json(contents: &str) -> Result<EngineConfig> {
		serde_json::from_str(contents).context("Failed to parse JSON")
	}

	/// Load from YAML string
	pub fn from_yaml(contents: &str) -> Result<EngineConfig> {
		serde_yaml::from_str(contents).context("Failed to parse YAML")
	}

	/// Render a configuration as TOML, e.g. for `generate-config`.
	pub fn to_toml(config: &EngineConfig) -> Result<String> {
		toml::to_string_pretty(config).context("Failed to serialize configuration")
	}

	/// Load from environment variables with optional file override
	pub fn from_env_and_file(file_path: Option<&Path>) -> Result<EngineConfig> {
		let mut config = if let Some(path) = file_path {
			Self::from_file(path)?
		} else {
			EngineConfig::default()
		};

		Self::apply_overrides(&mut config, |key| std::env::var(key).ok())?;

		config.validate()?;
		Ok(config)
	}

	/// Apply `OPTIMIZER_*` overrides obtained through `lookup`.
	pub fn apply_overrides<F>(config: &mut EngineConfig, lookup: F) -> Result<()>
	where
		F: Fn(&str) -> Option<String>,
	{
		let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

		if let Some(level) = var("LOG_LEVEL") {
			debug!("Overriding log level from environment");
			config.engine.log_level = level;
		}

		if let Some(json) = var("JSON_LOGS") {
			config.engine.json_logs = json
				.parse()
				.with_context(|| format!("Invalid {}JSON_LOGS: {}", ENV_PREFIX, json))?;
		}

		if let Some(cap) = var("MAX_HOPS_CAP") {
			debug!("Overriding hop cap from environment");
			config.path_search.max_hops_cap = cap
				.parse()
				.with_context(|| format!("Invalid {}MAX_HOPS_CAP: {}", ENV_PREFIX, cap))?;
		}

		if let Some(budget) = var("PATH_TIME_BUDGET_MS") {
			config.path_search.time_budget_ms = budget
				.parse()
				.with_context(|| format!("Invalid {}PATH_TIME_BUDGET_MS: {}", ENV_PREFIX, budget))?;
		}

		if let Some(seed) = var("SELECTOR_SEED") {
			debug!("Overriding selector seed from environment");
			config.selector.seed = seed
				.parse()
				.with_context(|| format!("Invalid {}SELECTOR_SEED: {}", ENV_PREFIX, seed))?;
		}

		if let Some(budget) = var("SELECTOR_TIME_BUDGET_MS") {
			config.selector.time_budget_ms = budget.parse().with_context(|| {
				format!("Invalid {}SELECTOR_TIME_BUDGET_MS: {}", ENV_PREFIX, budget)
			})?;
		}

		Ok(())
	}
}

/// Load configuration from standard locations
pub fn load_config() -> Result<EngineConfig> {
	// Check for config file in order:
	// 1. Environment variable CONFIG_FILE
	// 2. ./config.toml
	// 3. ./config/optimizer.toml
	// 4. Default config with env overrides

	if let Ok(path) = std::env::var("CONFIG_FILE") {
		return ConfigLoader::from_env_and_file(Some(Path::new(&path)));
	}

	let paths = ["./config.toml", "./config/optimizer.toml"];

	for path in &paths {
		if Path::new(path).exists() {
			return ConfigLoader::from_env_and_file(Some(Path::new(path)));
		}
	}

	ConfigLoader::from_env_and_file(None)
}
