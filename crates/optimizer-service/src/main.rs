use anyhow::{anyhow, Context, Result};
use clap::Parser;
use optimizer_config::{load_config, ConfigLoader, EngineConfig};
use optimizer_core::OptimizationEngine;
use optimizer_monitoring::metrics::{MetricValue, MetricsCollector, SolveMetricsCollector};
use optimizer_monitoring::tracing::{init_tracing, TracingConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

mod cli;
mod runner;

use cli::{Args, Command};

#[tokio::main]
async fn main() -> Result<()> {
	let args = Args::parse();

	match args.command {
		Command::Solve { ref request } => {
			let config = engine_config(&args)?;
			solve(config, request).await
		}
		Command::Batch {
			ref file,
			concurrency,
		} => {
			let config = engine_config(&args)?;
			batch(config, file, concurrency).await
		}
		Command::Validate { ref file } => {
			setup_tracing(args.log_level.as_deref().unwrap_or("info"), args.json_logs)?;
			validate_config(file)
		}
		Command::GenerateConfig { ref output } => {
			setup_tracing(args.log_level.as_deref().unwrap_or("info"), args.json_logs)?;
			generate_config(output.clone())
		}
	}
}

/// Load configuration, apply command-line overrides and start tracing.
fn engine_config(args: &Args) -> Result<EngineConfig> {
	let mut config = match &args.config {
		Some(path) => ConfigLoader::from_env_and_file(Some(path.as_path())),
		None => load_config(),
	}
	.context("Failed to load configuration")?;

	if let Some(level) = &args.log_level {
		config.engine.log_level = level.clone();
	}
	if args.json_logs {
		config.engine.json_logs = true;
	}

	setup_tracing(&config.engine.log_level, config.engine.json_logs)?;
	info!("Engine name: {}", config.engine.name);
	Ok(config)
}

fn setup_tracing(log_level: &str, json: bool) -> Result<()> {
	init_tracing(TracingConfig::for_cli(log_level, json)).map_err(|e| anyhow!("{}", e))
}

async fn solve(config: EngineConfig, path: &Path) -> Result<()> {
	let request = runner::read_request(path)?;
	info!("Solving {} request from {:?}", request.kind(), path);

	let engine = OptimizationEngine::new(config);
	let response = tokio::task::spawn_blocking(move || engine.solve(&request))
		.await
		.context("Solver task failed")?
		.context("Request rejected")?;

	println!("{}", serde_json::to_string_pretty(&response)?);
	Ok(())
}

async fn batch(config: EngineConfig, path: &Path, concurrency: Option<usize>) -> Result<()> {
	let requests = runner::read_batch(path)?;
	let concurrency = concurrency.unwrap_or_else(|| {
		std::thread::available_parallelism()
			.map(|n| n.get())
			.unwrap_or(1)
	});

	let engine = Arc::new(OptimizationEngine::new(config));
	let metrics = SolveMetricsCollector::new("engine");
	let entries = runner::run_batch(engine, requests, concurrency, &metrics).await?;

	println!("{}", serde_json::to_string_pretty(&entries)?);
	print_metrics(&metrics);
	Ok(())
}

fn print_metrics(collector: &dyn MetricsCollector) {
	eprintln!("Metrics ({}):", collector.name());
	for metric in collector.collect() {
		let solver = metric.tags.get("solver").map(String::as_str).unwrap_or("-");
		match metric.value {
			MetricValue::Counter(v) => eprintln!("  {} [{}]: {}", metric.name, solver, v),
			MetricValue::Gauge(v) => eprintln!("  {} [{}]: {:.3}", metric.name, solver, v),
		}
	}
}

fn validate_config(path: &Path) -> Result<()> {
	info!("Validating configuration file: {:?}", path);

	let config = ConfigLoader::from_file(path).context("Failed to load configuration")?;

	info!("Configuration is valid");
	info!("Engine name: {}", config.engine.name);
	info!(
		"Path search: default {} hops, cap {}, {} paths, {}ms",
		config.path_search.default_max_hops,
		config.path_search.max_hops_cap,
		config.path_search.max_paths,
		config.path_search.time_budget_ms
	);
	info!(
		"Selector: exact up to {} candidates, seed {}",
		config.selector.exact_limit, config.selector.seed
	);
	info!(
		"Partitioner: up to {} batches",
		config.partitioner.max_batches_cap
	);
	Ok(())
}

fn generate_config(output: PathBuf) -> Result<()> {
	let rendered = ConfigLoader::to_toml(&EngineConfig::default())?;
	std::fs::write(&output, rendered)
		.with_context(|| format!("Failed to write configuration to {:?}", output))?;
	info!("Configuration written to {:?}", output);
	Ok(())
}
