//! Configuration validation utility
//!
//! Usage: cargo run --bin validate-config config/optimizer.toml

use std::env;
use std::process;

use optimizer_config::ConfigLoader;

fn main() {
	let args: Vec<String> = env::args().collect();

	if args.len() != 2 {
		eprintln!("Usage: {} <config-file>", args[0]);
		process::exit(1);
	}

	let config_path = &args[1];

	println!("Validating configuration file: {}", config_path);

	match ConfigLoader::from_file(config_path) {
		Ok(config) => {
			println!("✅ Configuration is valid!");
			println!("Engine name: {}", config.engine.name);
			println!(
				"Path search: default {} hops, cap {} hops",
				config.path_search.default_max_hops, config.path_search.max_hops_cap
			);
			println!("Scheduler task limit: {}", config.scheduler.max_tasks);
			println!(
				"Selector: exact up to {} candidates, seed {}",
				config.selector.exact_limit, config.selector.seed
			);
			println!("Partitioner batch cap: {}", config.partitioner.max_batches_cap);
		}
		Err(e) => {
			eprintln!("❌ Configuration validation failed:");
			eprintln!("{:#}", e);
			process::exit(1);
		}
	}
}
