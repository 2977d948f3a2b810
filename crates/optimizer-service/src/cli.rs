//! Command-line interface definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "optimizer")]
#[command(about = "Execution optimization engine", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
	/// Path to configuration file
	#[arg(short, long, global = true, env = "CONFIG_FILE")]
	pub config: Option<PathBuf>,

	/// Log level override (trace, debug, info, warn, error)
	#[arg(short, long, global = true, env = "OPTIMIZER_LOG_LEVEL")]
	pub log_level: Option<String>,

	/// Emit JSON log lines
	#[arg(long, global = true)]
	pub json_logs: bool,

	/// Subcommand to execute
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Solve one request
	#[command(about = "Solve a single enveloped request and print the response")]
	Solve {
		/// JSON file holding `{"solver": ..., "request": {...}}`
		request: PathBuf,
	},

	/// Solve many requests concurrently
	#[command(about = "Solve a JSON array of enveloped requests and print results in order")]
	Batch {
		/// JSON file holding an array of enveloped requests
		file: PathBuf,

		/// Maximum requests solved at once
		#[arg(short = 'j', long)]
		concurrency: Option<usize>,
	},

	/// Validate configuration file
	#[command(about = "Validate an engine configuration file")]
	Validate {
		/// Path to configuration file to validate
		#[arg(help = "Configuration file to validate")]
		file: PathBuf,
	},

	/// Generate example configuration
	#[command(about = "Generate a configuration file with every default spelled out")]
	GenerateConfig {
		/// Output file path
		#[arg(short, long, default_value = "config.toml")]
		#[arg(help = "Output path for the generated configuration")]
		output: PathBuf,
	},
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_batch() {
		let args =
			Args::try_parse_from(["optimizer", "--json-logs", "batch", "reqs.json", "-j", "4"])
				.unwrap();
		assert!(args.json_logs);
		match args.command {
			Command::Batch { file, concurrency } => {
				assert_eq!(file, PathBuf::from("reqs.json"));
				assert_eq!(concurrency, Some(4));
			}
			other => panic!("unexpected command: {:?}", other),
		}
	}

	#[test]
	fn test_global_flags_after_subcommand() {
		let args =
			Args::try_parse_from(["optimizer", "solve", "r.json", "--log-level", "debug"]).unwrap();
		assert_eq!(args.log_level.as_deref(), Some("debug"));
		assert!(matches!(args.command, Command::Solve { .. }));
	}

	#[test]
	fn test_generate_config_default_output() {
		let args = Args::try_parse_from(["optimizer", "generate-config"]).unwrap();
		match args.command {
			Command::GenerateConfig { output } => assert_eq!(output, PathBuf::from("config.toml")),
			other => panic!("unexpected command: {:?}", other),
		}
	}

	#[test]
	fn test_validate_takes_its_own_file() {
		let args =
			Args::try_parse_from(["optimizer", "-c", "engine.toml", "validate", "other.toml"])
				.unwrap();
		assert_eq!(args.config, Some(PathBuf::from("engine.toml")));
		match args.command {
			Command::Validate { file } => assert_eq!(file, PathBuf::from("other.toml")),
			other => panic!("unexpected command: {:?}", other),
		}
	}

	#[test]
	fn test_subcommand_required() {
		assert!(Args::try_parse_from(["optimizer"]).is_err());
	}
}
