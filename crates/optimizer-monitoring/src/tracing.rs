use std::str::FromStr;
use tracing::{info, Level};
use tracing_subscriber::{
	fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Tracing configuration
#[derive(Debug, Clone)]
pub struct TracingConfig {
	pub level: Level,
	pub with_thread_ids: bool,
	pub with_thread_names: bool,
	pub with_file_and_line: bool,
	pub with_target: bool,
	pub with_span_events: FmtSpan,
	pub json_format: bool,
}

impl Default for TracingConfig {
	fn default() -> Self {
		Self {
			level: Level::INFO,
			with_thread_ids: false,
			with_thread_names: false,
			with_file_and_line: false,
			with_target: true,
			with_span_events: FmtSpan::NONE,
			json_format: false,
		}
	}
}

impl TracingConfig {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_level(mut self, level: Level) -> Self {
		self.level = level;
		self
	}

	/// Parse a level name such as `"debug"`; unknown names fall back to INFO.
	pub fn with_level_str(self, level: &str) -> Self {
		let level = Level::from_str(level).unwrap_or(Level::INFO);
		self.with_level(level)
	}

	pub fn debug() -> Self {
		Self {
			level: Level::DEBUG,
			with_thread_ids: true,
			with_thread_names: true,
			with_file_and_line: true,
			with_target: true,
			with_span_events: FmtSpan::CLOSE,
			json_format: false,
		}
	}

	pub fn production() -> Self {
		Self {
			level: Level::INFO,
			with_thread_ids: false,
			with_thread_names: false,
			with_file_and_line: false,
			with_target: false,
			with_span_events: FmtSpan::NONE,
			json_format: true,
		}
	}

	/// Preset for a command-line run: `production()` for JSON output,
	/// `debug()` at debug or trace level, plain defaults otherwise.
	pub fn for_cli(level: &str, json: bool) -> Self {
		let base = Self::new().with_level_str(level);
		let preset = if json {
			Self::production()
		} else if base.level <= Level::INFO {
			Self::new()
		} else {
			Self::debug()
		};
		preset.with_level(base.level)
	}

	/// Filter honouring `RUST_LOG` first, then the configured level.
	fn env_filter(&self) -> EnvFilter {
		EnvFilter::try_from_default_env()
			.unwrap_or_else(|_| EnvFilter::new(self.level.to_string().to_lowercase()))
	}
}

/// Initialize tracing with the given configuration
pub fn init_tracing(config: TracingConfig) -> Result<(), Box<dyn std::error::Error>> {
	let subscriber = tracing_subscriber::registry().with(config.env_filter());

	if config.json_format {
		let json_layer = tracing_subscriber::fmt::layer()
			.json()
			.with_writer(std::io::stderr)
			.with_span_events(config.with_span_events.clone())
			.with_thread_ids(config.with_thread_ids)
			.with_thread_names(config.with_thread_names)
			.with_file(config.with_file_and_line)
			.with_line_number(config.with_file_and_line)
			.with_target(config.with_target);

		subscriber
			.with(json_layer)
			.try_init()
			.map_err(|e| format!("Failed to initialize tracing: {}", e))?;
	} else {
		let fmt_layer = tracing_subscriber::fmt::layer()
			.with_writer(std::io::stderr)
			.with_span_events(config.with_span_events.clone())
			.with_thread_ids(config.with_thread_ids)
			.with_thread_names(config.with_thread_names)
			.with_file(config.with_file_and_line)
			.with_line_number(config.with_file_and_line)
			.with_target(config.with_target);

		subscriber
			.with(fmt_layer)
			.try_init()
			.map_err(|e| format!("Failed to initialize tracing: {}", e))?;
	}

	info!("Tracing initialized with level: {:?}", config.level);
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_level_parsing() {
		assert_eq!(TracingConfig::new().with_level_str("debug").level, Level::DEBUG);
		assert_eq!(TracingConfig::new().with_level_str("WARN").level, Level::WARN);
		assert_eq!(TracingConfig::new().with_level_str("loud").level, Level::INFO);
	}

	#[test]
	fn test_presets() {
		assert!(TracingConfig::production().json_format);
		assert_eq!(TracingConfig::debug().level, Level::DEBUG);
		assert!(!TracingConfig::default().json_format);
	}

	#[test]
	fn test_cli_presets() {
		let json = TracingConfig::for_cli("warn", true);
		assert!(json.json_format);
		assert!(!json.with_target);
		assert_eq!(json.level, Level::WARN);

		let verbose = TracingConfig::for_cli("trace", false);
		assert!(verbose.with_file_and_line);
		assert_eq!(verbose.level, Level::TRACE);

		let plain = TracingConfig::for_cli("info", false);
		assert!(!plain.with_file_and_line);
		assert!(!plain.json_format);
	}
}
