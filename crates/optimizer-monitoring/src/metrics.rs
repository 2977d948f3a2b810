//! Solve metrics.
//!
//! Counters and rolling timing statistics for engine solves, kept per solver
//! family. The batch runner records one sample per request; the reporter in
//! `optimizer-core` times each algorithm with [`Timer`].

use optimizer_types::SolverKind;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// Samples kept per solver for percentile calculations.
const MAX_SAMPLES: usize = 1000;

/// Represents different types of metric values.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
	Counter(u64),
	Gauge(f64),
}

/// A metric with associated metadata.
#[derive(Debug, Clone)]
pub struct Metric {
	pub name: String,
	pub value: MetricValue,
	pub tags: HashMap<String, String>,
	pub description: String,
}

impl Metric {
	pub fn counter(name: impl Into<String>, value: u64) -> Self {
		Self {
			name: name.into(),
			value: MetricValue::Counter(value),
			tags: HashMap::new(),
			description: String::new(),
		}
	}

	pub fn gauge(name: impl Into<String>, value: f64) -> Self {
		Self {
			name: name.into(),
			value: MetricValue::Gauge(value),
			tags: HashMap::new(),
			description: String::new(),
		}
	}

	pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.tags.insert(key.into(), value.into());
		self
	}

	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.description = description.into();
		self
	}
}

/// Trait for components that collect and expose metrics.
pub trait MetricsCollector: Send + Sync {
	/// Collects current metric values from this collector.
	fn collect(&self) -> Vec<Metric>;
	/// Returns the name of this metrics collector.
	fn name(&self) -> &str;
}

#[derive(Debug, Default)]
struct SolverSamples {
	solves: u64,
	errors: u64,
	timeouts: u64,
	optimized_wins: u64,
	durations: Vec<Duration>,
}

/// Aggregated statistics for one solver family.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveStats {
	pub solves: u64,
	pub errors: u64,
	pub timeouts: u64,
	pub optimized_wins: u64,
	pub avg_duration: Duration,
	pub p95_duration: Duration,
}

/// Outcome of one successful solve, as seen by the metrics collector.
#[derive(Debug, Clone, Copy)]
pub struct SolveSample {
	pub kind: SolverKind,
	pub duration: Duration,
	pub timed_out: bool,
	pub optimized_won: bool,
}

/// Collector for engine solve metrics.
///
/// Maintains a rolling window of the last 1000 durations per solver family
/// for percentile calculations.
#[derive(Clone)]
pub struct SolveMetricsCollector {
	name: String,
	samples: Arc<RwLock<BTreeMap<SolverKind, SolverSamples>>>,
}

impl SolveMetricsCollector {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			samples: Arc::new(RwLock::new(BTreeMap::new())),
		}
	}

	pub async fn record_solve(&self, sample: SolveSample) {
		let mut samples = self.samples.write().await;
		let entry = samples.entry(sample.kind).or_default();
		entry.solves += 1;
		if sample.timed_out {
			entry.timeouts += 1;
		}
		if sample.optimized_won {
			entry.optimized_wins += 1;
		}
		entry.durations.push(sample.duration);

		if entry.durations.len() > MAX_SAMPLES {
			let drain_to = entry.durations.len() - MAX_SAMPLES;
			entry.durations.drain(..drain_to);
		}

		debug!(solver = %sample.kind, "Recorded solve time: {:?}", sample.duration);
	}

	pub async fn record_error(&self, kind: SolverKind) {
		let mut samples = self.samples.write().await;
		samples.entry(kind).or_default().errors += 1;

		debug!(solver = %kind, "Recorded solve error");
	}

	/// Statistics for every solver family that has recorded anything.
	pub async fn stats(&self) -> BTreeMap<SolverKind, SolveStats> {
		let samples = self.samples.read().await;
		samples
			.iter()
			.map(|(kind, samples)| (*kind, summarize(samples)))
			.collect()
	}

	pub async fn collect_metrics(&self) -> Vec<Metric> {
		let stats = self.stats().await;
		let mut metrics = Vec::new();

		for (kind, stats) in stats {
			let solver = kind.as_str();
			metrics.push(
				Metric::counter("engine.solves.total", stats.solves)
					.with_tag("solver", solver)
					.with_description("Total number of successful solves"),
			);
			metrics.push(
				Metric::counter("engine.errors.total", stats.errors)
					.with_tag("solver", solver)
					.with_description("Total number of rejected requests"),
			);
			metrics.push(
				Metric::counter("engine.timeouts.total", stats.timeouts)
					.with_tag("solver", solver)
					.with_description("Solves whose search budget ran out"),
			);
			metrics.push(
				Metric::counter("engine.optimized_wins.total", stats.optimized_wins)
					.with_tag("solver", solver)
					.with_description("Solves won by the optimized algorithm"),
			);
			metrics.push(
				Metric::gauge("engine.solve_time.avg_ms", millis(stats.avg_duration))
					.with_tag("solver", solver)
					.with_description("Average solve time in milliseconds"),
			);
			metrics.push(
				Metric::gauge("engine.solve_time.p95_ms", millis(stats.p95_duration))
					.with_tag("solver", solver)
					.with_description("95th percentile solve time in milliseconds"),
			);
		}

		metrics
	}
}

impl MetricsCollector for SolveMetricsCollector {
	fn collect(&self) -> Vec<Metric> {
		futures::executor::block_on(self.collect_metrics())
	}

	fn name(&self) -> &str {
		&self.name
	}
}

fn summarize(samples: &SolverSamples) -> SolveStats {
	let (avg_duration, p95_duration) = if samples.durations.is_empty() {
		(Duration::ZERO, Duration::ZERO)
	} else {
		let total_nanos: u128 = samples.durations.iter().map(Duration::as_nanos).sum();
		let avg = Duration::from_nanos((total_nanos / samples.durations.len() as u128) as u64);

		let mut sorted = samples.durations.clone();
		sorted.sort();
		let p95_idx = ((sorted.len() as f64 * 0.95) as usize).min(sorted.len() - 1);
		(avg, sorted[p95_idx])
	};

	SolveStats {
		solves: samples.solves,
		errors: samples.errors,
		timeouts: samples.timeouts,
		optimized_wins: samples.optimized_wins,
		avg_duration,
		p95_duration,
	}
}

/// Duration as fractional milliseconds.
pub fn millis(duration: Duration) -> f64 {
	duration.as_secs_f64() * 1_000.0
}

/// Utility for measuring execution duration.
pub struct Timer {
	start: Instant,
}

impl Timer {
	pub fn new() -> Self {
		Self {
			start: Instant::now(),
		}
	}

	pub fn elapsed(&self) -> Duration {
		self.start.elapsed()
	}

	/// Consumes the timer and returns the final elapsed duration.
	pub fn finish(self) -> Duration {
		self.elapsed()
	}
}

impl Default for Timer {
	fn default() -> Self {
		Self::new()
	}
}

/// Macro for timing synchronous operations.
///
/// Executes the provided expression and returns a tuple of
/// (result, duration). Also logs the duration at debug level.
#[macro_export]
macro_rules! time_operation {
	($name:expr, $operation:expr) => {{
		let timer = $crate::metrics::Timer::new();
		let result = $operation;
		let duration = timer.finish();
		tracing::debug!("Operation '{}' took {:?}", $name, duration);
		(result, duration)
	}};
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample(kind: SolverKind, ms: u64) -> SolveSample {
		SolveSample {
			kind,
			duration: Duration::from_millis(ms),
			timed_out: false,
			optimized_won: true,
		}
	}

	#[tokio::test]
	async fn test_records_per_solver() {
		let collector = SolveMetricsCollector::new("engine");
		collector.record_solve(sample(SolverKind::Scheduler, 2)).await;
		collector.record_solve(sample(SolverKind::Scheduler, 4)).await;
		collector.record_error(SolverKind::Selector).await;

		let stats = collector.stats().await;
		let scheduler = &stats[&SolverKind::Scheduler];
		assert_eq!(scheduler.solves, 2);
		assert_eq!(scheduler.optimized_wins, 2);
		assert_eq!(scheduler.avg_duration, Duration::from_millis(3));
		assert_eq!(scheduler.p95_duration, Duration::from_millis(4));

		let selector = &stats[&SolverKind::Selector];
		assert_eq!(selector.solves, 0);
		assert_eq!(selector.errors, 1);
		assert_eq!(selector.avg_duration, Duration::ZERO);
	}

	#[tokio::test]
	async fn test_rolling_window() {
		let collector = SolveMetricsCollector::new("engine");
		for _ in 0..(MAX_SAMPLES + 10) {
			collector.record_solve(sample(SolverKind::Scorer, 1)).await;
		}
		let samples = collector.samples.read().await;
		let scorer = &samples[&SolverKind::Scorer];
		assert_eq!(scorer.durations.len(), MAX_SAMPLES);
		assert_eq!(scorer.solves, (MAX_SAMPLES + 10) as u64);
	}

	#[tokio::test]
	async fn test_collect_metrics_tags() {
		let collector = SolveMetricsCollector::new("engine");
		collector
			.record_solve(SolveSample {
				kind: SolverKind::PathSearch,
				duration: Duration::from_millis(1),
				timed_out: true,
				optimized_won: false,
			})
			.await;

		let metrics = collector.collect_metrics().await;
		let timeouts = metrics
			.iter()
			.find(|m| m.name == "engine.timeouts.total")
			.unwrap();
		assert_eq!(timeouts.value, MetricValue::Counter(1));
		assert_eq!(timeouts.tags.get("solver").map(String::as_str), Some("path-search"));
	}

	#[test]
	fn test_time_operation_macro() {
		let (value, duration) = crate::time_operation!("sum", (1..=10).sum::<u32>());
		assert_eq!(value, 55);
		assert!(duration >= Duration::ZERO);
	}
}
