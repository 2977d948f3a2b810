//! Monitoring and observability for the optimization engine.
//!
//! This crate provides tracing initialization and solve metrics. Operators
//! use it to see how often each solver runs, how long the two algorithms
//! take, and how often a search budget ran out.
//!
//! # Components
//!
//! - `metrics`: per-solver counters and rolling solve-time statistics
//! - `tracing`: subscriber setup (pretty or JSON output)

pub mod metrics;
pub mod tracing;
