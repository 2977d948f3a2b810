//! Solvers of the execution optimization engine.
//!
//! Every solver pairs a cheap classical baseline with a stronger optimized
//! algorithm. Both run on the same validated input through the shared
//! [`reporter::run_comparison`], which times them and lets the solver merge
//! the two outcomes into a response with a winner.
//!
//! # Solvers
//!
//! - `path_search`: best-output routes over constant-product pools
//! - `scheduler`: conflict-free execution slots via greedy coloring
//! - `selector`: multi-budget selection (branch-and-bound or annealing)
//! - `partitioner`: convex-cost batch splitting
//! - `scorer`: ranking under two weight profiles
//!
//! [`OptimizationEngine`] wraps all of them behind one configuration.

pub mod budget;
pub mod engine;
pub mod partitioner;
pub mod path_search;
pub mod pricing;
pub mod reporter;
pub mod scheduler;
pub mod scorer;
pub mod selector;

pub use budget::SearchBudget;
pub use engine::OptimizationEngine;
pub use reporter::{run_comparison, DualSolver, Timed};
