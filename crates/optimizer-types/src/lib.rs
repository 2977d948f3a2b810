//! Shared data model for the execution optimization engine.
//!
//! This crate holds the request and response types of every solver, the
//! pool graph model and the error taxonomy. Nothing here performs any
//! search; the algorithms live in `optimizer-core`.
//!
//! # Modules
//!
//! - `graph`: constant-product pools
//! - `path`: best-output route search
//! - `schedule`: conflict-free slot scheduling
//! - `selection`: multi-budget candidate selection
//! - `partition`: convex-cost batch partitioning
//! - `scoring`: weighted feature ranking
//! - `envelope`: tagged wrappers carrying any of the above

pub mod common;
pub mod envelope;
pub mod errors;
pub mod graph;
pub mod partition;
pub mod path;
pub mod schedule;
pub mod scoring;
pub mod selection;

pub use common::*;
pub use envelope::*;
pub use errors::{ErrorKind, OptimizerError, Result};
pub use graph::*;
pub use partition::*;
pub use path::*;
pub use schedule::*;
pub use scoring::*;
pub use selection::*;
