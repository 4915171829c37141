//! # buildpulse-core
//!
//! Core types for the buildpulse build telemetry system.
//!
//! buildpulse observes a plugin-based build orchestrator from the outside:
//! it times every hook invocation, reconstructs the module dependency graph,
//! tracks per-unit transformation timing, and reduces everything to a single
//! metric schema before emission.
//!
//! ## Core Paradigm
//!
//! - Observability never breaks the build (fail-open everywhere)
//! - All cross-component data flow happens through `results()`-style reports
//! - Every timing/graph store is scoped to one build pass, never global

mod config;
mod error;
mod types;

pub mod fail_open;

pub use config::{FilterThresholds, PulseConfig};
pub use error::{PulseError, Result};
pub use types::*;
