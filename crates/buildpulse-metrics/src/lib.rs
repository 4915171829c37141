//! # buildpulse-metrics
//!
//! Normalizes heterogeneous build facts into one metric schema and decides,
//! via a composable filter chain, what is worth emitting.
//!
//! Data flows in from the other subsystems' `results()` contracts only: the
//! hook monitor's report, the timing ledger's report, the finalized graph,
//! and a provider-specific stats shape normalized by a thin adapter.

mod adapters;
mod aggregate;
mod facts;
mod filters;
mod sendable;

pub use adapters::{adapter_for, EsbuildAdapter, StatsAdapter, WebpackAdapter};
pub use aggregate::aggregate;
pub use facts::{BuildFacts, EntryFact, GeneralFacts, ProviderFacts, SizedFact};
pub use filters::{
    apply_filters, default_filters, drop_noise, drop_tree_metrics, threshold, MetricFilter,
};
pub use sendable::to_sendable;
