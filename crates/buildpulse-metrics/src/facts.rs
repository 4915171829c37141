//! Normalized build facts consumed by the aggregator

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use buildpulse_graph::ModuleNode;
use buildpulse_hooks::HookReport;
use buildpulse_ledger::LedgerReport;

/// General counts for one build pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralFacts {
    pub modules: usize,
    pub chunks: usize,
    pub assets: usize,
    pub entries: usize,
    pub warnings: usize,
    pub errors: usize,
    /// Wall-clock compilation time, milliseconds
    pub duration_ms: u64,
}

/// A named, sized build artifact (module or asset)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizedFact {
    pub name: String,
    pub size: u64,
}

/// One entry point's facts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryFact {
    pub name: String,
    /// Total emitted size reachable from this entry, bytes
    pub size: u64,
    pub module_count: usize,
    pub asset_count: usize,
}

/// Provider-specific facts after adapter normalization
///
/// Whatever shape the underlying build tool emits, the adapter reduces it to
/// this so the metric mapping stays provider-agnostic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderFacts {
    /// Provider name tag value (`webpack`, `esbuild`, ...)
    pub provider: String,
    pub modules: Vec<SizedFact>,
    pub assets: Vec<SizedFact>,
    pub entries: Vec<EntryFact>,
    pub warnings: usize,
    pub errors: usize,
    pub duration_ms: u64,
}

impl ProviderFacts {
    /// Derive the general counts from provider facts and the graph size
    pub fn general(&self, chunk_count: usize) -> GeneralFacts {
        GeneralFacts {
            modules: self.modules.len(),
            chunks: chunk_count,
            assets: self.assets.len(),
            entries: self.entries.len(),
            warnings: self.warnings,
            errors: self.errors,
            duration_ms: self.duration_ms,
        }
    }
}

/// Everything the aggregator consumes for one build pass
///
/// Populated exclusively from the other subsystems' `results()` outputs.
#[derive(Debug, Clone, Default)]
pub struct BuildFacts {
    pub general: GeneralFacts,
    pub hooks: HookReport,
    pub ledger: LedgerReport,
    pub graph: HashMap<String, ModuleNode>,
    pub provider: Option<ProviderFacts>,
}
