//! # buildpulse-ledger
//!
//! Begin/end lifecycle tracking for build-unit transformations.
//!
//! The ledger is independent of the hook monitor: it is fed directly by the
//! build tool's unit-build notifications. Duplicate or out-of-order events
//! are expected under concurrent unit builds and must never crash.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;
use tracing::debug;

/// Label substituted when a unit was built without any transformer
///
/// Keeps untransformed units visible in per-transformer aggregation.
pub const NO_TRANSFORMER: &str = "no-transformer";

/// A finished begin/end pair for one unit's transformation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderEvent {
    /// Build unit key (normalized module name)
    pub unit: String,
    /// Transformer (loader) names applied, in application order
    pub transformers: Vec<String>,
    /// Wall-clock begin
    pub started_at: DateTime<Utc>,
    /// Wall-clock end
    pub ended_at: DateTime<Utc>,
    /// Measured duration in milliseconds
    pub duration_ms: u64,
}

/// An in-flight event awaiting its `end` call
#[derive(Debug)]
struct OpenEvent {
    transformers: Vec<String>,
    started_at: DateTime<Utc>,
    started: Instant,
}

/// Per-unit timing totals
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnitTotals {
    /// Total transformation time across rebuilds, milliseconds
    pub duration_ms: u64,
    /// Number of finished events for this unit
    pub count: u64,
    /// The finished events themselves, in completion order
    pub events: Vec<LoaderEvent>,
}

/// Per-transformer timing totals
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransformerTotals {
    /// Total time spent in units that used this transformer, milliseconds
    pub duration_ms: u64,
    /// Number of finished events that used this transformer
    pub count: u64,
}

/// Folded view of the finished sequence
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerReport {
    /// Totals keyed by unit
    pub units: HashMap<String, UnitTotals>,
    /// Totals keyed by transformer name
    pub transformers: HashMap<String, TransformerTotals>,
}

/// Tracks begin/end lifecycle events per build unit
///
/// Owned by exactly one build pass; all mutation goes through [`begin`] and
/// [`end`], all reads through [`results`].
///
/// [`begin`]: TimingLedger::begin
/// [`end`]: TimingLedger::end
/// [`results`]: TimingLedger::results
#[derive(Debug, Default)]
pub struct TimingLedger {
    in_flight: HashMap<String, OpenEvent>,
    finished: Vec<LoaderEvent>,
}

impl TimingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an event for `unit`
    ///
    /// A second `begin` for the same unit without an intervening `end`
    /// overwrites the in-flight entry; one `end` then flushes it.
    pub fn begin(&mut self, unit: &str, transformers: &[String]) {
        let transformers = if transformers.is_empty() {
            vec![NO_TRANSFORMER.to_string()]
        } else {
            transformers.to_vec()
        };

        self.in_flight.insert(
            unit.to_string(),
            OpenEvent {
                transformers,
                started_at: Utc::now(),
                started: Instant::now(),
            },
        );
    }

    /// Close the event for `unit`
    ///
    /// An `end` with no matching open `begin` is a no-op: duplicate and
    /// out-of-order end events happen under concurrent unit builds.
    pub fn end(&mut self, unit: &str) {
        let Some(open) = self.in_flight.remove(unit) else {
            debug!("end without begin for unit {}, ignoring", unit);
            return;
        };

        let duration_ms = open.started.elapsed().as_millis() as u64;
        self.finished.push(LoaderEvent {
            unit: unit.to_string(),
            transformers: open.transformers,
            started_at: open.started_at,
            ended_at: Utc::now(),
            duration_ms,
        });
    }

    /// Number of finished events so far
    pub fn finished_count(&self) -> usize {
        self.finished.len()
    }

    /// Fold the finished sequence into per-unit and per-transformer totals
    pub fn results(&self) -> LedgerReport {
        let mut report = LedgerReport::default();

        for event in &self.finished {
            let unit = report.units.entry(event.unit.clone()).or_default();
            unit.duration_ms += event.duration_ms;
            unit.count += 1;
            unit.events.push(event.clone());

            for name in &event.transformers {
                let transformer = report.transformers.entry(name.clone()).or_default();
                transformer.duration_ms += event.duration_ms;
                transformer.count += 1;
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_without_begin_is_noop() {
        let mut ledger = TimingLedger::new();
        ledger.end("a.js");
        ledger.end("a.js");

        let report = ledger.results();
        assert!(report.units.is_empty());
        assert!(report.transformers.is_empty());
    }

    #[test]
    fn test_begin_end_produces_one_event() {
        let mut ledger = TimingLedger::new();
        ledger.begin("a.js", &["babel-loader".to_string()]);
        ledger.end("a.js");

        let report = ledger.results();
        assert_eq!(report.units["a.js"].count, 1);
        assert_eq!(report.transformers["babel-loader"].count, 1);
    }

    #[test]
    fn test_double_begin_overwrites_in_flight() {
        let mut ledger = TimingLedger::new();
        ledger.begin("a.js", &["loaderX".to_string()]);
        ledger.begin("a.js", &["loaderX".to_string()]);
        ledger.end("a.js");

        let report = ledger.results();
        assert_eq!(report.units["a.js"].count, 1);
        assert_eq!(report.units["a.js"].events.len(), 1);

        // The in-flight entry was consumed; a second end is a no-op.
        ledger.end("a.js");
        assert_eq!(ledger.results().units["a.js"].count, 1);
    }

    #[test]
    fn test_empty_transformers_use_sentinel() {
        let mut ledger = TimingLedger::new();
        ledger.begin("raw.css", &[]);
        ledger.end("raw.css");

        let report = ledger.results();
        assert_eq!(report.transformers[NO_TRANSFORMER].count, 1);
        assert_eq!(
            report.units["raw.css"].events[0].transformers,
            vec![NO_TRANSFORMER.to_string()]
        );
    }

    #[test]
    fn test_key_reuse_across_rebuilds() {
        let mut ledger = TimingLedger::new();
        ledger.begin("a.js", &["loaderX".to_string()]);
        ledger.end("a.js");
        ledger.begin("a.js", &["loaderX".to_string()]);
        ledger.end("a.js");

        let report = ledger.results();
        assert_eq!(report.units["a.js"].count, 2);
        assert_eq!(report.transformers["loaderX"].count, 2);
    }

    #[test]
    fn test_multi_transformer_event_counts_each() {
        let mut ledger = TimingLedger::new();
        ledger.begin(
            "style.scss",
            &["sass-loader".to_string(), "css-loader".to_string()],
        );
        ledger.end("style.scss");

        let report = ledger.results();
        assert_eq!(report.transformers.len(), 2);
        assert_eq!(report.transformers["sass-loader"].count, 1);
        assert_eq!(report.transformers["css-loader"].count, 1);
    }
}
