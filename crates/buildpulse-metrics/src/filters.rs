//! Composable metric filter chain
//!
//! A filter is a pure `Metric → Option<Metric>`: `None` vetoes the metric
//! and short-circuits the rest of the chain; `Some` may return the metric
//! unchanged or transformed. Chain order is fixed and significant.

use regex::Regex;
use std::sync::LazyLock;

use buildpulse_core::{FilterThresholds, Metric, MetricKind};

/// A boxed filter stage
pub type MetricFilter = Box<dyn Fn(Metric) -> Option<Metric> + Send + Sync>;

/// Run `metric` through the chain in order, stopping at the first veto
pub fn apply_filters(metric: Metric, filters: &[MetricFilter]) -> Option<Metric> {
    let mut current = metric;
    for filter in filters {
        current = filter(current)?;
    }
    Some(current)
}

/// The built-in chain: tree veto, noise veto, then thresholding
///
/// With `keep_tree_metrics` the tree veto is omitted so the opt-in actually
/// reaches emission.
pub fn default_filters(thresholds: FilterThresholds, keep_tree_metrics: bool) -> Vec<MetricFilter> {
    let mut chain: Vec<MetricFilter> = Vec::new();
    if !keep_tree_metrics {
        chain.push(drop_tree_metrics());
    }
    chain.push(drop_noise());
    chain.push(threshold(thresholds));
    chain
}

/// Veto the per-entry transitive tree metrics regardless of value
pub fn drop_tree_metrics() -> MetricFilter {
    Box::new(|metric| {
        if metric.name.starts_with("modules.tree.") {
            None
        } else {
            Some(metric)
        }
    })
}

/// Veto sourcemap and third-party-dependency noise
pub fn drop_noise() -> MetricFilter {
    Box::new(|metric| {
        let noisy =
            metric.any_tag(|t| t.ends_with(".map") || t.contains("node_modules"));
        if noisy {
            None
        } else {
            Some(metric)
        }
    })
}

/// Per-name-pattern threshold overrides
static BYPASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^entries\.(size|modules\.count)$").unwrap());
static RELAXED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^modules\.(dependencies|dependents)$").unwrap());

/// Relaxed minimum for dependency/dependent count metrics
const RELAXED_COUNT_THRESHOLD: f64 = 30.0;

/// Veto metrics below their kind's minimum value
///
/// A value equal to the threshold survives. Entry size and entry module
/// count bypass thresholding entirely; dependency/dependent counts use the
/// relaxed minimum.
pub fn threshold(thresholds: FilterThresholds) -> MetricFilter {
    Box::new(move |metric| {
        if BYPASS.is_match(&metric.name) {
            return Some(metric);
        }

        let minimum = if RELAXED.is_match(&metric.name) {
            RELAXED_COUNT_THRESHOLD
        } else {
            match metric.kind {
                MetricKind::Count => thresholds.count,
                MetricKind::Size => thresholds.size,
                MetricKind::Duration => thresholds.duration,
            }
        };

        if metric.value >= minimum {
            Some(metric)
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use buildpulse_core::tag;

    fn chain() -> Vec<MetricFilter> {
        default_filters(FilterThresholds::default(), false)
    }

    #[test]
    fn test_value_equal_to_threshold_survives() {
        let filters = chain();
        let at_threshold = Metric::count("warnings.count", 10.0, vec![]);
        assert!(apply_filters(at_threshold, &filters).is_some());

        let below = Metric::count("warnings.count", 9.0, vec![]);
        assert!(apply_filters(below, &filters).is_none());
    }

    #[test]
    fn test_tree_metric_vetoed_before_threshold() {
        let filters = chain();
        // Value far above every threshold; the first filter vetoes anyway.
        let tree = Metric::count(
            "modules.tree.count",
            500.0,
            vec![tag("entryModule", "src/index.js")],
        );
        assert!(apply_filters(tree, &filters).is_none());
    }

    #[test]
    fn test_keep_tree_metrics_omits_tree_veto() {
        let filters = default_filters(FilterThresholds::default(), true);
        let tree = Metric::count("modules.tree.count", 500.0, vec![]);
        assert!(apply_filters(tree, &filters).is_some());
    }

    #[test]
    fn test_noise_vetoed() {
        let filters = chain();
        let sourcemap = Metric::size(
            "assets.size",
            999_999.0,
            vec![tag("assetName", "main.js.map")],
        );
        assert!(apply_filters(sourcemap, &filters).is_none());

        let third_party = Metric::size(
            "modules.size",
            999_999.0,
            vec![tag("moduleName", "node_modules/lodash/map.js")],
        );
        assert!(apply_filters(third_party, &filters).is_none());
    }

    #[test]
    fn test_entry_metrics_bypass_threshold() {
        let filters = chain();
        let tiny_entry = Metric::size("entries.size", 1.0, vec![tag("entryName", "main")]);
        assert!(apply_filters(tiny_entry, &filters).is_some());

        let tiny_count =
            Metric::count("entries.modules.count", 0.0, vec![tag("entryName", "main")]);
        assert!(apply_filters(tiny_count, &filters).is_some());

        // entries.assets.count does NOT bypass.
        let assets_count =
            Metric::count("entries.assets.count", 1.0, vec![tag("entryName", "main")]);
        assert!(apply_filters(assets_count, &filters).is_none());
    }

    #[test]
    fn test_dependency_counts_use_relaxed_threshold() {
        let filters = chain();
        let mid = Metric::count(
            "modules.dependencies",
            15.0,
            vec![tag("moduleName", "src/big.js")],
        );
        // 15 passes the default count threshold of 10 but not the relaxed 30.
        assert!(apply_filters(mid, &filters).is_none());

        let heavy = Metric::count(
            "modules.dependents",
            30.0,
            vec![tag("moduleName", "src/util.js")],
        );
        assert!(apply_filters(heavy, &filters).is_some());
    }

    #[test]
    fn test_chain_short_circuits_on_first_veto() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let later_runs = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&later_runs);

        let filters: Vec<MetricFilter> = vec![
            Box::new(|_| None),
            Box::new(move |m| {
                seen.fetch_add(1, Ordering::SeqCst);
                Some(m)
            }),
        ];

        let metric = Metric::count("modules.count", 100.0, vec![]);
        assert!(apply_filters(metric, &filters).is_none());
        assert_eq!(later_runs.load(Ordering::SeqCst), 0);
    }
}
