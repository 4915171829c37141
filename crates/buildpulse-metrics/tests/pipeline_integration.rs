//! Integration tests for the full stats → metrics pipeline.
//!
//! These tests drive a provider stats object through adapter normalization,
//! graph reconstruction, aggregation, filtering, and sendable conversion,
//! following the same path the CLI wires together.

use serde_json::json;

use buildpulse_core::{FilterThresholds, MetricKind};
use buildpulse_graph::GraphBuilder;
use buildpulse_hooks::{HookMonitor, HookOwner, HookPoint, TapArgs};
use buildpulse_ledger::TimingLedger;
use buildpulse_metrics::{
    adapter_for, aggregate, apply_filters, default_filters, to_sendable, BuildFacts,
};
use std::sync::{Arc, Mutex};

fn webpack_stats() -> serde_json::Value {
    json!({
        "time": 2500,
        "errors": [],
        "warnings": [],
        "modules": [
            {
                "identifier": "./src/index.js",
                "name": "./src/index.js",
                "size": 15_000,
                "chunks": ["main"],
                "dependencies": ["./src/app.js", "./node_modules/lodash/lodash.js"]
            },
            {
                "identifier": "./src/app.js",
                "name": "./src/app.js",
                "size": 42_000,
                "chunks": ["main"],
                "dependencies": ["./node_modules/lodash/lodash.js"]
            },
            {
                "identifier": "./node_modules/lodash/lodash.js",
                "name": "./node_modules/lodash/lodash.js",
                "size": 530_000,
                "chunks": ["main", "vendor"],
                "dependencies": []
            }
        ],
        "assets": [
            {"name": "main.js", "size": 600_000},
            {"name": "main.js.map", "size": 1_400_000}
        ],
        "entrypoints": {
            "main": {"assets": ["main.js"], "moduleCount": 3}
        }
    })
}

#[test]
fn test_webpack_stats_to_filtered_series() {
    let adapter = adapter_for("webpack").unwrap();
    let stats = webpack_stats();

    let provider = adapter.facts(&stats).unwrap();
    let mut builder = GraphBuilder::new();
    builder.record_pass(&adapter.modules(&stats).unwrap());
    builder.reconcile();
    let graph = builder.results();

    let general = provider.general(2);
    let facts = BuildFacts {
        general,
        graph,
        provider: Some(provider),
        ..BuildFacts::default()
    };

    let metrics = aggregate(&facts, false);
    let filters = default_filters(FilterThresholds::default(), false);
    let series: Vec<_> = metrics
        .into_iter()
        .filter_map(|m| apply_filters(m, &filters))
        .map(|m| to_sendable(&m, &["env:ci".to_string()], Some("buildpulse"), 1_700_000_000))
        .collect();

    // Sourcemap asset and third-party module sizes were vetoed.
    assert!(!series
        .iter()
        .any(|s| s.tags.iter().any(|t| t.ends_with(".map"))));
    assert!(!series
        .iter()
        .any(|s| s.tags.iter().any(|t| t.contains("node_modules"))));

    // The entry survives thresholding by name override.
    let entry_modules = series
        .iter()
        .find(|s| s.metric == "buildpulse.entries.modules.count")
        .unwrap();
    assert_eq!(entry_modules.points[0].1, 3.0);
    assert_eq!(entry_modules.kind, MetricKind::Count);

    // First-party module sizes above the size threshold made it through.
    let app_size = series
        .iter()
        .find(|s| s.metric == "buildpulse.modules.size"
            && s.tags.contains(&"moduleName:src/app.js".to_string()))
        .unwrap();
    assert_eq!(app_size.points[0].1, 42_000.0);

    // Every sendable carries the global tag.
    assert!(series.iter().all(|s| s.tags.contains(&"env:ci".to_string())));
}

#[tokio::test]
async fn test_hook_and_ledger_reports_feed_aggregation() {
    // Hook timing.
    let mut monitor = HookMonitor::new();
    let owner = Arc::new(Mutex::new(HookOwner::new("compiler")));
    monitor.observe(&owner);
    {
        let mut locked = owner.lock().unwrap();
        locked
            .add_hook(HookPoint::new("emit"))
            .tap_sync("TerserPlugin", |_| Ok(json!(null)));
    }
    monitor.rescan();
    for _ in 0..5 {
        let owner = owner.lock().unwrap();
        owner.hook("emit").unwrap().invoke(&TapArgs::default()).await;
    }

    // Loader timing.
    let mut ledger = TimingLedger::new();
    for i in 0..12 {
        let unit = format!("src/file{}.js", i);
        ledger.begin(&unit, &["babel-loader".to_string()]);
        ledger.end(&unit);
    }

    let facts = BuildFacts {
        hooks: monitor.results(),
        ledger: ledger.results(),
        ..BuildFacts::default()
    };

    let metrics = aggregate(&facts, false);

    let hits = metrics
        .iter()
        .find(|m| m.name == "plugins.hits")
        .unwrap();
    assert_eq!(hits.value, 5.0);
    assert!(hits.tags.contains(&"pluginName:TerserPlugin".to_string()));

    let loader_count = metrics
        .iter()
        .find(|m| m.name == "loaders.count")
        .unwrap();
    assert_eq!(loader_count.value, 12.0);

    // The loader count survives the default chain (12 >= 10); plugin hits
    // do not (5 < 10).
    let filters = default_filters(FilterThresholds::default(), false);
    assert!(apply_filters(loader_count.clone(), &filters).is_some());
    assert!(apply_filters(hits.clone(), &filters).is_none());
}

#[test]
fn test_malformed_stats_fail_at_adapter_not_aggregation() {
    let adapter = adapter_for("webpack").unwrap();
    let bad = json!({"assets": []});
    assert!(adapter.facts(&bad).is_err());
    assert!(adapter.modules(&bad).is_err());

    // The caller drops the bad source and aggregates what remains.
    let metrics = aggregate(&BuildFacts::default(), false);
    assert!(metrics.iter().any(|m| m.name == "modules.count"));
    assert!(!metrics.iter().any(|m| m.name == "assets.size"));
}

#[test]
fn test_esbuild_stats_build_consistent_graph() {
    let stats = json!({
        "duration": 40,
        "errors": [],
        "warnings": [],
        "inputs": {
            "src/index.ts": {"bytes": 900, "imports": [{"path": "src/lib.ts"}]},
            "src/lib.ts": {"bytes": 400, "imports": []}
        },
        "outputs": {
            "dist/out.js": {
                "bytes": 1100,
                "entryPoint": "src/index.ts",
                "inputs": {
                    "src/index.ts": {"bytesInOutput": 850},
                    "src/lib.ts": {"bytesInOutput": 250}
                }
            }
        }
    });

    let adapter = adapter_for("esbuild").unwrap();
    let mut builder = GraphBuilder::new();
    builder.record_pass(&adapter.modules(&stats).unwrap());
    builder.reconcile();
    let graph = builder.results();

    // Bidirectional invariant across tree and flat edges.
    for (name, node) in &graph {
        for dep in &node.dependencies {
            assert!(graph[dep].dependents.contains(name));
        }
    }
    assert!(graph["src/lib.ts"].dependents.contains("src/index.ts"));
    assert!(graph["src/index.ts"].dependents.contains("dist/out.js"));
}
