//! Fact-to-metric mapping
//!
//! One fixed mapping from normalized build facts to the metric schema.
//! Source isolation happens upstream at the adapter boundary: a malformed
//! stats source fails adapter normalization and the caller skips that source;
//! by the time facts arrive here they are fully typed and the mapping cannot
//! fail.

use std::collections::{BTreeSet, HashMap, VecDeque};

use buildpulse_core::{tag, Metric};
use buildpulse_graph::{normalize_name, ModuleNode};

use crate::facts::BuildFacts;

/// Reduce one build pass's facts to the flat metric list
///
/// Transitive dependency tree metrics are verbose and only computed when
/// `keep_tree_metrics` is set; the default filter chain vetoes them anyway.
pub fn aggregate(facts: &BuildFacts, keep_tree_metrics: bool) -> Vec<Metric> {
    let mut metrics = general_metrics(facts);
    metrics.extend(plugin_metrics(facts));
    metrics.extend(loader_metrics(facts));
    metrics.extend(graph_metrics(facts));
    if keep_tree_metrics {
        metrics.extend(tree_metrics(facts));
    }
    metrics.extend(provider_metrics(facts));
    metrics
}

fn general_metrics(facts: &BuildFacts) -> Vec<Metric> {
    let g = &facts.general;
    vec![
        Metric::count("modules.count", g.modules as f64, vec![]),
        Metric::count("chunks.count", g.chunks as f64, vec![]),
        Metric::count("assets.count", g.assets as f64, vec![]),
        Metric::count("entries.count", g.entries as f64, vec![]),
        Metric::count("warnings.count", g.warnings as f64, vec![]),
        Metric::count("errors.count", g.errors as f64, vec![]),
        Metric::duration("compilation.duration", g.duration_ms as f64, vec![]),
    ]
}

fn plugin_metrics(facts: &BuildFacts) -> Vec<Metric> {
    facts
        .hooks
        .plugins
        .values()
        .flat_map(|timing| {
            let tags = vec![tag("pluginName", &timing.name)];
            [
                Metric::duration("plugins.duration", timing.duration_ms as f64, tags.clone()),
                Metric::count("plugins.hits", timing.increment as f64, tags),
            ]
        })
        .collect()
}

fn loader_metrics(facts: &BuildFacts) -> Vec<Metric> {
    facts
        .ledger
        .transformers
        .iter()
        .flat_map(|(name, totals)| {
            let tags = vec![tag("loaderName", name)];
            [
                Metric::duration("loaders.duration", totals.duration_ms as f64, tags.clone()),
                Metric::count("loaders.count", totals.count as f64, tags),
            ]
        })
        .collect()
}

fn graph_metrics(facts: &BuildFacts) -> Vec<Metric> {
    facts
        .graph
        .values()
        .flat_map(|node| {
            let tags = vec![tag("moduleName", &node.display_name)];
            [
                Metric::count(
                    "modules.dependencies",
                    node.dependencies.len() as f64,
                    tags.clone(),
                ),
                Metric::count("modules.dependents", node.dependents.len() as f64, tags),
            ]
        })
        .collect()
}

/// Per entry-point transitive dependency closure, breadth-first with a
/// visited set so shared subtrees and cycles count once
fn tree_metrics(facts: &BuildFacts) -> Vec<Metric> {
    facts
        .graph
        .values()
        .filter(|node| node.dependents.is_empty() && !node.dependencies.is_empty())
        .flat_map(|entry| {
            let (count, size) = transitive_closure(&facts.graph, entry);
            let tags = vec![tag("entryModule", &entry.display_name)];
            [
                Metric::count("modules.tree.count", count as f64, tags.clone()),
                Metric::size("modules.tree.size", size as f64, tags),
            ]
        })
        .collect()
}

fn transitive_closure(graph: &HashMap<String, ModuleNode>, entry: &ModuleNode) -> (usize, u64) {
    let mut visited: BTreeSet<&str> = BTreeSet::new();
    let mut queue: VecDeque<&str> = entry.dependencies.iter().map(String::as_str).collect();

    let mut size = 0u64;
    while let Some(name) = queue.pop_front() {
        if !visited.insert(name) {
            continue;
        }
        if let Some(node) = graph.get(name) {
            size += node.size;
            queue.extend(node.dependencies.iter().map(String::as_str));
        }
    }

    (visited.len(), size)
}

fn provider_metrics(facts: &BuildFacts) -> Vec<Metric> {
    let Some(provider) = &facts.provider else {
        return Vec::new();
    };

    let mut metrics = Vec::new();

    // Tags keep the full normalized path so the noise filter can still see
    // node_modules segments.
    for module in &provider.modules {
        metrics.push(Metric::size(
            "modules.size",
            module.size as f64,
            vec![tag("moduleName", &normalize_name(&module.name))],
        ));
    }

    for asset in &provider.assets {
        metrics.push(Metric::size(
            "assets.size",
            asset.size as f64,
            vec![tag("assetName", &asset.name)],
        ));
    }

    for entry in &provider.entries {
        let tags = vec![tag("entryName", &entry.name)];
        metrics.push(Metric::size("entries.size", entry.size as f64, tags.clone()));
        metrics.push(Metric::count(
            "entries.modules.count",
            entry.module_count as f64,
            tags.clone(),
        ));
        metrics.push(Metric::count(
            "entries.assets.count",
            entry.asset_count as f64,
            tags,
        ));
    }

    metrics
}
