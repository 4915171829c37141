//! Per-provider stats adapters
//!
//! Each adapter maps one build tool's stats shape into [`ProviderFacts`] and
//! a raw module listing for the graph builder. Malformed stats surface as
//! `PulseError::Aggregation` and are caught per source by the caller, so one
//! provider's bad report never blocks metrics from other sources.

use serde_json::Value;
use tracing::debug;

use buildpulse_core::{PulseError, Result};
use buildpulse_graph::{flatten_tree, RawDependency, RawModule, TreeNode};

use crate::facts::{EntryFact, ProviderFacts, SizedFact};

/// Maps one provider's stats object into the common fact set
pub trait StatsAdapter: Send + Sync {
    /// Provider name used in tags and error messages
    fn provider(&self) -> &'static str;

    /// Normalize the stats object into provider facts
    fn facts(&self, stats: &Value) -> Result<ProviderFacts>;

    /// Extract raw module/edge observations for the graph builder
    fn modules(&self, stats: &Value) -> Result<Vec<RawModule>>;
}

/// Look up the adapter for a provider name
pub fn adapter_for(provider: &str) -> Result<Box<dyn StatsAdapter>> {
    match provider {
        "webpack" => Ok(Box::new(WebpackAdapter)),
        "esbuild" => Ok(Box::new(EsbuildAdapter)),
        other => Err(PulseError::UnknownProvider(other.to_string())),
    }
}

fn bad_shape(source: &str, message: impl Into<String>) -> PulseError {
    PulseError::Aggregation {
        provider: source.to_string(),
        message: message.into(),
    }
}

fn len_of(stats: &Value, key: &str) -> usize {
    stats[key].as_array().map_or(0, Vec::len)
}

/// Adapter for webpack-shaped stats: flat module list with chunk, asset and
/// entrypoint sections
pub struct WebpackAdapter;

impl StatsAdapter for WebpackAdapter {
    fn provider(&self) -> &'static str {
        "webpack"
    }

    fn facts(&self, stats: &Value) -> Result<ProviderFacts> {
        let raw_modules = stats["modules"]
            .as_array()
            .ok_or_else(|| bad_shape(self.provider(), "missing modules array"))?;

        let modules = raw_modules
            .iter()
            .filter_map(|m| {
                let name = m["name"].as_str().or_else(|| m["identifier"].as_str())?;
                Some(SizedFact {
                    name: name.to_string(),
                    size: m["size"].as_u64().unwrap_or(0),
                })
            })
            .collect();

        let assets: Vec<SizedFact> = stats["assets"]
            .as_array()
            .map(|assets| {
                assets
                    .iter()
                    .filter_map(|a| {
                        Some(SizedFact {
                            name: a["name"].as_str()?.to_string(),
                            size: a["size"].as_u64().unwrap_or(0),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        let entries = stats["entrypoints"]
            .as_object()
            .map(|entrypoints| {
                entrypoints
                    .iter()
                    .map(|(name, entry)| {
                        let entry_assets: Vec<&str> = entry["assets"]
                            .as_array()
                            .map(|a| a.iter().filter_map(Value::as_str).collect())
                            .unwrap_or_default();
                        let size = assets
                            .iter()
                            .filter(|a| entry_assets.contains(&a.name.as_str()))
                            .map(|a| a.size)
                            .sum();
                        EntryFact {
                            name: name.clone(),
                            size,
                            module_count: entry["moduleCount"].as_u64().unwrap_or(0) as usize,
                            asset_count: entry_assets.len(),
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(ProviderFacts {
            provider: self.provider().to_string(),
            modules,
            assets,
            entries,
            warnings: len_of(stats, "warnings"),
            errors: len_of(stats, "errors"),
            duration_ms: stats["time"].as_u64().unwrap_or(0),
        })
    }

    fn modules(&self, stats: &Value) -> Result<Vec<RawModule>> {
        let raw_modules = stats["modules"]
            .as_array()
            .ok_or_else(|| bad_shape(self.provider(), "missing modules array"))?;

        Ok(raw_modules
            .iter()
            .filter_map(|m| {
                let identifier = m["identifier"]
                    .as_str()
                    .or_else(|| m["name"].as_str())?
                    .to_string();
                let dependencies = m["dependencies"]
                    .as_array()
                    .map(|deps| deps.iter().map(raw_dependency).collect())
                    .unwrap_or_default();
                Some(RawModule {
                    identifier,
                    size: m["size"].as_u64().unwrap_or(0),
                    chunks: m["chunks"]
                        .as_array()
                        .map(|chunks| chunks.iter().map(chunk_name).collect())
                        .unwrap_or_default(),
                    dependencies,
                })
            })
            .collect())
    }
}

/// One raw dependency entry from a webpack-shaped module record
///
/// Strings are resolved identifiers; objects carry an unresolved `request`
/// needing the fallback lookup; anything else is a side-effect declaration.
fn raw_dependency(value: &Value) -> RawDependency {
    match value {
        Value::String(identifier) => RawDependency::Resolved {
            identifier: identifier.clone(),
        },
        Value::Object(map) => match map.get("request").and_then(Value::as_str) {
            Some(request) => RawDependency::Reference {
                request: request.to_string(),
            },
            None => RawDependency::SideEffect,
        },
        _ => RawDependency::SideEffect,
    }
}

/// Chunk ids arrive as names or numeric ids depending on the tool version
fn chunk_name(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Adapter for esbuild-shaped stats: a metafile with a flat `inputs` map and
/// a tree-shaped `outputs` → inputs report
pub struct EsbuildAdapter;

impl StatsAdapter for EsbuildAdapter {
    fn provider(&self) -> &'static str {
        "esbuild"
    }

    fn facts(&self, stats: &Value) -> Result<ProviderFacts> {
        let inputs = stats["inputs"]
            .as_object()
            .ok_or_else(|| bad_shape(self.provider(), "missing inputs map"))?;

        let modules = inputs
            .iter()
            .map(|(name, input)| SizedFact {
                name: name.clone(),
                size: input["bytes"].as_u64().unwrap_or(0),
            })
            .collect();

        let outputs = stats["outputs"].as_object();

        let assets: Vec<SizedFact> = outputs
            .map(|outputs| {
                outputs
                    .iter()
                    .map(|(name, output)| SizedFact {
                        name: name.clone(),
                        size: output["bytes"].as_u64().unwrap_or(0),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let entries = outputs
            .map(|outputs| {
                outputs
                    .iter()
                    .filter_map(|(_, output)| {
                        let entry = output["entryPoint"].as_str()?;
                        Some(EntryFact {
                            name: entry.to_string(),
                            size: output["bytes"].as_u64().unwrap_or(0),
                            module_count: output["inputs"]
                                .as_object()
                                .map_or(0, serde_json::Map::len),
                            asset_count: 1,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(ProviderFacts {
            provider: self.provider().to_string(),
            modules,
            assets,
            entries,
            warnings: len_of(stats, "warnings"),
            errors: len_of(stats, "errors"),
            duration_ms: stats["duration"].as_u64().unwrap_or(0),
        })
    }

    fn modules(&self, stats: &Value) -> Result<Vec<RawModule>> {
        let inputs = stats["inputs"]
            .as_object()
            .ok_or_else(|| bad_shape(self.provider(), "missing inputs map"))?;

        // The outputs section is a tree-shaped report: output → nested
        // inputs. Flatten it first, then merge the flat import edges.
        let mut modules = Vec::new();
        if let Some(outputs) = stats["outputs"].as_object() {
            let roots: Vec<TreeNode> = outputs
                .iter()
                .map(|(name, output)| {
                    let children = output["inputs"]
                        .as_object()
                        .map(|nested| {
                            nested
                                .keys()
                                .map(|input| {
                                    let size = inputs
                                        .get(input.as_str())
                                        .and_then(|i| i["bytes"].as_u64())
                                        .unwrap_or(0);
                                    TreeNode::new(input.clone(), size)
                                })
                                .collect()
                        })
                        .unwrap_or_default();
                    TreeNode::new(name.clone(), output["bytes"].as_u64().unwrap_or(0))
                        .with_children(children)
                })
                .collect();
            modules.extend(flatten_tree(&roots));
        } else {
            debug!("esbuild stats carry no outputs section");
        }

        for (name, input) in inputs {
            let dependencies = input["imports"]
                .as_array()
                .map(|imports| {
                    imports
                        .iter()
                        .filter_map(|i| i["path"].as_str())
                        .map(|path| RawDependency::Resolved {
                            identifier: path.to_string(),
                        })
                        .collect()
                })
                .unwrap_or_default();
            modules.push(RawModule {
                identifier: name.clone(),
                size: input["bytes"].as_u64().unwrap_or(0),
                chunks: Vec::new(),
                dependencies,
            });
        }

        Ok(modules)
    }
}
