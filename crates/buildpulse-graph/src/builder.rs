//! Graph construction from raw per-pass module listings

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

use crate::names::{display_name, normalize_name};

/// One build input in the finalized graph
///
/// Invariant (after [`GraphBuilder::reconcile`]): for every name B in
/// `dependencies` of node A, node B exists and its `dependents` contain A.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleNode {
    /// Normalized name (graph key)
    pub name: String,
    /// Human-facing short name
    pub display_name: String,
    /// Source size in bytes (0 for synthesized nodes)
    pub size: u64,
    /// Names of modules this module depends on
    pub dependencies: BTreeSet<String>,
    /// Names of modules depending on this module
    pub dependents: BTreeSet<String>,
    /// Names of chunks containing this module
    pub chunks: BTreeSet<String>,
}

/// A raw dependency entry as reported by the build tool
///
/// Not every entry is a real module: some are unresolved references that
/// need a fallback lookup, some are side-effect-only declarations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RawDependency {
    /// Already resolved to a module identifier
    Resolved { identifier: String },
    /// Needs resolution through the identifier index, then the request index
    Reference { request: String },
    /// Side-effect-only declaration, never a module
    SideEffect,
}

/// One module as observed in a single pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawModule {
    /// Raw identifier (loader chains and queries included)
    pub identifier: String,
    /// Source size in bytes
    pub size: u64,
    /// Chunks containing this module
    pub chunks: Vec<String>,
    /// Raw dependency entries
    pub dependencies: Vec<RawDependency>,
}

/// What to do when two distinct raw identifiers normalize to the same name
///
/// The reference behavior keeps the first-seen node; whether that is
/// intentional is unclear, so the policy is configurable. Dependency sets
/// merge under both policies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CollisionPolicy {
    /// Keep the first-seen node's size/display/chunks
    #[default]
    KeepFirst,
    /// Let the last-seen node's size/display/chunks win
    KeepLast,
}

/// Builds the bidirectional module graph across one or more passes
///
/// Passes are additive: a later partial pass never erases dependencies
/// discovered earlier. The dependent sets are only valid after
/// [`reconcile`](GraphBuilder::reconcile).
#[derive(Debug, Default)]
pub struct GraphBuilder {
    policy: CollisionPolicy,
    nodes: HashMap<String, ModuleNode>,
    /// raw identifier → normalized name, for direct resolution
    identifier_index: HashMap<String, String>,
    /// bare request (no loaders, no query) → normalized name, fallback lookup
    request_index: HashMap<String, String>,
    /// normalized name → first raw identifier seen, for collision detection
    first_identifier: HashMap<String, String>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: CollisionPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Resolve one raw dependency entry to a normalized module name
    ///
    /// Resolution order: direct (resolved entries), identifier index,
    /// request-index fallback. A `None` is not an error: some raw entries
    /// are legitimately not modules.
    pub fn resolve_dependency_target(&self, raw: &RawDependency) -> Option<String> {
        match raw {
            RawDependency::Resolved { identifier } => Some(normalize_name(identifier)),
            RawDependency::Reference { request } => {
                if let Some(name) = self.identifier_index.get(request) {
                    return Some(name.clone());
                }
                // Some build-tool versions raise on direct access; the
                // request index is the alternate lookup path.
                let bare = normalize_name(request);
                match self.request_index.get(&bare) {
                    Some(name) => Some(name.clone()),
                    None => {
                        debug!("dropping unresolvable dependency entry: {}", request);
                        None
                    }
                }
            }
            RawDependency::SideEffect => None,
        }
    }

    /// Record one pass over the build tool's module list
    ///
    /// Dependency sets merge additively with anything stored under the same
    /// normalized name in earlier passes.
    pub fn record_pass(&mut self, modules: &[RawModule]) {
        // Index first so intra-pass references resolve regardless of order.
        for module in modules {
            let name = normalize_name(&module.identifier);
            self.identifier_index
                .insert(module.identifier.clone(), name.clone());
            self.request_index.insert(name.clone(), name);
        }

        for module in modules {
            let name = normalize_name(&module.identifier);

            match self.first_identifier.get(&name) {
                None => {
                    self.first_identifier
                        .insert(name.clone(), module.identifier.clone());
                }
                Some(first) if first != &module.identifier => {
                    debug!(
                        "module name collision on {}: {} vs {}",
                        name, first, module.identifier
                    );
                }
                _ => {}
            }

            let resolved: BTreeSet<String> = module
                .dependencies
                .iter()
                .filter_map(|raw| self.resolve_dependency_target(raw))
                .filter(|dep| dep != &name)
                .collect();

            let first_seen = !self.nodes.contains_key(&name);
            let collided = self
                .first_identifier
                .get(&name)
                .is_some_and(|first| first != &module.identifier);

            let node = self.nodes.entry(name.clone()).or_insert_with(|| ModuleNode {
                name: name.clone(),
                display_name: display_name(&name),
                ..ModuleNode::default()
            });

            if first_seen || !collided || self.policy == CollisionPolicy::KeepLast {
                node.size = module.size;
            }
            node.chunks.extend(module.chunks.iter().cloned());
            node.dependencies.extend(resolved);
        }
    }

    /// Restore the bidirectional invariant
    ///
    /// Dependent sets are rebuilt from scratch as the transpose of the
    /// dependency relation. Names that only ever appeared as a dependency
    /// target are synthesized as empty nodes rather than omitted.
    pub fn reconcile(&mut self) {
        for node in self.nodes.values_mut() {
            node.dependents.clear();
        }

        let edges: Vec<(String, String)> = self
            .nodes
            .iter()
            .flat_map(|(name, node)| {
                node.dependencies
                    .iter()
                    .map(move |dep| (name.clone(), dep.clone()))
            })
            .collect();

        for (from, to) in edges {
            let target = self.nodes.entry(to.clone()).or_insert_with(|| ModuleNode {
                name: to.clone(),
                display_name: display_name(&to),
                ..ModuleNode::default()
            });
            target.dependents.insert(from);
        }
    }

    /// The finalized `name → ModuleNode` mapping
    pub fn results(&self) -> HashMap<String, ModuleNode> {
        self.nodes.clone()
    }

    /// Number of nodes currently stored
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
