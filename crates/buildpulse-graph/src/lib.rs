//! # buildpulse-graph
//!
//! Reconstructs a consistent bidirectional module graph from partial,
//! version-inconsistent build-tool reports.
//!
//! Providers report dependencies in different shapes: flat per-module lists
//! with unresolved stubs mixed in, or recursive output→input trees. This
//! crate normalizes both into [`ModuleNode`] records whose dependency and
//! dependent sets are guaranteed consistent after [`GraphBuilder::reconcile`].

mod builder;
mod names;
mod tree;

pub use builder::{CollisionPolicy, GraphBuilder, ModuleNode, RawDependency, RawModule};
pub use names::{display_name, normalize_name};
pub use tree::{flatten_tree, TreeNode};
