//! Module name normalization
//!
//! Build tools report module identifiers with loader-chain prefixes
//! (`sass-loader!./a.scss`) and resource queries (`./a.js?v=2`). All graph
//! keys use the normalized form so the same file observed through different
//! access paths lands on one node.

/// Normalize a raw module identifier into a graph key
///
/// Strips everything up to the last `!` (loader chains), any `?` query
/// suffix, and a leading `./`.
pub fn normalize_name(raw: &str) -> String {
    let after_loaders = raw.rsplit('!').next().unwrap_or(raw);
    let without_query = after_loaders
        .split_once('?')
        .map_or(after_loaders, |(path, _)| path);
    without_query
        .strip_prefix("./")
        .unwrap_or(without_query)
        .to_string()
}

/// Human-facing short name for a normalized module name
///
/// Third-party modules are shortened to their package-relative path.
pub fn display_name(name: &str) -> String {
    match name.rfind("node_modules/") {
        Some(idx) => name[idx + "node_modules/".len()..].to_string(),
        None => name.to_string(),
    }
}
