//! Core type definitions for buildpulse metrics

use serde::{Deserialize, Serialize};

/// Metric kind (matches the emission schema)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// A cardinality observation (modules, warnings, invocations, ...)
    Count,
    /// A byte-size observation
    Size,
    /// A wall-clock observation in milliseconds
    Duration,
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Count => write!(f, "count"),
            Self::Size => write!(f, "size"),
            Self::Duration => write!(f, "duration"),
        }
    }
}

impl std::str::FromStr for MetricKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "count" => Ok(Self::Count),
            "size" => Ok(Self::Size),
            "duration" => Ok(Self::Duration),
            _ => Err(format!("Invalid metric kind: {}", s)),
        }
    }
}

/// A normalized observation prior to emission formatting
///
/// Tags are unordered `key:value` strings; duplicates are tolerated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    /// Metric name, dot-separated (e.g. `modules.size`)
    pub name: String,
    /// Kind of observation
    pub kind: MetricKind,
    /// Observed value (bytes for size, milliseconds for duration)
    pub value: f64,
    /// `key:value` tags
    pub tags: Vec<String>,
}

impl Metric {
    pub fn new(
        name: impl Into<String>,
        kind: MetricKind,
        value: f64,
        tags: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            value,
            tags,
        }
    }

    /// Shorthand for a count metric
    pub fn count(name: impl Into<String>, value: f64, tags: Vec<String>) -> Self {
        Self::new(name, MetricKind::Count, value, tags)
    }

    /// Shorthand for a size metric
    pub fn size(name: impl Into<String>, value: f64, tags: Vec<String>) -> Self {
        Self::new(name, MetricKind::Size, value, tags)
    }

    /// Shorthand for a duration metric
    pub fn duration(name: impl Into<String>, value: f64, tags: Vec<String>) -> Self {
        Self::new(name, MetricKind::Duration, value, tags)
    }

    /// True if any tag value matches the predicate
    pub fn any_tag(&self, f: impl Fn(&str) -> bool) -> bool {
        self.tags.iter().any(|t| f(t))
    }
}

/// Build a `key:value` tag string
pub fn tag(key: &str, value: &str) -> String {
    format!("{}:{}", key, value)
}

/// The emission-ready form of a [`Metric`]
///
/// Name prefix and global tags have been applied and the value has been
/// pinned to a `[timestamp, value]` point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricToSend {
    /// Full metric name, prefix included
    pub metric: String,
    /// Kind of observation
    #[serde(rename = "type")]
    pub kind: MetricKind,
    /// `[unix_timestamp, value]` points
    pub points: Vec<(i64, f64)>,
    /// Metric tags merged with global tags
    pub tags: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_metric_kind_roundtrip() {
        for kind in [MetricKind::Count, MetricKind::Size, MetricKind::Duration] {
            let parsed = MetricKind::from_str(&kind.to_string()).unwrap();
            assert_eq!(parsed, kind);
        }
        assert!(MetricKind::from_str("gauge").is_err());
    }

    #[test]
    fn test_tag_helper() {
        assert_eq!(tag("moduleName", "src/index.js"), "moduleName:src/index.js");
    }

    #[test]
    fn test_metric_shorthands() {
        let m = Metric::size("assets.size", 1024.0, vec![tag("assetName", "app.js")]);
        assert_eq!(m.kind, MetricKind::Size);
        assert!(m.any_tag(|t| t.ends_with("app.js")));
        assert!(!m.any_tag(|t| t.contains("node_modules")));
    }

    #[test]
    fn test_sendable_serializes_points_as_pairs() {
        let s = MetricToSend {
            metric: "buildpulse.modules.count".to_string(),
            kind: MetricKind::Count,
            points: vec![(1700000000, 42.0)],
            tags: vec![],
        };
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["type"], "count");
        assert_eq!(json["points"][0][0], 1700000000);
        assert_eq!(json["points"][0][1], 42.0);
    }
}
