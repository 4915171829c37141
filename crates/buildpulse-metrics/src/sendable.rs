//! Conversion to the emission-ready form

use buildpulse_core::{Metric, MetricToSend};

/// Enrich a filtered metric into its emission-ready form
///
/// Pure: prefixes the name, merges global tags after the metric's own tags,
/// and pins the value to a `[timestamp, value]` point.
pub fn to_sendable(
    metric: &Metric,
    global_tags: &[String],
    prefix: Option<&str>,
    timestamp: i64,
) -> MetricToSend {
    let name = match prefix {
        Some(prefix) if !prefix.is_empty() => format!("{}.{}", prefix, metric.name),
        _ => metric.name.clone(),
    };

    let mut tags = metric.tags.clone();
    tags.extend(global_tags.iter().cloned());

    MetricToSend {
        metric: name,
        kind: metric.kind,
        points: vec![(timestamp, metric.value)],
        tags,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use buildpulse_core::{tag, Metric, MetricKind};

    #[test]
    fn test_prefix_and_global_tags_applied() {
        let metric = Metric::size("assets.size", 1024.0, vec![tag("assetName", "main.js")]);
        let sendable = to_sendable(
            &metric,
            &[tag("env", "ci"), tag("branch", "main")],
            Some("buildpulse"),
            1_700_000_000,
        );

        assert_eq!(sendable.metric, "buildpulse.assets.size");
        assert_eq!(sendable.kind, MetricKind::Size);
        assert_eq!(sendable.points, vec![(1_700_000_000, 1024.0)]);
        assert_eq!(sendable.tags.len(), 3);
        assert_eq!(sendable.tags[0], "assetName:main.js");
    }

    #[test]
    fn test_empty_prefix_leaves_name() {
        let metric = Metric::count("modules.count", 5.0, vec![]);
        assert_eq!(
            to_sendable(&metric, &[], Some(""), 0).metric,
            "modules.count"
        );
        assert_eq!(to_sendable(&metric, &[], None, 0).metric, "modules.count");
    }
}
