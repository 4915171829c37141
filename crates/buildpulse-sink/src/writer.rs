//! JSON snapshot writer
//!
//! Persists raw ledger/graph/metric snapshots for debugging. Not part of the
//! core pipeline; callers treat failures as fail-open.

use serde::Serialize;
use std::path::Path;
use tokio::fs;
use tracing::debug;

use buildpulse_core::Result;

/// Write any serializable snapshot to `path` as pretty-printed JSON
///
/// Parent directories are created as needed; an existing file is replaced.
pub async fn write_snapshot<T: Serialize>(path: &Path, content: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let json = serde_json::to_string_pretty(content)?;
    fs::write(path, json).await?;

    debug!("wrote snapshot to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use buildpulse_core::{MetricKind, MetricToSend};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_write_snapshot_creates_parents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("debug/metrics.json");

        let series = vec![MetricToSend {
            metric: "modules.count".to_string(),
            kind: MetricKind::Count,
            points: vec![(0, 3.0)],
            tags: vec![],
        }];

        write_snapshot(&path, &series).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: Vec<MetricToSend> = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, series);
    }

    #[tokio::test]
    async fn test_write_snapshot_replaces_existing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("graph.json");

        write_snapshot(&path, &serde_json::json!({"v": 1})).await.unwrap();
        write_snapshot(&path, &serde_json::json!({"v": 2})).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"v\": 2"));
    }
}
