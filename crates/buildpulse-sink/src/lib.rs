//! # buildpulse-sink
//!
//! The outward-facing edges of buildpulse: sending finalized metrics to a
//! remote series endpoint and persisting JSON snapshots for debugging.
//!
//! Both paths are infrastructure, not business logic; callers wrap them in
//! [`buildpulse_core::fail_open`] so transport failures degrade
//! observability, never build correctness.

mod http;
mod writer;

pub use http::HttpSink;
pub use writer::write_snapshot;

use async_trait::async_trait;

use buildpulse_core::{MetricToSend, Result};

/// Receives the final filtered metric list, once per build
///
/// Implementations own batching, transport, and retry; the core calls
/// [`send`](MetricSink::send) exactly once per build pass.
#[async_trait]
pub trait MetricSink: Send + Sync {
    async fn send(&self, series: &[MetricToSend]) -> Result<()>;
}
