//! # buildpulse-hooks
//!
//! Transparent timing instrumentation for a pluggable build orchestrator.
//!
//! The orchestrator exposes named hook points; plugins attach taps to them
//! using one of three calling conventions (return-value, callback-completion,
//! deferred-value). The [`HookMonitor`] wraps every tap so each invocation is
//! timed and attributed to its plugin (and, when the call names a build unit,
//! to that unit) without changing arguments, return values, or error
//! propagation.
//!
//! Hook points appear incrementally as the build spawns sub-contexts, so
//! wrapping is a repeatable idempotent scan keyed by `(hook, plugin)` rather
//! than object identity.

mod monitor;
mod taps;

pub use monitor::{HookMonitor, HookReport, Invocation, Timing};
pub use taps::{
    Continuation, HookOwner, HookPoint, Tap, TapArgs, TapCallback, TapKind, TapResult,
};
