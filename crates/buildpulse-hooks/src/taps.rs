//! Hook point and tap domain model
//!
//! Mirrors the shape of a pluggable build orchestrator: owners expose named
//! hook points, plugins attach taps with one of three calling conventions.
//! Some orchestrator versions expose frozen hook containers in sub-contexts;
//! those accept no tap replacement and instrumentation skips them.

use futures::future::BoxFuture;
use std::collections::BTreeMap;
use std::sync::Arc;

use buildpulse_core::{PulseError, Result};

/// Tap calling convention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TapKind {
    /// Synchronous, result returned directly
    Sync,
    /// Last argument is a continuation invoked on finish
    Callback,
    /// Returns an awaitable
    Deferred,
}

impl std::fmt::Display for TapKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sync => write!(f, "sync"),
            Self::Callback => write!(f, "callback"),
            Self::Deferred => write!(f, "deferred"),
        }
    }
}

/// Outcome of one tap call; errors propagate unchanged through wrappers
pub type TapResult = std::result::Result<serde_json::Value, String>;

/// Completion continuation for callback-convention taps
pub type Continuation = Box<dyn FnOnce(TapResult) + Send>;

type SyncTapFn = Arc<dyn Fn(&TapArgs) -> TapResult + Send + Sync>;
type CallbackTapFn = Arc<dyn Fn(&TapArgs, Continuation) + Send + Sync>;
type DeferredTapFn = Arc<dyn Fn(TapArgs) -> BoxFuture<'static, TapResult> + Send + Sync>;

/// Arguments passed to a tap call
///
/// Carries the raw argument values plus the build unit the call concerns,
/// when the first argument identifies one. Descriptions are computed lazily
/// by [`Invocation::description`](crate::Invocation::description), never at
/// call time.
#[derive(Debug, Clone, Default)]
pub struct TapArgs {
    unit: Option<String>,
    values: Arc<Vec<serde_json::Value>>,
}

impl TapArgs {
    /// Build args from raw values, inferring the unit from the first
    /// argument when it is an object carrying a `resource` or `request` path
    pub fn new(values: Vec<serde_json::Value>) -> Self {
        let unit = values.first().and_then(|v| {
            v.get("resource")
                .or_else(|| v.get("request"))
                .and_then(|r| r.as_str())
                .map(String::from)
        });
        Self {
            unit,
            values: Arc::new(values),
        }
    }

    /// Build args explicitly attributed to a unit
    pub fn for_unit(unit: impl Into<String>, values: Vec<serde_json::Value>) -> Self {
        Self {
            unit: Some(unit.into()),
            values: Arc::new(values),
        }
    }

    /// The build unit this call concerns, if any
    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    /// Render a short diagnostic summary of the argument values
    pub fn describe(&self) -> String {
        if self.values.is_empty() {
            return "()".to_string();
        }
        let parts: Vec<String> = self.values.iter().map(summarize_value).collect();
        format!("({})", parts.join(", "))
    }
}

fn summarize_value(value: &serde_json::Value) -> String {
    use serde_json::Value;
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => {
            if s.chars().count() > 48 {
                let head: String = s.chars().take(48).collect();
                format!("\"{}…\"", head)
            } else {
                format!("\"{}\"", s)
            }
        }
        Value::Array(items) => format!("[{} items]", items.len()),
        Value::Object(map) => {
            let keys: Vec<&str> = map.keys().take(4).map(String::as_str).collect();
            format!("{{{}}}", keys.join(", "))
        }
    }
}

/// A tap's callable, one variant per calling convention
#[derive(Clone)]
pub enum TapCallback {
    Sync(SyncTapFn),
    Callback(CallbackTapFn),
    Deferred(DeferredTapFn),
}

impl TapCallback {
    pub fn kind(&self) -> TapKind {
        match self {
            Self::Sync(_) => TapKind::Sync,
            Self::Callback(_) => TapKind::Callback,
            Self::Deferred(_) => TapKind::Deferred,
        }
    }
}

impl std::fmt::Debug for TapCallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TapCallback::{}", self.kind())
    }
}

/// One plugin's callback attached to a hook point
pub struct Tap {
    /// Registering plugin name
    pub plugin: String,
    /// The callable
    pub callback: TapCallback,
}

/// A named extension point on a hook owner
pub struct HookPoint {
    name: String,
    frozen: bool,
    taps: Vec<Tap>,
}

impl HookPoint {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            frozen: false,
            taps: Vec::new(),
        }
    }

    /// A hook point whose tap container cannot be mutated
    pub fn frozen(name: impl Into<String>) -> Self {
        Self {
            frozen: true,
            ..Self::new(name)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Attach a return-value tap
    pub fn tap_sync(
        &mut self,
        plugin: impl Into<String>,
        f: impl Fn(&TapArgs) -> TapResult + Send + Sync + 'static,
    ) {
        self.taps.push(Tap {
            plugin: plugin.into(),
            callback: TapCallback::Sync(Arc::new(f)),
        });
    }

    /// Attach a callback-completion tap
    pub fn tap_callback(
        &mut self,
        plugin: impl Into<String>,
        f: impl Fn(&TapArgs, Continuation) + Send + Sync + 'static,
    ) {
        self.taps.push(Tap {
            plugin: plugin.into(),
            callback: TapCallback::Callback(Arc::new(f)),
        });
    }

    /// Attach a deferred-value tap
    pub fn tap_deferred(
        &mut self,
        plugin: impl Into<String>,
        f: impl Fn(TapArgs) -> BoxFuture<'static, TapResult> + Send + Sync + 'static,
    ) {
        self.taps.push(Tap {
            plugin: plugin.into(),
            callback: TapCallback::Deferred(Arc::new(f)),
        });
    }

    pub fn taps(&self) -> &[Tap] {
        &self.taps
    }

    /// Mutable tap access, refused by frozen containers
    pub fn taps_mut(&mut self) -> Result<&mut [Tap]> {
        if self.frozen {
            return Err(PulseError::Wrap(format!(
                "hook container {} is frozen",
                self.name
            )));
        }
        Ok(&mut self.taps)
    }

    /// Invoke every tap with `args`, honoring each calling convention
    ///
    /// Results are returned in tap registration order. A dropped
    /// continuation is reported as an error result rather than hanging.
    pub async fn invoke(&self, args: &TapArgs) -> Vec<TapResult> {
        let mut results = Vec::with_capacity(self.taps.len());
        for tap in &self.taps {
            let result = match &tap.callback {
                TapCallback::Sync(f) => f(args),
                TapCallback::Callback(f) => {
                    let (tx, rx) = tokio::sync::oneshot::channel();
                    f(
                        args,
                        Box::new(move |r| {
                            let _ = tx.send(r);
                        }),
                    );
                    rx.await
                        .unwrap_or_else(|_| Err("continuation dropped".to_string()))
                }
                TapCallback::Deferred(f) => f(args.clone()).await,
            };
            results.push(result);
        }
        results
    }
}

/// An orchestrator context exposing named hook points
///
/// The top-level orchestrator and each nested sub-context is one owner;
/// owners are discovered incrementally as the build progresses.
pub struct HookOwner {
    name: String,
    hooks: BTreeMap<String, HookPoint>,
}

impl HookOwner {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hooks: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a hook point, returning a handle for tap registration
    pub fn add_hook(&mut self, hook: HookPoint) -> &mut HookPoint {
        let name = hook.name.clone();
        self.hooks.entry(name).or_insert(hook)
    }

    pub fn hook(&self, name: &str) -> Option<&HookPoint> {
        self.hooks.get(name)
    }

    pub fn hook_mut(&mut self, name: &str) -> Option<&mut HookPoint> {
        self.hooks.get_mut(name)
    }

    pub fn hooks_mut(&mut self) -> impl Iterator<Item = &mut HookPoint> {
        self.hooks.values_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tap_args_unit_inference() {
        let args = TapArgs::new(vec![json!({"resource": "src/a.js", "loaders": []})]);
        assert_eq!(args.unit(), Some("src/a.js"));

        let args = TapArgs::new(vec![json!("not an object")]);
        assert_eq!(args.unit(), None);
    }

    #[test]
    fn test_tap_args_describe() {
        let args = TapArgs::new(vec![
            json!({"resource": "src/a.js", "loaders": [], "size": 10, "deps": [], "extra": 1}),
            json!("hello"),
            json!(3),
        ]);
        let desc = args.describe();
        assert!(desc.starts_with('('));
        assert!(desc.contains("\"hello\""));
        assert!(desc.contains('3'));
        // object summary shows at most four keys
        assert!(!desc.contains("extra") || desc.matches(',').count() >= 2);
    }

    #[test]
    fn test_describe_truncates_long_strings() {
        let long = "x".repeat(200);
        let args = TapArgs::new(vec![serde_json::Value::String(long)]);
        assert!(args.describe().contains('…'));
    }

    #[test]
    fn test_frozen_hook_refuses_mutation() {
        let mut hook = HookPoint::frozen("afterEmit");
        hook.tap_sync("PluginA", |_| Ok(serde_json::Value::Null));
        assert!(hook.taps_mut().is_err());
    }

    #[tokio::test]
    async fn test_invoke_all_conventions() {
        let mut hook = HookPoint::new("done");
        hook.tap_sync("SyncPlugin", |_| Ok(json!(1)));
        hook.tap_callback("CallbackPlugin", |_, done| done(Ok(json!(2))));
        hook.tap_deferred("DeferredPlugin", |_| Box::pin(async { Ok(json!(3)) }));

        let results = hook.invoke(&TapArgs::default()).await;
        assert_eq!(results.len(), 3);
        assert_eq!(results[0], Ok(json!(1)));
        assert_eq!(results[1], Ok(json!(2)));
        assert_eq!(results[2], Ok(json!(3)));
    }
}
