//! Hook instrumentation monitor
//!
//! Wraps tap callbacks in place so every invocation records a timing event.
//! Wrapping is keyed by `(hook, plugin)`, so re-scanning after new lazy
//! registrations is cheap and never double-wraps, even when a build tool
//! recreates its tap objects per sub-context.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use std::time::Instant;
use tracing::debug;

use crate::taps::{HookOwner, TapArgs, TapCallback, TapKind};

/// One measured tap execution
///
/// Each invocation is a uniquely allocated record: concurrent pending
/// deferred calls append distinct records and cannot corrupt each other.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Wall-clock start
    pub started_at: DateTime<Utc>,
    /// Wall-clock end
    pub ended_at: DateTime<Utc>,
    /// Measured duration in milliseconds
    pub duration_ms: u64,
    /// Calling convention used
    pub kind: TapKind,
    args: TapArgs,
    description: OnceLock<String>,
}

impl Invocation {
    /// Diagnostic summary of the call's arguments, computed on first access
    pub fn description(&self) -> &str {
        self.description.get_or_init(|| self.args.describe())
    }
}

/// Aggregate timing for one plugin or one build unit
#[derive(Debug, Clone, Default)]
pub struct Timing {
    /// Plugin or unit name
    pub name: String,
    /// Total measured duration in milliseconds
    pub duration_ms: u64,
    /// Total invocation count
    pub increment: u64,
    /// Hook name → invocations, appended in completion order
    pub events: HashMap<String, Vec<Invocation>>,
}

impl Timing {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    fn record(&mut self, hook: &str, invocation: Invocation) {
        self.duration_ms += invocation.duration_ms;
        self.increment += 1;
        self.events.entry(hook.to_string()).or_default().push(invocation);
    }
}

/// Timing attributed per plugin and per build unit
#[derive(Debug, Clone, Default)]
pub struct HookReport {
    /// Plugin name → aggregate timing
    pub plugins: HashMap<String, Timing>,
    /// Build unit → aggregate timing ("which plugin hurt this module")
    pub units: HashMap<String, Timing>,
}

#[derive(Default)]
struct TimingStore {
    plugins: HashMap<String, Timing>,
    units: HashMap<String, Timing>,
}

/// Wraps tap registrations on observed hook owners to time every invocation
///
/// One monitor instance is scoped to one build pass; its stores are never
/// shared between passes.
#[derive(Default)]
pub struct HookMonitor {
    owners: Vec<Arc<Mutex<HookOwner>>>,
    wrapped: HashSet<(String, String)>,
    store: Arc<Mutex<TimingStore>>,
}

impl HookMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an owner whose hook points will be scanned
    ///
    /// Idempotent per owner instance.
    pub fn observe(&mut self, owner: &Arc<Mutex<HookOwner>>) {
        if self.owners.iter().any(|o| Arc::ptr_eq(o, owner)) {
            return;
        }
        self.owners.push(Arc::clone(owner));
    }

    /// Re-enumerate all observed owners and wrap any tap not yet wrapped
    ///
    /// Returns the number of taps newly wrapped. Safe to call before every
    /// registration: the `(hook, plugin)` key set makes repeat scans cheap.
    /// Frozen hook containers are skipped; coverage degrades instead of the
    /// build crashing.
    pub fn rescan(&mut self) -> usize {
        let mut newly_wrapped = 0;

        for owner in &self.owners {
            let mut owner = lock(owner);
            let owner_name = owner.name().to_string();

            for hook in owner.hooks_mut() {
                let hook_name = hook.name().to_string();

                let pending: Vec<String> = hook
                    .taps()
                    .iter()
                    .map(|t| t.plugin.clone())
                    .filter(|p| !self.wrapped.contains(&(hook_name.clone(), p.clone())))
                    .collect();
                if pending.is_empty() {
                    continue;
                }

                let taps = match hook.taps_mut() {
                    Ok(taps) => taps,
                    Err(e) => {
                        debug!(
                            "skipping hook {} on {}: {}",
                            hook_name, owner_name, e
                        );
                        continue;
                    }
                };

                for tap in taps.iter_mut() {
                    let key = (hook_name.clone(), tap.plugin.clone());
                    if self.wrapped.contains(&key) {
                        continue;
                    }
                    tap.callback =
                        wrap(&self.store, &hook_name, &tap.plugin, tap.callback.clone());
                    self.wrapped.insert(key);
                    newly_wrapped += 1;
                }
            }
        }

        if newly_wrapped > 0 {
            debug!("rescan wrapped {} new taps", newly_wrapped);
        }
        newly_wrapped
    }

    /// Clone out the per-plugin and per-unit timing mappings
    pub fn results(&self) -> HookReport {
        let store = lock(&self.store);
        HookReport {
            plugins: store.plugins.clone(),
            units: store.units.clone(),
        }
    }
}

/// Produce the timed replacement for one tap callback
fn wrap(
    store: &Arc<Mutex<TimingStore>>,
    hook: &str,
    plugin: &str,
    callback: TapCallback,
) -> TapCallback {
    let store = Arc::clone(store);
    let hook = hook.to_string();
    let plugin = plugin.to_string();

    match callback {
        TapCallback::Sync(f) => TapCallback::Sync(Arc::new(move |args| {
            let started_at = Utc::now();
            let started = Instant::now();
            let out = f(args);
            record(
                &store, &plugin, &hook, args, started_at, started,
                TapKind::Sync,
            );
            out
        })),
        TapCallback::Callback(f) => TapCallback::Callback(Arc::new(move |args, done| {
            let started_at = Utc::now();
            let started = Instant::now();
            let store = Arc::clone(&store);
            let plugin = plugin.clone();
            let hook = hook.clone();
            let args_for_done = args.clone();
            // Timing finalizes before the real continuation runs.
            f(
                args,
                Box::new(move |out| {
                    record(
                        &store,
                        &plugin,
                        &hook,
                        &args_for_done,
                        started_at,
                        started,
                        TapKind::Callback,
                    );
                    done(out);
                }),
            );
        })),
        TapCallback::Deferred(f) => TapCallback::Deferred(Arc::new(move |args| {
            let started_at = Utc::now();
            let started = Instant::now();
            let store = Arc::clone(&store);
            let plugin = plugin.clone();
            let hook = hook.clone();
            let fut = f(args.clone());
            Box::pin(async move {
                // Awaiting the inner future and recording afterwards covers
                // both the success and failure arms exactly once.
                let out = fut.await;
                record(
                    &store, &plugin, &hook, &args, started_at, started,
                    TapKind::Deferred,
                );
                out
            })
        })),
    }
}

fn record(
    store: &Arc<Mutex<TimingStore>>,
    plugin: &str,
    hook: &str,
    args: &TapArgs,
    started_at: DateTime<Utc>,
    started: Instant,
    kind: TapKind,
) {
    let invocation = Invocation {
        started_at,
        ended_at: Utc::now(),
        duration_ms: started.elapsed().as_millis() as u64,
        kind,
        args: args.clone(),
        description: OnceLock::new(),
    };

    let mut store = lock(store);
    store
        .plugins
        .entry(plugin.to_string())
        .or_insert_with(|| Timing::new(plugin))
        .record(hook, invocation.clone());

    if let Some(unit) = args.unit() {
        store
            .units
            .entry(unit.to_string())
            .or_insert_with(|| Timing::new(unit))
            .record(hook, invocation);
    }
}

/// Lock recovering from poisoning; a panicked tap must not disable timing
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
