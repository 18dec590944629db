//! Host Effect Sink
//!
//! Accumulates the side effects evaluation produces during one tick: view
//! property updates and fire-and-forget callback invocations. The sink is
//! flushed exactly once per tick, after all always-roots have evaluated,
//! so the committed prop values reflect the final state of the generation
//! rather than intermediate writes.
//!
//! Prop updates for the same view within a tick merge last-writer-wins per
//! field. When two props nodes target the same view in one generation the
//! later evaluation (ascending node-id root order) wins; the flush emits
//! views in ascending view-id order so output is deterministic.

use std::collections::{BTreeMap, HashSet};

use indexmap::IndexMap;

use crate::graph::node::{CallbackId, ViewId};
use crate::value::Value;

/// One recorded host-callback invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct CallInvocation {
    pub callback: CallbackId,
    pub args: Vec<Value>,
}

/// One view's merged property updates for a tick, routed into the three
/// downstream buckets declared via `configureProps`: properties the host
/// applies on its UI thread, properties applied on the native side, and
/// the rest, which round-trip to the scripting layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewUpdate {
    pub view: ViewId,
    pub ui_props: IndexMap<String, Value>,
    pub native_props: IndexMap<String, Value>,
    pub js_props: IndexMap<String, Value>,
}

/// Everything the engine hands the host at the end of one tick.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrameBatch {
    /// Per-view merged updates, ascending view id.
    pub updates: Vec<ViewUpdate>,
    /// Callback invocations in evaluation order.
    pub calls: Vec<CallInvocation>,
}

impl FrameBatch {
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.calls.is_empty()
    }
}

/// Per-tick accumulator for evaluation side effects.
pub struct EffectSink {
    pending: BTreeMap<ViewId, IndexMap<String, Value>>,
    calls: Vec<CallInvocation>,
    ui_props: HashSet<String>,
    native_props: HashSet<String>,
}

impl EffectSink {
    pub fn new() -> Self {
        Self {
            pending: BTreeMap::new(),
            calls: Vec::new(),
            ui_props: HashSet::new(),
            native_props: HashSet::new(),
        }
    }

    /// Declare which property names are UI-thread-managed and which are
    /// native-side-managed. Everything else routes to the scripting layer.
    pub fn configure_props(&mut self, ui_props: HashSet<String>, native_props: HashSet<String>) {
        self.ui_props = ui_props;
        self.native_props = native_props;
    }

    /// Merge a props node's output into the view's pending update.
    /// Later writes win per field.
    pub fn record_props(&mut self, view: ViewId, props: IndexMap<String, Value>) {
        self.pending.entry(view).or_default().extend(props);
    }

    /// Append a callback invocation record.
    pub fn record_call(&mut self, callback: CallbackId, args: Vec<Value>) {
        self.calls.push(CallInvocation { callback, args });
    }

    /// Drain the accumulated effects into one batch, routing each view's
    /// fields into ui/native/js buckets.
    pub fn flush(&mut self) -> FrameBatch {
        let pending = std::mem::take(&mut self.pending);
        let calls = std::mem::take(&mut self.calls);

        let updates = pending
            .into_iter()
            .map(|(view, merged)| {
                let mut update = ViewUpdate {
                    view,
                    ui_props: IndexMap::new(),
                    native_props: IndexMap::new(),
                    js_props: IndexMap::new(),
                };
                for (name, value) in merged {
                    if self.ui_props.contains(&name) {
                        update.ui_props.insert(name, value);
                    } else if self.native_props.contains(&name) {
                        update.native_props.insert(name, value);
                    } else {
                        update.js_props.insert(name, value);
                    }
                }
                update
            })
            .collect();

        FrameBatch { updates, calls }
    }
}

impl Default for EffectSink {
    fn default() -> Self {
        Self::new()
    }
}
