//! Node Evaluation
//!
//! One exhaustive dispatch over the node kinds. Evaluation is pull-based:
//! asking a node for its value recursively evaluates its inputs, and the
//! per-generation memo cache guarantees each node computes at most once per
//! tick no matter how many readers share it. Side effects (set, debug,
//! call, clock start/stop, prop recording) run in the same pass, so the
//! memo gate is also the effects-once-per-generation gate.
//!
//! Evaluation never fails. A missing id evaluates to 0 with effects
//! ignored, and arithmetic edge cases follow IEEE 754.

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::graph::node::{NodeId, NodeKind, TransformSource};
use crate::graph::store::NodeStore;
use crate::graph::ops;
use crate::runtime::sink::EffectSink;
use crate::value::Value;

/// Everything one tick's evaluation can reach: the graph, the per-tick
/// effect sink, and the scheduler's clock.
pub(crate) struct EvalScope<'a> {
    pub store: &'a mut NodeStore,
    pub sink: &'a mut EffectSink,
    pub generation: u64,
    pub frame_time_ms: f64,
}

/// Evaluate `id` within the current generation.
pub(crate) fn evaluate(scope: &mut EvalScope<'_>, id: NodeId) -> Value {
    let Some(node) = scope.store.get(id) else {
        // Dangling read: the child was dropped after this read path was
        // built. Resolve to noop semantics instead of aborting the tick.
        return Value::zero();
    };
    if let Some(cached) = node.cached(scope.generation) {
        return cached.clone();
    }

    // Snapshot the variant and child list so the recursive calls below can
    // re-borrow the store mutably. Kind data is small: ids, names, scalars.
    let kind = node.kind.clone();
    let children = node.children.clone();

    let result = match kind {
        NodeKind::Value { payload } => payload,
        NodeKind::Props { mapping, view } => eval_props(scope, id, &mapping, view),
        NodeKind::Style { mapping } => eval_style(scope, &mapping),
        NodeKind::Transform { specs } => {
            let mut components = Vec::with_capacity(specs.len());
            for spec in &specs {
                let value = match spec.source {
                    TransformSource::NodeId(source) => evaluate(scope, source),
                    TransformSource::Value(constant) => Value::Number(constant),
                };
                let mut entry = IndexMap::with_capacity(1);
                entry.insert(spec.property.clone(), value);
                components.push(Value::Map(entry));
            }
            Value::List(components)
        }
        NodeKind::Block => {
            let mut last = Value::zero();
            for &child in &children {
                last = evaluate(scope, child);
            }
            last
        }
        NodeKind::Cond {
            cond,
            if_node,
            else_node,
        } => {
            // Only the taken branch is evaluated; the untaken branch's
            // effects must not fire this generation.
            if evaluate(scope, cond).is_truthy() {
                evaluate(scope, if_node)
            } else {
                match else_node {
                    Some(else_node) => evaluate(scope, else_node),
                    None => Value::zero(),
                }
            }
        }
        NodeKind::Operator { op } => ops::apply(scope, op, &children),
        NodeKind::Set { target, source } => {
            let value = evaluate(scope, source);
            if let Err(error) = scope.store.set_value(target, value.clone()) {
                warn!(node = %id, %error, "set target is not assignable");
            }
            value
        }
        NodeKind::Debug { message, value } => {
            let result = evaluate(scope, value);
            debug!(target: "kinetic::node", node = %id, message = %message, value = %result);
            result
        }
        NodeKind::Clock(state) => {
            if state.running {
                Value::Number(scope.frame_time_ms - state.epoch_ms)
            } else {
                Value::Number(state.frozen_ms)
            }
        }
        NodeKind::ClockStart { clock } => {
            let now = scope.frame_time_ms;
            with_clock(scope, clock, |state| {
                if !state.running {
                    state.running = true;
                    state.epoch_ms = now;
                    state.frozen_ms = 0.0;
                }
            });
            Value::zero()
        }
        NodeKind::ClockStop { clock } => {
            let now = scope.frame_time_ms;
            with_clock(scope, clock, |state| {
                if state.running {
                    state.frozen_ms = now - state.epoch_ms;
                    state.running = false;
                }
            });
            Value::zero()
        }
        NodeKind::ClockTest { clock } => {
            let running = match scope.store.get(clock).map(|node| node.kind()) {
                Some(NodeKind::Clock(state)) => state.running,
                _ => false,
            };
            Value::Number(if running { 1.0 } else { 0.0 })
        }
        NodeKind::Call { callback } => {
            let args = children
                .iter()
                .map(|&child| evaluate(scope, child))
                .collect();
            scope.sink.record_call(callback, args);
            Value::zero()
        }
        NodeKind::Bezier { curve, input } => {
            let t = evaluate(scope, input).as_number();
            Value::Number(curve.solve(t))
        }
        NodeKind::Event { payload, .. } => match payload {
            Some(fields) => Value::Map(fields),
            None => Value::zero(),
        },
        NodeKind::Always { target } => {
            evaluate(scope, target);
            Value::zero()
        }
        NodeKind::Concat => {
            let mut joined = String::new();
            for &child in &children {
                joined.push_str(&evaluate(scope, child).stringify());
            }
            Value::Text(joined)
        }
        NodeKind::Noop => Value::zero(),
    };

    if let Some(node) = scope.store.get_mut(id) {
        node.memo = Some((scope.generation, result.clone()));
    }
    result
}

/// Merge the props mapping into one property map, flattening map-valued
/// children (style nodes) into the top level, and record it against the
/// bound view if any.
fn eval_props(
    scope: &mut EvalScope<'_>,
    id: NodeId,
    mapping: &IndexMap<String, NodeId>,
    view: Option<crate::graph::node::ViewId>,
) -> Value {
    let mut props = IndexMap::new();
    for (name, &child) in mapping {
        match evaluate(scope, child) {
            Value::Map(entries) => props.extend(entries),
            value => {
                props.insert(name.clone(), value);
            }
        }
    }
    match view {
        Some(view) => scope.sink.record_props(view, props.clone()),
        None => debug!(target: "kinetic::node", node = %id, "props node evaluated without a view"),
    }
    Value::Map(props)
}

fn eval_style(scope: &mut EvalScope<'_>, mapping: &IndexMap<String, NodeId>) -> Value {
    let mut style = IndexMap::with_capacity(mapping.len());
    for (name, &child) in mapping {
        style.insert(name.clone(), evaluate(scope, child));
    }
    Value::Map(style)
}

fn with_clock(
    scope: &mut EvalScope<'_>,
    clock: NodeId,
    apply: impl FnOnce(&mut crate::graph::node::ClockState),
) {
    match scope.store.get_mut(clock).map(|node| &mut node.kind) {
        Some(NodeKind::Clock(state)) => apply(state),
        Some(other) => {
            let actual = other.name();
            warn!(node = %clock, actual, "clock operation targets a non-clock node");
        }
        None => {}
    }
}
