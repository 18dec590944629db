//! Graph Nodes
//!
//! This module defines the node variants that live in the dataflow graph.
//!
//! A node is a tagged variant plus an ordered list of child ids. Children
//! are the generic dependency edges maintained by connect/disconnect; the
//! n-ary kinds (operator, block, concat, call) evaluate over them. Kinds
//! with fixed roles (cond, set, clock operations, bezier, always, debug)
//! capture the ids of their collaborators in their variant data at creation
//! time instead.
//!
//! All inter-node references are plain ids, never owning pointers. A child
//! id that no longer resolves is not an error: the reader falls back to
//! no-op semantics (value 0, effects ignored) on its next evaluation.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::graph::bezier::CubicBezier;
use crate::graph::ops::Operator;
use crate::value::Value;

/// Unique identifier for a node, assigned by the host at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(u64);

impl NodeId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl From<u64> for NodeId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque handle to a host view that props nodes can bind to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ViewId(u64);

impl ViewId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl From<u64> for ViewId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque handle to a host-registered callback invoked by call nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallbackId(u64);

impl CallbackId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl From<u64> for CallbackId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// Running state of a clock node.
///
/// While running, the clock's value is the scheduler's current frame
/// timestamp minus the epoch. Stopping freezes the elapsed time; starting
/// again restarts from zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClockState {
    pub running: bool,
    pub epoch_ms: f64,
    pub frozen_ms: f64,
}

/// One component of a transform node: a named transform property fed either
/// by another node or by a static number captured at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformSpec {
    pub property: String,
    #[serde(flatten)]
    pub source: TransformSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransformSource {
    NodeId(NodeId),
    Value(f64),
}

/// One entry of an event node's payload mapping: when an event arrives,
/// the named payload field is written into the target value node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMapEntry {
    pub field: String,
    pub target: NodeId,
}

/// The closed set of node kinds, with kind-specific config and state.
///
/// Config is immutable after creation, with two exceptions: a value node's
/// payload (written by set nodes and external set-value commands) and a
/// clock's running state (toggled by clock start/stop nodes).
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Mutable scalar leaf.
    Value { payload: Value },
    /// Named-child map producing view property updates when bound to a view.
    Props {
        mapping: IndexMap<String, NodeId>,
        view: Option<ViewId>,
    },
    /// Nested named-child map, normally a props child.
    Style { mapping: IndexMap<String, NodeId> },
    /// Assembles named transform components into one descriptor list.
    Transform { specs: Vec<TransformSpec> },
    /// Ordered child sequence; value is the last child's value.
    Block,
    /// Conditional: evaluates only the taken branch.
    Cond {
        cond: NodeId,
        if_node: NodeId,
        else_node: Option<NodeId>,
    },
    /// N-ary arithmetic/boolean/comparison over the children.
    Operator { op: Operator },
    /// Effect: assigns the source node's value into the target value node.
    Set { target: NodeId, source: NodeId },
    /// Effect: logs a labelled value and passes it through.
    Debug { message: String, value: NodeId },
    /// Stateful frame timer.
    Clock(ClockState),
    /// Effect: starts the target clock.
    ClockStart { clock: NodeId },
    /// Effect: stops the target clock.
    ClockStop { clock: NodeId },
    /// Query: 1 while the target clock runs, 0 otherwise.
    ClockTest { clock: NodeId },
    /// Effect: enqueues a fire-and-forget host callback invocation with the
    /// children's values as arguments.
    Call { callback: CallbackId },
    /// Cubic easing curve over a normalized-time child.
    Bezier { curve: CubicBezier, input: NodeId },
    /// Leaf holding the most recent payload delivered by the event router.
    Event {
        mapping: Vec<EventMapEntry>,
        payload: Option<IndexMap<String, Value>>,
    },
    /// Marks a subtree as a per-frame evaluation root.
    Always { target: NodeId },
    /// String-joins the stringified children.
    Concat,
    /// Sentinel: value always 0, assignment silently ignored. Internal only;
    /// missing-id lookups resolve to these semantics.
    Noop,
}

impl NodeKind {
    /// Short kind name used in logs and type-mismatch errors.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Value { .. } => "value",
            NodeKind::Props { .. } => "props",
            NodeKind::Style { .. } => "style",
            NodeKind::Transform { .. } => "transform",
            NodeKind::Block => "block",
            NodeKind::Cond { .. } => "cond",
            NodeKind::Operator { .. } => "op",
            NodeKind::Set { .. } => "set",
            NodeKind::Debug { .. } => "debug",
            NodeKind::Clock(_) => "clock",
            NodeKind::ClockStart { .. } => "clockStart",
            NodeKind::ClockStop { .. } => "clockStop",
            NodeKind::ClockTest { .. } => "clockTest",
            NodeKind::Call { .. } => "call",
            NodeKind::Bezier { .. } => "bezier",
            NodeKind::Event { .. } => "event",
            NodeKind::Always { .. } => "always",
            NodeKind::Concat => "concat",
            NodeKind::Noop => "noop",
        }
    }
}

/// A node in the dataflow graph.
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    /// Ordered dependency edges, mutated by connect/disconnect.
    pub(crate) children: SmallVec<[NodeId; 4]>,
    pub(crate) kind: NodeKind,
    /// Memo cache: the value computed in `generation`. Within one
    /// generation a node is recomputed at most once regardless of fan-in.
    pub(crate) memo: Option<(u64, Value)>,
}

impl Node {
    pub fn new(id: NodeId, kind: NodeKind) -> Self {
        Self {
            id,
            children: SmallVec::new(),
            kind,
            memo: None,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// The memoized value for `generation`, if this node was already
    /// evaluated in it.
    pub fn cached(&self, generation: u64) -> Option<&Value> {
        match &self.memo {
            Some((memo_generation, value)) if *memo_generation == generation => Some(value),
            _ => None,
        }
    }
}
