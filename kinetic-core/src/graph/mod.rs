//! Dataflow Graph
//!
//! This module implements the declarative dataflow graph: the arena of
//! nodes, the closed set of node kinds, and the memoized pull-based
//! evaluation that runs once per display frame.
//!
//! # Overview
//!
//! The graph is a DAG of small nodes referencing each other by plain ids.
//! Evaluating a node pulls its inputs recursively; a per-generation memo
//! cache makes shared subgraphs (diamonds) evaluate once per tick and
//! gates side effects to once per generation.
//!
//! # Design Decisions
//!
//! 1. Nodes live in a dense id-indexed arena rather than owning each other.
//!    Inter-node references are integers, which eliminates ownership cycles
//!    and makes dropping a shared node safe: readers see no-op semantics.
//!
//! 2. The node vocabulary is one closed enum dispatched by a single
//!    exhaustive match, so adding a kind is compiler-checked everywhere.

pub mod bezier;
pub mod config;
pub(crate) mod eval;
pub mod node;
pub mod ops;
pub mod store;

pub use bezier::CubicBezier;
pub use config::NodeConfig;
pub use node::{
    CallbackId, ClockState, EventMapEntry, Node, NodeId, NodeKind, TransformSource, TransformSpec,
    ViewId,
};
pub use ops::Operator;
pub use store::NodeStore;
