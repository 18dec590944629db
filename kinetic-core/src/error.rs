//! Error Taxonomy
//!
//! All fallible operations in the engine are graph-mutation commands. Their
//! failures are reported to the command's originator and never affect other
//! queued commands or the next tick. Evaluation itself is infallible: missing
//! node ids resolve to no-op semantics and arithmetic edge cases produce IEEE
//! sentinel values, so a single stale reference cannot wedge the engine.

use thiserror::Error;

use crate::graph::node::{NodeId, ViewId};

/// Errors produced while applying graph-mutation commands.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// A create command reused an id that is still alive.
    #[error("node {0} already exists")]
    DuplicateId(NodeId),

    /// A connect/disconnect/bind command referenced an absent id.
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),

    /// An operation required a specific node kind.
    #[error("node {id} is a {actual} node, expected {expected}")]
    NodeTypeMismatch {
        id: NodeId,
        expected: &'static str,
        actual: &'static str,
    },

    /// An event handler is already attached for the given view and event.
    #[error("event handler already attached for view {view}, event {event}")]
    DuplicateBinding { view: ViewId, event: String },

    /// A creation config named a node type the engine does not know.
    #[error("unsupported node type: {0}")]
    UnknownNodeType(String),
}
