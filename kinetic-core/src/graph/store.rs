//! Node Store
//!
//! Owns every node by id in a dense map. All graph-shape mutations go
//! through here: create/drop, connect/disconnect, view bindings, event
//! bindings, and the always-root set the scheduler pulls each frame.
//!
//! The store is owned and mutated by exactly one evaluation context, so it
//! needs no interior locking. The one shared piece is the event-binding
//! map: pusher threads consult it to decide whether anyone is waiting for
//! an event, so it lives in a concurrent map handed to the event router.

use std::collections::BTreeSet;
use std::sync::Arc;

use dashmap::DashMap;
use indexmap::IndexMap;

use crate::error::EngineError;
use crate::graph::config::NodeConfig;
use crate::graph::node::{Node, NodeId, NodeKind, ViewId};
use crate::runtime::events::EventKey;
use crate::value::Value;

/// Arena of nodes indexed by host-assigned id.
pub struct NodeStore {
    nodes: IndexMap<NodeId, Node>,
    /// Always nodes, kept sorted so per-frame root evaluation and the
    /// same-view prop merge order are deterministic (ascending node id).
    always_roots: BTreeSet<NodeId>,
    /// (view, event) -> event node. Shared with the event router, which
    /// reads it from pusher threads.
    event_bindings: Arc<DashMap<EventKey, NodeId>>,
}

impl NodeStore {
    pub fn new() -> Self {
        Self {
            nodes: IndexMap::new(),
            always_roots: BTreeSet::new(),
            event_bindings: Arc::new(DashMap::new()),
        }
    }

    /// Handle to the event-binding map for the event router.
    pub(crate) fn event_bindings(&self) -> Arc<DashMap<EventKey, NodeId>> {
        Arc::clone(&self.event_bindings)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Create a node from its wire config. Fails if the id is taken.
    pub fn create(&mut self, id: NodeId, config: NodeConfig) -> Result<(), EngineError> {
        if self.nodes.contains_key(&id) {
            return Err(EngineError::DuplicateId(id));
        }
        let (kind, children) = config.into_parts();
        if matches!(kind, NodeKind::Always { .. }) {
            self.always_roots.insert(id);
        }
        let mut node = Node::new(id, kind);
        node.children = children;
        self.nodes.insert(id, node);
        Ok(())
    }

    /// Remove a node. Idempotent: dropping an absent id is a no-op.
    ///
    /// The id is also scrubbed from every parent's child list, from the
    /// always-root set, and from any event bindings that target it. Readers
    /// holding the id fall back to no-op semantics on their next evaluation.
    pub fn drop_node(&mut self, id: NodeId) {
        if self.nodes.shift_remove(&id).is_none() {
            return;
        }
        self.always_roots.remove(&id);
        for node in self.nodes.values_mut() {
            node.children.retain(|child| *child != id);
        }
        self.event_bindings.retain(|_, bound| *bound != id);
    }

    /// Append `child` to `parent`'s child list.
    pub fn connect(&mut self, parent: NodeId, child: NodeId) -> Result<(), EngineError> {
        if !self.nodes.contains_key(&child) {
            return Err(EngineError::UnknownNode(child));
        }
        let parent_node = self
            .nodes
            .get_mut(&parent)
            .ok_or(EngineError::UnknownNode(parent))?;
        parent_node.children.push(child);
        Ok(())
    }

    /// Remove every occurrence of `child` from `parent`'s child list.
    pub fn disconnect(&mut self, parent: NodeId, child: NodeId) -> Result<(), EngineError> {
        if !self.nodes.contains_key(&child) {
            return Err(EngineError::UnknownNode(child));
        }
        let parent_node = self
            .nodes
            .get_mut(&parent)
            .ok_or(EngineError::UnknownNode(parent))?;
        parent_node.children.retain(|existing| *existing != child);
        Ok(())
    }

    /// Bind a props node to a host view. Its merged property map is then
    /// recorded into the effect sink each generation it is evaluated.
    pub fn bind_to_view(&mut self, id: NodeId, view: ViewId) -> Result<(), EngineError> {
        match self.expect_kind_mut(id)? {
            NodeKind::Props { view: bound, .. } => {
                *bound = Some(view);
                Ok(())
            }
            other => Err(EngineError::NodeTypeMismatch {
                id,
                expected: "props",
                actual: other.name(),
            }),
        }
    }

    /// Detach a props node from its view.
    pub fn unbind_from_view(&mut self, id: NodeId) -> Result<(), EngineError> {
        match self.expect_kind_mut(id)? {
            NodeKind::Props { view: bound, .. } => {
                *bound = None;
                Ok(())
            }
            other => Err(EngineError::NodeTypeMismatch {
                id,
                expected: "props",
                actual: other.name(),
            }),
        }
    }

    /// Route `(view, event)` to an event node. The key must be free.
    pub fn attach_event(
        &mut self,
        view: ViewId,
        event: &str,
        id: NodeId,
    ) -> Result<(), EngineError> {
        match self.expect_kind_mut(id)? {
            NodeKind::Event { .. } => {}
            other => {
                return Err(EngineError::NodeTypeMismatch {
                    id,
                    expected: "event",
                    actual: other.name(),
                })
            }
        }
        let key = EventKey::new(view, event);
        if self.event_bindings.contains_key(&key) {
            return Err(EngineError::DuplicateBinding {
                view,
                event: event.to_string(),
            });
        }
        self.event_bindings.insert(key, id);
        Ok(())
    }

    /// Remove an event routing. Idempotent.
    pub fn detach_event(&mut self, view: ViewId, event: &str) {
        self.event_bindings.remove(&EventKey::new(view, event));
    }

    /// Write a value node's payload directly. Missing ids are ignored,
    /// matching the null-safe external set path of the original system.
    pub fn set_value(&mut self, id: NodeId, value: Value) -> Result<(), EngineError> {
        let Some(node) = self.nodes.get_mut(&id) else {
            return Ok(());
        };
        match &mut node.kind {
            NodeKind::Value { payload } => {
                *payload = value;
                Ok(())
            }
            NodeKind::Noop => Ok(()),
            other => Err(EngineError::NodeTypeMismatch {
                id,
                expected: "value",
                actual: other.name(),
            }),
        }
    }

    pub fn has_always_roots(&self) -> bool {
        !self.always_roots.is_empty()
    }

    /// Always roots in ascending id order.
    pub fn always_roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.always_roots.iter().copied()
    }

    fn expect_kind_mut(&mut self, id: NodeId) -> Result<&mut NodeKind, EngineError> {
        self.nodes
            .get_mut(&id)
            .map(|node| &mut node.kind)
            .ok_or(EngineError::UnknownNode(id))
    }
}

impl Default for NodeStore {
    fn default() -> Self {
        Self::new()
    }
}
