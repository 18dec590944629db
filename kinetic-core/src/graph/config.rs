//! Node Creation Configs
//!
//! The wire shape of a `create` command. Configs arrive from the scripting
//! layer as tagged maps (`{"type": "op", "op": "add", "input": [1, 2]}`)
//! and are captured immutably at creation time.
//!
//! Conversion to a [`NodeKind`] also yields the seed children: the n-ary
//! kinds declare their initial operand lists in the config, which land in
//! the node's child list where connect/disconnect can mutate them later.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::EngineError;
use crate::graph::bezier::CubicBezier;
use crate::graph::node::{
    CallbackId, ClockState, EventMapEntry, NodeId, NodeKind, TransformSpec,
};
use crate::graph::ops::Operator;

/// Creation-time description of a node, tagged by kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodeConfig {
    Value {
        #[serde(default)]
        value: f64,
    },
    Props {
        props: IndexMap<String, NodeId>,
    },
    Style {
        style: IndexMap<String, NodeId>,
    },
    Transform {
        transform: Vec<TransformSpec>,
    },
    Block {
        block: Vec<NodeId>,
    },
    Cond {
        cond: NodeId,
        #[serde(rename = "ifBlock")]
        if_block: NodeId,
        #[serde(rename = "elseBlock", default)]
        else_block: Option<NodeId>,
    },
    Op {
        op: Operator,
        input: Vec<NodeId>,
    },
    Set {
        what: NodeId,
        value: NodeId,
    },
    Debug {
        message: String,
        value: NodeId,
    },
    Clock,
    ClockStart {
        what: NodeId,
    },
    ClockStop {
        what: NodeId,
    },
    ClockTest {
        what: NodeId,
    },
    Call {
        callback: CallbackId,
        input: Vec<NodeId>,
    },
    Bezier {
        #[serde(rename = "mX1")]
        x1: f64,
        #[serde(rename = "mY1")]
        y1: f64,
        #[serde(rename = "mX2")]
        x2: f64,
        #[serde(rename = "mY2")]
        y2: f64,
        input: NodeId,
    },
    Event {
        #[serde(rename = "argMapping", default)]
        arg_mapping: Vec<EventMapEntry>,
    },
    Always {
        what: NodeId,
    },
    Concat {
        input: Vec<NodeId>,
    },
}

impl NodeConfig {
    /// Parse a config from its JSON wire form.
    ///
    /// An unknown `type` tag surfaces as [`EngineError::UnknownNodeType`]
    /// so the command's originator sees the offending name.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        serde_json::from_str(json).map_err(|err| EngineError::UnknownNodeType(err.to_string()))
    }

    /// Split the config into the node's kind and its seed children.
    pub(crate) fn into_parts(self) -> (NodeKind, SmallVec<[NodeId; 4]>) {
        match self {
            NodeConfig::Value { value } => (
                NodeKind::Value {
                    payload: crate::value::Value::Number(value),
                },
                SmallVec::new(),
            ),
            NodeConfig::Props { props } => (
                NodeKind::Props {
                    mapping: props,
                    view: None,
                },
                SmallVec::new(),
            ),
            NodeConfig::Style { style } => (NodeKind::Style { mapping: style }, SmallVec::new()),
            NodeConfig::Transform { transform } => {
                (NodeKind::Transform { specs: transform }, SmallVec::new())
            }
            NodeConfig::Block { block } => (NodeKind::Block, block.into_iter().collect()),
            NodeConfig::Cond {
                cond,
                if_block,
                else_block,
            } => (
                NodeKind::Cond {
                    cond,
                    if_node: if_block,
                    else_node: else_block,
                },
                SmallVec::new(),
            ),
            NodeConfig::Op { op, input } => {
                (NodeKind::Operator { op }, input.into_iter().collect())
            }
            NodeConfig::Set { what, value } => (
                NodeKind::Set {
                    target: what,
                    source: value,
                },
                SmallVec::new(),
            ),
            NodeConfig::Debug { message, value } => {
                (NodeKind::Debug { message, value }, SmallVec::new())
            }
            NodeConfig::Clock => (NodeKind::Clock(ClockState::default()), SmallVec::new()),
            NodeConfig::ClockStart { what } => {
                (NodeKind::ClockStart { clock: what }, SmallVec::new())
            }
            NodeConfig::ClockStop { what } => {
                (NodeKind::ClockStop { clock: what }, SmallVec::new())
            }
            NodeConfig::ClockTest { what } => {
                (NodeKind::ClockTest { clock: what }, SmallVec::new())
            }
            NodeConfig::Call { callback, input } => {
                (NodeKind::Call { callback }, input.into_iter().collect())
            }
            NodeConfig::Bezier {
                x1,
                y1,
                x2,
                y2,
                input,
            } => (
                NodeKind::Bezier {
                    curve: CubicBezier::new(x1, y1, x2, y2),
                    input,
                },
                SmallVec::new(),
            ),
            NodeConfig::Event { arg_mapping } => (
                NodeKind::Event {
                    mapping: arg_mapping,
                    payload: None,
                },
                SmallVec::new(),
            ),
            NodeConfig::Always { what } => (NodeKind::Always { target: what }, SmallVec::new()),
            NodeConfig::Concat { input } => (NodeKind::Concat, input.into_iter().collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn op_config_parses_and_seeds_children() {
        let config =
            NodeConfig::from_json(r#"{"type": "op", "op": "add", "input": [1, 2]}"#).unwrap();
        let (kind, children) = config.into_parts();
        assert_eq!(kind.name(), "op");
        assert_eq!(children.as_slice(), &[NodeId::new(1), NodeId::new(2)]);
    }

    #[test]
    fn value_config_defaults_to_zero() {
        let config = NodeConfig::from_json(r#"{"type": "value"}"#).unwrap();
        let (kind, _) = config.into_parts();
        match kind {
            NodeKind::Value { payload } => assert_eq!(payload.as_number(), 0.0),
            other => panic!("expected value node, got {}", other.name()),
        }
    }

    #[test]
    fn unknown_type_is_reported_by_name() {
        let err = NodeConfig::from_json(r#"{"type": "teleport"}"#).unwrap_err();
        match err {
            EngineError::UnknownNodeType(message) => assert!(message.contains("teleport")),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn bezier_config_uses_wire_field_names() {
        let config = NodeConfig::from_json(
            r#"{"type": "bezier", "mX1": 0.42, "mY1": 0.0, "mX2": 0.58, "mY2": 1.0, "input": 9}"#,
        )
        .unwrap();
        let (kind, _) = config.into_parts();
        match kind {
            NodeKind::Bezier { curve, input } => {
                assert_eq!(curve.x1, 0.42);
                assert_eq!(input, NodeId::new(9));
            }
            other => panic!("expected bezier node, got {}", other.name()),
        }
    }

    #[test]
    fn cond_else_branch_is_optional() {
        let config =
            NodeConfig::from_json(r#"{"type": "cond", "cond": 1, "ifBlock": 2}"#).unwrap();
        let (kind, _) = config.into_parts();
        match kind {
            NodeKind::Cond { else_node, .. } => assert!(else_node.is_none()),
            other => panic!("expected cond node, got {}", other.name()),
        }
    }
}
