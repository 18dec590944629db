//! Kinetic Core
//!
//! This crate provides the core runtime for the Kinetic declarative
//! animation engine. It implements:
//!
//! - A dataflow graph of small typed nodes (values, operators, conditionals,
//!   clocks, easing curves, event sources)
//! - Frame-synchronous, memoized pull evaluation driven by the host's
//!   display-refresh ticks
//! - Batched view-property output and fire-and-forget host callbacks
//! - Thread-safe ingress for UI events and graph-mutation commands
//!
//! The graph is declared once by the scripting layer and then driven
//! entirely by the engine, so animations and gesture responses stay on the
//! host's frame thread instead of round-tripping through the script runtime
//! on every frame.
//!
//! # Architecture
//!
//! The crate is organized into two layers:
//!
//! - `graph`: the node arena, node kinds, and memoized evaluation
//! - `runtime`: the host boundary, event/command ingress, effect batching,
//!   and the update scheduler
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use kinetic_core::graph::{NodeConfig, NodeId, Operator, ViewId};
//! use kinetic_core::runtime::{Command, Engine};
//!
//! let mut engine = Engine::new(Arc::new(MyBridge::new()));
//! let commands = engine.commands();
//!
//! // left = x + 10, pushed to view 7 every frame
//! commands.submit(Command::CreateNode {
//!     id: NodeId::new(1),
//!     config: NodeConfig::Value { value: 0.0 },
//! });
//! commands.submit(Command::CreateNode {
//!     id: NodeId::new(2),
//!     config: NodeConfig::Value { value: 10.0 },
//! });
//! commands.submit(Command::CreateNode {
//!     id: NodeId::new(3),
//!     config: NodeConfig::Op {
//!         op: Operator::Add,
//!         input: vec![NodeId::new(1), NodeId::new(2)],
//!     },
//! });
//!
//! // The host's display-refresh source then calls engine.on_frame(t)
//! // for every frame the engine requests.
//! ```

pub mod error;
pub mod graph;
pub mod runtime;
pub mod value;

pub use error::EngineError;
pub use value::Value;
