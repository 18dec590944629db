//! Engine Runtime
//!
//! Everything around the graph that makes it run: the host boundary, the
//! thread-safe ingress queues, the per-tick effect sink, and the update
//! scheduler that ties them together.
//!
//! # Threading Model
//!
//! The [`Engine`] and its graph are single-threaded: the host calls
//! `Engine::on_frame` from its display-refresh thread and all evaluation
//! happens there. Only the two ingress handles cross threads:
//!
//! - [`EventRouter`] accepts UI-event payloads from any thread.
//! - [`CommandQueue`] accepts graph-mutation commands from any thread.
//!
//! Both arm the scheduler through an idempotent frame-request latch, so an
//! idle engine wakes up for exactly one frame per burst of input.

pub mod commands;
pub mod events;
pub mod host;
pub mod scheduler;
pub mod sink;

pub use commands::{Command, CommandQueue, FrameCallback, ValueReply};
pub use events::{EventKey, EventRouter};
pub use host::{HostBridge, LayoutRect};
pub use scheduler::{Engine, SchedulerState};
pub use sink::{CallInvocation, EffectSink, FrameBatch, ViewUpdate};
