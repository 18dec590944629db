//! Command Ingress
//!
//! Graph-mutation commands arrive from the scripting layer on arbitrary
//! threads. [`CommandQueue`] serializes them onto the evaluation context:
//! submission enqueues and arms the scheduler, and the engine applies the
//! whole backlog strictly between ticks, never interleaved with an
//! in-progress evaluation.
//!
//! A failed command is reported through `HostBridge::command_failed` and
//! does not affect the commands queued after it.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::graph::config::NodeConfig;
use crate::graph::node::{NodeId, ViewId};
use crate::value::Value;

/// Reply callback for value reads submitted from other threads.
pub type ValueReply = Box<dyn FnOnce(Value) + Send>;

/// One-shot callback run at the start of a tick with the frame timestamp.
pub type FrameCallback = Box<dyn FnOnce(f64) + Send>;

/// A graph-mutation command from the scripting layer.
pub enum Command {
    CreateNode { id: NodeId, config: NodeConfig },
    DropNode { id: NodeId },
    ConnectNodes { parent: NodeId, child: NodeId },
    DisconnectNodes { parent: NodeId, child: NodeId },
    ConnectToView { node: NodeId, view: ViewId },
    DisconnectFromView { node: NodeId },
    AttachEvent { view: ViewId, event: String, node: NodeId },
    DetachEvent { view: ViewId, event: String },
    ConfigureProps { ui_props: HashSet<String>, native_props: HashSet<String> },
    SetValue { node: NodeId, value: Value },
    GetValue { node: NodeId, reply: ValueReply },
    OnNextFrame(FrameCallback),
}

impl Command {
    /// Command name for logs; the payload can contain non-Debug callbacks.
    pub fn name(&self) -> &'static str {
        match self {
            Command::CreateNode { .. } => "createNode",
            Command::DropNode { .. } => "dropNode",
            Command::ConnectNodes { .. } => "connectNodes",
            Command::DisconnectNodes { .. } => "disconnectNodes",
            Command::ConnectToView { .. } => "connectToView",
            Command::DisconnectFromView { .. } => "disconnectFromView",
            Command::AttachEvent { .. } => "attachEvent",
            Command::DetachEvent { .. } => "detachEvent",
            Command::ConfigureProps { .. } => "configureProps",
            Command::SetValue { .. } => "setValue",
            Command::GetValue { .. } => "getValue",
            Command::OnNextFrame(_) => "onNextFrame",
        }
    }
}

/// Cloneable, thread-safe handle for submitting commands to the engine.
#[derive(Clone)]
pub struct CommandQueue {
    pending: Arc<Mutex<Vec<Command>>>,
    waker: crate::runtime::host::FrameWaker,
}

impl CommandQueue {
    pub(crate) fn new(waker: crate::runtime::host::FrameWaker) -> Self {
        Self {
            pending: Arc::new(Mutex::new(Vec::new())),
            waker,
        }
    }

    /// Enqueue a command for the next tick boundary. Callable from any
    /// thread.
    pub fn submit(&self, command: Command) {
        self.pending.lock().push(command);
        self.waker.arm();
    }

    /// Take the whole backlog in submission order. Called only by the
    /// engine between ticks.
    pub(crate) fn drain(&self) -> Vec<Command> {
        std::mem::take(&mut *self.pending.lock())
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }
}
