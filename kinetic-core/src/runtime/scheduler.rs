//! Update Scheduler
//!
//! The engine owns all graph state and drives it from the host's frame
//! ticks. One tick performs, in order:
//!
//! 1. Apply the queued command backlog (strictly between ticks).
//! 2. Increment the generation counter.
//! 3. Drain the event router and dispatch payloads to event nodes.
//! 4. Run one-shot frame callbacks registered for this tick.
//! 5. Evaluate every always-root (ascending node id), pulling subgraphs.
//! 6. Flush the effect sink and commit the batch to the host.
//! 7. Re-arm for the next frame iff work remains.
//!
//! Between ticks the scheduler is either idle (no frame requested) or
//! armed (one frame callback outstanding). Arming is idempotent; pushing
//! events, submitting commands, and creating always-roots all arm it.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::EngineError;
use crate::graph::eval::{evaluate, EvalScope};
use crate::graph::node::{NodeId, NodeKind, ViewId};
use crate::graph::store::NodeStore;
use crate::runtime::commands::{Command, CommandQueue, FrameCallback};
use crate::runtime::events::{EventRouter, PendingEvent};
use crate::runtime::host::{FrameWaker, HostBridge, LayoutRect};
use crate::runtime::sink::EffectSink;
use crate::value::Value;

/// Where the scheduler is in its frame cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// No frame callback outstanding.
    Idle,
    /// A frame callback has been requested from the host.
    Armed,
    /// Currently executing one frame's work.
    Ticking,
}

/// The evaluation context: node store, generation counter, effect sink and
/// scheduler state bundled into one explicitly owned value. The embedding
/// host owns the engine's lifecycle; independent instances do not share
/// any state.
pub struct Engine {
    store: NodeStore,
    sink: EffectSink,
    generation: u64,
    frame_time_ms: f64,
    ticking: bool,
    paused: bool,
    frame_callbacks: Vec<FrameCallback>,
    events: EventRouter,
    commands: CommandQueue,
    waker: FrameWaker,
    bridge: Arc<dyn HostBridge>,
}

impl Engine {
    pub fn new(bridge: Arc<dyn HostBridge>) -> Self {
        let store = NodeStore::new();
        let waker = FrameWaker::new(Arc::clone(&bridge));
        let events = EventRouter::new(store.event_bindings(), waker.clone());
        let commands = CommandQueue::new(waker.clone());
        Self {
            store,
            sink: EffectSink::new(),
            generation: 0,
            frame_time_ms: 0.0,
            ticking: false,
            paused: false,
            frame_callbacks: Vec::new(),
            events,
            commands,
            waker,
            bridge,
        }
    }

    /// Thread-safe handle for pushing UI events.
    pub fn events(&self) -> EventRouter {
        self.events.clone()
    }

    /// Thread-safe handle for submitting graph commands.
    pub fn commands(&self) -> CommandQueue {
        self.commands.clone()
    }

    pub fn state(&self) -> SchedulerState {
        if self.ticking {
            SchedulerState::Ticking
        } else if self.waker.is_posted() {
            SchedulerState::Armed
        } else {
            SchedulerState::Idle
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    /// Apply one command directly on the evaluation context, returning the
    /// failure to the caller. The queued path reports failures through
    /// `HostBridge::command_failed` instead.
    pub fn apply(&mut self, command: Command) -> Result<(), EngineError> {
        let result = match command {
            Command::CreateNode { id, config } => self.store.create(id, config),
            Command::DropNode { id } => {
                self.store.drop_node(id);
                Ok(())
            }
            Command::ConnectNodes { parent, child } => self.store.connect(parent, child),
            Command::DisconnectNodes { parent, child } => self.store.disconnect(parent, child),
            Command::ConnectToView { node, view } => self.store.bind_to_view(node, view),
            Command::DisconnectFromView { node } => self.store.unbind_from_view(node),
            Command::AttachEvent { view, event, node } => {
                self.store.attach_event(view, &event, node)
            }
            Command::DetachEvent { view, event } => {
                self.store.detach_event(view, &event);
                Ok(())
            }
            Command::ConfigureProps {
                ui_props,
                native_props,
            } => {
                self.sink.configure_props(ui_props, native_props);
                Ok(())
            }
            Command::SetValue { node, value } => self.store.set_value(node, value),
            Command::GetValue { node, reply } => {
                let value = self.value_of(node);
                reply(value);
                Ok(())
            }
            Command::OnNextFrame(callback) => {
                self.frame_callbacks.push(callback);
                self.waker.arm();
                Ok(())
            }
        };

        // Any mutation that leaves an always-rooted subtree standing must
        // keep the frame loop alive.
        if result.is_ok() && !self.paused && self.store.has_always_roots() {
            self.waker.arm();
        }
        result
    }

    /// Read a node's value outside a tick, reusing this generation's memo.
    /// Effects triggered by the read land in the sink and flush with the
    /// next tick.
    pub fn value_of(&mut self, id: NodeId) -> Value {
        let mut scope = EvalScope {
            store: &mut self.store,
            sink: &mut self.sink,
            generation: self.generation,
            frame_time_ms: self.frame_time_ms,
        };
        evaluate(&mut scope, id)
    }

    /// Register a one-shot callback for the start of the next tick.
    pub fn post_frame_callback(&mut self, callback: FrameCallback) {
        self.frame_callbacks.push(callback);
        if !self.paused {
            self.waker.arm();
        }
    }

    /// Execute one frame. Called by the host's display-refresh source with
    /// the current frame timestamp in milliseconds.
    pub fn on_frame(&mut self, timestamp_ms: f64) {
        if self.paused {
            self.waker.clear();
            return;
        }
        self.ticking = true;
        self.waker.clear();

        // Commands apply strictly between ticks: everything queued up to
        // here runs before the tick body, later submissions wait.
        for command in self.commands.drain() {
            let name = command.name();
            if let Err(error) = self.apply(command) {
                debug!(command = name, %error, "queued command rejected");
                self.bridge.command_failed(error);
            }
        }

        self.generation += 1;
        self.frame_time_ms = timestamp_ms;
        trace!(generation = self.generation, timestamp_ms, "tick");

        for event in self.events.drain() {
            self.dispatch_event(event);
        }

        let callbacks = std::mem::take(&mut self.frame_callbacks);
        for callback in callbacks {
            callback(timestamp_ms);
        }

        let roots: Vec<NodeId> = self.store.always_roots().collect();
        {
            let mut scope = EvalScope {
                store: &mut self.store,
                sink: &mut self.sink,
                generation: self.generation,
                frame_time_ms: self.frame_time_ms,
            };
            for root in roots {
                evaluate(&mut scope, root);
            }
        }

        let batch = self.sink.flush();
        if !batch.is_empty() {
            self.bridge.commit(batch);
        }

        self.ticking = false;
        if self.store.has_always_roots()
            || !self.frame_callbacks.is_empty()
            || !self.events.is_empty()
        {
            self.waker.arm();
        }
    }

    /// Suspend ticking, e.g. while the host application is backgrounded.
    /// Frames that still arrive are consumed without work.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume ticking and re-arm if any work is pending.
    pub fn resume(&mut self) {
        self.paused = false;
        if self.store.has_always_roots()
            || !self.frame_callbacks.is_empty()
            || !self.events.is_empty()
            || !self.commands.is_empty()
        {
            self.waker.arm();
        }
    }

    /// Resolve a view's layout through the host. Unknown views report a
    /// NaN rect so downstream arithmetic degrades instead of crashing.
    pub fn measure(&self, view: ViewId) -> LayoutRect {
        self.bridge.measure(view).unwrap_or_else(LayoutRect::nan)
    }

    /// Scroll a host view.
    pub fn scroll_to(&self, view: ViewId, x: f64, y: f64, animated: bool) {
        self.bridge.scroll_to(view, x, y, animated);
    }

    /// Toggle an externally managed gesture handler.
    pub fn set_external_handler_state(&self, handler: u64, active: bool) {
        self.bridge.set_external_handler_state(handler, active);
    }

    /// Deliver one event payload: remember it on the event node and write
    /// mapped fields into their target value nodes. A binding that
    /// disappeared since the push is dropped silently.
    fn dispatch_event(&mut self, event: PendingEvent) {
        let Some(node_id) = self.events.node_for(&event.key) else {
            trace!(view = %event.key.view, name = %event.key.name, "event binding gone, dropping");
            return;
        };
        let mapping = match self.store.get_mut(node_id).map(|node| &mut node.kind) {
            Some(NodeKind::Event { mapping, payload }) => {
                *payload = Some(event.payload.clone());
                mapping.clone()
            }
            _ => return,
        };
        for entry in mapping {
            if let Some(value) = event.payload.get(&entry.field) {
                if let Err(error) = self.store.set_value(entry.target, value.clone()) {
                    debug!(node = %entry.target, %error, "event field target not assignable");
                }
            }
        }
    }
}
