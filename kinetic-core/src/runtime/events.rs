//! Event Router
//!
//! Thread-safe ingress for UI-event payloads. The UI/input layer calls
//! [`EventRouter::push`] from any thread; the scheduler drains the queue at
//! the start of each tick and dispatches payloads to event nodes by their
//! `(view, event name)` key, in arrival order.
//!
//! A push whose key has no registered event node is dropped at ingress and
//! does not wake the scheduler. Views detach before in-flight events stop
//! arriving, so this is routine, not an error; a binding that disappears
//! between push and drain is likewise dropped silently at dispatch.

use std::collections::VecDeque;
use std::sync::Arc;

use dashmap::DashMap;
use indexmap::IndexMap;
use parking_lot::Mutex;
use tracing::trace;

use crate::graph::node::{NodeId, ViewId};
use crate::runtime::host::FrameWaker;
use crate::value::Value;

/// Routing key for event delivery.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventKey {
    pub view: ViewId,
    pub name: String,
}

impl EventKey {
    pub fn new(view: ViewId, name: impl Into<String>) -> Self {
        Self {
            view,
            name: name.into(),
        }
    }
}

/// A pushed event waiting for the next tick.
#[derive(Debug, Clone)]
pub(crate) struct PendingEvent {
    pub key: EventKey,
    pub payload: IndexMap<String, Value>,
}

/// Cloneable, thread-safe handle for pushing events into the engine.
#[derive(Clone)]
pub struct EventRouter {
    queue: Arc<Mutex<VecDeque<PendingEvent>>>,
    bindings: Arc<DashMap<EventKey, NodeId>>,
    waker: FrameWaker,
}

impl EventRouter {
    pub(crate) fn new(bindings: Arc<DashMap<EventKey, NodeId>>, waker: FrameWaker) -> Self {
        Self {
            queue: Arc::new(Mutex::new(VecDeque::new())),
            bindings,
            waker,
        }
    }

    /// Enqueue an event payload for the next tick. Callable from any
    /// thread. Arms the scheduler when an event node is waiting for the
    /// key; otherwise the event is dropped here.
    pub fn push(&self, view: ViewId, name: &str, payload: IndexMap<String, Value>) {
        let key = EventKey::new(view, name);
        if !self.bindings.contains_key(&key) {
            trace!(%view, name, "no event node attached, dropping event");
            return;
        }
        self.queue.lock().push_back(PendingEvent { key, payload });
        self.waker.arm();
    }

    /// Dequeue all pending events in arrival order. Called only by the
    /// scheduler at the start of a tick.
    pub(crate) fn drain(&self) -> Vec<PendingEvent> {
        let mut queue = self.queue.lock();
        queue.drain(..).collect()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    /// Event node registered for `key`, if any.
    pub(crate) fn node_for(&self, key: &EventKey) -> Option<NodeId> {
        self.bindings.get(key).map(|entry| *entry.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::runtime::host::HostBridge;
    use crate::runtime::sink::FrameBatch;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingBridge {
        requests: AtomicUsize,
    }

    impl CountingBridge {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                requests: AtomicUsize::new(0),
            })
        }
    }

    impl HostBridge for CountingBridge {
        fn request_frame(&self) {
            self.requests.fetch_add(1, Ordering::SeqCst);
        }

        fn commit(&self, _batch: FrameBatch) {}

        fn command_failed(&self, _error: EngineError) {}
    }

    fn router_with_binding() -> (EventRouter, Arc<CountingBridge>) {
        let bridge = CountingBridge::new();
        let bindings: Arc<DashMap<EventKey, NodeId>> = Arc::new(DashMap::new());
        bindings.insert(
            EventKey::new(ViewId::new(1), "onScroll"),
            NodeId::new(100),
        );
        let waker = FrameWaker::new(bridge.clone());
        (EventRouter::new(bindings, waker), bridge)
    }

    #[test]
    fn push_for_registered_key_enqueues_and_arms() {
        let (router, bridge) = router_with_binding();
        router.push(ViewId::new(1), "onScroll", IndexMap::new());

        assert!(!router.is_empty());
        assert_eq!(bridge.requests.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn push_for_unregistered_key_is_dropped() {
        let (router, bridge) = router_with_binding();
        router.push(ViewId::new(1), "onPress", IndexMap::new());
        router.push(ViewId::new(9), "onScroll", IndexMap::new());

        assert!(router.is_empty());
        assert_eq!(bridge.requests.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn drain_preserves_arrival_order() {
        let (router, _bridge) = router_with_binding();
        let mut first = IndexMap::new();
        first.insert("x".to_string(), Value::Number(1.0));
        let mut second = IndexMap::new();
        second.insert("x".to_string(), Value::Number(2.0));

        router.push(ViewId::new(1), "onScroll", first);
        router.push(ViewId::new(1), "onScroll", second);

        let drained = router.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].payload["x"], Value::Number(1.0));
        assert_eq!(drained[1].payload["x"], Value::Number(2.0));
        assert!(router.is_empty());
    }

    #[test]
    fn pushes_from_other_threads_land_in_order_per_thread() {
        let (router, _bridge) = router_with_binding();
        let cloned = router.clone();
        let handle = std::thread::spawn(move || {
            for i in 0..10 {
                let mut payload = IndexMap::new();
                payload.insert("i".to_string(), Value::Number(i as f64));
                cloned.push(ViewId::new(1), "onScroll", payload);
            }
        });
        handle.join().unwrap();

        let drained = router.drain();
        assert_eq!(drained.len(), 10);
        for (i, event) in drained.iter().enumerate() {
            assert_eq!(event.payload["i"], Value::Number(i as f64));
        }
    }
}
