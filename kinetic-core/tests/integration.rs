//! Integration Tests for the Animation Engine
//!
//! These tests drive a full [`Engine`] through its public surface: commands
//! in, frames ticked, batches out through a recording host bridge.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;

use kinetic_core::graph::{EventMapEntry, NodeConfig, NodeId, Operator, TransformSource, TransformSpec, ViewId};
use kinetic_core::runtime::{Command, Engine, FrameBatch, HostBridge, SchedulerState};
use kinetic_core::{EngineError, Value};

#[derive(Default)]
struct RecordingBridge {
    requests: AtomicUsize,
    batches: Mutex<Vec<FrameBatch>>,
    failures: Mutex<Vec<EngineError>>,
}

impl HostBridge for RecordingBridge {
    fn request_frame(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }

    fn commit(&self, batch: FrameBatch) {
        self.batches.lock().push(batch);
    }

    fn command_failed(&self, error: EngineError) {
        self.failures.lock().push(error);
    }
}

fn engine() -> (Engine, Arc<RecordingBridge>) {
    let bridge = Arc::new(RecordingBridge::default());
    (Engine::new(bridge.clone()), bridge)
}

fn create(engine: &mut Engine, id: u64, config: NodeConfig) {
    engine
        .apply(Command::CreateNode {
            id: NodeId::new(id),
            config,
        })
        .unwrap();
}

/// A value shared by two parents evaluates once per tick: the call node's
/// effect fires a single invocation no matter how many readers pull it.
#[test]
fn diamond_fanout_evaluates_shared_node_once_per_tick() {
    let (mut engine, bridge) = engine();

    create(&mut engine, 1, NodeConfig::Value { value: 7.0 });
    create(
        &mut engine,
        2,
        NodeConfig::Call {
            callback: 5.into(),
            input: vec![NodeId::new(1)],
        },
    );
    // Two parents both pull the call node.
    create(
        &mut engine,
        3,
        NodeConfig::Op {
            op: Operator::Add,
            input: vec![NodeId::new(2), NodeId::new(1)],
        },
    );
    create(
        &mut engine,
        4,
        NodeConfig::Op {
            op: Operator::Add,
            input: vec![NodeId::new(2), NodeId::new(1)],
        },
    );
    create(
        &mut engine,
        5,
        NodeConfig::Block {
            block: vec![NodeId::new(3), NodeId::new(4)],
        },
    );
    create(&mut engine, 6, NodeConfig::Always { what: NodeId::new(5) });

    engine.on_frame(16.0);
    engine.on_frame(32.0);

    let batches = bridge.batches.lock();
    assert_eq!(batches.len(), 2);
    for batch in batches.iter() {
        assert_eq!(batch.calls.len(), 1);
        assert_eq!(batch.calls[0].args, vec![Value::Number(7.0)]);
    }
}

/// Reading a node twice in the same generation returns the cached value.
#[test]
fn reads_within_a_generation_are_idempotent() {
    let (mut engine, _bridge) = engine();

    create(&mut engine, 1, NodeConfig::Value { value: 10.0 });
    create(&mut engine, 2, NodeConfig::Value { value: 5.0 });
    create(
        &mut engine,
        3,
        NodeConfig::Op {
            op: Operator::Add,
            input: vec![NodeId::new(1), NodeId::new(2)],
        },
    );

    assert_eq!(engine.value_of(NodeId::new(3)), Value::Number(15.0));

    // Mutating an input after the first read does not change the cached
    // result until the next generation.
    engine
        .apply(Command::SetValue {
            node: NodeId::new(1),
            value: Value::Number(100.0),
        })
        .unwrap();
    assert_eq!(engine.value_of(NodeId::new(3)), Value::Number(15.0));

    engine.on_frame(16.0);
    assert_eq!(engine.value_of(NodeId::new(3)), Value::Number(105.0));
}

/// Only the taken cond branch runs, so the untaken branch's set effect
/// leaves its target untouched.
#[test]
fn cond_runs_only_the_taken_branch() {
    let (mut engine, _bridge) = engine();

    create(&mut engine, 1, NodeConfig::Value { value: 1.0 });
    create(&mut engine, 2, NodeConfig::Value { value: 0.0 });
    create(&mut engine, 3, NodeConfig::Value { value: 0.0 });
    create(&mut engine, 10, NodeConfig::Value { value: 111.0 });
    create(&mut engine, 11, NodeConfig::Value { value: 222.0 });
    create(
        &mut engine,
        12,
        NodeConfig::Set {
            what: NodeId::new(2),
            value: NodeId::new(10),
        },
    );
    create(
        &mut engine,
        13,
        NodeConfig::Set {
            what: NodeId::new(3),
            value: NodeId::new(11),
        },
    );
    create(
        &mut engine,
        14,
        NodeConfig::Cond {
            cond: NodeId::new(1),
            if_block: NodeId::new(12),
            else_block: Some(NodeId::new(13)),
        },
    );
    create(&mut engine, 15, NodeConfig::Always { what: NodeId::new(14) });

    engine.on_frame(16.0);

    assert_eq!(engine.value_of(NodeId::new(2)), Value::Number(111.0));
    assert_eq!(engine.value_of(NodeId::new(3)), Value::Number(0.0));
}

/// An event push with no attached handler is dropped at ingress: no wakeup,
/// no work, no batch.
#[test]
fn unattached_event_push_is_a_no_op() {
    let (engine, bridge) = engine();

    let mut payload = IndexMap::new();
    payload.insert("x".to_string(), Value::Number(1.0));
    engine.events().push(ViewId::new(1), "onScroll", payload);

    assert_eq!(engine.state(), SchedulerState::Idle);
    assert_eq!(bridge.requests.load(Ordering::SeqCst), 0);
    assert!(bridge.batches.lock().is_empty());
}

/// A running clock reports the frame timestamp minus its start epoch, so
/// its value grows monotonically with the tick timestamps.
#[test]
fn clock_is_monotonic_across_ticks() {
    let (mut engine, bridge) = engine();

    create(&mut engine, 1, NodeConfig::Clock);
    create(&mut engine, 2, NodeConfig::ClockStart { what: NodeId::new(1) });
    create(
        &mut engine,
        3,
        NodeConfig::Call {
            callback: 9.into(),
            input: vec![NodeId::new(1)],
        },
    );
    create(
        &mut engine,
        4,
        NodeConfig::Block {
            block: vec![NodeId::new(2), NodeId::new(3)],
        },
    );
    create(&mut engine, 5, NodeConfig::Always { what: NodeId::new(4) });

    let base = 1000.0;
    for i in 0..5 {
        engine.on_frame(base + 16.0 * i as f64);
    }

    let batches = bridge.batches.lock();
    assert_eq!(batches.len(), 5);
    let observed: Vec<f64> = batches
        .iter()
        .map(|batch| batch.calls[0].args[0].as_number())
        .collect();
    assert_eq!(observed, vec![0.0, 16.0, 32.0, 48.0, 64.0]);
}

/// The canonical smoke test: an always-rooted props/style subtree commits
/// `{100: {"opacity": 0.5}}` every tick.
#[test]
fn always_rooted_props_commit_each_tick() {
    let (mut engine, bridge) = engine();

    create(&mut engine, 12, NodeConfig::Value { value: 0.5 });
    let mut style = IndexMap::new();
    style.insert("opacity".to_string(), NodeId::new(12));
    create(&mut engine, 11, NodeConfig::Style { style });
    let mut props = IndexMap::new();
    props.insert("style".to_string(), NodeId::new(11));
    create(&mut engine, 10, NodeConfig::Props { props });
    engine
        .apply(Command::ConnectToView {
            node: NodeId::new(10),
            view: ViewId::new(100),
        })
        .unwrap();
    create(&mut engine, 13, NodeConfig::Always { what: NodeId::new(10) });

    engine.on_frame(16.0);
    engine.on_frame(32.0);

    let batches = bridge.batches.lock();
    assert_eq!(batches.len(), 2);
    for batch in batches.iter() {
        assert_eq!(batch.updates.len(), 1);
        let update = &batch.updates[0];
        assert_eq!(update.view, ViewId::new(100));
        assert_eq!(update.js_props.get("opacity"), Some(&Value::Number(0.5)));
    }
}

/// Dropping a shared node between ticks leaves its readers on no-op
/// semantics instead of wedging the next tick.
#[test]
fn dropping_a_shared_node_between_ticks_is_safe() {
    let (mut engine, bridge) = engine();

    create(&mut engine, 1, NodeConfig::Value { value: 3.0 });
    create(
        &mut engine,
        2,
        NodeConfig::Op {
            op: Operator::Add,
            input: vec![NodeId::new(1), NodeId::new(1)],
        },
    );
    create(
        &mut engine,
        3,
        NodeConfig::Call {
            callback: 1.into(),
            input: vec![NodeId::new(2)],
        },
    );
    create(&mut engine, 4, NodeConfig::Always { what: NodeId::new(3) });

    engine.on_frame(16.0);
    engine.commands().submit(Command::DropNode { id: NodeId::new(1) });
    engine.on_frame(32.0);

    let batches = bridge.batches.lock();
    assert_eq!(batches[0].calls[0].args, vec![Value::Number(6.0)]);
    // Both operand slots were scrubbed with the node.
    assert_eq!(batches[1].calls[0].args, vec![Value::Number(0.0)]);
}

/// Events delivered through the router update mapped values, which flow
/// into the committed props on the same tick.
#[test]
fn event_payload_drives_props_on_the_next_tick() {
    let (mut engine, bridge) = engine();

    create(&mut engine, 1, NodeConfig::Value { value: 0.0 });
    create(
        &mut engine,
        2,
        NodeConfig::Event {
            arg_mapping: vec![EventMapEntry {
                field: "translationX".to_string(),
                target: NodeId::new(1),
            }],
        },
    );
    let mut props = IndexMap::new();
    props.insert("left".to_string(), NodeId::new(1));
    create(&mut engine, 3, NodeConfig::Props { props });
    engine
        .apply(Command::ConnectToView {
            node: NodeId::new(3),
            view: ViewId::new(42),
        })
        .unwrap();
    create(&mut engine, 4, NodeConfig::Always { what: NodeId::new(3) });
    engine
        .apply(Command::AttachEvent {
            view: ViewId::new(42),
            event: "onGesture".to_string(),
            node: NodeId::new(2),
        })
        .unwrap();

    let mut payload = IndexMap::new();
    payload.insert("translationX".to_string(), Value::Number(33.0));
    engine.events().push(ViewId::new(42), "onGesture", payload);

    engine.on_frame(16.0);

    let batches = bridge.batches.lock();
    let update = &batches[0].updates[0];
    assert_eq!(update.js_props.get("left"), Some(&Value::Number(33.0)));
}

/// `configureProps` splits a view's committed fields across the ui, native
/// and scripting buckets.
#[test]
fn configured_props_route_to_their_buckets() {
    let (mut engine, bridge) = engine();

    engine
        .apply(Command::ConfigureProps {
            ui_props: ["opacity".to_string()].into_iter().collect(),
            native_props: ["transform".to_string()].into_iter().collect(),
        })
        .unwrap();

    create(&mut engine, 1, NodeConfig::Value { value: 0.25 });
    create(&mut engine, 2, NodeConfig::Value { value: 30.0 });
    create(
        &mut engine,
        3,
        NodeConfig::Transform {
            transform: vec![TransformSpec {
                property: "translateX".to_string(),
                source: TransformSource::NodeId(NodeId::new(2)),
            }],
        },
    );
    let mut props = IndexMap::new();
    props.insert("opacity".to_string(), NodeId::new(1));
    props.insert("transform".to_string(), NodeId::new(3));
    props.insert("label".to_string(), NodeId::new(2));
    create(&mut engine, 4, NodeConfig::Props { props });
    engine
        .apply(Command::ConnectToView {
            node: NodeId::new(4),
            view: ViewId::new(8),
        })
        .unwrap();
    create(&mut engine, 5, NodeConfig::Always { what: NodeId::new(4) });

    engine.on_frame(16.0);

    let batches = bridge.batches.lock();
    let update = &batches[0].updates[0];
    assert_eq!(update.ui_props.get("opacity"), Some(&Value::Number(0.25)));
    assert!(matches!(
        update.native_props.get("transform"),
        Some(Value::List(_))
    ));
    assert_eq!(update.js_props.get("label"), Some(&Value::Number(30.0)));
}

/// `GetValue` replies with the node's current value; `SetValue` from the
/// queue lands before the tick that follows it.
#[test]
fn get_and_set_value_round_trip_through_the_queue() {
    let (mut engine, _bridge) = engine();
    let commands = engine.commands();

    commands.submit(Command::CreateNode {
        id: NodeId::new(1),
        config: NodeConfig::Value { value: 1.0 },
    });
    commands.submit(Command::SetValue {
        node: NodeId::new(1),
        value: Value::Number(2.5),
    });
    let reply = Arc::new(Mutex::new(None));
    let reply_slot = reply.clone();
    commands.submit(Command::GetValue {
        node: NodeId::new(1),
        reply: Box::new(move |value| *reply_slot.lock() = Some(value)),
    });

    engine.on_frame(16.0);

    assert_eq!(*reply.lock(), Some(Value::Number(2.5)));
}

/// Ticks without effects commit nothing: an engine with only inert nodes
/// never calls the host's commit.
#[test]
fn empty_ticks_do_not_commit_batches() {
    let (mut engine, bridge) = engine();

    create(&mut engine, 1, NodeConfig::Value { value: 1.0 });
    create(&mut engine, 2, NodeConfig::Always { what: NodeId::new(1) });

    engine.on_frame(16.0);
    engine.on_frame(32.0);

    assert!(bridge.batches.lock().is_empty());
}

/// A stopped-then-restarted clock starts over from zero.
#[test]
fn clock_restart_begins_from_zero() {
    let (mut engine, _bridge) = engine();

    create(&mut engine, 1, NodeConfig::Clock);
    create(&mut engine, 2, NodeConfig::ClockStart { what: NodeId::new(1) });
    create(&mut engine, 3, NodeConfig::ClockStop { what: NodeId::new(1) });

    engine.on_frame(1000.0);
    engine.value_of(NodeId::new(2));
    engine.on_frame(1050.0);
    assert_eq!(engine.value_of(NodeId::new(1)), Value::Number(50.0));

    engine.value_of(NodeId::new(3));
    engine.on_frame(1100.0);
    assert_eq!(engine.value_of(NodeId::new(1)), Value::Number(50.0));

    engine.value_of(NodeId::new(2));
    engine.on_frame(1116.0);
    assert_eq!(engine.value_of(NodeId::new(1)), Value::Number(16.0));
}
