//! Integration tests for drone-core.
//!
//! Tests exercise the routing graph through its public API against the
//! headless engine: connection deduplication, delay insertion on feedback,
//! delay transparency in the cycle check, teardown and referential cleanup,
//! and error reporting for engine-level failures.

use drone_core::engine::{FREQUENCY, GAIN};
use drone_core::{
    AudioEngine, Connection, GraphError, HeadlessEngine, NodeId, NodeKind, Port, Primitive,
    RoutingGraph,
};

fn graph() -> RoutingGraph<HeadlessEngine> {
    RoutingGraph::new(HeadlessEngine::new())
}

fn handle(g: &RoutingGraph<HeadlessEngine>, id: NodeId) -> drone_core::HeadlessHandle {
    *g.node(id).expect("node exists").handle()
}

/// Builds `count` gain nodes named g0, g1, ...
fn gains(g: &mut RoutingGraph<HeadlessEngine>, count: usize) -> Vec<NodeId> {
    (0..count)
        .map(|i| g.add(Primitive::gain(1.0), Some(&format!("g{i}"))))
        .collect()
}

// ============================================================================
// 1. Node creation
// ============================================================================

#[test]
fn ids_are_sequential_and_unnamed_nodes_get_default_names() {
    let mut g = graph();
    let a = g.add(Primitive::gain(1.0), None);
    let b = g.add(Primitive::sine(55.0), Some("osc"));

    assert_eq!(a.index() + 1, b.index());
    assert_eq!(g.node(a).unwrap().name(), format!("Node{}", a.index()));
    assert_eq!(g.node(b).unwrap().name(), "osc");
    assert_eq!(g.kind(b), Some(NodeKind::Oscillator));
}

#[test]
fn ids_are_not_reused_after_removal() {
    let mut g = graph();
    let a = g.add(Primitive::gain(1.0), None);
    g.remove_node(a).unwrap();
    let b = g.add(Primitive::gain(1.0), None);
    assert_ne!(a, b);
    assert!(!g.contains(a));
}

#[test]
fn engine_destination_can_be_registered() {
    let mut g = graph();
    let sink = g.engine().destination();
    let out = g.create_node(sink, Some("destination"));
    let amp = g.add(Primitive::gain(0.5), Some("amp"));

    assert_eq!(g.kind(out), Some(NodeKind::Other));
    assert_eq!(g.connect(amp, out).unwrap(), Connection::Direct);
}

// ============================================================================
// 2. Idempotence
// ============================================================================

#[test]
fn connecting_twice_records_one_edge_and_one_primitive_connect() {
    let mut g = graph();
    let n = gains(&mut g, 2);

    assert_eq!(g.connect(n[0], n[1]).unwrap(), Connection::Direct);
    assert_eq!(g.connect(n[0], n[1]).unwrap(), Connection::Existing);

    assert_eq!(g.connection_count(), 1);
    assert_eq!(g.engine().connect_calls(), 1);
}

#[test]
fn param_connection_occupies_the_node_slot() {
    let mut g = graph();
    let lfo = g.add(Primitive::sine(0.5), Some("lfo"));
    let osc = g.add(Primitive::sine(55.0), Some("osc"));

    g.connect_to_param(lfo, osc, FREQUENCY).unwrap();
    assert_eq!(g.connect(lfo, osc).unwrap(), Connection::Existing);
    assert_eq!(g.connection_count(), 1);
    assert_eq!(g.edges()[0].port, Port::Param(FREQUENCY.to_string()));
}

#[test]
fn reconnecting_a_delayed_pair_adds_nothing() {
    let mut g = graph();
    let n = gains(&mut g, 2);
    g.connect(n[0], n[1]).unwrap();
    let first = g.connect(n[1], n[0]).unwrap();
    assert!(matches!(first, Connection::ViaDelay(_)));

    let edges = g.connection_count();
    assert_eq!(g.connect(n[1], n[0]).unwrap(), Connection::Existing);
    assert_eq!(g.connection_count(), edges);
    assert_eq!(g.delay_nodes().count(), 1);
}

#[test]
fn severed_delay_does_not_count_as_a_connection() {
    let mut g = graph();
    let n = gains(&mut g, 2);
    g.connect(n[0], n[1]).unwrap();
    let Connection::ViaDelay(delay) = g.connect(n[1], n[0]).unwrap() else {
        panic!("expected delay insertion");
    };

    g.disconnect(n[1], Some(delay));
    assert!(g.destinations(n[1]).is_empty());

    let Connection::ViaDelay(fresh) = g.connect(n[1], n[0]).unwrap() else {
        panic!("expected a fresh delay");
    };
    assert!(!g.contains(delay), "stale delay is removed");
    assert_eq!(g.delay_nodes().count(), 1);
    assert_eq!(g.destinations(n[1]), vec![fresh]);
    assert!(g.contains_edge(fresh, n[0]));
    assert_eq!(g.engine().outputs(&handle(&g, n[1])).len(), 1);
}

// ============================================================================
// 3. Cycle safety
// ============================================================================

#[test]
fn closing_a_three_node_loop_inserts_exactly_one_delay() {
    let mut g = graph();
    let n = gains(&mut g, 3);
    g.connect(n[0], n[1]).unwrap();
    g.connect(n[1], n[2]).unwrap();

    let nodes_before = g.node_count();
    let edges_before = g.connection_count();
    let Connection::ViaDelay(delay) = g.connect(n[2], n[0]).unwrap() else {
        panic!("loop should be broken with a delay");
    };

    assert_eq!(g.node_count(), nodes_before + 1);
    assert_eq!(g.connection_count(), edges_before + 2);
    assert!(g.contains_edge(n[2], delay));
    assert!(g.contains_edge(delay, n[0]));
    assert!(!g.contains_edge(n[2], n[0]));

    let link = g.node(delay).unwrap().delay_link().unwrap();
    assert_eq!((link.source, link.destination), (n[2], n[0]));
    assert_eq!(link.param, None);
}

#[test]
fn delay_feeds_the_requested_parameter() {
    let mut g = graph();
    let a = g.add(Primitive::sine(55.0), Some("a"));
    let b = g.add(Primitive::sine(110.0), Some("b"));
    g.connect_to_param(a, b, FREQUENCY).unwrap();

    let Connection::ViaDelay(delay) = g.connect_to_param(b, a, FREQUENCY).unwrap() else {
        panic!("expected delay");
    };
    let outputs = g.engine().outputs(&handle(&g, delay));
    assert_eq!(outputs, vec![(handle(&g, a), Port::Param(FREQUENCY.to_string()))]);
    assert_eq!(
        g.node(delay).unwrap().delay_link().unwrap().param.as_deref(),
        Some(FREQUENCY)
    );
}

#[test]
fn chains_through_a_delay_are_never_cyclic() {
    let mut g = graph();
    let n = gains(&mut g, 6);
    let delay = g.add(Primitive::unit_delay(), Some("d"));

    // n0 -> delay -> n1 -> n2 -> ... -> n5
    g.connect(n[0], delay).unwrap();
    g.connect(delay, n[1]).unwrap();
    for pair in n[1..].windows(2) {
        g.connect(pair[0], pair[1]).unwrap();
    }

    // Closing the loop back to n0 passes through the existing delay.
    assert_eq!(g.connect(n[5], n[0]).unwrap(), Connection::Direct);
    assert_eq!(g.delay_nodes().count(), 0);
    assert!(!g.would_create_cycle(n[5], n[0]));
}

#[test]
fn self_connection_goes_through_a_delay() {
    let mut g = graph();
    let a = g.add(Primitive::gain(0.5), Some("a"));
    let result = g.connect(a, a).unwrap();
    assert!(matches!(result, Connection::ViaDelay(_)));
    assert!(!g.contains_edge(a, a));
}

// ============================================================================
// 4. Disconnect and removal
// ============================================================================

#[test]
fn disconnect_pair_removes_edge_and_primitive_connection() {
    let mut g = graph();
    let n = gains(&mut g, 2);
    g.connect(n[0], n[1]).unwrap();

    g.disconnect(n[0], Some(n[1]));
    assert_eq!(g.connection_count(), 0);
    assert!(g.engine().outputs(&handle(&g, n[0])).is_empty());
}

#[test]
fn disconnect_pair_removes_its_delay() {
    let mut g = graph();
    let n = gains(&mut g, 2);
    g.connect(n[0], n[1]).unwrap();
    let Connection::ViaDelay(delay) = g.connect(n[1], n[0]).unwrap() else {
        panic!("expected delay");
    };

    g.disconnect(n[1], Some(n[0]));
    assert!(!g.contains(delay));
    assert_eq!(g.connection_count(), 1, "only n0 -> n1 remains");
    assert!(g.engine().outputs(&handle(&g, n[1])).is_empty());
}

#[test]
fn disconnect_all_removes_delays_originating_from_source() {
    let mut g = graph();
    let n = gains(&mut g, 3);
    g.connect(n[0], n[1]).unwrap();
    g.connect(n[0], n[2]).unwrap();
    g.connect(n[1], n[0]).unwrap();
    g.connect(n[2], n[0]).unwrap();
    assert_eq!(g.delay_nodes().count(), 2);

    g.disconnect(n[1], None);
    assert_eq!(g.delay_nodes().count(), 1, "delay owned by n2 survives");
    assert!(g.destinations(n[1]).is_empty());

    g.disconnect(n[0], None);
    assert!(g.destinations(n[0]).is_empty());
    assert_eq!(g.delay_nodes().count(), 1, "n2's delay is not n0's to remove");
}

#[test]
fn remove_node_cleans_every_reference() {
    let mut g = graph();
    let n = gains(&mut g, 3);
    g.connect(n[0], n[1]).unwrap();
    g.connect(n[1], n[2]).unwrap();
    g.connect(n[2], n[0]).unwrap(); // via delay
    assert_eq!(g.delay_nodes().count(), 1);

    let h1 = handle(&g, n[1]);
    g.remove_node(n[0]).unwrap();

    assert!(!g.contains(n[0]));
    assert_eq!(g.delay_nodes().count(), 0, "delay anchored on n0 removed");
    assert!(g.edges().iter().all(|e| e.from != n[0] && e.to != n[0]));
    assert_eq!(g.connection_count(), 1, "n1 -> n2 remains");
    assert!(g.engine().is_live(&h1));
    assert_eq!(g.engine().live_count(), 3, "destination + n1 + n2");
}

#[test]
fn remove_unknown_node_is_an_error() {
    let mut g = graph();
    let a = g.add(Primitive::gain(1.0), None);
    g.remove_node(a).unwrap();
    assert!(matches!(g.remove_node(a), Err(GraphError::NodeNotFound(id)) if id == a));
}

// ============================================================================
// 5. Error reporting
// ============================================================================

#[test]
fn missing_param_fails_without_touching_the_graph() {
    let mut g = graph();
    let osc = g.add(Primitive::sine(55.0), None);
    let shaper = g.add(
        Primitive::WaveShaper {
            curve: drone_core::clip_curve(16, 0.5),
        },
        Some("shaper"),
    );

    let result = g.connect_to_param(osc, shaper, FREQUENCY);
    assert!(matches!(result, Err(GraphError::MissingParam { ref param, .. }) if param == FREQUENCY));
    assert_eq!(g.connection_count(), 0);
    assert_eq!(g.engine().connect_calls(), 0);
}

#[test]
fn primitive_failure_is_reported_and_not_recorded() {
    let mut g = graph();
    let n = gains(&mut g, 2);
    let target = handle(&g, n[1]);
    g.engine_mut().reject_connections_to(&target);

    let err = g.connect(n[0], n[1]).unwrap_err();
    assert!(matches!(err, GraphError::Primitive { .. }));
    assert!(err.to_string().contains("g1"), "got: {err}");
    assert_eq!(g.connection_count(), 0);

    // Caller may retry once the engine accepts again.
    g.engine_mut().accept_all_connections();
    assert_eq!(g.connect(n[0], n[1]).unwrap(), Connection::Direct);
}

#[test]
fn unknown_nodes_are_reported() {
    let mut g = graph();
    let a = g.add(Primitive::gain(1.0), None);
    let b = g.add(Primitive::gain(1.0), None);
    g.remove_node(b).unwrap();
    assert!(matches!(g.connect(a, b), Err(GraphError::NodeNotFound(id)) if id == b));
}

// ============================================================================
// 6. Parameters and playback
// ============================================================================

#[test]
fn params_and_ramps_pass_through_to_the_engine() {
    let mut g = graph();
    let amp = g.add(Primitive::gain(0.0), Some("amp"));

    g.set_param(amp, GAIN, 0.5).unwrap();
    assert_eq!(g.param(amp, GAIN), Some(0.5));

    g.ramp_param(amp, GAIN, 1.0, 0.0, 0.01).unwrap();
    g.engine_mut().advance(1.0);
    assert!((g.param(amp, GAIN).unwrap() - 1.0).abs() < 1e-3);

    assert!(matches!(
        g.set_param(amp, FREQUENCY, 1.0),
        Err(GraphError::Engine { .. })
    ));
}

#[test]
fn start_and_stop_only_affect_sources() {
    let mut g = graph();
    let osc = g.add(Primitive::sine(55.0), None);
    let amp = g.add(Primitive::gain(1.0), None);

    g.start(osc, None).unwrap();
    g.start(amp, None).unwrap();
    assert!(g.engine().is_playing(&handle(&g, osc)));

    g.stop(osc, None).unwrap();
    assert!(g.engine().is_stopped(&handle(&g, osc)));
}

#[test]
fn describe_lists_each_node_with_its_destinations() {
    let mut g = graph();
    let osc = g.add(Primitive::sine(55.0), Some("osc"));
    let modg = g.add(Primitive::gain(10.0), Some("mod"));
    let car = g.add(Primitive::sine(110.0), Some("car"));
    g.connect(osc, modg).unwrap();
    g.connect_to_param(modg, car, FREQUENCY).unwrap();

    let text = g.describe();
    assert!(text.contains("osc => [mod]"), "got:\n{text}");
    assert!(text.contains("mod => [car.frequency]"), "got:\n{text}");
    assert!(text.contains("car => []"), "got:\n{text}");
}
