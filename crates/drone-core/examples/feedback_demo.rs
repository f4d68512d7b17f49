//! Feedback demo: close a loop and watch the graph insert a delay node.
//!
//! Run with: cargo run -p drone-core --example feedback_demo

use drone_core::engine::FREQUENCY;
use drone_core::{Connection, HeadlessEngine, Primitive, RoutingGraph};

fn main() {
    let mut graph = RoutingGraph::new(HeadlessEngine::new());

    let a = graph.add(Primitive::sine(55.0), Some("osc_a"));
    let b = graph.add(Primitive::sine(110.0), Some("osc_b"));
    let depth = graph.add(Primitive::gain(110.0), Some("depth"));

    let steps = [
        ("osc_a -> depth", graph.connect(a, depth)),
        ("depth -> osc_b.frequency", graph.connect_to_param(depth, b, FREQUENCY)),
        ("osc_b -> osc_a.frequency", graph.connect_to_param(b, a, FREQUENCY)),
        ("osc_b -> osc_a.frequency (again)", graph.connect_to_param(b, a, FREQUENCY)),
    ];

    for (label, result) in steps {
        match result {
            Ok(Connection::Direct) => println!("{label:<34} direct"),
            Ok(Connection::Existing) => println!("{label:<34} already connected"),
            Ok(Connection::ViaDelay(delay)) => {
                let name = graph.node(delay).map_or("?", |n| n.name());
                println!("{label:<34} via {name}");
            }
            Err(err) => println!("{label:<34} failed: {err}"),
        }
    }

    println!("\n{} nodes, {} connections:", graph.node_count(), graph.connection_count());
    print!("{}", graph.describe());

    if graph.remove_node(a).is_ok() {
        println!("\nafter removing osc_a:");
        print!("{}", graph.describe());
    }
}
