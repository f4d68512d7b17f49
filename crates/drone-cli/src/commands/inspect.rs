//! Inspect the routing graph an algorithm produces.

use clap::Args;
use drone_core::HeadlessEngine;

use super::common::SynthOptions;

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Algorithm to inspect (overrides --algorithm and the settings file)
    #[arg(value_name = "ALGORITHM")]
    name: Option<String>,

    #[command(flatten)]
    synth: SynthOptions,

    /// Also list every node
    #[arg(short, long)]
    verbose: bool,
}

pub fn run(args: InspectArgs) -> anyhow::Result<()> {
    let mut options = args.synth.clone();
    if args.name.is_some() {
        options.algorithm = args.name.clone();
    }
    let config = options.load()?;
    let mut synth = config.build_synth(HeadlessEngine::new())?;
    let summary = synth.start()?;
    let algorithm = synth.algorithm();

    println!("Algorithm: {}", algorithm.to_json());
    println!(
        "Feedback: {}",
        if algorithm.has_feedback() { "yes" } else { "no" }
    );
    for (source, target) in algorithm.invalid_modulations() {
        println!("  skipped modulation {source} -> {target} (no such operator)");
    }
    for output in algorithm.invalid_outputs() {
        println!("  skipped output {output} (no such operator)");
    }
    println!();

    let graph = synth.graph();
    println!(
        "Graph: {} nodes, {} connections",
        graph.node_count(),
        graph.connection_count()
    );
    println!(
        "Chain: {} modulation paths, {} outputs",
        summary.modulation_paths, summary.outputs
    );

    if args.verbose {
        println!("\nNodes:");
        for node in graph.nodes() {
            println!("  {:<4} {:<24} {}", node.id(), node.name(), node.kind());
        }
    }

    println!("\nConnections:");
    print!("{}", graph.describe());

    println!("\nDelay nodes: {}", summary.delays.len());
    for node in graph.delay_nodes() {
        let Some(link) = node.delay_link() else {
            continue;
        };
        let name = |id| graph.node(id).map_or("?", |n| n.name());
        match &link.param {
            Some(param) => println!(
                "  {}: {} -> {}.{param}",
                node.name(),
                name(link.source),
                name(link.destination)
            ),
            None => println!(
                "  {}: {} -> {}",
                node.name(),
                name(link.source),
                name(link.destination)
            ),
        }
    }

    synth.stop()?;
    Ok(())
}
