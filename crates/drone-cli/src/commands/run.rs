//! Frame-clocked synth session.
//!
//! Drives the synth against the headless engine at a fixed frame rate: each
//! frame advances engine time, runs parameter smoothing, and optionally
//! prints a level meter. `--switch-to` swaps the routing algorithm halfway
//! through to exercise the live rebuild path.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::Context;
use clap::Args;
use drone_config::resolve_algorithm;
use drone_core::{FrameClock, HeadlessEngine, PeriodicTask};
use drone_synth::{ChainSummary, DroneSynth};

use super::common::{SynthOptions, meter, parse_position};

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    synth: SynthOptions,

    /// Pad position as x,y in 0..1 (sets the operator amplitude targets)
    #[arg(short, long, value_parser = parse_position)]
    position: Option<(f32, f32)>,

    /// Number of frames to run (0 runs until Ctrl+C)
    #[arg(short = 'n', long, default_value = "120")]
    frames: u64,

    /// Frame rate in Hz
    #[arg(short, long, default_value = "60")]
    rate: f64,

    /// Switch to this algorithm halfway through the run (after 5s when unbounded)
    #[arg(long)]
    switch_to: Option<String>,

    /// Print a level meter every N frames (0 disables)
    #[arg(long, default_value = "0")]
    meter_every: u64,

    /// Sleep for one frame period between frames
    #[arg(long)]
    realtime: bool,
}

pub fn run(args: RunArgs) -> anyhow::Result<()> {
    let config = args.synth.load()?;
    let switch_to = args
        .switch_to
        .as_deref()
        .map(resolve_algorithm)
        .transpose()
        .context("Failed to resolve --switch-to algorithm")?;

    let mut synth = config.build_synth(HeadlessEngine::new())?;
    if let Some((x, y)) = args.position {
        synth.set_position(x, y);
    }

    let summary = synth.start()?;
    println!("Algorithm: {}", synth.algorithm().to_json());
    print_summary(&summary);

    let running = Arc::new(AtomicBool::new(true));
    if args.frames == 0 || args.realtime {
        let r = Arc::clone(&running);
        ctrlc::set_handler(move || {
            r.store(false, Ordering::SeqCst);
        })
        .context("Failed to set Ctrl+C handler")?;
    }

    let mut clock = FrameClock::new(args.rate);
    let mut visualization = PeriodicTask::new("meter");
    if args.meter_every > 0 {
        visualization.schedule();
    }
    let sleep = args.frames == 0 || args.realtime;
    let halfway = if args.frames == 0 {
        (clock.rate_hz() * 5.0) as u64
    } else {
        args.frames / 2
    };
    let mut pending_switch = switch_to;

    while running.load(Ordering::SeqCst) {
        if args.frames > 0 && clock.frames() >= args.frames {
            break;
        }
        let frame = clock.next_frame();

        if frame.index == halfway
            && let Some(algorithm) = pending_switch.take()
        {
            println!("\nSwitching to {} at {:.2}s", algorithm.to_json(), frame.time);
            if let Some(summary) = synth.set_algorithm(algorithm) {
                print_summary(&summary);
            }
        }

        synth.graph_mut().engine_mut().advance(frame.delta);
        synth.tick()?;

        if visualization.poll() && frame.index % args.meter_every == 0 {
            print_meter(&synth, frame.time);
        }

        if sleep {
            std::thread::sleep(Duration::from_secs_f64(clock.period()));
        }
    }

    visualization.cancel();
    println!(
        "\nRan {} frames ({:.2}s engine time)",
        clock.frames(),
        synth.graph().current_time()
    );
    synth.stop()?;
    Ok(())
}

fn print_summary(summary: &ChainSummary) {
    println!(
        "  {} modulation paths, {} outputs, {} delay nodes inserted",
        summary.modulation_paths,
        summary.outputs,
        summary.delays.len()
    );
    if summary.skipped > 0 {
        println!("  {} entries skipped (operator out of range)", summary.skipped);
    }
}

fn print_meter(synth: &DroneSynth<HeadlessEngine>, time: f64) {
    println!("t={time:6.2}s  vol {}", meter(synth.volume(), 20));
    for (index, amplitude) in synth.amplitudes().iter().enumerate() {
        println!("           op{index} {}", meter(*amplitude, 20));
    }
}
