use std::time::Instant;

use clap::Parser;
use clearpath_sim::{ConfigError, ModeCounters, Simulation, SimulationConfig};

/// The number of frames simulated in each mode unless given on the command line.
const DEFAULT_FRAMES: u64 = 36_000;

/// Runs the intersection with preemption off and then on, and reports collisions per mode.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// Number of frames simulated in each mode.
    #[arg(
        value_name = "FRAMES",
        default_value_t = DEFAULT_FRAMES,
        value_parser = clap::value_parser!(u64).range(1..=u32::MAX as u64)
    )]
    frames: u64,
    /// Seed for the random spawner. Seeds from entropy when omitted.
    #[arg(value_name = "SEED")]
    seed: Option<u64>,
}

fn main() -> Result<(), ConfigError> {
    env_logger::init();
    let args = CliArgs::parse();

    let mut sim = Simulation::with_config(SimulationConfig {
        seed: args.seed,
        ..Default::default()
    })?;

    for preemption in [false, true] {
        if sim.preemption_enabled() != preemption {
            sim.toggle_preemption();
        }
        println!(
            "Simulating {} frames with preemption {}...",
            args.frames,
            if preemption { "on" } else { "off" }
        );
        let start = Instant::now();
        for _ in 0..args.frames {
            sim.step();
        }
        let elapsed = start.elapsed();
        println!(
            "Avg. frame: {:?} ({} vehs on grid)",
            elapsed / args.frames as u32,
            sim.iter_vehicles().count(),
        );
        report(sim.counters().mode(preemption));
    }

    println!("Total collisions: {}", sim.collision_count());
    Ok(())
}

fn report(counters: &ModeCounters) {
    let per_hundred = |n: usize, d: usize| {
        if d == 0 {
            0.0
        } else {
            100.0 * n as f64 / d as f64
        }
    };
    println!(
        "  {} vehicles ({} emergency), {} collisions, {:.2} per 100 vehicles",
        counters.vehicles,
        counters.emergency_vehicles,
        counters.collisions,
        per_hundred(counters.collisions, counters.vehicles),
    );
}
