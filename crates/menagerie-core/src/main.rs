//! Menagerie Simulation Engine
//!
//! Headless runner: seeds a world, steps it at a fixed dt, logs a periodic
//! event digest, and writes snapshots for external viewers.

use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use menagerie_core::config::{Config, DEFAULT_TUNING_PATH};
use menagerie_core::output;
use menagerie_core::Simulation;
use menagerie_events::SimEvent;

/// Command line arguments for the simulation
#[derive(Parser, Debug)]
#[command(name = "menagerie_sim")]
#[command(about = "A headless arena simulation of need-driven social animals")]
struct Args {
    /// Random seed for reproducibility
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of ticks to simulate
    #[arg(long, default_value_t = 18_000)]
    ticks: u64,

    /// Simulated seconds per tick
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// Override the seeded agent count
    #[arg(long)]
    agents: Option<usize>,

    /// Tuning file path
    #[arg(long, default_value = DEFAULT_TUNING_PATH)]
    tuning: PathBuf,

    /// Directory for snapshots and state output
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,
}

/// Running totals of interesting events.
#[derive(Debug, Default)]
struct EventTally {
    friendly: u64,
    fights: u64,
    separations: u64,
    interventions: u64,
    warps: u64,
}

impl EventTally {
    fn record(&mut self, event: &SimEvent) {
        match event {
            SimEvent::EncounterStarted { kind, .. } => match kind {
                menagerie_events::EncounterKind::Friendly => self.friendly += 1,
                menagerie_events::EncounterKind::Fight => self.fights += 1,
            },
            SimEvent::PairSeparated { .. } | SimEvent::SelfSeparated { .. } => {
                self.separations += 1
            }
            SimEvent::AllyIntervened { .. } => self.interventions += 1,
            SimEvent::EdgeWarped { .. } => self.warps += 1,
            SimEvent::AgentAdded { .. } | SimEvent::AgentRemoved { .. } => {}
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    println!("Menagerie Simulation Engine");
    println!("===========================");
    println!("Seed: {}", args.seed);
    println!("Ticks: {} (dt {:.4}s)", args.ticks, args.dt);
    println!();

    let mut config = Config::load(&args.tuning).unwrap_or_else(|e| {
        eprintln!("Warning: {}. Using defaults.", e);
        Config::default()
    });
    if let Some(agents) = args.agents {
        config.arena.agent_count = agents.min(config.arena.max_agents);
    }

    let snapshots_dir = args.output_dir.join("snapshots");
    fs::create_dir_all(&snapshots_dir).unwrap_or_else(|e| {
        eprintln!("Warning: Could not create output directories: {}", e);
    });

    println!("Spawning {} agents...", config.arena.agent_count);
    let mut sim = Simulation::new(config, args.seed);
    println!("  Population: {}", sim.population());
    println!();
    println!("Starting simulation...");
    println!();

    let mut tally = EventTally::default();
    let mut snapshots_written = 0u64;

    for tick in 0..args.ticks {
        sim.step(args.dt);

        for event in sim.drain_events() {
            tally.record(&event);
        }

        if let Some(snapshot) = sim.publish_due_snapshot() {
            write_outputs(&snapshot, &snapshots_dir, &args.output_dir);
            snapshots_written += 1;
        }

        // Progress every simulated ~10 seconds at the default dt.
        if tick > 0 && tick % 600 == 0 {
            println!(
                "[Tick {:>6}] t={:>7.1}s  friendly: {}  fights: {}  assists: {}  warps: {}",
                tick,
                sim.now_ms() / 1000.0,
                tally.friendly,
                tally.fights,
                tally.interventions,
                tally.warps,
            );
        }
    }

    let final_snapshot = sim.snapshot();
    write_outputs(&final_snapshot, &snapshots_dir, &args.output_dir);
    snapshots_written += 1;

    println!();
    println!(
        "Simulation complete. Ran {} ticks ({:.1}s simulated).",
        args.ticks,
        sim.now_ms() / 1000.0
    );
    println!(
        "Encounters: {} friendly, {} fights ({} separations, {} ally assists).",
        tally.friendly, tally.fights, tally.separations, tally.interventions
    );
    println!("Wrote {} snapshots.", snapshots_written);
}

fn write_outputs(
    snapshot: &menagerie_events::WorldSnapshot,
    snapshots_dir: &Path,
    output_dir: &Path,
) {
    if let Err(e) = output::write_snapshot_to_dir(snapshot, snapshots_dir) {
        eprintln!(
            "Warning: Could not write snapshot {}: {}",
            snapshot.snapshot_id, e
        );
    }
    if let Err(e) = output::write_current_state(snapshot, output_dir) {
        eprintln!("Warning: Could not write current state: {}", e);
    }
}
