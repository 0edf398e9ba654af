//! Headless demo entry point
//!
//! Spawns a bubble field from settings and runs the fixed-timestep loop,
//! logging throughput and collision counts.

use std::path::Path;
use std::time::Instant;

use bubble_swarm::SimSettings;
use bubble_swarm::consts::SIM_DT_MS;
use bubble_swarm::sim::{SimState, SweepPrune, tick};

fn main() {
    env_logger::init();

    let settings = match std::env::args().nth(1) {
        Some(path) => SimSettings::load(Path::new(&path)),
        None => SimSettings::default(),
    };

    let workers = settings.worker_threads();
    let pool = match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
        Ok(pool) => pool,
        Err(err) => {
            log::error!("Failed to build worker pool: {err}");
            return;
        }
    };

    log::info!(
        "Spawning {} bubbles, {} cats, {} shrines (seed {:#x}, {} workers)",
        settings.bubble_count,
        settings.cat_count,
        settings.shrine_count,
        settings.seed,
        workers
    );

    let mut state = SimState::new(
        settings.seed,
        settings.bubble_count,
        settings.cat_count,
        settings.shrine_count,
    );
    let mut index = SweepPrune::new();

    let started = Instant::now();
    let mut candidate_pairs = 0usize;
    let mut collisions = 0usize;

    for t in 0..settings.ticks {
        let stats = tick(&mut state, &mut index, &pool, SIM_DT_MS);
        candidate_pairs += stats.candidate_pairs;
        collisions += stats.bubble_collisions;

        if t % 60 == 59 {
            log::debug!(
                "tick {}: {} candidate pairs, {} bubble collisions, {} cat collisions",
                t + 1,
                stats.candidate_pairs,
                stats.bubble_collisions,
                stats.cat_collisions
            );
        }
    }

    let elapsed = started.elapsed();
    log::info!(
        "{} ticks in {:.2?} ({:.1} ticks/s): {} candidate pairs, {} bubble collisions",
        settings.ticks,
        elapsed,
        settings.ticks as f64 / elapsed.as_secs_f64().max(f64::EPSILON),
        candidate_pairs,
        collisions
    );
}
