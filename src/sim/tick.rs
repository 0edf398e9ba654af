//! Fixed-timestep simulation tick
//!
//! Advances the field deterministically: bubble drift and recycling, then
//! the three collision passes. Bubble-bubble goes through the broad phase
//! and the worker pool; cats and shrines are few enough that direct
//! upper-triangle loops win.

use glam::Vec2;
use rand::Rng;
use rayon::ThreadPool;
use rayon::prelude::*;

use super::collision::{circles_overlap, resolve_circle_pair};
use super::state::{BubbleKind, SimState};
use super::sweep::SweepPrune;
use crate::consts::*;

/// How long an overflight inspires a grounded cat, in milliseconds
pub const INSPIRE_DURATION_MS: f32 = 4000.0;

/// Per-tick counters, for logging and tests
#[derive(Debug, Clone, Copy, Default)]
pub struct TickStats {
    /// Pairs surfaced by the broad phase
    pub candidate_pairs: usize,
    /// Candidate pairs that actually overlapped
    pub bubble_collisions: usize,
    pub cat_collisions: usize,
    pub shrine_collisions: usize,
}

/// Response accumulated for one bubble over a whole tick
#[derive(Debug, Clone, Copy, Default)]
struct PairDelta {
    displacement: Vec2,
    velocity_change: Vec2,
}

/// Advance the simulation by one timestep of `dt_ms` milliseconds.
///
/// The index is caller-owned so its warm-started sort order survives between
/// ticks; the pool is caller-owned so one fixed-size pool serves the whole
/// process.
pub fn tick(state: &mut SimState, index: &mut SweepPrune, pool: &ThreadPool, dt_ms: f32) -> TickStats {
    let mut stats = TickStats::default();

    update_bubbles(state, dt_ms);
    resolve_bubble_collisions(state, index, pool, dt_ms, &mut stats);
    resolve_cat_collisions(state, dt_ms, &mut stats);
    resolve_cat_shrine_collisions(state, dt_ms, &mut stats);
    update_cats(state, dt_ms);

    state.tick_count += 1;
    stats
}

/// Integrate bubble motion and recycle anything that left the arena.
fn update_bubbles(state: &mut SimState, dt_ms: f32) {
    let arena = state.arena;

    for i in 0..state.bubbles.len() {
        let bubble = &mut state.bubbles[i];
        bubble.pos += bubble.vel * dt_ms;
        bubble.vel.y += BUBBLE_GRAVITY * dt_ms;

        let radius = bubble.radius;

        // Horizontal wraparound keeps both edges of the field stocked
        if bubble.pos.x - radius > arena.x {
            bubble.pos.x = -radius;
        } else if bubble.pos.x + radius < 0.0 {
            bubble.pos.x = arena.x + radius;
        }

        if bubble.pos.y - radius > arena.y {
            // Fell off the bottom: recycle at the top with gentle drift
            let x = state.rng.random_range(0.0..arena.x);
            let bubble = &mut state.bubbles[i];
            bubble.pos = Vec2::new(x, -radius);
            bubble.vel.y = 0.05;
            bubble.vel.x = bubble.vel.x.clamp(-0.04, 0.04);
            bubble.kind = BubbleKind::Normal;
        } else if bubble.pos.y + radius < 0.0 {
            // Escaped upward; special bubbles don't survive offscreen
            bubble.kind = BubbleKind::Normal;
        }
    }
}

/// Broad phase plus narrow phase over every bubble pair.
///
/// Workers resolve candidate pairs against tick-start positions and fold the
/// responses into chunk-local delta buffers; the buffers are merged in chunk
/// order and applied once, single-threaded. Pair visitation order therefore
/// never affects the outcome and the tick stays deterministic, at the cost
/// of resolving every pair against slightly stale state, which the discrete
/// positional correction tolerates.
fn resolve_bubble_collisions(
    state: &mut SimState,
    index: &mut SweepPrune,
    pool: &ThreadPool,
    dt_ms: f32,
    stats: &mut TickStats,
) {
    index.clear();
    index.populate(&state.bubbles);

    let bubble_count = state.bubbles.len();
    if bubble_count < 2 {
        return;
    }

    let bubbles = &state.bubbles;
    let index = &*index;
    let ranges = index.partition(pool.current_num_threads());

    let chunk_results: Vec<(Vec<PairDelta>, usize, usize)> = pool.install(|| {
        ranges
            .into_par_iter()
            .map(|range| {
                let mut deltas = vec![PairDelta::default(); bubble_count];
                let mut candidates = 0usize;
                let mut hits = 0usize;

                index.scan_range(range, &mut |i, j| {
                    candidates += 1;
                    let a = &bubbles[i];
                    let b = &bubbles[j];

                    if let Some(response) = resolve_circle_pair(
                        dt_ms,
                        a.pos,
                        b.pos,
                        a.vel,
                        b.vel,
                        a.radius,
                        b.radius,
                        a.kind.weight(),
                        b.kind.weight(),
                    ) {
                        hits += 1;
                        deltas[i].displacement += response.displacement_a;
                        deltas[i].velocity_change += response.velocity_change_a;
                        deltas[j].displacement += response.displacement_b;
                        deltas[j].velocity_change += response.velocity_change_b;
                    }
                });

                (deltas, candidates, hits)
            })
            .collect()
    });

    // Sequential merge in chunk order keeps float summation deterministic
    let mut merged = vec![PairDelta::default(); bubble_count];
    for (deltas, candidates, hits) in chunk_results {
        for (slot, delta) in merged.iter_mut().zip(deltas) {
            slot.displacement += delta.displacement;
            slot.velocity_change += delta.velocity_change;
        }
        stats.candidate_pairs += candidates;
        stats.bubble_collisions += hits;
    }

    for (bubble, delta) in state.bubbles.iter_mut().zip(merged) {
        bubble.pos += delta.displacement;
        bubble.vel += delta.velocity_change;
    }
}

/// Direct upper-triangle pass over the cats. Dragged cats are pinned to the
/// cursor and skip collision entirely; in-flight cats pass overhead and
/// inspire whoever they cross instead of colliding.
fn resolve_cat_collisions(state: &mut SimState, dt_ms: f32, stats: &mut TickStats) {
    let count = state.cats.len();
    for i in 0..count {
        for j in (i + 1)..count {
            let (head, tail) = state.cats.split_at_mut(j);
            let cat_i = &mut head[i];
            let cat_j = &mut tail[0];

            if cat_i.dragged || cat_j.dragged {
                continue;
            }

            if cat_i.in_flight || cat_j.in_flight {
                if circles_overlap(cat_i.pos, cat_j.pos, cat_i.radius(), cat_j.radius()) {
                    if cat_i.in_flight && !cat_j.in_flight {
                        cat_j.inspired_ms = INSPIRE_DURATION_MS;
                    }
                    if cat_j.in_flight && !cat_i.in_flight {
                        cat_i.inspired_ms = INSPIRE_DURATION_MS;
                    }
                }
                continue;
            }

            let Some(response) = resolve_circle_pair(
                dt_ms,
                cat_i.pos,
                cat_j.pos,
                Vec2::ZERO,
                Vec2::ZERO,
                cat_i.radius(),
                cat_j.radius(),
                1.0,
                1.0,
            ) else {
                continue;
            };

            cat_i.pos += response.displacement_a;
            cat_j.pos += response.displacement_b;
            stats.cat_collisions += 1;
        }
    }
}

/// Shrines never move: only the cat's half of each response is applied.
fn resolve_cat_shrine_collisions(state: &mut SimState, dt_ms: f32, stats: &mut TickStats) {
    for cat in &mut state.cats {
        for shrine in &state.shrines {
            let Some(response) = resolve_circle_pair(
                dt_ms,
                cat.pos,
                shrine.pos,
                Vec2::ZERO,
                Vec2::ZERO,
                cat.radius(),
                shrine.radius(),
                1.0,
                1.0,
            ) else {
                continue;
            };

            cat.pos += response.displacement_a;
            stats.shrine_collisions += 1;
        }
    }
}

/// Tick down inspiration timers and keep grounded cats inside the arena.
fn update_cats(state: &mut SimState, dt_ms: f32) {
    let arena = state.arena;
    for cat in &mut state.cats {
        cat.inspired_ms = (cat.inspired_ms - dt_ms).max(0.0);

        if !cat.in_flight {
            let radius = cat.radius();
            cat.pos.x = cat.pos.x.clamp(radius, arena.x - radius);
            cat.pos.y = cat.pos.y.clamp(radius, arena.y - radius);
        }
    }
}
