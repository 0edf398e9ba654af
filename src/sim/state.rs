//! Entity state for the bubble field
//!
//! Everything the tick loop mutates lives here. State is deliberately plain
//! data: rendering, audio, and save formats belong to the embedding
//! application and never appear in this crate.

use glam::Vec2;
use rand::Rng;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::consts::*;
use crate::remap;
use crate::sim::sweep::BoundingCircle;

/// Bubble variants that matter to the collision core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BubbleKind {
    #[default]
    Normal,
    /// Bombs crowd other bubbles out: they carry extra collision weight.
    Bomb,
}

impl BubbleKind {
    /// Relative mass used to split collision response across a pair
    pub fn weight(self) -> f32 {
        match self {
            BubbleKind::Normal => 1.0,
            BubbleKind::Bomb => BOMB_WEIGHT,
        }
    }
}

/// A drifting bubble. Velocity is in world units per millisecond.
#[derive(Debug, Clone, Copy)]
pub struct Bubble {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub kind: BubbleKind,
}

impl BoundingCircle for Bubble {
    fn center(&self) -> Vec2 {
        self.pos
    }

    fn radius(&self) -> f32 {
        self.radius
    }
}

/// A cat resting on the field. Cats have no velocity of their own; collision
/// displacement is what spreads a dropped pile apart.
#[derive(Debug, Clone, Copy)]
pub struct Cat {
    pub pos: Vec2,
    /// Held by the player's cursor; exempt from collision displacement.
    pub dragged: bool,
    /// Crossing the field overhead; passes through everything and inspires
    /// the cats it overlaps instead of colliding with them.
    pub in_flight: bool,
    /// Remaining inspiration time in milliseconds
    pub inspired_ms: f32,
}

impl Cat {
    pub fn new(pos: Vec2) -> Self {
        Self {
            pos,
            dragged: false,
            in_flight: false,
            inspired_ms: 0.0,
        }
    }

    pub fn radius(&self) -> f32 {
        CAT_RADIUS
    }
}

/// An immovable shrine
#[derive(Debug, Clone, Copy)]
pub struct Shrine {
    pub pos: Vec2,
}

impl Shrine {
    pub fn radius(&self) -> f32 {
        SHRINE_RADIUS
    }
}

/// Complete simulation state. Same seed, same field, same ticks.
#[derive(Debug, Clone)]
pub struct SimState {
    pub seed: u64,
    pub bubbles: Vec<Bubble>,
    pub cats: Vec<Cat>,
    pub shrines: Vec<Shrine>,
    /// Arena extent; bubbles wrap horizontally and recycle vertically
    pub arena: Vec2,
    pub tick_count: u64,
    pub rng: Pcg32,
}

impl SimState {
    /// Spawn a full field from a seed.
    pub fn new(seed: u64, bubble_count: usize, cat_count: usize, shrine_count: usize) -> Self {
        let mut state = Self {
            seed,
            bubbles: Vec::with_capacity(bubble_count),
            cats: Vec::with_capacity(cat_count),
            shrines: Vec::with_capacity(shrine_count),
            arena: Vec2::new(ARENA_WIDTH, ARENA_HEIGHT),
            tick_count: 0,
            rng: Pcg32::seed_from_u64(seed),
        };

        for _ in 0..bubble_count {
            let bubble = state.make_random_bubble(bubble_count);
            state.bubbles.push(bubble);
        }
        for _ in 0..cat_count {
            let pos = state.random_position(CAT_RADIUS);
            state.cats.push(Cat::new(pos));
        }
        for _ in 0..shrine_count {
            let pos = state.random_position(SHRINE_RADIUS);
            state.shrines.push(Shrine { pos });
        }

        state
    }

    /// Spawn one bubble at a random position with slight drift. Radius
    /// shrinks as the field gets denser so crowded fields stay resolvable.
    pub fn make_random_bubble(&mut self, field_size: usize) -> Bubble {
        let density_scale = remap(field_size as f32, 0.0, 30_000.0, 1.1, 0.8).clamp(0.8, 1.1);
        let kind = if self.rng.random_range(0..100u32) < BOMB_SPAWN_PERCENT {
            BubbleKind::Bomb
        } else {
            BubbleKind::Normal
        };

        Bubble {
            pos: Vec2::new(
                self.rng.random_range(0.0..self.arena.x),
                self.rng.random_range(0.0..self.arena.y),
            ),
            vel: Vec2::new(
                self.rng.random_range(-BUBBLE_SPAWN_SPEED..BUBBLE_SPAWN_SPEED),
                self.rng.random_range(-BUBBLE_SPAWN_SPEED..BUBBLE_SPAWN_SPEED),
            ),
            radius: self.rng.random_range(BUBBLE_RADIUS_MIN..BUBBLE_RADIUS_MAX) * density_scale,
            kind,
        }
    }

    fn random_position(&mut self, margin: f32) -> Vec2 {
        Vec2::new(
            self.rng.random_range(margin..self.arena.x - margin),
            self.rng.random_range(margin..self.arena.y - margin),
        )
    }
}
