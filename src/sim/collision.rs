//! Pairwise circle collision response
//!
//! One resolver serves every colliding pair in the game: bubble-bubble,
//! cat-cat, and cat-shrine. The caller decides which halves of the response
//! to apply: a shrine discards its displacement, a dragged cat is skipped
//! before the call is ever made.

use glam::Vec2;

/// Fraction of a colliding pair's closing speed exchanged per millisecond of
/// simulated time. A feel value, not physics: high enough that crowds bounce
/// apart visibly, low enough that dense fields don't explode. Scaling by the
/// frame delta keeps the response frame-rate independent; the product is
/// clamped to 1 so a long frame can never transfer more than the full
/// closing speed.
pub const VELOCITY_TRANSFER_PER_MS: f32 = 0.005;

/// Separation axis used when two centers coincide exactly and geometry
/// offers no direction.
const DEGENERATE_AXIS: Vec2 = Vec2::X;

/// Positional corrections and velocity deltas for a colliding pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionResponse {
    pub displacement_a: Vec2,
    pub displacement_b: Vec2,
    pub velocity_change_a: Vec2,
    pub velocity_change_b: Vec2,
}

/// Resolve a potential collision between two moving circles.
///
/// Returns `None` when the circles do not overlap. Otherwise the two
/// displacements separate the pair exactly (applying both leaves the centers
/// at distance `radius_a + radius_b`), split inversely to weight so the
/// heavier circle moves less: A's share of the correction is
/// `weight_b / (weight_a + weight_b)`.
///
/// Velocity deltas push the circles apart along the separation axis in
/// proportion to their closing speed, with the same weight split; a pair
/// already separating gets the positional correction but no velocity change.
pub fn resolve_circle_pair(
    dt_ms: f32,
    pos_a: Vec2,
    pos_b: Vec2,
    vel_a: Vec2,
    vel_b: Vec2,
    radius_a: f32,
    radius_b: f32,
    weight_a: f32,
    weight_b: f32,
) -> Option<CollisionResponse> {
    let radius_sum = radius_a + radius_b;
    let delta = pos_b - pos_a;
    let dist_sq = delta.length_squared();

    if dist_sq > radius_sum * radius_sum {
        return None;
    }

    let dist = dist_sq.sqrt();

    // Coincident centers leave the axis undefined; fall back to a fixed one
    // so the pair still separates deterministically instead of dividing by
    // zero.
    let axis = if dist > 0.0 {
        delta / dist
    } else {
        DEGENERATE_AXIS
    };

    let penetration = radius_sum - dist;

    let inv_total_weight = 1.0 / (weight_a + weight_b);
    let share_a = weight_b * inv_total_weight;
    let share_b = weight_a * inv_total_weight;

    let closing_speed = (vel_a - vel_b).dot(axis).max(0.0);
    let impulse = closing_speed * (dt_ms * VELOCITY_TRANSFER_PER_MS).min(1.0);

    Some(CollisionResponse {
        displacement_a: -axis * penetration * share_a,
        displacement_b: axis * penetration * share_b,
        velocity_change_a: -axis * impulse * share_a,
        velocity_change_b: axis * impulse * share_b,
    })
}

/// Cheap overlap test without computing a response
#[inline]
pub fn circles_overlap(pos_a: Vec2, pos_b: Vec2, radius_a: f32, radius_b: f32) -> bool {
    let radius_sum = radius_a + radius_b;
    pos_a.distance_squared(pos_b) <= radius_sum * radius_sum
}
