//! Deterministic bubble-field simulation
//!
//! All gameplay-side motion lives here. The module must stay pure and
//! deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Parallel work folds into per-chunk buffers merged in a fixed order
//! - No rendering or platform dependencies

pub mod collision;
pub mod state;
pub mod sweep;
pub mod tick;

pub use collision::{CollisionResponse, VELOCITY_TRANSFER_PER_MS, circles_overlap, resolve_circle_pair};
pub use state::{Bubble, BubbleKind, Cat, Shrine, SimState};
pub use sweep::{BoundingCircle, SweepPrune};
pub use tick::{INSPIRE_DURATION_MS, TickStats, tick};
