//! Deterministic simulation module
//!
//! All table logic lives here. This module must be pure and deterministic:
//! - One unit of simulated time per tick
//! - Seeded RNG only
//! - Stable iteration order (ball list order)
//! - No rendering or platform dependencies

pub mod collision;
pub mod pocket;
pub mod snapshot;
pub mod state;
pub mod table;
pub mod tick;

pub use collision::{Contact, ball_ball_contact, resolve_ball_collisions};
pub use pocket::resolve_pockets;
pub use snapshot::{BallView, TableSnapshot};
pub use state::{Ball, BallColor, BallKind, GamePhase, GameState, Outcome, Rules, SetupError};
pub use table::Table;
pub use tick::{TableEvent, closest_target, final_outcome, settle, tick};
