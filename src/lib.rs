//! Advised Billiards - a single-player table driven by an external shot advisor
//!
//! Core modules:
//! - `sim`: Deterministic simulation (ball physics, collisions, pockets, turn state)
//! - `advisor`: Shot advisor boundary (prompt, response validation, HTTP transport)
//! - `settings`: Data-driven table, rules and advisor configuration

pub mod advisor;
pub mod settings;
pub mod sim;

pub use advisor::{AdvisorError, ShotAdvisor};
pub use settings::Settings;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed tick rate of the outer loop
    pub const TICK_RATE_HZ: u32 = 60;

    /// Table dimensions
    pub const TABLE_WIDTH: f32 = 800.0;
    pub const TABLE_HEIGHT: f32 = 400.0;

    /// Ball and pocket sizes
    pub const BALL_RADIUS: f32 = 12.0;
    pub const POCKET_RADIUS: f32 = 25.0;

    /// Velocity retained per tick (exponential decay)
    pub const FRICTION: f32 = 0.98;
    /// Per-axis speed at or below which a ball counts as resting
    pub const REST_THRESHOLD: f32 = 0.05;
    /// Substitute distance for two balls sharing a center
    pub const OVERLAP_EPSILON: f32 = 0.001;

    /// Shot budget per game
    pub const MAX_SHOTS: u32 = 10;
    /// Highest power an advisor may request
    pub const MAX_POWER: f32 = 15.0;
    /// Power used whenever the advisor's proposal is discarded
    pub const FALLBACK_POWER: f32 = 8.0;

    /// Object balls are racked around the black ball within this many units per axis
    pub const RACK_JITTER: i32 = 40;
}

/// Angle in degrees of the direction from `from` to `to`, in (-180, 180]
#[inline]
pub fn angle_degrees(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x).to_degrees()
}

/// Euclidean distance between two points
#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    a.distance(b)
}

/// Wrap an angle in degrees into [0, 360)
#[inline]
pub fn normalize_degrees(angle: f32) -> f32 {
    angle.rem_euclid(360.0)
}

/// Unit vector pointing along `angle` degrees
#[inline]
pub fn heading(angle: f32) -> Vec2 {
    let rad = angle.to_radians();
    Vec2::new(rad.cos(), rad.sin())
}
