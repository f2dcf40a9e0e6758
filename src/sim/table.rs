//! Table geometry
//!
//! A rectangular felt with a pocket in each corner. Immutable for a session.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::SetupError;
use crate::consts::*;

/// Fixed table geometry and physics constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Table {
    pub width: f32,
    pub height: f32,
    pub ball_radius: f32,
    /// A ball whose center comes closer than this to a pocket center is captured
    pub pocket_radius: f32,
    /// Velocity multiplier applied every tick (must be in (0, 1))
    pub friction: f32,
    pub rest_threshold: f32,
}

impl Default for Table {
    fn default() -> Self {
        Self {
            width: TABLE_WIDTH,
            height: TABLE_HEIGHT,
            ball_radius: BALL_RADIUS,
            pocket_radius: POCKET_RADIUS,
            friction: FRICTION,
            rest_threshold: REST_THRESHOLD,
        }
    }
}

impl Table {
    /// Corner pockets: top-left, top-right, bottom-left, bottom-right
    pub fn pockets(&self) -> [Vec2; 4] {
        [
            Vec2::new(0.0, 0.0),
            Vec2::new(self.width, 0.0),
            Vec2::new(0.0, self.height),
            Vec2::new(self.width, self.height),
        ]
    }

    /// Where the cue ball goes after a foul (also its opening spot)
    pub fn cue_restart(&self) -> Vec2 {
        Vec2::new((self.width / 4.0).floor(), (self.height / 2.0).floor())
    }

    /// Opening spot of the black ball
    pub fn black_spot(&self) -> Vec2 {
        Vec2::new((3.0 * self.width / 4.0).floor(), (self.height / 2.0).floor())
    }

    /// Whether a ball center satisfies the wall invariant
    pub fn contains(&self, pos: Vec2) -> bool {
        let r = self.ball_radius;
        pos.x >= r && pos.x <= self.width - r && pos.y >= r && pos.y <= self.height - r
    }

    /// Index of the first pocket capturing a ball at `pos`
    pub fn capturing_pocket(&self, pos: Vec2) -> Option<usize> {
        self.pockets()
            .iter()
            .position(|p| crate::distance(pos, *p) < self.pocket_radius)
    }

    /// Reject geometry the physics cannot run on
    pub fn validate(&self) -> Result<(), SetupError> {
        let finite = [
            self.width,
            self.height,
            self.ball_radius,
            self.pocket_radius,
            self.friction,
            self.rest_threshold,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !finite {
            return Err(SetupError::InvalidTable("non-finite value".into()));
        }
        if self.ball_radius <= 0.0 {
            return Err(SetupError::InvalidTable("ball radius must be positive".into()));
        }
        if self.width <= 2.0 * self.ball_radius || self.height <= 2.0 * self.ball_radius {
            return Err(SetupError::InvalidTable(format!(
                "{}x{} table cannot hold a ball of radius {}",
                self.width, self.height, self.ball_radius
            )));
        }
        if self.pocket_radius <= 0.0 {
            return Err(SetupError::InvalidTable("pocket radius must be positive".into()));
        }
        if !(self.friction > 0.0 && self.friction < 1.0) {
            return Err(SetupError::InvalidTable(format!(
                "friction {} outside (0, 1)",
                self.friction
            )));
        }
        if self.rest_threshold <= 0.0 {
            return Err(SetupError::InvalidTable("rest threshold must be positive".into()));
        }
        Ok(())
    }
}
