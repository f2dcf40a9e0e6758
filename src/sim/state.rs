//! Game state and core simulation types
//!
//! The session owns every live ball; the table is shared read-only.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::table::Table;
use crate::consts::*;

/// Colors available for object balls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BallColor {
    Red,
    Blue,
    Yellow,
    Magenta,
    Cyan,
}

impl BallColor {
    /// Rack order used when generating a new game
    pub const RACK: [BallColor; 5] = [
        BallColor::Red,
        BallColor::Blue,
        BallColor::Yellow,
        BallColor::Magenta,
        BallColor::Cyan,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BallColor::Red => "red",
            BallColor::Blue => "blue",
            BallColor::Yellow => "yellow",
            BallColor::Magenta => "magenta",
            BallColor::Cyan => "cyan",
        }
    }

    pub fn rgb(&self) -> [u8; 3] {
        match self {
            BallColor::Red => [220, 20, 60],
            BallColor::Blue => [30, 144, 255],
            BallColor::Yellow => [255, 215, 0],
            BallColor::Magenta => [255, 0, 255],
            BallColor::Cyan => [0, 255, 255],
        }
    }
}

/// What a ball is, which decides what happens when it is pocketed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BallKind {
    Cue,
    Black,
    Object(BallColor),
}

impl BallKind {
    /// Short name used in advisor prompts and logs
    pub fn label(&self) -> &'static str {
        match self {
            BallKind::Cue => "cue",
            BallKind::Black => "black",
            BallKind::Object(color) => color.as_str(),
        }
    }

    pub fn rgb(&self) -> [u8; 3] {
        match self {
            BallKind::Cue => [255, 255, 255],
            BallKind::Black => [0, 0, 0],
            BallKind::Object(color) => color.rgb(),
        }
    }
}

/// A ball entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub id: u32,
    pub kind: BallKind,
    pub pos: Vec2,
    pub vel: Vec2,
}

impl Ball {
    pub fn new(id: u32, kind: BallKind, pos: Vec2) -> Self {
        Self {
            id,
            kind,
            pos,
            vel: Vec2::ZERO,
        }
    }

    pub fn is_cue(&self) -> bool {
        self.kind == BallKind::Cue
    }

    pub fn is_black(&self) -> bool {
        self.kind == BallKind::Black
    }

    /// Advance one tick: move, apply friction, then bounce off the cushions.
    ///
    /// Each axis reflects independently, so a ball driven into a corner
    /// bounces off both cushions in the same tick.
    pub fn integrate(&mut self, table: &Table) {
        self.pos += self.vel;
        self.vel *= table.friction;

        let r = table.ball_radius;

        if self.pos.x - r < 0.0 {
            self.pos.x = r;
            self.vel.x = -self.vel.x;
        } else if self.pos.x + r > table.width {
            self.pos.x = table.width - r;
            self.vel.x = -self.vel.x;
        }

        if self.pos.y - r < 0.0 {
            self.pos.y = r;
            self.vel.y = -self.vel.y;
        } else if self.pos.y + r > table.height {
            self.pos.y = table.height - r;
            self.vel.y = -self.vel.y;
        }
    }

    /// True once both velocity components have decayed below the threshold
    pub fn is_resting(&self, threshold: f32) -> bool {
        self.vel.x.abs() <= threshold && self.vel.y.abs() <= threshold
    }
}

/// How a finished game ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Black ball was pocketed
    Win,
    /// Shot budget ran out with the black ball still on the table
    Lose,
    /// Shot budget ran out and the black ball was gone
    Cleared,
}

impl Outcome {
    pub fn message(&self) -> &'static str {
        match self {
            Outcome::Win => "Black ball potted! Advisor wins!",
            Outcome::Lose => "No more shots. Black ball remains. Advisor loses!",
            Outcome::Cleared => "All balls cleared or black ball potted earlier.",
        }
    }
}

/// Current phase of play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Balls moving, or settled and waiting for the next shot
    InPlay,
    /// Terminal; nothing moves and no more shots are requested
    GameOver { outcome: Outcome },
}

/// Per-game rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    pub max_shots: u32,
    /// Power used when an advisor proposal is discarded
    pub fallback_power: f32,
    /// Upper bound on accepted advisor power
    pub max_power: f32,
    /// Object balls are scattered this far (per axis) around the black spot
    pub rack_jitter: i32,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            max_shots: MAX_SHOTS,
            fallback_power: FALLBACK_POWER,
            max_power: MAX_POWER,
            rack_jitter: RACK_JITTER,
        }
    }
}

impl Rules {
    pub fn validate(&self) -> Result<(), SetupError> {
        if !(self.max_power.is_finite() && self.max_power >= 0.0) {
            return Err(SetupError::InvalidRules(format!(
                "max power {} must be finite and non-negative",
                self.max_power
            )));
        }
        if !(self.fallback_power.is_finite()
            && self.fallback_power >= 0.0
            && self.fallback_power <= self.max_power)
        {
            return Err(SetupError::InvalidRules(format!(
                "fallback power {} outside [0, {}]",
                self.fallback_power, self.max_power
            )));
        }
        if self.rack_jitter < 0 {
            return Err(SetupError::InvalidRules("rack jitter must be non-negative".into()));
        }
        Ok(())
    }
}

/// Reasons a session cannot start
#[derive(Debug, Error, PartialEq)]
pub enum SetupError {
    #[error("no cue ball on the table")]
    MissingCue,
    #[error("no black ball on the table")]
    MissingBlack,
    #[error("more than one {0} ball on the table")]
    Duplicate(&'static str),
    #[error("ball {id} at ({x}, {y}) is outside the playable area")]
    OutOfBounds { id: u32, x: f32, y: f32 },
    #[error("duplicate ball id {0}")]
    DuplicateId(u32),
    #[error("invalid table: {0}")]
    InvalidTable(String),
    #[error("invalid rules: {0}")]
    InvalidRules(String),
}

/// Complete session state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Rack seed for reproducibility
    pub seed: u64,
    pub table: Table,
    pub rules: Rules,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub shots_taken: u32,
    pub phase: GamePhase,
    /// Live balls in stable iteration order
    pub balls: Vec<Ball>,
}

impl GameState {
    /// Rack a fresh game: cue and black on their spots, one object ball per
    /// rack color scattered around the black spot.
    pub fn new(seed: u64, table: Table, rules: Rules) -> Result<Self, SetupError> {
        table.validate()?;
        rules.validate()?;

        let mut rng = Pcg32::seed_from_u64(seed);
        let jitter = rules.rack_jitter;
        let black_spot = table.black_spot();

        let mut balls = vec![
            Ball::new(1, BallKind::Cue, table.cue_restart()),
            Ball::new(2, BallKind::Black, black_spot),
        ];
        for color in BallColor::RACK {
            let dx = rng.random_range(-jitter..=jitter) as f32;
            let dy = rng.random_range(-jitter..=jitter) as f32;
            let id = balls.len() as u32 + 1;
            let pos = clamp_to_table(&table, black_spot + Vec2::new(dx, dy));
            balls.push(Ball::new(id, BallKind::Object(color), pos));
        }

        Self::from_parts(seed, table, rules, balls)
    }

    /// Start a session from an explicit ball layout.
    ///
    /// The layout must contain exactly one cue ball and one black ball, all
    /// inside the playable area, with unique ids.
    pub fn with_balls(table: Table, rules: Rules, balls: Vec<Ball>) -> Result<Self, SetupError> {
        table.validate()?;
        rules.validate()?;
        Self::from_parts(0, table, rules, balls)
    }

    fn from_parts(
        seed: u64,
        table: Table,
        rules: Rules,
        balls: Vec<Ball>,
    ) -> Result<Self, SetupError> {
        let cues = balls.iter().filter(|b| b.is_cue()).count();
        let blacks = balls.iter().filter(|b| b.is_black()).count();
        match cues {
            0 => return Err(SetupError::MissingCue),
            1 => {}
            _ => return Err(SetupError::Duplicate("cue")),
        }
        match blacks {
            0 => return Err(SetupError::MissingBlack),
            1 => {}
            _ => return Err(SetupError::Duplicate("black")),
        }
        for (i, ball) in balls.iter().enumerate() {
            if balls[..i].iter().any(|other| other.id == ball.id) {
                return Err(SetupError::DuplicateId(ball.id));
            }
            if !ball.pos.is_finite() || !table.contains(ball.pos) {
                return Err(SetupError::OutOfBounds {
                    id: ball.id,
                    x: ball.pos.x,
                    y: ball.pos.y,
                });
            }
        }

        Ok(Self {
            seed,
            table,
            rules,
            time_ticks: 0,
            shots_taken: 0,
            phase: GamePhase::InPlay,
            balls,
        })
    }

    pub fn cue(&self) -> Option<&Ball> {
        self.balls.iter().find(|b| b.is_cue())
    }

    pub fn black_on_table(&self) -> bool {
        self.balls.iter().any(|b| b.is_black())
    }

    pub fn is_game_over(&self) -> bool {
        matches!(self.phase, GamePhase::GameOver { .. })
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self.phase {
            GamePhase::GameOver { outcome } => Some(outcome),
            GamePhase::InPlay => None,
        }
    }

    /// True when every live ball has come to rest
    pub fn all_resting(&self) -> bool {
        let threshold = self.table.rest_threshold;
        self.balls.iter().all(|b| b.is_resting(threshold))
    }
}

fn clamp_to_table(table: &Table, pos: Vec2) -> Vec2 {
    let r = table.ball_radius;
    Vec2::new(
        pos.x.clamp(r, table.width - r),
        pos.y.clamp(r, table.height - r),
    )
}
