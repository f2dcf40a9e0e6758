//! Shot request construction
//!
//! The advisor sees the table as text: pockets, the cue ball, and for every
//! other ball its bearing from the cue and from itself to each pocket.

use std::fmt::Write;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::sim::state::{Ball, GameState};
use crate::{angle_degrees, distance};

/// Distance and bearing from a ball to one pocket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PocketBrief {
    pub distance: f32,
    pub angle_degrees: f32,
}

/// What the advisor is told about one non-cue ball
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BallBrief {
    pub id: u32,
    pub label: String,
    pub pos: Vec2,
    pub distance_from_cue: f32,
    pub angle_from_cue: f32,
    pub pockets: Vec<PocketBrief>,
}

/// Everything the advisor gets to see before a shot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShotRequest {
    pub table_width: f32,
    pub table_height: f32,
    pub pockets: Vec<Vec2>,
    pub shots_taken: u32,
    pub max_shots: u32,
    pub max_power: f32,
    pub cue_pos: Vec2,
    pub cue_vel: Vec2,
    pub balls: Vec<BallBrief>,
    /// Bearing from the cue ball to the closest ball (0 when there is none)
    pub fallback_angle: f32,
    /// Label of the closest ball, if any
    pub closest: Option<String>,
}

impl ShotRequest {
    /// Describe the settled table for a shot from `cue` toward `target`.
    pub fn build(state: &GameState, cue: &Ball, target: Option<&Ball>, fallback_angle: f32) -> Self {
        let pockets = state.table.pockets();

        let balls = state
            .balls
            .iter()
            .filter(|b| !b.is_cue())
            .map(|b| BallBrief {
                id: b.id,
                label: b.kind.label().to_string(),
                pos: b.pos,
                distance_from_cue: distance(cue.pos, b.pos),
                angle_from_cue: angle_degrees(cue.pos, b.pos),
                pockets: pockets
                    .iter()
                    .map(|p| PocketBrief {
                        distance: distance(b.pos, *p),
                        angle_degrees: angle_degrees(b.pos, *p),
                    })
                    .collect(),
            })
            .collect();

        Self {
            table_width: state.table.width,
            table_height: state.table.height,
            pockets: pockets.to_vec(),
            shots_taken: state.shots_taken,
            max_shots: state.rules.max_shots,
            max_power: state.rules.max_power,
            cue_pos: cue.pos,
            cue_vel: cue.vel,
            balls,
            fallback_angle,
            closest: target.map(|t| t.kind.label().to_string()),
        }
    }

    /// Render the request as the plain-text prompt sent to a language model
    pub fn prompt(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail
        let _ = self.write_prompt(&mut out);
        out
    }

    fn write_prompt(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out, "You are choosing shots in a single-player billiards game.")?;
        writeln!(
            out,
            "Pot the black ball to win; the other colored balls are obstacles or extra targets."
        )?;
        writeln!(
            out,
            "Shots taken: {}/{}. Table size: width={}, height={}.",
            self.shots_taken, self.max_shots, self.table_width, self.table_height
        )?;
        writeln!(out)?;

        writeln!(out, "Pockets (corners):")?;
        for (i, p) in self.pockets.iter().enumerate() {
            writeln!(out, "  Pocket {}: (x={}, y={})", i + 1, p.x, p.y)?;
        }
        writeln!(out)?;

        writeln!(
            out,
            "Cue ball at (x={:.2}, y={:.2}), velocity (vx={:.2}, vy={:.2}).",
            self.cue_pos.x, self.cue_pos.y, self.cue_vel.x, self.cue_vel.y
        )?;
        writeln!(out)?;

        writeln!(out, "Object balls (with distance/angle to every pocket):")?;
        for (i, ball) in self.balls.iter().enumerate() {
            writeln!(
                out,
                "Ball {}: color={}, (x={:.2}, y={:.2})",
                i + 1,
                ball.label,
                ball.pos.x,
                ball.pos.y
            )?;
            writeln!(
                out,
                "  Distance from cue={:.2}, angle from cue={:.2}",
                ball.distance_from_cue, ball.angle_from_cue
            )?;
            writeln!(out, "  Pocket distances/angles:")?;
            for (j, pocket) in ball.pockets.iter().enumerate() {
                writeln!(
                    out,
                    "    Pocket {}: dist={:.2}, angle={:.2}",
                    j + 1,
                    pocket.distance,
                    pocket.angle_degrees
                )?;
            }
            writeln!(out)?;
        }

        writeln!(
            out,
            "Fallback angle: {:.2} degrees toward the closest ball ({}).",
            self.fallback_angle,
            self.closest.as_deref().unwrap_or("none")
        )?;
        writeln!(out)?;
        writeln!(
            out,
            "IMPORTANT: angle_degrees must be in [0, 360), power must be in [0, {}].",
            self.max_power
        )?;
        writeln!(
            out,
            "Respond with STRICT JSON only: {{\"angle_degrees\": <float>, \"power\": <float>}}"
        )?;
        write!(out, "No extra text.")
    }
}
