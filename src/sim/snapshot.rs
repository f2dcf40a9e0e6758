//! Read-only view of the table for presentation layers

use glam::Vec2;
use serde::Serialize;

use super::state::{BallKind, GameState};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BallView {
    pub id: u32,
    pub kind: BallKind,
    pub pos: Vec2,
    pub radius: f32,
    pub rgb: [u8; 3],
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSnapshot {
    pub tick: u64,
    pub shots_taken: u32,
    pub max_shots: u32,
    pub pockets: [Vec2; 4],
    pub pocket_radius: f32,
    pub balls: Vec<BallView>,
    /// Set once the game is over
    pub message: Option<String>,
}

impl TableSnapshot {
    pub fn capture(state: &GameState) -> Self {
        let radius = state.table.ball_radius;
        Self {
            tick: state.time_ticks,
            shots_taken: state.shots_taken,
            max_shots: state.rules.max_shots,
            pockets: state.table.pockets(),
            pocket_radius: state.table.pocket_radius,
            balls: state
                .balls
                .iter()
                .map(|b| BallView {
                    id: b.id,
                    kind: b.kind,
                    pos: b.pos,
                    radius,
                    rgb: b.kind.rgb(),
                })
                .collect(),
            message: state.outcome().map(|o| o.message().to_string()),
        }
    }

    /// Shot counter line for the HUD
    pub fn hud(&self) -> String {
        format!("Shots: {}/{}", self.shots_taken, self.max_shots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{GamePhase, Outcome, Rules};
    use crate::sim::table::Table;

    #[test]
    fn test_snapshot_reflects_state() {
        let mut state = GameState::new(1, Table::default(), Rules::default()).unwrap();
        let snapshot = TableSnapshot::capture(&state);

        assert_eq!(snapshot.balls.len(), state.balls.len());
        assert_eq!(snapshot.balls[0].rgb, [255, 255, 255]);
        assert_eq!(snapshot.hud(), "Shots: 0/10");
        assert!(snapshot.message.is_none());

        state.phase = GamePhase::GameOver {
            outcome: Outcome::Win,
        };
        let snapshot = TableSnapshot::capture(&state);
        assert_eq!(
            snapshot.message.as_deref(),
            Some("Black ball potted! Advisor wins!")
        );
    }

    #[test]
    fn test_snapshot_serializes() {
        let state = GameState::new(1, Table::default(), Rules::default()).unwrap();
        let json = serde_json::to_value(TableSnapshot::capture(&state)).unwrap();
        assert_eq!(json["max_shots"], 10);
        assert_eq!(json["balls"][1]["kind"], "Black");
    }
}
