//! Pocket detection and per-kind pocketing outcomes

use glam::Vec2;

use super::state::{Ball, BallKind, GamePhase, GameState, Outcome};
use super::tick::TableEvent;

/// Check every live ball against the corner pockets and apply the outcome.
///
/// Balls are visited in list order and each one is captured at most once,
/// by the first pocket that reaches it. Pocketing the black ball ends the
/// game on the spot; nothing after it is examined this tick.
pub fn resolve_pockets(state: &mut GameState, events: &mut Vec<TableEvent>) {
    let table = state.table.clone();
    let restart = table.cue_restart();

    let mut idx = 0;
    while idx < state.balls.len() {
        let Some(pocket) = table.capturing_pocket(state.balls[idx].pos) else {
            idx += 1;
            continue;
        };

        let ball = &mut state.balls[idx];
        match ball.kind {
            BallKind::Black => {
                log::debug!("Black ball potted in pocket {}", pocket + 1);
                events.push(TableEvent::Potted {
                    id: ball.id,
                    kind: ball.kind,
                    pocket,
                });
                let outcome = Outcome::Win;
                state.phase = GamePhase::GameOver { outcome };
                events.push(TableEvent::GameOver { outcome });
                return;
            }
            BallKind::Cue => {
                log::warn!("Foul: cue ball pocketed, resetting to ({}, {})", restart.x, restart.y);
                respot(ball, restart);
                events.push(TableEvent::Foul { pocket });
                idx += 1;
            }
            BallKind::Object(_) => {
                let removed: Ball = state.balls.remove(idx);
                log::debug!(
                    "{} ball {} potted in pocket {}",
                    removed.kind.label(),
                    removed.id,
                    pocket + 1
                );
                events.push(TableEvent::Potted {
                    id: removed.id,
                    kind: removed.kind,
                    pocket,
                });
            }
        }
    }
}

fn respot(ball: &mut Ball, spot: Vec2) {
    ball.pos = spot;
    ball.vel = Vec2::ZERO;
}
