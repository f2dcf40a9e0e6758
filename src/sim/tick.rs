//! Fixed-rate simulation tick and the shot-turn state machine
//!
//! One tick: integrate every ball, resolve collisions, resolve pockets, then
//! decide whether the settled table gets a new shot or the game is over.

use glam::Vec2;
use serde::Serialize;

use super::collision::resolve_ball_collisions;
use super::pocket::resolve_pockets;
use super::state::{Ball, BallKind, GamePhase, GameState, Outcome};
use crate::advisor::{Shot, ShotAdvisor, ShotRequest, resolve_shot};
use crate::angle_degrees;

/// Something notable that happened during a tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TableEvent {
    /// A ball dropped into a pocket (index into `Table::pockets`)
    Potted {
        id: u32,
        kind: BallKind,
        pocket: usize,
    },
    /// The cue ball was pocketed and respotted
    Foul { pocket: usize },
    /// A shot was played from a settled table
    ShotTaken { shot_number: u32, shot: Shot },
    /// The game reached its terminal phase
    GameOver { outcome: Outcome },
}

/// Advance the game by one tick.
///
/// Once the game is over the table is frozen: balls keep their last
/// positions and the advisor is never consulted again.
pub fn tick(state: &mut GameState, advisor: &mut dyn ShotAdvisor) -> Vec<TableEvent> {
    let mut events = Vec::new();
    if state.is_game_over() {
        return events;
    }

    state.time_ticks += 1;

    for ball in &mut state.balls {
        ball.integrate(&state.table);
    }
    resolve_ball_collisions(&mut state.balls, state.table.ball_radius);
    resolve_pockets(state, &mut events);

    if let Some(event) = settle(state, advisor) {
        events.push(event);
    }

    events
}

/// Turn transition, evaluated after physics and pocketing.
///
/// Does nothing while anything is still rolling. On a settled table either
/// plays the next shot or, when the budget is spent, ends the game.
pub fn settle(state: &mut GameState, advisor: &mut dyn ShotAdvisor) -> Option<TableEvent> {
    if state.is_game_over() || !state.all_resting() {
        return None;
    }

    if state.shots_taken < state.rules.max_shots {
        Some(take_shot(state, advisor))
    } else {
        Some(end_game(state, final_outcome(&state.balls)))
    }
}

fn take_shot(state: &mut GameState, advisor: &mut dyn ShotAdvisor) -> TableEvent {
    let Some(cue_idx) = state.balls.iter().position(Ball::is_cue) else {
        // Sessions always hold a cue ball; a hand-edited state without one just ends
        log::warn!("No cue ball on a settled table, ending the game");
        return end_game(state, final_outcome(&state.balls));
    };

    state.shots_taken += 1;
    let shot_number = state.shots_taken;
    log::info!("----- Shot {} of {} -----", shot_number, state.rules.max_shots);

    let cue = state.balls[cue_idx].clone();
    let target = closest_target(&state.balls, cue.pos);
    let fallback_angle = target.map_or(0.0, |t| angle_degrees(cue.pos, t.pos));

    let request = ShotRequest::build(state, &cue, target, fallback_angle);
    let shot = resolve_shot(advisor, &request, &state.rules);

    log::info!(
        "Shot {}: angle {:.2} power {:.2} ({:?})",
        shot_number,
        shot.angle_degrees,
        shot.power,
        shot.source
    );
    state.balls[cue_idx].vel = shot.velocity();

    TableEvent::ShotTaken { shot_number, shot }
}

fn end_game(state: &mut GameState, outcome: Outcome) -> TableEvent {
    log::info!("Game over: {}", outcome.message());
    state.phase = GamePhase::GameOver { outcome };
    TableEvent::GameOver { outcome }
}

/// Closest non-cue ball to `from`; the earliest ball wins a tie
pub fn closest_target(balls: &[Ball], from: Vec2) -> Option<&Ball> {
    let mut best: Option<(&Ball, f32)> = None;
    for ball in balls.iter().filter(|b| !b.is_cue()) {
        let d = from.distance(ball.pos);
        if best.is_none_or(|(_, best_d)| d < best_d) {
            best = Some((ball, d));
        }
    }
    best.map(|(ball, _)| ball)
}

/// Outcome once the shot budget is spent
pub fn final_outcome(balls: &[Ball]) -> Outcome {
    if balls.iter().any(Ball::is_black) {
        Outcome::Lose
    } else {
        Outcome::Cleared
    }
}
