//! Ball-to-ball collision detection and response
//!
//! Every ball has the same radius and mass, so a collision is resolved by
//! separating the pair along the line of centers and swapping the velocity
//! components along that line.

use glam::Vec2;

use super::state::Ball;
use crate::consts::OVERLAP_EPSILON;

/// Result of an overlap check between two balls
#[derive(Debug, Clone, PartialEq)]
pub struct Contact {
    /// Unit vector from the first ball toward the second
    pub normal: Vec2,
    /// How far the balls interpenetrate
    pub penetration: f32,
}

/// Check whether two balls of radius `radius` overlap.
///
/// Coincident centers use a tiny substitute distance instead of dividing by
/// zero; the resulting normal is zero and the pair is left untouched.
pub fn ball_ball_contact(a: Vec2, b: Vec2, radius: f32) -> Option<Contact> {
    let delta = b - a;
    let mut dist = delta.length();
    if dist == 0.0 {
        dist = OVERLAP_EPSILON;
    }

    let min_dist = 2.0 * radius;
    if dist < min_dist {
        Some(Contact {
            normal: delta / dist,
            penetration: min_dist - dist,
        })
    } else {
        None
    }
}

/// Separate two overlapping balls and exchange their normal velocities.
pub fn resolve_pair(a: &mut Ball, b: &mut Ball, contact: &Contact) {
    let n = contact.normal;

    // Symmetric position correction, half the overlap each
    let push = n * (contact.penetration / 2.0);
    a.pos -= push;
    b.pos += push;

    // Equal-mass elastic exchange along the normal; tangential parts untouched
    let vn_a = a.vel.dot(n);
    let vn_b = b.vel.dot(n);
    a.vel += (vn_b - vn_a) * n;
    b.vel += (vn_a - vn_b) * n;
}

/// Resolve every overlapping pair in list order.
///
/// Pairs are handled one after another, so a ball touching several
/// neighbours is corrected several times and a correction may open a new
/// overlap that only gets fixed next tick. Returns the number of contacts.
pub fn resolve_ball_collisions(balls: &mut [Ball], radius: f32) -> usize {
    let mut contacts = 0;
    for i in 0..balls.len() {
        for j in (i + 1)..balls.len() {
            let (head, tail) = balls.split_at_mut(j);
            let (a, b) = (&mut head[i], &mut tail[0]);
            if let Some(contact) = ball_ball_contact(a.pos, b.pos, radius) {
                resolve_pair(a, b, &contact);
                contacts += 1;
            }
        }
    }
    contacts
}
