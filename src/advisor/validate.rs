//! Advisor response validation and the fallback policy

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{ProposedShot, ShotAdvisor, ShotRequest};
use crate::sim::state::Rules;
use crate::{heading, normalize_degrees};

/// Where an applied shot came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShotSource {
    Advisor,
    Fallback,
}

/// A shot the engine is willing to play
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Shot {
    pub angle_degrees: f32,
    pub power: f32,
    pub source: ShotSource,
}

impl Shot {
    pub fn fallback(angle_degrees: f32, power: f32) -> Self {
        Self {
            angle_degrees,
            power,
            source: ShotSource::Fallback,
        }
    }

    /// Cue ball velocity for this shot in table coordinates
    pub fn velocity(&self) -> Vec2 {
        heading(self.angle_degrees) * self.power
    }
}

/// Why a proposal was discarded
#[derive(Debug, Error, PartialEq)]
pub enum Rejection {
    #[error("non-finite proposal ({angle}, {power})")]
    NotFinite { angle: f32, power: f32 },
    #[error("angle {0} outside [0, 360)")]
    Angle(f32),
    #[error("power {power} outside [0, {max}]")]
    Power { power: f32, max: f32 },
}

/// Check a raw proposal against the advisor contract.
///
/// The angle may be given anywhere within one turn either side of zero and
/// is wrapped into [0, 360); anything further out is rejected along with
/// powers outside [0, `max_power`].
pub fn validate_proposal(proposal: &ProposedShot, max_power: f32) -> Result<Shot, Rejection> {
    let ProposedShot {
        angle_degrees,
        power,
    } = *proposal;

    if !angle_degrees.is_finite() || !power.is_finite() {
        return Err(Rejection::NotFinite {
            angle: angle_degrees,
            power,
        });
    }
    if angle_degrees <= -360.0 || angle_degrees >= 360.0 {
        return Err(Rejection::Angle(angle_degrees));
    }

    // rem_euclid can round tiny negatives up to exactly 360, which is 0
    let angle = match normalize_degrees(angle_degrees) {
        wrapped if wrapped >= 360.0 => 0.0,
        wrapped => wrapped,
    };
    if !(0.0..360.0).contains(&angle) {
        return Err(Rejection::Angle(angle));
    }
    if !(0.0..=max_power).contains(&power) {
        return Err(Rejection::Power {
            power,
            max: max_power,
        });
    }

    Ok(Shot {
        angle_degrees: angle,
        power,
        source: ShotSource::Advisor,
    })
}

/// Ask the advisor for a shot, falling back to `(fallback_angle, fallback_power)`
/// on any failure or invalid proposal. Never fails.
pub fn resolve_shot(
    advisor: &mut dyn ShotAdvisor,
    request: &ShotRequest,
    rules: &Rules,
) -> Shot {
    let fallback = Shot::fallback(request.fallback_angle, rules.fallback_power);

    match advisor.propose_shot(request) {
        Ok(proposal) => match validate_proposal(&proposal, rules.max_power) {
            Ok(shot) => shot,
            Err(rejection) => {
                log::warn!(
                    "Advisor proposal rejected ({rejection}); aiming at the closest ball instead"
                );
                fallback
            }
        },
        Err(err) => {
            log::warn!("Advisor failed ({err}); aiming at the closest ball instead");
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_accepts_in_range() {
        let shot = validate_proposal(&ProposedShot::new(45.0, 15.0), 15.0).unwrap();
        assert_eq!(shot.angle_degrees, 45.0);
        assert_eq!(shot.power, 15.0);
        assert_eq!(shot.source, ShotSource::Advisor);
    }

    #[test]
    fn test_negative_angle_wraps() {
        let shot = validate_proposal(&ProposedShot::new(-90.0, 3.0), 15.0).unwrap();
        assert!((shot.angle_degrees - 270.0).abs() < 1e-4);
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert_eq!(
            validate_proposal(&ProposedShot::new(400.0, 5.0), 15.0),
            Err(Rejection::Angle(400.0))
        );
        assert_eq!(
            validate_proposal(&ProposedShot::new(360.0, 5.0), 15.0),
            Err(Rejection::Angle(360.0))
        );
        assert!(matches!(
            validate_proposal(&ProposedShot::new(10.0, 15.5), 15.0),
            Err(Rejection::Power { .. })
        ));
        assert!(matches!(
            validate_proposal(&ProposedShot::new(10.0, -0.1), 15.0),
            Err(Rejection::Power { .. })
        ));
        assert!(matches!(
            validate_proposal(&ProposedShot::new(f32::NAN, 1.0), 15.0),
            Err(Rejection::NotFinite { .. })
        ));
    }

    #[test]
    fn test_tiny_negative_angle_wraps_to_zero() {
        let shot = validate_proposal(&ProposedShot::new(-1e-9, 1.0), 15.0).unwrap();
        assert_eq!(shot.angle_degrees, 0.0);
        assert_eq!(shot.source, ShotSource::Advisor);
    }

    #[test]
    fn test_fallback_velocity() {
        let shot = Shot::fallback(180.0, 8.0);
        let v = shot.velocity();
        assert!((v.x + 8.0).abs() < 1e-4);
        assert!(v.y.abs() < 1e-4);
    }

    proptest! {
        #[test]
        fn prop_accepted_shots_are_in_contract(angle in -720.0f32..720.0, power in -5.0f32..20.0) {
            if let Ok(shot) = validate_proposal(&ProposedShot::new(angle, power), 15.0) {
                prop_assert!(shot.angle_degrees >= 0.0 && shot.angle_degrees < 360.0);
                prop_assert!(shot.power >= 0.0 && shot.power <= 15.0);
            }
        }
    }
}
