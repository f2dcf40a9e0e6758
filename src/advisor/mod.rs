//! Shot advisor boundary
//!
//! The engine never trusts the advisor: whatever comes back is validated,
//! and anything unusable (including a failed round-trip) is replaced by a
//! shot at the nearest ball with the fallback power.

pub mod http;
pub mod prompt;
pub mod validate;

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use http::{AdvisorSettings, HttpAdvisor};
pub use prompt::{BallBrief, PocketBrief, ShotRequest};
pub use validate::{Rejection, Shot, ShotSource, resolve_shot, validate_proposal};

/// Raw `(angle, power)` pair as proposed by an advisor, not yet validated
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProposedShot {
    pub angle_degrees: f32,
    pub power: f32,
}

impl ProposedShot {
    pub fn new(angle_degrees: f32, power: f32) -> Self {
        Self {
            angle_degrees,
            power,
        }
    }
}

/// Ways a round-trip to the advisor can fail
#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("advisor transport failed: {0}")]
    Transport(#[from] std::io::Error),
    #[error("advisor answered with HTTP status {0}")]
    Status(u16),
    #[error("malformed advisor response: {0}")]
    Malformed(String),
    #[error("advisor response is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("advisor reply contains no shot proposal")]
    NoProposal,
    #[error("advisor unavailable")]
    Unavailable,
}

/// Anything that can propose the next shot for a settled table
pub trait ShotAdvisor {
    fn propose_shot(&mut self, request: &ShotRequest) -> Result<ProposedShot, AdvisorError>;
}

impl<F> ShotAdvisor for F
where
    F: FnMut(&ShotRequest) -> Result<ProposedShot, AdvisorError>,
{
    fn propose_shot(&mut self, request: &ShotRequest) -> Result<ProposedShot, AdvisorError> {
        self(request)
    }
}

/// Advisor that never answers; every shot falls back to the nearest ball
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineAdvisor;

impl ShotAdvisor for OfflineAdvisor {
    fn propose_shot(&mut self, _request: &ShotRequest) -> Result<ProposedShot, AdvisorError> {
        Err(AdvisorError::Unavailable)
    }
}

/// Replays a fixed list of replies in order, then reports itself unavailable
#[derive(Debug, Default)]
pub struct ScriptedAdvisor {
    replies: VecDeque<Result<ProposedShot, AdvisorError>>,
    requests: Vec<ShotRequest>,
}

impl ScriptedAdvisor {
    pub fn new(replies: impl IntoIterator<Item = Result<ProposedShot, AdvisorError>>) -> Self {
        Self {
            replies: replies.into_iter().collect(),
            requests: Vec::new(),
        }
    }

    /// Every request received so far, oldest first
    pub fn requests(&self) -> &[ShotRequest] {
        &self.requests
    }

    pub fn calls(&self) -> usize {
        self.requests.len()
    }
}

impl ShotAdvisor for ScriptedAdvisor {
    fn propose_shot(&mut self, request: &ShotRequest) -> Result<ProposedShot, AdvisorError> {
        self.requests.push(request.clone());
        self.replies
            .pop_front()
            .unwrap_or_else(|| Err(AdvisorError::Unavailable))
    }
}
