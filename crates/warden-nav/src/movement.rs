use warden_core::Vec3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MoveRequest {
    pub goal: Vec3,
    pub acceptance_radius: f32,
    pub allow_partial_path: bool,
}

impl MoveRequest {
    pub fn new(goal: Vec3, acceptance_radius: f32) -> Self {
        Self {
            goal,
            acceptance_radius,
            allow_partial_path: false,
        }
    }

    pub fn allow_partial(mut self, allow: bool) -> Self {
        self.allow_partial_path = allow;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MoveResult {
    Accepted,
    AlreadyAtGoal,
    Rejected,
}

impl MoveResult {
    /// `Accepted` or `AlreadyAtGoal`.
    pub fn is_ok(self) -> bool {
        !matches!(self, MoveResult::Rejected)
    }
}
