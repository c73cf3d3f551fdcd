use warden_core::{Vec3, WorldMut, WorldView};

use crate::{MoveRequest, MoveResult, NavigationOracle};

pub trait NavWorldView: WorldView {
    fn position(&self, agent: Self::Agent) -> Option<Vec3>;

    /// Facing in degrees (see [`Vec3::from_yaw_degrees`]).
    fn yaw_degrees(&self, agent: Self::Agent) -> Option<f32>;

    fn navigator(&self) -> &dyn NavigationOracle;

    /// Whether an accepted move request is still being followed.
    fn is_moving(&self, agent: Self::Agent) -> bool;

    fn forward(&self, agent: Self::Agent) -> Option<Vec3> {
        self.yaw_degrees(agent).map(Vec3::from_yaw_degrees)
    }
}

pub trait NavWorldMut: WorldMut + NavWorldView {
    fn request_move(&mut self, agent: Self::Agent, request: MoveRequest) -> MoveResult;

    fn stop_movement(&mut self, agent: Self::Agent);

    fn set_move_speed(&mut self, agent: Self::Agent, speed: f32);

    fn set_yaw_degrees(&mut self, agent: Self::Agent, yaw: f32);
}
