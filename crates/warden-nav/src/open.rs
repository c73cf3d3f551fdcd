use warden_core::{DeterministicRng, Vec3};

use crate::{NavPath, NavigationOracle};

/// Unbounded flat floor with no obstacles.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OpenGround {
    pub floor_z: f32,
}

impl OpenGround {
    pub fn new(floor_z: f32) -> Self {
        Self { floor_z }
    }
}

impl NavigationOracle for OpenGround {
    fn project_to_navigable(&self, point: Vec3, extent: Vec3) -> Option<Vec3> {
        ((point.z - self.floor_z).abs() <= extent.z)
            .then(|| Vec3::new(point.x, point.y, self.floor_z))
    }

    fn random_reachable_point(
        &self,
        center: Vec3,
        radius: f32,
        rng: &mut dyn DeterministicRng,
    ) -> Option<Vec3> {
        let angle = rng.next_f32_range(0.0, 360.0);
        let r = radius.max(0.0) * rng.next_f32_unit().sqrt();
        let offset = Vec3::from_yaw_degrees(angle) * r;
        Some(Vec3::new(center.x + offset.x, center.y + offset.y, self.floor_z))
    }

    fn find_path(&self, start: Vec3, goal: Vec3) -> Option<NavPath> {
        Some(NavPath::new(vec![
            Vec3::new(start.x, start.y, self.floor_z),
            Vec3::new(goal.x, goal.y, self.floor_z),
        ]))
    }
}
