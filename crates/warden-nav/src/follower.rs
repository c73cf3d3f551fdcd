use warden_core::Vec3;

use crate::{MoveRequest, MoveResult, NavPath, NavigationOracle};

/// Reference executor for accepted move requests: plans once, then advances along the path by
/// `speed * dt` each step.
#[derive(Debug, Clone)]
pub struct PathFollower {
    goal: Vec3,
    acceptance_radius: f32,
    path: NavPath,
    next_index: usize,
}

impl PathFollower {
    /// Plan `request` from `from`. Returns the request outcome and, when accepted, the follower
    /// that executes it.
    pub fn plan(
        oracle: &dyn NavigationOracle,
        from: Vec3,
        request: &MoveRequest,
    ) -> (MoveResult, Option<PathFollower>) {
        if from.distance_2d(request.goal) <= request.acceptance_radius {
            return (MoveResult::AlreadyAtGoal, None);
        }

        let path = oracle.find_path(from, request.goal).or_else(|| {
            if !request.allow_partial_path {
                return None;
            }
            // Settle for the closest walkable spot near the goal.
            let near = oracle
                .project_to_navigable(request.goal, Vec3::new(200.0, 200.0, 500.0))?;
            oracle.find_path(from, near)
        });

        match path {
            Some(path) if path.points.len() >= 2 => (
                MoveResult::Accepted,
                Some(PathFollower {
                    goal: request.goal,
                    acceptance_radius: request.acceptance_radius,
                    path,
                    next_index: 1,
                }),
            ),
            _ => (MoveResult::Rejected, None),
        }
    }

    pub fn goal(&self) -> Vec3 {
        self.goal
    }

    pub fn path(&self) -> &NavPath {
        &self.path
    }

    /// Arrived within the acceptance radius, or ran out of path (partial paths end short).
    pub fn is_done(&self, position: Vec3) -> bool {
        position.distance_2d(self.goal) <= self.acceptance_radius
            || self.next_index >= self.path.points.len()
    }

    /// Move `position` along the path by up to `distance`.
    pub fn advance(&mut self, position: Vec3, distance: f32) -> Vec3 {
        let mut remaining = distance.max(0.0);
        let mut current = position;

        while self.next_index < self.path.points.len() && remaining > 0.0 {
            if current.distance_2d(self.goal) <= self.acceptance_radius {
                break;
            }

            let target = self.path.points[self.next_index];
            let to_target = target - current;
            let dist = to_target.length();

            if dist <= f32::EPSILON {
                self.next_index += 1;
                continue;
            }

            if remaining >= dist {
                current = target;
                self.next_index += 1;
                remaining -= dist;
                continue;
            }

            current = current + to_target * (remaining / dist);
            break;
        }

        current
    }
}
