//! Turn the agent toward its target, instantly or at a bounded angular speed.

use warden_core::facts::{LAST_KNOWN_PLAYER_LOCATION, TARGET_ACTOR};
use warden_core::{
    normalize_degrees, FactStore, Task, TaskKind, TaskResult, TaskStatus, TaskTimers,
    TickContext, Vec3,
};

use super::{resolve_target, LOOK_AT};
use crate::{CombatWorldMut, LookAtConfig, TaskFailure};

#[derive(Debug, Clone)]
pub struct LookAtTask {
    config: LookAtConfig,
    aim_point: Vec3,
    started_at: f32,
    failure: Option<TaskFailure>,
}

impl LookAtTask {
    pub fn new(config: LookAtConfig) -> Self {
        Self {
            config,
            aim_point: Vec3::ZERO,
            started_at: 0.0,
            failure: None,
        }
    }

    pub fn aim_point(&self) -> Vec3 {
        self.aim_point
    }

    pub fn failure(&self) -> Option<TaskFailure> {
        self.failure
    }

    fn fail(&mut self, failure: TaskFailure) -> TaskStatus {
        tracing::debug!(task = %LOOK_AT, reason = %failure, "task failed");
        self.failure = Some(failure);
        TaskStatus::Failed
    }

    /// Actor targets are aimed at chest height; remembered points as-is.
    fn resolve_aim_point<W: CombatWorldMut>(&self, world: &W, facts: &FactStore) -> Option<Vec3> {
        if let Some((actor, position)) = resolve_target(world, facts) {
            let offset = if world.is_character(actor) {
                self.config.aim_height_offset
            } else {
                0.0
            };
            return Some(position + Vec3::new(0.0, 0.0, offset));
        }
        if facts.get(TARGET_ACTOR).is_some() {
            tracing::trace!(task = %LOOK_AT, "target actor unresolved; using last known location");
        }
        let last_known = facts.get(LAST_KNOWN_PLAYER_LOCATION);
        (!last_known.is_zero()).then_some(last_known)
    }

    /// Signed shortest-arc yaw error toward the aim point.
    fn yaw_error<W: CombatWorldMut>(&self, world: &W, agent: W::Agent) -> Option<(f32, f32)> {
        let position = world.position(agent)?;
        let yaw = world.yaw_degrees(agent)?;
        let to_aim = (self.aim_point - position).flat();
        if to_aim.is_zero() {
            return Some((yaw, 0.0));
        }
        Some((yaw, normalize_degrees(to_aim.yaw_degrees() - yaw)))
    }
}

fn moved_beyond(a: Vec3, b: Vec3, threshold: f32) -> bool {
    (a.x - b.x).abs() > threshold || (a.y - b.y).abs() > threshold || (a.z - b.z).abs() > threshold
}

impl<W> Task<W> for LookAtTask
where
    W: CombatWorldMut + 'static,
{
    fn kind(&self) -> TaskKind {
        LOOK_AT
    }

    fn start(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        facts: &mut FactStore,
        _timers: &mut TaskTimers,
    ) -> TaskStatus {
        let Some(aim_point) = self.resolve_aim_point(world, facts) else {
            return self.fail(TaskFailure::NoTarget);
        };
        self.aim_point = aim_point;
        self.started_at = ctx.time_seconds;

        let Some((yaw, error)) = self.yaw_error(world, agent) else {
            return self.fail(TaskFailure::MissingDependency("agent transform"));
        };
        if self.config.instant {
            world.set_yaw_degrees(agent, normalize_degrees(yaw + error));
            return TaskStatus::Succeeded;
        }
        if error.abs() <= self.config.acceptable_angle {
            return TaskStatus::Succeeded;
        }
        TaskStatus::Running
    }

    fn tick(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        facts: &mut FactStore,
        _timers: &mut TaskTimers,
    ) -> TaskStatus {
        if ctx.time_seconds - self.started_at >= self.config.max_time {
            tracing::debug!(task = %LOOK_AT, "rotation time exhausted");
            return TaskStatus::Succeeded;
        }
        if let Some(aim_point) = self.resolve_aim_point(world, facts) {
            if moved_beyond(aim_point, self.aim_point, self.config.retarget_threshold) {
                self.aim_point = aim_point;
            }
        }

        let Some((yaw, error)) = self.yaw_error(world, agent) else {
            return self.fail(TaskFailure::MissingDependency("agent transform"));
        };
        if error.abs() <= self.config.acceptable_angle {
            return TaskStatus::Succeeded;
        }
        let step = error.signum() * error.abs().min(self.config.rotation_speed * ctx.dt_seconds);
        world.set_yaw_degrees(agent, normalize_degrees(yaw + step));

        if (error - step).abs() <= self.config.acceptable_angle {
            return TaskStatus::Succeeded;
        }
        TaskStatus::Running
    }

    fn finish(
        &mut self,
        _ctx: &TickContext,
        _agent: W::Agent,
        _world: &mut W,
        _facts: &mut FactStore,
        result: TaskResult,
    ) {
        tracing::debug!(task = %LOOK_AT, result = result.name(), "finished");
    }
}
