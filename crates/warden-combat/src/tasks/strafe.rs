//! Combat repositioning around the target.
//!
//! Two behaviours share one task: `Retreat` backs away until a safe distance is reached, `Orbit`
//! holds an optimal distance band and circles the target. The archetype picks one through
//! [`crate::StrafeMode`].

use warden_core::facts::{FIRE_DISTANCE, LAST_KNOWN_PLAYER_LOCATION, TARGET_ACTOR};
use warden_core::{
    DeterministicRng, FactStore, SplitMix64, Task, TaskKind, TaskResult, TaskStatus, TaskTimers,
    TickContext, TimerId, Vec3,
};
use warden_nav::{MoveRequest, MoveResult, SnapCascade};

use super::{resolve_target, STRAFE, STREAM_STRAFE};
use crate::{
    CombatWorldMut, OrbitConfig, RetreatConfig, StrafeConfig, StrafeMode, StrafePattern,
    TaskFailure,
};

const RETRY_MOVE: TimerId = TimerId("strafe.retry_move");

const RETREAT_SNAP: SnapCascade<'static> =
    SnapCascade::new(Vec3::new(200.0, 200.0, 500.0), &[150.0, 300.0, 500.0]);
const ORBIT_SNAP: SnapCascade<'static> =
    SnapCascade::new(Vec3::new(100.0, 100.0, 100.0), &[100.0, 200.0, 300.0]);

const ORBIT_ACCEPTANCE: f32 = 50.0;
/// Dot product above which the agent counts as inside the target's view cone (~45 degrees).
const VIEW_CONE_DOT: f32 = 0.707;

#[derive(Debug, Clone)]
pub struct StrafeTask {
    config: StrafeConfig,
    rng: SplitMix64,
    started_at: f32,
    current_goal: Option<Vec3>,
    last_move_time: f32,
    last_position: Vec3,
    moving: bool,
    clockwise: bool,
    last_direction_change: f32,
    adjusting: bool,
    moves_issued: u32,
    failure: Option<TaskFailure>,
}

impl StrafeTask {
    pub fn new(config: StrafeConfig) -> Self {
        Self {
            config,
            rng: SplitMix64::new(0),
            started_at: 0.0,
            current_goal: None,
            last_move_time: 0.0,
            last_position: Vec3::ZERO,
            moving: false,
            clockwise: true,
            last_direction_change: 0.0,
            adjusting: false,
            moves_issued: 0,
            failure: None,
        }
    }

    pub fn failure(&self) -> Option<TaskFailure> {
        self.failure
    }

    pub fn is_clockwise(&self) -> bool {
        self.clockwise
    }

    /// Orbit only: whether the last tick corrected distance rather than circling.
    pub fn is_adjusting_distance(&self) -> bool {
        self.adjusting
    }

    pub fn current_goal(&self) -> Option<Vec3> {
        self.current_goal
    }

    pub fn moves_issued(&self) -> u32 {
        self.moves_issued
    }

    fn fail(&mut self, failure: TaskFailure) -> TaskStatus {
        tracing::debug!(task = %STRAFE, reason = %failure, "task failed");
        self.failure = Some(failure);
        TaskStatus::Failed
    }

    fn fire_distance_allows(config: &RetreatConfig, facts: &FactStore) -> bool {
        if !config.use_fire_distance_condition {
            return true;
        }
        let fire_distance = facts.get(FIRE_DISTANCE);
        // Unset or invalid readings never block.
        fire_distance <= 0.0 || fire_distance <= config.fire_distance_threshold
    }

    /// Orbit target: the live actor, else a remembered location.
    fn orbit_target<W: CombatWorldMut>(world: &W, facts: &FactStore) -> Option<Vec3> {
        if let Some((_, position)) = resolve_target(world, facts) {
            return Some(position);
        }
        let last_known = facts.get(LAST_KNOWN_PLAYER_LOCATION);
        (!last_known.is_zero()).then_some(last_known)
    }

    fn issue_move<W: CombatWorldMut>(
        &mut self,
        world: &mut W,
        agent: W::Agent,
        goal: Vec3,
        acceptance: f32,
        now: f32,
    ) -> MoveResult {
        self.current_goal = Some(goal);
        self.last_move_time = now;
        self.moves_issued += 1;
        let result = world.request_move(agent, MoveRequest::new(goal, acceptance).allow_partial(true));
        self.moving = result == MoveResult::Accepted;
        result
    }

    fn tick_retreat<W: CombatWorldMut>(
        &mut self,
        config: &RetreatConfig,
        now: f32,
        agent: W::Agent,
        world: &mut W,
        facts: &mut FactStore,
        timers: &mut TaskTimers,
    ) -> TaskStatus {
        if now - self.started_at >= config.max_execution_time {
            return TaskStatus::Succeeded;
        }
        if !Self::fire_distance_allows(config, facts) {
            return TaskStatus::Succeeded;
        }
        let Some(position) = world.position(agent) else {
            return self.fail(TaskFailure::MissingDependency("agent position"));
        };
        let Some((_, target)) = resolve_target(world, facts) else {
            return self.fail(TaskFailure::NoTarget);
        };
        let distance = position.distance(target);
        if distance <= 0.0 {
            return self.fail(TaskFailure::NoTarget);
        }
        if distance >= config.retreat_target_distance {
            tracing::debug!(task = %STRAFE, distance, "safe distance reached");
            return TaskStatus::Succeeded;
        }

        if timers.is_pending(RETRY_MOVE) {
            return TaskStatus::Running;
        }
        let retry_due = timers.take_fired(RETRY_MOVE);

        let away = (position - target).flat().normalize_or_zero();
        let intensity = ((config.retreat_target_distance - distance)
            / config.retreat_target_distance)
            .clamp(0.1, 1.0);
        let step = (150.0 * intensity).max(50.0);
        let jitter = self.rng.next_f32_range(-15.0, 15.0);
        let mut desired = position + away.rotate_yaw_degrees(jitter) * step;
        if desired.is_zero() || position.distance(desired) < 10.0 {
            desired = position + away * 200.0;
        }

        let goal = match RETREAT_SNAP.snap(world.navigator(), desired, &mut self.rng) {
            Some(goal) => goal,
            None => {
                tracing::warn!(task = %STRAFE, "no navigable retreat point; using raw point");
                desired
            }
        };

        let moving_now = self.moving && world.is_moving(agent);
        let since_last_move = now - self.last_move_time;
        let move_distance = position.distance(goal);

        // Stalled: still flagged as moving but making no progress.
        if moving_now
            && since_last_move > 2.0
            && position.distance(self.last_position) < 1.0
            && move_distance > 50.0
        {
            self.moving = false;
        }
        self.last_position = position;

        let moving_now = self.moving && world.is_moving(agent);
        let goal_shifted = self
            .current_goal
            .map_or(true, |current| current.distance(goal) > 25.0);
        let should_move = move_distance >= 10.0
            && (retry_due || !moving_now || (since_last_move > 0.5 && goal_shifted));

        if should_move {
            // Short hops would otherwise land inside the acceptance radius and never move.
            let acceptance = (config.distance_tolerance * 0.8).min(move_distance * 0.5);
            let result = self.issue_move(world, agent, goal, acceptance, now);
            if result == MoveResult::Rejected {
                tracing::debug!(task = %STRAFE, backoff = config.retry_backoff, "retreat move rejected");
                timers.schedule_after(now, config.retry_backoff, RETRY_MOVE);
            }
        }
        TaskStatus::Running
    }

    fn tick_orbit<W: CombatWorldMut>(
        &mut self,
        config: &OrbitConfig,
        now: f32,
        agent: W::Agent,
        world: &mut W,
        facts: &mut FactStore,
    ) -> TaskStatus {
        if now - self.started_at >= config.max_execution_time {
            return TaskStatus::Succeeded;
        }
        let Some(position) = world.position(agent) else {
            return self.fail(TaskFailure::MissingDependency("agent position"));
        };
        let Some(target) = Self::orbit_target(world, facts) else {
            return self.fail(TaskFailure::NoTarget);
        };
        let distance = position.distance(target);

        if now - self.last_direction_change >= config.direction_change_interval {
            match config.pattern {
                StrafePattern::Random => self.clockwise = self.rng.next_bool(),
                StrafePattern::Adaptive if config.avoid_target_line_of_sight => {
                    let target_forward = facts
                        .get(TARGET_ACTOR)
                        .and_then(|actor| world.actor_forward(actor))
                        .unwrap_or(Vec3::ZERO);
                    if in_view_cone(position, target, target_forward) {
                        self.clockwise = !self.clockwise;
                    }
                }
                _ => {}
            }
            self.last_direction_change = now;
        }

        let to_target = (target - position).flat().normalize_or_zero();
        self.adjusting = (distance - config.optimal_distance).abs() > config.distance_tolerance;
        let desired = if self.adjusting {
            // Positive error closes in, negative backs off.
            let error = distance - config.optimal_distance;
            position + to_target * (error * 0.8)
        } else {
            let right = to_target.cross(Vec3::UP).normalize_or_zero();
            let direction = if self.clockwise { right } else { -right };
            let arc = (config.strafe_speed / 180.0) * core::f32::consts::PI * distance / 4.0;
            let stepped = position + direction * arc;
            // Pull the tangent point back onto the optimal circle so circling doesn't drift out.
            let radial = (stepped - target).flat().normalize_or_zero();
            if radial.is_zero() {
                stepped
            } else {
                target + radial * config.optimal_distance
            }
        };

        let Some(goal) = ORBIT_SNAP.snap(world.navigator(), desired, &mut self.rng) else {
            tracing::debug!(task = %STRAFE, "no navigable orbit point; flipping direction");
            self.clockwise = !self.clockwise;
            return TaskStatus::Running;
        };

        let moving_now = self.moving && world.is_moving(agent);
        let goal_shifted = self
            .current_goal
            .map_or(true, |current| current.distance(goal) > 100.0);
        if !moving_now || goal_shifted {
            self.issue_move(world, agent, goal, ORBIT_ACCEPTANCE, now);
        }
        TaskStatus::Running
    }
}

fn in_view_cone(position: Vec3, target: Vec3, target_forward: Vec3) -> bool {
    if target_forward.is_zero() {
        return false;
    }
    let to_position = (position - target).normalize_or_zero();
    target_forward.normalize_or_zero().dot(to_position) > VIEW_CONE_DOT
}

impl<W> Task<W> for StrafeTask
where
    W: CombatWorldMut + 'static,
{
    fn kind(&self) -> TaskKind {
        STRAFE
    }

    fn start(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        facts: &mut FactStore,
        _timers: &mut TaskTimers,
    ) -> TaskStatus {
        if world.position(agent).is_none() {
            return self.fail(TaskFailure::MissingDependency("agent position"));
        }
        let now = ctx.time_seconds;
        self.rng = ctx.rng_for_tick(agent, STREAM_STRAFE);
        self.started_at = now;
        self.last_direction_change = now;

        let speed = match &self.config.mode {
            StrafeMode::Retreat(config) => {
                if !Self::fire_distance_allows(config, facts) {
                    return self.fail(TaskFailure::OutOfRange {
                        distance: facts.get(FIRE_DISTANCE),
                    });
                }
                if resolve_target(world, facts).is_none() {
                    return self.fail(TaskFailure::NoTarget);
                }
                config.speed
            }
            StrafeMode::Orbit(config) => {
                if Self::orbit_target(world, facts).is_none() {
                    return self.fail(TaskFailure::NoTarget);
                }
                self.clockwise = match config.pattern {
                    StrafePattern::Clockwise => true,
                    StrafePattern::CounterClockwise => false,
                    StrafePattern::Random | StrafePattern::Adaptive => self.rng.next_bool(),
                };
                config.speed
            }
        };
        world.set_move_speed(agent, speed);
        TaskStatus::Running
    }

    fn tick(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        facts: &mut FactStore,
        timers: &mut TaskTimers,
    ) -> TaskStatus {
        let now = ctx.time_seconds;
        match self.config.mode.clone() {
            StrafeMode::Retreat(config) => {
                self.tick_retreat(&config, now, agent, world, facts, timers)
            }
            StrafeMode::Orbit(config) => self.tick_orbit(&config, now, agent, world, facts),
        }
    }

    fn finish(
        &mut self,
        _ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        _facts: &mut FactStore,
        result: TaskResult,
    ) {
        world.stop_movement(agent);
        self.moving = false;
        tracing::debug!(task = %STRAFE, result = result.name(), moves = self.moves_issued, "finished");
    }
}
