//! Walk to the last known location, look around, then check a few nearby points.

use warden_core::facts::{IS_ALERT, IS_IN_COMBAT, LAST_KNOWN_PLAYER_LOCATION};
use warden_core::{
    FactStore, Task, TaskKind, TaskResult, TaskStatus, TaskTimers, TickContext, Vec3,
};
use warden_nav::{MoveRequest, MoveResult, SnapCascade};

use super::{reached, resolve_target, waypoints, INVESTIGATE, STREAM_INVESTIGATE};
use crate::{CombatWorldMut, InvestigateConfig, TaskFailure};

const POINT_SNAP: SnapCascade<'static> =
    SnapCascade::new(Vec3::new(200.0, 200.0, 200.0), &[300.0]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvestigatePhase {
    MovingToLastKnownLocation,
    InvestigatingAtLocation,
    MovingToSearchPoint,
    SearchingAtPoint,
    Completed,
}

#[derive(Debug, Clone)]
pub struct InvestigateTask {
    config: InvestigateConfig,
    phase: InvestigatePhase,
    destination: Vec3,
    search_points: Vec<Vec3>,
    index: usize,
    started_at: f32,
    phase_started_at: f32,
    combat_cleared: bool,
    failure: Option<TaskFailure>,
}

impl InvestigateTask {
    pub fn new(config: InvestigateConfig) -> Self {
        Self {
            config,
            phase: InvestigatePhase::MovingToLastKnownLocation,
            destination: Vec3::ZERO,
            search_points: Vec::new(),
            index: 0,
            started_at: 0.0,
            phase_started_at: 0.0,
            combat_cleared: false,
            failure: None,
        }
    }

    pub fn phase(&self) -> InvestigatePhase {
        self.phase
    }

    pub fn destination(&self) -> Vec3 {
        self.destination
    }

    pub fn search_points(&self) -> &[Vec3] {
        &self.search_points
    }

    pub fn failure(&self) -> Option<TaskFailure> {
        self.failure
    }

    fn fail(&mut self, failure: TaskFailure) -> TaskStatus {
        tracing::debug!(task = %INVESTIGATE, reason = %failure, "task failed");
        self.failure = Some(failure);
        TaskStatus::Failed
    }

    fn enter(&mut self, phase: InvestigatePhase, now: f32) {
        tracing::trace!(task = %INVESTIGATE, from = ?self.phase, to = ?phase, "phase");
        self.phase = phase;
        self.phase_started_at = now;
    }

    fn head_for_current_point<W: CombatWorldMut>(
        &mut self,
        now: f32,
        agent: W::Agent,
        world: &mut W,
    ) {
        while let Some(&point) = self.search_points.get(self.index) {
            let request = MoveRequest::new(point, self.config.acceptance_radius).allow_partial(true);
            match world.request_move(agent, request) {
                MoveResult::Accepted => {
                    self.enter(InvestigatePhase::MovingToSearchPoint, now);
                    return;
                }
                MoveResult::AlreadyAtGoal => {
                    self.enter(InvestigatePhase::SearchingAtPoint, now);
                    return;
                }
                MoveResult::Rejected => self.index += 1,
            }
        }
        self.enter(InvestigatePhase::Completed, now);
    }

    fn clear_alert(facts: &mut FactStore) {
        facts.set(IS_ALERT, false);
        facts.set(IS_IN_COMBAT, false);
    }
}

impl<W> Task<W> for InvestigateTask
where
    W: CombatWorldMut + 'static,
{
    fn kind(&self) -> TaskKind {
        INVESTIGATE
    }

    fn start(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        facts: &mut FactStore,
        _timers: &mut TaskTimers,
    ) -> TaskStatus {
        let Some(position) = world.position(agent) else {
            return self.fail(TaskFailure::MissingDependency("agent position"));
        };
        if resolve_target(world, facts).is_some() {
            return self.fail(TaskFailure::TargetPresent);
        }
        let last_known = facts.get(LAST_KNOWN_PLAYER_LOCATION);
        if last_known.is_zero() {
            return self.fail(TaskFailure::MissingDependency("last known location"));
        }

        let now = ctx.time_seconds;
        self.started_at = now;
        facts.set(IS_ALERT, true);

        let mut rng = ctx.rng_for_tick(agent, STREAM_INVESTIGATE);
        let navigator = world.navigator();
        self.destination = navigator
            .project_to_navigable(last_known, POINT_SNAP.extent)
            .unwrap_or(last_known);
        self.search_points = waypoints::circular(
            self.destination,
            self.config.search_radius,
            self.config.search_point_count,
        )
        .into_iter()
        .filter_map(|p| POINT_SNAP.snap(navigator, p, &mut rng))
        .collect();

        world.set_move_speed(agent, self.config.speed);
        if reached(position, self.destination, self.config.acceptance_radius) {
            self.enter(InvestigatePhase::InvestigatingAtLocation, now);
            return TaskStatus::Running;
        }
        let request =
            MoveRequest::new(self.destination, self.config.acceptance_radius).allow_partial(true);
        match world.request_move(agent, request) {
            MoveResult::Accepted => self.enter(InvestigatePhase::MovingToLastKnownLocation, now),
            MoveResult::AlreadyAtGoal => {
                self.enter(InvestigatePhase::InvestigatingAtLocation, now)
            }
            MoveResult::Rejected => {
                tracing::debug!(task = %INVESTIGATE, "last known location unreachable");
                self.enter(InvestigatePhase::Completed, now)
            }
        }
        tracing::debug!(
            task = %INVESTIGATE,
            points = self.search_points.len(),
            phase = ?self.phase,
            "investigation started"
        );
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
        let now = ctx.time_seconds;
        let elapsed = now - self.started_at;

        if !self.combat_cleared && elapsed >= self.config.combat_clear_time {
            self.combat_cleared = true;
            facts.set(IS_IN_COMBAT, false);
        }
        if elapsed >= self.config.max_time {
            if self.config.clear_alert_on_failure {
                Self::clear_alert(facts);
            }
            return self.fail(TaskFailure::Timeout { seconds: elapsed });
        }
        if self.config.stop_on_target_found && resolve_target(world, facts).is_some() {
            tracing::debug!(task = %INVESTIGATE, "target found");
            return TaskStatus::Succeeded;
        }
        let Some(position) = world.position(agent) else {
            return self.fail(TaskFailure::MissingDependency("agent position"));
        };
        let in_phase = now - self.phase_started_at;

        match self.phase {
            InvestigatePhase::MovingToLastKnownLocation => {
                if reached(position, self.destination, self.config.acceptance_radius)
                    || !world.is_moving(agent)
                {
                    self.enter(InvestigatePhase::InvestigatingAtLocation, now);
                }
            }
            InvestigatePhase::InvestigatingAtLocation => {
                if in_phase >= self.config.investigation_duration {
                    self.index = 0;
                    self.head_for_current_point(now, agent, world);
                }
            }
            InvestigatePhase::MovingToSearchPoint => {
                let arrived = self.search_points.get(self.index).map_or(true, |&p| {
                    reached(position, p, self.config.acceptance_radius)
                });
                if arrived || !world.is_moving(agent) {
                    self.enter(InvestigatePhase::SearchingAtPoint, now);
                }
            }
            InvestigatePhase::SearchingAtPoint => {
                if in_phase >= self.config.wait_time {
                    self.index += 1;
                    self.head_for_current_point(now, agent, world);
                }
            }
            InvestigatePhase::Completed => {
                if self.config.clear_alert_on_failure {
                    Self::clear_alert(facts);
                }
                return TaskStatus::Succeeded;
            }
        }
        TaskStatus::Running
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
        tracing::debug!(task = %INVESTIGATE, result = result.name(), phase = ?self.phase, "finished");
    }
}
