//! Sweep a generated set of points around the last known location.

use warden_core::facts::{IS_ALERT, LAST_KNOWN_PLAYER_LOCATION};
use warden_core::{
    shuffle, FactStore, Task, TaskKind, TaskResult, TaskStatus, TaskTimers,
    TickContext, Vec3,
};
use warden_nav::{MoveRequest, MoveResult, SnapCascade};

use super::{reached, resolve_target, waypoints, SEARCH_PATTERN, STREAM_SEARCH};
use crate::{CombatWorldMut, SearchPatternConfig, TaskFailure};

const POINT_SNAP: SnapCascade<'static> =
    SnapCascade::new(Vec3::new(200.0, 200.0, 200.0), &[300.0]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    MovingToSearchPoint,
    SearchingAtPoint,
    ReturningToStart,
    Completed,
}

#[derive(Debug, Clone)]
pub struct SearchPatternTask {
    config: SearchPatternConfig,
    phase: SearchPhase,
    points: Vec<Vec3>,
    index: usize,
    start_position: Vec3,
    center: Vec3,
    started_at: f32,
    wait_started_at: f32,
    visited: usize,
    skipped: usize,
    target_found: bool,
    failure: Option<TaskFailure>,
}

impl SearchPatternTask {
    pub fn new(config: SearchPatternConfig) -> Self {
        Self {
            config,
            phase: SearchPhase::MovingToSearchPoint,
            points: Vec::new(),
            index: 0,
            start_position: Vec3::ZERO,
            center: Vec3::ZERO,
            started_at: 0.0,
            wait_started_at: 0.0,
            visited: 0,
            skipped: 0,
            target_found: false,
            failure: None,
        }
    }

    pub fn phase(&self) -> SearchPhase {
        self.phase
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Points where the agent arrived and waited.
    pub fn visited(&self) -> usize {
        self.visited
    }

    /// Points dropped because the move request was rejected.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn failure(&self) -> Option<TaskFailure> {
        self.failure
    }

    fn fail(&mut self, failure: TaskFailure) -> TaskStatus {
        tracing::debug!(task = %SEARCH_PATTERN, reason = %failure, "task failed");
        self.failure = Some(failure);
        TaskStatus::Failed
    }

    fn give_up(&mut self, facts: &mut FactStore, failure: TaskFailure) -> TaskStatus {
        if self.config.clear_alert_on_failure {
            facts.set(IS_ALERT, false);
        }
        self.fail(failure)
    }

    /// Issue a move to the current point, skipping any the world rejects.
    fn head_for_current_point<W: CombatWorldMut>(
        &mut self,
        now: f32,
        agent: W::Agent,
        world: &mut W,
    ) {
        while let Some(&point) = self.points.get(self.index) {
            let request = MoveRequest::new(point, self.config.acceptance_radius).allow_partial(true);
            match world.request_move(agent, request) {
                MoveResult::Accepted => {
                    self.phase = SearchPhase::MovingToSearchPoint;
                    return;
                }
                MoveResult::AlreadyAtGoal => {
                    self.arrive(now);
                    return;
                }
                MoveResult::Rejected => {
                    tracing::debug!(task = %SEARCH_PATTERN, index = self.index, "search point unreachable; skipping");
                    self.skipped += 1;
                    self.index += 1;
                }
            }
        }
        self.after_last_point(agent, world);
    }

    fn arrive(&mut self, now: f32) {
        self.phase = SearchPhase::SearchingAtPoint;
        self.wait_started_at = now;
        self.visited += 1;
    }

    fn after_last_point<W: CombatWorldMut>(&mut self, agent: W::Agent, world: &mut W) {
        self.phase = SearchPhase::Completed;
        if self.config.return_to_start {
            let request = MoveRequest::new(self.start_position, self.config.acceptance_radius)
                .allow_partial(true);
            if world.request_move(agent, request) == MoveResult::Accepted {
                self.phase = SearchPhase::ReturningToStart;
            }
        }
    }
}

impl<W> Task<W> for SearchPatternTask
where
    W: CombatWorldMut + 'static,
{
    fn kind(&self) -> TaskKind {
        SEARCH_PATTERN
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
        self.center = if last_known.is_zero() { position } else { last_known };
        self.start_position = position;
        self.started_at = ctx.time_seconds;
        facts.set(IS_ALERT, true);

        let mut rng = ctx.rng_for_tick(agent, STREAM_SEARCH);
        let raw = waypoints::generate(&self.config, self.center, &mut rng);
        self.points = raw
            .into_iter()
            .map(|p| POINT_SNAP.snap(world.navigator(), p, &mut rng).unwrap_or(p))
            .collect();
        if self.config.randomize_order {
            shuffle(&mut rng, &mut self.points);
        }
        tracing::debug!(
            task = %SEARCH_PATTERN,
            pattern = ?self.config.pattern,
            points = self.points.len(),
            "search started"
        );

        world.set_move_speed(agent, self.config.speed);
        self.head_for_current_point(ctx.time_seconds, agent, world);
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
        if elapsed >= self.config.max_search_time {
            return self.give_up(facts, TaskFailure::Timeout { seconds: elapsed });
        }
        if self.config.stop_on_target_found && resolve_target(world, facts).is_some() {
            self.target_found = true;
            tracing::debug!(task = %SEARCH_PATTERN, "target found");
            return TaskStatus::Succeeded;
        }
        let Some(position) = world.position(agent) else {
            return self.fail(TaskFailure::MissingDependency("agent position"));
        };

        match self.phase {
            SearchPhase::MovingToSearchPoint => {
                let arrived = self
                    .points
                    .get(self.index)
                    .map_or(true, |&p| reached(position, p, self.config.acceptance_radius));
                if arrived || !world.is_moving(agent) {
                    self.arrive(now);
                }
            }
            SearchPhase::SearchingAtPoint => {
                if now - self.wait_started_at >= self.config.wait_time {
                    self.index += 1;
                    self.head_for_current_point(now, agent, world);
                }
            }
            SearchPhase::ReturningToStart => {
                if reached(position, self.start_position, self.config.acceptance_radius)
                    || !world.is_moving(agent)
                {
                    self.phase = SearchPhase::Completed;
                }
            }
            SearchPhase::Completed => {
                if self.target_found {
                    return TaskStatus::Succeeded;
                }
                return self.give_up(facts, TaskFailure::NothingFound);
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
        tracing::debug!(
            task = %SEARCH_PATTERN,
            result = result.name(),
            visited = self.visited,
            skipped = self.skipped,
            "finished"
        );
    }
}
