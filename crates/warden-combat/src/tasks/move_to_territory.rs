//! Fall back to friendly ground: pick a destination, travel, hold there for a while.

use warden_core::facts::{CUSTOM_LOCATION, IS_ALERT, IS_IN_COMBAT};
use warden_core::{
    FactStore, Task, TaskKind, TaskResult, TaskStatus, TaskTimers, TickContext, Vec3,
};
use warden_nav::{MoveRequest, MoveResult, NavigationOracle, SnapCascade};

use super::{reached, resolve_target, MOVE_TO_TERRITORY, STREAM_TERRITORY};
use crate::{CombatWorldMut, DestinationKind, MoveToTerritoryConfig, TaskFailure};

const DESTINATION_SNAP: SnapCascade<'static> =
    SnapCascade::new(Vec3::new(500.0, 500.0, 1000.0), &[1000.0]);
const PROBE_EXTENT: Vec3 = Vec3::new(200.0, 200.0, 200.0);
const PROBE_STEP: f32 = 500.0;
const PROBE_MAX: f32 = 3000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveToTerritoryPhase {
    FindingTerritory,
    MovingToTerritory,
    WaitingAtTerritory,
    Completed,
}

#[derive(Debug, Clone)]
pub struct MoveToTerritoryTask {
    config: MoveToTerritoryConfig,
    phase: MoveToTerritoryPhase,
    destination: Option<Vec3>,
    started_at: f32,
    wait_started_at: f32,
    failure: Option<TaskFailure>,
}

impl MoveToTerritoryTask {
    pub fn new(config: MoveToTerritoryConfig) -> Self {
        Self {
            config,
            phase: MoveToTerritoryPhase::FindingTerritory,
            destination: None,
            started_at: 0.0,
            wait_started_at: 0.0,
            failure: None,
        }
    }

    pub fn phase(&self) -> MoveToTerritoryPhase {
        self.phase
    }

    pub fn destination(&self) -> Option<Vec3> {
        self.destination
    }

    pub fn failure(&self) -> Option<TaskFailure> {
        self.failure
    }

    fn fail(&mut self, failure: TaskFailure) -> TaskStatus {
        tracing::debug!(task = %MOVE_TO_TERRITORY, reason = %failure, "task failed");
        self.failure = Some(failure);
        TaskStatus::Failed
    }

    fn combat_blocks(&self, facts: &FactStore) -> bool {
        self.config.abort_on_combat
            && !self.config.allow_combat_while_moving
            && facts.get(IS_IN_COMBAT)
    }

    fn candidates<W: CombatWorldMut>(&self, world: &W, agent: W::Agent, facts: &FactStore) -> Vec<Vec3> {
        let friendly: Vec<Vec3> = world.territories().friendly().map(|t| t.position).collect();
        if !friendly.is_empty() {
            return friendly;
        }
        match self.config.destination {
            DestinationKind::NearestAlly => world.ally_positions(agent),
            DestinationKind::CustomLocation => {
                let custom = facts.get(CUSTOM_LOCATION);
                if custom.is_zero() {
                    Vec::new()
                } else {
                    vec![custom]
                }
            }
            kind => world.landmarks(kind),
        }
    }

    /// Best-scoring candidate within the search radius and clear of the target.
    fn find_destination<W: CombatWorldMut>(
        &self,
        world: &W,
        agent: W::Agent,
        facts: &FactStore,
        position: Vec3,
    ) -> Option<Vec3> {
        let radius = self.config.max_search_radius;
        let target = resolve_target(world, facts).map(|(_, p)| p);

        let best = self
            .candidates(world, agent, facts)
            .into_iter()
            .filter(|c| c.distance(position) <= radius)
            .filter(|c| target.map_or(true, |t| c.distance(t) >= self.config.min_safe_distance))
            .map(|c| (self.score(c, position, target), c))
            .fold(None, |best: Option<(f32, Vec3)>, (score, c)| match best {
                Some((top, _)) if top >= score => best,
                _ => Some((score, c)),
            })
            .map(|(_, c)| c);

        match best {
            Some(found) => Some(found),
            None if self.config.destination == DestinationKind::SpawnPoint => {
                Some(world.spawn_point(agent).unwrap_or(position))
            }
            None => None,
        }
    }

    fn score(&self, candidate: Vec3, position: Vec3, target: Option<Vec3>) -> f32 {
        let radius = self.config.max_search_radius;
        let distance = candidate.distance(position);
        let mut score = if self.config.prefer_closest {
            (radius - distance) / radius * 100.0
        } else {
            distance / radius * 100.0
        };
        if self.config.prefer_farthest_from_target {
            if let Some(t) = target {
                score += candidate.distance(t) / radius * 200.0;
            }
        }
        score
    }

    fn probe_along(oracle: &dyn NavigationOracle, from: Vec3, toward: Vec3) -> Option<Vec3> {
        let direction = (toward - from).normalize_or_zero();
        if direction.is_zero() {
            return None;
        }
        let steps = (PROBE_MAX / PROBE_STEP) as u32;
        (1..=steps).find_map(|i| {
            oracle.project_to_navigable(from + direction * (PROBE_STEP * i as f32), PROBE_EXTENT)
        })
    }

    fn arrive(&mut self, now: f32, facts: &mut FactStore) {
        self.phase = MoveToTerritoryPhase::WaitingAtTerritory;
        self.wait_started_at = now;
        if self.config.clear_alert_on_arrival {
            facts.set(IS_ALERT, false);
        }
        tracing::debug!(task = %MOVE_TO_TERRITORY, "arrived");
    }
}

impl<W> Task<W> for MoveToTerritoryTask
where
    W: CombatWorldMut + 'static,
{
    fn kind(&self) -> TaskKind {
        MOVE_TO_TERRITORY
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
        if self.combat_blocks(facts) {
            return self.fail(TaskFailure::AbortedByCombat);
        }
        let now = ctx.time_seconds;
        self.started_at = now;
        self.phase = MoveToTerritoryPhase::FindingTerritory;

        let Some(desired) = self.find_destination(world, agent, facts, position) else {
            tracing::warn!(task = %MOVE_TO_TERRITORY, kind = ?self.config.destination, "no destination found");
            self.phase = MoveToTerritoryPhase::Completed;
            return TaskStatus::Running;
        };

        let mut rng = ctx.rng_for_tick(agent, STREAM_TERRITORY);
        let navigator = world.navigator();
        let snapped = DESTINATION_SNAP
            .snap(navigator, desired, &mut rng)
            .or_else(|| Self::probe_along(navigator, position, desired));
        let Some(destination) = snapped else {
            tracing::warn!(task = %MOVE_TO_TERRITORY, "destination not navigable");
            self.phase = MoveToTerritoryPhase::Completed;
            return TaskStatus::Running;
        };
        self.destination = Some(destination);

        world.set_move_speed(agent, self.config.speed);
        match world.request_move(agent, MoveRequest::new(destination, self.config.acceptance_radius)) {
            MoveResult::Accepted => self.phase = MoveToTerritoryPhase::MovingToTerritory,
            MoveResult::AlreadyAtGoal => self.arrive(now, facts),
            MoveResult::Rejected => {
                tracing::warn!(task = %MOVE_TO_TERRITORY, "move rejected");
                self.phase = MoveToTerritoryPhase::Completed;
            }
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
        let now = ctx.time_seconds;
        if self.combat_blocks(facts) {
            return self.fail(TaskFailure::AbortedByCombat);
        }
        let elapsed = now - self.started_at;
        if elapsed >= self.config.max_move_time {
            return self.fail(TaskFailure::Timeout { seconds: elapsed });
        }

        match self.phase {
            MoveToTerritoryPhase::FindingTerritory => self.phase = MoveToTerritoryPhase::Completed,
            MoveToTerritoryPhase::MovingToTerritory => {
                let Some(position) = world.position(agent) else {
                    return self.fail(TaskFailure::MissingDependency("agent position"));
                };
                let arrived = self
                    .destination
                    .map_or(true, |d| reached(position, d, self.config.acceptance_radius));
                if arrived || !world.is_moving(agent) {
                    self.arrive(now, facts);
                }
            }
            MoveToTerritoryPhase::WaitingAtTerritory => {
                if now - self.wait_started_at >= self.config.wait_time {
                    self.phase = MoveToTerritoryPhase::Completed;
                }
            }
            MoveToTerritoryPhase::Completed => return TaskStatus::Succeeded,
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
        tracing::debug!(task = %MOVE_TO_TERRITORY, result = result.name(), phase = ?self.phase, "finished");
    }
}
