//! Per-agent orchestrator.
//!
//! The controller owns the fact store, the target memory and the combat mode controller, takes
//! perception and damage events, and is the only place that starts or stops tasks. One
//! [`AgentController::tick`] runs, in order: timed mode events, memory upkeep, target facts,
//! engagement hysteresis, the burst duty cycle, task selection, and finally the active task.

use warden_core::facts::{
    FIRE_DISTANCE, IS_ALERT, LAST_KNOWN_PLAYER_LOCATION, SELF_ACTOR, TARGET_ACTOR,
    WANTS_BURST_FIRE,
};
use warden_core::{
    angle_between_degrees, ActorId, AgentId, FactKind, FactStore, FinishedTask, Task, TaskKind,
    TaskResult, TaskRuntime, TickContext,
};
use warden_tools::TraceEvent;

use crate::tasks::{
    self, InvestigateTask, LookAtTask, MoveToTerritoryTask, SearchPatternTask, StartFireTask,
    StrafeTask,
};
use crate::{
    AnimationCue, ArchetypeConfig, CombatMode, CombatModeController, CombatWorldMut, ModeChange,
    TargetMemory, TerritoryId,
};

/// `FireDistance` while there is no target to measure against.
pub const NO_TARGET_DISTANCE: f32 = 9999.0;

/// Progress through the alert fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertStep {
    Investigate,
    Search,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Retreat {
    Ready,
    Running,
    Done,
}

pub struct AgentController<W>
where
    W: CombatWorldMut + 'static,
{
    agent: W::Agent,
    self_actor: Option<ActorId>,
    config: ArchetypeConfig,
    facts: FactStore,
    memory: TargetMemory,
    mode: CombatModeController,
    runtime: TaskRuntime<W>,
    possessed: bool,
    alert_step: AlertStep,
    return_home_pending: bool,
    retreat: Retreat,
    claimed_territory: Option<TerritoryId>,
    notified_mode: CombatMode,
    /// Fact revision already covered by `fact` trace events.
    traced_revision: u64,
}

impl<W> AgentController<W>
where
    W: CombatWorldMut + 'static,
{
    pub fn new(agent: W::Agent, config: ArchetypeConfig) -> Self {
        Self {
            agent,
            self_actor: None,
            memory: TargetMemory::new(config.combat.target_memory_duration),
            mode: CombatModeController::new(config.combat.clone()),
            config,
            facts: FactStore::new(),
            runtime: TaskRuntime::default(),
            possessed: false,
            alert_step: AlertStep::Investigate,
            return_home_pending: false,
            retreat: Retreat::Ready,
            claimed_territory: None,
            notified_mode: CombatMode::Patrolling,
            traced_revision: 0,
        }
    }

    pub fn agent(&self) -> W::Agent {
        self.agent
    }

    pub fn config(&self) -> &ArchetypeConfig {
        &self.config
    }

    pub fn facts(&self) -> &FactStore {
        &self.facts
    }

    /// Direct access for tooling attachments and scripted facts such as `CustomLocation`.
    pub fn facts_mut(&mut self) -> &mut FactStore {
        &mut self.facts
    }

    pub fn memory(&self) -> &TargetMemory {
        &self.memory
    }

    pub fn mode(&self) -> CombatMode {
        self.mode.mode()
    }

    pub fn mode_controller(&self) -> &CombatModeController {
        &self.mode
    }

    pub fn current_task(&self) -> Option<TaskKind> {
        self.runtime.current_kind()
    }

    pub fn task_generation(&self) -> u64 {
        self.runtime.generation()
    }

    pub fn alert_step(&self) -> AlertStep {
        self.alert_step
    }

    pub fn claimed_territory(&self) -> Option<TerritoryId> {
        self.claimed_territory
    }

    pub fn is_possessed(&self) -> bool {
        self.possessed
    }

    /// Take control of the body `self_actor`: declare the schema and reset every flag.
    pub fn possess(&mut self, self_actor: ActorId) {
        self.facts.declare_schema();
        self.facts.set(SELF_ACTOR, Some(self_actor));
        self.facts.set(TARGET_ACTOR, None);
        self.facts.set(FIRE_DISTANCE, 0.0);
        self.facts.set(WANTS_BURST_FIRE, false);
        self.mode.clear_all();
        self.mode.sync_facts(&mut self.facts);
        self.memory.clear();
        self.self_actor = Some(self_actor);
        self.possessed = true;
        self.alert_step = AlertStep::Investigate;
        self.return_home_pending = false;
        self.retreat = Retreat::Ready;
        self.notified_mode = CombatMode::Patrolling;
        self.traced_revision = self.facts.revision();
        tracing::info!(agent = self.agent.stable_id(), actor = %self_actor, "possessed");
    }

    /// Release the body. The active task is aborted and all target knowledge dropped.
    pub fn unpossess(&mut self, ctx: &TickContext, world: &mut W) {
        if !self.possessed {
            return;
        }
        if let Some(kind) = self
            .runtime
            .abort_current(ctx, self.agent, world, &mut self.facts)
        {
            self.trace(ctx, "task_finish", tasks::code(kind), 2);
        }
        if self.mode.is_burst_firing() {
            world.stop_fire(self.agent);
        }
        self.memory.clear();
        self.mode.clear_all();
        self.claimed_territory = None;
        self.possessed = false;
        self.facts.set(TARGET_ACTOR, None);
        self.facts.set(SELF_ACTOR, None);
        self.mode.sync_facts(&mut self.facts);
        tracing::info!(agent = self.agent.stable_id(), "unpossessed");
    }

    /// Perception gateway input: `actor` was sensed (`success`) or lost.
    pub fn on_target_sensed(
        &mut self,
        ctx: &TickContext,
        world: &W,
        actor: ActorId,
        success: bool,
    ) {
        if !self.possessed || self.self_actor == Some(actor) {
            return;
        }
        let now = ctx.time_seconds;
        let sensed_at = world.actor_position(actor);
        if success && sensed_at.is_none() {
            return;
        }
        self.memory
            .on_target_sensed(actor, sensed_at.unwrap_or_default(), success, now);
        self.trace(ctx, "sensed", actor.raw(), success as u64);
        tracing::debug!(agent = self.agent.stable_id(), actor = %actor, success, "target sensed");

        if !success {
            let was_target = self.memory.record().is_some_and(|r| r.target == actor);
            if was_target {
                self.facts.set(FIRE_DISTANCE, NO_TARGET_DISTANCE);
                if !self.mode.is_in_combat() {
                    self.facts.set(TARGET_ACTOR, None);
                }
            }
            return;
        }

        if self.mode.mode() == CombatMode::Alert {
            self.alert_step = AlertStep::Investigate;
        }

        self.facts.set(TARGET_ACTOR, Some(actor));
        self.facts
            .set(LAST_KNOWN_PLAYER_LOCATION, self.memory.last_known_location());
        let distance = match (world.position(self.agent), sensed_at) {
            (Some(own), Some(theirs)) => own.distance(theirs),
            _ => NO_TARGET_DISTANCE,
        };
        self.facts.set(FIRE_DISTANCE, distance);
        if let Some(change) = self.mode.on_sighting(actor, distance, now) {
            self.apply_change(ctx, change);
        }
        self.mode.sync_facts(&mut self.facts);
    }

    /// Damage received from `source`. Enters combat within the same call.
    pub fn on_damage(&mut self, ctx: &TickContext, world: &W, source: ActorId) {
        if !self.possessed || self.self_actor == Some(source) {
            return;
        }
        let now = ctx.time_seconds;
        let alive = world.is_alive(source);
        self.trace(ctx, "damage", source.raw(), alive as u64);

        let Some(change) = self.mode.on_damage(source, alive) else {
            return;
        };
        self.apply_change(ctx, change);
        if let Some(position) = world.actor_position(source) {
            self.memory.track(source, position, now);
            self.facts
                .set(LAST_KNOWN_PLAYER_LOCATION, self.memory.last_known_location());
        }
        self.facts.set(TARGET_ACTOR, self.mode.target());
        self.mode.sync_facts(&mut self.facts);
    }

    /// Begin a burst and pull the trigger. `false` while firing or cooling down.
    pub fn start_burst_fire(&mut self, ctx: &TickContext, world: &mut W) -> bool {
        if !self.mode.start_burst(ctx.time_seconds) {
            return false;
        }
        world.start_fire(self.agent);
        self.apply_change(ctx, ModeChange::BurstStarted);
        self.mode.sync_facts(&mut self.facts);
        true
    }

    pub fn stop_burst_fire(&mut self, ctx: &TickContext, world: &mut W) -> bool {
        if !self.mode.stop_burst(ctx.time_seconds) {
            return false;
        }
        world.stop_fire(self.agent);
        self.apply_change(ctx, ModeChange::BurstStopped);
        self.mode.sync_facts(&mut self.facts);
        true
    }

    pub fn tick(&mut self, ctx: &TickContext, world: &mut W) {
        if !self.possessed {
            return;
        }
        let now = ctx.time_seconds;

        for change in self.mode.poll(now) {
            if change == ModeChange::BurstStopped {
                world.stop_fire(self.agent);
            }
            self.apply_change(ctx, change);
        }

        self.maintain_memory(ctx, world);
        let target_distance = self.publish_target(world, now);
        self.run_hysteresis(ctx, world, target_distance);
        self.mode.sync_facts(&mut self.facts);
        self.run_burst_cycle(ctx, world);

        self.select_task(ctx, world, target_distance);
        self.drain_finished(ctx);

        if self
            .runtime
            .tick(ctx, self.agent, world, &mut self.facts)
            .is_some()
        {
            self.drain_finished(ctx);
        }

        // A task that cleared the alert flag ends the alert.
        if self.mode.mode() == CombatMode::Alert && !self.facts.get(IS_ALERT) {
            let change = self.mode.enter_patrol(now);
            self.apply_change(ctx, change);
        }
        self.mode.sync_facts(&mut self.facts);

        self.notify_mode(world);
        self.trace_fact_changes(ctx);
    }

    fn maintain_memory(&mut self, ctx: &TickContext, world: &mut W) {
        let now = ctx.time_seconds;
        if let Some(record) = self.memory.record().copied() {
            match world.actor_position(record.target) {
                Some(position) if world.is_alive(record.target) => {
                    self.memory.refresh(position, now)
                }
                _ => {
                    tracing::debug!(agent = self.agent.stable_id(), target = %record.target, "target gone");
                    self.memory.forget_target();
                    if self.mode.is_in_combat() {
                        self.leave_combat(ctx, world);
                    }
                }
            }
        }
        if let Some(forgotten) = self.memory.expire(now) {
            tracing::debug!(agent = self.agent.stable_id(), target = %forgotten, "target memory expired");
            if self.mode.is_in_combat() {
                self.leave_combat(ctx, world);
            }
        }
    }

    /// Write `TargetActor`, `LastKnownPlayerLocation` and `FireDistance`. Returns the distance
    /// to the published target.
    fn publish_target(&mut self, world: &W, now: f32) -> Option<f32> {
        let target = self
            .memory
            .current_target(now)
            .filter(|_| self.memory.is_visible() || self.mode.is_in_combat());
        self.facts.set(TARGET_ACTOR, target);

        let last_known = self.memory.last_known_location();
        if !last_known.is_zero() {
            self.facts.set(LAST_KNOWN_PLAYER_LOCATION, last_known);
        }

        let distance = target
            .and_then(|t| world.actor_position(t))
            .zip(world.position(self.agent))
            .map(|(theirs, own)| own.distance(theirs));
        self.facts
            .set(FIRE_DISTANCE, distance.unwrap_or(NO_TARGET_DISTANCE));
        distance
    }

    fn run_hysteresis(&mut self, ctx: &TickContext, world: &mut W, distance: Option<f32>) {
        let now = ctx.time_seconds;
        if self.memory.is_visible() {
            if let (Some(target), Some(d)) = (self.memory.current_target(now), distance) {
                if let Some(change) = self.mode.on_sighting(target, d, now) {
                    self.apply_change(ctx, change);
                }
            }
        }
        if self.mode.check_disengage(distance, now) {
            tracing::info!(
                agent = self.agent.stable_id(),
                distance = distance.unwrap_or(NO_TARGET_DISTANCE),
                "target beyond disengagement distance"
            );
            self.memory.forget_target();
            self.facts.set(TARGET_ACTOR, None);
            self.facts.set(FIRE_DISTANCE, NO_TARGET_DISTANCE);
            self.leave_combat(ctx, world);
        }
    }

    fn leave_combat(&mut self, ctx: &TickContext, world: &mut W) {
        if self.mode.is_burst_firing() {
            world.stop_fire(self.agent);
            self.apply_change(ctx, ModeChange::BurstStopped);
        }
        let change = self.mode.enter_alert(ctx.time_seconds);
        self.apply_change(ctx, change);
    }

    fn run_burst_cycle(&mut self, ctx: &TickContext, world: &mut W) {
        let wants = self.facts.get(WANTS_BURST_FIRE);
        if wants && self.mode.is_in_combat() && !self.mode.is_burst_firing() {
            self.start_burst_fire(ctx, world);
        } else if !wants && self.mode.is_burst_firing() {
            self.stop_burst_fire(ctx, world);
        }
    }

    fn allowed(&self, kind: TaskKind) -> bool {
        match self.mode.mode() {
            CombatMode::InCombat => {
                kind == tasks::START_FIRE
                    || kind == tasks::STRAFE
                    || kind == tasks::LOOK_AT
                    || (kind == tasks::MOVE_TO_TERRITORY && self.retreat == Retreat::Running)
            }
            CombatMode::Alert => {
                kind == tasks::INVESTIGATE
                    || kind == tasks::SEARCH_PATTERN
                    || kind == tasks::LOOK_AT
            }
            CombatMode::Patrolling => kind == tasks::MOVE_TO_TERRITORY,
        }
    }

    fn aim_error(&self, world: &W) -> Option<f32> {
        let target = self.facts.get(TARGET_ACTOR)?;
        let theirs = world.actor_position(target)?;
        let own = world.position(self.agent)?;
        let forward = world.forward(self.agent)?;
        Some(angle_between_degrees(forward.flat(), (theirs - own).flat()))
    }

    fn select_task(&mut self, ctx: &TickContext, world: &mut W, distance: Option<f32>) {
        let current = self.runtime.current_kind();
        if let Some(kind) = current {
            if !self.allowed(kind) {
                tracing::debug!(agent = self.agent.stable_id(), task = %kind, mode = %self.mode.mode(), "task not allowed in mode");
                self.runtime
                    .abort_current(ctx, self.agent, world, &mut self.facts);
                self.drain_finished(ctx);
            }
        }
        let current = self.runtime.current_kind();

        let next: Option<Box<dyn Task<W>>> = match self.mode.mode() {
            CombatMode::InCombat => self.pick_combat_task(world, current, distance),
            CombatMode::Alert if current.is_none() => self.pick_alert_task(ctx, world),
            CombatMode::Patrolling if current.is_none() && self.return_home_pending => {
                self.return_home_pending = false;
                self.claim_nearest(world);
                Some(Box::new(MoveToTerritoryTask::new(
                    self.config.move_to_territory.clone(),
                )))
            }
            _ => None,
        };

        if let Some(task) = next {
            let kind = task.kind();
            if let Some(previous) = current {
                self.trace(ctx, "task_finish", tasks::code(previous), 2);
            }
            self.runtime
                .start(task, ctx, self.agent, world, &mut self.facts);
            self.trace(ctx, "task_start", tasks::code(kind), self.runtime.generation());
            tracing::info!(agent = self.agent.stable_id(), task = %kind, mode = %self.mode.mode(), "task started");
        }
    }

    fn pick_combat_task(
        &mut self,
        world: &W,
        current: Option<TaskKind>,
        distance: Option<f32>,
    ) -> Option<Box<dyn Task<W>>> {
        if self.retreat == Retreat::Ready
            && world.health_ratio(self.agent) <= self.config.combat.retreat_health_ratio
        {
            self.retreat = Retreat::Running;
            self.claim_nearest(world);
            let mut config = self.config.move_to_territory.clone();
            config.allow_combat_while_moving = true;
            config.abort_on_combat = false;
            tracing::info!(agent = self.agent.stable_id(), "low health; falling back");
            return Some(Box::new(MoveToTerritoryTask::new(config)));
        }

        let distance = distance?;
        let too_close = distance < self.config.strafe.trigger_distance();
        match current {
            Some(kind) if kind == tasks::START_FIRE && too_close => {
                return Some(Box::new(StrafeTask::new(self.config.strafe.clone())));
            }
            Some(_) => return None,
            None => {}
        }

        if too_close {
            return Some(Box::new(StrafeTask::new(self.config.strafe.clone())));
        }
        if self
            .aim_error(world)
            .is_some_and(|e| e > self.config.start_fire.aim_accuracy_angle)
        {
            return Some(Box::new(LookAtTask::new(self.config.look_at.clone())));
        }
        let fire = &self.config.start_fire;
        let target = self.facts.get(TARGET_ACTOR)?;
        if distance >= fire.min_range
            && distance <= fire.max_range
            && world.has_line_of_sight(self.agent, target)
        {
            return Some(Box::new(StartFireTask::new(fire.clone())));
        }
        None
    }

    fn pick_alert_task(&mut self, ctx: &TickContext, world: &W) -> Option<Box<dyn Task<W>>> {
        // A visible target out of engagement range is watched, not searched for.
        if self.memory.is_visible() && self.facts.get(TARGET_ACTOR).is_some() {
            let misaligned = self
                .aim_error(world)
                .is_some_and(|e| e > self.config.look_at.acceptable_angle);
            return misaligned.then(|| {
                Box::new(LookAtTask::new(self.config.look_at.clone())) as Box<dyn Task<W>>
            });
        }
        match self.alert_step {
            AlertStep::Investigate => Some(Box::new(InvestigateTask::new(
                self.config.investigate.clone(),
            ))),
            AlertStep::Search => Some(Box::new(SearchPatternTask::new(
                self.config.search_pattern.clone(),
            ))),
            AlertStep::Done => {
                tracing::info!(agent = self.agent.stable_id(), "nothing found; returning to patrol");
                let change = self.mode.enter_patrol(ctx.time_seconds);
                self.apply_change(ctx, change);
                self.mode.sync_facts(&mut self.facts);
                None
            }
        }
    }

    fn claim_nearest(&mut self, world: &W) {
        let Some(position) = world.position(self.agent) else {
            return;
        };
        self.claimed_territory = world
            .territories()
            .nearest_friendly(position)
            .map(|t| t.id);
    }

    fn drain_finished(&mut self, ctx: &TickContext) {
        let Some(FinishedTask { kind, result, generation }) = self.runtime.take_just_finished()
        else {
            return;
        };
        let code = match result {
            TaskResult::Succeeded => 0,
            TaskResult::Failed => 1,
            TaskResult::Aborted => 2,
        };
        self.trace(ctx, "task_finish", tasks::code(kind), code);
        tracing::info!(
            agent = self.agent.stable_id(),
            task = %kind,
            result = result.name(),
            generation,
            "task finished"
        );

        let alert_task = kind == tasks::INVESTIGATE || kind == tasks::SEARCH_PATTERN;
        if alert_task && result != TaskResult::Aborted && self.memory.is_visible() {
            // Ended by a sighting: the chain restarts from the new last known location.
            self.alert_step = AlertStep::Investigate;
        } else if kind == tasks::INVESTIGATE && result != TaskResult::Aborted {
            self.alert_step = AlertStep::Search;
        } else if kind == tasks::SEARCH_PATTERN && result != TaskResult::Aborted {
            self.alert_step = AlertStep::Done;
        } else if kind == tasks::MOVE_TO_TERRITORY {
            if self.retreat == Retreat::Running {
                self.retreat = Retreat::Done;
            }
            self.claimed_territory = None;
        }
    }

    /// Bookkeeping and trace for one mode controller reaction.
    fn apply_change(&mut self, ctx: &TickContext, change: ModeChange) {
        let agent = self.agent.stable_id();
        match change {
            ModeChange::Entered(mode) => {
                tracing::info!(agent, mode = %mode, target = ?self.mode.target(), "mode changed");
                let target = self.mode.target().map_or(0, ActorId::raw);
                self.trace(ctx, "mode", mode_code(mode), target);
                match mode {
                    CombatMode::InCombat => {
                        self.retreat = Retreat::Ready;
                        self.alert_step = AlertStep::Investigate;
                    }
                    CombatMode::Alert => self.alert_step = AlertStep::Investigate,
                    // Patrol is only ever re-entered from an alert.
                    CombatMode::Patrolling => self.return_home_pending = true,
                }
            }
            ModeChange::TargetSwitched(target) => {
                tracing::info!(agent, target = %target, "target switched");
                self.trace(ctx, "mode", mode_code(self.mode.mode()), target.raw());
            }
            ModeChange::BurstStarted => {
                tracing::debug!(agent, "burst started");
                self.trace(ctx, "burst_start", 0, 0);
            }
            ModeChange::BurstStopped => {
                tracing::debug!(agent, "burst stopped");
                self.trace(ctx, "burst_stop", 0, 0);
            }
        }
    }

    fn notify_mode(&mut self, world: &mut W) {
        let mode = self.mode.mode();
        if mode == self.notified_mode {
            return;
        }
        world.notify_animation(self.agent, AnimationCue::InCombat(mode == CombatMode::InCombat));
        world.notify_animation(self.agent, AnimationCue::Alert(mode == CombatMode::Alert));
        self.notified_mode = mode;
    }

    /// One `fact` event per discrete fact changed since the last tick, event handlers included.
    fn trace_fact_changes(&mut self, ctx: &TickContext) {
        let changed: Vec<u64> = self
            .facts
            .changes_since(self.traced_revision)
            .filter(|(fact, _)| matches!(fact.kind(), FactKind::Bool | FactKind::Actor))
            .map(|(fact, _)| fact as u64)
            .collect();
        for fact in changed {
            self.trace(ctx, "fact", fact, 0);
        }
        self.traced_revision = self.facts.revision();
    }

    fn trace(&mut self, ctx: &TickContext, tag: &'static str, a: u64, b: u64) {
        let event = TraceEvent::new(ctx.tick, tag)
            .with_agent(self.agent.stable_id())
            .with_a(a)
            .with_b(b);
        warden_tools::emit(&mut self.facts, event);
    }
}

fn mode_code(mode: CombatMode) -> u64 {
    match mode {
        CombatMode::Patrolling => 0,
        CombatMode::Alert => 1,
        CombatMode::InCombat => 2,
    }
}

/// Tick every controller in stable agent order.
pub fn tick_controllers<W>(ctx: &TickContext, world: &mut W, controllers: &mut [AgentController<W>])
where
    W: CombatWorldMut + 'static,
{
    controllers.sort_by_key(|c| c.agent.stable_id());
    for controller in controllers.iter_mut() {
        controller.tick(ctx, world);
    }
}

impl<W> core::fmt::Debug for AgentController<W>
where
    W: CombatWorldMut + 'static,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AgentController")
            .field("agent", &self.agent)
            .field("mode", &self.mode.mode())
            .field("task", &self.runtime.current_kind())
            .field("alert_step", &self.alert_step)
            .finish()
    }
}
