//! Aim at the target, then hold the trigger while range, sight and aim allow it.

use warden_core::facts::WANTS_BURST_FIRE;
use warden_core::{
    angle_between_degrees, ActorId, FactStore, Task, TaskKind, TaskResult, TaskStatus,
    TaskTimers, TickContext, Vec3,
};

use super::{resolve_target, START_FIRE};
use crate::{AnimationCue, CombatWorldMut, StartFireConfig, TaskFailure};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirePhase {
    Aiming,
    Firing,
}

#[derive(Debug, Clone)]
pub struct StartFireTask {
    config: StartFireConfig,
    phase: FirePhase,
    target: Option<ActorId>,
    aiming_started_at: f32,
    firing_started_at: f32,
    last_ammo_check: f32,
    reloading: bool,
    trigger_held: bool,
    failure: Option<TaskFailure>,
}

impl StartFireTask {
    pub fn new(config: StartFireConfig) -> Self {
        Self {
            config,
            phase: FirePhase::Aiming,
            target: None,
            aiming_started_at: 0.0,
            firing_started_at: 0.0,
            last_ammo_check: 0.0,
            reloading: false,
            trigger_held: false,
            failure: None,
        }
    }

    pub fn phase(&self) -> FirePhase {
        self.phase
    }

    pub fn failure(&self) -> Option<TaskFailure> {
        self.failure
    }

    pub fn is_reloading(&self) -> bool {
        self.reloading
    }

    fn fail(&mut self, failure: TaskFailure) -> TaskStatus {
        tracing::debug!(task = %START_FIRE, reason = %failure, "task failed");
        self.failure = Some(failure);
        TaskStatus::Failed
    }

    fn in_range(&self, distance: f32) -> bool {
        distance >= self.config.min_range && distance <= self.config.max_range
    }

    fn aim_is_accurate<W: CombatWorldMut>(
        &self,
        world: &W,
        agent: W::Agent,
        position: Vec3,
        target: Vec3,
    ) -> bool {
        let Some(forward) = world.forward(agent) else {
            return false;
        };
        angle_between_degrees(forward.flat(), (target - position).flat())
            <= self.config.aim_accuracy_angle
    }

    fn hold_trigger<W: CombatWorldMut>(
        &mut self,
        world: &mut W,
        agent: W::Agent,
        facts: &mut FactStore,
    ) {
        if self.trigger_held {
            return;
        }
        self.trigger_held = true;
        if self.config.use_burst_fire {
            facts.set(WANTS_BURST_FIRE, true);
        } else if !world.is_firing(agent) {
            world.start_fire(agent);
        }
    }

    fn release_trigger<W: CombatWorldMut>(
        &mut self,
        world: &mut W,
        agent: W::Agent,
        facts: &mut FactStore,
    ) {
        if !self.trigger_held {
            return;
        }
        self.trigger_held = false;
        if self.config.use_burst_fire {
            facts.set(WANTS_BURST_FIRE, false);
        } else if world.is_firing(agent) {
            world.stop_fire(agent);
        }
    }

    fn begin_firing<W: CombatWorldMut>(
        &mut self,
        now: f32,
        world: &mut W,
        agent: W::Agent,
        facts: &mut FactStore,
    ) {
        self.phase = FirePhase::Firing;
        self.firing_started_at = now;
        self.last_ammo_check = now;
        self.reloading = false;
        world.notify_animation(agent, AnimationCue::Aiming(false));
        world.notify_animation(agent, AnimationCue::Firing(true));

        if world.current_ammo(agent) == 0 && self.config.auto_reload {
            world.reload(agent);
            self.reloading = true;
            return;
        }
        self.hold_trigger(world, agent, facts);
    }
}

impl<W> Task<W> for StartFireTask
where
    W: CombatWorldMut + 'static,
{
    fn kind(&self) -> TaskKind {
        START_FIRE
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
        let Some((target, target_pos)) = resolve_target(world, facts) else {
            return self.fail(TaskFailure::NoTarget);
        };
        let distance = position.distance(target_pos);
        if !self.in_range(distance) {
            return self.fail(TaskFailure::OutOfRange { distance });
        }
        if !world.has_line_of_sight(agent, target) {
            return self.fail(TaskFailure::NoLineOfSight);
        }
        if world.current_ammo(agent) == 0 && !self.config.auto_reload {
            return self.fail(TaskFailure::OutOfAmmo);
        }

        let now = ctx.time_seconds;
        self.target = Some(target);
        self.aiming_started_at = now;
        tracing::debug!(task = %START_FIRE, target = %target, distance, "aiming");
        world.notify_animation(agent, AnimationCue::Aiming(true));

        if self.config.aiming_time <= 0.0 {
            self.begin_firing(now, world, agent, facts);
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
        let Some(position) = world.position(agent) else {
            return self.fail(TaskFailure::MissingDependency("agent position"));
        };

        let target_pos = match resolve_target(world, facts) {
            Some((target, target_pos)) => {
                self.target = Some(target);
                let distance = position.distance(target_pos);
                if !self.in_range(distance) {
                    return self.fail(TaskFailure::OutOfRange { distance });
                }
                if !world.has_line_of_sight(agent, target) {
                    return self.fail(TaskFailure::NoLineOfSight);
                }
                Some(target_pos)
            }
            None if self.config.stop_on_target_loss => {
                return self.fail(TaskFailure::NoTarget);
            }
            None => None,
        };

        if self.phase == FirePhase::Aiming {
            let timed_out = now - self.aiming_started_at >= self.config.aiming_time;
            let accurate = self.config.check_aim_accuracy
                && target_pos.is_some_and(|t| self.aim_is_accurate(world, agent, position, t));
            if accurate || timed_out {
                self.begin_firing(now, world, agent, facts);
            }
        }

        if self.phase != FirePhase::Firing {
            return TaskStatus::Running;
        }

        if now - self.last_ammo_check >= self.config.ammo_check_interval {
            self.last_ammo_check = now;
            if world.current_ammo(agent) == 0 {
                if !self.config.auto_reload {
                    tracing::debug!(task = %START_FIRE, "magazine empty");
                    return TaskStatus::Succeeded;
                }
                if !self.reloading {
                    self.release_trigger(world, agent, facts);
                    world.reload(agent);
                    self.reloading = true;
                }
            }
        }
        if self.reloading && world.current_ammo(agent) > 0 {
            self.reloading = false;
        }

        if self.config.firing_duration > 0.0
            && now - self.firing_started_at >= self.config.firing_duration
        {
            return TaskStatus::Succeeded;
        }

        let aim_ok = !self.config.check_aim_accuracy
            || target_pos.map_or(true, |t| self.aim_is_accurate(world, agent, position, t));
        if aim_ok && !self.reloading {
            self.hold_trigger(world, agent, facts);
        } else {
            self.release_trigger(world, agent, facts);
        }

        TaskStatus::Running
    }

    fn finish(
        &mut self,
        _ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        facts: &mut FactStore,
        result: TaskResult,
    ) {
        self.trigger_held = false;
        facts.set(WANTS_BURST_FIRE, false);
        world.stop_fire(agent);
        world.notify_animation(agent, AnimationCue::Aiming(false));
        world.notify_animation(agent, AnimationCue::Firing(false));
        tracing::debug!(task = %START_FIRE, result = result.name(), "finished");
    }
}
