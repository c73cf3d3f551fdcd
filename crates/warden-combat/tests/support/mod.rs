#![allow(dead_code)]

use warden_combat::sim::{SimActor, SimWorld};
use warden_core::facts::SELF_ACTOR;
use warden_core::{
    ActorId, FactStore, Task, TaskResult, TaskRuntime, TaskStatus, TaskTimers, TickContext, Vec3,
};

pub const AGENT: ActorId = ActorId(1);
pub const PLAYER: ActorId = ActorId(2);
pub const DT: f32 = 0.1;
pub const SEED: u64 = 7;

pub fn ctx(tick: u64) -> TickContext {
    TickContext::fixed(tick, DT, SEED)
}

pub fn facts_for(agent: ActorId) -> FactStore {
    let mut facts = FactStore::with_schema();
    facts.set(SELF_ACTOR, Some(agent));
    facts
}

/// Open floor with the agent at `agent_at` facing +X and a hostile player at `player_at`.
pub fn duel(agent_at: Vec3, player_at: Vec3) -> SimWorld {
    let mut world = SimWorld::open();
    world.spawn(AGENT, SimActor::new(agent_at).with_team(1));
    world.spawn(PLAYER, SimActor::new(player_at).with_team(2));
    world
}

/// Call `start` directly, for asserting on the task's own state afterwards.
pub fn start_direct<T: Task<SimWorld>>(
    task: &mut T,
    world: &mut SimWorld,
    facts: &mut FactStore,
) -> TaskStatus {
    task.start(&ctx(0), AGENT, world, facts, &mut TaskTimers::new())
}

/// Drives one task through a [`TaskRuntime`] against a [`SimWorld`], stepping the world
/// before each tick.
pub struct TaskHarness {
    pub runtime: TaskRuntime<SimWorld>,
    pub facts: FactStore,
    pub tick: u64,
}

impl TaskHarness {
    pub fn new() -> Self {
        Self {
            runtime: TaskRuntime::default(),
            facts: facts_for(AGENT),
            tick: 0,
        }
    }

    pub fn now(&self) -> f32 {
        ctx(self.tick).time_seconds
    }

    pub fn start(&mut self, task: impl Task<SimWorld>, world: &mut SimWorld) -> TaskStatus {
        self.runtime
            .start(Box::new(task), &ctx(self.tick), AGENT, world, &mut self.facts)
    }

    pub fn step(&mut self, world: &mut SimWorld) -> Option<TaskResult> {
        self.tick += 1;
        world.step(DT);
        self.runtime
            .tick(&ctx(self.tick), AGENT, world, &mut self.facts)
    }

    pub fn run(&mut self, world: &mut SimWorld, max_ticks: u64) -> Option<TaskResult> {
        (0..max_ticks).find_map(|_| self.step(world))
    }

    /// Like [`TaskHarness::run`], calling `observe` after every tick.
    pub fn run_observed(
        &mut self,
        world: &mut SimWorld,
        max_ticks: u64,
        mut observe: impl FnMut(&SimWorld, &FactStore),
    ) -> Option<TaskResult> {
        for _ in 0..max_ticks {
            let result = self.step(world);
            observe(world, &self.facts);
            if result.is_some() {
                return result;
            }
        }
        None
    }
}
