//! Scripted encounters against the reference world.

use std::io::Write;

use anyhow::{Context, Result};
use clap::ValueEnum;

use warden_combat::sim::{SimActor, SimWorld};
use warden_combat::{
    tick_controllers, AgentController, ArchetypeConfig, CombatMode, TerritoryId, TerritoryOwner,
};
use warden_core::{ActorId, TaskKind, TickContext, Vec3};
use warden_tools::{TraceEvent, TraceLog, TRACE_LOG};

const PLAYER: ActorId = ActorId(100);
const LEAD: ActorId = ActorId(1);
const WINGMAN: ActorId = ActorId(2);

/// Damage the player deals to the lead agent per return-fire volley in an ambush.
const RETURN_FIRE_DAMAGE: f32 = 60.0;
const RETURN_FIRE_INTERVAL: f32 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScenarioKind {
    /// Two agents engage a player who fires back at the lead.
    Ambush,
    /// The player breaks off past disengagement range, then vanishes.
    Disengage,
    /// The player is glimpsed at long range and never seen again.
    Search,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TraceFormat {
    /// One JSON object per trace event on stdout.
    #[default]
    Json,
    None,
}

#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub ticks: u64,
    pub seed: u64,
    pub dt: f32,
    pub trace: TraceFormat,
}

/// End state of one agent after a run.
#[derive(Debug, Clone)]
pub struct AgentSummary {
    pub agent: ActorId,
    pub mode: CombatMode,
    pub task: Option<TaskKind>,
    pub position: Vec3,
    pub health: f32,
    pub shots_fired: u32,
}

#[derive(Debug, Clone)]
pub struct Summary {
    pub ticks: u64,
    pub events: usize,
    pub agents: Vec<AgentSummary>,
}

struct Encounter {
    kind: ScenarioKind,
    world: SimWorld,
    controllers: Vec<AgentController<SimWorld>>,
    next_volley: f32,
}

impl Encounter {
    fn new(kind: ScenarioKind, config: &ArchetypeConfig) -> Self {
        let mut world = SimWorld::open().with_perception(config.perception.clone());
        world
            .territories_mut()
            .add(TerritoryId(1), Vec3::new(-1200.0, 0.0, 0.0), TerritoryOwner::Friendly);
        world
            .territories_mut()
            .add(TerritoryId(2), Vec3::new(2400.0, 600.0, 0.0), TerritoryOwner::Enemy);

        let mut agents = vec![LEAD];
        world.spawn(LEAD, SimActor::new(Vec3::ZERO).with_team(1));
        match kind {
            ScenarioKind::Ambush => {
                world.spawn(
                    WINGMAN,
                    SimActor::new(Vec3::new(-300.0, 100.0, 0.0)).with_team(1),
                );
                agents.push(WINGMAN);
                world.spawn(PLAYER, SimActor::new(Vec3::new(700.0, 150.0, 0.0)).with_team(2));
            }
            ScenarioKind::Disengage => {
                world.spawn(PLAYER, SimActor::new(Vec3::new(800.0, 0.0, 0.0)).with_team(2));
            }
            ScenarioKind::Search => {
                world.spawn(PLAYER, SimActor::new(Vec3::new(1300.0, 0.0, 0.0)).with_team(2));
            }
        }

        let controllers = agents
            .into_iter()
            .map(|agent| {
                let mut controller = AgentController::new(agent, config.clone());
                controller.possess(agent);
                controller.facts_mut().attach(TRACE_LOG, TraceLog::default());
                controller
            })
            .collect();

        Self {
            kind,
            world,
            controllers,
            next_volley: RETURN_FIRE_INTERVAL,
        }
    }

    /// Scripted player behavior for `tick` of a `total`-tick run.
    fn script(&mut self, ctx: &TickContext, total: u64) {
        match self.kind {
            ScenarioKind::Ambush => {
                if ctx.time_seconds < self.next_volley {
                    return;
                }
                self.next_volley += RETURN_FIRE_INTERVAL;
                let player_alive = self.world.actor(PLAYER).is_some_and(|p| p.alive);
                if !player_alive {
                    return;
                }
                self.world.apply_damage(LEAD, RETURN_FIRE_DAMAGE);
                if let Some(lead) = self.controllers.iter_mut().find(|c| c.agent() == LEAD) {
                    lead.on_damage(ctx, &self.world, PLAYER);
                }
            }
            ScenarioKind::Disengage => {
                if ctx.tick == total / 4 {
                    tracing::info!(tick = ctx.tick, "player breaks off");
                    self.world.place(PLAYER, Vec3::new(1900.0, 0.0, 0.0));
                } else if ctx.tick == total / 2 {
                    tracing::info!(tick = ctx.tick, "player vanishes");
                    self.world.place(PLAYER, Vec3::new(4000.0, 4000.0, 0.0));
                }
            }
            ScenarioKind::Search => {
                if ctx.tick == 3 {
                    tracing::info!(tick = ctx.tick, "player slips away");
                    self.world.place(PLAYER, Vec3::new(4000.0, 4000.0, 0.0));
                }
            }
        }
    }

    fn step(&mut self, ctx: &TickContext, total: u64) {
        self.world.step(ctx.dt_seconds);
        self.script(ctx, total);
        for controller in &mut self.controllers {
            let agent = controller.agent();
            for (actor, seen) in self.world.sense(agent) {
                controller.on_target_sensed(ctx, &self.world, actor, seen);
            }
        }
        tick_controllers(ctx, &mut self.world, &mut self.controllers);
    }

    /// Take every buffered trace event, in agent order.
    fn drain_trace(&mut self) -> Vec<TraceEvent> {
        self.controllers
            .iter_mut()
            .filter_map(|c| c.facts_mut().attachment_mut(TRACE_LOG))
            .flat_map(|log| std::mem::take(&mut log.events))
            .collect()
    }

    fn summary(&self, ticks: u64, events: usize) -> Summary {
        let agents = self
            .controllers
            .iter()
            .map(|c| {
                let actor = self.world.actor(c.agent());
                AgentSummary {
                    agent: c.agent(),
                    mode: c.mode(),
                    task: c.current_task(),
                    position: actor.map(|a| a.position).unwrap_or(Vec3::ZERO),
                    health: actor.map(|a| a.health).unwrap_or(0.0),
                    shots_fired: actor.map(|a| a.shots_fired).unwrap_or(0),
                }
            })
            .collect();
        Summary {
            ticks,
            events,
            agents,
        }
    }
}

/// Run `kind` for `options.ticks` fixed steps, streaming trace events to `out`.
pub fn run(
    kind: ScenarioKind,
    config: &ArchetypeConfig,
    options: RunOptions,
    out: &mut impl Write,
) -> Result<Summary> {
    let mut encounter = Encounter::new(kind, config);
    let mut events = 0;

    for tick in 1..=options.ticks {
        let ctx = TickContext::fixed(tick, options.dt, options.seed);
        encounter.step(&ctx, options.ticks);

        let drained = encounter.drain_trace();
        events += drained.len();
        if options.trace == TraceFormat::Json {
            for event in &drained {
                serde_json::to_writer(&mut *out, event).context("Failed to encode trace event")?;
                writeln!(out).context("Failed to write trace output")?;
            }
        }
    }
    out.flush().context("Failed to flush trace output")?;

    Ok(encounter.summary(options.ticks, events))
}
