//! The six task state machines.
//!
//! Every task is a plain struct created fresh for each run: its phase and scratch state live in
//! the struct and die with it. Tasks talk to the controller and to each other only through the
//! fact store.

pub mod investigate;
pub mod look_at;
pub mod move_to_territory;
pub mod search_pattern;
pub mod start_fire;
pub mod strafe;
pub mod waypoints;

pub use investigate::{InvestigatePhase, InvestigateTask};
pub use look_at::LookAtTask;
pub use move_to_territory::{MoveToTerritoryPhase, MoveToTerritoryTask};
pub use search_pattern::{SearchPhase, SearchPatternTask};
pub use start_fire::{FirePhase, StartFireTask};
pub use strafe::StrafeTask;

use warden_core::facts::{SELF_ACTOR, TARGET_ACTOR};
use warden_core::{ActorId, FactStore, TaskKind, Vec3};

use crate::CombatWorldView;

pub const START_FIRE: TaskKind = TaskKind("start_fire");
pub const STRAFE: TaskKind = TaskKind("strafe");
pub const SEARCH_PATTERN: TaskKind = TaskKind("search_pattern");
pub const INVESTIGATE: TaskKind = TaskKind("investigate");
pub const MOVE_TO_TERRITORY: TaskKind = TaskKind("move_to_territory");
pub const LOOK_AT: TaskKind = TaskKind("look_at");

pub const ALL: [TaskKind; 6] = [
    START_FIRE,
    STRAFE,
    SEARCH_PATTERN,
    INVESTIGATE,
    MOVE_TO_TERRITORY,
    LOOK_AT,
];

/// Stable numeric code for trace payloads. Unknown kinds map past the end of [`ALL`].
pub fn code(kind: TaskKind) -> u64 {
    ALL.iter().position(|k| *k == kind).unwrap_or(ALL.len()) as u64
}

// Per-purpose random streams.
const STREAM_STRAFE: u64 = 0x5742_4146_4500_0001;
const STREAM_SEARCH: u64 = 0x5742_4146_4500_0002;
const STREAM_INVESTIGATE: u64 = 0x5742_4146_4500_0003;
const STREAM_TERRITORY: u64 = 0x5742_4146_4500_0004;

/// The `TargetActor` fact, resolved through the world. Never the agent itself.
pub(crate) fn resolve_target<W: CombatWorldView>(
    world: &W,
    facts: &FactStore,
) -> Option<(ActorId, Vec3)> {
    let target = facts.get(TARGET_ACTOR)?;
    if facts.get(SELF_ACTOR) == Some(target) {
        return None;
    }
    world.actor_position(target).map(|p| (target, p))
}

/// Whether the agent is done waiting for `goal`.
pub(crate) fn reached(position: Vec3, goal: Vec3, acceptance_radius: f32) -> bool {
    position.distance_2d(goal) <= acceptance_radius
}
