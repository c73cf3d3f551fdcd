//! Combat decision core for hostile agents.
//!
//! An [`AgentController`] per agent consumes perception and damage events, keeps a
//! [`TargetMemory`] and a [`CombatModeController`], publishes everything the tasks need into its
//! fact store, and runs one task at a time from [`tasks`]. The [`sim`] module is a small reference
//! world used by tests, benchmarks and the CLI.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod config;
pub mod controller;
pub mod error;
pub mod memory;
pub mod mode;
pub mod sim;
pub mod tasks;
pub mod territory;
pub mod world;

pub use config::{
    ArchetypeConfig, CombatConfig, DestinationKind, InvestigateConfig, LookAtConfig,
    MoveToTerritoryConfig, OrbitConfig, PerceptionConfig, RetreatConfig, SearchPattern,
    SearchPatternConfig, StartFireConfig, StrafeConfig, StrafeMode, StrafePattern,
};
pub use controller::{tick_controllers, AgentController, AlertStep, NO_TARGET_DISTANCE};
pub use error::{ConfigError, TaskFailure, TerritoryError};
pub use memory::{TargetMemory, TargetRecord};
pub use mode::{CombatMode, CombatModeController, ModeChange};
pub use territory::{Territory, TerritoryId, TerritoryOwner, TerritoryRegistry};
pub use world::{AnimationCue, CombatWorldMut, CombatWorldView};
