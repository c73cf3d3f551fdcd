//! Deterministic per-agent decision primitives.
//!
//! - [`FactStore`]: the typed per-agent blackboard with a closed key schema.
//! - [`Task`] / [`TaskRuntime`]: the start/tick/finish capability and the single active-task slot.
//! - [`EventQueue`] / [`TaskTimers`]: explicit time-ordered deferred work.
//! - [`TickContext`] and [`SplitMix64`]: frame input and deterministic randomness.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod agent;
pub mod facts;
pub mod math;
pub mod rng;
pub mod schedule;
pub mod task;
pub mod tick;
pub mod world;

pub use agent::{ActorId, AgentId};
pub use facts::{AttachmentKey, Fact, FactKey, FactKind, FactStore, FactType, FactValue};
pub use math::{angle_between_degrees, normalize_degrees, Vec3};
pub use rng::{shuffle, DeterministicRng, SplitMix64};
pub use schedule::EventQueue;
pub use task::{
    FinishedTask, Task, TaskKind, TaskResult, TaskRuntime, TaskStatus, TaskTimers, TimerId,
};
pub use tick::TickContext;
pub use world::{WorldMut, WorldView};
