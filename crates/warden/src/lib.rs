//! Umbrella crate that re-exports the `warden-*` building blocks.
//!
//! Most users want the `combat` feature (on by default through `full`): build an
//! [`combat::AgentController`] per hostile agent, implement [`combat::CombatWorldMut`] for your
//! engine, and tick the controllers once per frame.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

#[cfg(feature = "core")]
#[cfg_attr(docsrs, doc(cfg(feature = "core")))]
pub use warden_core as core;

#[cfg(feature = "nav")]
#[cfg_attr(docsrs, doc(cfg(feature = "nav")))]
pub use warden_nav as nav;

#[cfg(feature = "tools")]
#[cfg_attr(docsrs, doc(cfg(feature = "tools")))]
pub use warden_tools as tools;

#[cfg(feature = "combat")]
#[cfg_attr(docsrs, doc(cfg(feature = "combat")))]
pub use warden_combat as combat;

/// The names most integrations need.
#[cfg(feature = "combat")]
#[cfg_attr(docsrs, doc(cfg(feature = "combat")))]
pub mod prelude {
    pub use warden_combat::{
        tick_controllers, AgentController, ArchetypeConfig, CombatMode, CombatWorldMut,
        CombatWorldView,
    };
    pub use warden_core::{ActorId, FactStore, TickContext, Vec3};
    pub use warden_nav::{NavWorldMut, NavWorldView, NavigationOracle};
}

#[cfg(doc)]
pub mod guides {
    #![allow(clippy::all)]

    #[doc = include_str!("../../../docs/guides/integration.md")]
    pub mod integration {}

    #[doc = include_str!("../../../docs/guides/tracing.md")]
    pub mod tracing {}
}
