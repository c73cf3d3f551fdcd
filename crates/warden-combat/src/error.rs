use thiserror::Error;

use crate::territory::TerritoryId;

/// Problems found while loading or validating an [`crate::ArchetypeConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field}: min {min} is greater than max {max}")]
    InvertedRange {
        field: &'static str,
        min: f32,
        max: f32,
    },

    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f32 },

    #[error("{field} is out of range: {value}")]
    OutOfRange { field: &'static str, value: f32 },

    #[error("engagement distance {engagement} exceeds disengagement distance {disengagement}")]
    HysteresisOrder { engagement: f32, disengagement: f32 },

    #[error("{0} must not be zero")]
    ZeroCount(&'static str),

    #[error("unknown archetype format: {0:?}")]
    UnknownFormat(String),

    #[cfg(feature = "serde")]
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[cfg(feature = "serde")]
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TerritoryError {
    #[error("unknown territory {0:?}")]
    UnknownTerritory(TerritoryId),
}

/// Why a task ended in failure. Tasks keep the last one for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum TaskFailure {
    #[error("missing dependency: {0}")]
    MissingDependency(&'static str),

    #[error("no target")]
    NoTarget,

    #[error("target present; nothing to search for")]
    TargetPresent,

    #[error("target out of range ({distance:.0})")]
    OutOfRange { distance: f32 },

    #[error("no line of sight to target")]
    NoLineOfSight,

    #[error("weapon empty and auto-reload disabled")]
    OutOfAmmo,

    #[error("no navigable point near the destination")]
    NoNavigablePoint,

    #[error("move request rejected")]
    MoveRejected,

    #[error("timed out after {seconds:.1}s")]
    Timeout { seconds: f32 },

    #[error("aborted: combat detected")]
    AbortedByCombat,

    #[error("searched every point without finding the target")]
    NothingFound,
}
