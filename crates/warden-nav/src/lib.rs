//! Navigation collaborators for warden agents: the walkable-surface oracle, movement requests,
//! world extension traits, and reference backends.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod follower;
pub mod grid;
pub mod movement;
pub mod open;
pub mod oracle;
pub mod world;

pub use follower::PathFollower;
pub use grid::NavGrid;
pub use movement::{MoveRequest, MoveResult};
pub use open::OpenGround;
pub use oracle::{NavPath, NavRaycastHit, NavigationOracle, SnapCascade};
pub use world::{NavWorldMut, NavWorldView};
