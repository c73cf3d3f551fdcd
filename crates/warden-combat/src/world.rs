use warden_core::{ActorId, Vec3};
use warden_nav::{NavWorldMut, NavWorldView};

use crate::{DestinationKind, TerritoryRegistry};

/// Fire-and-forget notifications for the animation collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimationCue {
    Aiming(bool),
    Firing(bool),
    InCombat(bool),
    Alert(bool),
}

/// What the combat core reads from the world besides navigation.
pub trait CombatWorldView: NavWorldView {
    /// Facing of any actor, used for view-cone checks against the target.
    fn actor_forward(&self, actor: ActorId) -> Option<Vec3>;

    /// Whether a character-sized actor (aim height applies) or a plain object.
    fn is_character(&self, _actor: ActorId) -> bool {
        true
    }

    fn has_line_of_sight(&self, agent: Self::Agent, target: ActorId) -> bool;

    fn territories(&self) -> &TerritoryRegistry;

    /// Current health as a fraction of maximum health.
    fn health_ratio(&self, agent: Self::Agent) -> f32;

    /// Static rally points of `kind`. `NearestAlly` and `CustomLocation` are resolved elsewhere.
    fn landmarks(&self, kind: DestinationKind) -> Vec<Vec3>;

    /// Positions of living allies of `agent`.
    fn ally_positions(&self, agent: Self::Agent) -> Vec<Vec3>;

    fn spawn_point(&self, agent: Self::Agent) -> Option<Vec3>;

    fn current_ammo(&self, agent: Self::Agent) -> u32;

    fn is_firing(&self, agent: Self::Agent) -> bool;
}

/// Weapon and animation effects.
pub trait CombatWorldMut: NavWorldMut + CombatWorldView {
    fn start_fire(&mut self, agent: Self::Agent);

    fn stop_fire(&mut self, agent: Self::Agent);

    fn reload(&mut self, agent: Self::Agent);

    fn notify_animation(&mut self, _agent: Self::Agent, _cue: AnimationCue) {}
}
