use crate::{ActorId, AgentId, Vec3};

/// Read-only world access.
///
/// The core only needs to resolve weak actor references; navigation, perception and weapons are
/// added by extension traits in the crates that use them.
pub trait WorldView {
    type Agent: AgentId;

    /// Current position of an actor, or `None` when the reference no longer resolves.
    fn actor_position(&self, actor: ActorId) -> Option<Vec3>;

    fn is_alive(&self, actor: ActorId) -> bool {
        self.actor_position(actor).is_some()
    }
}

/// Write access / effect sink.
pub trait WorldMut: WorldView {}
