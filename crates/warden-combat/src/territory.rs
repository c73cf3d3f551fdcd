//! Claimable static regions agents rally at.
//!
//! Territories are registered at level load and never removed. Ownership changes only through
//! [`TerritoryRegistry::set_owner`], which is an administrative operation outside the per-agent
//! loop; agents only read the registry.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use warden_core::Vec3;

use crate::TerritoryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TerritoryId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TerritoryOwner {
    #[default]
    Neutral,
    Friendly,
    Enemy,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Territory {
    pub id: TerritoryId,
    pub position: Vec3,
    pub owner: TerritoryOwner,
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TerritoryRegistry {
    territories: Vec<Territory>,
}

impl TerritoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a territory. Re-registering an id replaces its entry.
    pub fn add(&mut self, id: TerritoryId, position: Vec3, owner: TerritoryOwner) {
        let territory = Territory {
            id,
            position,
            owner,
        };
        match self.territories.iter_mut().find(|t| t.id == id) {
            Some(existing) => *existing = territory,
            None => self.territories.push(territory),
        }
    }

    pub fn get(&self, id: TerritoryId) -> Option<&Territory> {
        self.territories.iter().find(|t| t.id == id)
    }

    pub fn set_owner(
        &mut self,
        id: TerritoryId,
        owner: TerritoryOwner,
    ) -> Result<TerritoryOwner, TerritoryError> {
        let territory = self
            .territories
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(TerritoryError::UnknownTerritory(id))?;
        let previous = territory.owner;
        territory.owner = owner;
        if previous != owner {
            tracing::info!(territory = id.0, ?previous, ?owner, "territory ownership changed");
        }
        Ok(previous)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Territory> {
        self.territories.iter()
    }

    pub fn friendly(&self) -> impl Iterator<Item = &Territory> {
        self.territories
            .iter()
            .filter(|t| t.owner == TerritoryOwner::Friendly)
    }

    /// Closest friendly territory to `from`; ties go to the earlier registration.
    pub fn nearest_friendly(&self, from: Vec3) -> Option<&Territory> {
        self.friendly().fold(None, |best: Option<&Territory>, t| match best {
            Some(b) if b.position.distance(from) <= t.position.distance(from) => Some(b),
            _ => Some(t),
        })
    }

    pub fn len(&self) -> usize {
        self.territories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.territories.is_empty()
    }
}
