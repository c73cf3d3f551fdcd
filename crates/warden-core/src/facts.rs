//! Per-agent fact store ("blackboard").
//!
//! Facts are addressed by a closed schema: every [`Fact`] has exactly one [`FactKind`], and the
//! only way to read or write a fact is through a typed [`FactKey`] constant whose Rust type
//! matches that kind. Reads of undeclared facts return the kind's neutral value
//! (`false`, `0.0`, `Vec3::ZERO`, `None`).
//!
//! Besides facts, the store carries typed *attachments* (trace logs, debug sinks) that tools
//! hang off an agent without widening the schema.

use core::fmt;
use std::any::Any;
use std::collections::BTreeMap;
use std::marker::PhantomData;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{ActorId, Vec3};

/// The closed key set shared by the controller and every task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Fact {
    SelfActor,
    IsInCombat,
    IsAlert,
    IsBurstFiring,
    /// Request from a firing task for the controller's burst duty cycle.
    WantsBurstFire,
    TargetActor,
    LastKnownPlayerLocation,
    /// Destination written by level scripting for `CustomLocation` retreats.
    CustomLocation,
    FireDistance,
}

impl Fact {
    pub const COUNT: usize = 9;

    pub const ALL: [Fact; Fact::COUNT] = [
        Fact::SelfActor,
        Fact::IsInCombat,
        Fact::IsAlert,
        Fact::IsBurstFiring,
        Fact::WantsBurstFire,
        Fact::TargetActor,
        Fact::LastKnownPlayerLocation,
        Fact::CustomLocation,
        Fact::FireDistance,
    ];

    pub fn kind(self) -> FactKind {
        match self {
            Fact::SelfActor | Fact::TargetActor => FactKind::Actor,
            Fact::IsInCombat | Fact::IsAlert | Fact::IsBurstFiring | Fact::WantsBurstFire => {
                FactKind::Bool
            }
            Fact::LastKnownPlayerLocation | Fact::CustomLocation => FactKind::Vector,
            Fact::FireDistance => FactKind::Float,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Fact::SelfActor => "SelfActor",
            Fact::IsInCombat => "IsInCombat",
            Fact::IsAlert => "IsAlert",
            Fact::IsBurstFiring => "IsBurstFiring",
            Fact::WantsBurstFire => "WantsBurstFire",
            Fact::TargetActor => "TargetActor",
            Fact::LastKnownPlayerLocation => "LastKnownPlayerLocation",
            Fact::CustomLocation => "CustomLocation",
            Fact::FireDistance => "FireDistance",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FactKind {
    Bool,
    Float,
    Vector,
    Actor,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FactValue {
    Bool(bool),
    Float(f32),
    Vector(Vec3),
    Actor(Option<ActorId>),
}

impl FactValue {
    pub fn neutral(kind: FactKind) -> Self {
        match kind {
            FactKind::Bool => FactValue::Bool(false),
            FactKind::Float => FactValue::Float(0.0),
            FactKind::Vector => FactValue::Vector(Vec3::ZERO),
            FactKind::Actor => FactValue::Actor(None),
        }
    }

    pub fn kind(&self) -> FactKind {
        match self {
            FactValue::Bool(_) => FactKind::Bool,
            FactValue::Float(_) => FactKind::Float,
            FactValue::Vector(_) => FactKind::Vector,
            FactValue::Actor(_) => FactKind::Actor,
        }
    }
}

/// Rust types that can be stored as a fact.
pub trait FactType: Copy + 'static {
    const KIND: FactKind;

    fn into_value(self) -> FactValue;
    fn from_value(value: FactValue) -> Option<Self>;
    fn neutral() -> Self;
}

impl FactType for bool {
    const KIND: FactKind = FactKind::Bool;

    fn into_value(self) -> FactValue {
        FactValue::Bool(self)
    }

    fn from_value(value: FactValue) -> Option<Self> {
        match value {
            FactValue::Bool(v) => Some(v),
            _ => None,
        }
    }

    fn neutral() -> Self {
        false
    }
}

impl FactType for f32 {
    const KIND: FactKind = FactKind::Float;

    fn into_value(self) -> FactValue {
        FactValue::Float(self)
    }

    fn from_value(value: FactValue) -> Option<Self> {
        match value {
            FactValue::Float(v) => Some(v),
            _ => None,
        }
    }

    fn neutral() -> Self {
        0.0
    }
}

impl FactType for Vec3 {
    const KIND: FactKind = FactKind::Vector;

    fn into_value(self) -> FactValue {
        FactValue::Vector(self)
    }

    fn from_value(value: FactValue) -> Option<Self> {
        match value {
            FactValue::Vector(v) => Some(v),
            _ => None,
        }
    }

    fn neutral() -> Self {
        Vec3::ZERO
    }
}

impl FactType for Option<ActorId> {
    const KIND: FactKind = FactKind::Actor;

    fn into_value(self) -> FactValue {
        FactValue::Actor(self)
    }

    fn from_value(value: FactValue) -> Option<Self> {
        match value {
            FactValue::Actor(v) => Some(v),
            _ => None,
        }
    }

    fn neutral() -> Self {
        None
    }
}

/// Typed handle to one schema fact. Only the constants below exist.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FactKey<T: FactType> {
    fact: Fact,
    _phantom: PhantomData<fn() -> T>,
}

impl<T: FactType> Copy for FactKey<T> {}

impl<T: FactType> Clone for FactKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: FactType> FactKey<T> {
    const fn new(fact: Fact) -> Self {
        Self {
            fact,
            _phantom: PhantomData,
        }
    }

    pub fn fact(self) -> Fact {
        self.fact
    }
}

pub const SELF_ACTOR: FactKey<Option<ActorId>> = FactKey::new(Fact::SelfActor);
pub const IS_IN_COMBAT: FactKey<bool> = FactKey::new(Fact::IsInCombat);
pub const IS_ALERT: FactKey<bool> = FactKey::new(Fact::IsAlert);
pub const IS_BURST_FIRING: FactKey<bool> = FactKey::new(Fact::IsBurstFiring);
pub const WANTS_BURST_FIRE: FactKey<bool> = FactKey::new(Fact::WantsBurstFire);
pub const TARGET_ACTOR: FactKey<Option<ActorId>> = FactKey::new(Fact::TargetActor);
pub const LAST_KNOWN_PLAYER_LOCATION: FactKey<Vec3> =
    FactKey::new(Fact::LastKnownPlayerLocation);
pub const CUSTOM_LOCATION: FactKey<Vec3> = FactKey::new(Fact::CustomLocation);
pub const FIRE_DISTANCE: FactKey<f32> = FactKey::new(Fact::FireDistance);

/// Typed key for a tool attachment.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AttachmentKey<T: 'static> {
    id: u64,
    _phantom: PhantomData<fn() -> T>,
}

impl<T: 'static> Copy for AttachmentKey<T> {}

impl<T: 'static> Clone for AttachmentKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: 'static> AttachmentKey<T> {
    pub const fn new(id: u64) -> Self {
        Self {
            id,
            _phantom: PhantomData,
        }
    }

    pub fn id(self) -> u64 {
        self.id
    }
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    value: Option<FactValue>,
    revision: u64,
}

const EMPTY_SLOT: Slot = Slot {
    value: None,
    revision: 0,
};

#[derive(Default)]
pub struct FactStore {
    slots: [Option<Slot>; Fact::COUNT],
    revision: u64,
    attachments: BTreeMap<u64, Box<dyn Any>>,
}

impl FactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with the full schema declared at neutral values.
    pub fn with_schema() -> Self {
        let mut store = Self::new();
        store.declare_schema();
        store
    }

    /// Declare every schema fact at its neutral value. Facts already declared keep their value.
    pub fn declare_schema(&mut self) {
        for fact in Fact::ALL {
            let slot = &mut self.slots[fact.index()];
            if slot.is_none() {
                *slot = Some(Slot {
                    value: Some(FactValue::neutral(fact.kind())),
                    ..EMPTY_SLOT
                });
            }
        }
    }

    pub fn is_declared(&self, fact: Fact) -> bool {
        self.slots[fact.index()].is_some()
    }

    /// Drop all facts and attachments; the store reads as neutral until declared again.
    pub fn clear(&mut self) {
        self.slots = [None; Fact::COUNT];
        self.attachments.clear();
        self.revision = self.revision.wrapping_add(1);
    }

    pub fn get<T: FactType>(&self, key: FactKey<T>) -> T {
        self.value(key.fact())
            .and_then(T::from_value)
            .unwrap_or_else(T::neutral)
    }

    /// Write a fact. Storage is the only effect; the revision counter moves only when the value
    /// actually changes.
    pub fn set<T: FactType>(&mut self, key: FactKey<T>, value: T) {
        let value = value.into_value();
        let slot = self.slots[key.fact().index()].get_or_insert(EMPTY_SLOT);
        if slot.value == Some(value) {
            return;
        }
        self.revision += 1;
        slot.value = Some(value);
        slot.revision = self.revision;
    }

    /// Untyped read for tooling. `None` when the fact was never declared or written.
    pub fn value(&self, fact: Fact) -> Option<FactValue> {
        self.slots[fact.index()].and_then(|slot| slot.value)
    }

    /// Monotonic counter bumped by every effective write.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Facts whose value changed after `revision`, in schema order.
    pub fn changes_since(&self, revision: u64) -> impl Iterator<Item = (Fact, FactValue)> + '_ {
        Fact::ALL.into_iter().filter_map(move |fact| {
            let slot = self.slots[fact.index()]?;
            if slot.revision > revision {
                slot.value.map(|value| (fact, value))
            } else {
                None
            }
        })
    }

    pub fn snapshot(&self) -> Vec<(Fact, FactValue)> {
        Fact::ALL
            .into_iter()
            .filter_map(|fact| self.value(fact).map(|v| (fact, v)))
            .collect()
    }

    pub fn attach<T: 'static>(&mut self, key: AttachmentKey<T>, value: T) {
        self.attachments.insert(key.id, Box::new(value));
    }

    pub fn has_attachment<T: 'static>(&self, key: AttachmentKey<T>) -> bool {
        self.attachment(key).is_some()
    }

    /// `None` when nothing is attached under `key` or the stored type differs.
    pub fn attachment<T: 'static>(&self, key: AttachmentKey<T>) -> Option<&T> {
        self.attachments.get(&key.id)?.downcast_ref::<T>()
    }

    pub fn attachment_mut<T: 'static>(&mut self, key: AttachmentKey<T>) -> Option<&mut T> {
        self.attachments.get_mut(&key.id)?.downcast_mut::<T>()
    }

    pub fn detach<T: 'static>(&mut self, key: AttachmentKey<T>) -> Option<T> {
        if !self.has_attachment(key) {
            return None;
        }
        let value = self.attachments.remove(&key.id)?;
        value.downcast::<T>().ok().map(|b| *b)
    }
}

impl fmt::Debug for FactStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactStore")
            .field("revision", &self.revision)
            .field("facts", &self.snapshot())
            .field("attachments", &self.attachments.len())
            .finish()
    }
}
