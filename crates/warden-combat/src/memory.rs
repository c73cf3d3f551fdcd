//! Time-bounded recollection of the sensed target.
//!
//! A positive stimulus stamps `last_seen_time`; a negative one only clears the visibility flag.
//! The target counts as current for exactly `duration` seconds after the last positive
//! stimulus, however many negative stimuli arrive in between.

use warden_core::{ActorId, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetRecord {
    pub target: ActorId,
    pub last_known_position: Vec3,
    pub last_seen_time: f32,
    /// Authoritative only right after a perception event.
    pub currently_visible: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TargetMemory {
    record: Option<TargetRecord>,
    /// Survives [`TargetMemory::forget_target`] and expiry so the agent can investigate it.
    last_known_location: Vec3,
    duration: f32,
}

impl TargetMemory {
    pub fn new(duration: f32) -> Self {
        Self {
            record: None,
            last_known_location: Vec3::ZERO,
            duration,
        }
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn record(&self) -> Option<&TargetRecord> {
        self.record.as_ref()
    }

    /// Perception input. `position` is where the actor was sensed; it is ignored for negative
    /// stimuli.
    pub fn on_target_sensed(&mut self, actor: ActorId, position: Vec3, success: bool, now: f32) {
        if success {
            self.record = Some(TargetRecord {
                target: actor,
                last_known_position: position,
                last_seen_time: now,
                currently_visible: true,
            });
            self.last_known_location = position;
            return;
        }

        if let Some(record) = self.record.as_mut() {
            if record.target == actor {
                record.currently_visible = false;
            }
        }
    }

    /// Adopt `actor` without a sighting (damage from an unseen source). Counts as a stamp.
    pub fn track(&mut self, actor: ActorId, position: Vec3, now: f32) {
        let visible = self
            .record
            .as_ref()
            .is_some_and(|r| r.target == actor && r.currently_visible);
        self.record = Some(TargetRecord {
            target: actor,
            last_known_position: position,
            last_seen_time: now,
            currently_visible: visible,
        });
        self.last_known_location = position;
    }

    /// Re-stamp a target that is still in sight.
    pub fn refresh(&mut self, position: Vec3, now: f32) {
        if let Some(record) = self.record.as_mut() {
            if record.currently_visible {
                record.last_known_position = position;
                record.last_seen_time = now;
                self.last_known_location = position;
            }
        }
    }

    pub fn has_current_target(&self, now: f32) -> bool {
        self.record
            .as_ref()
            .is_some_and(|r| now - r.last_seen_time < self.duration)
    }

    /// The remembered target while it is still current.
    pub fn current_target(&self, now: f32) -> Option<ActorId> {
        self.has_current_target(now)
            .then(|| self.record.as_ref().map(|r| r.target))
            .flatten()
    }

    pub fn is_visible(&self) -> bool {
        self.record.as_ref().is_some_and(|r| r.currently_visible)
    }

    /// `f32::INFINITY` when nothing was ever seen.
    pub fn seconds_since_last_seen(&self, now: f32) -> f32 {
        self.record
            .as_ref()
            .map_or(f32::INFINITY, |r| (now - r.last_seen_time).max(0.0))
    }

    pub fn last_known_location(&self) -> Vec3 {
        self.last_known_location
    }

    /// Drop the record once the memory window has elapsed. Returns the forgotten target.
    pub fn expire(&mut self, now: f32) -> Option<ActorId> {
        match self.record {
            Some(record) if now - record.last_seen_time >= self.duration => {
                self.record = None;
                Some(record.target)
            }
            _ => None,
        }
    }

    /// Forget the target but keep the last known location.
    pub fn forget_target(&mut self) -> Option<ActorId> {
        self.record.take().map(|r| r.target)
    }

    pub fn clear(&mut self) {
        self.record = None;
        self.last_known_location = Vec3::ZERO;
    }
}

impl Default for TargetMemory {
    fn default() -> Self {
        Self::new(7.0)
    }
}
