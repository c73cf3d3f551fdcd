//! Combat state machine of the controlled agent.
//!
//! `Patrolling -> Alert -> InCombat` and back down, plus the burst-fire duty cycle. Timed work
//! (the scheduled end of a burst) goes through an explicit [`EventQueue`] polled once per tick.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use warden_core::facts::{IS_ALERT, IS_BURST_FIRING, IS_IN_COMBAT};
use warden_core::{ActorId, EventQueue, FactStore};

use crate::CombatConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CombatMode {
    #[default]
    Patrolling,
    Alert,
    InCombat,
}

impl CombatMode {
    pub fn name(self) -> &'static str {
        match self {
            CombatMode::Patrolling => "patrolling",
            CombatMode::Alert => "alert",
            CombatMode::InCombat => "in_combat",
        }
    }
}

impl fmt::Display for CombatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Something the controller reacted to, reported for logging and traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeChange {
    Entered(CombatMode),
    TargetSwitched(ActorId),
    BurstStarted,
    BurstStopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModeEvent {
    StopBurst,
}

#[derive(Debug, Clone)]
pub struct CombatModeController {
    mode: CombatMode,
    target: Option<ActorId>,
    burst_firing: bool,
    burst_ready_at: f32,
    beyond_since: Option<f32>,
    events: EventQueue<ModeEvent>,
    config: CombatConfig,
}

impl CombatModeController {
    pub fn new(config: CombatConfig) -> Self {
        Self {
            mode: CombatMode::Patrolling,
            target: None,
            burst_firing: false,
            burst_ready_at: 0.0,
            beyond_since: None,
            events: EventQueue::new(),
            config,
        }
    }

    pub fn mode(&self) -> CombatMode {
        self.mode
    }

    pub fn target(&self) -> Option<ActorId> {
        self.target
    }

    pub fn is_in_combat(&self) -> bool {
        self.mode == CombatMode::InCombat
    }

    pub fn is_burst_firing(&self) -> bool {
        self.burst_firing
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    /// Damage from `source`. Ignored when the source is gone.
    ///
    /// Outside combat this enters combat against the source; inside combat it only switches
    /// targets when the source differs from the current one.
    pub fn on_damage(&mut self, source: ActorId, source_alive: bool) -> Option<ModeChange> {
        if !source_alive {
            return None;
        }
        match self.mode {
            CombatMode::Patrolling | CombatMode::Alert => Some(self.enter_combat(source)),
            CombatMode::InCombat if self.target != Some(source) => {
                self.target = Some(source);
                Some(ModeChange::TargetSwitched(source))
            }
            CombatMode::InCombat => None,
        }
    }

    pub fn enter_combat(&mut self, target: ActorId) -> ModeChange {
        self.target = Some(target);
        self.beyond_since = None;
        if self.mode == CombatMode::InCombat {
            return ModeChange::TargetSwitched(target);
        }
        self.mode = CombatMode::InCombat;
        ModeChange::Entered(CombatMode::InCombat)
    }

    /// Leave combat (or patrol) to investigate. The burst is cut short.
    pub fn enter_alert(&mut self, now: f32) -> ModeChange {
        self.stop_burst(now);
        self.target = None;
        self.beyond_since = None;
        self.mode = CombatMode::Alert;
        ModeChange::Entered(CombatMode::Alert)
    }

    pub fn enter_patrol(&mut self, now: f32) -> ModeChange {
        self.stop_burst(now);
        self.target = None;
        self.beyond_since = None;
        self.mode = CombatMode::Patrolling;
        ModeChange::Entered(CombatMode::Patrolling)
    }

    /// Back to the possession-time state.
    pub fn clear_all(&mut self) {
        self.mode = CombatMode::Patrolling;
        self.target = None;
        self.burst_firing = false;
        self.burst_ready_at = 0.0;
        self.beyond_since = None;
        self.events.clear();
    }

    /// Engagement hysteresis for a visible target at `distance`: close enough enters combat,
    /// anything else raises the alert from patrol. Combat itself is only left through
    /// [`CombatModeController::check_disengage`].
    pub fn on_sighting(&mut self, target: ActorId, distance: f32, now: f32) -> Option<ModeChange> {
        if self.mode == CombatMode::InCombat {
            return None;
        }
        if distance <= self.config.engagement_distance {
            return Some(self.enter_combat(target));
        }
        if self.mode == CombatMode::Patrolling {
            return Some(self.enter_alert(now));
        }
        None
    }

    /// Feed the current target distance (`None` when it no longer resolves). Returns `true`
    /// once the target has stayed beyond the disengagement distance for the confirm time.
    pub fn check_disengage(&mut self, distance: Option<f32>, now: f32) -> bool {
        if self.mode != CombatMode::InCombat {
            self.beyond_since = None;
            return false;
        }
        match distance {
            Some(d) if d > self.config.disengagement_distance => {
                let since = *self.beyond_since.get_or_insert(now);
                now - since >= self.config.disengage_confirm_seconds
            }
            _ => {
                self.beyond_since = None;
                false
            }
        }
    }

    /// Start a burst. Rejected while one is running or the cooldown has not elapsed.
    pub fn start_burst(&mut self, now: f32) -> bool {
        if self.burst_firing || now < self.burst_ready_at {
            return false;
        }
        self.burst_firing = true;
        self.events
            .schedule_after(now, self.config.burst_fire_duration, ModeEvent::StopBurst);
        true
    }

    /// End the running burst and start the cooldown. Returns `false` when nothing was firing.
    pub fn stop_burst(&mut self, now: f32) -> bool {
        if !self.burst_firing {
            return false;
        }
        self.burst_firing = false;
        self.burst_ready_at = now + self.config.burst_fire_cooldown;
        self.events.retain(|e| *e != ModeEvent::StopBurst);
        true
    }

    /// Whether a new burst would be accepted at `now`.
    pub fn can_burst(&self, now: f32) -> bool {
        !self.burst_firing && now >= self.burst_ready_at
    }

    /// Deliver due timed events.
    pub fn poll(&mut self, now: f32) -> Vec<ModeChange> {
        let mut changes = Vec::new();
        while let Some(event) = self.events.pop_due(now) {
            match event {
                ModeEvent::StopBurst => {
                    if self.stop_burst(now) {
                        changes.push(ModeChange::BurstStopped);
                    }
                }
            }
        }
        changes
    }

    /// Publish the mode flags.
    pub fn sync_facts(&self, facts: &mut FactStore) {
        facts.set(IS_IN_COMBAT, self.mode == CombatMode::InCombat);
        facts.set(IS_ALERT, self.mode == CombatMode::Alert);
        facts.set(IS_BURST_FIRING, self.burst_firing);
    }
}
