//! Per-archetype tuning.
//!
//! Every distance, duration and threshold the controller and tasks use lives here, grouped by
//! the component that reads it. Distances are world units, durations seconds, angles degrees.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use warden_core::Vec3;

use crate::ConfigError;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CombatConfig {
    /// A sighting closer than this enters combat; farther only raises the alert.
    pub engagement_distance: f32,
    /// Combat is dropped once the target stays beyond this for `disengage_confirm_seconds`.
    pub disengagement_distance: f32,
    pub optimal_combat_distance: f32,
    pub disengage_confirm_seconds: f32,
    pub burst_fire_duration: f32,
    /// Measured from the moment a burst stops.
    pub burst_fire_cooldown: f32,
    pub target_memory_duration: f32,
    /// Seconds between shots while the trigger is held.
    pub fire_rate: f32,
    pub walk_speed: f32,
    pub run_speed: f32,
    pub max_health: f32,
    pub magazine_size: u32,
    /// Health fraction at or below which the agent falls back to friendly ground mid-fight.
    pub retreat_health_ratio: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            engagement_distance: 1200.0,
            disengagement_distance: 1500.0,
            optimal_combat_distance: 800.0,
            disengage_confirm_seconds: 0.5,
            burst_fire_duration: 3.0,
            burst_fire_cooldown: 5.0,
            target_memory_duration: 7.0,
            fire_rate: 0.1,
            walk_speed: 250.0,
            run_speed: 500.0,
            max_health: 1000.0,
            magazine_size: 30,
            retreat_health_ratio: 0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PerceptionConfig {
    pub sight_radius: f32,
    /// An actor already in sight stays sensed out to this distance.
    pub lose_sight_radius: f32,
    /// Half-angle of the view cone.
    pub peripheral_vision_degrees: f32,
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        Self {
            sight_radius: 1500.0,
            lose_sight_radius: 2000.0,
            peripheral_vision_degrees: 90.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StartFireConfig {
    pub max_range: f32,
    pub min_range: f32,
    /// Zero fires until something else ends the task.
    pub firing_duration: f32,
    /// Zero skips aiming.
    pub aiming_time: f32,
    pub stop_on_target_loss: bool,
    pub auto_reload: bool,
    /// Hand the trigger to the controller's burst duty cycle.
    pub use_burst_fire: bool,
    pub check_aim_accuracy: bool,
    pub aim_accuracy_angle: f32,
    pub ammo_check_interval: f32,
}

impl Default for StartFireConfig {
    fn default() -> Self {
        Self {
            max_range: 1500.0,
            min_range: 200.0,
            firing_duration: 5.0,
            aiming_time: 0.5,
            stop_on_target_loss: true,
            auto_reload: true,
            use_burst_fire: false,
            check_aim_accuracy: true,
            aim_accuracy_angle: 10.0,
            ammo_check_interval: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RetreatConfig {
    pub use_fire_distance_condition: bool,
    pub fire_distance_threshold: f32,
    /// The controller starts a retreat when the target is closer than this.
    pub retreat_start_distance: f32,
    pub retreat_target_distance: f32,
    pub speed: f32,
    pub distance_tolerance: f32,
    pub max_execution_time: f32,
    /// Delay before re-issuing a rejected move.
    pub retry_backoff: f32,
}

impl Default for RetreatConfig {
    fn default() -> Self {
        Self {
            use_fire_distance_condition: false,
            fire_distance_threshold: 800.0,
            retreat_start_distance: 700.0,
            retreat_target_distance: 900.0,
            speed: 600.0,
            distance_tolerance: 80.0,
            max_execution_time: 15.0,
            retry_backoff: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StrafePattern {
    Clockwise,
    CounterClockwise,
    Random,
    /// Flip direction whenever the agent stands inside the target's view cone.
    #[default]
    Adaptive,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OrbitConfig {
    pub optimal_distance: f32,
    pub distance_tolerance: f32,
    /// Degrees per second of arc.
    pub strafe_speed: f32,
    pub direction_change_interval: f32,
    pub max_execution_time: f32,
    pub speed: f32,
    pub pattern: StrafePattern,
    pub avoid_target_line_of_sight: bool,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            optimal_distance: 800.0,
            distance_tolerance: 80.0,
            strafe_speed: 60.0,
            direction_change_interval: 2.5,
            max_execution_time: 10.0,
            speed: 450.0,
            pattern: StrafePattern::Adaptive,
            avoid_target_line_of_sight: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StrafeMode {
    Retreat(RetreatConfig),
    Orbit(OrbitConfig),
}

impl Default for StrafeMode {
    fn default() -> Self {
        StrafeMode::Retreat(RetreatConfig::default())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StrafeConfig {
    pub mode: StrafeMode,
}

impl StrafeConfig {
    pub fn retreat(config: RetreatConfig) -> Self {
        Self {
            mode: StrafeMode::Retreat(config),
        }
    }

    pub fn orbit(config: OrbitConfig) -> Self {
        Self {
            mode: StrafeMode::Orbit(config),
        }
    }

    /// Target distance below which the controller hands control to the strafe task.
    pub fn trigger_distance(&self) -> f32 {
        match &self.mode {
            StrafeMode::Retreat(c) => c.retreat_start_distance,
            StrafeMode::Orbit(c) => c.optimal_distance - c.distance_tolerance,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SearchPattern {
    Random,
    #[default]
    Circular,
    Grid,
    Spiral,
    Linear,
    /// Offsets from `custom_points`, relative to the search center.
    Custom,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SearchPatternConfig {
    pub pattern: SearchPattern,
    pub search_radius: f32,
    pub point_count: u32,
    pub wait_time: f32,
    pub acceptance_radius: f32,
    pub max_search_time: f32,
    pub speed: f32,
    pub grid_size: u32,
    pub spiral_turns: u32,
    pub linear_lines: u32,
    pub custom_points: Vec<Vec3>,
    pub stop_on_target_found: bool,
    pub clear_alert_on_failure: bool,
    pub randomize_order: bool,
    pub return_to_start: bool,
}

impl Default for SearchPatternConfig {
    fn default() -> Self {
        Self {
            pattern: SearchPattern::Circular,
            search_radius: 800.0,
            point_count: 8,
            wait_time: 3.0,
            acceptance_radius: 100.0,
            max_search_time: 60.0,
            speed: 350.0,
            grid_size: 3,
            spiral_turns: 2,
            linear_lines: 3,
            custom_points: Vec::new(),
            stop_on_target_found: true,
            clear_alert_on_failure: true,
            randomize_order: false,
            return_to_start: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct InvestigateConfig {
    pub acceptance_radius: f32,
    pub investigation_duration: f32,
    pub search_point_count: u32,
    pub search_radius: f32,
    pub wait_time: f32,
    pub max_time: f32,
    pub speed: f32,
    pub stop_on_target_found: bool,
    /// Clears `IsAlert` (and `IsInCombat`) when the investigation ends empty-handed.
    pub clear_alert_on_failure: bool,
    /// `IsInCombat` is cleared once after this long.
    pub combat_clear_time: f32,
}

impl Default for InvestigateConfig {
    fn default() -> Self {
        Self {
            acceptance_radius: 100.0,
            investigation_duration: 8.0,
            search_point_count: 3,
            search_radius: 300.0,
            wait_time: 2.0,
            max_time: 30.0,
            speed: 300.0,
            stop_on_target_found: true,
            clear_alert_on_failure: true,
            combat_clear_time: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DestinationKind {
    #[default]
    SpawnPoint,
    PatrolPoint,
    CoverPoint,
    SafeZone,
    NearestAlly,
    /// The `CustomLocation` fact.
    CustomLocation,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MoveToTerritoryConfig {
    pub destination: DestinationKind,
    pub abort_on_combat: bool,
    pub acceptance_radius: f32,
    pub max_search_radius: f32,
    /// Candidates closer than this to the current target are skipped.
    pub min_safe_distance: f32,
    pub max_move_time: f32,
    pub speed: f32,
    pub wait_time: f32,
    pub allow_combat_while_moving: bool,
    pub clear_alert_on_arrival: bool,
    pub prefer_closest: bool,
    pub prefer_farthest_from_target: bool,
}

impl Default for MoveToTerritoryConfig {
    fn default() -> Self {
        Self {
            destination: DestinationKind::SpawnPoint,
            abort_on_combat: true,
            acceptance_radius: 150.0,
            max_search_radius: 2000.0,
            min_safe_distance: 800.0,
            max_move_time: 45.0,
            speed: 450.0,
            wait_time: 5.0,
            allow_combat_while_moving: false,
            clear_alert_on_arrival: false,
            prefer_closest: true,
            prefer_farthest_from_target: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LookAtConfig {
    /// Degrees per second.
    pub rotation_speed: f32,
    pub acceptable_angle: f32,
    /// Running out of time counts as success.
    pub max_time: f32,
    pub instant: bool,
    /// Added to actor targets so agents aim at the chest, not the feet.
    pub aim_height_offset: f32,
    /// The cached aim point is refreshed once the target moves farther than this on any axis.
    pub retarget_threshold: f32,
}

impl Default for LookAtConfig {
    fn default() -> Self {
        Self {
            rotation_speed: 180.0,
            acceptable_angle: 5.0,
            max_time: 3.0,
            instant: false,
            aim_height_offset: 80.0,
            retarget_threshold: 50.0,
        }
    }
}

/// Everything one kind of agent needs.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ArchetypeConfig {
    pub name: String,
    pub combat: CombatConfig,
    pub perception: PerceptionConfig,
    pub start_fire: StartFireConfig,
    pub strafe: StrafeConfig,
    pub search_pattern: SearchPatternConfig,
    pub investigate: InvestigateConfig,
    pub move_to_territory: MoveToTerritoryConfig,
    pub look_at: LookAtConfig,
}

impl ArchetypeConfig {
    /// Holds ground and backs off when rushed. Investigation chains into an area search.
    pub fn rifleman() -> Self {
        let mut config = Self {
            name: "rifleman".to_string(),
            ..Self::default()
        };
        config.investigate.clear_alert_on_failure = false;
        config
    }

    /// Circles its target at mid range and fires in bursts.
    pub fn skirmisher() -> Self {
        let mut config = Self {
            name: "skirmisher".to_string(),
            ..Self::default()
        };
        config.strafe = StrafeConfig::orbit(OrbitConfig::default());
        config.start_fire.use_burst_fire = true;
        config.start_fire.firing_duration = 8.0;
        config.search_pattern.pattern = SearchPattern::Spiral;
        config.investigate.clear_alert_on_failure = false;
        config.move_to_territory.destination = DestinationKind::CoverPoint;
        config
    }

    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Self::default()),
            "rifleman" => Some(Self::rifleman()),
            "skirmisher" => Some(Self::skirmisher()),
            _ => None,
        }
    }

    pub const PRESETS: [&'static str; 3] = ["default", "rifleman", "skirmisher"];

    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.combat;
        if c.engagement_distance > c.disengagement_distance {
            return Err(ConfigError::HysteresisOrder {
                engagement: c.engagement_distance,
                disengagement: c.disengagement_distance,
            });
        }
        positive("combat.engagement_distance", c.engagement_distance)?;
        positive("combat.burst_fire_duration", c.burst_fire_duration)?;
        non_negative("combat.burst_fire_cooldown", c.burst_fire_cooldown)?;
        positive("combat.target_memory_duration", c.target_memory_duration)?;
        non_negative("combat.disengage_confirm_seconds", c.disengage_confirm_seconds)?;
        positive("combat.fire_rate", c.fire_rate)?;
        positive("combat.max_health", c.max_health)?;
        if c.magazine_size == 0 {
            return Err(ConfigError::ZeroCount("combat.magazine_size"));
        }
        if !(0.0..=1.0).contains(&c.retreat_health_ratio) {
            return Err(ConfigError::OutOfRange {
                field: "combat.retreat_health_ratio",
                value: c.retreat_health_ratio,
            });
        }

        let p = &self.perception;
        ordered(
            "perception.sight_radius",
            p.sight_radius,
            p.lose_sight_radius,
        )?;
        positive("perception.peripheral_vision_degrees", p.peripheral_vision_degrees)?;

        let f = &self.start_fire;
        ordered("start_fire.range", f.min_range, f.max_range)?;
        non_negative("start_fire.firing_duration", f.firing_duration)?;
        non_negative("start_fire.aiming_time", f.aiming_time)?;
        positive("start_fire.ammo_check_interval", f.ammo_check_interval)?;

        match &self.strafe.mode {
            StrafeMode::Retreat(r) => {
                ordered(
                    "strafe.retreat_distance",
                    r.retreat_start_distance,
                    r.retreat_target_distance,
                )?;
                positive("strafe.speed", r.speed)?;
                positive("strafe.max_execution_time", r.max_execution_time)?;
            }
            StrafeMode::Orbit(o) => {
                positive("strafe.optimal_distance", o.optimal_distance)?;
                if o.distance_tolerance <= 0.0 || o.distance_tolerance >= o.optimal_distance {
                    return Err(ConfigError::OutOfRange {
                        field: "strafe.distance_tolerance",
                        value: o.distance_tolerance,
                    });
                }
                positive("strafe.direction_change_interval", o.direction_change_interval)?;
                positive("strafe.max_execution_time", o.max_execution_time)?;
                positive("strafe.speed", o.speed)?;
            }
        }

        let s = &self.search_pattern;
        positive("search_pattern.search_radius", s.search_radius)?;
        positive("search_pattern.max_search_time", s.max_search_time)?;
        match s.pattern {
            SearchPattern::Grid if s.grid_size < 2 => {
                return Err(ConfigError::ZeroCount("search_pattern.grid_size"))
            }
            SearchPattern::Linear if s.linear_lines < 2 => {
                return Err(ConfigError::ZeroCount("search_pattern.linear_lines"))
            }
            SearchPattern::Custom if s.custom_points.is_empty() => {
                return Err(ConfigError::ZeroCount("search_pattern.custom_points"))
            }
            SearchPattern::Random | SearchPattern::Circular | SearchPattern::Spiral
                if s.point_count == 0 =>
            {
                return Err(ConfigError::ZeroCount("search_pattern.point_count"))
            }
            SearchPattern::Spiral if s.point_count < 2 => {
                return Err(ConfigError::ZeroCount("search_pattern.point_count"))
            }
            _ => {}
        }

        let i = &self.investigate;
        positive("investigate.max_time", i.max_time)?;
        positive("investigate.acceptance_radius", i.acceptance_radius)?;

        let m = &self.move_to_territory;
        positive("move_to_territory.max_search_radius", m.max_search_radius)?;
        positive("move_to_territory.max_move_time", m.max_move_time)?;

        let l = &self.look_at;
        positive("look_at.rotation_speed", l.rotation_speed)?;
        positive("look_at.max_time", l.max_time)?;

        Ok(())
    }

    #[cfg(feature = "serde")]
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    #[cfg(feature = "serde")]
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse by file extension (`yaml`, `yml` or `json`).
    #[cfg(feature = "serde")]
    pub fn from_str_with_extension(text: &str, extension: &str) -> Result<Self, ConfigError> {
        match extension.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Self::from_yaml_str(text),
            "json" => Self::from_json_str(text),
            other => Err(ConfigError::UnknownFormat(other.to_string())),
        }
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

fn ordered(field: &'static str, min: f32, max: f32) -> Result<(), ConfigError> {
    if min <= max {
        Ok(())
    } else {
        Err(ConfigError::InvertedRange { field, min, max })
    }
}
