#![cfg(feature = "serde")]

use warden_combat::{
    ArchetypeConfig, CombatMode, ConfigError, DestinationKind, SearchPattern, StrafeMode,
    TerritoryId, TerritoryOwner, TerritoryRegistry,
};
use warden_core::Vec3;

#[test]
fn archetype_yaml_roundtrip() {
    let config = ArchetypeConfig::skirmisher();
    let yaml = serde_yaml::to_string(&config).expect("serialize");
    let parsed = ArchetypeConfig::from_yaml_str(&yaml).expect("parse");
    assert_eq!(parsed, config);
}

#[test]
fn archetype_json_roundtrip() {
    let config = ArchetypeConfig::rifleman();
    let json = serde_json::to_string_pretty(&config).expect("serialize");
    let parsed = ArchetypeConfig::from_json_str(&json).expect("parse");
    assert_eq!(parsed, config);
}

#[test]
fn partial_yaml_fills_in_defaults() {
    let yaml = r#"
name: sentry
combat:
  engagement_distance: 900
  burst_fire_cooldown: 2.5
search_pattern:
  pattern: Grid
  grid_size: 4
move_to_territory:
  destination: SafeZone
"#;
    let config = ArchetypeConfig::from_yaml_str(yaml).expect("parse");
    assert_eq!(config.name, "sentry");
    assert_eq!(config.combat.engagement_distance, 900.0);
    assert_eq!(config.combat.disengagement_distance, 1500.0);
    assert_eq!(config.combat.burst_fire_cooldown, 2.5);
    assert_eq!(config.search_pattern.pattern, SearchPattern::Grid);
    assert_eq!(config.search_pattern.grid_size, 4);
    assert_eq!(config.search_pattern.wait_time, 3.0);
    assert_eq!(config.move_to_territory.destination, DestinationKind::SafeZone);
    assert!(matches!(config.strafe.mode, StrafeMode::Retreat(_)));
}

#[test]
fn json_can_select_the_orbit_strafe() {
    let json = r#"{ "strafe": { "mode": { "Orbit": { "optimal_distance": 600 } } } }"#;
    let config = ArchetypeConfig::from_json_str(json).expect("parse");
    match config.strafe.mode {
        StrafeMode::Orbit(orbit) => {
            assert_eq!(orbit.optimal_distance, 600.0);
            assert_eq!(orbit.distance_tolerance, 80.0);
        }
        other => panic!("expected orbit, got {other:?}"),
    }
}

#[test]
fn loading_validates() {
    let yaml = "combat:\n  engagement_distance: 3000\n";
    assert!(matches!(
        ArchetypeConfig::from_yaml_str(yaml),
        Err(ConfigError::HysteresisOrder { .. })
    ));
    assert!(matches!(
        ArchetypeConfig::from_json_str("{ not json"),
        Err(ConfigError::Json(_))
    ));
}

#[test]
fn format_is_picked_by_extension() {
    let json = serde_json::to_string(&ArchetypeConfig::default()).expect("serialize");
    assert!(ArchetypeConfig::from_str_with_extension(&json, "JSON").is_ok());
    assert!(matches!(
        ArchetypeConfig::from_str_with_extension(&json, "toml"),
        Err(ConfigError::UnknownFormat(ext)) if ext == "toml"
    ));
}

#[test]
fn territory_registry_and_mode_roundtrip() {
    let mut registry = TerritoryRegistry::new();
    registry.add(TerritoryId(1), Vec3::new(100.0, 0.0, 0.0), TerritoryOwner::Friendly);
    registry.add(TerritoryId(2), Vec3::new(0.0, 250.0, 0.0), TerritoryOwner::Enemy);

    let json = serde_json::to_string(&registry).expect("serialize");
    let parsed: TerritoryRegistry = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(parsed, registry);

    let mode: CombatMode = serde_json::from_str("\"Alert\"").expect("deserialize");
    assert_eq!(mode, CombatMode::Alert);
}
