mod support;

use support::{duel, facts_for, start_direct, TaskHarness, AGENT, PLAYER};
use warden_combat::tasks::{InvestigatePhase, InvestigateTask};
use warden_combat::{InvestigateConfig, TaskFailure};
use warden_core::facts::{IS_ALERT, IS_IN_COMBAT, LAST_KNOWN_PLAYER_LOCATION, TARGET_ACTOR};
use warden_core::{TaskResult, TaskStatus, Vec3};

const LAST_SEEN: Vec3 = Vec3::new(600.0, 0.0, 0.0);

fn brisk() -> InvestigateConfig {
    InvestigateConfig {
        acceptance_radius: 50.0,
        investigation_duration: 1.0,
        search_point_count: 3,
        search_radius: 200.0,
        wait_time: 0.5,
        max_time: 30.0,
        speed: 600.0,
        combat_clear_time: 2.0,
        ..InvestigateConfig::default()
    }
}

#[test]
fn start_requires_a_last_known_location() {
    let mut world = duel(Vec3::ZERO, Vec3::new(5000.0, 0.0, 0.0));
    let mut facts = facts_for(AGENT);
    let mut task = InvestigateTask::new(brisk());

    assert_eq!(start_direct(&mut task, &mut world, &mut facts), TaskStatus::Failed);
    assert_eq!(task.failure(), Some(TaskFailure::MissingDependency("last known location")));
}

#[test]
fn start_with_visible_target_fails() {
    let mut world = duel(Vec3::ZERO, Vec3::new(500.0, 0.0, 0.0));
    let mut facts = facts_for(AGENT);
    facts.set(TARGET_ACTOR, Some(PLAYER));
    facts.set(LAST_KNOWN_PLAYER_LOCATION, LAST_SEEN);
    let mut task = InvestigateTask::new(brisk());

    assert_eq!(start_direct(&mut task, &mut world, &mut facts), TaskStatus::Failed);
    assert_eq!(task.failure(), Some(TaskFailure::TargetPresent));
}

#[test]
fn start_plans_destination_and_search_ring() {
    let mut world = duel(Vec3::ZERO, Vec3::new(5000.0, 0.0, 0.0));
    let mut facts = facts_for(AGENT);
    facts.set(LAST_KNOWN_PLAYER_LOCATION, LAST_SEEN);
    let mut task = InvestigateTask::new(brisk());

    assert_eq!(start_direct(&mut task, &mut world, &mut facts), TaskStatus::Running);
    assert_eq!(task.phase(), InvestigatePhase::MovingToLastKnownLocation);
    assert_eq!(task.destination(), LAST_SEEN);
    assert_eq!(task.search_points().len(), 3);
    for point in task.search_points() {
        assert!((point.distance_2d(LAST_SEEN) - 200.0).abs() < 1.0);
    }
    assert!(facts.get(IS_ALERT));
    assert!(world.actor(AGENT).is_some_and(|a| a.is_moving()));
}

#[test]
fn already_at_location_starts_investigating() {
    let mut world = duel(LAST_SEEN, Vec3::new(5000.0, 0.0, 0.0));
    let mut facts = facts_for(AGENT);
    facts.set(LAST_KNOWN_PLAYER_LOCATION, LAST_SEEN + Vec3::new(20.0, 0.0, 0.0));
    let mut task = InvestigateTask::new(brisk());

    start_direct(&mut task, &mut world, &mut facts);
    assert_eq!(task.phase(), InvestigatePhase::InvestigatingAtLocation);
}

#[test]
fn full_investigation_runs_every_phase_and_stands_down() {
    let mut world = duel(Vec3::ZERO, Vec3::new(5000.0, 0.0, 0.0));
    let mut harness = TaskHarness::new();
    harness.facts.set(LAST_KNOWN_PLAYER_LOCATION, LAST_SEEN);
    harness.facts.set(IS_IN_COMBAT, true);
    harness.start(InvestigateTask::new(brisk()), &mut world);

    let mut combat_cleared_at = None;
    let result = harness.run_observed(&mut world, 300, |world, facts| {
        if combat_cleared_at.is_none() && !facts.get(IS_IN_COMBAT) {
            combat_cleared_at = world.actor(AGENT).map(|a| a.position);
        }
    });

    assert_eq!(result, Some(TaskResult::Succeeded));
    assert!(combat_cleared_at.is_some());
    assert!(!harness.facts.get(IS_ALERT));
    assert!(!harness.facts.get(IS_IN_COMBAT));
    // Ends near the last search point, not where it started.
    assert!(world.actor(AGENT).is_some_and(|a| a.position.distance_2d(LAST_SEEN) < 260.0));
}

#[test]
fn keeping_the_alert_when_configured() {
    let mut world = duel(Vec3::ZERO, Vec3::new(5000.0, 0.0, 0.0));
    let mut harness = TaskHarness::new();
    harness.facts.set(LAST_KNOWN_PLAYER_LOCATION, LAST_SEEN);
    let config = InvestigateConfig {
        clear_alert_on_failure: false,
        ..brisk()
    };
    harness.start(InvestigateTask::new(config), &mut world);

    assert_eq!(harness.run(&mut world, 300), Some(TaskResult::Succeeded));
    assert!(harness.facts.get(IS_ALERT));
}

#[test]
fn sighting_during_investigation_succeeds() {
    let mut world = duel(Vec3::ZERO, Vec3::new(5000.0, 0.0, 0.0));
    let mut harness = TaskHarness::new();
    harness.facts.set(LAST_KNOWN_PLAYER_LOCATION, LAST_SEEN);
    harness.start(InvestigateTask::new(brisk()), &mut world);
    harness.run(&mut world, 3);

    harness.facts.set(TARGET_ACTOR, Some(PLAYER));
    assert_eq!(harness.step(&mut world), Some(TaskResult::Succeeded));
    assert!(harness.facts.get(IS_ALERT));
}

#[test]
fn investigation_times_out_and_clears_state() {
    let mut world = duel(Vec3::ZERO, Vec3::new(5000.0, 0.0, 0.0));
    let mut harness = TaskHarness::new();
    harness.facts.set(LAST_KNOWN_PLAYER_LOCATION, LAST_SEEN);
    harness.facts.set(IS_IN_COMBAT, true);
    let config = InvestigateConfig {
        max_time: 1.5,
        investigation_duration: 10.0,
        ..brisk()
    };
    harness.start(InvestigateTask::new(config), &mut world);

    assert_eq!(harness.run(&mut world, 30), Some(TaskResult::Failed));
    assert!(!harness.facts.get(IS_ALERT));
    assert!(!harness.facts.get(IS_IN_COMBAT));
}

#[test]
fn timeout_keeps_the_alert_when_configured_to() {
    let mut world = duel(Vec3::ZERO, Vec3::new(5000.0, 0.0, 0.0));
    let mut harness = TaskHarness::new();
    harness.facts.set(LAST_KNOWN_PLAYER_LOCATION, LAST_SEEN);
    let config = InvestigateConfig {
        max_time: 1.5,
        investigation_duration: 10.0,
        clear_alert_on_failure: false,
        ..brisk()
    };
    harness.start(InvestigateTask::new(config), &mut world);
    assert!(harness.facts.get(IS_ALERT));

    assert_eq!(harness.run(&mut world, 30), Some(TaskResult::Failed));
    assert!(harness.facts.get(IS_ALERT), "a search can still follow");
}

#[test]
fn unreachable_location_completes_immediately() {
    let mut world = duel(Vec3::ZERO, Vec3::new(5000.0, 0.0, 0.0));
    world.reject_next_moves(1);
    let mut facts = facts_for(AGENT);
    facts.set(LAST_KNOWN_PLAYER_LOCATION, LAST_SEEN);
    let mut task = InvestigateTask::new(brisk());

    assert_eq!(start_direct(&mut task, &mut world, &mut facts), TaskStatus::Running);
    assert_eq!(task.phase(), InvestigatePhase::Completed);
}
