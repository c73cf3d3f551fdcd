mod support;

use support::{ctx, duel, AGENT, DT, PLAYER};
use warden_combat::sim::{SimActor, SimWorld};
use warden_combat::tasks::{INVESTIGATE, LOOK_AT, MOVE_TO_TERRITORY, SEARCH_PATTERN, START_FIRE, STRAFE};
use warden_combat::{
    tick_controllers, AgentController, AlertStep, AnimationCue, ArchetypeConfig, CombatMode,
    InvestigateConfig, MoveToTerritoryConfig, SearchPatternConfig, TerritoryId, TerritoryOwner,
    NO_TARGET_DISTANCE,
};
use warden_core::facts::{
    FIRE_DISTANCE, IS_ALERT, IS_BURST_FIRING, IS_IN_COMBAT, LAST_KNOWN_PLAYER_LOCATION,
    SELF_ACTOR, TARGET_ACTOR,
};
use warden_core::{ActorId, Fact, TaskKind, Vec3};
use warden_tools::{TraceLog, TRACE_LOG};

/// A possessed agent in a sim world, with perception wired in.
struct Scenario {
    world: SimWorld,
    controller: AgentController<SimWorld>,
    tick: u64,
    perceive: bool,
}

impl Scenario {
    fn new(world: SimWorld, config: ArchetypeConfig) -> Self {
        let mut controller = AgentController::new(AGENT, config);
        controller.possess(AGENT);
        controller.facts_mut().attach(TRACE_LOG, TraceLog::default());
        Self {
            world,
            controller,
            tick: 0,
            perceive: true,
        }
    }

    fn step(&mut self) {
        self.tick += 1;
        let ctx = ctx(self.tick);
        self.world.step(DT);
        if self.perceive {
            for (actor, seen) in self.world.sense(AGENT) {
                self.controller.on_target_sensed(&ctx, &self.world, actor, seen);
            }
        }
        self.controller.tick(&ctx, &mut self.world);
    }

    fn run(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.step();
        }
    }

    /// Step until `done` holds, returning whether it did within `max` ticks.
    fn run_until(&mut self, max: u64, mut done: impl FnMut(&Self) -> bool) -> bool {
        for _ in 0..max {
            self.step();
            if done(self) {
                return true;
            }
        }
        false
    }

    fn now(&self) -> f32 {
        ctx(self.tick).time_seconds
    }

    fn task(&self) -> Option<TaskKind> {
        self.controller.current_task()
    }

    fn agent(&self) -> &SimActor {
        self.world.actor(AGENT).expect("agent spawned")
    }

    fn trace(&self) -> TraceLog {
        self.controller
            .facts()
            .attachment(TRACE_LOG)
            .cloned()
            .unwrap_or_default()
    }
}

fn quick_alert(mut config: ArchetypeConfig) -> ArchetypeConfig {
    config.investigate = InvestigateConfig {
        acceptance_radius: 50.0,
        investigation_duration: 0.5,
        search_point_count: 2,
        search_radius: 200.0,
        wait_time: 0.2,
        speed: 600.0,
        ..config.investigate
    };
    config.search_pattern = SearchPatternConfig {
        search_radius: 200.0,
        point_count: 3,
        wait_time: 0.2,
        acceptance_radius: 50.0,
        speed: 600.0,
        ..config.search_pattern
    };
    config.move_to_territory = MoveToTerritoryConfig {
        acceptance_radius: 50.0,
        speed: 600.0,
        wait_time: 0.2,
        ..config.move_to_territory
    };
    config
}

#[test]
fn possession_declares_a_neutral_store() {
    let scenario = Scenario::new(duel(Vec3::ZERO, Vec3::new(5000.0, 0.0, 0.0)), ArchetypeConfig::default());
    let facts = scenario.controller.facts();

    assert!(scenario.controller.is_possessed());
    assert_eq!(facts.get(SELF_ACTOR), Some(AGENT));
    assert_eq!(facts.get(TARGET_ACTOR), None);
    assert!(!facts.get(IS_IN_COMBAT));
    assert!(!facts.get(IS_ALERT));
    assert!(!facts.get(IS_BURST_FIRING));
    assert_eq!(facts.get(FIRE_DISTANCE), 0.0);
    assert_eq!(scenario.controller.mode(), CombatMode::Patrolling);
}

#[test]
fn close_sighting_engages_and_opens_fire() {
    let mut scenario = Scenario::new(duel(Vec3::ZERO, Vec3::new(800.0, 0.0, 0.0)), ArchetypeConfig::rifleman());
    scenario.step();

    assert_eq!(scenario.controller.mode(), CombatMode::InCombat);
    assert_eq!(scenario.task(), Some(START_FIRE));
    let facts = scenario.controller.facts();
    assert!(facts.get(IS_IN_COMBAT));
    assert_eq!(facts.get(TARGET_ACTOR), Some(PLAYER));
    assert!((facts.get(FIRE_DISTANCE) - 800.0).abs() < 1.0);
    assert_eq!(facts.get(LAST_KNOWN_PLAYER_LOCATION), Vec3::new(800.0, 0.0, 0.0));
    assert!(scenario
        .world
        .animations()
        .contains(&(AGENT, AnimationCue::InCombat(true))));

    scenario.run(15);
    assert!(scenario.agent().shots_fired > 0);
}

#[test]
fn rushed_agent_strafes_instead_of_firing() {
    let mut scenario = Scenario::new(duel(Vec3::ZERO, Vec3::new(500.0, 0.0, 0.0)), ArchetypeConfig::rifleman());
    scenario.step();

    assert_eq!(scenario.controller.mode(), CombatMode::InCombat);
    assert_eq!(scenario.task(), Some(STRAFE));
}

#[test]
fn misaligned_agent_turns_before_firing() {
    let mut world = duel(Vec3::ZERO, Vec3::new(0.0, 800.0, 0.0));
    world.actor_mut(AGENT).expect("agent").yaw = 60.0;
    let mut scenario = Scenario::new(world, ArchetypeConfig::rifleman());
    scenario.step();

    assert_eq!(scenario.controller.mode(), CombatMode::InCombat);
    assert_eq!(scenario.task(), Some(LOOK_AT));
    assert!(scenario.run_until(30, |s| s.task() == Some(START_FIRE)));
}

#[test]
fn distant_sighting_raises_the_alert_only() {
    let mut scenario = Scenario::new(duel(Vec3::ZERO, Vec3::new(1300.0, 0.0, 0.0)), ArchetypeConfig::rifleman());
    scenario.run(5);

    assert_eq!(scenario.controller.mode(), CombatMode::Alert);
    assert!(scenario.controller.facts().get(IS_ALERT));
    assert_eq!(scenario.task(), None, "aligned with a visible target: just watch");
}

#[test]
fn damage_enters_combat_in_the_same_call() {
    let mut scenario = Scenario::new(duel(Vec3::ZERO, Vec3::new(-600.0, 0.0, 0.0)), ArchetypeConfig::rifleman());
    scenario.step();
    assert_eq!(scenario.controller.mode(), CombatMode::Patrolling, "player is behind the agent");

    let ctx = ctx(scenario.tick);
    scenario.controller.on_damage(&ctx, &scenario.world, PLAYER);
    assert_eq!(scenario.controller.mode(), CombatMode::InCombat);
    assert_eq!(scenario.controller.facts().get(TARGET_ACTOR), Some(PLAYER));
    assert!(scenario.controller.facts().get(IS_IN_COMBAT));

    let other = ActorId(9);
    scenario.world.spawn(other, SimActor::new(Vec3::new(0.0, 900.0, 0.0)).with_team(2));
    scenario.controller.on_damage(&ctx, &scenario.world, PLAYER);
    assert_eq!(scenario.controller.mode_controller().target(), Some(PLAYER));
    scenario.controller.on_damage(&ctx, &scenario.world, other);
    assert_eq!(scenario.controller.mode_controller().target(), Some(other));
}

#[test]
fn target_beyond_disengagement_distance_triggers_investigation() {
    let mut scenario = Scenario::new(duel(Vec3::ZERO, Vec3::new(800.0, 0.0, 0.0)), ArchetypeConfig::rifleman());
    scenario.run(3);
    assert_eq!(scenario.controller.mode(), CombatMode::InCombat);

    // Still inside lose-sight range, so perception keeps it visible.
    scenario.world.place(PLAYER, Vec3::new(1900.0, 0.0, 0.0));
    scenario.run(3);
    assert_eq!(scenario.controller.mode(), CombatMode::InCombat, "confirm time not yet elapsed");

    assert!(scenario.run_until(10, |s| s.controller.mode() == CombatMode::Alert));
    assert_eq!(scenario.task(), Some(INVESTIGATE));
    let facts = scenario.controller.facts();
    assert_eq!(facts.get(LAST_KNOWN_PLAYER_LOCATION), Vec3::new(1900.0, 0.0, 0.0));
    assert_eq!(facts.get(TARGET_ACTOR), None);
    assert_eq!(facts.get(FIRE_DISTANCE), NO_TARGET_DISTANCE);
    assert!(!scenario.agent().is_firing());
    let goal = scenario.agent().move_goal().expect("walking to the last known location");
    assert!(goal.distance_2d(Vec3::new(1900.0, 0.0, 0.0)) < 1.0);
}

#[test]
fn memory_expiry_drops_combat_to_alert() {
    let world = duel(Vec3::ZERO, Vec3::new(-600.0, 0.0, 0.0));
    let mut scenario = Scenario::new(world, ArchetypeConfig::rifleman());
    scenario.perceive = false;
    scenario.step();
    let ctx = ctx(scenario.tick);
    scenario.controller.on_damage(&ctx, &scenario.world, PLAYER);
    let hit_at = scenario.now();

    assert!(scenario.run_until(200, |s| s.controller.mode() != CombatMode::InCombat));
    let memory = scenario.controller.memory().duration();
    assert!(scenario.now() - hit_at >= memory - 1e-3);
    assert!(scenario.now() - hit_at < memory + 0.2);
    assert_eq!(scenario.controller.mode(), CombatMode::Alert);
    assert_eq!(scenario.task(), Some(INVESTIGATE));
    assert!(!scenario.agent().is_firing());
}

#[test]
fn alert_chain_ends_in_patrol_and_a_walk_home() {
    let config = quick_alert(ArchetypeConfig::rifleman());
    let mut scenario = Scenario::new(duel(Vec3::ZERO, Vec3::new(1300.0, 0.0, 0.0)), config);
    scenario.run(2);
    assert_eq!(scenario.controller.mode(), CombatMode::Alert);

    scenario.world.place(PLAYER, Vec3::new(4000.0, 4000.0, 0.0));
    assert!(scenario.run_until(20, |s| s.task() == Some(INVESTIGATE)));
    assert!(scenario.run_until(400, |s| s.task() == Some(SEARCH_PATTERN)));
    assert_eq!(scenario.controller.alert_step(), AlertStep::Search);
    assert!(scenario.run_until(400, |s| s.controller.mode() == CombatMode::Patrolling));
    assert!(scenario.run_until(5, |s| s.task() == Some(MOVE_TO_TERRITORY)));
    assert!(scenario.run_until(400, |s| s.task().is_none()));

    assert!(scenario.agent().position.distance_2d(Vec3::ZERO) <= 51.0);
    assert!(!scenario.controller.facts().get(IS_ALERT));

    let modes: Vec<u64> = scenario.trace().with_tag("mode").map(|e| e.a).collect();
    assert_eq!(modes, vec![1, 0]);
    assert!(scenario
        .world
        .animations()
        .contains(&(AGENT, AnimationCue::Alert(false))));
}

#[test]
fn resighting_during_search_restarts_the_alert_chain() {
    let config = quick_alert(ArchetypeConfig::rifleman());
    let mut scenario = Scenario::new(duel(Vec3::ZERO, Vec3::new(1300.0, 0.0, 0.0)), config);
    scenario.run(2);
    scenario.world.place(PLAYER, Vec3::new(4000.0, 4000.0, 0.0));
    assert!(scenario.run_until(400, |s| s.task() == Some(SEARCH_PATTERN)));

    // Back in view, but beyond engagement range.
    let agent = scenario.agent().clone();
    let seen_at = agent.position + Vec3::from_yaw_degrees(agent.yaw) * 1350.0;
    scenario.world.place(PLAYER, seen_at);
    assert!(scenario.run_until(5, |s| s.controller.memory().is_visible()));
    scenario.run(2);
    assert_eq!(scenario.controller.mode(), CombatMode::Alert);
    assert_eq!(scenario.controller.alert_step(), AlertStep::Investigate);

    scenario.world.place(PLAYER, Vec3::new(-4000.0, -4000.0, 0.0));
    assert!(scenario.run_until(10, |s| s.task() == Some(INVESTIGATE)));
    assert_eq!(scenario.controller.mode(), CombatMode::Alert);
    assert_eq!(scenario.controller.facts().get(LAST_KNOWN_PLAYER_LOCATION), seen_at);
    let goal = scenario.agent().move_goal().expect("walking to the new last known location");
    assert!(goal.distance_2d(seen_at) < 1.0);
}

#[test]
fn losing_an_unrelated_actor_keeps_the_target() {
    let mut scenario = Scenario::new(duel(Vec3::ZERO, Vec3::new(1300.0, 0.0, 0.0)), ArchetypeConfig::rifleman());
    scenario.run(2);
    assert_eq!(scenario.controller.mode(), CombatMode::Alert);
    let distance = scenario.controller.facts().get(FIRE_DISTANCE);
    assert!(distance < NO_TARGET_DISTANCE);

    let ctx = ctx(scenario.tick);
    scenario
        .controller
        .on_target_sensed(&ctx, &scenario.world, ActorId(9), false);
    let facts = scenario.controller.facts();
    assert_eq!(facts.get(TARGET_ACTOR), Some(PLAYER));
    assert_eq!(facts.get(FIRE_DISTANCE), distance);

    scenario
        .controller
        .on_target_sensed(&ctx, &scenario.world, PLAYER, false);
    let facts = scenario.controller.facts();
    assert_eq!(facts.get(TARGET_ACTOR), None);
    assert_eq!(facts.get(FIRE_DISTANCE), NO_TARGET_DISTANCE);
}

#[test]
fn investigation_without_chaining_goes_straight_to_patrol() {
    let config = quick_alert(ArchetypeConfig::default());
    let mut scenario = Scenario::new(duel(Vec3::ZERO, Vec3::new(1300.0, 0.0, 0.0)), config);
    scenario.run(2);
    scenario.world.place(PLAYER, Vec3::new(4000.0, 4000.0, 0.0));

    let mut saw_search = false;
    let reached = scenario.run_until(400, |s| {
        saw_search |= s.task() == Some(SEARCH_PATTERN);
        s.controller.mode() == CombatMode::Patrolling
    });
    assert!(reached);
    assert!(!saw_search, "investigation cleared the alert itself");
}

#[test]
fn low_health_falls_back_to_friendly_territory() {
    let mut world = duel(Vec3::ZERO, Vec3::new(800.0, 0.0, 0.0));
    world
        .territories_mut()
        .add(TerritoryId(4), Vec3::new(-1200.0, 0.0, 0.0), TerritoryOwner::Friendly);
    world
        .territories_mut()
        .add(TerritoryId(5), Vec3::new(0.0, -1900.0, 0.0), TerritoryOwner::Friendly);
    let mut scenario = Scenario::new(world, ArchetypeConfig::rifleman());
    scenario.run(3);
    assert_eq!(scenario.task(), Some(START_FIRE));

    scenario.world.actor_mut(AGENT).expect("agent").health = 250.0;
    scenario.step();
    assert_eq!(scenario.controller.mode(), CombatMode::InCombat);
    assert_eq!(scenario.task(), Some(MOVE_TO_TERRITORY));
    assert_eq!(scenario.controller.claimed_territory(), Some(TerritoryId(4)));
    assert!(!scenario.agent().is_firing());

    assert!(scenario.run_until(300, |s| s.task() != Some(MOVE_TO_TERRITORY)));
    assert_eq!(scenario.controller.claimed_territory(), None);
}

#[test]
fn burst_fire_runs_its_duty_cycle() {
    let mut scenario = Scenario::new(duel(Vec3::ZERO, Vec3::new(1000.0, 0.0, 0.0)), ArchetypeConfig::skirmisher());
    assert!(scenario.run_until(20, |s| s.controller.facts().get(IS_BURST_FIRING)));
    let started = scenario.now();
    assert!(scenario.agent().is_firing() || scenario.agent().is_reloading());

    assert!(scenario.run_until(60, |s| !s.controller.facts().get(IS_BURST_FIRING)));
    let duration = scenario.controller.config().combat.burst_fire_duration;
    assert!((scenario.now() - started - duration).abs() < 0.15);
    assert!(!scenario.agent().is_firing());

    let trace = scenario.trace();
    assert_eq!(trace.count("burst_start"), 1);
    assert_eq!(trace.count("burst_stop"), 1);
}

#[test]
fn killing_the_target_ends_combat() {
    let mut scenario = Scenario::new(duel(Vec3::ZERO, Vec3::new(800.0, 0.0, 0.0)), ArchetypeConfig::rifleman());
    scenario.run(3);
    scenario.world.apply_damage(PLAYER, 5000.0);
    scenario.step();

    assert_eq!(scenario.controller.mode(), CombatMode::Alert);
    assert_eq!(scenario.controller.facts().get(TARGET_ACTOR), None);
    assert!(!scenario.agent().is_firing());
}

#[test]
fn unpossess_aborts_and_forgets() {
    let mut scenario = Scenario::new(duel(Vec3::ZERO, Vec3::new(800.0, 0.0, 0.0)), ArchetypeConfig::rifleman());
    scenario.run(10);
    assert_eq!(scenario.task(), Some(START_FIRE));

    let ctx = ctx(scenario.tick);
    scenario.controller.unpossess(&ctx, &mut scenario.world);
    assert!(!scenario.controller.is_possessed());
    assert_eq!(scenario.task(), None);
    assert_eq!(scenario.controller.mode(), CombatMode::Patrolling);
    assert!(scenario.controller.memory().record().is_none());
    assert_eq!(scenario.controller.facts().get(TARGET_ACTOR), None);
    assert!(!scenario.agent().is_firing());

    let finishes = scenario.trace().with_tag("task_finish").filter(|e| e.b == 2).count();
    assert_eq!(finishes, 1);

    let generation = scenario.controller.task_generation();
    scenario.run(5);
    assert_eq!(scenario.controller.task_generation(), generation, "an unpossessed controller is inert");
}

#[test]
fn trace_records_facts_and_tasks() {
    let mut scenario = Scenario::new(duel(Vec3::ZERO, Vec3::new(800.0, 0.0, 0.0)), ArchetypeConfig::rifleman());
    scenario.step();
    let trace = scenario.trace();

    assert_eq!(trace.count("sensed"), 1);
    let mode = trace.first("mode").expect("mode event");
    assert_eq!((mode.a, mode.b), (2, PLAYER.raw()));
    assert_eq!(trace.first("task_start").map(|e| e.a), Some(0));
    let facts: Vec<u64> = trace.with_tag("fact").map(|e| e.a).collect();
    assert!(facts.contains(&(Fact::IsInCombat as u64)));
    assert!(facts.contains(&(Fact::TargetActor as u64)));
    assert!(!facts.contains(&(Fact::FireDistance as u64)), "only discrete facts are traced");
    assert!(trace.events.iter().all(|e| e.agent == AGENT.raw() && e.tick == 1));
}

fn skirmish_run() -> (TraceLog, Vec3) {
    let mut world = duel(Vec3::ZERO, Vec3::new(600.0, 200.0, 0.0));
    world.spawn(ActorId(3), SimActor::new(Vec3::new(-300.0, 100.0, 0.0)).with_team(1));
    let mut scenario = Scenario::new(world, ArchetypeConfig::skirmisher());
    scenario.run(150);
    (scenario.trace(), scenario.agent().position)
}

#[test]
fn identical_inputs_replay_identically() {
    let (first_trace, first_position) = skirmish_run();
    let (second_trace, second_position) = skirmish_run();

    assert!(!first_trace.is_empty());
    assert_eq!(first_trace, second_trace);
    assert_eq!(first_position, second_position);
}

#[test]
fn controllers_tick_in_stable_agent_order() {
    let mut world = SimWorld::open();
    world.spawn(ActorId(1), SimActor::new(Vec3::ZERO).with_team(1));
    world.spawn(ActorId(7), SimActor::new(Vec3::new(0.0, 300.0, 0.0)).with_team(1));
    let mut controllers = vec![
        AgentController::new(ActorId(7), ArchetypeConfig::default()),
        AgentController::new(ActorId(1), ArchetypeConfig::default()),
    ];
    for controller in &mut controllers {
        let agent = controller.agent();
        controller.possess(agent);
    }

    tick_controllers(&ctx(1), &mut world, &mut controllers);
    let order: Vec<ActorId> = controllers.iter().map(|c| c.agent()).collect();
    assert_eq!(order, vec![ActorId(1), ActorId(7)]);
}
