//! Reference world: a handful of actors on a navigation backend, with simple weapons and
//! distance/cone/raycast perception.
//!
//! Movement follows accepted move requests with a [`PathFollower`]; yaw only changes through
//! [`NavWorldMut::set_yaw_degrees`]. Weapons spend one round per `fire_interval` while the
//! trigger is held and refill after `reload_time`.

use std::collections::BTreeMap;

use warden_core::{angle_between_degrees, ActorId, Vec3, WorldMut, WorldView};
use warden_nav::{
    MoveRequest, MoveResult, NavWorldMut, NavWorldView, NavigationOracle, OpenGround,
    PathFollower,
};

use crate::{
    AnimationCue, CombatWorldMut, CombatWorldView, DestinationKind, PerceptionConfig,
    TerritoryRegistry,
};

#[derive(Debug, Clone)]
pub struct SimActor {
    pub position: Vec3,
    pub yaw: f32,
    pub alive: bool,
    pub health: f32,
    pub max_health: f32,
    pub ammo: u32,
    pub magazine: u32,
    pub team: u32,
    pub spawn: Vec3,
    pub move_speed: f32,
    pub is_character: bool,
    firing: bool,
    fire_accumulator: f32,
    reload_remaining: Option<f32>,
    follower: Option<PathFollower>,
    /// Rounds spent.
    pub shots_fired: u32,
    /// `start_fire` calls received.
    pub fire_starts: u32,
    pub move_requests: u32,
}

impl SimActor {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            yaw: 0.0,
            alive: true,
            health: 1000.0,
            max_health: 1000.0,
            ammo: 30,
            magazine: 30,
            team: 0,
            spawn: position,
            move_speed: 250.0,
            is_character: true,
            firing: false,
            fire_accumulator: 0.0,
            reload_remaining: None,
            follower: None,
            shots_fired: 0,
            fire_starts: 0,
            move_requests: 0,
        }
    }

    pub fn with_team(mut self, team: u32) -> Self {
        self.team = team;
        self
    }

    pub fn with_yaw(mut self, yaw: f32) -> Self {
        self.yaw = yaw;
        self
    }

    pub fn with_health(mut self, health: f32, max_health: f32) -> Self {
        self.health = health;
        self.max_health = max_health;
        self
    }

    pub fn with_magazine(mut self, ammo: u32, magazine: u32) -> Self {
        self.ammo = ammo;
        self.magazine = magazine;
        self
    }

    pub fn facing(mut self, point: Vec3) -> Self {
        let to = (point - self.position).flat();
        if !to.is_zero() {
            self.yaw = to.yaw_degrees();
        }
        self
    }

    pub fn is_firing(&self) -> bool {
        self.firing
    }

    pub fn is_reloading(&self) -> bool {
        self.reload_remaining.is_some()
    }

    pub fn is_moving(&self) -> bool {
        self.follower.is_some()
    }

    pub fn move_goal(&self) -> Option<Vec3> {
        self.follower.as_ref().map(PathFollower::goal)
    }
}

pub struct SimWorld {
    actors: BTreeMap<ActorId, SimActor>,
    navigator: Box<dyn NavigationOracle>,
    territories: TerritoryRegistry,
    landmarks: BTreeMap<DestinationKind, Vec<Vec3>>,
    perception: PerceptionConfig,
    visibility: BTreeMap<(ActorId, ActorId), bool>,
    fire_interval: f32,
    reload_time: f32,
    reject_moves: u32,
    animations: Vec<(ActorId, AnimationCue)>,
}

impl SimWorld {
    pub fn new(navigator: impl NavigationOracle + 'static) -> Self {
        Self {
            actors: BTreeMap::new(),
            navigator: Box::new(navigator),
            territories: TerritoryRegistry::new(),
            landmarks: BTreeMap::new(),
            perception: PerceptionConfig::default(),
            visibility: BTreeMap::new(),
            fire_interval: 0.1,
            reload_time: 2.0,
            reject_moves: 0,
            animations: Vec::new(),
        }
    }

    /// Unbounded flat floor at z = 0.
    pub fn open() -> Self {
        Self::new(OpenGround::default())
    }

    pub fn with_perception(mut self, perception: PerceptionConfig) -> Self {
        self.perception = perception;
        self
    }

    pub fn with_weapon_timing(mut self, fire_interval: f32, reload_time: f32) -> Self {
        self.fire_interval = fire_interval.max(f32::EPSILON);
        self.reload_time = reload_time.max(0.0);
        self
    }

    pub fn spawn(&mut self, id: ActorId, actor: SimActor) {
        self.actors.insert(id, actor);
    }

    pub fn actor(&self, id: ActorId) -> Option<&SimActor> {
        self.actors.get(&id)
    }

    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut SimActor> {
        self.actors.get_mut(&id)
    }

    pub fn actors(&self) -> impl Iterator<Item = (ActorId, &SimActor)> {
        self.actors.iter().map(|(id, a)| (*id, a))
    }

    pub fn territories_mut(&mut self) -> &mut TerritoryRegistry {
        &mut self.territories
    }

    pub fn add_landmark(&mut self, kind: DestinationKind, position: Vec3) {
        self.landmarks.entry(kind).or_default().push(position);
    }

    /// Reject the next `count` move requests, whoever makes them.
    pub fn reject_next_moves(&mut self, count: u32) {
        self.reject_moves = count;
    }

    pub fn animations(&self) -> &[(ActorId, AnimationCue)] {
        &self.animations
    }

    /// Teleport, dropping any move in progress.
    pub fn place(&mut self, id: ActorId, position: Vec3) {
        if let Some(actor) = self.actors.get_mut(&id) {
            actor.position = position;
            actor.follower = None;
        }
    }

    /// Apply damage. Returns `true` when this hit killed the actor.
    pub fn apply_damage(&mut self, id: ActorId, amount: f32) -> bool {
        let Some(actor) = self.actors.get_mut(&id) else {
            return false;
        };
        if !actor.alive {
            return false;
        }
        actor.health = (actor.health - amount).max(0.0);
        if actor.health <= 0.0 {
            actor.alive = false;
            actor.firing = false;
            actor.follower = None;
            tracing::debug!(actor = %id, "actor killed");
            return true;
        }
        false
    }

    /// Advance movement and weapons by `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        let fire_interval = self.fire_interval;
        for actor in self.actors.values_mut().filter(|a| a.alive) {
            if let Some(follower) = actor.follower.as_mut() {
                actor.position = follower.advance(actor.position, actor.move_speed * dt);
                if follower.is_done(actor.position) {
                    actor.follower = None;
                }
            }

            if let Some(remaining) = actor.reload_remaining.as_mut() {
                *remaining -= dt;
                if *remaining <= 0.0 {
                    actor.reload_remaining = None;
                    actor.ammo = actor.magazine;
                }
            }

            if actor.firing && actor.reload_remaining.is_none() {
                actor.fire_accumulator += dt;
                while actor.fire_accumulator >= fire_interval && actor.ammo > 0 {
                    actor.fire_accumulator -= fire_interval;
                    actor.ammo -= 1;
                    actor.shots_fired += 1;
                }
                if actor.ammo == 0 {
                    actor.fire_accumulator = 0.0;
                }
            } else {
                actor.fire_accumulator = 0.0;
            }
        }
    }

    /// Acquiring needs the sight radius and the view cone; keeping needs only the larger
    /// lose-sight radius. Both need a clear raycast.
    fn can_see(
        &self,
        observer: &SimActor,
        observer_id: ActorId,
        other: ActorId,
        was_visible: bool,
    ) -> bool {
        let Some(target) = self.actors.get(&other).filter(|a| a.alive) else {
            return false;
        };
        let distance = observer.position.distance(target.position);
        if !self.has_line_of_sight(observer_id, other) {
            return false;
        }
        if was_visible {
            return distance <= self.perception.lose_sight_radius;
        }
        let to_target = (target.position - observer.position).flat();
        let forward = Vec3::from_yaw_degrees(observer.yaw);
        distance <= self.perception.sight_radius
            && (to_target.is_zero()
                || angle_between_degrees(forward, to_target)
                    <= self.perception.peripheral_vision_degrees)
    }

    /// One perception cycle for `observer`: the hostile actors whose visibility changed, with
    /// `true` for gained and `false` for lost.
    pub fn sense(&mut self, observer: ActorId) -> Vec<(ActorId, bool)> {
        let Some(me) = self.actors.get(&observer).filter(|a| a.alive).cloned() else {
            return Vec::new();
        };
        let others: Vec<ActorId> = self
            .actors
            .iter()
            .filter(|(id, a)| **id != observer && a.team != me.team)
            .map(|(id, _)| *id)
            .collect();

        let mut changes = Vec::new();
        for other in others {
            let was_visible = self
                .visibility
                .get(&(observer, other))
                .copied()
                .unwrap_or(false);
            let visible = self.can_see(&me, observer, other, was_visible);
            if visible != was_visible {
                self.visibility.insert((observer, other), visible);
                changes.push((other, visible));
            }
        }
        changes
    }
}

impl WorldView for SimWorld {
    type Agent = ActorId;

    fn actor_position(&self, actor: ActorId) -> Option<Vec3> {
        self.actors
            .get(&actor)
            .filter(|a| a.alive)
            .map(|a| a.position)
    }

    fn is_alive(&self, actor: ActorId) -> bool {
        self.actors.get(&actor).is_some_and(|a| a.alive)
    }
}

impl WorldMut for SimWorld {}

impl NavWorldView for SimWorld {
    fn position(&self, agent: ActorId) -> Option<Vec3> {
        self.actors.get(&agent).map(|a| a.position)
    }

    fn yaw_degrees(&self, agent: ActorId) -> Option<f32> {
        self.actors.get(&agent).map(|a| a.yaw)
    }

    fn navigator(&self) -> &dyn NavigationOracle {
        self.navigator.as_ref()
    }

    fn is_moving(&self, agent: ActorId) -> bool {
        self.actors.get(&agent).is_some_and(SimActor::is_moving)
    }
}

impl NavWorldMut for SimWorld {
    fn request_move(&mut self, agent: ActorId, request: MoveRequest) -> MoveResult {
        if self.reject_moves > 0 {
            self.reject_moves -= 1;
            if let Some(actor) = self.actors.get_mut(&agent) {
                actor.move_requests += 1;
            }
            return MoveResult::Rejected;
        }
        let Some(from) = self.actors.get(&agent).filter(|a| a.alive).map(|a| a.position) else {
            return MoveResult::Rejected;
        };
        let (result, follower) = PathFollower::plan(self.navigator.as_ref(), from, &request);
        if let Some(actor) = self.actors.get_mut(&agent) {
            actor.move_requests += 1;
            actor.follower = follower;
        }
        result
    }

    fn stop_movement(&mut self, agent: ActorId) {
        if let Some(actor) = self.actors.get_mut(&agent) {
            actor.follower = None;
        }
    }

    fn set_move_speed(&mut self, agent: ActorId, speed: f32) {
        if let Some(actor) = self.actors.get_mut(&agent) {
            actor.move_speed = speed.max(0.0);
        }
    }

    fn set_yaw_degrees(&mut self, agent: ActorId, yaw: f32) {
        if let Some(actor) = self.actors.get_mut(&agent) {
            actor.yaw = yaw;
        }
    }
}

impl CombatWorldView for SimWorld {
    fn actor_forward(&self, actor: ActorId) -> Option<Vec3> {
        self.actors
            .get(&actor)
            .filter(|a| a.alive)
            .map(|a| Vec3::from_yaw_degrees(a.yaw))
    }

    fn is_character(&self, actor: ActorId) -> bool {
        self.actors.get(&actor).is_some_and(|a| a.is_character)
    }

    fn has_line_of_sight(&self, agent: ActorId, target: ActorId) -> bool {
        match (self.position(agent), self.actor_position(target)) {
            (Some(from), Some(to)) => self.navigator.raycast(from, to).is_none(),
            _ => false,
        }
    }

    fn territories(&self) -> &TerritoryRegistry {
        &self.territories
    }

    fn health_ratio(&self, agent: ActorId) -> f32 {
        self.actors
            .get(&agent)
            .filter(|a| a.max_health > 0.0)
            .map_or(0.0, |a| a.health / a.max_health)
    }

    fn landmarks(&self, kind: DestinationKind) -> Vec<Vec3> {
        self.landmarks.get(&kind).cloned().unwrap_or_default()
    }

    fn ally_positions(&self, agent: ActorId) -> Vec<Vec3> {
        let Some(team) = self.actors.get(&agent).map(|a| a.team) else {
            return Vec::new();
        };
        self.actors
            .iter()
            .filter(|(id, a)| **id != agent && a.alive && a.team == team)
            .map(|(_, a)| a.position)
            .collect()
    }

    fn spawn_point(&self, agent: ActorId) -> Option<Vec3> {
        self.actors.get(&agent).map(|a| a.spawn)
    }

    fn current_ammo(&self, agent: ActorId) -> u32 {
        self.actors.get(&agent).map_or(0, |a| a.ammo)
    }

    fn is_firing(&self, agent: ActorId) -> bool {
        self.actors.get(&agent).is_some_and(|a| a.firing)
    }
}

impl CombatWorldMut for SimWorld {
    fn start_fire(&mut self, agent: ActorId) {
        if let Some(actor) = self.actors.get_mut(&agent).filter(|a| a.alive) {
            actor.firing = true;
            actor.fire_starts += 1;
        }
    }

    fn stop_fire(&mut self, agent: ActorId) {
        if let Some(actor) = self.actors.get_mut(&agent) {
            actor.firing = false;
        }
    }

    fn reload(&mut self, agent: ActorId) {
        let reload_time = self.reload_time;
        if let Some(actor) = self.actors.get_mut(&agent).filter(|a| a.alive) {
            if actor.reload_remaining.is_none() && actor.ammo < actor.magazine {
                actor.reload_remaining = Some(reload_time);
            }
        }
    }

    fn notify_animation(&mut self, agent: ActorId, cue: AnimationCue) {
        self.animations.push((agent, cue));
    }
}
