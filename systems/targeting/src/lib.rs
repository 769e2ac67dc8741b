#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Target selection and waypoint steering for AI-controlled units.
//!
//! Every unit is mapped onto an explicit [`Behavior`] from its faction and
//! kind. Flying units share the ground behaviours and only differ in ignoring
//! walls when steering.

use std::f32::consts::TAU;

use outbreak_core::{
    AiTuning, Faction, MoveTarget, Region, TileMap, Unit, UnitId, UnitKind, Vec2,
};
use outbreak_system_pathfinding::{find_path, furthest_visible_waypoint};
use outbreak_system_spatial::SpatialIndex;
use outbreak_system_visibility::has_obstacle;
use rand::Rng;
use tracing::{debug, trace};

/// Behaviour a unit follows this tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Behavior {
    /// Steered by player input, never by the AI.
    PlayerControlled,
    /// Organs: no targeting and no movement.
    Passive,
    /// Locks and tracks the player without repositioning.
    Boss,
    /// Ally escorting the player.
    AllyEscort {
        /// Flying units steer straight at their target.
        ignores_walls: bool,
    },
    /// Ally without an anchor, searching for the player or wandering.
    Lost {
        /// Flying units steer straight at their target.
        ignores_walls: bool,
    },
    /// Enemy pack member.
    EnemyPack {
        /// Flying units steer straight at their target.
        ignores_walls: bool,
    },
}

impl Behavior {
    /// Chooses the behaviour of `unit`.
    #[must_use]
    pub fn of(unit: &Unit, player_present: bool) -> Self {
        let ignores_walls = unit.kind.is_flying();
        match (unit.faction, unit.kind) {
            (_, UnitKind::Player) => Self::PlayerControlled,
            (_, UnitKind::Organ | UnitKind::SpawnOrgan) => Self::Passive,
            (_, UnitKind::Boss) => Self::Boss,
            (Faction::Ally, UnitKind::Tank | UnitKind::Ranged | UnitKind::Flying) => {
                if unit.lost || !player_present {
                    Self::Lost { ignores_walls }
                } else {
                    Self::AllyEscort { ignores_walls }
                }
            }
            (Faction::Enemy, UnitKind::Tank | UnitKind::Ranged | UnitKind::Flying) => {
                Self::EnemyPack { ignores_walls }
            }
        }
    }

    fn ignores_walls(self) -> bool {
        match self {
            Self::AllyEscort { ignores_walls }
            | Self::Lost { ignores_walls }
            | Self::EnemyPack { ignores_walls } => ignores_walls,
            Self::PlayerControlled | Self::Passive | Self::Boss => false,
        }
    }
}

/// Read-only view of the world used for target selection.
#[derive(Clone, Copy, Debug)]
pub struct TargetingScene<'a> {
    /// Tile map used for line-of-sight and pathfinding.
    pub map: &'a TileMap,
    /// Grids built over `units`; only the combat grid is consulted.
    pub index: &'a SpatialIndex,
    /// Live units sorted by identifier.
    pub units: &'a [Unit],
    /// Regions of the level.
    pub regions: &'a [Region],
    /// Identifier of the player's unit, if the player is alive.
    pub player: Option<UnitId>,
    /// Unit the player is currently infecting.
    pub infection_target: Option<UnitId>,
}

impl<'a> TargetingScene<'a> {
    /// Resolves a unit identifier against the live collection.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&'a Unit> {
        self.units
            .binary_search_by_key(&id, |unit| unit.id)
            .ok()
            .and_then(|index| self.units.get(index))
            .filter(|unit| unit.exists())
    }

    fn player_unit(&self) -> Option<&'a Unit> {
        self.player.and_then(|id| self.unit(id)).filter(|unit| unit.is_alive())
    }

    /// Current position of a movement target, if it still resolves.
    #[must_use]
    pub fn resolve(&self, target: MoveTarget) -> Option<Vec2> {
        match target {
            MoveTarget::Point(point) => Some(point),
            MoveTarget::Unit(id) => self.unit(id).map(Unit::position),
        }
    }

    /// Closest lockable opposing unit within `range` of `unit`.
    ///
    /// Bosses, organs and dying units are never returned. Ties go to the lower
    /// identifier.
    #[must_use]
    pub fn find_closest_enemy_in_range(&self, unit: &Unit, range: f32) -> Option<UnitId> {
        self.closest_matching(unit, range, |candidate| {
            candidate.faction != unit.faction && candidate.kind.is_lockable()
        })
    }

    /// Closest higher-level unit of `kind` in `unit`'s own faction within `range`.
    #[must_use]
    pub fn find_closest_of_type(&self, unit: &Unit, kind: UnitKind, range: f32) -> Option<UnitId> {
        self.closest_matching(unit, range, |candidate| {
            candidate.faction == unit.faction && candidate.kind == kind && candidate.level > unit.level
        })
    }

    fn closest_matching<P>(&self, unit: &Unit, range: f32, predicate: P) -> Option<UnitId>
    where
        P: Fn(&Unit) -> bool,
    {
        let origin = unit.position();
        let range_sq = range * range;
        let mut best: Option<(f32, UnitId)> = None;

        for slot in self.index.combat().neighborhood(origin) {
            let Some(candidate) = self.units.get(slot) else {
                continue;
            };
            if candidate.id == unit.id || !candidate.is_alive() || !predicate(candidate) {
                continue;
            }
            let distance_sq = origin.distance_squared(candidate.position());
            if distance_sq > range_sq {
                continue;
            }
            let better = match best {
                Some((best_sq, best_id)) => {
                    distance_sq < best_sq || (distance_sq == best_sq && candidate.id < best_id)
                }
                None => true,
            };
            if better {
                best = Some((distance_sq, candidate.id));
            }
        }

        best.map(|(_, id)| id)
    }
}

/// Decision taken for one unit; the world writes it back after the query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Steering {
    /// Long-term movement goal.
    pub target: Option<MoveTarget>,
    /// Locked attack target.
    pub attack_target: Option<UnitId>,
    /// Waypoint to steer toward this tick.
    pub next_move: Option<Vec2>,
    /// Whether the unit lost its anchor.
    pub lost: bool,
}

impl Steering {
    fn keep(unit: &Unit) -> Self {
        Self {
            target: unit.target,
            attack_target: unit.attack_target,
            next_move: unit.next_move,
            lost: unit.lost,
        }
    }

    /// Writes the decision back onto the unit.
    pub fn apply(self, unit: &mut Unit) {
        unit.target = self.target;
        unit.attack_target = self.attack_target;
        unit.next_move = self.next_move;
        unit.lost = self.lost;
    }
}

/// AI engine choosing targets and next moves.
#[derive(Clone, Debug)]
pub struct Targeting {
    tuning: AiTuning,
}

impl Targeting {
    /// Creates the engine from the AI tuning.
    #[must_use]
    pub fn new(tuning: &AiTuning) -> Self {
        Self {
            tuning: tuning.clone(),
        }
    }

    /// Chooses the target, attack lock and next move of `unit`.
    ///
    /// Returns `None` for units the AI leaves alone: the player, units that no
    /// longer exist and units still parked at a negative coordinate.
    pub fn select<R>(&self, rng: &mut R, scene: &TargetingScene<'_>, unit: &Unit) -> Option<Steering>
    where
        R: Rng + ?Sized,
    {
        let position = unit.position();
        if !unit.exists() || position.x < 0.0 || position.y < 0.0 {
            return None;
        }
        if !unit.is_alive() {
            return Some(Steering {
                target: None,
                attack_target: None,
                next_move: None,
                lost: unit.lost,
            });
        }

        let behavior = Behavior::of(unit, scene.player_unit().is_some());
        let mut steering = Steering::keep(unit);
        match behavior {
            Behavior::PlayerControlled => return None,
            Behavior::Passive => {
                return Some(Steering {
                    target: None,
                    attack_target: None,
                    next_move: None,
                    lost: false,
                })
            }
            Behavior::Boss => self.boss(scene, unit, &mut steering),
            Behavior::AllyEscort { .. } => self.escort(scene, unit, &mut steering),
            Behavior::Lost { .. } => self.lost(rng, scene, unit, &mut steering),
            Behavior::EnemyPack { .. } => self.pack(rng, scene, unit, &mut steering),
        }

        if let Some(target) = steering.target {
            if scene.resolve(target).is_none() {
                steering.target = None;
            }
        }
        if let Some(victim) = steering.attack_target {
            if scene.unit(victim).filter(|victim| victim.is_alive()).is_none() {
                steering.attack_target = None;
            }
        }

        steering.next_move = self.next_move(rng, scene, unit, &steering, behavior.ignores_walls());
        Some(steering)
    }

    fn boss(&self, scene: &TargetingScene<'_>, unit: &Unit, steering: &mut Steering) {
        steering.attack_target = None;
        steering.target = None;
        let Some(player) = scene.player_unit() else {
            return;
        };
        let distance = unit.position().distance(player.position());
        if distance <= unit.reach_to(player) {
            steering.attack_target = Some(player.id);
        }
        if distance <= unit.stats.chase_range {
            steering.target = Some(MoveTarget::Unit(player.id));
        }
    }

    fn escort(&self, scene: &TargetingScene<'_>, unit: &Unit, steering: &mut Steering) {
        let Some(player) = scene.player_unit() else {
            return;
        };
        let position = unit.position();
        let player_position = player.position();
        let distance = position.distance(player_position);

        if distance > self.tuning.lost_distance
            && has_obstacle(scene.map, position, player_position, unit.body.size)
        {
            debug!(unit = unit.id.get(), distance, "ally lost track of the player");
            steering.lost = true;
            steering.attack_target = None;
            steering.target = None;
            return;
        }

        let front = player_position + player.body.velocity.normalize_or_zero() * self.tuning.lead_offset;
        steering.target = if scene.map.is_wall_at(front) || front == player_position {
            Some(MoveTarget::Unit(player.id))
        } else {
            Some(MoveTarget::Point(front))
        };
        steering.attack_target = None;

        let Some(enemy) = scene.find_closest_enemy_in_range(unit, unit.stats.attack_lock_range) else {
            return;
        };
        if distance > self.tuning.follow_distance || Some(enemy) == scene.infection_target {
            steering.target = Some(MoveTarget::Unit(player.id));
            return;
        }
        steering.attack_target = Some(enemy);
        steering.target = Some(MoveTarget::Unit(enemy));
    }

    fn lost<R>(&self, rng: &mut R, scene: &TargetingScene<'_>, unit: &Unit, steering: &mut Steering)
    where
        R: Rng + ?Sized,
    {
        let position = unit.position();
        if let Some(player) = scene.player_unit() {
            if rng.gen_bool(self.tuning.lost_reacquire_chance) {
                let path = find_path(
                    scene.map,
                    position,
                    player.position(),
                    self.tuning.lost_path_step_limit,
                );
                if path.is_some() {
                    debug!(unit = unit.id.get(), "lost ally found its way back");
                    steering.lost = false;
                    steering.target = Some(MoveTarget::Unit(player.id));
                    self.lock_nearest(scene, unit, steering);
                    return;
                }
            }
        }

        if rng.gen_bool(self.tuning.wander_chance) {
            steering.target = Some(MoveTarget::Point(self.wander_point(rng, scene.map, position)));
        }
        self.lock_nearest(scene, unit, steering);
    }

    fn pack<R>(&self, rng: &mut R, scene: &TargetingScene<'_>, unit: &Unit, steering: &mut Steering)
    where
        R: Rng + ?Sized,
    {
        let position = unit.position();
        let leader = (unit.immune && unit.level == 1)
            .then(|| scene.find_closest_of_type(unit, unit.kind, self.tuning.cluster_radius))
            .flatten();

        if let Some(leader) = leader {
            steering.target = Some(MoveTarget::Unit(leader));
        } else if let Some(player) = scene.player_unit().filter(|player| {
            position.distance(player.position()) <= unit.stats.chase_range
                && (unit.kind.is_flying()
                    || !has_obstacle(scene.map, position, player.position(), unit.body.size))
        }) {
            steering.target = Some(MoveTarget::Unit(player.id));
        } else if let Some(region) = self.stray_region(scene, unit) {
            steering.target = Some(MoveTarget::Point(region.center));
        } else {
            steering.target = match steering.target {
                Some(MoveTarget::Point(point)) => Some(MoveTarget::Point(point)),
                _ => None,
            };
            if rng.gen_bool(self.tuning.random_walk_chance) {
                steering.target = Some(MoveTarget::Point(self.wander_point(rng, scene.map, position)));
            }
        }

        self.lock_nearest(scene, unit, steering);
    }

    fn lock_nearest(&self, scene: &TargetingScene<'_>, unit: &Unit, steering: &mut Steering) {
        steering.attack_target = scene.find_closest_enemy_in_range(unit, unit.stats.attack_lock_range);
        if let Some(enemy) = steering.attack_target {
            steering.target = Some(MoveTarget::Unit(enemy));
        }
    }

    fn stray_region<'a>(&self, scene: &TargetingScene<'a>, unit: &Unit) -> Option<&'a Region> {
        let region = unit
            .region
            .and_then(|id| scene.regions.iter().find(|region| region.id == id))?;
        let inside = scene
            .map
            .tile_of(unit.position())
            .is_some_and(|tile| region.contains(tile));
        (!inside && !region.tiles.is_empty()).then_some(region)
    }

    fn wander_point<R>(&self, rng: &mut R, map: &TileMap, origin: Vec2) -> Vec2
    where
        R: Rng + ?Sized,
    {
        let angle = rng.gen_range(0.0..TAU);
        let radius = rng.gen_range(0.0..=self.tuning.wander_radius.max(0.0));
        let point = origin + Vec2::from_angle(angle) * radius;
        point.clamp(Vec2::ZERO, Vec2::new(map.width(), map.height()) - Vec2::ONE)
    }

    fn next_move<R>(
        &self,
        rng: &mut R,
        scene: &TargetingScene<'_>,
        unit: &Unit,
        steering: &Steering,
        ignores_walls: bool,
    ) -> Option<Vec2>
    where
        R: Rng + ?Sized,
    {
        let goal = steering.target.and_then(|target| scene.resolve(target))?;
        let position = unit.position();
        if ignores_walls || position.distance(goal) < scene.map.tile_length() {
            return Some(goal);
        }
        if !has_obstacle(scene.map, position, goal, unit.body.size) {
            return Some(goal);
        }
        if !rng.gen_bool(self.tuning.pathfind_chance) {
            return steering.next_move;
        }

        match find_path(scene.map, position, goal, self.tuning.path_step_limit) {
            Some(path) => {
                let waypoint = furthest_visible_waypoint(scene.map, position, &path, unit.body.size);
                trace!(unit = unit.id.get(), waypoints = path.len(), "adopted pathfinding waypoint");
                waypoint.or(steering.next_move)
            }
            None => steering.next_move,
        }
    }
}
