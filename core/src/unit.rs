//! Units, items and the player's extra state.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{map::TileMap, Faction, ItemId, RegionId, UnitId};

/// Behavioural category of a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    /// Ground melee unit.
    Tank,
    /// Ground unit that fires projectiles.
    Ranged,
    /// Airborne unit that ignores walls.
    Flying,
    /// The player-controlled unit.
    Player,
    /// The level boss.
    Boss,
    /// Passive organ that drops items when destroyed.
    Organ,
    /// Passive organ that periodically spawns enemies.
    SpawnOrgan,
}

impl UnitKind {
    /// Reports whether the kind is one of the passive organs.
    #[must_use]
    pub const fn is_organ(self) -> bool {
        matches!(self, Self::Organ | Self::SpawnOrgan)
    }

    /// Reports whether the kind flies over walls.
    #[must_use]
    pub const fn is_flying(self) -> bool {
        matches!(self, Self::Flying)
    }

    /// Reports whether units of this kind never change facing.
    #[must_use]
    pub const fn is_directionless(self) -> bool {
        self.is_organ()
    }

    /// Reports whether units of this kind may be locked as attack targets.
    #[must_use]
    pub const fn is_lockable(self) -> bool {
        !matches!(self, Self::Boss | Self::Organ | Self::SpawnOrgan)
    }

    /// Reports whether attacks are delivered as projectiles instead of melee.
    #[must_use]
    pub const fn fires_projectiles(self) -> bool {
        matches!(self, Self::Ranged | Self::Flying | Self::Boss)
    }
}

/// Kinds of items that may be picked up by the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// Restores player health.
    Health,
    /// Restores infection points.
    Infection,
}

/// Physical state shared by every mobile entity.
#[derive(Clone, Debug, PartialEq)]
pub struct Body {
    /// Center of the entity in world units.
    pub position: Vec2,
    /// Displacement applied per tick.
    pub velocity: Vec2,
    /// Acceleration applied toward the next move per tick.
    pub acceleration: f32,
    /// Drag applied against the velocity per tick.
    pub deceleration: f32,
    /// Upper bound on the velocity magnitude.
    pub max_speed: f32,
    /// Diameter used for every distance and overlap test.
    pub size: f32,
    /// Immovable bodies are never displaced by collision response.
    pub is_static: bool,
    /// Ghost bodies are excluded from physical collision.
    pub ghost: bool,
}

impl Body {
    /// Creates a resting body at the provided position.
    #[must_use]
    pub fn new(position: Vec2, size: f32) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            acceleration: 0.0,
            deceleration: 0.0,
            max_speed: 0.0,
            size,
            is_static: false,
            ghost: false,
        }
    }

    /// Half of the body's size.
    #[must_use]
    pub fn half_size(&self) -> f32 {
        self.size / 2.0
    }

    /// Scales the velocity down so that its magnitude never exceeds `max_speed`.
    pub fn clamp_speed(&mut self) {
        self.velocity = self.velocity.clamp_length_max(self.max_speed.max(0.0));
    }
}

/// Combat and infection statistics of a unit.
#[derive(Clone, Debug, PartialEq)]
pub struct Stats {
    /// Remaining health.
    pub health: f32,
    /// Maximum health.
    pub max_health: f32,
    /// Remaining infection vitality.
    pub infection_vitality: f32,
    /// Maximum infection vitality.
    pub max_infection_vitality: f32,
    /// Damage dealt per attack before defense.
    pub attack: f32,
    /// Damage absorbed per melee hit.
    pub defense: f32,
    /// Distance between edges at which attacks connect.
    pub attack_range: f32,
    /// Distance at which opposing units are locked as attack targets.
    pub attack_lock_range: f32,
    /// Distance at which enemies start chasing the player.
    pub chase_range: f32,
    /// Ticks until the next attack may fire.
    pub attack_cooldown: u32,
    /// Cooldown applied after an attack fires.
    pub max_attack_cooldown: u32,
}

impl Stats {
    /// Reduces health by `amount`, clamped into `[0, max_health]`.
    pub fn apply_damage(&mut self, amount: f32) {
        self.health = (self.health - amount).clamp(0.0, self.max_health);
    }

    /// Restores health by `amount`, clamped into `[0, max_health]`.
    pub fn heal(&mut self, amount: f32) {
        self.health = (self.health + amount).clamp(0.0, self.max_health);
    }

    /// Shifts infection vitality by `delta`, clamped into `[0, max]`.
    pub fn adjust_vitality(&mut self, delta: f32) {
        self.infection_vitality =
            (self.infection_vitality + delta).clamp(0.0, self.max_infection_vitality);
    }

    /// Counts the attack cooldown down by one tick.
    pub fn tick_cooldown(&mut self) {
        self.attack_cooldown = self
            .attack_cooldown
            .saturating_sub(1)
            .min(self.max_attack_cooldown);
    }
}

/// Longer-term movement goal of a unit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MoveTarget {
    /// Fixed point in world space.
    Point(Vec2),
    /// Another unit, resolved by identifier every tick.
    Unit(UnitId),
}

/// Horizontal facing used by the renderer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Facing {
    /// Facing toward decreasing x.
    Left,
    /// Facing toward increasing x.
    #[default]
    Right,
}

/// Life state of a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnitState {
    /// Fully simulated.
    Alive,
    /// Health was exhausted; the dying animation is playing.
    Dying {
        /// Ticks until the unit becomes eligible for removal.
        remaining: u32,
    },
    /// Awaiting the end-of-tick sweep.
    Dead,
}

/// Simulated unit.
#[derive(Clone, Debug, PartialEq)]
pub struct Unit {
    /// Unique identifier.
    pub id: UnitId,
    /// Behavioural category.
    pub kind: UnitKind,
    /// Allegiance.
    pub faction: Faction,
    /// Level used to scale stats.
    pub level: u32,
    /// Physical state.
    pub body: Body,
    /// Combat and infection statistics.
    pub stats: Stats,
    /// Long-term movement goal.
    pub target: Option<MoveTarget>,
    /// Waypoint steered toward this tick.
    pub next_move: Option<Vec2>,
    /// Locked attack target.
    pub attack_target: Option<UnitId>,
    /// Cannot be chosen as an infection target.
    pub immune: bool,
    /// Ignores incoming damage.
    pub invulnerable: bool,
    /// Ally that lost its anchor and wanders.
    pub lost: bool,
    /// Region used for population bookkeeping.
    pub region: Option<RegionId>,
    /// Facing used by the renderer.
    pub facing: Facing,
    /// Set when the unit was hit this tick.
    pub damaged: bool,
    /// Life state.
    pub state: UnitState,
}

impl Unit {
    /// Reports whether the unit still participates in the simulation.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.state != UnitState::Dead
    }

    /// Reports whether the unit is alive and not dying.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.state == UnitState::Alive
    }

    /// Current world position.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.body.position
    }

    /// Distance between the centers at which the two units' attacks connect.
    #[must_use]
    pub fn reach_to(&self, other: &Unit) -> f32 {
        self.stats.attack_range + self.body.half_size() + other.body.half_size()
    }
}

/// Collectible dropped into the level.
#[derive(Clone, Debug, PartialEq)]
pub struct Item {
    /// Unique identifier.
    pub id: ItemId,
    /// Kind of the item.
    pub kind: ItemKind,
    /// Physical state.
    pub body: Body,
    /// Set once picked up; the world removes destroyed items.
    pub destroyed: bool,
}

/// Extra state carried by the player unit.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerState {
    /// Identifier of the player's unit.
    pub unit: UnitId,
    /// Points consumed while infecting.
    pub infection_points: f32,
    /// Maximum infection points.
    pub max_infection_points: f32,
    /// Reach of the infection beam.
    pub infection_range: f32,
    /// Number of allied units.
    pub num_allies: u32,
    /// Set once `num_allies` reached the ally cap.
    pub max_allies_reached: bool,
    /// Row-major exploration memory, one flag per map tile.
    pub explored: Vec<bool>,
    /// Unit currently being infected.
    pub infection_target: Option<UnitId>,
}

impl PlayerState {
    /// Creates the state for a freshly started level.
    #[must_use]
    pub fn new(unit: UnitId, map: &TileMap, max_infection_points: f32, infection_range: f32) -> Self {
        Self {
            unit,
            infection_points: max_infection_points,
            max_infection_points,
            infection_range,
            num_allies: 0,
            max_allies_reached: false,
            explored: vec![false; map.tile_count()],
            infection_target: None,
        }
    }

    /// Marks every tile within `radius` tiles of `position` as explored.
    pub fn explore(&mut self, map: &TileMap, position: Vec2, radius: u32) {
        let center = map.clamped_tile_of(position);
        let radius_sq = i64::from(radius) * i64::from(radius);
        let min_column = center.column().saturating_sub(radius);
        let min_row = center.row().saturating_sub(radius);
        let max_column = center.column().saturating_add(radius).min(map.columns() - 1);
        let max_row = center.row().saturating_add(radius).min(map.rows() - 1);

        for row in min_row..=max_row {
            for column in min_column..=max_column {
                let dx = i64::from(column) - i64::from(center.column());
                let dy = i64::from(row) - i64::from(center.row());
                if dx * dx + dy * dy > radius_sq {
                    continue;
                }
                let tile = crate::TileCoord::new(column, row);
                if let Some(slot) = map.index(tile).and_then(|index| self.explored.get_mut(index)) {
                    *slot = true;
                }
            }
        }
    }

    /// Updates the ally counter after a conversion, keeping the cap flag accurate.
    ///
    /// Returns `false` when a gain would exceed `cap`; the counter is left
    /// untouched in that case.
    pub fn record_conversion(&mut self, gained_ally: bool, cap: u32) -> bool {
        if gained_ally && self.num_allies >= cap {
            self.max_allies_reached = true;
            return false;
        }
        self.record_ally(gained_ally, cap);
        true
    }

    /// Counts an ally that joined or left without a conversion, such as a
    /// placed ally or one that died.
    ///
    /// Placed allies are never refused, so the counter may exceed `cap`.
    pub fn record_ally(&mut self, joined: bool, cap: u32) {
        if joined {
            self.num_allies += 1;
        } else {
            self.num_allies = self.num_allies.saturating_sub(1);
        }
        self.max_allies_reached = self.num_allies >= cap;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TileCoord;

    #[test]
    fn clamp_speed_preserves_direction() {
        let mut body = Body::new(Vec2::ZERO, 10.0);
        body.max_speed = 5.0;
        body.velocity = Vec2::new(30.0, 40.0);
        body.clamp_speed();
        assert!((body.velocity.length() - 5.0).abs() < 1e-5);
        assert!((body.velocity.x - 3.0).abs() < 1e-5);
    }

    #[test]
    fn stats_clamp_vitality_and_health() {
        let mut stats = Stats {
            health: 5.0,
            max_health: 10.0,
            infection_vitality: 1.0,
            max_infection_vitality: 4.0,
            attack: 0.0,
            defense: 0.0,
            attack_range: 0.0,
            attack_lock_range: 0.0,
            chase_range: 0.0,
            attack_cooldown: 0,
            max_attack_cooldown: 3,
        };
        stats.apply_damage(20.0);
        stats.adjust_vitality(10.0);
        assert_eq!(stats.health, 0.0);
        assert_eq!(stats.infection_vitality, 4.0);
        stats.adjust_vitality(-6.0);
        assert_eq!(stats.infection_vitality, 0.0);
        stats.tick_cooldown();
        assert_eq!(stats.attack_cooldown, 0);
    }

    #[test]
    fn ally_counter_respects_cap() {
        let map = TileMap::open(2, 2, 1.0).expect("map");
        let mut player = PlayerState::new(UnitId::new(0), &map, 10.0, 5.0);
        assert!(player.record_conversion(true, 2));
        assert!(player.record_conversion(true, 2));
        assert!(player.max_allies_reached);
        assert!(!player.record_conversion(true, 2));
        assert_eq!(player.num_allies, 2);
        assert!(player.record_conversion(false, 2));
        assert_eq!(player.num_allies, 1);
        assert!(!player.max_allies_reached);
        assert!(player.record_conversion(false, 2));
        assert!(player.record_conversion(false, 2));
        assert_eq!(player.num_allies, 0);
    }

    #[test]
    fn placed_and_fallen_allies_move_the_counter() {
        let map = TileMap::open(2, 2, 1.0).expect("map");
        let mut player = PlayerState::new(UnitId::new(0), &map, 10.0, 5.0);
        player.record_ally(true, 1);
        player.record_ally(true, 1);
        assert_eq!(player.num_allies, 2);
        assert!(player.max_allies_reached);
        player.record_ally(false, 1);
        player.record_ally(false, 1);
        assert_eq!(player.num_allies, 0);
        assert!(!player.max_allies_reached);
        assert!(player.record_conversion(true, 1));
    }

    #[test]
    fn exploration_marks_disc_around_player() {
        let map = TileMap::open(5, 5, 10.0).expect("map");
        let mut player = PlayerState::new(UnitId::new(0), &map, 10.0, 5.0);
        player.explore(&map, map.tile_center(TileCoord::new(2, 2)), 1);
        let explored: Vec<_> = (0..25).filter(|index| player.explored[*index]).collect();
        assert_eq!(explored, vec![7, 11, 12, 13, 17]);
    }
}
