//! Tuning surface of the simulation.
//!
//! Every section deserializes with defaults so that a tuning file only needs
//! to list the knobs it changes.

use serde::Deserialize;
use thiserror::Error;

use crate::unit::UnitKind;

/// Reasons a tuning surface may be rejected.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// A grid cell size is not positive.
    #[error("{grid} cell size must be positive, found {value}")]
    InvalidCellSize {
        /// Grid whose cell size is invalid.
        grid: &'static str,
        /// Offending value.
        value: f32,
    },
    /// The restitution coefficient lies outside `[0, 1]`.
    #[error("restitution must lie within [0, 1], found {0}")]
    InvalidRestitution(f32),
    /// A probability lies outside `[0, 1]`.
    #[error("{name} must be a probability, found {value}")]
    InvalidProbability {
        /// Name of the probability knob.
        name: &'static str,
        /// Offending value.
        value: f64,
    },
    /// A rate that must not be negative is negative.
    #[error("{name} must not be negative, found {value}")]
    NegativeRate {
        /// Name of the rate knob.
        name: &'static str,
        /// Offending value.
        value: f32,
    },
    /// The per-level stat growth factor is not positive.
    #[error("level growth must be positive, found {0}")]
    InvalidLevelGrowth(f32),
}

/// Aggregated tuning knobs controlling every adjustable aspect of the simulation.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seed of the simulation's pseudo-random source.
    pub seed: u64,
    /// Collision response and drag.
    pub physics: PhysicsTuning,
    /// Spatial grid cell sizes.
    pub grid: GridTuning,
    /// Targeting and AI behaviour.
    pub ai: AiTuning,
    /// Player infection and ally bookkeeping.
    pub infection: InfectionTuning,
    /// Attack delivery.
    pub combat: CombatTuning,
    /// Death, organ drops and spawn organs.
    pub lifecycle: LifecycleTuning,
    /// Cosmetic particle bursts.
    pub particles: ParticleTuning,
    /// Base unit statistics.
    pub stats: StatTuning,
}

impl SimulationConfig {
    /// Checks every knob for values the simulation cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (grid, value) in [
            ("physical", self.grid.physical_cell_size),
            ("combat", self.grid.combat_cell_size),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::InvalidCellSize { grid, value });
            }
        }

        if !(0.0..=1.0).contains(&self.physics.restitution) {
            return Err(ConfigError::InvalidRestitution(self.physics.restitution));
        }

        for (name, value) in [
            ("lost_reacquire_chance", self.ai.lost_reacquire_chance),
            ("wander_chance", self.ai.wander_chance),
            ("pathfind_chance", self.ai.pathfind_chance),
            ("random_walk_chance", self.ai.random_walk_chance),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidProbability { name, value });
            }
        }

        for (name, value) in [
            ("vitality_recovery", self.infection.vitality_recovery),
            ("lost_drain", self.infection.lost_drain),
            ("infection_regen", self.infection.infection_regen),
            ("infection_cost", self.infection.infection_cost),
            ("infection_power", self.infection.infection_power),
            ("velocity_epsilon", self.physics.velocity_epsilon),
        ] {
            if value < 0.0 {
                return Err(ConfigError::NegativeRate { name, value });
            }
        }

        if !(self.stats.level_growth > 0.0) {
            return Err(ConfigError::InvalidLevelGrowth(self.stats.level_growth));
        }

        Ok(())
    }
}

/// Collision response and drag parameters.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PhysicsTuning {
    /// Elasticity of unit-unit impulses; 0 is perfectly inelastic.
    pub restitution: f32,
    /// Velocities or components below this magnitude snap to zero.
    pub velocity_epsilon: f32,
    /// Units stop accelerating once this close to a point target.
    pub stop_distance: f32,
    /// Distance stepped back per wall-correction iteration.
    pub wall_step: f32,
}

impl Default for PhysicsTuning {
    fn default() -> Self {
        Self {
            restitution: 0.5,
            velocity_epsilon: 0.05,
            stop_distance: 8.0,
            wall_step: 1.0,
        }
    }
}

/// Spatial grid cell sizes.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GridTuning {
    /// Cell size of the physical grid, roughly one large-unit diameter.
    pub physical_cell_size: f32,
    /// Cell size of the combat grid, covering the widest lock range.
    pub combat_cell_size: f32,
}

impl Default for GridTuning {
    fn default() -> Self {
        Self {
            physical_cell_size: 64.0,
            combat_cell_size: 320.0,
        }
    }
}

/// Targeting and AI parameters.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AiTuning {
    /// Per-tick chance that a lost ally re-acquires the player.
    pub lost_reacquire_chance: f64,
    /// Per-tick chance that a lost ally picks a new wander point.
    pub wander_chance: f64,
    /// Radius of random wander points.
    pub wander_radius: f32,
    /// Per-tick chance to pathfind when the line to the target is blocked.
    pub pathfind_chance: f64,
    /// Per-tick chance that an idle enemy picks a random walk point.
    pub random_walk_chance: f64,
    /// Expansion cap for ordinary pathfinding.
    pub path_step_limit: u32,
    /// Expansion cap for the lost-ally reacquire search.
    pub lost_path_step_limit: u32,
    /// Distance ahead of the player that escorting allies aim for.
    pub lead_offset: f32,
    /// Allies farther than this from the player drop their attack lock.
    pub follow_distance: f32,
    /// Allies farther than this from the player without line of sight get lost.
    pub lost_distance: f32,
    /// Radius in which immune level-1 enemies look for a leader.
    pub cluster_radius: f32,
}

impl Default for AiTuning {
    fn default() -> Self {
        Self {
            lost_reacquire_chance: 0.02,
            wander_chance: 0.02,
            wander_radius: 128.0,
            pathfind_chance: 0.1,
            random_walk_chance: 0.01,
            path_step_limit: 40,
            lost_path_step_limit: 80,
            lead_offset: 48.0,
            follow_distance: 600.0,
            lost_distance: 900.0,
            cluster_radius: 256.0,
        }
    }
}

/// Player infection and ally bookkeeping.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct InfectionTuning {
    /// Reach of the player's infection beam.
    pub infection_range: f32,
    /// Vitality drained from the infection target per tick.
    pub infection_power: f32,
    /// Infection points spent per tick of infecting.
    pub infection_cost: f32,
    /// Infection points regained per tick while not infecting.
    pub infection_regen: f32,
    /// Maximum infection points.
    pub max_infection_points: f32,
    /// Vitality recovered per tick by units that are not lost.
    pub vitality_recovery: f32,
    /// Vitality drained per tick from lost units.
    pub lost_drain: f32,
    /// Hard cap on the number of allies.
    pub max_allies: u32,
    /// Radius of the rally call.
    pub rally_radius: f32,
    /// Radius, in tiles, revealed around the player every tick.
    pub exploration_radius: u32,
}

impl Default for InfectionTuning {
    fn default() -> Self {
        Self {
            infection_range: 160.0,
            infection_power: 1.0,
            infection_cost: 0.5,
            infection_regen: 0.25,
            max_infection_points: 100.0,
            vitality_recovery: 0.1,
            lost_drain: 0.2,
            max_allies: 20,
            rally_radius: 400.0,
            exploration_radius: 4,
        }
    }
}

/// Attack delivery parameters.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CombatTuning {
    /// Launch speed of damage projectiles.
    pub projectile_speed: f32,
    /// Diameter of damage projectiles.
    pub projectile_size: f32,
    /// Lifetime of damage projectiles in ticks.
    pub projectile_ttl: u32,
    /// Number of projectiles in a boss burst.
    pub boss_burst_count: u32,
    /// Angular spread of a boss burst in radians.
    pub boss_burst_spread: f32,
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            projectile_speed: 6.0,
            projectile_size: 6.0,
            projectile_ttl: 120,
            boss_burst_count: 8,
            boss_burst_spread: 1.2,
        }
    }
}

/// Death, organ and spawn-organ parameters.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LifecycleTuning {
    /// Ticks a dying unit lingers before it is swept.
    pub death_delay_ticks: u32,
    /// Items dropped by a destroyed organ.
    pub organ_item_drops: u32,
    /// Ticks between spawn-organ spawns.
    pub spawn_organ_interval: u32,
    /// Diameter of dropped items.
    pub item_size: f32,
    /// Launch speed of dropped items.
    pub item_drop_speed: f32,
    /// Drag applied to dropped items.
    pub item_deceleration: f32,
    /// Health restored by a health item.
    pub item_heal: f32,
    /// Infection points restored by an infection item.
    pub item_infection_points: f32,
}

impl Default for LifecycleTuning {
    fn default() -> Self {
        Self {
            death_delay_ticks: 20,
            organ_item_drops: 3,
            spawn_organ_interval: 300,
            item_size: 16.0,
            item_drop_speed: 3.0,
            item_deceleration: 0.2,
            item_heal: 25.0,
            item_infection_points: 30.0,
        }
    }
}

/// Cosmetic burst parameters.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ParticleTuning {
    /// Particles emitted on a projectile hit.
    pub hit_burst_count: u32,
    /// Lifetime of burst particles in ticks.
    pub burst_ttl: u32,
    /// Minimum burst particle speed.
    pub burst_min_speed: f32,
    /// Maximum burst particle speed.
    pub burst_max_speed: f32,
    /// Burst particle diameter.
    pub burst_size: f32,
}

impl Default for ParticleTuning {
    fn default() -> Self {
        Self {
            hit_burst_count: 4,
            burst_ttl: 20,
            burst_min_speed: 1.0,
            burst_max_speed: 3.0,
            burst_size: 3.0,
        }
    }
}

/// Level-one statistics of a unit kind.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct BaseStats {
    /// Maximum health.
    pub max_health: f32,
    /// Maximum infection vitality.
    pub max_infection_vitality: f32,
    /// Damage dealt per attack.
    pub attack: f32,
    /// Damage absorbed per melee hit.
    pub defense: f32,
    /// Distance between edges at which attacks connect.
    pub attack_range: f32,
    /// Distance at which opposing units are locked.
    pub attack_lock_range: f32,
    /// Distance at which the player is chased.
    pub chase_range: f32,
    /// Ticks between attacks.
    pub attack_cooldown: u32,
    /// Acceleration toward the next move.
    pub acceleration: f32,
    /// Drag against the velocity.
    pub deceleration: f32,
    /// Maximum speed.
    pub max_speed: f32,
    /// Diameter.
    pub size: f32,
    /// Whether the unit is immovable.
    pub is_static: bool,
}

impl BaseStats {
    #[allow(clippy::too_many_arguments)]
    const fn mobile(
        max_health: f32,
        max_infection_vitality: f32,
        attack: f32,
        defense: f32,
        attack_range: f32,
        attack_lock_range: f32,
        attack_cooldown: u32,
        max_speed: f32,
        size: f32,
    ) -> Self {
        Self {
            max_health,
            max_infection_vitality,
            attack,
            defense,
            attack_range,
            attack_lock_range,
            chase_range: 400.0,
            attack_cooldown,
            acceleration: 0.5,
            deceleration: 0.15,
            max_speed,
            size,
            is_static: false,
        }
    }

    const fn stationary(max_health: f32, max_infection_vitality: f32, size: f32) -> Self {
        Self {
            max_health,
            max_infection_vitality,
            attack: 0.0,
            defense: 0.0,
            attack_range: 0.0,
            attack_lock_range: 0.0,
            chase_range: 0.0,
            attack_cooldown: 0,
            acceleration: 0.0,
            deceleration: 0.0,
            max_speed: 0.0,
            size,
            is_static: true,
        }
    }
}

/// Base statistics per unit kind and their per-level growth.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct StatTuning {
    /// Geometric growth applied per level above one.
    pub level_growth: f32,
    /// Ground melee units.
    pub tank: BaseStats,
    /// Ground projectile units.
    pub ranged: BaseStats,
    /// Airborne units.
    pub flying: BaseStats,
    /// The player.
    pub player: BaseStats,
    /// The level boss.
    pub boss: BaseStats,
    /// Passive organs.
    pub organ: BaseStats,
    /// Spawning organs.
    pub spawn_organ: BaseStats,
}

impl StatTuning {
    /// Base statistics for the provided kind.
    #[must_use]
    pub fn base(&self, kind: UnitKind) -> &BaseStats {
        match kind {
            UnitKind::Tank => &self.tank,
            UnitKind::Ranged => &self.ranged,
            UnitKind::Flying => &self.flying,
            UnitKind::Player => &self.player,
            UnitKind::Boss => &self.boss,
            UnitKind::Organ => &self.organ,
            UnitKind::SpawnOrgan => &self.spawn_organ,
        }
    }
}

impl Default for StatTuning {
    fn default() -> Self {
        let mut player = BaseStats::mobile(200.0, 1.0, 12.0, 4.0, 12.0, 0.0, 15, 4.0, 36.0);
        player.acceleration = 0.8;
        player.deceleration = 0.3;
        let mut boss = BaseStats::mobile(2_000.0, 400.0, 20.0, 10.0, 300.0, 300.0, 90, 0.0, 120.0);
        boss.chase_range = 600.0;
        boss.acceleration = 0.0;
        boss.is_static = true;

        Self {
            level_growth: 1.15,
            tank: BaseStats::mobile(60.0, 100.0, 10.0, 3.0, 6.0, 160.0, 30, 3.0, 40.0),
            ranged: BaseStats::mobile(40.0, 80.0, 8.0, 1.0, 180.0, 220.0, 45, 2.5, 32.0),
            flying: BaseStats::mobile(30.0, 60.0, 6.0, 1.0, 120.0, 200.0, 40, 3.5, 28.0),
            player,
            boss,
            organ: BaseStats::stationary(150.0, 120.0, 48.0),
            spawn_organ: BaseStats::stationary(200.0, 160.0, 56.0),
        }
    }
}
