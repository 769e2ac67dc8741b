#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Outbreak simulation.
//!
//! This crate defines the data model and the message surface that connects the
//! authoritative world with the pure systems. Systems read the world's unit,
//! item and particle collections for the duration of one call and respond with
//! [`Command`] values describing staged additions, removals and conversions.
//! The world applies those commands after its per-unit pass and broadcasts
//! [`Event`] values describing what happened during the tick.

pub mod config;
pub mod factory;
pub mod level;
pub mod map;
pub mod particle;
pub mod region;
pub mod unit;

pub use config::{
    AiTuning, BaseStats, CombatTuning, ConfigError, GridTuning, InfectionTuning, LifecycleTuning,
    ParticleTuning, PhysicsTuning, SimulationConfig, StatTuning,
};
pub use factory::{StatFactory, UnitFactory, UnitSpec};
pub use glam::Vec2;
pub use level::{Level, UnitPlacement};
pub use map::{LevelError, TileCoord, TileMap};
pub use particle::{EmitRequest, Particle, ParticleField};
pub use region::{Region, SpawnPoint, WeightTable};
pub use unit::{
    Body, Facing, Item, ItemKind, MoveTarget, PlayerState, Stats, Unit, UnitKind, UnitState,
};

use serde::{Deserialize, Serialize};

/// Allegiance of a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Faction {
    /// Units fighting alongside the player.
    Ally,
    /// Units hostile to the player.
    Enemy,
}

impl Faction {
    /// Returns the faction on the other side of the conflict.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Ally => Self::Enemy,
            Self::Enemy => Self::Ally,
        }
    }
}

/// Unique identifier assigned to a unit.
///
/// Identifiers are allocated monotonically and never reused, so the live unit
/// collection stays sorted by identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(u32);

impl UnitId {
    /// Creates a new unit identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to an item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(u32);

impl ItemId {
    /// Creates a new item identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of a region within a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionId(u32);

impl RegionId {
    /// Creates a new region identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the region identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Key used by auxiliary per-entity maps such as the previous-position cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKey {
    /// Entry belonging to a unit.
    Unit(UnitId),
    /// Entry belonging to an item.
    Item(ItemId),
}

/// Color applied to particles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    red: u8,
    green: u8,
    blue: u8,
}

impl Rgb {
    /// Creates a new color from byte RGB components.
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Red component of the color.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green component of the color.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue component of the color.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }
}

/// Category of a fire-and-forget sound cue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SoundKind {
    /// A unit was struck.
    Hit,
    /// A unit launched an attack.
    Attack,
    /// The player drained infection vitality from a target.
    Infect,
    /// A unit changed faction.
    Convert,
    /// A unit started dying.
    Death,
    /// The player picked up an item.
    Pickup,
    /// The level boss was defeated.
    Victory,
}

/// Edge-triggered input used by menu navigation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EdgeInput {
    /// Upward navigation was pressed this frame.
    pub up: bool,
    /// Downward navigation was pressed this frame.
    pub down: bool,
    /// Confirmation was pressed this frame.
    pub confirm: bool,
    /// Escape was pressed this frame.
    pub escape: bool,
}

/// Frame-logical input snapshot produced by the input collaborator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameInput {
    /// Move toward decreasing y.
    pub up: bool,
    /// Move toward increasing y.
    pub down: bool,
    /// Move toward decreasing x.
    pub left: bool,
    /// Move toward increasing x.
    pub right: bool,
    /// Start or continue converting the nearest enemy.
    pub infect: bool,
    /// Call lost allies back to the player.
    pub rally: bool,
    /// Pause the simulation.
    pub pause: bool,
    /// Edge-triggered variants for menu navigation.
    pub pressed: EdgeInput,
}

impl FrameInput {
    /// Unnormalised movement direction requested by the directional inputs.
    #[must_use]
    pub fn direction(&self) -> Vec2 {
        let mut direction = Vec2::ZERO;
        if self.up {
            direction.y -= 1.0;
        }
        if self.down {
            direction.y += 1.0;
        }
        if self.left {
            direction.x -= 1.0;
        }
        if self.right {
            direction.x += 1.0;
        }
        direction
    }
}

/// Staged mutations produced while the world iterates its collections.
///
/// Commands are buffered into side lists during the per-unit pass and applied
/// afterwards so that no live collection is mutated while it is iterated.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Flips the faction of a unit whose infection vitality reached zero.
    ConvertUnit {
        /// Unit to convert.
        unit: UnitId,
    },
    /// Marks the level boss as defeated and removes it.
    DefeatBoss {
        /// Boss whose vitality was exhausted.
        unit: UnitId,
    },
    /// Destroys an organ and drops items at its position.
    DestroyOrgan {
        /// Organ whose vitality was exhausted.
        unit: UnitId,
    },
    /// Requests a freshly statted unit.
    SpawnUnit {
        /// Kind of unit to create.
        kind: UnitKind,
        /// Faction the unit fights for.
        faction: Faction,
        /// Level used to scale the unit's stats.
        level: u32,
        /// World position of the new unit.
        position: Vec2,
        /// Whether the unit cannot be targeted for infection.
        immune: bool,
        /// Region the unit is bound to, if any.
        region: Option<RegionId>,
    },
    /// Scatters items around a position.
    DropItems {
        /// Drop origin.
        position: Vec2,
        /// Number of items to drop.
        count: u32,
    },
    /// Removes a dead unit from every live collection.
    DespawnUnit {
        /// Unit to remove.
        unit: UnitId,
    },
}

/// Events broadcast by the world while advancing a tick.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Fire-and-forget sound cue.
    Sound {
        /// Category of the cue.
        kind: SoundKind,
        /// Name of the cue within its category.
        name: &'static str,
    },
    /// A unit entered the simulation.
    UnitSpawned {
        /// Identifier of the new unit.
        unit: UnitId,
        /// Kind of the new unit.
        kind: UnitKind,
        /// Faction of the new unit.
        faction: Faction,
    },
    /// A unit changed faction.
    UnitConverted {
        /// Identifier of the converted unit.
        unit: UnitId,
        /// Faction the unit now belongs to.
        faction: Faction,
    },
    /// A conversion was refused because the ally cap was reached.
    ConversionRefused {
        /// Unit that stays with its faction.
        unit: UnitId,
    },
    /// A unit's health was exhausted and it started dying.
    UnitDied {
        /// Identifier of the dying unit.
        unit: UnitId,
    },
    /// A unit was removed from the live collection.
    UnitRemoved {
        /// Identifier of the removed unit.
        unit: UnitId,
    },
    /// The level boss was defeated.
    BossDefeated {
        /// Identifier of the boss.
        unit: UnitId,
    },
    /// An organ was destroyed.
    OrganDestroyed {
        /// Identifier of the organ.
        unit: UnitId,
    },
    /// An item was dropped into the level.
    ItemDropped {
        /// Identifier of the item.
        item: ItemId,
    },
    /// The player accepted an item.
    ItemPickedUp {
        /// Identifier of the item.
        item: ItemId,
        /// Kind of the item.
        kind: ItemKind,
    },
    /// The player was removed; the level is lost.
    PlayerLost,
}
