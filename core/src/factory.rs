//! Construction of fully statted units and items.

use glam::Vec2;

use crate::{
    config::{LifecycleTuning, StatTuning},
    unit::{Body, Facing, Item, ItemKind, Stats, Unit, UnitKind, UnitState},
    Faction, ItemId, RegionId, UnitId,
};

/// Everything needed to create a unit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitSpec {
    /// Identifier allocated by the world.
    pub id: UnitId,
    /// Kind of the unit.
    pub kind: UnitKind,
    /// Faction of the unit.
    pub faction: Faction,
    /// Level used to scale stats; clamped to at least one.
    pub level: u32,
    /// Spawn position.
    pub position: Vec2,
    /// Whether the unit cannot be infection-targeted.
    pub immune: bool,
    /// Region the unit is bound to.
    pub region: Option<RegionId>,
}

/// Capability producing fully statted units and items.
pub trait UnitFactory {
    /// Creates a unit at full health and vitality.
    fn unit(&self, spec: UnitSpec) -> Unit;

    /// Creates an item resting at `position`.
    fn item(&self, id: ItemId, kind: ItemKind, position: Vec2) -> Item;
}

/// Factory that derives stats from the tuning tables.
///
/// Health, vitality, attack and defense grow geometrically with level; ranges,
/// speeds and sizes do not.
#[derive(Clone, Debug)]
pub struct StatFactory {
    stats: StatTuning,
    item_size: f32,
    item_deceleration: f32,
}

impl StatFactory {
    /// Creates a factory from the stat and lifecycle tuning.
    #[must_use]
    pub fn new(stats: StatTuning, lifecycle: &LifecycleTuning) -> Self {
        Self {
            stats,
            item_size: lifecycle.item_size,
            item_deceleration: lifecycle.item_deceleration,
        }
    }
}

impl UnitFactory for StatFactory {
    fn unit(&self, spec: UnitSpec) -> Unit {
        let base = self.stats.base(spec.kind);
        let level = spec.level.max(1);
        let exponent = i32::try_from(level - 1).unwrap_or(i32::MAX);
        let scale = self.stats.level_growth.powi(exponent);

        let mut body = Body::new(spec.position, base.size);
        body.acceleration = base.acceleration;
        body.deceleration = base.deceleration;
        body.max_speed = base.max_speed;
        body.is_static = base.is_static;

        Unit {
            id: spec.id,
            kind: spec.kind,
            faction: spec.faction,
            level,
            body,
            stats: Stats {
                health: base.max_health * scale,
                max_health: base.max_health * scale,
                infection_vitality: base.max_infection_vitality * scale,
                max_infection_vitality: base.max_infection_vitality * scale,
                attack: base.attack * scale,
                defense: base.defense * scale,
                attack_range: base.attack_range,
                attack_lock_range: base.attack_lock_range,
                chase_range: base.chase_range,
                attack_cooldown: 0,
                max_attack_cooldown: base.attack_cooldown,
            },
            target: None,
            next_move: None,
            attack_target: None,
            immune: spec.immune,
            invulnerable: false,
            lost: false,
            region: spec.region,
            facing: Facing::default(),
            damaged: false,
            state: UnitState::Alive,
        }
    }

    fn item(&self, id: ItemId, kind: ItemKind, position: Vec2) -> Item {
        let mut body = Body::new(position, self.item_size);
        body.deceleration = self.item_deceleration;
        body.max_speed = f32::MAX;
        Item {
            id,
            kind,
            body,
            destroyed: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(kind: UnitKind, level: u32) -> UnitSpec {
        UnitSpec {
            id: UnitId::new(1),
            kind,
            faction: Faction::Enemy,
            level,
            position: Vec2::new(10.0, 20.0),
            immune: false,
            region: Some(RegionId::new(2)),
        }
    }

    #[test]
    fn stats_grow_geometrically_with_level() {
        let tuning = StatTuning::default();
        let factory = StatFactory::new(tuning.clone(), &LifecycleTuning::default());
        let first = factory.unit(spec(UnitKind::Tank, 1));
        let third = factory.unit(spec(UnitKind::Tank, 3));

        let growth = tuning.level_growth * tuning.level_growth;
        assert!((third.stats.max_health - first.stats.max_health * growth).abs() < 1e-3);
        assert!((third.stats.attack - first.stats.attack * growth).abs() < 1e-3);
        assert_eq!(third.stats.attack_range, first.stats.attack_range);
        assert_eq!(third.region, Some(RegionId::new(2)));
    }

    #[test]
    fn level_zero_is_treated_as_level_one() {
        let factory = StatFactory::new(StatTuning::default(), &LifecycleTuning::default());
        let unit = factory.unit(spec(UnitKind::Ranged, 0));
        assert_eq!(unit.level, 1);
        assert_eq!(unit.stats.health, unit.stats.max_health);
    }

    #[test]
    fn organs_are_static() {
        let factory = StatFactory::new(StatTuning::default(), &LifecycleTuning::default());
        assert!(factory.unit(spec(UnitKind::Organ, 1)).body.is_static);
        assert!(!factory.unit(spec(UnitKind::Tank, 1)).body.is_static);
    }
}
