#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Collision response between units, projectiles, walls and items.

use std::collections::BTreeMap;

use outbreak_core::{
    Body, EmitRequest, EntityKey, Event, Faction, Item, ParticleField, ParticleTuning, PhysicsTuning,
    Rgb, SoundKind, TileMap, Unit, UnitId, UnitKind, Vec2,
};
use outbreak_system_spatial::SpatialIndex;
use rand::Rng;

const ALLY_BLOOD: Rgb = Rgb::from_rgb(120, 200, 80);
const ENEMY_BLOOD: Rgb = Rgb::from_rgb(190, 30, 40);

/// Capability deciding whether the player takes an item it touches.
pub trait PickupHandler {
    /// Offers `item` to `player`; returns `true` when the item was consumed.
    fn accept(&mut self, player: &mut Unit, item: &Item) -> bool;
}

/// Borrowed state a collision pass operates on.
#[derive(Debug)]
pub struct CollisionScene<'a> {
    /// Tile map used for wall correction.
    pub map: &'a TileMap,
    /// Physical grids rebuilt over `units`, `items` and `particles`.
    pub index: &'a SpatialIndex,
    /// Live units sorted by identifier.
    pub units: &'a mut [Unit],
    /// Live items.
    pub items: &'a mut [Item],
    /// Live particles.
    pub particles: &'a mut ParticleField,
    /// Last safe position of every entity.
    pub previous: &'a BTreeMap<EntityKey, Vec2>,
    /// Identifier of the player's unit, if the player is alive.
    pub player: Option<UnitId>,
}

/// Pure system resolving overlaps after movement has been integrated.
#[derive(Debug)]
pub struct CollisionResolver {
    restitution: f32,
    wall_step: f32,
    burst: ParticleTuning,
    bursts: Vec<EmitRequest>,
}

impl CollisionResolver {
    /// Creates a resolver using the provided physics and burst tuning.
    #[must_use]
    pub fn new(physics: &PhysicsTuning, particles: &ParticleTuning) -> Self {
        Self {
            restitution: physics.restitution,
            wall_step: physics.wall_step.max(f32::EPSILON),
            burst: particles.clone(),
            bursts: Vec::new(),
        }
    }

    /// Runs one collision pass over the scene.
    ///
    /// Unit pairs are pushed apart and bounced, projectiles damage opposing
    /// units, bodies that ended up inside walls are stepped back toward their
    /// last safe position and the player collects the items it touches.
    pub fn resolve<R, H>(
        &mut self,
        rng: &mut R,
        scene: CollisionScene<'_>,
        pickups: &mut H,
        events: &mut Vec<Event>,
    ) where
        R: Rng + ?Sized,
        H: PickupHandler + ?Sized,
    {
        self.bursts.clear();
        let CollisionScene {
            map,
            index,
            units,
            items,
            particles,
            previous,
            player,
        } = scene;

        for first in 0..units.len() {
            if !units[first].exists() {
                continue;
            }
            let anchor = units[first].position();

            for second in index.units().neighborhood(anchor) {
                if second <= first || second >= units.len() {
                    continue;
                }
                let (a, b) = pair_mut(units, first, second);
                self.resolve_pair(a, b, player);
            }

            for slot in index.projectiles().neighborhood(anchor) {
                if let Some(particle) = particles.particles_mut().get_mut(slot) {
                    let unit = &mut units[first];
                    if !particle.is_projectile
                        || particle.expired
                        || particle.faction == unit.faction
                        || unit.kind.is_organ()
                        || unit.body.ghost
                        || !unit.is_alive()
                    {
                        continue;
                    }
                    let reach = (unit.body.size + particle.size) / 2.0;
                    if unit.position().distance_squared(particle.position) >= reach * reach {
                        continue;
                    }

                    if !unit.invulnerable {
                        unit.stats.apply_damage(particle.damage);
                    }
                    unit.damaged = true;
                    particle.expired = true;
                    let burst = self.burst_at(particle.position, unit.faction);
                    self.bursts.push(burst);
                    events.push(Event::Sound {
                        kind: SoundKind::Hit,
                        name: hit_cue(unit.kind),
                    });
                }
            }
        }

        for request in &self.bursts {
            particles.emit(rng, request);
        }

        for unit in units.iter_mut() {
            if !unit.exists() || unit.kind.is_flying() || unit.body.is_static {
                continue;
            }
            if let Some(safe) = previous.get(&EntityKey::Unit(unit.id)) {
                self.correct_wall(map, *safe, &mut unit.body);
            }
        }
        for item in items.iter_mut() {
            if item.destroyed {
                continue;
            }
            if let Some(safe) = previous.get(&EntityKey::Item(item.id)) {
                self.correct_wall(map, *safe, &mut item.body);
            }
        }

        let Some(player) = player
            .and_then(|id| units.binary_search_by_key(&id, |unit| unit.id).ok())
            .and_then(|position| units.get_mut(position))
        else {
            return;
        };
        if !player.is_alive() {
            return;
        }
        for slot in index.items().neighborhood(player.position()) {
            let Some(item) = items.get_mut(slot) else {
                continue;
            };
            if item.destroyed {
                continue;
            }
            let reach = (player.body.size + item.body.size) / 2.0;
            if player.position().distance_squared(item.body.position) >= reach * reach {
                continue;
            }
            if pickups.accept(player, item) {
                item.destroyed = true;
                events.push(Event::ItemPickedUp {
                    item: item.id,
                    kind: item.kind,
                });
                events.push(Event::Sound {
                    kind: SoundKind::Pickup,
                    name: "pickup",
                });
            }
        }
    }

    fn resolve_pair(&self, a: &mut Unit, b: &mut Unit, player: Option<UnitId>) {
        if !b.exists() || a.body.ghost || b.body.ghost {
            return;
        }
        if is_friendly_to_player(a, b, player) || is_friendly_to_player(b, a, player) {
            return;
        }
        if a.kind.is_flying() != b.kind.is_flying() {
            return;
        }

        let offset = b.position() - a.position();
        let distance = offset.length();
        let contact = a.body.half_size() + b.body.half_size();
        if distance == 0.0 || distance >= contact {
            return;
        }

        let normal = offset / distance;
        let penetration = contact - distance;
        match (a.body.is_static, b.body.is_static) {
            (true, true) => return,
            (true, false) => b.body.position += normal * penetration,
            (false, true) => a.body.position -= normal * penetration,
            (false, false) => {
                a.body.position -= normal * (penetration / 2.0);
                b.body.position += normal * (penetration / 2.0);
            }
        }

        let inverse_a = inverse_mass(a);
        let inverse_b = inverse_mass(b);
        let approach = (b.body.velocity - a.body.velocity).dot(normal);
        if approach < 0.0 {
            let impulse = -(1.0 + self.restitution) * approach / (inverse_a + inverse_b);
            a.body.velocity -= normal * (impulse * inverse_a);
            b.body.velocity += normal * (impulse * inverse_b);
        }

        a.body.clamp_speed();
        b.body.clamp_speed();
    }

    fn correct_wall(&self, map: &TileMap, safe: Vec2, body: &mut Body) {
        let delta = body.position - safe;
        let step_x = sign(delta.x);
        let step_y = sign(delta.y);
        let candidates = [
            Vec2::new(step_x, 0.0),
            Vec2::new(0.0, step_y),
            Vec2::new(step_x, step_y),
        ];
        let limit = body.size.ceil().max(1.0) as u32;

        for direction in candidates {
            let direction = direction.normalize_or_zero();
            if direction == Vec2::ZERO {
                continue;
            }
            let mut iterations = 0;
            while iterations < limit
                && map.is_wall_at(body.position + direction * body.half_size())
            {
                body.position -= direction * self.wall_step;
                iterations += 1;
            }
            if iterations > 0 {
                if direction.x != 0.0 && direction.y == 0.0 {
                    body.velocity.x = 0.0;
                } else if direction.y != 0.0 && direction.x == 0.0 {
                    body.velocity.y = 0.0;
                }
            }
        }
    }

    fn burst_at(&self, origin: Vec2, faction: Faction) -> EmitRequest {
        EmitRequest {
            count: self.burst.hit_burst_count,
            color: match faction {
                Faction::Ally => ALLY_BLOOD,
                Faction::Enemy => ENEMY_BLOOD,
            },
            origin,
            target: None,
            aim: None,
            faction,
            homing: false,
            is_projectile: false,
            damage: 0.0,
            size: self.burst.burst_size,
            min_speed: self.burst.burst_min_speed,
            max_speed: self.burst.burst_max_speed,
            spread: 0.0,
            ttl: self.burst.burst_ttl,
        }
    }
}

fn is_friendly_to_player(candidate: &Unit, other: &Unit, player: Option<UnitId>) -> bool {
    Some(candidate.id) == player && other.faction == Faction::Ally && other.kind != UnitKind::Player
}

fn sign(value: f32) -> f32 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

fn inverse_mass(unit: &Unit) -> f32 {
    if unit.body.is_static {
        return 0.0;
    }
    let size = unit.body.size.max(f32::EPSILON);
    1.0 / (size * size)
}

fn pair_mut(units: &mut [Unit], first: usize, second: usize) -> (&mut Unit, &mut Unit) {
    let (head, tail) = units.split_at_mut(second);
    (&mut head[first], &mut tail[0])
}

fn hit_cue(kind: UnitKind) -> &'static str {
    match kind {
        UnitKind::Tank => "hit_tank",
        UnitKind::Ranged => "hit_ranged",
        UnitKind::Flying => "hit_flying",
        UnitKind::Player => "hit_player",
        UnitKind::Boss => "hit_boss",
        UnitKind::Organ | UnitKind::SpawnOrgan => "hit_organ",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use outbreak_core::{LifecycleTuning, StatFactory, StatTuning, UnitFactory, UnitSpec};

    #[test]
    fn inverse_mass_scales_with_size_squared() {
        let factory = StatFactory::new(StatTuning::default(), &LifecycleTuning::default());
        let mut unit = factory.unit(UnitSpec {
            id: UnitId::new(0),
            kind: UnitKind::Tank,
            faction: Faction::Enemy,
            level: 1,
            position: Vec2::ZERO,
            immune: false,
            region: None,
        });
        unit.body.size = 10.0;
        assert!((inverse_mass(&unit) - 0.01).abs() < 1e-6);
        unit.body.is_static = true;
        assert_eq!(inverse_mass(&unit), 0.0);
    }

    #[test]
    fn hit_cues_are_kind_specific() {
        assert_ne!(hit_cue(UnitKind::Tank), hit_cue(UnitKind::Boss));
        assert_eq!(hit_cue(UnitKind::Organ), hit_cue(UnitKind::SpawnOrgan));
    }
}
