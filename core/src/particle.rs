//! Lightweight particles used for projectiles and cosmetic bursts.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;

use crate::{map::TileMap, Faction, Rgb, UnitId};

/// Fraction of the remaining heading error a homing particle corrects per tick.
const HOMING_STEER: f32 = 0.25;

/// Lightweight simulated point. Particles are not entities.
#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    /// Position in world units.
    pub position: Vec2,
    /// Displacement applied per tick.
    pub velocity: Vec2,
    /// Rotation in radians.
    pub angle: f32,
    /// Rotation applied per tick.
    pub angular_velocity: f32,
    /// Render color.
    pub color: Rgb,
    /// Diameter in world units.
    pub size: f32,
    /// Ticks left before the particle expires.
    pub ttl: u32,
    /// Unit the particle homes in on.
    pub target: Option<UnitId>,
    /// Whether the particle steers toward its target.
    pub homing: bool,
    /// Whether the particle is an attack in flight.
    pub is_projectile: bool,
    /// Faction of the unit that fired the particle.
    pub faction: Faction,
    /// Damage dealt on impact.
    pub damage: f32,
    /// Set when the particle should be removed.
    pub expired: bool,
}

/// Parameters of the particle-spawn capability.
#[derive(Clone, Debug, PartialEq)]
pub struct EmitRequest {
    /// Number of particles to emit.
    pub count: u32,
    /// Render color.
    pub color: Rgb,
    /// Emission origin.
    pub origin: Vec2,
    /// Unit the particles aim at; `None` scatters them uniformly.
    pub target: Option<UnitId>,
    /// Direction toward the target, if any.
    pub aim: Option<Vec2>,
    /// Faction owning the particles.
    pub faction: Faction,
    /// Whether the particles steer toward their target.
    pub homing: bool,
    /// Whether the particles deal damage.
    pub is_projectile: bool,
    /// Damage per particle.
    pub damage: f32,
    /// Particle diameter.
    pub size: f32,
    /// Minimum launch speed.
    pub min_speed: f32,
    /// Maximum launch speed.
    pub max_speed: f32,
    /// Angular spread in radians around `aim`.
    pub spread: f32,
    /// Particle lifetime in ticks.
    pub ttl: u32,
}

/// Owner of all live particles.
#[derive(Clone, Debug, Default)]
pub struct ParticleField {
    particles: Vec<Particle>,
}

impl ParticleField {
    /// Creates an empty field.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Live particles.
    #[must_use]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Mutable access to the live particles.
    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    /// Number of live particles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// Reports whether the field holds no particles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Emits `request.count` particles.
    ///
    /// Aimed emissions spread evenly across `spread` around the aim direction;
    /// unaimed emissions pick uniformly random headings.
    pub fn emit<R: Rng + ?Sized>(&mut self, rng: &mut R, request: &EmitRequest) {
        let count = request.count;
        self.particles.reserve(count as usize);
        let base_angle = request.aim.map(|aim| aim.y.atan2(aim.x));

        for index in 0..count {
            let heading = match base_angle {
                Some(angle) if count > 1 => {
                    let step = request.spread / (count - 1) as f32;
                    angle - request.spread / 2.0 + step * index as f32
                }
                Some(angle) => angle,
                None => rng.gen_range(0.0..TAU),
            };
            let speed = if request.max_speed > request.min_speed {
                rng.gen_range(request.min_speed..request.max_speed)
            } else {
                request.min_speed
            };

            self.particles.push(Particle {
                position: request.origin,
                velocity: Vec2::from_angle(heading) * speed,
                angle: heading,
                angular_velocity: rng.gen_range(-0.2..0.2),
                color: request.color,
                size: request.size,
                ttl: request.ttl,
                target: request.target,
                homing: request.homing,
                is_projectile: request.is_projectile,
                faction: request.faction,
                damage: request.damage,
                expired: false,
            });
        }
    }

    /// Advances every particle by one tick.
    ///
    /// Homing particles steer toward `target_position(target)` while the target
    /// exists. Projectiles that enter a wall tile expire.
    pub fn advance<F>(&mut self, map: &TileMap, target_position: F)
    where
        F: Fn(UnitId) -> Option<Vec2>,
    {
        for particle in &mut self.particles {
            if particle.expired {
                continue;
            }

            if particle.homing {
                if let Some(goal) = particle.target.and_then(&target_position) {
                    let speed = particle.velocity.length();
                    let desired = (goal - particle.position).normalize_or_zero() * speed;
                    particle.velocity += (desired - particle.velocity) * HOMING_STEER;
                }
            }

            particle.position += particle.velocity;
            particle.angle += particle.angular_velocity;
            particle.ttl = particle.ttl.saturating_sub(1);

            if particle.ttl == 0 || (particle.is_projectile && map.is_wall_at(particle.position)) {
                particle.expired = true;
            }
        }
    }

    /// Removes expired particles.
    pub fn purge_expired(&mut self) {
        self.particles.retain(|particle| !particle.expired);
    }

    /// Removes every particle.
    pub fn clear(&mut self) {
        self.particles.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn request(count: u32) -> EmitRequest {
        EmitRequest {
            count,
            color: Rgb::from_rgb(255, 0, 0),
            origin: Vec2::new(50.0, 50.0),
            target: Some(UnitId::new(3)),
            aim: Some(Vec2::X),
            faction: Faction::Enemy,
            homing: true,
            is_projectile: true,
            damage: 2.0,
            size: 4.0,
            min_speed: 2.0,
            max_speed: 2.0,
            spread: 0.0,
            ttl: 10,
        }
    }

    #[test]
    fn aimed_emission_launches_toward_aim() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut field = ParticleField::new();
        field.emit(&mut rng, &request(1));
        let particle = &field.particles()[0];
        assert!((particle.velocity - Vec2::new(2.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn homing_particles_turn_toward_target() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let map = TileMap::open(10, 10, 10.0).expect("map");
        let mut field = ParticleField::new();
        field.emit(&mut rng, &request(1));
        field.advance(&map, |_| Some(Vec2::new(50.0, 90.0)));
        assert!(field.particles()[0].velocity.y > 0.0);
    }

    #[test]
    fn projectiles_expire_in_walls_and_on_ttl() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let map = TileMap::from_ascii(&["...", "..#"], 50.0).expect("map");
        let mut field = ParticleField::new();
        let mut into_wall = request(1);
        into_wall.origin = Vec2::new(99.0, 75.0);
        into_wall.homing = false;
        field.emit(&mut rng, &into_wall);
        let mut short = request(1);
        short.ttl = 1;
        short.homing = false;
        short.origin = Vec2::new(10.0, 10.0);
        field.emit(&mut rng, &short);

        field.advance(&map, |_| None);
        assert!(field.particles().iter().all(|particle| particle.expired));
        field.purge_expired();
        assert!(field.is_empty());
    }
}
