#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Velocity and position integration for units.

use outbreak_core::{Faction, Facing, PhysicsTuning, Unit, UnitKind, Vec2};

/// Destination a unit stops short of.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Goal {
    /// A fixed point; the unit holds within the stop distance of it.
    Point(Vec2),
    /// Another unit; the unit holds once the two bodies are within the stop
    /// distance of touching.
    Unit {
        /// Center of the followed unit.
        position: Vec2,
        /// Half the size of the followed unit.
        half_size: f32,
    },
}

/// Pure system that steers units toward their next move and integrates them.
#[derive(Clone, Debug)]
pub struct Movement {
    stop_distance: f32,
    velocity_epsilon: f32,
}

impl Movement {
    /// Creates the integrator from the physics tuning.
    #[must_use]
    pub fn new(physics: &PhysicsTuning) -> Self {
        Self {
            stop_distance: physics.stop_distance,
            velocity_epsilon: physics.velocity_epsilon,
        }
    }

    /// Accelerates the unit toward its next move and updates its facing.
    ///
    /// Units that already reached `goal` hold position. `attack_target` is the
    /// locked victim, if it is still alive; units already in reach of it hold
    /// position to fight. `player_facing` is mirrored by allied units.
    pub fn compute_velocity(
        &self,
        unit: &mut Unit,
        goal: Option<Goal>,
        attack_target: Option<&Unit>,
        player_facing: Option<Facing>,
    ) {
        if unit.body.is_static {
            unit.body.velocity = Vec2::ZERO;
            return;
        }

        let position = unit.position();
        let holding = goal.is_some_and(|goal| self.reached(unit, goal))
            || attack_target.is_some_and(|victim| position.distance(victim.position()) <= unit.reach_to(victim));

        let push = match unit.next_move {
            Some(next) if !holding => (next - position).normalize_or_zero() * unit.body.acceleration,
            _ => Vec2::ZERO,
        };

        let before = unit.body.velocity;
        unit.body.velocity += push;
        unit.body.clamp_speed();
        let delta = unit.body.velocity - before;

        if unit.kind.is_directionless() {
            return;
        }
        if unit.faction == Faction::Ally && unit.kind != UnitKind::Player {
            if let Some(facing) = player_facing {
                unit.facing = facing;
                return;
            }
        }
        if delta.x.abs() > self.velocity_epsilon && delta.x.abs() >= delta.y.abs() {
            unit.facing = if delta.x > 0.0 { Facing::Right } else { Facing::Left };
        }
    }

    fn reached(&self, unit: &Unit, goal: Goal) -> bool {
        let position = unit.position();
        match goal {
            Goal::Point(point) => position.distance(point) < self.stop_distance,
            Goal::Unit { position: other, half_size } => {
                position.distance(other) < self.stop_distance + unit.body.half_size() + half_size
            }
        }
    }

    /// Applies drag and moves the unit by its velocity.
    pub fn integrate(&self, unit: &mut Unit) {
        let body = &mut unit.body;
        if body.is_static {
            body.velocity = Vec2::ZERO;
            return;
        }

        let speed = body.velocity.length();
        if speed > 0.0 {
            let slowed = (speed - body.deceleration).max(0.0);
            body.velocity *= slowed / speed;
        }

        if body.velocity.x.abs() < self.velocity_epsilon {
            body.velocity.x = 0.0;
        }
        if body.velocity.y.abs() < self.velocity_epsilon {
            body.velocity.y = 0.0;
        }
        if body.velocity.length() < self.velocity_epsilon {
            body.velocity = Vec2::ZERO;
        }

        body.position += body.velocity;
    }
}
