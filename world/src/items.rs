//! Item drops and the player's pickup rules.

use std::f32::consts::TAU;

use outbreak_core::{
    Item, ItemId, ItemKind, LifecycleTuning, PlayerState, Unit, UnitFactory, Vec2,
};
use outbreak_system_collision::PickupHandler;
use rand::Rng;

/// Pickup rules for the player's unit.
///
/// Health items are refused at full health and infection items at full
/// points, so they stay on the floor for later.
pub(crate) struct PlayerPickups<'a> {
    state: Option<&'a mut PlayerState>,
    heal: f32,
    points: f32,
}

impl<'a> PlayerPickups<'a> {
    pub(crate) fn new(state: Option<&'a mut PlayerState>, tuning: &LifecycleTuning) -> Self {
        Self {
            state,
            heal: tuning.item_heal,
            points: tuning.item_infection_points,
        }
    }
}

impl PickupHandler for PlayerPickups<'_> {
    fn accept(&mut self, player: &mut Unit, item: &Item) -> bool {
        match item.kind {
            ItemKind::Health => {
                if player.stats.health >= player.stats.max_health {
                    return false;
                }
                player.stats.heal(self.heal);
                true
            }
            ItemKind::Infection => {
                let Some(state) = self.state.as_deref_mut() else {
                    return false;
                };
                if state.infection_points >= state.max_infection_points {
                    return false;
                }
                state.infection_points =
                    (state.infection_points + self.points).min(state.max_infection_points);
                true
            }
        }
    }
}

/// Creates an item of a random kind flung from `origin` in a random direction.
pub(crate) fn dropped<R, F>(rng: &mut R, factory: &F, id: ItemId, origin: Vec2, speed: f32) -> Item
where
    R: Rng + ?Sized,
    F: UnitFactory + ?Sized,
{
    let kind = if rng.gen_bool(0.5) {
        ItemKind::Health
    } else {
        ItemKind::Infection
    };
    let mut item = factory.item(id, kind, origin);
    item.body.velocity = Vec2::from_angle(rng.gen_range(0.0..TAU)) * speed;
    item
}

/// Slides an item along its velocity while drag slows it down.
pub(crate) fn drift(item: &mut Item) {
    let body = &mut item.body;
    let speed = body.velocity.length();
    if speed <= body.deceleration {
        body.velocity = Vec2::ZERO;
        return;
    }
    body.velocity *= (speed - body.deceleration) / speed;
    body.position += body.velocity;
}
