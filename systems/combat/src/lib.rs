#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that delivers attacks against locked targets.

use outbreak_core::{
    CombatTuning, EmitRequest, Event, Faction, Rgb, SoundKind, Unit, UnitId, UnitKind,
};

const ALLY_SHOT: Rgb = Rgb::from_rgb(140, 255, 120);
const ENEMY_SHOT: Rgb = Rgb::from_rgb(255, 90, 60);

/// Result of a combat resolution that the world applies.
#[derive(Clone, Debug, PartialEq)]
pub enum AttackOutcome {
    /// No attack was delivered this tick.
    None,
    /// Damage dealt directly to the victim's health.
    Melee {
        /// Unit taking the damage.
        victim: UnitId,
        /// Damage after defense, never negative.
        damage: f32,
    },
    /// Damage particles to be emitted toward the victim.
    Projectile {
        /// Particle emission describing the shot.
        request: EmitRequest,
    },
}

/// Combat resolver that turns locked targets into attacks.
#[derive(Clone, Debug)]
pub struct Combat {
    tuning: CombatTuning,
}

impl Combat {
    /// Creates a resolver from the combat tuning.
    #[must_use]
    pub fn new(tuning: &CombatTuning) -> Self {
        Self {
            tuning: tuning.clone(),
        }
    }

    /// Attacks `victim` when the attacker is ready and close enough.
    ///
    /// The cooldown is reset only when an attack is delivered. Invulnerable
    /// victims are skipped without touching the cooldown. The per-tick
    /// cooldown decrement belongs to the unit's state update.
    pub fn resolve(
        &self,
        attacker: &mut Unit,
        victim: Option<&Unit>,
        events: &mut Vec<Event>,
    ) -> AttackOutcome {
        if attacker.stats.attack_cooldown > 0 || !attacker.is_alive() {
            return AttackOutcome::None;
        }
        let Some(victim) = victim else {
            return AttackOutcome::None;
        };
        if !victim.is_alive() || victim.faction == attacker.faction {
            return AttackOutcome::None;
        }
        if attacker.position().distance(victim.position()) > attacker.reach_to(victim) {
            return AttackOutcome::None;
        }
        if victim.invulnerable {
            return AttackOutcome::None;
        }

        attacker.stats.attack_cooldown = attacker.stats.max_attack_cooldown;
        events.push(Event::Sound {
            kind: SoundKind::Attack,
            name: attack_cue(attacker.kind),
        });

        if !attacker.kind.fires_projectiles() {
            return AttackOutcome::Melee {
                victim: victim.id,
                damage: (attacker.stats.attack - victim.stats.defense).max(0.0),
            };
        }

        let boss = attacker.kind == UnitKind::Boss;
        AttackOutcome::Projectile {
            request: EmitRequest {
                count: if boss { self.tuning.boss_burst_count.max(1) } else { 1 },
                color: match attacker.faction {
                    Faction::Ally => ALLY_SHOT,
                    Faction::Enemy => ENEMY_SHOT,
                },
                origin: attacker.position(),
                target: Some(victim.id),
                aim: Some(victim.position() - attacker.position()),
                faction: attacker.faction,
                homing: !boss,
                is_projectile: true,
                damage: attacker.stats.attack,
                size: self.tuning.projectile_size,
                min_speed: self.tuning.projectile_speed,
                max_speed: self.tuning.projectile_speed,
                spread: if boss { self.tuning.boss_burst_spread } else { 0.0 },
                ttl: self.tuning.projectile_ttl,
            },
        }
    }
}

fn attack_cue(kind: UnitKind) -> &'static str {
    match kind {
        UnitKind::Tank => "bite",
        UnitKind::Ranged => "spit",
        UnitKind::Flying => "sting",
        UnitKind::Boss => "roar",
        UnitKind::Player => "claw",
        UnitKind::Organ | UnitKind::SpawnOrgan => "pulse",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use outbreak_core::{
        LifecycleTuning, StatFactory, StatTuning, UnitFactory, UnitSpec, Vec2,
    };

    fn spawn(id: u32, kind: UnitKind, faction: Faction, x: f32) -> Unit {
        StatFactory::new(StatTuning::default(), &LifecycleTuning::default()).unit(UnitSpec {
            id: UnitId::new(id),
            kind,
            faction,
            level: 1,
            position: Vec2::new(x, 100.0),
            immune: false,
            region: None,
        })
    }

    #[test]
    fn melee_applies_attack_minus_defense() {
        let combat = Combat::new(&CombatTuning::default());
        let mut tank = spawn(1, UnitKind::Tank, Faction::Enemy, 100.0);
        let mut victim = spawn(2, UnitKind::Tank, Faction::Ally, 140.0);
        victim.stats.defense = 4.0;
        let mut events = Vec::new();

        let outcome = combat.resolve(&mut tank, Some(&victim), &mut events);

        assert_eq!(
            outcome,
            AttackOutcome::Melee {
                victim: victim.id,
                damage: tank.stats.attack - 4.0,
            }
        );
        assert_eq!(tank.stats.attack_cooldown, tank.stats.max_attack_cooldown);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn armour_never_heals() {
        let combat = Combat::new(&CombatTuning::default());
        let mut tank = spawn(1, UnitKind::Tank, Faction::Enemy, 100.0);
        let mut victim = spawn(2, UnitKind::Tank, Faction::Ally, 140.0);
        victim.stats.defense = 1_000.0;
        let outcome = combat.resolve(&mut tank, Some(&victim), &mut Vec::new());
        assert_eq!(
            outcome,
            AttackOutcome::Melee {
                victim: victim.id,
                damage: 0.0,
            }
        );
    }

    #[test]
    fn cooling_down_or_out_of_reach_attackers_hold_fire() {
        let combat = Combat::new(&CombatTuning::default());
        let mut tank = spawn(1, UnitKind::Tank, Faction::Enemy, 100.0);
        let far = spawn(2, UnitKind::Tank, Faction::Ally, 400.0);
        assert_eq!(combat.resolve(&mut tank, Some(&far), &mut Vec::new()), AttackOutcome::None);
        assert_eq!(tank.stats.attack_cooldown, 0);

        let near = spawn(3, UnitKind::Tank, Faction::Ally, 130.0);
        tank.stats.attack_cooldown = 2;
        assert_eq!(combat.resolve(&mut tank, Some(&near), &mut Vec::new()), AttackOutcome::None);
        assert_eq!(combat.resolve(&mut tank, None, &mut Vec::new()), AttackOutcome::None);
    }

    #[test]
    fn invulnerable_victims_keep_the_cooldown_ready() {
        let combat = Combat::new(&CombatTuning::default());
        let mut tank = spawn(1, UnitKind::Tank, Faction::Enemy, 100.0);
        let mut victim = spawn(2, UnitKind::Tank, Faction::Ally, 130.0);
        victim.invulnerable = true;
        let mut events = Vec::new();
        assert_eq!(combat.resolve(&mut tank, Some(&victim), &mut events), AttackOutcome::None);
        assert_eq!(tank.stats.attack_cooldown, 0);
        assert!(events.is_empty());
    }

    #[test]
    fn ranged_units_fire_one_homing_shot_and_bosses_burst() {
        let tuning = CombatTuning::default();
        let combat = Combat::new(&tuning);
        let victim = spawn(9, UnitKind::Tank, Faction::Ally, 200.0);

        let mut ranged = spawn(1, UnitKind::Ranged, Faction::Enemy, 100.0);
        match combat.resolve(&mut ranged, Some(&victim), &mut Vec::new()) {
            AttackOutcome::Projectile { request } => {
                assert_eq!(request.count, 1);
                assert!(request.homing);
                assert_eq!(request.target, Some(victim.id));
                assert_eq!(request.faction, Faction::Enemy);
            }
            other => panic!("expected projectile, found {other:?}"),
        }

        let mut boss = spawn(2, UnitKind::Boss, Faction::Enemy, 100.0);
        match combat.resolve(&mut boss, Some(&victim), &mut Vec::new()) {
            AttackOutcome::Projectile { request } => {
                assert_eq!(request.count, tuning.boss_burst_count);
                assert_eq!(request.spread, tuning.boss_burst_spread);
            }
            other => panic!("expected burst, found {other:?}"),
        }
    }
}
