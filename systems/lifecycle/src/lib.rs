#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-unit state updates: infection vitality, death timers and conversion.

use outbreak_core::{
    Command, Event, Faction, InfectionTuning, LifecycleTuning, PlayerState, SoundKind, Unit,
    UnitFactory, UnitKind, UnitSpec, UnitState, Vec2,
};
use tracing::debug;

/// Pure system advancing the life state of units.
#[derive(Clone, Debug)]
pub struct Lifecycle {
    vitality_recovery: f32,
    lost_drain: f32,
    max_allies: u32,
    death_delay_ticks: u32,
}

impl Lifecycle {
    /// Creates the system from the infection and lifecycle tuning.
    #[must_use]
    pub fn new(infection: &InfectionTuning, lifecycle: &LifecycleTuning) -> Self {
        Self {
            vitality_recovery: infection.vitality_recovery,
            lost_drain: infection.lost_drain,
            max_allies: infection.max_allies,
            death_delay_ticks: lifecycle.death_delay_ticks,
        }
    }

    /// Advances one unit by a tick.
    ///
    /// `infection_damage` is the vitality drained by the player this tick.
    /// Zero-vitality effects and finished death timers are staged into `out`.
    pub fn update(
        &self,
        unit: &mut Unit,
        infection_damage: f32,
        out: &mut Vec<Command>,
        events: &mut Vec<Event>,
    ) {
        match unit.state {
            UnitState::Dead => return,
            UnitState::Dying { remaining: 0 } => {
                unit.state = UnitState::Dead;
                out.push(Command::DespawnUnit { unit: unit.id });
                return;
            }
            UnitState::Dying { remaining } => {
                unit.state = UnitState::Dying {
                    remaining: remaining - 1,
                };
                return;
            }
            UnitState::Alive => {}
        }

        unit.stats.tick_cooldown();

        if unit.stats.health <= 0.0 {
            unit.state = UnitState::Dying {
                remaining: self.death_delay_ticks,
            };
            unit.attack_target = None;
            unit.next_move = None;
            unit.body.velocity = Vec2::ZERO;
            events.push(Event::UnitDied { unit: unit.id });
            events.push(Event::Sound {
                kind: SoundKind::Death,
                name: death_cue(unit.kind),
            });
            return;
        }

        if unit.kind == UnitKind::Player {
            return;
        }

        let drift = if unit.lost {
            -self.lost_drain
        } else {
            self.vitality_recovery
        };
        unit.stats.adjust_vitality(drift - infection_damage.max(0.0));

        if unit.stats.infection_vitality > 0.0 {
            return;
        }
        out.push(match unit.kind {
            UnitKind::Boss => Command::DefeatBoss { unit: unit.id },
            UnitKind::Organ | UnitKind::SpawnOrgan => Command::DestroyOrgan { unit: unit.id },
            UnitKind::Tank | UnitKind::Ranged | UnitKind::Flying | UnitKind::Player => {
                Command::ConvertUnit { unit: unit.id }
            }
        });
    }

    /// Flips the unit to the opposite faction.
    ///
    /// The unit is rebuilt from `factory` with the same identifier, kind,
    /// level, position and region. The ally counter of `player` moves by one;
    /// a gain beyond the ally cap is refused and restores the unit's vitality
    /// instead. Returns whether the unit changed faction.
    pub fn convert<F>(
        &self,
        unit: &mut Unit,
        factory: &F,
        player: Option<&mut PlayerState>,
        events: &mut Vec<Event>,
    ) -> bool
    where
        F: UnitFactory + ?Sized,
    {
        if !unit.is_alive() {
            return false;
        }
        let faction = unit.faction.opposite();

        if let Some(player) = player {
            if !player.record_conversion(faction == Faction::Ally, self.max_allies) {
                unit.stats.infection_vitality = unit.stats.max_infection_vitality;
                debug!(unit = unit.id.get(), allies = player.num_allies, "conversion refused at ally cap");
                events.push(Event::ConversionRefused { unit: unit.id });
                return false;
            }
        }

        let mut fresh = factory.unit(UnitSpec {
            id: unit.id,
            kind: unit.kind,
            faction,
            level: unit.level,
            position: unit.position(),
            immune: unit.immune,
            region: unit.region,
        });
        fresh.facing = unit.facing;
        *unit = fresh;

        debug!(unit = unit.id.get(), faction = ?faction, "unit converted");
        events.push(Event::UnitConverted {
            unit: unit.id,
            faction,
        });
        events.push(Event::Sound {
            kind: SoundKind::Convert,
            name: match faction {
                Faction::Ally => "convert_ally",
                Faction::Enemy => "convert_enemy",
            },
        });
        true
    }
}

fn death_cue(kind: UnitKind) -> &'static str {
    match kind {
        UnitKind::Player => "player_death",
        UnitKind::Boss => "boss_death",
        UnitKind::Organ | UnitKind::SpawnOrgan => "organ_burst",
        UnitKind::Tank | UnitKind::Ranged | UnitKind::Flying => "unit_death",
    }
}
