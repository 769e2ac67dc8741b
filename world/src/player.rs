//! Player controller driven by the frame input snapshot.

use outbreak_core::{
    Faction, FrameInput, InfectionTuning, MoveTarget, PlayerState, Unit, UnitId, UnitKind, Vec2,
};

/// Points the player one tile ahead in the pressed direction.
pub(crate) fn steer(unit: &mut Unit, input: &FrameInput, tile_length: f32) {
    let direction = input.direction().normalize_or_zero();
    unit.target = None;
    unit.attack_target = None;
    unit.next_move = (direction != Vec2::ZERO).then(|| unit.position() + direction * tile_length);
}

/// Picks or keeps the infection target and pays for this tick's drain.
///
/// Returns the unit to damage and the vitality to take from it. Points
/// regenerate on every tick without an infection. At the ally cap only units
/// that cannot join the player (bosses and organs) may still be infected.
pub(crate) fn infect(
    state: &mut PlayerState,
    player: &Unit,
    units: &[Unit],
    tuning: &InfectionTuning,
    infecting: bool,
) -> Option<(UnitId, f32)> {
    let target = if infecting && state.infection_points >= tuning.infection_cost {
        let origin = player.position();
        let range = state.infection_range;
        let capped = state.max_allies_reached;
        let eligible = |unit: &Unit| {
            is_infectable(unit, capped) && origin.distance(unit.position()) <= range
        };

        let kept = state
            .infection_target
            .and_then(|id| lookup(units, id))
            .filter(|&unit| eligible(unit))
            .map(|unit| unit.id);
        kept.or_else(|| nearest(units, origin, eligible))
    } else {
        None
    };

    state.infection_target = target;
    match target {
        Some(id) => {
            state.infection_points = (state.infection_points - tuning.infection_cost).max(0.0);
            Some((id, tuning.infection_power))
        }
        None => {
            state.infection_points =
                (state.infection_points + tuning.infection_regen).min(state.max_infection_points);
            None
        }
    }
}

/// Calls every ally within `radius` of `origin` back to the player.
///
/// Returns the number of allies that answered.
pub(crate) fn rally(units: &mut [Unit], player: UnitId, origin: Vec2, radius: f32) -> usize {
    let mut answered = 0;
    for unit in units.iter_mut() {
        if unit.id == player
            || unit.faction != Faction::Ally
            || !unit.is_alive()
            || unit.kind.is_organ()
            || origin.distance(unit.position()) > radius
        {
            continue;
        }
        unit.lost = false;
        unit.attack_target = None;
        unit.target = Some(MoveTarget::Unit(player));
        answered += 1;
    }
    answered
}

fn is_infectable(unit: &Unit, capped: bool) -> bool {
    let joins_player = matches!(unit.kind, UnitKind::Tank | UnitKind::Ranged | UnitKind::Flying);
    unit.is_alive()
        && unit.faction == Faction::Enemy
        && !unit.immune
        && unit.kind != UnitKind::Player
        && !(capped && joins_player)
}

fn nearest<P>(units: &[Unit], origin: Vec2, eligible: P) -> Option<UnitId>
where
    P: Fn(&Unit) -> bool,
{
    let mut best: Option<(f32, UnitId)> = None;
    for unit in units.iter().filter(|&unit| eligible(unit)) {
        let distance_sq = origin.distance_squared(unit.position());
        if best.map_or(true, |(best_sq, _)| distance_sq < best_sq) {
            best = Some((distance_sq, unit.id));
        }
    }
    best.map(|(_, id)| id)
}

pub(crate) fn lookup(units: &[Unit], id: UnitId) -> Option<&Unit> {
    units
        .binary_search_by_key(&id, |unit| unit.id)
        .ok()
        .and_then(|slot| units.get(slot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use outbreak_core::{LifecycleTuning, StatFactory, StatTuning, TileMap, UnitFactory, UnitSpec};

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

    fn state() -> PlayerState {
        let map = TileMap::open(20, 20, 32.0).expect("map");
        PlayerState::new(UnitId::new(0), &map, 10.0, 160.0)
    }

    #[test]
    fn infection_prefers_the_nearest_eligible_enemy() {
        let player = spawn(0, UnitKind::Player, Faction::Ally, 100.0);
        let mut immune = spawn(1, UnitKind::Tank, Faction::Enemy, 120.0);
        immune.immune = true;
        let units = vec![
            player.clone(),
            immune,
            spawn(2, UnitKind::Tank, Faction::Ally, 130.0),
            spawn(3, UnitKind::Ranged, Faction::Enemy, 200.0),
            spawn(4, UnitKind::Tank, Faction::Enemy, 180.0),
            spawn(5, UnitKind::Tank, Faction::Enemy, 400.0),
        ];
        let tuning = InfectionTuning::default();
        let mut state = state();

        let drained = infect(&mut state, &player, &units, &tuning, true);

        assert_eq!(drained, Some((UnitId::new(4), tuning.infection_power)));
        assert_eq!(state.infection_target, Some(UnitId::new(4)));
        assert_eq!(state.infection_points, 10.0 - tuning.infection_cost);
    }

    #[test]
    fn points_regenerate_while_idle_and_run_out_while_infecting() {
        let player = spawn(0, UnitKind::Player, Faction::Ally, 100.0);
        let units = vec![player.clone(), spawn(1, UnitKind::Tank, Faction::Enemy, 150.0)];
        let tuning = InfectionTuning {
            infection_cost: 4.0,
            infection_regen: 1.0,
            ..InfectionTuning::default()
        };
        let mut state = state();

        assert!(infect(&mut state, &player, &units, &tuning, true).is_some());
        assert!(infect(&mut state, &player, &units, &tuning, true).is_some());
        assert_eq!(infect(&mut state, &player, &units, &tuning, true), None);
        assert_eq!(state.infection_target, None);
        assert_eq!(state.infection_points, 3.0);

        assert_eq!(infect(&mut state, &player, &units, &tuning, false), None);
        assert_eq!(state.infection_points, 4.0);
    }

    #[test]
    fn the_ally_cap_only_spares_units_that_would_join() {
        let player = spawn(0, UnitKind::Player, Faction::Ally, 100.0);
        let units = vec![
            player.clone(),
            spawn(1, UnitKind::Tank, Faction::Enemy, 120.0),
            spawn(2, UnitKind::Organ, Faction::Enemy, 200.0),
        ];
        let mut state = state();
        state.max_allies_reached = true;

        let drained = infect(&mut state, &player, &units, &InfectionTuning::default(), true);

        assert_eq!(drained.map(|(id, _)| id), Some(UnitId::new(2)));
    }

    #[test]
    fn rally_recalls_nearby_allies_only() {
        let mut units = vec![
            spawn(0, UnitKind::Player, Faction::Ally, 100.0),
            spawn(1, UnitKind::Tank, Faction::Ally, 150.0),
            spawn(2, UnitKind::Tank, Faction::Ally, 900.0),
            spawn(3, UnitKind::Tank, Faction::Enemy, 120.0),
        ];
        for unit in &mut units {
            unit.lost = true;
        }

        let answered = rally(&mut units, UnitId::new(0), Vec2::new(100.0, 100.0), 400.0);

        assert_eq!(answered, 1);
        assert!(!units[1].lost);
        assert_eq!(units[1].target, Some(MoveTarget::Unit(UnitId::new(0))));
        assert!(units[2].lost);
        assert!(units[3].lost);
    }
}
