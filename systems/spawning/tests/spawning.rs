use std::collections::BTreeSet;

use outbreak_core::{
    Command, Faction, LifecycleTuning, Region, RegionId, SpawnPoint, StatFactory, StatTuning,
    TileCoord, TileMap, Unit, UnitFactory, UnitId, UnitKind, UnitSpec, Vec2, WeightTable,
};
use outbreak_system_spawning::Spawning;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn region(max_units: u32, points: Vec<SpawnPoint>) -> Region {
    Region {
        id: RegionId::new(3),
        name: "hive".to_owned(),
        tiles: (0..4)
            .flat_map(|row| (0..4).map(move |column| TileCoord::new(column, row)))
            .collect::<BTreeSet<_>>(),
        max_units,
        population: 0,
        center: Vec2::new(64.0, 64.0),
        spawn_points: points,
    }
}

fn point(cooldown: u32, kinds: Vec<(UnitKind, u32)>, levels: Vec<(u32, u32)>) -> SpawnPoint {
    SpawnPoint {
        tile: TileCoord::new(1, 2),
        cooldown,
        remaining: cooldown,
        kinds: WeightTable::new(kinds),
        levels: WeightTable::new(levels),
    }
}

fn map() -> TileMap {
    TileMap::open(4, 4, 32.0).expect("map")
}

#[test]
fn spawn_points_fire_once_per_cooldown() {
    let mut spawning = Spawning::new(&LifecycleTuning::default());
    let mut regions = vec![region(
        10,
        vec![point(5, vec![(UnitKind::Ranged, 1)], vec![(2, 1)])],
    )];
    let mut rng = ChaCha8Rng::seed_from_u64(8);
    let mut out = Vec::new();

    for _ in 0..20 {
        spawning.handle(&mut rng, &map(), &mut regions, &[], &mut out);
    }

    assert_eq!(out.len(), 4);
    assert!(out.iter().all(|command| *command
        == Command::SpawnUnit {
            kind: UnitKind::Ranged,
            faction: Faction::Enemy,
            level: 2,
            position: Vec2::new(48.0, 80.0),
            immune: false,
            region: Some(RegionId::new(3)),
        }));
}

#[test]
fn full_regions_and_empty_tables_skip_silently() {
    let mut spawning = Spawning::new(&LifecycleTuning::default());
    let mut full = region(1, vec![point(1, vec![(UnitKind::Tank, 1)], vec![(1, 1)])]);
    full.population = 1;
    let mut regions = vec![
        full,
        region(5, vec![point(1, Vec::new(), vec![(1, 1)])]),
        region(5, vec![point(1, vec![(UnitKind::Tank, 0)], vec![(1, 1)])]),
    ];
    let mut rng = ChaCha8Rng::seed_from_u64(2);
    let mut out = Vec::new();

    for _ in 0..10 {
        spawning.handle(&mut rng, &map(), &mut regions, &[], &mut out);
    }

    assert!(out.is_empty());
}

#[test]
fn spawn_organs_refill_their_region_on_an_interval() {
    let tuning = LifecycleTuning {
        spawn_organ_interval: 3,
        ..LifecycleTuning::default()
    };
    let mut spawning = Spawning::new(&tuning);
    let mut regions = vec![region(2, Vec::new())];
    let factory = StatFactory::new(StatTuning::default(), &tuning);
    let organs: Vec<Unit> = [(1, Some(RegionId::new(3))), (2, None)]
        .into_iter()
        .map(|(id, region)| {
            factory.unit(UnitSpec {
                id: UnitId::new(id),
                kind: UnitKind::SpawnOrgan,
                faction: Faction::Enemy,
                level: 4,
                position: Vec2::new(40.0, 40.0),
                immune: false,
                region,
            })
        })
        .collect();
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let mut out = Vec::new();

    for _ in 0..6 {
        spawning.handle(&mut rng, &map(), &mut regions, &organs, &mut out);
    }
    assert_eq!(out.len(), 2);
    assert!(out.iter().all(|command| matches!(
        command,
        Command::SpawnUnit {
            kind: UnitKind::Tank,
            level: 4,
            region: Some(_),
            ..
        }
    )));

    regions[0].population = 2;
    out.clear();
    for _ in 0..6 {
        spawning.handle(&mut rng, &map(), &mut regions, &organs, &mut out);
    }
    assert!(out.is_empty());
}

#[test]
fn weighted_draws_follow_the_tables() {
    let mut spawning = Spawning::new(&LifecycleTuning::default());
    let mut regions = vec![region(
        u32::MAX,
        vec![point(
            1,
            vec![(UnitKind::Tank, 1), (UnitKind::Flying, 3)],
            vec![(1, 1), (5, 0)],
        )],
    )];
    let mut rng = ChaCha8Rng::seed_from_u64(13);
    let mut out = Vec::new();

    for _ in 0..400 {
        spawning.handle(&mut rng, &map(), &mut regions, &[], &mut out);
    }

    assert_eq!(out.len(), 400);
    let flying = out
        .iter()
        .filter(|command| matches!(command, Command::SpawnUnit { kind: UnitKind::Flying, .. }))
        .count();
    assert!((240..360).contains(&flying), "flying drawn {flying} times");
    assert!(out
        .iter()
        .all(|command| matches!(command, Command::SpawnUnit { level: 1, .. })));
}
