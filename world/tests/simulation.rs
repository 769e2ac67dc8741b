use outbreak_core::{
    Event, Faction, FrameInput, Level, MoveTarget, SimulationConfig, SoundKind, TileCoord,
    TileMap, UnitId, UnitKind, UnitPlacement, Vec2,
};
use outbreak_world::{query, World};

fn level(rows: &[&str], placements: Vec<UnitPlacement>) -> Level {
    let map = TileMap::from_ascii(rows, 32.0).expect("map");
    Level::new("scenario", map, Vec::new(), placements).expect("level")
}

fn enemy_tank(column: u32, row: u32) -> UnitPlacement {
    UnitPlacement {
        kind: UnitKind::Tank,
        faction: Faction::Enemy,
        level: 1,
        tile: TileCoord::new(column, row),
        immune: false,
    }
}

fn overwhelming_infection() -> SimulationConfig {
    let mut config = SimulationConfig::default();
    config.infection.infection_power = 500.0;
    config.infection.infection_cost = 0.0;
    config
}

fn infect() -> FrameInput {
    FrameInput {
        infect: true,
        ..FrameInput::default()
    }
}

#[test]
fn infecting_the_boss_completes_the_level() {
    let mut world = World::from_level(
        level(&["P.B..", "....."], Vec::new()),
        overwhelming_infection(),
    )
    .expect("world");
    let boss = query::units(&world)
        .iter()
        .find(|unit| unit.kind == UnitKind::Boss)
        .map(|unit| unit.id)
        .expect("boss");

    let report = world.step(&infect());

    assert!(report.boss_defeated);
    assert_eq!(report.levels_completed, 1);
    assert!(report.events.contains(&Event::BossDefeated { unit: boss }));
    assert!(report.events.contains(&Event::Sound {
        kind: SoundKind::Victory,
        name: "victory",
    }));
    assert!(query::unit(&world, boss).is_none());
    assert!(query::boss_defeated(&world));

    world.restart();
    assert!(!query::boss_defeated(&world));
    assert_eq!(query::levels_completed(&world), 1);
}

#[test]
fn destroyed_organs_scatter_items() {
    let mut world = World::from_level(
        level(&["P.O..", "....."], Vec::new()),
        overwhelming_infection(),
    )
    .expect("world");
    let organ = UnitId::new(1);

    let report = world.step(&infect());

    assert!(report.events.contains(&Event::OrganDestroyed { unit: organ }));
    let dropped = report
        .events
        .iter()
        .filter(|event| matches!(event, Event::ItemDropped { .. }))
        .count();
    assert_eq!(dropped, 3);
    assert!(query::unit(&world, organ).is_none());
    assert!(!report.boss_defeated);
}

#[test]
fn the_ally_cap_stops_further_conversions() {
    let mut config = overwhelming_infection();
    config.infection.max_allies = 1;
    let mut world = World::from_level(
        level(
            &["P......", ".......", "......."],
            vec![enemy_tank(2, 0), enemy_tank(4, 2)],
        ),
        config,
    )
    .expect("world");
    let (near, far) = (UnitId::new(1), UnitId::new(2));

    let first = world.step(&infect());
    assert!(first.events.contains(&Event::UnitConverted {
        unit: near,
        faction: Faction::Ally,
    }));

    let mut later = Vec::new();
    for _ in 0..5 {
        later.extend(world.step(&infect()).events);
    }

    assert!(!later.contains(&Event::UnitConverted {
        unit: far,
        faction: Faction::Ally,
    }));
    let player = query::player(&world).expect("player");
    assert_eq!(player.num_allies, 1);
    assert!(player.max_allies_reached);
    assert_ne!(player.infection_target, Some(far));
}

#[test]
fn the_player_is_lost_to_an_adjacent_enemy() {
    let mut config = SimulationConfig::default();
    config.stats.player.max_health = 1.0;
    config.lifecycle.death_delay_ticks = 0;
    let mut world = World::from_level(level(&[".....", "P....", "....."], vec![enemy_tank(1, 1)]), config)
        .expect("world");

    let lost = (0..10)
        .map(|_| world.step(&FrameInput::default()))
        .find(|report| report.player_lost)
        .expect("the player should be lost");

    assert!(lost.events.contains(&Event::PlayerLost));
    assert!(query::player(&world).is_none());
    assert!(query::explored(&world).is_none());

    let after = world.step(&FrameInput::default());
    assert!(after.player_lost);
    assert!(!after.events.contains(&Event::PlayerLost));
}

#[test]
fn walls_stop_the_player() {
    let map = TileMap::from_ascii(&["P#...", "....."], 64.0).expect("map");
    let level = Level::new("corridor", map, Vec::new(), Vec::new()).expect("level");
    let mut world = World::from_level(level, SimulationConfig::default()).expect("world");

    for _ in 0..60 {
        let _ = world.step(&FrameInput {
            right: true,
            ..FrameInput::default()
        });
    }

    let player = query::player_unit(&world).expect("player");
    assert!(player.position().x > 32.0);
    assert!(player.position().x < 64.0);
    assert_eq!(query::previous_positions(&world).len(), query::units(&world).len());
}

#[test]
fn escorts_stop_short_of_an_idle_player() {
    let ally = UnitPlacement {
        faction: Faction::Ally,
        ..enemy_tank(3, 0)
    };
    let rows = ["P.......", "........", "........", "........", "........", "........"];
    let config = SimulationConfig::default();
    let stop_distance = config.physics.stop_distance;
    let mut world = World::from_level(level(&rows, vec![ally]), config).expect("world");
    let (player, escort) = (UnitId::new(0), UnitId::new(1));

    let mut closest = f32::MAX;
    for _ in 0..120 {
        let _ = world.step(&FrameInput::default());
        let player = query::unit(&world, player).expect("player").position();
        let escort = query::unit(&world, escort).expect("escort").position();
        closest = closest.min(player.distance(escort));
    }

    let escort = query::unit(&world, escort).expect("escort");
    assert_eq!(escort.target, Some(MoveTarget::Unit(player)));
    assert!(closest > stop_distance, "escort closed to {closest}");
    assert_eq!(escort.body.velocity, Vec2::ZERO);
}
