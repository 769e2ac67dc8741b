use outbreak_core::{
    Faction, Facing, LifecycleTuning, PhysicsTuning, StatFactory, StatTuning, Unit, UnitFactory,
    UnitId, UnitKind, UnitSpec, Vec2,
};
use outbreak_system_movement::{Goal, Movement};

fn spawn(id: u32, kind: UnitKind, faction: Faction, position: Vec2) -> Unit {
    StatFactory::new(StatTuning::default(), &LifecycleTuning::default()).unit(UnitSpec {
        id: UnitId::new(id),
        kind,
        faction,
        level: 1,
        position,
        immune: false,
        region: None,
    })
}

#[test]
fn units_accelerate_toward_next_move_up_to_max_speed() {
    let movement = Movement::new(&PhysicsTuning::default());
    let mut tank = spawn(1, UnitKind::Tank, Faction::Enemy, Vec2::new(100.0, 100.0));
    tank.next_move = Some(Vec2::new(500.0, 100.0));

    let mut last_x = tank.position().x;
    for _ in 0..40 {
        movement.compute_velocity(&mut tank, None, None, None);
        assert!(tank.body.velocity.length() <= tank.body.max_speed + 1e-5);
        movement.integrate(&mut tank);
        assert!(tank.position().x >= last_x);
        last_x = tank.position().x;
    }
    assert!(tank.position().x > 150.0);
    assert_eq!(tank.position().y, 100.0);
    assert_eq!(tank.facing, Facing::Right);
}

#[test]
fn units_hold_position_near_point_goal() {
    let movement = Movement::new(&PhysicsTuning::default());
    let mut tank = spawn(1, UnitKind::Tank, Faction::Enemy, Vec2::new(100.0, 100.0));
    let goal = Vec2::new(104.0, 100.0);
    tank.next_move = Some(goal);
    movement.compute_velocity(&mut tank, Some(Goal::Point(goal)), None, None);
    assert_eq!(tank.body.velocity, Vec2::ZERO);
}

#[test]
fn units_stop_short_of_a_followed_unit() {
    let movement = Movement::new(&PhysicsTuning::default());
    let mut ally = spawn(1, UnitKind::Tank, Faction::Ally, Vec2::new(100.0, 100.0));
    let player = spawn(2, UnitKind::Player, Faction::Ally, Vec2::new(140.0, 100.0));
    let goal = Goal::Unit {
        position: player.position(),
        half_size: player.body.half_size(),
    };
    ally.next_move = Some(player.position());
    movement.compute_velocity(&mut ally, Some(goal), None, None);
    assert_eq!(ally.body.velocity, Vec2::ZERO);

    let mut far = spawn(3, UnitKind::Tank, Faction::Ally, Vec2::new(20.0, 100.0));
    far.next_move = Some(player.position());
    movement.compute_velocity(&mut far, Some(goal), None, None);
    assert!(far.body.velocity.x > 0.0);
}

#[test]
fn units_in_reach_of_their_victim_hold_position() {
    let movement = Movement::new(&PhysicsTuning::default());
    let mut tank = spawn(1, UnitKind::Tank, Faction::Enemy, Vec2::new(100.0, 100.0));
    let victim = spawn(2, UnitKind::Tank, Faction::Ally, Vec2::new(140.0, 100.0));
    tank.next_move = Some(victim.position());
    movement.compute_velocity(&mut tank, None, Some(&victim), None);
    assert_eq!(tank.body.velocity, Vec2::ZERO);

    let far = spawn(3, UnitKind::Tank, Faction::Ally, Vec2::new(300.0, 100.0));
    tank.next_move = Some(far.position());
    movement.compute_velocity(&mut tank, None, Some(&far), None);
    assert!(tank.body.velocity.x > 0.0);
}

#[test]
fn allies_mirror_player_facing_and_organs_keep_theirs() {
    let movement = Movement::new(&PhysicsTuning::default());
    let mut ally = spawn(1, UnitKind::Tank, Faction::Ally, Vec2::new(100.0, 100.0));
    ally.next_move = Some(Vec2::new(400.0, 100.0));
    movement.compute_velocity(&mut ally, None, None, Some(Facing::Left));
    assert_eq!(ally.facing, Facing::Left);

    let mut enemy = spawn(2, UnitKind::Tank, Faction::Enemy, Vec2::new(100.0, 100.0));
    enemy.next_move = Some(Vec2::new(0.0, 100.0));
    movement.compute_velocity(&mut enemy, None, None, Some(Facing::Right));
    assert_eq!(enemy.facing, Facing::Left);

    let mut organ = spawn(3, UnitKind::Organ, Faction::Enemy, Vec2::new(100.0, 100.0));
    organ.next_move = Some(Vec2::new(0.0, 100.0));
    movement.compute_velocity(&mut organ, None, None, None);
    movement.integrate(&mut organ);
    assert_eq!(organ.facing, Facing::Right);
    assert_eq!(organ.position(), Vec2::new(100.0, 100.0));
}
