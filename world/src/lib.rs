#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for the Outbreak simulation.
//!
//! The world owns every live collection and the seeded random source. One
//! call to [`World::step`] advances exactly one frame: the systems read the
//! collections for the duration of a call, stage their structural changes as
//! [`Command`] values and the world applies those after its per-unit pass.

mod items;
mod player;

use std::{collections::BTreeMap, fmt};

use outbreak_core::{
    map::{TILE_BOSS, TILE_ORGAN, TILE_SPAWN_ORGAN},
    Command, ConfigError, EntityKey, Event, Faction, FrameInput, Item, ItemId, Level, MoveTarget,
    ParticleField, PlayerState, Region, RegionId, SimulationConfig, SoundKind, StatFactory,
    TileCoord, TileMap, Unit, UnitFactory, UnitId, UnitKind, UnitSpec, Vec2,
};
use outbreak_system_collision::{CollisionResolver, CollisionScene};
use outbreak_system_combat::{AttackOutcome, Combat};
use outbreak_system_lifecycle::Lifecycle;
use outbreak_system_movement::{Goal, Movement};
use outbreak_system_spatial::SpatialIndex;
use outbreak_system_spawning::Spawning;
use outbreak_system_targeting::{Targeting, TargetingScene};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tracing::{debug, info};

use crate::{items::PlayerPickups, player::lookup};

/// Reasons a world cannot be created from a level.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum WorldError {
    /// The tuning surface failed validation.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    /// A designer-placed unit lies outside the map.
    #[error("unit placed on tile ({column}, {row}) outside the map")]
    PlacementOutOfBounds {
        /// Column of the placement.
        column: u32,
        /// Row of the placement.
        row: u32,
    },
    /// A designer-placed unit lies on a wall.
    #[error("unit placed on wall tile ({column}, {row})")]
    PlacementInWall {
        /// Column of the placement.
        column: u32,
        /// Row of the placement.
        row: u32,
    },
}

/// Summary of one call to [`World::step`].
#[derive(Clone, Debug, PartialEq)]
pub struct TickReport {
    /// Index of the last simulated tick.
    pub tick: u64,
    /// The frame was skipped because the input asked for a pause.
    pub paused: bool,
    /// The level's boss has been defeated.
    pub boss_defeated: bool,
    /// The player's unit was removed.
    pub player_lost: bool,
    /// Number of bosses defeated since the world was created.
    pub levels_completed: u32,
    /// Events broadcast during the tick.
    pub events: Vec<Event>,
}

#[derive(Debug)]
struct Systems {
    targeting: Targeting,
    movement: Movement,
    combat: Combat,
    lifecycle: Lifecycle,
    spawning: Spawning,
    collision: CollisionResolver,
}

impl Systems {
    fn new(config: &SimulationConfig) -> Self {
        Self {
            targeting: Targeting::new(&config.ai),
            movement: Movement::new(&config.physics),
            combat: Combat::new(&config.combat),
            lifecycle: Lifecycle::new(&config.infection, &config.lifecycle),
            spawning: Spawning::new(&config.lifecycle),
            collision: CollisionResolver::new(&config.physics, &config.particles),
        }
    }
}

/// Represents the authoritative Outbreak world state.
pub struct World {
    level: Level,
    config: SimulationConfig,
    factory: Box<dyn UnitFactory>,
    map: TileMap,
    regions: Vec<Region>,
    units: Vec<Unit>,
    items: Vec<Item>,
    particles: ParticleField,
    previous: BTreeMap<EntityKey, Vec2>,
    player: Option<PlayerState>,
    index: SpatialIndex,
    systems: Systems,
    rng: ChaCha8Rng,
    infection_damage: BTreeMap<UnitId, f32>,
    next_unit: u32,
    next_item: u32,
    tick: u64,
    boss_defeated: bool,
    levels_completed: u32,
}

impl World {
    /// Creates a world for `level` with units statted from the tuning tables.
    pub fn from_level(level: Level, config: SimulationConfig) -> Result<Self, WorldError> {
        let factory = StatFactory::new(config.stats.clone(), &config.lifecycle);
        Self::with_factory(level, config, factory)
    }

    /// Creates a world for `level` whose units and items come from `factory`.
    pub fn with_factory<F>(level: Level, config: SimulationConfig, factory: F) -> Result<Self, WorldError>
    where
        F: UnitFactory + 'static,
    {
        config.validate()?;
        for placement in level.placements() {
            let (column, row) = (placement.tile.column(), placement.tile.row());
            if level.map().index(placement.tile).is_none() {
                return Err(WorldError::PlacementOutOfBounds { column, row });
            }
            if level.map().is_wall(placement.tile) {
                return Err(WorldError::PlacementInWall { column, row });
            }
        }

        let mut world = Self {
            map: level.map().clone(),
            regions: Vec::new(),
            units: Vec::new(),
            items: Vec::new(),
            particles: ParticleField::new(),
            previous: BTreeMap::new(),
            player: None,
            index: SpatialIndex::new(config.grid.physical_cell_size, config.grid.combat_cell_size),
            systems: Systems::new(&config),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            infection_damage: BTreeMap::new(),
            next_unit: 0,
            next_item: 0,
            tick: 0,
            boss_defeated: false,
            levels_completed: 0,
            factory: Box::new(factory),
            config,
            level,
        };
        world.populate();
        Ok(world)
    }

    /// Restarts the level from a fresh copy of its static content.
    ///
    /// The random source is reseeded so a restarted level replays identically
    /// under the same input. The completed-level counter is kept.
    pub fn restart(&mut self) {
        info!(level = self.level.name(), "level restarted");
        self.populate();
    }

    /// Advances the simulation by one frame.
    pub fn step(&mut self, input: &FrameInput) -> TickReport {
        if input.pause {
            return self.report(true, Vec::new());
        }

        self.tick += 1;
        let mut events = Vec::new();
        for unit in &mut self.units {
            unit.damaged = false;
        }

        let (width, height) = (self.map.width(), self.map.height());
        self.index
            .rebuild(&self.units, &self.items, self.particles.particles(), width, height);

        self.infection_damage.clear();
        self.update_player(input, &mut events);

        let mut staged = Vec::new();
        self.update_units(&mut staged, &mut events);
        self.advance_particles_and_items();

        self.systems.spawning.handle(
            &mut self.rng,
            &self.map,
            &mut self.regions,
            &self.units,
            &mut staged,
        );
        staged.sort_by_key(phase);
        for command in staged {
            apply(self, command, &mut events);
        }

        self.resolve_collisions(&mut events);
        self.purge();
        self.record_previous();

        self.report(false, events)
    }

    fn report(&self, paused: bool, events: Vec<Event>) -> TickReport {
        TickReport {
            tick: self.tick,
            paused,
            boss_defeated: self.boss_defeated,
            player_lost: self.player.is_none(),
            levels_completed: self.levels_completed,
            events,
        }
    }

    fn populate(&mut self) {
        self.map = self.level.map().clone();
        self.regions = self.level.regions().to_vec();
        for region in &mut self.regions {
            region.population = 0;
        }
        self.units.clear();
        self.items.clear();
        self.particles.clear();
        self.previous.clear();
        self.infection_damage.clear();
        self.systems = Systems::new(&self.config);
        self.rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        self.next_unit = 0;
        self.next_item = 0;
        self.tick = 0;
        self.boss_defeated = false;

        let start = self.map.tile_center(self.level.player_start());
        let player = self.build_unit(UnitKind::Player, Faction::Ally, 1, start, false, None);
        let id = player.id;
        self.admit(player);
        let infection = &self.config.infection;
        self.player = Some(PlayerState::new(
            id,
            &self.map,
            infection.max_infection_points,
            infection.infection_range,
        ));

        for (code, kind) in [
            (TILE_BOSS, UnitKind::Boss),
            (TILE_ORGAN, UnitKind::Organ),
            (TILE_SPAWN_ORGAN, UnitKind::SpawnOrgan),
        ] {
            let tiles: Vec<TileCoord> = self.map.tiles_with_code(code).collect();
            for tile in tiles {
                self.place(kind, Faction::Enemy, 1, tile, false);
            }
        }
        let placements = self.level.placements().to_vec();
        for placement in placements {
            self.place(
                placement.kind,
                placement.faction,
                placement.level,
                placement.tile,
                placement.immune,
            );
        }

        self.record_previous();
        info!(
            level = self.level.name(),
            units = self.units.len(),
            regions = self.regions.len(),
            "level started"
        );
    }

    fn place(&mut self, kind: UnitKind, faction: Faction, level: u32, tile: TileCoord, immune: bool) {
        let region = self.level.region_at(tile);
        let position = self.map.tile_center(tile);
        let unit = self.build_unit(kind, faction, level, position, immune, region);
        self.admit(unit);
    }

    fn build_unit(
        &mut self,
        kind: UnitKind,
        faction: Faction,
        level: u32,
        position: Vec2,
        immune: bool,
        region: Option<RegionId>,
    ) -> Unit {
        let id = UnitId::new(self.next_unit);
        self.next_unit += 1;
        self.factory.unit(UnitSpec {
            id,
            kind,
            faction,
            level,
            position,
            immune,
            region,
        })
    }

    fn admit(&mut self, unit: Unit) {
        self.census(&unit, true);
        self.units.push(unit);
    }

    /// Keeps region populations and the ally counter in step with a unit
    /// joining or leaving the world. Regions count their enemy members only.
    fn census(&mut self, unit: &Unit, joined: bool) {
        match unit.faction {
            Faction::Enemy => adjust_population(&mut self.regions, unit.region, joined),
            Faction::Ally if unit.kind != UnitKind::Player => {
                if let Some(state) = self.player.as_mut() {
                    state.record_ally(joined, self.config.infection.max_allies);
                }
            }
            Faction::Ally => {}
        }
    }

    fn update_player(&mut self, input: &FrameInput, events: &mut Vec<Event>) {
        let Some(state) = self.player.as_mut() else {
            return;
        };
        let Some(slot) = slot_of(&self.units, state.unit) else {
            return;
        };
        if !self.units[slot].is_alive() {
            return;
        }

        let tile_length = self.map.tile_length();
        let unit = &mut self.units[slot];
        player::steer(unit, input, tile_length);
        self.systems.movement.compute_velocity(unit, None, None, None);
        self.systems.movement.integrate(unit);

        let tuning = &self.config.infection;
        let drained = player::infect(state, &self.units[slot], &self.units, tuning, input.infect);
        if let Some((target, damage)) = drained {
            *self.infection_damage.entry(target).or_insert(0.0) += damage;
            events.push(Event::Sound {
                kind: SoundKind::Infect,
                name: "infect",
            });
        }

        let origin = self.units[slot].position();
        if input.rally {
            let answered = player::rally(&mut self.units, state.unit, origin, tuning.rally_radius);
            debug!(allies = answered, "rally called");
        }
        state.explore(&self.map, origin, tuning.exploration_radius);
    }

    fn update_units(&mut self, staged: &mut Vec<Command>, events: &mut Vec<Event>) {
        let player = self.player.as_ref().map(|state| state.unit);
        let infection_target = self.player.as_ref().and_then(|state| state.infection_target);
        let player_facing = player.and_then(|id| lookup(&self.units, id)).map(|unit| unit.facing);

        for slot in 0..self.units.len() {
            if !self.units[slot].exists() {
                continue;
            }
            let id = self.units[slot].id;

            if Some(id) != player {
                let steering = {
                    let scene = TargetingScene {
                        map: &self.map,
                        index: &self.index,
                        units: &self.units,
                        regions: &self.regions,
                        player,
                        infection_target,
                    };
                    self.systems
                        .targeting
                        .select(&mut self.rng, &scene, &self.units[slot])
                };
                if let Some(steering) = steering {
                    steering.apply(&mut self.units[slot]);
                }
            }

            let goal = match self.units[slot].target {
                Some(MoveTarget::Point(point)) => Some(Goal::Point(point)),
                Some(MoveTarget::Unit(other)) if self.units[slot].attack_target != Some(other) => {
                    lookup(&self.units, other).map(|other| Goal::Unit {
                        position: other.position(),
                        half_size: other.body.half_size(),
                    })
                }
                Some(MoveTarget::Unit(_)) | None => None,
            };
            let victim_slot = self.units[slot]
                .attack_target
                .and_then(|victim| slot_of(&self.units, victim))
                .filter(|victim| self.units[*victim].is_alive());

            let outcome = {
                let (unit, victim) = with_victim(&mut self.units, slot, victim_slot);
                if Some(id) != player {
                    self.systems
                        .movement
                        .compute_velocity(unit, goal, victim, player_facing);
                    self.systems.movement.integrate(unit);
                }
                self.systems.combat.resolve(unit, victim, events)
            };

            match outcome {
                AttackOutcome::None => {}
                AttackOutcome::Melee { victim, damage } => {
                    if let Some(victim) = slot_of(&self.units, victim) {
                        let victim = &mut self.units[victim];
                        victim.stats.apply_damage(damage);
                        victim.damaged = true;
                    }
                }
                AttackOutcome::Projectile { request } => {
                    self.particles.emit(&mut self.rng, &request);
                }
            }

            let drained = self.infection_damage.get(&id).copied().unwrap_or(0.0);
            self.systems
                .lifecycle
                .update(&mut self.units[slot], drained, staged, events);
        }
    }

    fn advance_particles_and_items(&mut self) {
        let units = &self.units;
        self.particles.advance(&self.map, |id| lookup(units, id).map(Unit::position));
        for item in &mut self.items {
            items::drift(item);
        }
    }

    fn resolve_collisions(&mut self, events: &mut Vec<Event>) {
        let (width, height) = (self.map.width(), self.map.height());
        self.index
            .rebuild_physical(&self.units, &self.items, self.particles.particles(), width, height);

        let player = self.player.as_ref().map(|state| state.unit);
        let mut pickups = PlayerPickups::new(self.player.as_mut(), &self.config.lifecycle);
        self.systems.collision.resolve(
            &mut self.rng,
            CollisionScene {
                map: &self.map,
                index: &self.index,
                units: &mut self.units,
                items: &mut self.items,
                particles: &mut self.particles,
                previous: &self.previous,
                player,
            },
            &mut pickups,
            events,
        );
    }

    fn purge(&mut self) {
        for item in self.items.iter().filter(|item| item.destroyed) {
            let _ = self.previous.remove(&EntityKey::Item(item.id));
        }
        self.items.retain(|item| !item.destroyed);
        self.particles.purge_expired();
    }

    fn record_previous(&mut self) {
        for unit in self.units.iter().filter(|unit| unit.exists()) {
            let _ = self.previous.insert(EntityKey::Unit(unit.id), unit.position());
        }
        for item in &self.items {
            let _ = self.previous.insert(EntityKey::Item(item.id), item.body.position);
        }
    }

    fn drop_items(&mut self, position: Vec2, count: u32, events: &mut Vec<Event>) {
        let speed = self.config.lifecycle.item_drop_speed;
        for _ in 0..count {
            let id = ItemId::new(self.next_item);
            self.next_item += 1;
            let item = items::dropped(&mut self.rng, self.factory.as_ref(), id, position, speed);
            self.items.push(item);
            events.push(Event::ItemDropped { item: id });
        }
    }

    fn despawn(&mut self, id: UnitId, events: &mut Vec<Event>) {
        let Some(slot) = slot_of(&self.units, id) else {
            return;
        };
        let removed = self.units.remove(slot);
        let _ = self.previous.remove(&EntityKey::Unit(id));
        let _ = self.infection_damage.remove(&id);

        for unit in &mut self.units {
            if unit.attack_target == Some(id) {
                unit.attack_target = None;
            }
            if unit.target == Some(MoveTarget::Unit(id)) {
                unit.target = None;
            }
        }
        for particle in self.particles.particles_mut() {
            if particle.target == Some(id) {
                particle.target = None;
            }
        }

        debug!(unit = id.get(), kind = ?removed.kind, "unit removed");
        events.push(Event::UnitRemoved { unit: id });

        if self.player.as_ref().is_some_and(|state| state.unit == id) {
            self.player = None;
            info!(tick = self.tick, "player lost");
            events.push(Event::PlayerLost);
            return;
        }
        self.census(&removed, false);
        if let Some(state) = self.player.as_mut() {
            if state.infection_target == Some(id) {
                state.infection_target = None;
            }
        }
    }
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("level", &self.level.name())
            .field("tick", &self.tick)
            .field("units", &self.units.len())
            .field("items", &self.items.len())
            .field("particles", &self.particles.len())
            .field("player", &self.player.as_ref().map(|state| state.unit))
            .field("boss_defeated", &self.boss_defeated)
            .finish_non_exhaustive()
    }
}

/// Applies a staged command to the world.
///
/// Commands naming units that no longer exist are ignored.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConvertUnit { unit } => {
            let Some(slot) = slot_of(&world.units, unit) else {
                return;
            };
            let converted = world.systems.lifecycle.convert(
                &mut world.units[slot],
                world.factory.as_ref(),
                world.player.as_mut(),
                out_events,
            );
            if !converted {
                return;
            }
            let joined_enemies = world.units[slot].faction == Faction::Enemy;
            adjust_population(&mut world.regions, world.units[slot].region, joined_enemies);
            for other in &mut world.units {
                if other.attack_target == Some(unit) {
                    other.attack_target = None;
                }
            }
            if let Some(state) = world.player.as_mut() {
                if state.infection_target == Some(unit) {
                    state.infection_target = None;
                }
            }
        }
        Command::DefeatBoss { unit } => {
            if slot_of(&world.units, unit).is_none() {
                return;
            }
            world.boss_defeated = true;
            world.levels_completed += 1;
            info!(unit = unit.get(), levels = world.levels_completed, "boss defeated");
            out_events.push(Event::BossDefeated { unit });
            out_events.push(Event::Sound {
                kind: SoundKind::Victory,
                name: "victory",
            });
            world.despawn(unit, out_events);
        }
        Command::DestroyOrgan { unit } => {
            let Some(position) = lookup(&world.units, unit).map(Unit::position) else {
                return;
            };
            debug!(unit = unit.get(), "organ destroyed");
            out_events.push(Event::OrganDestroyed { unit });
            let drops = world.config.lifecycle.organ_item_drops;
            world.drop_items(position, drops, out_events);
            world.despawn(unit, out_events);
        }
        Command::SpawnUnit {
            kind,
            faction,
            level,
            position,
            immune,
            region,
        } => {
            let unit = world.build_unit(kind, faction, level, position, immune, region);
            let id = unit.id;
            world.admit(unit);
            debug!(unit = id.get(), kind = ?kind, faction = ?faction, "unit spawned");
            out_events.push(Event::UnitSpawned { unit: id, kind, faction });
        }
        Command::DropItems { position, count } => world.drop_items(position, count, out_events),
        Command::DespawnUnit { unit } => world.despawn(unit, out_events),
    }
}

fn phase(command: &Command) -> u8 {
    match command {
        Command::ConvertUnit { .. } => 0,
        Command::SpawnUnit { .. }
        | Command::DropItems { .. }
        | Command::DestroyOrgan { .. }
        | Command::DefeatBoss { .. } => 1,
        Command::DespawnUnit { .. } => 2,
    }
}

fn adjust_population(regions: &mut [Region], region: Option<RegionId>, joined: bool) {
    let Some(region) = region.and_then(|id| regions.iter_mut().find(|region| region.id == id)) else {
        return;
    };
    region.population = if joined {
        region.population + 1
    } else {
        region.population.saturating_sub(1)
    };
}

fn slot_of(units: &[Unit], id: UnitId) -> Option<usize> {
    units.binary_search_by_key(&id, |unit| unit.id).ok()
}

fn with_victim(units: &mut [Unit], slot: usize, victim: Option<usize>) -> (&mut Unit, Option<&Unit>) {
    match victim {
        Some(other) if other < slot => {
            let (head, tail) = units.split_at_mut(slot);
            (&mut tail[0], Some(&head[other]))
        }
        Some(other) if other > slot => {
            let (head, tail) = units.split_at_mut(other);
            (&mut head[slot], Some(&tail[0]))
        }
        _ => (&mut units[slot], None),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::collections::BTreeMap;

    use super::World;
    use outbreak_core::{
        EntityKey, Item, Particle, PlayerState, Region, TileMap, Unit, UnitId, Vec2,
    };

    /// Live units sorted by identifier.
    #[must_use]
    pub fn units(world: &World) -> &[Unit] {
        &world.units
    }

    /// Looks up a live unit.
    #[must_use]
    pub fn unit(world: &World, id: UnitId) -> Option<&Unit> {
        super::lookup(&world.units, id)
    }

    /// Live items.
    #[must_use]
    pub fn items(world: &World) -> &[Item] {
        &world.items
    }

    /// Live particles.
    #[must_use]
    pub fn particles(world: &World) -> &[Particle] {
        world.particles.particles()
    }

    /// Position of every entity at the end of the previous tick.
    #[must_use]
    pub fn previous_positions(world: &World) -> &BTreeMap<EntityKey, Vec2> {
        &world.previous
    }

    /// Player state, or `None` once the player was lost.
    #[must_use]
    pub fn player(world: &World) -> Option<&PlayerState> {
        world.player.as_ref()
    }

    /// The player's unit.
    #[must_use]
    pub fn player_unit(world: &World) -> Option<&Unit> {
        world
            .player
            .as_ref()
            .and_then(|state| super::lookup(&world.units, state.unit))
    }

    /// Row-major explored-tile bitmap of the player.
    #[must_use]
    pub fn explored(world: &World) -> Option<&[bool]> {
        world.player.as_ref().map(|state| state.explored.as_slice())
    }

    /// Tile map of the running level.
    #[must_use]
    pub fn map(world: &World) -> &TileMap {
        &world.map
    }

    /// Regions with their live population.
    #[must_use]
    pub fn regions(world: &World) -> &[Region] {
        &world.regions
    }

    /// Name of the running level.
    #[must_use]
    pub fn level_name(world: &World) -> &str {
        world.level.name()
    }

    /// Index of the last simulated tick.
    #[must_use]
    pub fn tick(world: &World) -> u64 {
        world.tick
    }

    /// Whether the level's boss has been defeated.
    #[must_use]
    pub fn boss_defeated(world: &World) -> bool {
        world.boss_defeated
    }

    /// Number of bosses defeated since the world was created.
    #[must_use]
    pub fn levels_completed(world: &World) -> u32 {
        world.levels_completed
    }
}
