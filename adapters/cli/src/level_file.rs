//! TOML level description loaded by the headless runner.

use std::collections::BTreeSet;

use outbreak_core::{
    Faction, Level, LevelError, Region, RegionId, SpawnPoint, TileCoord, TileMap, UnitKind,
    UnitPlacement, Vec2, WeightTable,
};
use serde::Deserialize;

const DEFAULT_TILE_LENGTH: f32 = 32.0;

/// Level as written by designers.
///
/// The map is a list of ASCII rows using `.` for floor, `#` for walls, `P` for
/// the player start, `B` for the boss, `O` for organs and `S` for spawn organs.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct LevelFile {
    name: String,
    #[serde(default = "default_tile_length")]
    tile_length: f32,
    map: Vec<String>,
    #[serde(default)]
    regions: Vec<RegionFile>,
    #[serde(default)]
    units: Vec<PlacementFile>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RegionFile {
    name: String,
    tiles: Vec<[u32; 2]>,
    max_units: u32,
    #[serde(default)]
    center: Option<[u32; 2]>,
    #[serde(default)]
    spawn_points: Vec<SpawnPointFile>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SpawnPointFile {
    tile: [u32; 2],
    cooldown: u32,
    kinds: Vec<KindWeight>,
    levels: Vec<LevelWeight>,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct KindWeight {
    kind: UnitKind,
    weight: u32,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LevelWeight {
    level: u32,
    weight: u32,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PlacementFile {
    kind: UnitKind,
    #[serde(default = "default_faction")]
    faction: Faction,
    #[serde(default = "default_level")]
    level: u32,
    tile: [u32; 2],
    #[serde(default)]
    immune: bool,
}

fn default_tile_length() -> f32 {
    DEFAULT_TILE_LENGTH
}

fn default_faction() -> Faction {
    Faction::Enemy
}

fn default_level() -> u32 {
    1
}

impl LevelFile {
    /// Builds a validated level.
    ///
    /// Region identifiers follow declaration order. A region without an
    /// explicit center uses the center of the middle tile of its tile list.
    pub(crate) fn into_level(self) -> Result<Level, LevelError> {
        let map = TileMap::from_ascii(&self.map, self.tile_length)?;

        let regions = self
            .regions
            .into_iter()
            .zip(0..)
            .map(|(region, id)| region.into_region(RegionId::new(id), &map))
            .collect();

        let placements = self
            .units
            .into_iter()
            .map(|unit| UnitPlacement {
                kind: unit.kind,
                faction: unit.faction,
                level: unit.level.max(1),
                tile: tile(unit.tile),
                immune: unit.immune,
            })
            .collect();

        Level::new(self.name, map, regions, placements)
    }
}

impl RegionFile {
    fn into_region(self, id: RegionId, map: &TileMap) -> Region {
        let tiles: BTreeSet<TileCoord> = self.tiles.iter().copied().map(tile).collect();
        let center = self
            .center
            .map(tile)
            .or_else(|| tiles.iter().nth(tiles.len() / 2).copied())
            .map_or(Vec2::ZERO, |center| map.tile_center(center));

        let spawn_points = self
            .spawn_points
            .into_iter()
            .map(|point| SpawnPoint {
                tile: tile(point.tile),
                cooldown: point.cooldown,
                remaining: point.cooldown,
                kinds: WeightTable::new(
                    point
                        .kinds
                        .into_iter()
                        .map(|entry| (entry.kind, entry.weight))
                        .collect(),
                ),
                levels: WeightTable::new(
                    point
                        .levels
                        .into_iter()
                        .map(|entry| (entry.level, entry.weight))
                        .collect(),
                ),
            })
            .collect();

        Region {
            id,
            name: self.name,
            tiles,
            max_units: self.max_units,
            population: 0,
            center,
            spawn_points,
        }
    }
}

fn tile([column, row]: [u32; 2]) -> TileCoord {
    TileCoord::new(column, row)
}
