//! Static level content cloned on every (re)start.

use crate::{
    map::{LevelError, TileCoord, TileMap, TILE_PLAYER_START},
    region::Region,
    unit::UnitKind,
    Faction, RegionId,
};

/// Unit placed by the level designer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnitPlacement {
    /// Kind of the unit.
    pub kind: UnitKind,
    /// Faction of the unit.
    pub faction: Faction,
    /// Level of the unit.
    pub level: u32,
    /// Tile the unit starts on.
    pub tile: TileCoord,
    /// Whether the unit cannot be infection-targeted.
    pub immune: bool,
}

/// Static content of a level: map, regions and designer-placed units.
///
/// Bosses, organs and spawn organs are read from the map's tile codes; the
/// player starts on the first player-start tile.
#[derive(Clone, Debug, PartialEq)]
pub struct Level {
    name: String,
    map: TileMap,
    regions: Vec<Region>,
    placements: Vec<UnitPlacement>,
    player_start: TileCoord,
}

impl Level {
    /// Validates and assembles a level.
    pub fn new(
        name: impl Into<String>,
        map: TileMap,
        regions: Vec<Region>,
        placements: Vec<UnitPlacement>,
    ) -> Result<Self, LevelError> {
        for region in &regions {
            let outside = region.tiles.iter().copied().find(|tile| map.index(*tile).is_none());
            if let Some(tile) = outside {
                return Err(LevelError::RegionOutOfBounds {
                    region: region.name.clone(),
                    column: tile.column(),
                    row: tile.row(),
                });
            }
        }

        let player_start = map
            .tiles_with_code(TILE_PLAYER_START)
            .next()
            .ok_or(LevelError::MissingPlayerStart)?;

        Ok(Self {
            name: name.into(),
            map,
            regions,
            placements,
            player_start,
        })
    }

    /// Name of the level.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tile map of the level.
    #[must_use]
    pub fn map(&self) -> &TileMap {
        &self.map
    }

    /// Regions of the level.
    #[must_use]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Designer-placed units.
    #[must_use]
    pub fn placements(&self) -> &[UnitPlacement] {
        &self.placements
    }

    /// Tile the player starts on.
    #[must_use]
    pub const fn player_start(&self) -> TileCoord {
        self.player_start
    }

    /// First region containing the tile.
    #[must_use]
    pub fn region_at(&self, tile: TileCoord) -> Option<RegionId> {
        self.regions
            .iter()
            .find(|region| region.contains(tile))
            .map(|region| region.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use std::collections::BTreeSet;

    fn region(tiles: &[(u32, u32)]) -> Region {
        Region {
            id: RegionId::new(1),
            name: "den".to_owned(),
            tiles: tiles
                .iter()
                .map(|(column, row)| TileCoord::new(*column, *row))
                .collect::<BTreeSet<_>>(),
            max_units: 4,
            population: 0,
            center: Vec2::ZERO,
            spawn_points: Vec::new(),
        }
    }

    #[test]
    fn level_requires_player_start() {
        let map = TileMap::from_ascii(&["...", "..."], 10.0).expect("map");
        assert_eq!(
            Level::new("empty", map, Vec::new(), Vec::new()).unwrap_err(),
            LevelError::MissingPlayerStart
        );
    }

    #[test]
    fn region_tiles_must_lie_inside_map() {
        let map = TileMap::from_ascii(&["P..", "..."], 10.0).expect("map");
        let error = Level::new("bad", map, vec![region(&[(0, 0), (5, 1)])], Vec::new()).unwrap_err();
        assert!(matches!(
            error,
            LevelError::RegionOutOfBounds { column: 5, row: 1, .. }
        ));
    }

    #[test]
    fn region_lookup_finds_owner() {
        let map = TileMap::from_ascii(&["P..", "..."], 10.0).expect("map");
        let level = Level::new("ok", map, vec![region(&[(2, 1)])], Vec::new()).expect("level");
        assert_eq!(level.player_start(), TileCoord::new(0, 0));
        assert_eq!(level.region_at(TileCoord::new(2, 1)), Some(RegionId::new(1)));
        assert_eq!(level.region_at(TileCoord::new(1, 1)), None);
    }
}
