//! Tile map shared by the visibility oracle, the pathfinder and the world.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Floor tile that carries no special meaning.
pub const TILE_FLOOR: i32 = 0;
/// Impassable wall tile.
pub const TILE_WALL: i32 = 1;
/// Tile where the player starts the level.
pub const TILE_PLAYER_START: i32 = 2;
/// Tile where the level boss is placed.
pub const TILE_BOSS: i32 = 3;
/// Tile where a passive organ is placed.
pub const TILE_ORGAN: i32 = 4;
/// Tile where a spawning organ is placed.
pub const TILE_SPAWN_ORGAN: i32 = 5;

/// Reasons a level or map definition may be rejected.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum LevelError {
    /// The map has zero columns or zero rows.
    #[error("map must contain at least one tile")]
    EmptyMap,
    /// The tile vector does not match the declared dimensions.
    #[error("expected {expected} tiles for the declared dimensions, found {found}")]
    TileCountMismatch {
        /// Number of tiles implied by the dimensions.
        expected: usize,
        /// Number of tiles supplied.
        found: usize,
    },
    /// ASCII rows have differing widths.
    #[error("map row {row} has width {width}, expected {expected}")]
    RaggedRow {
        /// Offending row index.
        row: usize,
        /// Width of the offending row.
        width: usize,
        /// Width of the first row.
        expected: usize,
    },
    /// An ASCII map contains a character without a tile meaning.
    #[error("unknown map character `{0}`")]
    UnknownTile(char),
    /// The tile length is not a positive finite number.
    #[error("tile length must be positive, found {0}")]
    InvalidTileLength(f32),
    /// A region references a tile outside the map.
    #[error("region {region} references tile ({column}, {row}) outside the map")]
    RegionOutOfBounds {
        /// Region name.
        region: String,
        /// Column of the offending tile.
        column: u32,
        /// Row of the offending tile.
        row: u32,
    },
    /// The map does not mark a player start tile.
    #[error("map does not contain a player start tile")]
    MissingPlayerStart,
}

/// Location of a single map tile expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    column: u32,
    row: u32,
}

impl TileCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the tile.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the tile.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two tile coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: TileCoord) -> u32 {
        self.column.abs_diff(other.column) + self.row.abs_diff(other.row)
    }
}

/// Dense grid of integer tile codes plus the tile edge length.
#[derive(Clone, Debug, PartialEq)]
pub struct TileMap {
    columns: u32,
    rows: u32,
    tile_length: f32,
    tiles: Vec<i32>,
}

impl TileMap {
    /// Creates a map from row-major tile codes.
    pub fn new(
        columns: u32,
        rows: u32,
        tile_length: f32,
        tiles: Vec<i32>,
    ) -> Result<Self, LevelError> {
        if columns == 0 || rows == 0 {
            return Err(LevelError::EmptyMap);
        }
        if !(tile_length.is_finite() && tile_length > 0.0) {
            return Err(LevelError::InvalidTileLength(tile_length));
        }
        let expected = columns as usize * rows as usize;
        if tiles.len() != expected {
            return Err(LevelError::TileCountMismatch {
                expected,
                found: tiles.len(),
            });
        }

        Ok(Self {
            columns,
            rows,
            tile_length,
            tiles,
        })
    }

    /// Parses a map from ASCII rows.
    ///
    /// `#` is a wall, `.` a floor, `P` the player start, `B` the boss, `O` an
    /// organ and `S` a spawning organ. Digits are taken as raw tile codes.
    pub fn from_ascii<S: AsRef<str>>(rows: &[S], tile_length: f32) -> Result<Self, LevelError> {
        let expected = rows.first().map_or(0, |row| row.as_ref().chars().count());
        let mut tiles = Vec::with_capacity(expected * rows.len());

        for (index, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            let width = row.chars().count();
            if width != expected {
                return Err(LevelError::RaggedRow {
                    row: index,
                    width,
                    expected,
                });
            }
            for symbol in row.chars() {
                tiles.push(tile_code_for(symbol)?);
            }
        }

        let columns = u32::try_from(expected).map_err(|_| LevelError::EmptyMap)?;
        let row_count = u32::try_from(rows.len()).map_err(|_| LevelError::EmptyMap)?;
        Self::new(columns, row_count, tile_length, tiles)
    }

    /// Creates an open map without walls.
    pub fn open(columns: u32, rows: u32, tile_length: f32) -> Result<Self, LevelError> {
        let count = columns as usize * rows as usize;
        Self::new(columns, rows, tile_length, vec![TILE_FLOOR; count])
    }

    /// Number of columns contained in the map.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows contained in the map.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Side length of a single square tile expressed in world units.
    #[must_use]
    pub const fn tile_length(&self) -> f32 {
        self.tile_length
    }

    /// Total width of the map measured in world units.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.columns as f32 * self.tile_length
    }

    /// Total height of the map measured in world units.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.rows as f32 * self.tile_length
    }

    /// Number of tiles in the map.
    #[must_use]
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Row-major index of the tile, if it lies within the map.
    #[must_use]
    pub fn index(&self, tile: TileCoord) -> Option<usize> {
        if tile.column < self.columns && tile.row < self.rows {
            Some(tile.row as usize * self.columns as usize + tile.column as usize)
        } else {
            None
        }
    }

    /// Tile code stored at the provided coordinate.
    #[must_use]
    pub fn tile_at(&self, tile: TileCoord) -> Option<i32> {
        self.index(tile).and_then(|index| self.tiles.get(index).copied())
    }

    /// Overwrites the tile code at the provided coordinate.
    ///
    /// Coordinates outside the map are ignored.
    pub fn set_tile(&mut self, tile: TileCoord, code: i32) {
        if let Some(index) = self.index(tile) {
            self.tiles[index] = code;
        }
    }

    /// Reports whether the tile is a wall. Tiles outside the map count as walls.
    #[must_use]
    pub fn is_wall(&self, tile: TileCoord) -> bool {
        self.tile_at(tile).map_or(true, |code| code == TILE_WALL)
    }

    /// Tile containing the world position, if the position lies inside the map.
    #[must_use]
    pub fn tile_of(&self, position: Vec2) -> Option<TileCoord> {
        if !(position.x >= 0.0 && position.y >= 0.0) {
            return None;
        }
        let column = (position.x / self.tile_length).floor();
        let row = (position.y / self.tile_length).floor();
        if column >= self.columns as f32 || row >= self.rows as f32 {
            return None;
        }
        Some(TileCoord::new(column as u32, row as u32))
    }

    /// Tile containing the world position, clamped into the map bounds.
    #[must_use]
    pub fn clamped_tile_of(&self, position: Vec2) -> TileCoord {
        let max_column = self.columns.saturating_sub(1) as f32;
        let max_row = self.rows.saturating_sub(1) as f32;
        let column = (position.x / self.tile_length).floor();
        let row = (position.y / self.tile_length).floor();
        let column = if column.is_nan() { 0.0 } else { column };
        let row = if row.is_nan() { 0.0 } else { row };
        TileCoord::new(
            column.clamp(0.0, max_column) as u32,
            row.clamp(0.0, max_row) as u32,
        )
    }

    /// Reports whether the world position lies in a wall or outside the map.
    #[must_use]
    pub fn is_wall_at(&self, position: Vec2) -> bool {
        self.tile_of(position).map_or(true, |tile| self.is_wall(tile))
    }

    /// World position of the tile's center.
    #[must_use]
    pub fn tile_center(&self, tile: TileCoord) -> Vec2 {
        Vec2::new(
            (tile.column as f32 + 0.5) * self.tile_length,
            (tile.row as f32 + 0.5) * self.tile_length,
        )
    }

    /// Iterates over every tile carrying the provided code in row-major order.
    pub fn tiles_with_code(&self, code: i32) -> impl Iterator<Item = TileCoord> + '_ {
        let columns = self.columns;
        self.tiles
            .iter()
            .enumerate()
            .filter(move |(_, value)| **value == code)
            .map(move |(index, _)| {
                let index = index as u32;
                TileCoord::new(index % columns, index / columns)
            })
    }
}

fn tile_code_for(symbol: char) -> Result<i32, LevelError> {
    match symbol {
        '.' => Ok(TILE_FLOOR),
        '#' => Ok(TILE_WALL),
        'P' => Ok(TILE_PLAYER_START),
        'B' => Ok(TILE_BOSS),
        'O' => Ok(TILE_ORGAN),
        'S' => Ok(TILE_SPAWN_ORGAN),
        digit if digit.is_ascii_digit() => Ok(digit as i32 - '0' as i32),
        other => Err(LevelError::UnknownTile(other)),
    }
}
