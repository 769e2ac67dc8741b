//! Regions bound roaming enemy packs and own the spawn points that refill them.

use std::collections::BTreeSet;

use glam::Vec2;
use rand::{
    distributions::{Distribution, WeightedIndex},
    Rng,
};

use crate::{map::TileCoord, unit::UnitKind, RegionId};

/// Weighted table used for random selection.
///
/// Entries with zero weight never win. A table without positive weights
/// yields nothing, which callers treat as "no spawn occurs".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WeightTable<T> {
    entries: Vec<(T, u32)>,
}

impl<T: Copy> WeightTable<T> {
    /// Creates a table from `(value, weight)` pairs.
    #[must_use]
    pub fn new(entries: Vec<(T, u32)>) -> Self {
        Self { entries }
    }

    /// Entries stored in the table.
    #[must_use]
    pub fn entries(&self) -> &[(T, u32)] {
        &self.entries
    }

    /// Draws a value proportionally to its weight.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<T> {
        let distribution = WeightedIndex::new(self.entries.iter().map(|(_, weight)| *weight)).ok()?;
        self.entries
            .get(distribution.sample(rng))
            .map(|(value, _)| *value)
    }
}

/// Location that periodically refills its region.
#[derive(Clone, Debug, PartialEq)]
pub struct SpawnPoint {
    /// Tile the spawned units appear on.
    pub tile: TileCoord,
    /// Ticks between spawn attempts.
    pub cooldown: u32,
    /// Ticks until the next spawn attempt.
    pub remaining: u32,
    /// Weighted unit kinds.
    pub kinds: WeightTable<UnitKind>,
    /// Weighted unit levels.
    pub levels: WeightTable<u32>,
}

/// Named subset of the map with its own population cap.
#[derive(Clone, Debug, PartialEq)]
pub struct Region {
    /// Identifier used by units bound to the region.
    pub id: RegionId,
    /// Human readable name.
    pub name: String,
    /// Tiles that belong to the region.
    pub tiles: BTreeSet<TileCoord>,
    /// Maximum number of bound enemy units.
    pub max_units: u32,
    /// Number of live enemy units bound to the region.
    pub population: u32,
    /// Rally point for units that strayed outside the region.
    pub center: Vec2,
    /// Spawn points refilling the region.
    pub spawn_points: Vec<SpawnPoint>,
}

impl Region {
    /// Reports whether the tile belongs to the region.
    #[must_use]
    pub fn contains(&self, tile: TileCoord) -> bool {
        self.tiles.contains(&tile)
    }

    /// Reports whether another unit may be bound to the region.
    #[must_use]
    pub fn has_capacity(&self) -> bool {
        self.population < self.max_units
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn empty_table_draws_nothing() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let table: WeightTable<u32> = WeightTable::new(Vec::new());
        assert_eq!(table.draw(&mut rng), None);

        let zero = WeightTable::new(vec![(UnitKind::Tank, 0)]);
        assert_eq!(zero.draw(&mut rng), None);
    }

    #[test]
    fn zero_weight_entries_never_win() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let table = WeightTable::new(vec![(1_u32, 0), (2, 5), (3, 0)]);
        for _ in 0..64 {
            assert_eq!(table.draw(&mut rng), Some(2));
        }
    }

    #[test]
    fn draws_follow_weights() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let table = WeightTable::new(vec![(UnitKind::Tank, 1), (UnitKind::Flying, 9)]);
        let flying = (0..1_000)
            .filter(|_| table.draw(&mut rng) == Some(UnitKind::Flying))
            .count();
        assert!(flying > 800, "flying drawn {flying} times");
    }
}
