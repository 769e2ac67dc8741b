#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Region spawn points and spawn organs that refill the level with enemies.

use std::collections::BTreeMap;

use outbreak_core::{
    Command, Faction, LifecycleTuning, Region, RegionId, TileMap, Unit, UnitId, UnitKind,
};
use rand::Rng;
use tracing::debug;

/// Pure system that emits spawn commands for regions under their unit cap.
#[derive(Debug)]
pub struct Spawning {
    organ_interval: u32,
    organ_timers: BTreeMap<UnitId, u32>,
    pending: BTreeMap<RegionId, u32>,
}

impl Spawning {
    /// Creates a spawning system using the spawn-organ cadence of the tuning.
    #[must_use]
    pub fn new(tuning: &LifecycleTuning) -> Self {
        Self {
            organ_interval: tuning.spawn_organ_interval,
            organ_timers: BTreeMap::new(),
            pending: BTreeMap::new(),
        }
    }

    /// Advances every spawn point and spawn organ by a tick.
    ///
    /// Spawn points whose cooldown elapsed draw a kind and a level from their
    /// weighted tables; an empty table skips the attempt. Spawn organs queue a
    /// tank of their own level every interval. Nothing is queued for a region
    /// that is at its cap, counting spawns already queued this tick.
    pub fn handle<R>(
        &mut self,
        rng: &mut R,
        map: &TileMap,
        regions: &mut [Region],
        units: &[Unit],
        out: &mut Vec<Command>,
    ) where
        R: Rng + ?Sized,
    {
        self.pending.clear();

        for region in regions.iter_mut() {
            let id = region.id;
            for point_index in 0..region.spawn_points.len() {
                let point = &mut region.spawn_points[point_index];
                if point.remaining > 1 {
                    point.remaining -= 1;
                    continue;
                }
                point.remaining = point.cooldown.max(1);
                let tile = point.tile;
                let kind = point.kinds.draw(rng);
                let level = point.levels.draw(rng);

                let (Some(kind), Some(level)) = (kind, level) else {
                    continue;
                };
                if !self.reserve(region) {
                    continue;
                }
                debug!(region = id.get(), kind = ?kind, level, "spawn point fired");
                out.push(Command::SpawnUnit {
                    kind,
                    faction: Faction::Enemy,
                    level,
                    position: map.tile_center(tile),
                    immune: false,
                    region: Some(id),
                });
            }
        }

        self.organ_timers.retain(|id, _| {
            units
                .binary_search_by_key(id, |unit| unit.id)
                .is_ok_and(|index| units[index].is_alive())
        });

        if self.organ_interval == 0 {
            return;
        }
        for organ in units
            .iter()
            .filter(|unit| unit.kind == UnitKind::SpawnOrgan && unit.is_alive())
        {
            let timer = self.organ_timers.entry(organ.id).or_insert(0);
            *timer += 1;
            if *timer < self.organ_interval {
                continue;
            }
            *timer = 0;

            let Some(region) = organ
                .region
                .and_then(|id| regions.iter().find(|region| region.id == id))
            else {
                continue;
            };
            if !self.reserve(region) {
                continue;
            }
            debug!(organ = organ.id.get(), region = region.id.get(), "spawn organ fired");
            out.push(Command::SpawnUnit {
                kind: UnitKind::Tank,
                faction: Faction::Enemy,
                level: organ.level,
                position: organ.position(),
                immune: false,
                region: Some(region.id),
            });
        }
    }

    fn reserve(&mut self, region: &Region) -> bool {
        let pending = self.pending.entry(region.id).or_insert(0);
        if region.population.saturating_add(*pending) >= region.max_units {
            return false;
        }
        *pending += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use outbreak_core::{SpawnPoint, TileCoord, Vec2, WeightTable};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::BTreeSet;

    #[test]
    fn capacity_counts_spawns_queued_this_tick() {
        let mut spawning = Spawning::new(&LifecycleTuning::default());
        let mut region = Region {
            id: RegionId::new(1),
            name: "nest".to_owned(),
            tiles: BTreeSet::new(),
            max_units: 2,
            population: 1,
            center: Vec2::ZERO,
            spawn_points: vec![SpawnPoint {
                tile: TileCoord::new(0, 0),
                cooldown: 1,
                remaining: 0,
                kinds: WeightTable::new(vec![(UnitKind::Tank, 1)]),
                levels: WeightTable::new(vec![(1, 1)]),
            }],
        };
        assert!(spawning.reserve(&region));
        assert!(!spawning.reserve(&region));
        region.population = 0;
        spawning.pending.clear();
        assert!(spawning.reserve(&region));
        assert!(spawning.reserve(&region));
        assert!(!spawning.reserve(&region));

        let map = TileMap::open(2, 2, 10.0).expect("map");
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut out = Vec::new();
        let mut regions = vec![region];
        spawning.handle(&mut rng, &map, &mut regions, &[], &mut out);
        assert_eq!(out.len(), 1);
    }
}
