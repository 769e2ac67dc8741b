#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Uniform spatial grids rebuilt from scratch every tick.
//!
//! Grids store indices into the slices they were built from, so a grid is only
//! meaningful until the next structural change of those slices.

use outbreak_core::{Item, Particle, Unit, Vec2};

/// Arena of buckets laid out over the map, reused between rebuilds.
#[derive(Clone, Debug, Default)]
pub struct CellGrid<T> {
    cell_size: f32,
    columns: u32,
    rows: u32,
    buckets: Vec<Vec<T>>,
}

impl<T: Copy> CellGrid<T> {
    /// Creates an empty grid with the provided cell size.
    #[must_use]
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            columns: 0,
            rows: 0,
            buckets: Vec::new(),
        }
    }

    /// Size of a single cell in world units.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Number of columns and rows currently covered by the grid.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    /// Empties every bucket and resizes the grid to cover `width` × `height`.
    ///
    /// Bucket storage is only reallocated when the dimensions change.
    pub fn reset(&mut self, width: f32, height: f32) {
        let columns = cells_for(width, self.cell_size);
        let rows = cells_for(height, self.cell_size);
        if columns != self.columns || rows != self.rows {
            self.columns = columns;
            self.rows = rows;
            let count = columns as usize * rows as usize;
            self.buckets.resize_with(count, Vec::new);
        }
        for bucket in &mut self.buckets {
            bucket.clear();
        }
    }

    /// Cell containing the position, clamped into the grid bounds.
    #[must_use]
    pub fn cell_of(&self, position: Vec2) -> (u32, u32) {
        (
            clamp_axis(position.x, self.cell_size, self.columns),
            clamp_axis(position.y, self.cell_size, self.rows),
        )
    }

    /// Stores `value` in the bucket covering `position`.
    pub fn insert(&mut self, position: Vec2, value: T) {
        let (column, row) = self.cell_of(position);
        if let Some(bucket) = self.bucket_mut(column, row) {
            bucket.push(value);
        }
    }

    /// Contents of the bucket at the provided cell.
    #[must_use]
    pub fn bucket(&self, column: u32, row: u32) -> &[T] {
        if column >= self.columns || row >= self.rows {
            return &[];
        }
        let index = row as usize * self.columns as usize + column as usize;
        self.buckets.get(index).map_or(&[], Vec::as_slice)
    }

    /// Iterates the 3×3 block of buckets around the clamped cell of `position`.
    pub fn neighborhood(&self, position: Vec2) -> impl Iterator<Item = T> + '_ {
        let (column, row) = self.cell_of(position);
        let min_column = column.saturating_sub(1);
        let min_row = row.saturating_sub(1);
        let max_column = (column + 1).min(self.columns.saturating_sub(1));
        let max_row = (row + 1).min(self.rows.saturating_sub(1));

        (min_row..=max_row).flat_map(move |row| {
            (min_column..=max_column).flat_map(move |column| self.bucket(column, row).iter().copied())
        })
    }

    fn bucket_mut(&mut self, column: u32, row: u32) -> Option<&mut Vec<T>> {
        let index = row as usize * self.columns as usize + column as usize;
        self.buckets.get_mut(index)
    }
}

fn cells_for(extent: f32, cell_size: f32) -> u32 {
    if !(extent.is_finite() && cell_size > 0.0) {
        return 1;
    }
    ((extent / cell_size).ceil() as u32).max(1)
}

fn clamp_axis(coordinate: f32, cell_size: f32, cells: u32) -> u32 {
    let max = cells.saturating_sub(1);
    let cell = (coordinate / cell_size).floor();
    if cell.is_nan() || cell < 0.0 {
        0
    } else if cell >= max as f32 {
        max
    } else {
        cell as u32
    }
}

/// Physical and combat grids over the current entity slices.
#[derive(Clone, Debug)]
pub struct SpatialIndex {
    units: CellGrid<usize>,
    items: CellGrid<usize>,
    projectiles: CellGrid<usize>,
    combat: CellGrid<usize>,
}

impl SpatialIndex {
    /// Creates empty grids with the provided physical and combat cell sizes.
    #[must_use]
    pub fn new(physical_cell_size: f32, combat_cell_size: f32) -> Self {
        Self {
            units: CellGrid::new(physical_cell_size),
            items: CellGrid::new(physical_cell_size),
            projectiles: CellGrid::new(physical_cell_size),
            combat: CellGrid::new(combat_cell_size),
        }
    }

    /// Rebuilds every grid.
    pub fn rebuild(
        &mut self,
        units: &[Unit],
        items: &[Item],
        particles: &[Particle],
        width: f32,
        height: f32,
    ) {
        self.rebuild_physical(units, items, particles, width, height);
        self.rebuild_combat(units, width, height);
    }

    /// Rebuilds the physical unit, item and projectile grids.
    ///
    /// Ghosts and non-projectile particles are left out.
    pub fn rebuild_physical(
        &mut self,
        units: &[Unit],
        items: &[Item],
        particles: &[Particle],
        width: f32,
        height: f32,
    ) {
        self.units.reset(width, height);
        self.items.reset(width, height);
        self.projectiles.reset(width, height);

        for (index, unit) in units.iter().enumerate() {
            if unit.exists() && !unit.body.ghost {
                self.units.insert(unit.position(), index);
            }
        }
        for (index, item) in items.iter().enumerate() {
            if !item.destroyed && !item.body.ghost {
                self.items.insert(item.body.position, index);
            }
        }
        for (index, particle) in particles.iter().enumerate() {
            if particle.is_projectile && !particle.expired {
                self.projectiles.insert(particle.position, index);
            }
        }
    }

    /// Rebuilds the combat grid used by targeting queries.
    pub fn rebuild_combat(&mut self, units: &[Unit], width: f32, height: f32) {
        self.combat.reset(width, height);
        for (index, unit) in units.iter().enumerate() {
            if unit.exists() {
                self.combat.insert(unit.position(), index);
            }
        }
    }

    /// Physical grid of unit indices.
    #[must_use]
    pub fn units(&self) -> &CellGrid<usize> {
        &self.units
    }

    /// Physical grid of item indices.
    #[must_use]
    pub fn items(&self) -> &CellGrid<usize> {
        &self.items
    }

    /// Physical grid of projectile particle indices.
    #[must_use]
    pub fn projectiles(&self) -> &CellGrid<usize> {
        &self.projectiles
    }

    /// Combat grid of unit indices.
    #[must_use]
    pub fn combat(&self) -> &CellGrid<usize> {
        &self.combat
    }
}
