//! Flat multi-resolution map layers.
//!
//! Every derived map is a `MapLayer<T>`: a flat buffer plus its own
//! `(width, height)` and the side length of the tile block one entry
//! covers. Accessors exist both in layer coordinates (`get`/`set`) and
//! in tile coordinates (`world_get`/`world_set`); both are
//! bounds-checked and return the default value outside the map.

use serde::{Deserialize, Serialize};

/// Block sizes of the resolution tiers.
pub const FULL: u32 = 1;
pub const HALF: u32 = 2;
pub const QUARTER: u32 = 4;
pub const EIGHTH: u32 = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapLayer<T> {
    width: usize,
    height: usize,
    block: u32,
    data: Vec<T>,
}

impl<T: Copy + Default> MapLayer<T> {
    /// Layer covering a `world_width × world_height` tile grid with
    /// `block × block` tiles per entry.
    pub fn new(world_width: usize, world_height: usize, block: u32) -> Self {
        let b = block as usize;
        let width = world_width.div_ceil(b);
        let height = world_height.div_ceil(b);
        Self {
            width,
            height,
            block,
            data: vec![T::default(); width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn block(&self) -> u32 {
        self.block
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some(y as usize * self.width + x as usize)
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        self.index(x, y).is_some()
    }

    /// Value at layer coordinates, default outside the layer.
    pub fn get(&self, x: i32, y: i32) -> T {
        self.index(x, y).map(|i| self.data[i]).unwrap_or_default()
    }

    /// Store at layer coordinates; writes outside the layer are dropped.
    pub fn set(&mut self, x: i32, y: i32, value: T) {
        if let Some(i) = self.index(x, y) {
            self.data[i] = value;
        }
    }

    /// Value of the block containing tile `(x, y)`.
    pub fn world_get(&self, x: i32, y: i32) -> T {
        if x < 0 || y < 0 {
            return T::default();
        }
        let b = self.block as i32;
        self.get(x / b, y / b)
    }

    pub fn world_set(&mut self, x: i32, y: i32, value: T) {
        if x < 0 || y < 0 {
            return;
        }
        let b = self.block as i32;
        self.set(x / b, y / b, value);
    }

    pub fn fill(&mut self, value: T) {
        self.data.iter_mut().for_each(|v| *v = value);
    }

    pub fn clear(&mut self) {
        self.fill(T::default());
    }

    pub fn values(&self) -> &[T] {
        &self.data
    }

    pub fn values_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Layer-coordinate iterator over every entry, row-major.
    pub fn coords(&self) -> impl Iterator<Item = (i32, i32)> {
        let (w, h) = (self.width as i32, self.height as i32);
        (0..h).flat_map(move |y| (0..w).map(move |x| (x, y)))
    }

    /// An empty layer of the same shape.
    pub fn blank(&self) -> Self {
        Self {
            width: self.width,
            height: self.height,
            block: self.block,
            data: vec![T::default(); self.data.len()],
        }
    }
}

impl MapLayer<i32> {
    /// Add `delta` to the entry covering tile `(x, y)`.
    pub fn world_add(&mut self, x: i32, y: i32, delta: i32) {
        let current = self.world_get(x, y);
        self.world_set(x, y, current + delta);
    }

    /// Sum of the four in-bounds neighbours of an entry.
    pub fn neighbour_sum(&self, x: i32, y: i32) -> i32 {
        let mut edge = 0;
        if x > 0 {
            edge += self.get(x - 1, y);
        }
        if x + 1 < self.width as i32 {
            edge += self.get(x + 1, y);
        }
        if y > 0 {
            edge += self.get(x, y - 1);
        }
        if y + 1 < self.height as i32 {
            edge += self.get(x, y + 1);
        }
        edge
    }

    /// Box smoothing used for pollution and population density:
    /// centre plus neighbours over four, capped at 255.
    pub fn smoothed(&self) -> Self {
        let mut out = self.blank();
        for (x, y) in self.coords() {
            let z = (self.get(x, y) + self.neighbour_sum(x, y)) / 4;
            out.set(x, y, z.min(255));
        }
        out
    }

    /// Smoothing used for terrain: neighbours over four plus half the centre.
    pub fn smoothed_terrain(&self) -> Self {
        let mut out = self.blank();
        for (x, y) in self.coords() {
            let z = self.neighbour_sum(x, y) / 4 + self.get(x, y) / 2;
            out.set(x, y, z);
        }
        out
    }

    /// Smoothing used for fire and police coverage.
    pub fn smoothed_coverage(&self) -> Self {
        let mut out = self.blank();
        for (x, y) in self.coords() {
            let edge = self.neighbour_sum(x, y) / 4 + self.get(x, y);
            out.set(x, y, edge / 2);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_dimensions_round_up() {
        let half: MapLayer<i32> = MapLayer::new(121, 99, HALF);
        assert_eq!((half.width(), half.height()), (61, 50));
        let eighth: MapLayer<i32> = MapLayer::new(120, 100, EIGHTH);
        assert_eq!((eighth.width(), eighth.height()), (15, 13));
        let quarter: MapLayer<i32> = MapLayer::new(120, 100, QUARTER);
        assert_eq!((quarter.width(), quarter.height()), (30, 25));
    }

    #[test]
    fn world_access_maps_tiles_onto_blocks() {
        let mut layer: MapLayer<i32> = MapLayer::new(16, 16, EIGHTH);
        layer.world_add(9, 3, 5);
        layer.world_add(15, 7, 2);
        assert_eq!(layer.get(1, 0), 7);
        assert_eq!(layer.world_get(8, 0), 7);
        assert_eq!(layer.world_get(-1, 0), 0);
        assert_eq!(layer.world_get(100, 0), 0);
    }

    #[test]
    fn smoothing_spreads_a_single_peak() {
        let mut layer: MapLayer<i32> = MapLayer::new(6, 6, HALF);
        layer.set(1, 1, 200);
        let smooth = layer.smoothed();
        assert_eq!(smooth.get(1, 1), 50);
        assert_eq!(smooth.get(0, 1), 50);
        assert_eq!(smooth.get(2, 2), 0);
    }
}
