// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Uniform-grid spatial index over recorded draw commands.
//!
//! Each entry pairs a conservative bounding rectangle (already inflated and
//! mapped to picture-root coordinates) with the index of the command that
//! produced it. Entries are bucketed into fixed-size grid cells; an entry
//! spanning too many cells is kept in an overflow list that every query scans.

use hashbrown::HashMap;
use kurbo::Rect;
use smallvec::SmallVec;

use crate::geometry::is_empty_rect;

/// Side length of a grid cell in picture units.
pub const DEFAULT_CELL_SIZE: f64 = 256.0;

/// Entries covering more cells than this go to the overflow list.
const MAX_CELLS_PER_ENTRY: i64 = 64;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Entry {
    bounds: Rect,
    command: u32,
}

/// Spatial index mapping bounding rectangles to command indices.
#[derive(Clone, Debug)]
pub struct BBoxIndex {
    cell_size: f64,
    entries: Vec<Entry>,
    cells: HashMap<(i32, i32), SmallVec<[u32; 4]>>,
    overflow: Vec<u32>,
}

impl Default for BBoxIndex {
    fn default() -> Self {
        Self::with_cell_size(DEFAULT_CELL_SIZE)
    }
}

impl BBoxIndex {
    /// Create an empty index with the default cell size.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty index with a custom cell size.
    pub fn with_cell_size(cell_size: f64) -> Self {
        Self {
            cell_size: if cell_size > 0.0 {
                cell_size
            } else {
                DEFAULT_CELL_SIZE
            },
            entries: Vec::new(),
            cells: HashMap::new(),
            overflow: Vec::new(),
        }
    }

    /// Insert an entry for `command`. Empty rectangles are ignored.
    pub fn insert(&mut self, bounds: Rect, command: u32) {
        if is_empty_rect(bounds) {
            return;
        }
        let id = u32::try_from(self.entries.len()).unwrap_or(u32::MAX);
        self.entries.push(Entry { bounds, command });

        let (x0, y0, x1, y1) = self.cell_range(bounds);
        let span = (i64::from(x1) - i64::from(x0) + 1) * (i64::from(y1) - i64::from(y0) + 1);
        if span > MAX_CELLS_PER_ENTRY {
            self.overflow.push(id);
            return;
        }
        for cy in y0..=y1 {
            for cx in x0..=x1 {
                self.cells.entry((cx, cy)).or_default().push(id);
            }
        }
    }

    /// Command indices whose entries intersect `rect`, ascending and unique.
    pub fn query(&self, rect: Rect) -> Vec<u32> {
        let mut out = Vec::new();
        if is_empty_rect(rect) || self.entries.is_empty() {
            return out;
        }
        let (x0, y0, x1, y1) = self.cell_range(rect);
        let span = (i64::from(x1) - i64::from(x0) + 1) * (i64::from(y1) - i64::from(y0) + 1);
        if span > i64::try_from(self.cells.len()).unwrap_or(i64::MAX) {
            // Cheaper to walk the occupied cells than the query's footprint.
            for ids in self.cells.values() {
                self.collect(ids, rect, &mut out);
            }
        } else {
            for cy in y0..=y1 {
                for cx in x0..=x1 {
                    if let Some(ids) = self.cells.get(&(cx, cy)) {
                        self.collect(ids, rect, &mut out);
                    }
                }
            }
        }
        self.collect(&self.overflow, rect, &mut out);
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing was inserted.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bounds recorded for `command`, unioned across its entries.
    pub fn bounds_of(&self, command: u32) -> Option<Rect> {
        self.entries
            .iter()
            .filter(|e| e.command == command)
            .map(|e| e.bounds)
            .reduce(|a, b| a.union(b))
    }

    /// Remove all entries, keeping allocations.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cells.clear();
        self.overflow.clear();
    }

    fn collect(&self, ids: &[u32], rect: Rect, out: &mut Vec<u32>) {
        for &id in ids {
            if let Some(e) = self.entries.get(id as usize)
                && overlaps(e.bounds, rect)
            {
                out.push(e.command);
            }
        }
    }

    fn cell_range(&self, rect: Rect) -> (i32, i32, i32, i32) {
        (
            self.cell_coord(rect.x0),
            self.cell_coord(rect.y0),
            self.cell_coord(rect.x1),
            self.cell_coord(rect.y1),
        )
    }

    #[allow(
        clippy::cast_possible_truncation,
        reason = "the cell coordinate is clamped to the i32 range before casting"
    )]
    fn cell_coord(&self, v: f64) -> i32 {
        (v / self.cell_size)
            .floor()
            .clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32
    }
}

#[inline]
fn overlaps(a: Rect, b: Rect) -> bool {
    a.x0 < b.x1 && b.x0 < a.x1 && a.y0 < b.y1 && b.y0 < a.y1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_returns_sorted_unique_commands() {
        let mut index = BBoxIndex::with_cell_size(10.0);
        index.insert(Rect::new(0.0, 0.0, 25.0, 25.0), 3);
        index.insert(Rect::new(5.0, 5.0, 8.0, 8.0), 1);
        index.insert(Rect::new(100.0, 100.0, 110.0, 110.0), 2);

        assert_eq!(index.query(Rect::new(0.0, 0.0, 30.0, 30.0)), vec![1, 3]);
        assert_eq!(index.query(Rect::new(101.0, 101.0, 102.0, 102.0)), vec![2]);
        assert!(index.query(Rect::new(50.0, 50.0, 60.0, 60.0)).is_empty());
    }

    #[test]
    fn huge_entries_are_always_found() {
        let mut index = BBoxIndex::with_cell_size(1.0);
        index.insert(Rect::new(-1.0e6, -1.0e6, 1.0e6, 1.0e6), 0);
        index.insert(Rect::new(0.0, 0.0, 1.0, 1.0), 1);
        assert_eq!(index.query(Rect::new(0.25, 0.25, 0.5, 0.5)), vec![0, 1]);
        assert_eq!(index.query(Rect::new(5000.0, 5000.0, 5001.0, 5001.0)), vec![0]);
    }

    #[test]
    fn empty_rects_are_not_indexed() {
        let mut index = BBoxIndex::new();
        index.insert(Rect::ZERO, 0);
        assert!(index.is_empty());
        index.insert(Rect::new(0.0, 0.0, 4.0, 4.0), 7);
        assert_eq!(index.bounds_of(7), Some(Rect::new(0.0, 0.0, 4.0, 4.0)));
        index.clear();
        assert!(index.query(Rect::new(0.0, 0.0, 4.0, 4.0)).is_empty());
    }
}
