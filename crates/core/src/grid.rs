//! Occupancy of a fixed-size container grid.
//!
//! The matrix is rebuilt from the host's current placements on every check;
//! placements are trusted to lie inside the grid.

use crate::types::GridPlacement;

/// Cell-used flags for a `width` x `height` grid, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occupancy {
    width: u32,
    height: u32,
    cells: Vec<bool>,
}

impl Occupancy {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, cells: vec![false; (width * height) as usize] }
    }

    pub fn from_placements(placements: &[GridPlacement], width: u32, height: u32) -> Self {
        let mut grid = Self::new(width, height);
        for p in placements {
            grid.mark(p);
        }
        grid
    }

    pub fn mark(&mut self, p: &GridPlacement) {
        for col in p.x..p.x + p.width {
            for row in p.y..p.y + p.height {
                let idx = self.index(col, row);
                self.cells[idx] = true;
            }
        }
    }

    pub fn is_used(&self, x: u32, y: u32) -> bool {
        self.cells[self.index(x, y)]
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|used| *used)
    }

    pub fn free_cells(&self) -> usize {
        self.cells.iter().filter(|used| !**used).count()
    }

    /// First free slot for a `w` x `h` item, scanning column-major so items
    /// pack left to right the way the game fills an inventory.
    pub fn first_fit(&self, w: u32, h: u32) -> Option<GridPlacement> {
        if w == 0 || h == 0 || w > self.width || h > self.height {
            return None;
        }
        for x in 0..=self.width - w {
            for y in 0..=self.height - h {
                let candidate = GridPlacement::new(x, y, w, h);
                if self.is_free(&candidate) {
                    return Some(candidate);
                }
            }
        }
        None
    }

    pub fn is_free(&self, p: &GridPlacement) -> bool {
        (p.x..p.x + p.width).all(|col| (p.y..p.y + p.height).all(|row| !self.is_used(col, row)))
    }

    fn index(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height, "placement outside grid");
        (y * self.width + x) as usize
    }
}

/// Whether the grid has no free cell left.
pub fn is_full(placements: &[GridPlacement], width: u32, height: u32) -> bool {
    // Not enough covered area to fill every cell, skip building the matrix.
    let covered: u64 = placements.iter().map(|p| p.area() as u64).sum();
    if covered < width as u64 * height as u64 {
        return false;
    }

    Occupancy::from_placements(placements, width, height).is_full()
}
