use std::collections::HashMap;

use crate::types::{Point, Rect};

#[derive(Debug, Clone, Copy)]
struct RegionState {
    /// `None` while the cursor is outside the region
    pressed: Option<bool>,
    seen: bool,
}

/// Fires once per press of an on-screen button.
///
/// A press counts only if the cursor was already hovering the region with the
/// button up on the previous query, so dragging a held button onto it does
/// nothing.
#[derive(Debug, Default)]
pub struct ButtonTracker {
    regions: HashMap<[u32; 4], RegionState>,
}

impl ButtonTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// `cursor` is in client coordinates.
    pub fn is_pressed(&mut self, region: Rect, cursor: Point, left_down: bool) -> bool {
        let state = self.regions.entry(key(region)).or_insert(RegionState { pressed: None, seen: false });
        state.seen = true;
        let previous = state.pressed;

        if !region.contains(cursor) {
            state.pressed = None;
            return false;
        }
        state.pressed = Some(left_down);
        left_down && previous == Some(false)
    }

    /// Forget regions that were not queried since the last call.
    pub fn end_cycle(&mut self) {
        self.regions.retain(|_, state| state.seen);
        for state in self.regions.values_mut() {
            state.seen = false;
        }
    }

    /// Drop all state, e.g. when the game area was resized.
    pub fn clear(&mut self) {
        self.regions.clear();
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

fn key(r: Rect) -> [u32; 4] {
    [r.x.to_bits(), r.y.to_bits(), r.w.to_bits(), r.h.to_bits()]
}
