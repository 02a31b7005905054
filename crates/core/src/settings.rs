use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::logger;
use crate::types::Point;

/// User configuration, persisted as JSON. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub enable: bool,
    /// Show the inventory -> stash trigger at all
    pub dump_button_enable: bool,
    pub show_stack_sizes: bool,
    pub show_stack_count_with_size: bool,
    pub use_move_to_inventory_as_move_to_stash_when_no_highlights: bool,
    pub invert_selection: bool,
    pub use_custom_filters: bool,
    pub reset_custom_filter_on_panel_close: bool,

    pub idle_mouse_delay_ms: u64,
    pub key_delay_ms: u64,
    pub pointer_move_delay_ms: u64,
    pub pointer_hold_delay_ms: u64,
    /// Added on top of the hold delay, for clients that need a longer press
    pub extra_delay_ms: u64,
    pub pointer_release_delay_ms: u64,
    /// Block the driver thread for settle delays instead of yielding per tick
    pub prefer_blocking_waits: bool,

    pub cancel_with_right_mouse_button: bool,
    pub verify_target_inventory_is_opened: bool,

    pub grid_width: u32,
    pub grid_height: u32,
    /// Row-major `[y][x]` flags; ignored inventory cells are never moved to the stash
    pub ignored_cells: Vec<Vec<bool>>,

    pub custom_move_to_stash_button: Option<Point>,
    pub custom_move_to_inventory_button: Option<Point>,

    pub saved_filters: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        let (grid_width, grid_height) = (12, 5);
        Self {
            enable: true,
            dump_button_enable: true,
            show_stack_sizes: true,
            show_stack_count_with_size: true,
            use_move_to_inventory_as_move_to_stash_when_no_highlights: false,
            invert_selection: false,
            use_custom_filters: true,
            reset_custom_filter_on_panel_close: true,
            idle_mouse_delay_ms: 200,
            key_delay_ms: 10,
            pointer_move_delay_ms: 20,
            pointer_hold_delay_ms: 5,
            extra_delay_ms: 20,
            pointer_release_delay_ms: 5,
            prefer_blocking_waits: false,
            cancel_with_right_mouse_button: true,
            verify_target_inventory_is_opened: true,
            grid_width,
            grid_height,
            ignored_cells: vec![vec![false; grid_width as usize]; grid_height as usize],
            custom_move_to_stash_button: None,
            custom_move_to_inventory_button: None,
            saved_filters: Vec::new(),
        }
    }
}

impl Settings {
    /// Load from `path`, falling back to defaults when the file is missing or malformed.
    pub fn load(path: &Path) -> Self {
        let Ok(text) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str(&text) {
            Ok(settings) => settings,
            Err(e) => {
                logger::warn(&format!("ignoring malformed {}: {}", path.display(), e));
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Cells outside the grid count as ignored.
    pub fn is_cell_ignored(&self, x: u32, y: u32) -> bool {
        if x >= self.grid_width || y >= self.grid_height {
            return true;
        }
        self.ignored_cells
            .get(y as usize)
            .and_then(|row| row.get(x as usize))
            .copied()
            .unwrap_or(false)
    }

    pub fn set_cell_ignored(&mut self, x: u32, y: u32, ignored: bool) {
        if x >= self.grid_width || y >= self.grid_height {
            return;
        }
        let (w, h) = (self.grid_width as usize, self.grid_height as usize);
        self.ignored_cells.resize_with(h, || vec![false; w]);
        for row in &mut self.ignored_cells {
            row.resize(w, false);
        }
        self.ignored_cells[y as usize][x as usize] = ignored;
    }

    pub fn idle_mouse_delay(&self) -> Duration {
        Duration::from_millis(self.idle_mouse_delay_ms)
    }

    pub fn key_delay(&self) -> Duration {
        Duration::from_millis(self.key_delay_ms)
    }

    pub fn pointer_move_delay(&self) -> Duration {
        Duration::from_millis(self.pointer_move_delay_ms)
    }

    pub fn pointer_hold_delay(&self) -> Duration {
        Duration::from_millis(self.pointer_hold_delay_ms + self.extra_delay_ms)
    }

    pub fn pointer_release_delay(&self) -> Duration {
        Duration::from_millis(self.pointer_release_delay_ms)
    }
}
