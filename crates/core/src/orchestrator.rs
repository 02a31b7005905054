//! Per-tick selection and trigger handling above the scheduler.
//!
//! While a run is active every tick just resumes it. Otherwise each open panel
//! gets its candidate list (highlighted items, or a custom filter), a trigger
//! button, and a count label; a button press or held hotkey starts a run over
//! that panel's candidates.

use std::rc::Rc;

use crate::button::ButtonTracker;
use crate::error::Result;
use crate::filter::{CompiledFilter, FilterCache};
use crate::logger;
use crate::platform::Host;
use crate::scheduler::{Scheduler, TickContext};
use crate::sequencer::{self, TransferConfig, TransferSequencer};
use crate::settings::Settings;
use crate::types::*;

/// Side length of the on-screen trigger buttons, in client pixels.
pub const BUTTON_SIZE: f32 = 37.0;

/// Hotkeys held this tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TriggerInput {
    pub move_to_inventory: bool,
    pub move_to_stash: bool,
}

/// What one open panel shows this tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PanelReport {
    /// Trigger button, `None` when it is hidden
    pub button: Option<Rect>,
    pub candidates: Vec<ItemId>,
    pub count_label: String,
    pub custom_filter: bool,
    /// Compile error of the custom filter; the default selection is used meanwhile
    pub filter_error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// A run was in flight at the start of the tick
    pub busy: bool,
    pub feedback: Vec<Rect>,
    pub stash: Option<PanelReport>,
    pub inventory: Option<PanelReport>,
    pub started: Option<Direction>,
    /// Result of a run that completed during this tick
    pub finished: Option<bool>,
}

pub struct Orchestrator {
    scheduler: Scheduler,
    filters: FilterCache,
    buttons: ButtonTracker,
    settings: Settings,
    stash_filter: String,
    inventory_filter: String,
    last_offset: Option<Point>,
}

impl Orchestrator {
    pub fn new(settings: Settings) -> Result<Self> {
        Ok(Self::with_filters(settings, FilterCache::new()?))
    }

    pub fn with_filters(settings: Settings, filters: FilterCache) -> Self {
        Self {
            scheduler: Scheduler::new(),
            filters,
            buttons: ButtonTracker::new(),
            settings,
            stash_filter: String::new(),
            inventory_filter: String::new(),
            last_offset: None,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn is_active(&self) -> bool {
        self.scheduler.is_active()
    }

    pub fn feedback(&self) -> &[Rect] {
        self.scheduler.feedback()
    }

    /// Custom filter text for the panel showing `container`.
    pub fn filter(&self, container: Container) -> &str {
        match container {
            Container::VisibleStash => &self.stash_filter,
            Container::PlayerInventory => &self.inventory_filter,
        }
    }

    pub fn set_filter(&mut self, container: Container, text: impl Into<String>) {
        let text = text.into();
        match container {
            Container::VisibleStash => self.stash_filter = text,
            Container::PlayerInventory => self.inventory_filter = text,
        }
    }

    /// Remember `text` in the saved filter list. Returns false if it is blank or already saved.
    pub fn save_filter(&mut self, text: &str) -> bool {
        if text.trim().is_empty() || self.settings.saved_filters.iter().any(|saved| saved == text) {
            return false;
        }
        self.settings.saved_filters.push(text.to_string());
        true
    }

    pub fn delete_saved_filter(&mut self, index: usize) -> Option<String> {
        (index < self.settings.saved_filters.len()).then(|| self.settings.saved_filters.remove(index))
    }

    pub fn filter_cache(&self) -> &FilterCache {
        &self.filters
    }

    /// One driver frame.
    pub fn tick(&mut self, cx: &mut TickContext<'_>, input: TriggerInput) -> TickReport {
        let mut report = TickReport::default();

        if self.scheduler.is_active() {
            report.busy = true;
            report.finished = self.scheduler.resume(cx);
            report.feedback = self.scheduler.feedback().to_vec();
            if let Some(result) = report.finished {
                logger::info_p("orchestrator", &format!("run finished: {}", if result { "ok" } else { "cancelled" }));
            }
            return report;
        }
        if !self.settings.enable {
            return report;
        }

        let host: &dyn Host = &*cx.host;
        let offset = host.window_offset();
        if self.last_offset != Some(offset) {
            self.buttons.clear();
            self.last_offset = Some(offset);
        }
        let screen = host.cursor_position();
        let cursor = Point::new(screen.x - offset.x, screen.y - offset.y);
        let left_down = host.pointer_buttons().left;

        let mut request: Option<(Direction, Vec<ItemHandle>)> = None;

        let stash_rect = host.panel_rect(Panel::Stash).or_else(|| host.panel_rect(Panel::GuildStash));
        let mut highlights_found = false;
        match stash_rect {
            Some(stash_rect) => {
                let (panel, selected, pressed) = self.stash_side(host, stash_rect, cursor, left_down);
                highlights_found = !selected.is_empty();
                if (pressed || input.move_to_inventory) && !selected.is_empty() {
                    request = Some((Direction::StashToInventory, selected));
                }
                report.stash = Some(panel);
            }
            None => {
                if self.settings.reset_custom_filter_on_panel_close {
                    self.stash_filter.clear();
                }
            }
        }

        match host.panel_rect(Panel::Inventory) {
            Some(inventory_rect) => {
                let (panel, selected, pressed) = self.inventory_side(host, inventory_rect, cursor, left_down);
                let fallback = self.settings.use_move_to_inventory_as_move_to_stash_when_no_highlights
                    && !highlights_found
                    && input.move_to_inventory;
                let triggered = panel.button.is_some() && (pressed || input.move_to_stash || fallback);
                // Overrides a stash request from the same tick
                if triggered && !selected.is_empty() {
                    request = Some((Direction::InventoryToStash, selected));
                }
                report.inventory = Some(panel);
            }
            None => {
                if self.settings.reset_custom_filter_on_panel_close {
                    self.inventory_filter.clear();
                }
            }
        }

        self.buttons.end_cycle();

        if let Some((direction, items)) = request {
            let config = TransferConfig::from(&self.settings);
            let items = OrderedItemList::new(items);
            logger::info_p("orchestrator", &format!("starting {:?} with {} item(s)", direction, items.len()));
            if self.scheduler.start(move || TransferSequencer::new(direction, items, config)) {
                report.started = Some(direction);
            }
        }
        report
    }

    fn stash_side(
        &mut self,
        host: &dyn Host,
        stash_rect: Rect,
        cursor: Point,
        left_down: bool,
    ) -> (PanelReport, Vec<ItemHandle>, bool) {
        let origin = self.settings.custom_move_to_inventory_button.unwrap_or_else(|| {
            let corner = stash_rect.bottom_right();
            Point::new(corner.x - 43.0, corner.y + 10.0)
        });
        let button = Rect::new(origin.x, origin.y, BUTTON_SIZE, BUTTON_SIZE);
        let pressed = self.buttons.is_pressed(button, cursor, left_down);

        let text = self.stash_filter.clone();
        let (custom, filter_error) = self.custom_filter(&text);
        let invert = self.settings.invert_selection;
        let selected: Vec<ItemHandle> = host
            .items(Container::VisibleStash)
            .into_iter()
            .filter(|item| match custom.as_ref().and_then(|c| c.predicate()) {
                Some(predicate) => self.filters.evaluate(predicate, &item.record),
                None => item.record.highlighted != invert,
            })
            .collect();

        let panel = self.panel_report(Some(button), &selected, custom.is_some(), filter_error);
        (panel, selected, pressed)
    }

    fn inventory_side(
        &mut self,
        host: &dyn Host,
        inventory_rect: Rect,
        cursor: Point,
        left_down: bool,
    ) -> (PanelReport, Vec<ItemHandle>, bool) {
        let show_button = self.settings.dump_button_enable
            && sequencer::stash_target_open(host, self.settings.verify_target_inventory_is_opened);
        let button = show_button.then(|| {
            let origin = self.settings.custom_move_to_stash_button.unwrap_or_else(|| {
                let corner = inventory_rect.top_left();
                Point::new(corner.x + BUTTON_SIZE / 2.0, corner.y - BUTTON_SIZE)
            });
            Rect::new(origin.x, origin.y, BUTTON_SIZE, BUTTON_SIZE)
        });
        let pressed = match button {
            Some(button) => self.buttons.is_pressed(button, cursor, left_down),
            None => false,
        };

        let text = self.inventory_filter.clone();
        let (custom, filter_error) = self.custom_filter(&text);
        let selected: Vec<ItemHandle> = host
            .items(Container::PlayerInventory)
            .into_iter()
            .filter(|item| !item.cell.is_some_and(|cell| self.settings.is_cell_ignored(cell.x, cell.y)))
            .filter(|item| match custom.as_ref().and_then(|c| c.predicate()) {
                Some(predicate) => self.filters.evaluate(predicate, &item.record),
                None => true,
            })
            .collect();

        let panel = self.panel_report(button, &selected, custom.is_some(), filter_error);
        (panel, selected, pressed)
    }

    /// Compiled custom filter for `text`, if custom filters are on and it compiled.
    fn custom_filter(&mut self, text: &str) -> (Option<Rc<CompiledFilter>>, Option<String>) {
        if !self.settings.use_custom_filters || text.trim().is_empty() {
            return (None, None);
        }
        let compiled = self.filters.get_or_compile(text);
        match compiled.error() {
            Some(e) => (None, Some(e.to_string())),
            None => (Some(compiled), None),
        }
    }

    fn panel_report(
        &self,
        button: Option<Rect>,
        selected: &[ItemHandle],
        custom_filter: bool,
        filter_error: Option<String>,
    ) -> PanelReport {
        PanelReport {
            button,
            candidates: selected.iter().map(|item| item.id).collect(),
            count_label: count_label(
                selected,
                self.settings.show_stack_sizes,
                self.settings.show_stack_count_with_size,
            ),
            custom_filter,
            filter_error,
        }
    }
}

/// Candidate counter text. Stack sizes are shown only when every candidate
/// has one and they add up to something other than the item count.
pub fn count_label(items: &[ItemHandle], show_stack_sizes: bool, with_count: bool) -> String {
    let count = items.len();
    let stacks: Option<u64> = items.iter().map(|item| item.record.stack_size.map(u64::from)).sum();
    match stacks {
        Some(stacks) if show_stack_sizes && stacks != count as u64 => {
            if with_count {
                format!("{} / {}", stacks, count)
            } else {
                stacks.to_string()
            }
        }
        _ => count.to_string(),
    }
}
