use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::mpsc;

use stashmover_core::logger;
use stashmover_core::orchestrator::{Orchestrator, PanelReport, TriggerInput};
use stashmover_core::platform::stub::SimHost;
use stashmover_core::platform::GameState;
use stashmover_core::scheduler::TickContext;
use stashmover_core::sleep::{Clock, Sleeper};
use stashmover_core::types::{Container, Panel, PointerButtons, Rect};

use crate::confirm::ConfirmDialog;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    /// Typing a custom filter for the panel showing this container
    EditFilter(Container),
}

pub struct App {
    pub host: SimHost,
    pub orch: Orchestrator,
    pub stash: Option<PanelReport>,
    pub inventory: Option<PanelReport>,
    pub feedback: Vec<Rect>,
    pub last_result: Option<bool>,
    pub mode: InputMode,
    pub filter_input: String,
    pub confirm: Option<ConfirmDialog>,
    pub log_visible: bool,
    pub log_messages: Vec<String>,
    pub log_scroll: usize, // scroll offset from bottom (0 = latest)
    pub log_rx: mpsc::Receiver<String>,
    pub should_quit: bool,
    settings_path: PathBuf,
    hotkeys: TriggerInput,
    scripted: VecDeque<bool>,
    right_held: bool,
}

impl App {
    pub fn new(host: SimHost, orch: Orchestrator, log_rx: mpsc::Receiver<String>, settings_path: PathBuf) -> Self {
        Self {
            host,
            orch,
            stash: None,
            inventory: None,
            feedback: Vec::new(),
            last_result: None,
            mode: InputMode::Normal,
            filter_input: String::new(),
            confirm: None,
            log_visible: true,
            log_messages: Vec::new(),
            log_scroll: 0,
            log_rx,
            should_quit: false,
            settings_path,
            hotkeys: TriggerInput::default(),
            scripted: VecDeque::new(),
            right_held: false,
        }
    }

    /// One frame: feed simulated input to the host, then tick the orchestrator.
    pub fn tick(&mut self, clock: &dyn Clock, sleeper: &dyn Sleeper) {
        if let Some(left) = self.scripted.pop_front() {
            self.host.set_buttons(PointerButtons { left, right: self.right_held });
        }

        let input = std::mem::take(&mut self.hotkeys);
        let report = {
            let mut cx = TickContext { host: &mut self.host, clock, sleeper };
            self.orch.tick(&mut cx, input)
        };

        self.feedback = report.feedback;
        if !report.busy {
            self.stash = report.stash;
            self.inventory = report.inventory;
        }
        if let Some(result) = report.finished {
            self.last_result = Some(result);
            self.set_right_held(false);
        }
    }

    pub fn drain_logs(&mut self) {
        while let Ok(msg) = self.log_rx.try_recv() {
            self.log_messages.push(msg);
        }
    }

    pub fn scroll_log_up(&mut self, n: usize) {
        self.log_scroll = self.log_scroll.saturating_add(n);
    }

    pub fn scroll_log_down(&mut self, n: usize) {
        self.log_scroll = self.log_scroll.saturating_sub(n);
    }

    pub fn toggle_log(&mut self) {
        self.log_visible = !self.log_visible;
    }

    /// Stand-in for the move-to-inventory hotkey, held for one frame.
    pub fn press_move_to_inventory(&mut self) {
        self.hotkeys.move_to_inventory = true;
    }

    pub fn press_move_to_stash(&mut self) {
        self.hotkeys.move_to_stash = true;
    }

    /// Hover the button, then press and release it over the next frames.
    pub fn click_button(&mut self, container: Container) {
        let panel = match container {
            Container::VisibleStash => &self.stash,
            Container::PlayerInventory => &self.inventory,
        };
        let Some(button) = panel.as_ref().and_then(|p| p.button) else {
            logger::warn("that button is not showing");
            return;
        };
        let offset = self.host.window_offset();
        self.host.set_cursor(button.center().offset(offset));
        self.scripted.extend([false, true, false]);
    }

    pub fn toggle_right_held(&mut self) {
        self.set_right_held(!self.right_held);
    }

    pub fn right_held(&self) -> bool {
        self.right_held
    }

    fn set_right_held(&mut self, held: bool) {
        self.right_held = held;
        let left = self.host.pointer_buttons().left;
        self.host.set_buttons(PointerButtons { left, right: held });
    }

    pub fn toggle_panel(&mut self, panel: Panel) {
        self.host.toggle(panel);
        logger::info(&format!("{:?} {}", panel, if self.host.is_panel_visible(panel) { "opened" } else { "closed" }));
    }

    pub fn reseed(&mut self, seed: u64) {
        if self.orch.is_active() {
            logger::warn("cannot reshuffle while a transfer is running");
            return;
        }
        let (w, h) = self.host.inventory_size();
        self.host = SimHost::random(seed, 40, w, h);
        logger::info(&format!("new stash layout, seed {}", seed));
    }

    pub fn begin_filter_edit(&mut self, container: Container) {
        self.filter_input = self.orch.filter(container).to_string();
        self.mode = InputMode::EditFilter(container);
    }

    pub fn commit_filter_edit(&mut self) {
        if let InputMode::EditFilter(container) = self.mode {
            self.orch.set_filter(container, std::mem::take(&mut self.filter_input));
        }
        self.mode = InputMode::Normal;
    }

    pub fn cancel_filter_edit(&mut self) {
        self.filter_input.clear();
        self.mode = InputMode::Normal;
    }

    /// Next saved filter into the stash filter, wrapping around.
    pub fn cycle_saved_filter(&mut self) {
        let saved = &self.orch.settings().saved_filters;
        if saved.is_empty() {
            return;
        }
        let current = self.orch.filter(Container::VisibleStash);
        let next = match saved.iter().position(|f| f == current) {
            Some(i) => (i + 1) % saved.len(),
            None => 0,
        };
        let text = saved[next].clone();
        self.orch.set_filter(Container::VisibleStash, text);
    }

    pub fn save_stash_filter(&mut self) {
        let text = self.orch.filter(Container::VisibleStash).to_string();
        if self.orch.save_filter(&text) {
            logger::info(&format!("saved filter: {}", text));
            self.save_settings();
        }
    }

    pub fn save_settings(&self) {
        if let Err(e) = self.orch.settings().save(&self.settings_path) {
            logger::error(&format!("failed to save settings: {}", e));
        }
    }

    /// Quit, asking first if a transfer is mid-flight.
    pub fn request_quit(&mut self) {
        if self.orch.is_active() {
            self.confirm = Some(ConfirmDialog::new("A transfer is running. Quit anyway?"));
        } else {
            self.quit();
        }
    }

    pub fn quit(&mut self) {
        self.save_settings();
        self.should_quit = true;
    }
}
