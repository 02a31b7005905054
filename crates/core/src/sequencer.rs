//! Ordered item transfer, driven one tick at a time by the scheduler.
//!
//! A run first waits for the user to let go of the mouse (and optionally to
//! stop moving it), then ctrl+clicks each item in order. Between items it
//! re-checks cancellation, panel visibility and, when moving into the
//! inventory, whether the inventory still has room. Closing a panel or
//! filling the inventory ends the run early but still counts as success;
//! only an explicit cancel yields `false`.

use std::fmt;
use std::time::{Duration, Instant};

use crate::grid;
use crate::logger;
use crate::platform::{GameState, Host};
use crate::scheduler::{Operation, Step, TickContext};
use crate::settings::Settings;
use crate::sleep::Wait;
use crate::types::*;

/// Timing and safety knobs copied out of [`Settings`] when a run starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferConfig {
    pub idle_mouse_delay: Duration,
    pub key_delay: Duration,
    pub pointer_move_delay: Duration,
    pub pointer_hold_delay: Duration,
    pub pointer_release_delay: Duration,
    pub prefer_blocking_waits: bool,
    pub cancel_with_right_mouse: bool,
    pub verify_target_opened: bool,
    pub grid_width: u32,
    pub grid_height: u32,
    pub modifier: Key,
}

impl From<&Settings> for TransferConfig {
    fn from(s: &Settings) -> Self {
        Self {
            idle_mouse_delay: s.idle_mouse_delay(),
            key_delay: s.key_delay(),
            pointer_move_delay: s.pointer_move_delay(),
            pointer_hold_delay: s.pointer_hold_delay(),
            pointer_release_delay: s.pointer_release_delay(),
            prefer_blocking_waits: s.prefer_blocking_waits,
            cancel_with_right_mouse: s.cancel_with_right_mouse_button,
            verify_target_opened: s.verify_target_inventory_is_opened,
            grid_width: s.grid_width,
            grid_height: s.grid_height,
            modifier: Key::LeftControl,
        }
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerState {
    AwaitingPreamble,
    Running,
    Completed,
    Aborted,
}

/// Why a run ended before reaching the last item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    InventoryClosed,
    StashClosed,
    TargetClosed,
    InventoryFull,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StopReason::InventoryClosed => "inventory panel closed",
            StopReason::StashClosed => "stash panel closed",
            StopReason::TargetClosed => "target inventory closed",
            StopReason::InventoryFull => "inventory full",
        })
    }
}

/// Some panel that can receive items from the inventory is open.
pub fn stash_target_open<G: GameState + ?Sized>(host: &G, verify: bool) -> bool {
    !verify
        || [Panel::Stash, Panel::SellWindow, Panel::TradeWindow, Panel::GuildStash]
            .into_iter()
            .any(|panel| host.is_panel_visible(panel))
}

/// A stash that items can be taken out of is open.
pub fn stash_source_open<G: GameState + ?Sized>(host: &G, verify: bool) -> bool {
    !verify || host.is_panel_visible(Panel::Stash) || host.is_panel_visible(Panel::GuildStash)
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    AwaitRelease,
    AwaitIdle { last: Point, since: Instant },
    Running { index: usize, restore: Point },
    Done(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    ModifierDown,
    MovePointer,
    PointerDown,
    PointerUp,
    ModifierUp,
}

const ACTIONS: [Action; 5] =
    [Action::ModifierDown, Action::MovePointer, Action::PointerDown, Action::PointerUp, Action::ModifierUp];

impl Action {
    fn perform(self, host: &mut dyn Host, target: Point, modifier: Key) {
        match self {
            Action::ModifierDown => host.key_down(modifier),
            Action::MovePointer => host.move_cursor(target),
            Action::PointerDown => host.pointer_down(),
            Action::PointerUp => host.pointer_up(),
            Action::ModifierUp => host.key_up(modifier),
        }
    }

    fn settle(self, config: &TransferConfig) -> Wait {
        match self {
            Action::ModifierDown => Wait::new(config.key_delay, true),
            Action::MovePointer => Wait::new(config.pointer_move_delay, true),
            Action::PointerDown => Wait::new(config.pointer_hold_delay, true),
            Action::PointerUp => Wait::new(config.pointer_release_delay, true),
            // Never block here: the key-up has to be seen by at least one frame
            Action::ModifierUp => Wait::new(config.key_delay, false),
        }
    }
}

/// One modifier+click on a single point. Not cancellable once started.
#[derive(Debug, Clone, Copy)]
struct TransferStep {
    target: Point,
    stage: usize,
    wait: Option<Wait>,
}

impl TransferStep {
    fn new(target: Point) -> Self {
        Self { target, stage: 0, wait: None }
    }

    /// Returns true when every action has been performed and settled.
    fn poll(&mut self, cx: &mut TickContext<'_>, config: &TransferConfig) -> bool {
        while let Some(&action) = ACTIONS.get(self.stage) {
            if self.wait.is_none() {
                action.perform(cx.host, self.target, config.modifier);
                self.wait = Some(action.settle(config));
            }
            let settled = match self.wait.as_mut() {
                Some(wait) => wait.poll(cx.clock, cx.sleeper, config.prefer_blocking_waits),
                None => true,
            };
            if !settled {
                return false;
            }
            self.wait = None;
            self.stage += 1;
        }
        true
    }
}

/// Moves an ordered list of items from one container to the other.
pub struct TransferSequencer {
    direction: Direction,
    items: OrderedItemList,
    config: TransferConfig,
    phase: Phase,
    step: Option<TransferStep>,
    feedback: Vec<Rect>,
    steps_done: usize,
    skipped: usize,
    stop_reason: Option<StopReason>,
}

impl TransferSequencer {
    pub fn new(direction: Direction, items: OrderedItemList, config: TransferConfig) -> Self {
        Self {
            direction,
            items,
            config,
            phase: Phase::AwaitRelease,
            step: None,
            feedback: Vec::new(),
            steps_done: 0,
            skipped: 0,
            stop_reason: None,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn items(&self) -> &OrderedItemList {
        &self.items
    }

    pub fn state(&self) -> SequencerState {
        match self.phase {
            Phase::AwaitRelease | Phase::AwaitIdle { .. } => SequencerState::AwaitingPreamble,
            Phase::Running { .. } => SequencerState::Running,
            Phase::Done(true) => SequencerState::Completed,
            Phase::Done(false) => SequencerState::Aborted,
        }
    }

    /// Completed clicks so far
    pub fn steps_performed(&self) -> usize {
        self.steps_done
    }

    /// Items that had disappeared by the time their turn came
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    fn cancel_requested(&self, cx: &TickContext<'_>) -> bool {
        self.config.cancel_with_right_mouse && cx.host.pointer_buttons().right
    }

    fn enter_running(&mut self, cx: &mut TickContext<'_>) {
        let restore = cx.host.cursor_position();
        logger::info_p("transfer", &format!("moving {} item(s), {:?}", self.items.len(), self.direction));
        self.phase = Phase::Running { index: 0, restore };
    }

    fn run(&mut self, cx: &mut TickContext<'_>, mut index: usize, restore: Point) -> Step {
        loop {
            if let Some(step) = self.step.as_mut() {
                if !step.poll(cx, &self.config) {
                    self.phase = Phase::Running { index, restore };
                    return Step::Pending;
                }
                self.step = None;
                self.steps_done += 1;
                index += 1;
            }

            let Some(id) = self.items.get(index).map(|item| item.id) else {
                return self.complete(cx, restore);
            };

            self.publish_feedback(cx, index);
            if self.cancel_requested(cx) {
                return self.abort();
            }
            if let Some(reason) = self.interruption(cx) {
                logger::info_p(
                    "transfer",
                    &format!("{}, stopping after {} of {} item(s)", reason, self.steps_done, self.items.len()),
                );
                self.stop_reason = Some(reason);
                return self.complete(cx, restore);
            }

            // Re-read the rect: the panel may have reflowed since the snapshot
            match cx.host.item_rect(self.direction.source(), id) {
                Some(rect) => {
                    let target = rect.center().offset(cx.host.window_offset());
                    self.step = Some(TransferStep::new(target));
                }
                None => {
                    logger::warn_p("transfer", &format!("item {} is gone, skipping", id));
                    self.skipped += 1;
                    index += 1;
                }
            }
        }
    }

    fn publish_feedback(&mut self, cx: &TickContext<'_>, index: usize) {
        let source = self.direction.source();
        self.feedback = self.items.as_slice()[index..]
            .iter()
            .filter_map(|item| cx.host.item_rect(source, item.id))
            .collect();
    }

    fn interruption(&self, cx: &TickContext<'_>) -> Option<StopReason> {
        let host = &*cx.host;
        let verify = self.config.verify_target_opened;
        let inventory_open = host.is_panel_visible(Panel::Inventory);

        match self.direction {
            Direction::InventoryToStash => {
                if !inventory_open {
                    return Some(StopReason::InventoryClosed);
                }
                if !stash_target_open(host, verify) {
                    return Some(StopReason::TargetClosed);
                }
            }
            Direction::StashToInventory => {
                if !stash_source_open(host, verify) {
                    return Some(StopReason::StashClosed);
                }
                if !inventory_open {
                    return Some(StopReason::InventoryClosed);
                }
            }
        }

        if self.direction.destination_is_grid_bounded() {
            let placements = host.placements(self.direction.destination());
            if grid::is_full(&placements, self.config.grid_width, self.config.grid_height) {
                return Some(StopReason::InventoryFull);
            }
        }
        None
    }

    fn complete(&mut self, cx: &mut TickContext<'_>, restore: Point) -> Step {
        cx.host.move_cursor(restore);
        self.feedback.clear();
        self.phase = Phase::Done(true);
        logger::info_p("transfer", &format!("done, {} item(s) moved", self.steps_done));
        Step::Complete(true)
    }

    fn abort(&mut self) -> Step {
        self.feedback.clear();
        self.phase = Phase::Done(false);
        logger::info_p("transfer", "cancelled");
        Step::Complete(false)
    }
}

impl Operation for TransferSequencer {
    fn resume(&mut self, cx: &mut TickContext<'_>) -> Step {
        loop {
            match self.phase {
                Phase::AwaitRelease => {
                    if self.cancel_requested(cx) {
                        return self.abort();
                    }
                    if cx.host.pointer_buttons().left {
                        return Step::Pending;
                    }
                    if self.config.idle_mouse_delay.is_zero() {
                        self.enter_running(cx);
                        continue;
                    }
                    self.phase = Phase::AwaitIdle { last: cx.host.cursor_position(), since: cx.clock.now() };
                    return Step::Pending;
                }
                Phase::AwaitIdle { last, since } => {
                    if self.cancel_requested(cx) {
                        return self.abort();
                    }
                    let pos = cx.host.cursor_position();
                    let now = cx.clock.now();
                    if pos != last {
                        self.phase = Phase::AwaitIdle { last: pos, since: now };
                        return Step::Pending;
                    }
                    if now.duration_since(since) < self.config.idle_mouse_delay {
                        return Step::Pending;
                    }
                    self.enter_running(cx);
                }
                Phase::Running { index, restore } => return self.run(cx, index, restore),
                Phase::Done(result) => return Step::Complete(result),
            }
        }
    }

    fn feedback(&self) -> &[Rect] {
        &self.feedback
    }
}
