use std::time::Duration;

use stashmover_core::orchestrator::{Orchestrator, TickReport, TriggerInput};
use stashmover_core::platform::stub::SimHost;
use stashmover_core::platform::GameState;
use stashmover_core::scheduler::TickContext;
use stashmover_core::settings::Settings;
use stashmover_core::sleep::ManualClock;
use stashmover_core::types::*;

const TICK: Duration = Duration::from_millis(16);

const TO_INVENTORY: TriggerInput = TriggerInput { move_to_inventory: true, move_to_stash: false };
const TO_STASH: TriggerInput = TriggerInput { move_to_inventory: false, move_to_stash: true };

fn record(name: &str, highlighted: bool, stack_size: Option<u32>) -> ItemRecord {
    ItemRecord {
        name: name.to_string(),
        width: 1,
        height: 1,
        highlighted,
        stack_size,
        ..ItemRecord::default()
    }
}

fn settings() -> Settings {
    Settings { idle_mouse_delay_ms: 0, ..Settings::default() }
}

fn orchestrator(settings: Settings) -> Orchestrator {
    Orchestrator::new(settings).unwrap()
}

fn stash_host() -> SimHost {
    let mut host = SimHost::new(12, 5);
    host.add_stash_item(0, 0, record("Chaos Orb", true, Some(20)));
    host.add_stash_item(1, 0, record("Divine Orb", false, Some(3)));
    host.add_stash_item(2, 0, record("Chaos Orb", true, Some(7)));
    host
}

struct Rig {
    host: SimHost,
    clock: ManualClock,
    orch: Orchestrator,
}

impl Rig {
    fn new(host: SimHost, settings: Settings) -> Self {
        Self { host, clock: ManualClock::new(), orch: orchestrator(settings) }
    }

    fn tick(&mut self, input: TriggerInput) -> TickReport {
        let mut cx = TickContext { host: &mut self.host, clock: &self.clock, sleeper: &self.clock };
        let report = self.orch.tick(&mut cx, input);
        self.clock.advance(TICK);
        report
    }

    fn finish(&mut self) -> bool {
        for _ in 0..10_000 {
            if let Some(result) = self.tick(TriggerInput::default()).finished {
                return result;
            }
        }
        panic!("run never finished");
    }
}

#[test]
fn test_hotkey_moves_highlighted_stash_items() {
    let mut rig = Rig::new(stash_host(), settings());

    let report = rig.tick(TO_INVENTORY);
    assert_eq!(report.started, Some(Direction::StashToInventory));
    let stash = report.stash.unwrap();
    assert_eq!(stash.candidates.len(), 2);
    assert_eq!(stash.count_label, "27 / 2");
    assert!(!stash.custom_filter);
    assert!(rig.orch.is_active());

    assert!(rig.finish());
    assert_eq!(rig.host.item_count(Container::PlayerInventory), 2);
    assert_eq!(rig.host.item_count(Container::VisibleStash), 1);
}

#[test]
fn test_busy_ticks_only_resume() {
    let mut rig = Rig::new(stash_host(), settings());
    rig.tick(TO_INVENTORY);

    let report = rig.tick(TO_INVENTORY);
    assert!(report.busy);
    assert!(report.stash.is_none());
    assert!(report.started.is_none());
    assert!(!report.feedback.is_empty());
}

#[test]
fn test_invert_selection_picks_unhighlighted() {
    let mut rig = Rig::new(stash_host(), Settings { invert_selection: true, ..settings() });

    let stash = rig.tick(TriggerInput::default()).stash.unwrap();
    assert_eq!(stash.candidates.len(), 1);
    assert_eq!(stash.count_label, "3 / 1");
}

#[test]
fn test_custom_filter_replaces_highlight() {
    let mut rig = Rig::new(stash_host(), settings());
    rig.orch.set_filter(Container::VisibleStash, r#"item.name == "Divine Orb""#);

    let stash = rig.tick(TriggerInput::default()).stash.unwrap();
    assert!(stash.custom_filter);
    assert_eq!(stash.candidates.len(), 1);
    assert!(stash.filter_error.is_none());
}

#[test]
fn test_broken_filter_reports_error_and_uses_default() {
    let mut rig = Rig::new(stash_host(), settings());
    rig.orch.set_filter(Container::VisibleStash, "item.name ==");

    for _ in 0..3 {
        let stash = rig.tick(TriggerInput::default()).stash.unwrap();
        assert!(!stash.custom_filter);
        assert!(stash.filter_error.as_deref().is_some_and(|e| e.contains("syntax")));
        assert_eq!(stash.candidates.len(), 2);
    }
    assert_eq!(rig.orch.filter_cache().compile_count(), 1);
}

#[test]
fn test_custom_filters_can_be_switched_off() {
    let mut rig = Rig::new(stash_host(), Settings { use_custom_filters: false, ..settings() });
    rig.orch.set_filter(Container::VisibleStash, r#"item.name == "Divine Orb""#);

    let stash = rig.tick(TriggerInput::default()).stash.unwrap();
    assert!(!stash.custom_filter);
    assert_eq!(stash.candidates.len(), 2);
}

#[test]
fn test_button_fires_on_press_edge() {
    let mut rig = Rig::new(stash_host(), settings());
    let button = rig.tick(TriggerInput::default()).stash.unwrap().button.unwrap();

    rig.host.set_cursor(button.center());
    assert!(rig.tick(TriggerInput::default()).started.is_none());

    rig.host.set_buttons(PointerButtons { left: true, right: false });
    let report = rig.tick(TriggerInput::default());
    assert_eq!(report.started, Some(Direction::StashToInventory));

    // The run holds off until the button is let go
    rig.tick(TriggerInput::default());
    assert!(rig.host.events().is_empty());
    rig.host.set_buttons(PointerButtons::default());
    assert!(rig.finish());
    assert_eq!(rig.host.cursor_position(), button.center());
}

#[test]
fn test_button_held_while_hovering_in_does_not_fire() {
    let mut rig = Rig::new(stash_host(), settings());
    let button = rig.tick(TriggerInput::default()).stash.unwrap().button.unwrap();

    rig.host.set_buttons(PointerButtons { left: true, right: false });
    rig.tick(TriggerInput::default());
    rig.host.set_cursor(button.center());
    assert!(rig.tick(TriggerInput::default()).started.is_none());
    assert!(rig.tick(TriggerInput::default()).started.is_none());
}

#[test]
fn test_custom_button_position() {
    let custom = Point::new(5.0, 6.0);
    let mut rig = Rig::new(stash_host(), Settings { custom_move_to_inventory_button: Some(custom), ..settings() });

    let button = rig.tick(TriggerInput::default()).stash.unwrap().button.unwrap();
    assert_eq!(button.top_left(), custom);
}

#[test]
fn test_inventory_hotkey_skips_ignored_cells() {
    let mut host = SimHost::new(12, 5);
    host.add_inventory_item(0, 0, record("Portal Scroll", false, Some(40)));
    host.add_inventory_item(1, 0, record("Ring", false, None));
    host.add_inventory_item(2, 0, record("Belt", false, None));
    let mut s = settings();
    s.set_cell_ignored(0, 0, true);
    let mut rig = Rig::new(host, s);

    let report = rig.tick(TO_STASH);
    assert_eq!(report.started, Some(Direction::InventoryToStash));
    assert_eq!(report.inventory.unwrap().candidates.len(), 2);

    assert!(rig.finish());
    assert_eq!(rig.host.item_count(Container::PlayerInventory), 1);
    assert_eq!(rig.host.item_count(Container::VisibleStash), 2);
}

#[test]
fn test_inventory_button_needs_open_target() {
    let mut host = SimHost::new(12, 5);
    host.hide(Panel::Stash);
    host.add_inventory_item(0, 0, record("Ring", false, None));
    let mut rig = Rig::new(host, settings());

    let report = rig.tick(TO_STASH);
    assert!(report.stash.is_none());
    assert!(report.inventory.as_ref().unwrap().button.is_none());
    assert!(report.started.is_none());
}

#[test]
fn test_dump_button_can_be_disabled() {
    let mut host = SimHost::new(12, 5);
    host.add_inventory_item(0, 0, record("Ring", false, None));
    let mut rig = Rig::new(host, Settings { dump_button_enable: false, ..settings() });

    let report = rig.tick(TO_STASH);
    assert!(report.inventory.unwrap().button.is_none());
    assert!(report.started.is_none());
}

#[test]
fn test_inventory_hotkey_falls_back_to_dump_without_highlights() {
    let mut host = SimHost::new(12, 5);
    host.add_stash_item(0, 0, record("Ring", false, None));
    host.add_inventory_item(0, 0, record("Belt", false, None));

    let mut rig = Rig::new(
        host,
        Settings { use_move_to_inventory_as_move_to_stash_when_no_highlights: true, ..settings() },
    );
    assert_eq!(rig.tick(TO_INVENTORY).started, Some(Direction::InventoryToStash));

    let mut host = SimHost::new(12, 5);
    host.add_stash_item(0, 0, record("Ring", false, None));
    host.add_inventory_item(0, 0, record("Belt", false, None));
    let mut rig = Rig::new(host, settings());
    assert_eq!(rig.tick(TO_INVENTORY).started, None);
}

#[test]
fn test_move_to_stash_wins_when_both_hotkeys_held() {
    let mut host = stash_host();
    host.add_inventory_item(0, 0, record("Belt", false, None));
    let mut rig = Rig::new(host, settings());

    let both = TriggerInput { move_to_inventory: true, move_to_stash: true };
    let report = rig.tick(both);
    assert_eq!(report.started, Some(Direction::InventoryToStash));
    assert_eq!(report.stash.unwrap().candidates.len(), 2);

    assert!(rig.finish());
    assert_eq!(rig.host.item_count(Container::PlayerInventory), 0);
    assert_eq!(rig.host.item_count(Container::VisibleStash), 4);
}

#[test]
fn test_filter_reset_when_panel_closes() {
    let mut rig = Rig::new(stash_host(), settings());
    rig.orch.set_filter(Container::VisibleStash, "item.width == 1");
    rig.orch.set_filter(Container::PlayerInventory, "item.width == 2");

    rig.host.hide(Panel::Stash);
    rig.tick(TriggerInput::default());
    assert_eq!(rig.orch.filter(Container::VisibleStash), "");
    assert_eq!(rig.orch.filter(Container::PlayerInventory), "item.width == 2");

    rig.host.hide(Panel::Inventory);
    rig.tick(TriggerInput::default());
    assert_eq!(rig.orch.filter(Container::PlayerInventory), "");
}

#[test]
fn test_filter_kept_when_reset_disabled() {
    let mut rig = Rig::new(stash_host(), Settings { reset_custom_filter_on_panel_close: false, ..settings() });
    rig.orch.set_filter(Container::VisibleStash, "item.width == 1");

    rig.host.hide(Panel::Stash);
    rig.tick(TriggerInput::default());
    assert_eq!(rig.orch.filter(Container::VisibleStash), "item.width == 1");
}

#[test]
fn test_disabled_does_nothing() {
    let mut rig = Rig::new(stash_host(), Settings { enable: false, ..settings() });
    let report = rig.tick(TO_INVENTORY);
    assert_eq!(report, TickReport::default());
}

#[test]
fn test_no_candidates_starts_nothing() {
    let mut host = SimHost::new(12, 5);
    host.add_stash_item(0, 0, record("Ring", false, None));
    let mut rig = Rig::new(host, settings());

    let report = rig.tick(TO_INVENTORY);
    assert!(report.started.is_none());
    assert_eq!(report.stash.unwrap().count_label, "0");
}

#[test]
fn test_saved_filters_are_deduplicated() {
    let mut orch = orchestrator(settings());
    assert!(orch.save_filter("item.rarity == \"Unique\""));
    assert!(!orch.save_filter("item.rarity == \"Unique\""));
    assert!(!orch.save_filter("   "));
    assert_eq!(orch.settings().saved_filters.len(), 1);
    assert_eq!(orch.delete_saved_filter(0).as_deref(), Some("item.rarity == \"Unique\""));
    assert_eq!(orch.delete_saved_filter(0), None);
}

#[test]
fn test_right_click_cancel_reports_false() {
    let mut rig = Rig::new(stash_host(), settings());
    rig.tick(TO_INVENTORY);
    rig.host.set_buttons(PointerButtons { left: false, right: true });

    assert!(!rig.finish());
    assert!(!rig.orch.is_active());
    assert!(rig.orch.feedback().is_empty());
    assert!(rig.host.events().is_empty());
    assert_eq!(rig.host.item_count(Container::VisibleStash), 3);
}
