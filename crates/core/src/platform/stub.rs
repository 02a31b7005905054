use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::grid::Occupancy;
use crate::logger;
use crate::types::*;
use super::{GameState, InputInjector};

/// Pixel size of one grid cell in the simulated client area.
pub const CELL_PX: f32 = 26.0;
pub const STASH_ORIGIN: Point = Point::new(16.0, 60.0);
pub const INVENTORY_ORIGIN: Point = Point::new(420.0, 300.0);

/// Input the simulated host received, in order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    KeyDown(Key),
    KeyUp(Key),
    MoveCursor(Point),
    PointerDown,
    PointerUp,
}

#[derive(Debug, Clone)]
struct SimItem {
    id: ItemId,
    cell: GridPlacement,
    record: ItemRecord,
}

/// In-memory game: a stash grid and an inventory grid whose items move across
/// on a modifier-held click, the way the real client handles ctrl+click.
#[derive(Debug)]
pub struct SimHost {
    inventory: Vec<SimItem>,
    stash: Vec<SimItem>,
    inventory_size: (u32, u32),
    stash_size: (u32, u32),
    visible: HashSet<Panel>,
    cursor: Point,
    buttons: PointerButtons,
    held_keys: HashSet<Key>,
    window_offset: Point,
    press_target: Option<(Container, ItemId)>,
    events: Vec<InputEvent>,
    clicks: usize,
    moved: usize,
    next_id: ItemId,
}

const ITEM_KINDS: &[(&str, &str, &str, &str, u32, u32, Option<u32>)] = &[
    ("Chaos Orb", "Chaos Orb", "Stackable Currency", "Currency", 1, 1, Some(20)),
    ("Divine Orb", "Divine Orb", "Stackable Currency", "Currency", 1, 1, Some(10)),
    ("Orb of Fusing", "Orb of Fusing", "Stackable Currency", "Currency", 1, 1, Some(20)),
    ("Doom Loop", "Two-Stone Ring", "Ring", "Rare", 1, 1, None),
    ("Mageblood", "Heavy Belt", "Belt", "Unique", 2, 1, None),
    ("Grim Shell", "Vaal Regalia", "Body Armour", "Rare", 2, 3, None),
    ("Storm Gaze", "Hubris Circlet", "Helmet", "Rare", 2, 2, None),
    ("Watcher's Eye", "Prismatic Jewel", "Jewel", "Unique", 1, 1, None),
    ("Bone Song", "Imperial Staff", "Staff", "Rare", 2, 4, None),
];

impl SimHost {
    /// Empty host with both panels open.
    pub fn new(inventory_width: u32, inventory_height: u32) -> Self {
        Self {
            inventory: Vec::new(),
            stash: Vec::new(),
            inventory_size: (inventory_width, inventory_height),
            stash_size: (12, 12),
            visible: [Panel::Inventory, Panel::Stash].into_iter().collect(),
            cursor: Point::default(),
            buttons: PointerButtons::default(),
            held_keys: HashSet::new(),
            window_offset: Point::default(),
            press_target: None,
            events: Vec::new(),
            clicks: 0,
            moved: 0,
            next_id: 1,
        }
    }

    /// Host with a stash of `count` random items, reproducible from `seed`.
    pub fn random(seed: u64, count: usize, inventory_width: u32, inventory_height: u32) -> Self {
        let mut host = Self::new(inventory_width, inventory_height);
        let mut rng = StdRng::seed_from_u64(seed);
        let (sw, sh) = host.stash_size;

        for _ in 0..count {
            let (name, base, class, rarity, w, h, stack) = ITEM_KINDS[rng.gen_range(0..ITEM_KINDS.len())];
            let occupancy = host.occupancy(Container::VisibleStash);
            let guess = GridPlacement::new(rng.gen_range(0..=sw - w), rng.gen_range(0..=sh - h), w, h);
            let Some(cell) = Some(guess).filter(|p| occupancy.is_free(p)).or_else(|| occupancy.first_fit(w, h))
            else {
                break;
            };
            let record = ItemRecord {
                name: name.to_string(),
                base_name: base.to_string(),
                class: class.to_string(),
                rarity: rarity.to_string(),
                item_level: rng.gen_range(1..=86),
                stack_size: stack.map(|max| rng.gen_range(1..=max)),
                width: w,
                height: h,
                highlighted: rng.gen_bool(0.4),
            };
            host.insert(Container::VisibleStash, cell, record);
        }
        host
    }

    pub fn add_stash_item(&mut self, x: u32, y: u32, record: ItemRecord) -> ItemId {
        let cell = GridPlacement::new(x, y, record.width.max(1), record.height.max(1));
        self.insert(Container::VisibleStash, cell, record)
    }

    pub fn add_inventory_item(&mut self, x: u32, y: u32, record: ItemRecord) -> ItemId {
        let cell = GridPlacement::new(x, y, record.width.max(1), record.height.max(1));
        self.insert(Container::PlayerInventory, cell, record)
    }

    fn insert(&mut self, container: Container, cell: GridPlacement, record: ItemRecord) -> ItemId {
        let id = self.next_id;
        self.next_id += 1;
        self.list_mut(container).push(SimItem { id, cell, record });
        id
    }

    pub fn remove_item(&mut self, container: Container, id: ItemId) -> bool {
        let list = self.list_mut(container);
        let before = list.len();
        list.retain(|item| item.id != id);
        list.len() != before
    }

    pub fn show(&mut self, panel: Panel) {
        self.visible.insert(panel);
    }

    pub fn hide(&mut self, panel: Panel) {
        self.visible.remove(&panel);
    }

    pub fn toggle(&mut self, panel: Panel) {
        if !self.visible.remove(&panel) {
            self.visible.insert(panel);
        }
    }

    /// Simulate the user moving the mouse.
    pub fn set_cursor(&mut self, to: Point) {
        self.cursor = to;
    }

    /// Simulate the user holding or releasing physical buttons.
    pub fn set_buttons(&mut self, buttons: PointerButtons) {
        self.buttons = buttons;
    }

    pub fn set_window_offset(&mut self, offset: Point) {
        self.window_offset = offset;
    }

    pub fn events(&self) -> &[InputEvent] {
        &self.events
    }

    /// Completed modifier+click gestures
    pub fn clicks(&self) -> usize {
        self.clicks
    }

    /// Items that actually changed container
    pub fn moved(&self) -> usize {
        self.moved
    }

    pub fn is_key_held(&self, key: Key) -> bool {
        self.held_keys.contains(&key)
    }

    pub fn stash_size(&self) -> (u32, u32) {
        self.stash_size
    }

    pub fn inventory_size(&self) -> (u32, u32) {
        self.inventory_size
    }

    pub fn item_count(&self, container: Container) -> usize {
        self.list(container).len()
    }

    /// Item record and cell for rendering.
    pub fn cells(&self, container: Container) -> impl Iterator<Item = (ItemId, GridPlacement, &ItemRecord)> {
        self.list(container).iter().map(|item| (item.id, item.cell, &item.record))
    }

    pub fn cell_rect(&self, container: Container, cell: GridPlacement) -> Rect {
        let origin = match container {
            Container::VisibleStash => STASH_ORIGIN,
            Container::PlayerInventory => INVENTORY_ORIGIN,
        };
        Rect::new(
            origin.x + cell.x as f32 * CELL_PX,
            origin.y + cell.y as f32 * CELL_PX,
            cell.width as f32 * CELL_PX,
            cell.height as f32 * CELL_PX,
        )
    }

    fn list(&self, container: Container) -> &Vec<SimItem> {
        match container {
            Container::VisibleStash => &self.stash,
            Container::PlayerInventory => &self.inventory,
        }
    }

    fn list_mut(&mut self, container: Container) -> &mut Vec<SimItem> {
        match container {
            Container::VisibleStash => &mut self.stash,
            Container::PlayerInventory => &mut self.inventory,
        }
    }

    fn grid_size(&self, container: Container) -> (u32, u32) {
        match container {
            Container::VisibleStash => self.stash_size,
            Container::PlayerInventory => self.inventory_size,
        }
    }

    fn occupancy(&self, container: Container) -> Occupancy {
        let (w, h) = self.grid_size(container);
        let cells: Vec<GridPlacement> = self.list(container).iter().map(|item| item.cell).collect();
        Occupancy::from_placements(&cells, w, h)
    }

    fn stash_showing(&self) -> bool {
        self.visible.contains(&Panel::Stash) || self.visible.contains(&Panel::GuildStash)
    }

    fn item_under_cursor(&self) -> Option<(Container, ItemId)> {
        let client = Point::new(self.cursor.x - self.window_offset.x, self.cursor.y - self.window_offset.y);
        [Container::VisibleStash, Container::PlayerInventory]
            .into_iter()
            .find_map(|container| {
                self.items(container)
                    .into_iter()
                    .find(|item| item.rect.contains(client))
                    .map(|item| (container, item.id))
            })
    }

    fn transfer(&mut self, from: Container, id: ItemId) {
        let to = match from {
            Container::VisibleStash if self.visible.contains(&Panel::Inventory) => Container::PlayerInventory,
            Container::PlayerInventory if self.stash_showing() => Container::VisibleStash,
            Container::PlayerInventory
                if self.visible.contains(&Panel::SellWindow) || self.visible.contains(&Panel::TradeWindow) =>
            {
                // Handed over to the other party
                if self.remove_item(from, id) {
                    self.moved += 1;
                    logger::info_p("stub", &format!("item {} offered", id));
                }
                return;
            }
            _ => return,
        };

        let Some(index) = self.list(from).iter().position(|item| item.id == id) else {
            return;
        };
        let (w, h) = (self.list(from)[index].cell.width, self.list(from)[index].cell.height);
        let Some(cell) = self.occupancy(to).first_fit(w, h) else {
            logger::info_p("stub", &format!("no room for item {}", id));
            return;
        };

        let mut item = self.list_mut(from).remove(index);
        logger::info_p("stub", &format!("moved {} to {:?} ({}, {})", item.record.name, to, cell.x, cell.y));
        item.cell = cell;
        self.list_mut(to).push(item);
        self.moved += 1;
    }
}

impl GameState for SimHost {
    fn items(&self, container: Container) -> Vec<ItemHandle> {
        if container == Container::VisibleStash && !self.stash_showing() {
            return Vec::new();
        }
        self.list(container)
            .iter()
            .map(|item| ItemHandle {
                id: item.id,
                rect: self.cell_rect(container, item.cell),
                cell: Some(item.cell),
                record: item.record.clone(),
            })
            .collect()
    }

    fn item_rect(&self, container: Container, id: ItemId) -> Option<Rect> {
        if container == Container::VisibleStash && !self.stash_showing() {
            return None;
        }
        self.list(container)
            .iter()
            .find(|item| item.id == id)
            .map(|item| self.cell_rect(container, item.cell))
    }

    fn is_panel_visible(&self, panel: Panel) -> bool {
        self.visible.contains(&panel)
    }

    fn panel_rect(&self, panel: Panel) -> Option<Rect> {
        if !self.visible.contains(&panel) {
            return None;
        }
        let (container, origin) = match panel {
            Panel::Inventory => (Container::PlayerInventory, INVENTORY_ORIGIN),
            _ => (Container::VisibleStash, STASH_ORIGIN),
        };
        let (w, h) = self.grid_size(container);
        Some(Rect::new(origin.x, origin.y, w as f32 * CELL_PX, h as f32 * CELL_PX))
    }

    fn cursor_position(&self) -> Point {
        self.cursor
    }

    fn pointer_buttons(&self) -> PointerButtons {
        self.buttons
    }

    fn window_offset(&self) -> Point {
        self.window_offset
    }
}

impl InputInjector for SimHost {
    fn key_down(&mut self, key: Key) {
        self.events.push(InputEvent::KeyDown(key));
        self.held_keys.insert(key);
    }

    fn key_up(&mut self, key: Key) {
        self.events.push(InputEvent::KeyUp(key));
        self.held_keys.remove(&key);
    }

    fn move_cursor(&mut self, to: Point) {
        self.events.push(InputEvent::MoveCursor(to));
        self.cursor = to;
    }

    fn pointer_down(&mut self) {
        self.events.push(InputEvent::PointerDown);
        self.press_target = if self.is_key_held(Key::LeftControl) { self.item_under_cursor() } else { None };
    }

    fn pointer_up(&mut self) {
        self.events.push(InputEvent::PointerUp);
        let Some((container, id)) = self.press_target.take() else {
            return;
        };
        if !self.is_key_held(Key::LeftControl) || self.item_under_cursor() != Some((container, id)) {
            return;
        }
        self.clicks += 1;
        self.transfer(container, id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(w: u32, h: u32) -> ItemRecord {
        ItemRecord { name: "Thing".to_string(), width: w, height: h, ..ItemRecord::default() }
    }

    fn ctrl_click(host: &mut SimHost, at: Point) {
        host.key_down(Key::LeftControl);
        host.move_cursor(at);
        host.pointer_down();
        host.pointer_up();
        host.key_up(Key::LeftControl);
    }

    #[test]
    fn test_ctrl_click_moves_stash_item_to_inventory() {
        let mut host = SimHost::new(12, 5);
        let id = host.add_stash_item(3, 3, item(1, 1));
        let rect = host.item_rect(Container::VisibleStash, id).unwrap();

        ctrl_click(&mut host, rect.center());

        assert_eq!(host.clicks(), 1);
        assert_eq!(host.item_count(Container::VisibleStash), 0);
        assert_eq!(host.placements(Container::PlayerInventory), vec![GridPlacement::new(0, 0, 1, 1)]);
    }

    #[test]
    fn test_plain_click_moves_nothing() {
        let mut host = SimHost::new(12, 5);
        let id = host.add_stash_item(0, 0, item(1, 1));
        let rect = host.item_rect(Container::VisibleStash, id).unwrap();

        host.move_cursor(rect.center());
        host.pointer_down();
        host.pointer_up();

        assert_eq!(host.clicks(), 0);
        assert_eq!(host.item_count(Container::VisibleStash), 1);
    }

    #[test]
    fn test_full_inventory_keeps_item_in_stash() {
        let mut host = SimHost::new(1, 1);
        host.add_inventory_item(0, 0, item(1, 1));
        let id = host.add_stash_item(0, 0, item(1, 1));
        let rect = host.item_rect(Container::VisibleStash, id).unwrap();

        ctrl_click(&mut host, rect.center());

        assert_eq!(host.clicks(), 1);
        assert_eq!(host.moved(), 0);
        assert_eq!(host.item_count(Container::VisibleStash), 1);
    }

    #[test]
    fn test_hidden_stash_exposes_no_items() {
        let mut host = SimHost::new(12, 5);
        let id = host.add_stash_item(0, 0, item(1, 1));
        host.hide(Panel::Stash);
        assert!(host.items(Container::VisibleStash).is_empty());
        assert!(host.item_rect(Container::VisibleStash, id).is_none());
        assert!(host.panel_rect(Panel::Stash).is_none());
    }

    #[test]
    fn test_window_offset_is_applied_to_hit_testing() {
        let mut host = SimHost::new(12, 5);
        host.set_window_offset(Point::new(100.0, 50.0));
        let id = host.add_inventory_item(0, 0, item(1, 1));
        let rect = host.item_rect(Container::PlayerInventory, id).unwrap();

        ctrl_click(&mut host, rect.center().offset(Point::new(100.0, 50.0)));

        assert_eq!(host.item_count(Container::PlayerInventory), 0);
        assert_eq!(host.item_count(Container::VisibleStash), 1);
    }

    #[test]
    fn test_random_layout_is_reproducible_and_non_overlapping() {
        let a = SimHost::random(7, 40, 12, 5);
        let b = SimHost::random(7, 40, 12, 5);
        let cells_a: Vec<GridPlacement> = a.cells(Container::VisibleStash).map(|(_, c, _)| c).collect();
        let cells_b: Vec<GridPlacement> = b.cells(Container::VisibleStash).map(|(_, c, _)| c).collect();
        assert_eq!(cells_a, cells_b);

        let total: u32 = cells_a.iter().map(|c| c.area()).sum();
        let occ = Occupancy::from_placements(&cells_a, 12, 12);
        assert_eq!(144 - occ.free_cells() as u32, total);
    }
}
