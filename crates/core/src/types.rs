use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Stable identifier the host assigns to an item for the lifetime of a run.
pub type ItemId = u64;

/// Screen-space point in client pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, by: Point) -> Self {
        Self { x: self.x + by.x, y: self.y + by.y }
    }
}

/// Screen-space rectangle (top-left origin)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    pub fn top_left(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn bottom_right(&self) -> Point {
        Point::new(self.x + self.w, self.y + self.h)
    }

    /// Half-open containment: the right and bottom edges are outside.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.y >= self.y && p.x < self.x + self.w && p.y < self.y + self.h
    }
}

/// Cell rectangle of an item inside a container grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridPlacement {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl GridPlacement {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn area(&self) -> u32 {
        self.width * self.height
    }
}

/// Filterable facts about one item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemRecord {
    pub name: String,
    pub base_name: String,
    pub class: String,
    pub rarity: String,
    pub item_level: u32,
    pub stack_size: Option<u32>,
    pub width: u32,
    pub height: u32,
    pub highlighted: bool,
}

/// Read-only reference to an item as the host reported it at selection time.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemHandle {
    pub id: ItemId,
    pub rect: Rect,
    pub cell: Option<GridPlacement>,
    pub record: ItemRecord,
}

impl ItemHandle {
    /// Horizontal-then-vertical ordering key. Grid cells win over pixels when present.
    pub fn sort_key(&self) -> (f32, f32) {
        match self.cell {
            Some(cell) => (cell.x as f32, cell.y as f32),
            None => (self.rect.x, self.rect.y),
        }
    }
}

/// Item snapshot sorted once when a run is triggered and never re-sorted.
#[derive(Debug, Clone, Default)]
pub struct OrderedItemList {
    items: Vec<ItemHandle>,
}

impl OrderedItemList {
    pub fn new(mut items: Vec<ItemHandle>) -> Self {
        items.sort_by(|a, b| {
            let (ax, ay) = a.sort_key();
            let (bx, by) = b.sort_key();
            match ax.total_cmp(&bx) {
                Ordering::Equal => ay.total_cmp(&by),
                other => other,
            }
        });
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ItemHandle> {
        self.items.get(index)
    }

    pub fn as_slice(&self) -> &[ItemHandle] {
        &self.items
    }
}

/// Item containers the host exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Container {
    PlayerInventory,
    VisibleStash,
}

/// UI panels whose visibility gates a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Panel {
    Inventory,
    Stash,
    GuildStash,
    SellWindow,
    TradeWindow,
}

/// Keys the sequencer holds while clicking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    LeftControl,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PointerButtons {
    pub left: bool,
    pub right: bool,
}

/// Which way a run moves items
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    StashToInventory,
    InventoryToStash,
}

impl Direction {
    pub fn source(self) -> Container {
        match self {
            Direction::StashToInventory => Container::VisibleStash,
            Direction::InventoryToStash => Container::PlayerInventory,
        }
    }

    pub fn destination(self) -> Container {
        match self {
            Direction::StashToInventory => Container::PlayerInventory,
            Direction::InventoryToStash => Container::VisibleStash,
        }
    }

    /// Only the player inventory is a fixed, grid-bounded destination.
    pub fn destination_is_grid_bounded(self) -> bool {
        self.destination() == Container::PlayerInventory
    }
}
