pub mod stub;

use crate::types::*;

/// Read-only view of the host application, valid for the current tick.
pub trait GameState {
    /// Items currently in `container`. An unavailable container yields nothing.
    fn items(&self, container: Container) -> Vec<ItemHandle>;

    /// Current screen rectangle of one item, or `None` if it is gone.
    fn item_rect(&self, container: Container, id: ItemId) -> Option<Rect>;

    fn is_panel_visible(&self, panel: Panel) -> bool;

    /// Screen rectangle of the item grid inside `panel`, if it is showing.
    fn panel_rect(&self, panel: Panel) -> Option<Rect>;

    /// Pointer position in screen coordinates.
    fn cursor_position(&self) -> Point;

    fn pointer_buttons(&self) -> PointerButtons;

    /// Offset of the client area on screen; add it to client rects before clicking.
    fn window_offset(&self) -> Point {
        Point::default()
    }

    /// Grid cells occupied in `container`.
    fn placements(&self, container: Container) -> Vec<GridPlacement> {
        self.items(container).iter().filter_map(|item| item.cell).collect()
    }
}

/// Fire-and-forget input synthesis. Waiting for the host to register an
/// event is the caller's job.
pub trait InputInjector {
    fn key_down(&mut self, key: Key);
    fn key_up(&mut self, key: Key);
    fn move_cursor(&mut self, to: Point);
    fn pointer_down(&mut self);
    fn pointer_up(&mut self);
}

/// Everything a running transfer needs from the outside world.
pub trait Host: GameState + InputInjector {}

impl<T: GameState + InputInjector> Host for T {}
