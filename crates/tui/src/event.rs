use std::io;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, MouseEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};

use stashmover_core::sleep::{SystemClock, ThreadSleeper};
use stashmover_core::types::{Container, Panel};

use crate::app::InputMode;
use crate::confirm::Choice;
use crate::App;
use crate::ui;

/// Frame period of the driver loop.
const FRAME: Duration = Duration::from_millis(16);

pub fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> anyhow::Result<()> {
    let clock = SystemClock;
    let sleeper = ThreadSleeper;

    loop {
        if app.should_quit {
            return Ok(());
        }

        app.drain_logs();
        app.tick(&clock, &sleeper);
        terminal.draw(|f| ui::draw(f, app))?;

        // The poll timeout doubles as the frame pacing
        if !event::poll(FRAME)? {
            continue;
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(app, key),
            Event::Mouse(mouse) => match mouse.kind {
                MouseEventKind::ScrollUp => app.scroll_log_up(3),
                MouseEventKind::ScrollDown => app.scroll_log_down(3),
                _ => {}
            },
            _ => {}
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if let Some(dialog) = app.confirm.as_mut() {
        match dialog.handle_key(key.code) {
            Some(Choice::Yes) => {
                app.confirm = None;
                app.quit();
            }
            Some(Choice::No) => app.confirm = None,
            None => {}
        }
        return;
    }

    if let InputMode::EditFilter(_) = app.mode {
        match key.code {
            KeyCode::Enter => app.commit_filter_edit(),
            KeyCode::Esc => app.cancel_filter_edit(),
            KeyCode::Backspace => {
                app.filter_input.pop();
            }
            KeyCode::Char(c) => app.filter_input.push(c),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Char('Q') => app.request_quit(),
        KeyCode::Char('f') => app.press_move_to_inventory(),
        KeyCode::Char('d') => app.press_move_to_stash(),
        KeyCode::Char('F') => app.click_button(Container::VisibleStash),
        KeyCode::Char('D') => app.click_button(Container::PlayerInventory),
        KeyCode::Char('x') | KeyCode::Char('X') => app.toggle_right_held(),
        KeyCode::Char('s') | KeyCode::Char('S') => app.toggle_panel(Panel::Stash),
        KeyCode::Char('i') | KeyCode::Char('I') => app.toggle_panel(Panel::Inventory),
        KeyCode::Char('v') | KeyCode::Char('V') => app.toggle_panel(Panel::SellWindow),
        KeyCode::Char('/') => app.begin_filter_edit(Container::VisibleStash),
        KeyCode::Char('e') | KeyCode::Char('E') => app.begin_filter_edit(Container::PlayerInventory),
        KeyCode::Char('w') | KeyCode::Char('W') => app.save_stash_filter(),
        KeyCode::Tab => app.cycle_saved_filter(),
        KeyCode::Char('r') | KeyCode::Char('R') => app.reseed(seed_from_time()),
        KeyCode::Char('l') | KeyCode::Char('L') => app.toggle_log(),
        KeyCode::PageUp => app.scroll_log_up(10),
        KeyCode::PageDown => app.scroll_log_down(10),
        _ => {}
    }
}

fn seed_from_time() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos() as u64).unwrap_or(0)
}
