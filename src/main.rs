use std::io;
use std::path::PathBuf;
use std::sync::mpsc;

use anyhow::Result;
use crossterm::{
    execute,
    event::{EnableMouseCapture, DisableMouseCapture},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{Terminal, backend::CrosstermBackend};

use stashmover_core::orchestrator::Orchestrator;
use stashmover_core::platform::stub::SimHost;
use stashmover_core::{logger, settings::Settings};

/// Items scattered over the demo stash.
const DEMO_ITEMS: usize = 40;

fn main() -> Result<()> {
    // --seed N picks a reproducible demo stash
    let args: Vec<String> = std::env::args().collect();
    let seed = args
        .iter()
        .position(|a| a == "--seed")
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
        .unwrap_or(1);

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    logger::init(&cwd.join("logs"))?;
    logger::register_prefix("transfer", logger::COLOR_GREEN);
    logger::register_prefix("orchestrator", logger::COLOR_BLUE);
    logger::register_prefix("filter", logger::COLOR_BLUE);
    logger::register_prefix("stub", logger::COLOR_GRAY);

    let settings_path = cwd.join("settings.json");
    let settings = Settings::load(&settings_path);
    let host = SimHost::random(seed, DEMO_ITEMS, settings.grid_width, settings.grid_height);
    let orch = Orchestrator::new(settings)?;

    // Wire logger to TUI
    let (log_tx, log_rx) = mpsc::channel::<String>();
    logger::set_tui_sender(log_tx);
    logger::info(&format!("stashmover started, seed {}", seed));

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // The filter engine is single-threaded, so the orchestrator ticks inside the TUI loop
    let mut app = stashmover_tui::App::new(host, orch, log_rx, settings_path);
    let result = stashmover_tui::event::run(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    result
}
