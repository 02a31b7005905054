use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use stashmover_core::orchestrator::PanelReport;
use stashmover_core::platform::GameState;
use stashmover_core::types::{Container, GridPlacement, ItemId, Panel};

use crate::app::InputMode;
use crate::App;

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = if app.log_visible {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(f.area())
    } else {
        Layout::default()
            .constraints([Constraint::Percentage(100)])
            .split(f.area())
    };

    let (_, stash_h) = app.host.stash_size();
    let (_, inv_h) = app.host.inventory_size();
    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),                   // banner
            Constraint::Length(stash_h as u16 + 4),  // stash grid + info
            Constraint::Length(inv_h as u16 + 4),    // inventory grid + info
            Constraint::Min(0),                      // help
        ])
        .split(chunks[0]);

    draw_banner(f, app, left[0]);
    draw_panel(f, app, Container::VisibleStash, left[1]);
    draw_panel(f, app, Container::PlayerInventory, left[2]);
    draw_help(f, app, left[3]);

    if app.log_visible && chunks.len() > 1 {
        draw_logs(f, app, chunks[1]);
    }

    if let Some(dialog) = &app.confirm {
        dialog.render(f);
    }
}

fn draw_banner(f: &mut Frame, app: &App, area: Rect) {
    let (label, bg) = if app.orch.is_active() {
        (format!("MOVING {} item(s)  (x to cancel)", app.feedback.len()), Color::Yellow)
    } else {
        match app.last_result {
            Some(true) => ("DONE  (f / d to move again)".to_string(), Color::Green),
            Some(false) => ("CANCELLED".to_string(), Color::Red),
            None => ("IDLE  (f / d to move)".to_string(), Color::Cyan),
        }
    };

    // Full-width centered banner
    let width = area.width as usize;
    let pad_total = width.saturating_sub(label.len());
    let pad_left = pad_total / 2;
    let centered = format!("{}{}{}", " ".repeat(pad_left), label, " ".repeat(pad_total - pad_left));
    let banner = Paragraph::new(Line::from(Span::styled(
        centered,
        Style::default().fg(Color::Black).bg(bg).add_modifier(Modifier::BOLD),
    )));
    f.render_widget(banner, area);
}

fn draw_panel(f: &mut Frame, app: &App, container: Container, area: Rect) {
    let (name, panel, report) = match container {
        Container::VisibleStash => ("Stash", Panel::Stash, app.stash.as_ref()),
        Container::PlayerInventory => ("Inventory", Panel::Inventory, app.inventory.as_ref()),
    };
    let open = app.host.is_panel_visible(panel);

    let mut title = format!(" {} ", name);
    if report.is_some_and(|r| r.button.is_some()) {
        title.push_str(if container == Container::VisibleStash { "[F] " } else { "[D] " });
    }
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(if open { Color::Cyan } else { Color::DarkGray }));

    let mut lines = if open {
        grid_lines(app, container, report)
    } else {
        vec![Line::from(Span::styled("closed", Style::default().fg(Color::DarkGray)))]
    };
    lines.extend(info_lines(app, container, report));

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn grid_lines(app: &App, container: Container, report: Option<&PanelReport>) -> Vec<Line<'static>> {
    let (w, h) = match container {
        Container::VisibleStash => app.host.stash_size(),
        Container::PlayerInventory => app.host.inventory_size(),
    };
    let items: Vec<(ItemId, GridPlacement, char)> = app
        .host
        .cells(container)
        .map(|(id, cell, record)| (id, cell, record.name.chars().next().unwrap_or('?')))
        .collect();
    let candidates: &[ItemId] = report.map(|r| r.candidates.as_slice()).unwrap_or(&[]);
    let dim = Style::default().fg(Color::DarkGray);

    (0..h)
        .map(|y| {
            let spans: Vec<Span<'static>> = (0..w)
                .map(|x| {
                    let hit = items.iter().find(|(_, c, _)| {
                        x >= c.x && x < c.x + c.width && y >= c.y && y < c.y + c.height
                    });
                    let Some((id, cell, initial)) = hit else {
                        let ignored = container == Container::PlayerInventory
                            && app.orch.settings().is_cell_ignored(x, y);
                        return Span::styled(if ignored { "x " } else { "· " }, dim);
                    };

                    let rect = app.host.cell_rect(container, *cell);
                    let style = match app.feedback.iter().position(|r| *r == rect) {
                        Some(0) => Style::default().fg(Color::Black).bg(Color::Green),
                        Some(_) => Style::default().fg(Color::Black).bg(Color::Yellow),
                        None if candidates.contains(id) => {
                            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
                        }
                        None => Style::default().fg(Color::Gray),
                    };
                    // Label only the top-left cell of a multi-cell item
                    let text = if x == cell.x && y == cell.y { format!("{} ", initial) } else { "▪ ".to_string() };
                    Span::styled(text, style)
                })
                .collect();
            Line::from(spans)
        })
        .collect()
}

fn info_lines(app: &App, container: Container, report: Option<&PanelReport>) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    if app.mode == InputMode::EditFilter(container) {
        lines.push(Line::from(vec![
            Span::styled("filter> ", Style::default().fg(Color::Yellow)),
            Span::raw(app.filter_input.clone()),
            Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
        ]));
    } else {
        let filter = app.orch.filter(container);
        let count = report.map(|r| r.count_label.clone()).unwrap_or_default();
        let filter_text = if filter.is_empty() { "(default)".to_string() } else { filter.to_string() };
        lines.push(Line::from(vec![
            Span::styled(format!("{:>7} ", count), Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
            Span::styled("filter: ", Style::default().fg(Color::DarkGray)),
            Span::styled(filter_text, Style::default().fg(Color::LightBlue)),
        ]));
    }

    if let Some(err) = report.and_then(|r| r.filter_error.as_ref()) {
        lines.push(Line::from(Span::styled(err.clone(), Style::default().fg(Color::Red))));
    }
    lines
}

fn draw_help(f: &mut Frame, app: &App, area: Rect) {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Yellow));
    let cursor = app.host.cursor_position();
    let lines = vec![
        Line::from(vec![
            key(" f"), Span::raw("/"), key("d"), Span::raw(" hotkeys, "),
            key("F"), Span::raw("/"), key("D"), Span::raw(" buttons, "),
            key("x"), Span::raw(" hold right, "),
            key("s"), Span::raw("/"), key("i"), Span::raw("/"), key("v"), Span::raw(" panels"),
        ]),
        Line::from(vec![
            key(" /"), Span::raw("/"), key("e"), Span::raw(" filters, "),
            key("w"), Span::raw(" save, "),
            key("tab"), Span::raw(" saved, "),
            key("r"), Span::raw(" reshuffle, "),
            key("l"), Span::raw(" log, "),
            key("q"), Span::raw(" quit"),
        ]),
        Line::from(Span::styled(
            format!(
                " cursor {:.0},{:.0}  right {}",
                cursor.x,
                cursor.y,
                if app.right_held() { "held" } else { "up" }
            ),
            Style::default().fg(Color::DarkGray),
        )),
    ];
    f.render_widget(Paragraph::new(lines), area);
}

fn draw_logs(f: &mut Frame, app: &App, area: Rect) {
    let visible_height = area.height.saturating_sub(2) as usize;
    let total = app.log_messages.len();
    let max_scroll = total.saturating_sub(visible_height);
    let scroll = app.log_scroll.min(max_scroll);
    let start = total.saturating_sub(visible_height + scroll);
    let end = total.saturating_sub(scroll);
    let log_lines: Vec<Line> = app.log_messages[start..end].iter().map(|m| parse_log_line(m)).collect();

    let log_panel = Paragraph::new(log_lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Logs ")
                .border_style(Style::default().fg(Color::Yellow)),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(log_panel, area);
}

/// Parse a structured log line (level\x1fprefix\x1fcolor\x1ftimestamp\x1fmessage)
/// into a colored Line for TUI rendering.
fn parse_log_line(raw: &str) -> Line<'_> {
    let parts: Vec<&str> = raw.splitn(5, '\x1f').collect();
    if parts.len() < 5 {
        return Line::from(raw);
    }

    let level = parts[0];
    let prefix = parts[1];
    let color_idx: u8 = parts[2].parse().unwrap_or(0);
    let timestamp = parts[3];
    let message = parts[4];

    let color = match color_idx {
        1 => Color::DarkGray,  // COLOR_GRAY
        2 => Color::LightBlue, // COLOR_BLUE
        3 => Color::Green,     // COLOR_GREEN
        _ => Color::White,
    };

    let mut spans = vec![Span::styled(timestamp, Style::default().fg(Color::DarkGray)), Span::raw(" ")];

    // Level tag only for warn/error
    match level {
        "ERROR" => spans.push(Span::styled("error ", Style::default().fg(Color::Red))),
        "WARN" => spans.push(Span::styled("warn ", Style::default().fg(Color::Yellow))),
        _ => {}
    }

    if !prefix.is_empty() {
        spans.push(Span::styled(prefix, Style::default().fg(color).add_modifier(Modifier::BOLD)));
        spans.push(Span::raw(" "));
    }
    spans.push(Span::styled(message, Style::default().fg(color)));

    Line::from(spans)
}
