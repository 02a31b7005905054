use crossterm::event::KeyCode;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Yes,
    No,
}

/// Yes/No modal. Starts on No so a stray Enter never confirms.
pub struct ConfirmDialog {
    pub message: String,
    pub selected: Choice,
}

impl ConfirmDialog {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), selected: Choice::No }
    }

    pub fn toggle(&mut self) {
        self.selected = match self.selected {
            Choice::Yes => Choice::No,
            Choice::No => Choice::Yes,
        };
    }

    /// Returns the decision once the user makes one.
    pub fn handle_key(&mut self, code: KeyCode) -> Option<Choice> {
        match code {
            KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::Char('h') | KeyCode::Char('l') => {
                self.toggle();
                None
            }
            KeyCode::Enter => Some(self.selected),
            KeyCode::Char('y') | KeyCode::Char('Y') => Some(Choice::Yes),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => Some(Choice::No),
            _ => None,
        }
    }

    pub fn render(&self, f: &mut Frame) {
        let width = (self.message.len() as u16 + 6).max(30);
        let area = centered_rect(width, 7, f.area());
        f.render_widget(Clear, area);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Confirm ");
        let inner = block.inner(area);
        f.render_widget(block, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // top padding
                Constraint::Length(1), // message
                Constraint::Length(1), // spacing
                Constraint::Length(1), // buttons
            ])
            .split(inner);

        let msg = Paragraph::new(Line::from(Span::styled(&self.message, Style::default().fg(Color::White))))
            .alignment(Alignment::Center);
        f.render_widget(msg, rows[1]);

        let style_for = |choice: Choice, bg: Color| {
            if self.selected == choice {
                Style::default().fg(Color::Black).bg(bg).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            }
        };
        let buttons = Line::from(vec![
            Span::styled("  [Yes]  ", style_for(Choice::Yes, Color::Green)),
            Span::raw("   "),
            Span::styled("  [No]  ", style_for(Choice::No, Color::Red)),
        ]);
        f.render_widget(Paragraph::new(buttons).alignment(Alignment::Center), rows[3]);
    }
}

/// Return a centered `Rect` of `width` columns and `height` rows inside `area`.
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_no() {
        let mut d = ConfirmDialog::new("quit?");
        assert_eq!(d.handle_key(KeyCode::Enter), Some(Choice::No));
    }

    #[test]
    fn test_toggle_then_confirm() {
        let mut d = ConfirmDialog::new("quit?");
        assert_eq!(d.handle_key(KeyCode::Right), None);
        assert_eq!(d.handle_key(KeyCode::Enter), Some(Choice::Yes));
        assert_eq!(d.handle_key(KeyCode::Esc), Some(Choice::No));
    }
}
