//! Help overlay: current bindings, interactive rebinding and reset.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Widget},
};

use crate::config::{Action, AppConfig};
use crate::core::carousel::InputMode;

/// Selectable rows: one per action plus "Reset to defaults".
pub fn help_item_count() -> usize {
    Action::ALL.len() + 1
}

pub struct HelpPopup<'a> {
    pub config: &'a AppConfig,
    pub selected: usize,
    pub awaiting_rebind: bool,
    pub mode: InputMode,
}

fn row_style(selected: bool) -> Style {
    if selected {
        Style::default()
            .fg(Color::White)
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    }
}

impl Widget for HelpPopup<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // actions + blank + reset + blank + mode line + hint + 2 borders + top blank
        let height = (Action::ALL.len() as u16) + 8;
        let popup = centered_fixed(54, height, area);
        Clear.render(popup, buf);

        let block = Block::default()
            .title(" Controls ")
            .title_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::DarkGray));

        let inner = block.inner(popup);
        block.render(popup, buf);

        let dim = Style::default().fg(Color::DarkGray);
        let mut lines = vec![Line::raw("")];

        for (i, &action) in Action::ALL.iter().enumerate() {
            let is_selected = i == self.selected;
            let prefix = if is_selected { " ▸ " } else { "   " };
            let rebinding = is_selected && self.awaiting_rebind;

            let keys_display = if rebinding {
                "Press a key…".to_string()
            } else {
                self.config.display_bindings(action)
            };
            let mut key_style = Style::default().fg(Color::Yellow);
            if is_selected {
                key_style = key_style.bg(Color::DarkGray);
            }
            if rebinding {
                key_style = key_style.add_modifier(Modifier::BOLD);
            }

            let label_col = format!("{prefix}{:<22}", action.label());
            let keys_width = (inner.width as usize)
                .saturating_sub(label_col.chars().count())
                .max(1);
            lines.push(Line::from(vec![
                Span::styled(label_col, row_style(is_selected)),
                Span::styled(format!("{keys_display:>keys_width$}"), key_style),
            ]));
        }

        let reset_selected = self.selected == Action::ALL.len();
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            format!(
                "{}⟳ Reset to defaults",
                if reset_selected { " ▸ " } else { "   " }
            ),
            row_style(reset_selected),
        )));

        lines.push(Line::raw(""));
        let mode = match self.mode {
            InputMode::Desktop => "desktop (hover previews, click opens)",
            InputMode::Touch => "touch (tap previews, tap again opens)",
        };
        lines.push(Line::from(Span::styled(format!("  Mode: {mode}"), dim)));
        lines.push(Line::from(Span::styled(
            "  Enter: add key  Del: clear  Esc: close",
            dim,
        )));

        Paragraph::new(lines).render(inner, buf);
    }
}

/// Create a centered rectangle with fixed dimensions, clamped to the available area.
fn centered_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(w)) / 2;
    let y = area.y + (area.height.saturating_sub(h)) / 2;
    Rect::new(x, y, w, h)
}
