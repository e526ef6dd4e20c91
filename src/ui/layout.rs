//! Layout helpers: split the terminal area into regions.

use ratatui::layout::{Constraint, Direction, Layout, Margin, Rect};

/// Height of the storyline panel, borders included.
const STORYLINE_HEIGHT: u16 = 9;

/// Primary screen layout: header label, carousel stage, storyline panel and
/// a bottom status bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppLayout {
    pub header_area: Rect,
    pub stage_area: Rect,
    /// Inside the stage border; cards are placed and hit-tested here.
    pub cards_area: Rect,
    pub storyline_area: Rect,
    pub status_area: Rect,
}

impl AppLayout {
    pub fn from_area(area: Rect) -> Self {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),                // header label
                Constraint::Min(8),                   // carousel stage
                Constraint::Length(STORYLINE_HEIGHT), // storyline
                Constraint::Length(1),                // status bar
            ])
            .split(area);

        Self {
            header_area: chunks[0],
            stage_area: chunks[1],
            cards_area: chunks[1].inner(Margin::new(1, 1)),
            storyline_area: chunks[2],
            status_area: chunks[3],
        }
    }
}

/// Is the cell `(col, row)` inside `area`?
pub fn point_in_rect(area: Rect, col: u16, row: u16) -> bool {
    col >= area.x && col < area.x + area.width && row >= area.y && row < area.y + area.height
}
