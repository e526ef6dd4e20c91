//! Carousel stage: projects card transforms onto terminal cells.
//!
//! The engine works in px.  A terminal cell is treated as
//! [`CELL_WIDTH_PX`] × [`CELL_HEIGHT_PX`]; depth offset shifts a card along
//! a diagonal and scales it, so the front card sits lowest, rightmost and
//! largest.  Cards are drawn back to front; hit-testing walks front to back.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::Span,
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Widget, Wrap},
};

use crate::core::carousel::{CardData, CarouselController};
use crate::core::sink::{CardTransform, RecordingSink};

use super::layout::point_in_rect;
use super::theme::Theme;

pub const CELL_WIDTH_PX: f64 = 8.0;
pub const CELL_HEIGHT_PX: f64 = 16.0;

/// Horizontal / vertical cell shift per slot of depth.
const SLOT_SHIFT_COLS: f64 = 4.0;
const SLOT_SHIFT_ROWS: f64 = 0.8;

// ───────────────────────────────────────── geometry ──────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageGeometry {
    pub count: usize,
    pub spacing: f64,
    pub box_half_length: f64,
    pub card_width: f64,
    pub card_height: f64,
}

impl StageGeometry {
    pub fn from_carousel(carousel: &CarouselController) -> Self {
        let scroll = carousel.scroll();
        let config = carousel.config();
        Self {
            count: carousel.cards().len(),
            spacing: scroll.spacing,
            box_half_length: scroll.box_half_length,
            card_width: config.width,
            card_height: config.height,
        }
    }

    /// 0 at the back slot, 1 at the front slot.
    pub fn depth(&self, offset: f64) -> f64 {
        let back = self.box_half_length - self.count as f64 * self.spacing;
        let span = (self.count.saturating_sub(1) as f64 * self.spacing).max(f64::EPSILON);
        ((offset - back) / span).clamp(0.0, 1.0)
    }
}

/// Screen rectangle for one card, clipped to `area`.
pub fn card_rect(area: Rect, geom: &StageGeometry, t: &CardTransform) -> Option<Rect> {
    if area.width == 0 || area.height == 0 || !t.offset.is_finite() {
        return None;
    }
    let scale = 0.6 + 0.4 * geom.depth(t.offset);
    let w = (geom.card_width / CELL_WIDTH_PX * scale)
        .round()
        .clamp(6.0, f64::from(area.width));
    let h = (geom.card_height / CELL_HEIGHT_PX * scale)
        .round()
        .clamp(3.0, f64::from(area.height));

    let slots = t.offset / geom.spacing;
    let cx = f64::from(area.x) + f64::from(area.width) / 2.0 + slots * SLOT_SHIFT_COLS;
    let cy = f64::from(area.y) + f64::from(area.height) / 2.0 + slots * SLOT_SHIFT_ROWS
        - t.lift / CELL_HEIGHT_PX;

    let left = (cx - w / 2.0).round() as i32;
    let top = (cy - h / 2.0).round() as i32;
    let x0 = left.max(i32::from(area.x));
    let y0 = top.max(i32::from(area.y));
    let x1 = (left + w as i32).min(i32::from(area.x) + i32::from(area.width));
    let y1 = (top + h as i32).min(i32::from(area.y) + i32::from(area.height));
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some(Rect::new(x0 as u16, y0 as u16, (x1 - x0) as u16, (y1 - y0) as u16))
}

/// One visible card placed on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedCard {
    pub index: usize,
    pub rect: Rect,
    pub transform: CardTransform,
}

/// Visible cards, back to front.
pub fn layout_cards(area: Rect, geom: &StageGeometry, sink: &RecordingSink) -> Vec<PlacedCard> {
    let mut placed: Vec<PlacedCard> = (0..geom.count)
        .filter_map(|index| {
            let transform = *sink.card(index)?;
            if !transform.visible {
                return None;
            }
            let rect = card_rect(area, geom, &transform)?;
            Some(PlacedCard {
                index,
                rect,
                transform,
            })
        })
        .collect();
    placed.sort_by(|a, b| {
        a.transform
            .offset
            .total_cmp(&b.transform.offset)
            .then_with(|| a.transform.active.cmp(&b.transform.active))
    });
    placed
}

/// Topmost interactive card under the cell `(col, row)`.
pub fn hit_test(
    area: Rect,
    geom: &StageGeometry,
    sink: &RecordingSink,
    col: u16,
    row: u16,
) -> Option<usize> {
    layout_cards(area, geom, sink)
        .iter()
        .rev()
        .find(|p| p.transform.interactive && point_in_rect(p.rect, col, row))
        .map(|p| p.index)
}

/// Pointer position in engine px, relative to the stage origin.
pub fn cell_to_px(area: Rect, col: u16, row: u16) -> (f64, f64) {
    (
        (f64::from(col) - f64::from(area.x) + 0.5) * CELL_WIDTH_PX,
        (f64::from(row) - f64::from(area.y) + 0.5) * CELL_HEIGHT_PX,
    )
}

// ───────────────────────────────────────── widget ────────────

pub struct CarouselWidget<'a> {
    cards: &'a [CardData],
    sink: &'a RecordingSink,
    geom: StageGeometry,
    block: Option<Block<'a>>,
}

impl<'a> CarouselWidget<'a> {
    pub fn new(cards: &'a [CardData], sink: &'a RecordingSink, geom: StageGeometry) -> Self {
        Self {
            cards,
            sink,
            geom,
            block: None,
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }
}

impl Widget for CarouselWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = match self.block {
            Some(block) => {
                let inner = block.inner(area);
                block.render(area, buf);
                inner
            }
            None => area,
        };

        if self.cards.is_empty() {
            Paragraph::new("no cards")
                .style(Theme::separator_style())
                .centered()
                .render(inner, buf);
            return;
        }

        for placed in layout_cards(inner, &self.geom, self.sink) {
            let Some(card) = self.cards.get(placed.index) else {
                continue;
            };
            let (style, border) = if placed.transform.active {
                (Theme::active_card_style(), BorderType::Thick)
            } else {
                (
                    Theme::card_depth_style(self.geom.depth(placed.transform.offset)),
                    BorderType::Rounded,
                )
            };
            Clear.render(placed.rect, buf);
            let block = Block::default()
                .borders(Borders::ALL)
                .border_type(border)
                .border_style(style)
                .title(Span::styled(format!(" {} ", card.id), Theme::card_title_style()));
            let body = block.inner(placed.rect);
            block.render(placed.rect, buf);
            Paragraph::new(card.thumbnail.as_str())
                .style(style)
                .wrap(Wrap { trim: true })
                .render(body, buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::carousel::CarouselConfig;
    use crate::core::sink::RenderSink;

    fn geometry() -> StageGeometry {
        StageGeometry {
            count: 5,
            spacing: 50.0,
            box_half_length: 150.0,
            card_width: 220.0,
            card_height: 140.0,
        }
    }

    fn transform(offset: f64) -> CardTransform {
        CardTransform {
            offset,
            lift: 0.0,
            visible: true,
            interactive: true,
            active: false,
            transition_sec: 0.3,
        }
    }

    const AREA: Rect = Rect {
        x: 0,
        y: 0,
        width: 120,
        height: 40,
    };

    #[test]
    fn depth_spans_back_to_front() {
        let g = geometry();
        assert_eq!(g.depth(100.0), 1.0);
        assert_eq!(g.depth(-100.0), 0.0);
        assert_eq!(g.depth(0.0), 0.5);
        assert_eq!(g.depth(-500.0), 0.0);
    }

    #[test]
    fn front_card_is_larger_and_lower() {
        let g = geometry();
        let front = card_rect(AREA, &g, &transform(100.0)).unwrap();
        let back = card_rect(AREA, &g, &transform(-100.0)).unwrap();
        assert!(front.width > back.width);
        assert!(front.y > back.y);
        assert!(front.x > back.x);
    }

    #[test]
    fn lift_moves_card_up() {
        let g = geometry();
        let resting = card_rect(AREA, &g, &transform(0.0)).unwrap();
        let mut lifted = transform(0.0);
        lifted.lift = 42.0;
        let lifted = card_rect(AREA, &g, &lifted).unwrap();
        assert!(lifted.y < resting.y);
    }

    #[test]
    fn hit_test_prefers_front_and_skips_masked() {
        let g = geometry();
        let mut sink = RecordingSink::new();
        sink.set_card_transform(0, &transform(100.0));
        sink.set_card_transform(1, &transform(50.0));
        let front = card_rect(AREA, &g, &transform(100.0)).unwrap();
        let back = card_rect(AREA, &g, &transform(50.0)).unwrap();
        // A cell covered by both rectangles.
        let col = front.x.max(back.x);
        let row = front.y.max(back.y);
        assert!(point_in_rect(back, col, row));
        assert_eq!(hit_test(AREA, &g, &sink, col, row), Some(0));

        let mut masked = transform(100.0);
        masked.visible = false;
        masked.interactive = false;
        sink.set_card_transform(0, &masked);
        assert_eq!(hit_test(AREA, &g, &sink, col, row), Some(1));
        assert_eq!(layout_cards(AREA, &g, &sink).len(), 1);
    }

    #[test]
    fn mounted_carousel_renders_every_card() {
        let mut sink = RecordingSink::new();
        let cards: Vec<CardData> = (0..5)
            .map(|i| CardData::new(format!("card-{i}"), "thumb"))
            .collect();
        let carousel = CarouselController::mount(&mut sink, cards, CarouselConfig::default());
        let g = StageGeometry::from_carousel(&carousel);
        assert_eq!(g.box_half_length, 150.0);
        let placed = layout_cards(AREA, &g, &sink);
        assert_eq!(placed.len(), 5);
        assert_eq!(placed.last().map(|p| p.index), carousel.front_card());

        let mut buf = Buffer::empty(AREA);
        CarouselWidget::new(carousel.cards(), &sink, g).render(AREA, &mut buf);
    }

    #[test]
    fn cell_to_px_is_relative_to_stage() {
        let area = Rect::new(10, 5, 20, 10);
        assert_eq!(cell_to_px(area, 10, 5), (4.0, 8.0));
        assert_eq!(cell_to_px(area, 12, 6), (20.0, 24.0));
    }
}
