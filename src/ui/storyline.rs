//! Storyline panel: the typed title, an optional rule, then the body.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Paragraph, Widget, Wrap},
};

use super::theme::Theme;

pub struct StorylineWidget<'a> {
    text: &'a str,
    separator: bool,
    caret: bool,
    block: Option<Block<'a>>,
}

impl<'a> StorylineWidget<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            separator: false,
            caret: false,
            block: None,
        }
    }

    /// Draw a rule in place of the blank line between title and body.
    pub fn separator(mut self, visible: bool) -> Self {
        self.separator = visible;
        self
    }

    /// Show a caret after the last typed character.
    pub fn caret(mut self, visible: bool) -> Self {
        self.caret = visible;
        self
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }
}

impl Widget for StorylineWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = match self.block {
            Some(block) => {
                let inner = block.inner(area);
                block.render(area, buf);
                inner
            }
            None => area,
        };

        let (title, body) = match self.text.split_once("\n\n") {
            Some((title, body)) => (title, Some(body)),
            None => (self.text, None),
        };

        let mut lines: Vec<Line> = title
            .split('\n')
            .map(|l| Line::from(Span::styled(l, Theme::storyline_title_style())))
            .collect();
        if let Some(body) = body {
            if self.separator {
                lines.push(Line::from(Span::styled(
                    "─".repeat(usize::from(inner.width)),
                    Theme::separator_style(),
                )));
            } else {
                lines.push(Line::raw(""));
            }
            lines.extend(
                body.split('\n')
                    .map(|l| Line::from(Span::styled(l, Theme::storyline_body_style()))),
            );
        }
        if self.caret {
            if let Some(last) = lines.last_mut() {
                last.push_span(Span::styled("▌", Theme::separator_style()));
            }
        }

        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .render(inner, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width).map(|x| buf[(x, y)].symbol()).collect()
    }

    #[test]
    fn rule_replaces_blank_line_once_visible() {
        let area = Rect::new(0, 0, 6, 3);
        let mut buf = Buffer::empty(area);
        StorylineWidget::new("AB\n\nCD")
            .separator(true)
            .render(area, &mut buf);
        assert_eq!(row(&buf, 0), "AB    ");
        assert_eq!(row(&buf, 1), "──────");
        assert_eq!(row(&buf, 2), "CD    ");

        let mut buf = Buffer::empty(area);
        StorylineWidget::new("AB\n\nCD").render(area, &mut buf);
        assert_eq!(row(&buf, 1), "      ");
    }

    #[test]
    fn caret_follows_text() {
        let area = Rect::new(0, 0, 6, 1);
        let mut buf = Buffer::empty(area);
        StorylineWidget::new("HEL").caret(true).render(area, &mut buf);
        assert_eq!(row(&buf, 0), "HEL▌  ");
    }
}
