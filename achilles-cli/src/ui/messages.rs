use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    widgets::{Block, Borders, Widget},
};

use super::theme::Theme;

/// Bordered list of the most recent scan diagnostics
pub struct MessagesView<'a> {
    messages: &'a [String],
    evicted: u64,
    theme: &'a Theme,
}

impl<'a> MessagesView<'a> {
    pub fn new(messages: &'a [String], evicted: u64, theme: &'a Theme) -> Self {
        Self {
            messages,
            evicted,
            theme,
        }
    }
}

impl Widget for MessagesView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.messages.is_empty() || area.height < 3 {
            return;
        }

        let title = if self.evicted > 0 {
            format!(" Messages ({} older dropped) ", self.evicted)
        } else {
            " Messages ".to_string()
        };
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.border))
            .title_style(Style::default().fg(self.theme.red));

        let inner = block.inner(area);
        block.render(area, buf);

        for (i, message) in self.messages.iter().take(inner.height as usize).enumerate() {
            buf.set_stringn(
                inner.x + 1,
                inner.y + i as u16,
                message,
                inner.width.saturating_sub(2) as usize,
                Style::default().fg(self.theme.fg_dim),
            );
        }
    }
}
