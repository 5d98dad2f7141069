use achilles_core::{UsageRow, format_count};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    widgets::Widget,
};

use super::bar_chart::render_bar;
use super::theme::Theme;

/// Shorten `path` to at most `max` characters, keeping the tail
pub fn truncate_left(path: &str, max: usize) -> String {
    let len = path.chars().count();
    if len <= max {
        return path.to_string();
    }
    if max <= 3 {
        return ".".repeat(max);
    }
    let tail: String = path.chars().skip(len - (max - 3)).collect();
    format!("...{tail}")
}

/// Ranked library table: `#`, library, share bar, uses, percent
pub struct UsageTable<'a> {
    rows: &'a [UsageRow],
    selected_index: usize,
    scroll_offset: usize,
    theme: &'a Theme,
}

impl<'a> UsageTable<'a> {
    pub fn new(
        rows: &'a [UsageRow],
        selected_index: usize,
        scroll_offset: usize,
        theme: &'a Theme,
    ) -> Self {
        Self {
            rows,
            selected_index,
            scroll_offset,
            theme,
        }
    }
}

impl Widget for UsageTable<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height < 2 || area.width < 50 {
            return;
        }

        // Column widths
        let rank_width: usize = 6;
        let bar_width: usize = 16;
        let uses_width: usize = 10;
        let pct_width: usize = 7;
        let path_width =
            area.width as usize - rank_width - bar_width - uses_width - pct_width - 4;

        let right_x = area.x + area.width - (bar_width + uses_width + pct_width) as u16 - 1;

        let heading_style = Style::default()
            .fg(self.theme.fg_muted)
            .add_modifier(Modifier::BOLD);
        buf.set_string(area.x + 1, area.y, format!("{:>4}", "#"), heading_style);
        buf.set_string(area.x + 1 + rank_width as u16, area.y, "Library", heading_style);
        buf.set_string(
            right_x + bar_width as u16,
            area.y,
            format!("{:>9}", "Uses"),
            heading_style,
        );
        buf.set_string(
            right_x + (bar_width + uses_width) as u16,
            area.y,
            format!("{:>6}", "%"),
            heading_style,
        );

        let body = Rect::new(area.x, area.y + 1, area.width, area.height - 1);

        if self.rows.is_empty() {
            let msg = "No shared libraries observed yet";
            let x = body.x + (body.width.saturating_sub(msg.len() as u16)) / 2;
            let y = body.y + body.height / 2;
            buf.set_string(x, y, msg, Style::default().fg(self.theme.fg_dim));
            return;
        }

        for (i, row) in self
            .rows
            .iter()
            .skip(self.scroll_offset)
            .take(body.height as usize)
            .enumerate()
        {
            let y = body.y + i as u16;
            let is_cursor = i + self.scroll_offset == self.selected_index;

            let row_style = if is_cursor {
                Style::default()
                    .bg(self.theme.selection_bg)
                    .fg(self.theme.selection_fg)
            } else {
                Style::default().fg(self.theme.fg)
            };

            // Clear the row
            for x in 0..body.width {
                buf.set_string(body.x + x, y, " ", row_style);
            }

            let muted = |color| {
                if is_cursor {
                    row_style
                } else {
                    Style::default().fg(color)
                }
            };

            buf.set_string(
                body.x + 1,
                y,
                format!("{:>4}", row.rank),
                muted(self.theme.fg_muted),
            );

            let library = row.library.to_string_lossy();
            buf.set_string(
                body.x + 1 + rank_width as u16,
                y,
                truncate_left(&library, path_width),
                row_style,
            );

            let bar_color = if is_cursor {
                self.theme.selection_fg
            } else {
                self.theme.share_color(row.percent)
            };
            // Scale the bar against the busiest library so the top row is full
            let top = self.rows[0].percent.max(f64::EPSILON);
            let bar = render_bar(row.percent / top * 100.0, bar_width - 1);
            buf.set_string(right_x, y, &bar, muted(bar_color));

            buf.set_string(
                right_x + bar_width as u16,
                y,
                format!("{:>9}", format_count(row.uses)),
                muted(self.theme.fg_dim),
            );
            buf.set_string(
                right_x + (bar_width + uses_width) as u16,
                y,
                format!("{:>5.1}%", row.percent),
                muted(self.theme.fg_dim),
            );
        }
    }
}
