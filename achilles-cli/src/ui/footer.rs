use achilles_core::ScanPhase;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    widgets::Widget,
};

use crate::app::AppMode;

use super::theme::Theme;

/// Footer widget showing keyboard hints and scan status
pub struct Footer<'a> {
    mode: AppMode,
    phase: ScanPhase,
    theme: &'a Theme,
}

impl<'a> Footer<'a> {
    pub fn new(mode: AppMode, phase: ScanPhase, theme: &'a Theme) -> Self {
        Self { mode, phase, theme }
    }
}

impl Widget for Footer<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < 20 || area.height < 1 {
            return;
        }

        let hints: &[(&str, &str)] = match self.mode {
            AppMode::Monitoring => &[
                ("↑↓", "Navigate"),
                ("PgUp/PgDn", "Page"),
                ("g/G", "First/Last"),
                ("?", "Help"),
                ("q", "Quit"),
            ],
            AppMode::Help => &[("Esc", "Close help"), ("Ctrl+C", "Quit")],
        };

        let key_style = Style::default()
            .fg(self.theme.fg)
            .add_modifier(Modifier::BOLD);
        let desc_style = Style::default().fg(self.theme.fg_dim);
        let sep_style = Style::default().fg(self.theme.border);

        let mut x = area.x + 1;
        for (i, (key, desc)) in hints.iter().enumerate() {
            buf.set_string(x, area.y, *key, key_style);
            x += key.chars().count() as u16 + 1;

            buf.set_string(x, area.y, *desc, desc_style);
            x += desc.len() as u16;

            if i < hints.len() - 1 {
                buf.set_string(x, area.y, "  │  ", sep_style);
                x += 5;
            }

            if x >= area.x + area.width - 5 {
                break;
            }
        }

        let status = self.phase.label();
        let color = if self.phase == ScanPhase::Done {
            self.theme.green
        } else {
            self.theme.yellow
        };
        let status_x = area.x + area.width - status.len() as u16 - 1;
        if status_x > x + 2 {
            buf.set_string(
                status_x,
                area.y,
                status,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_line(phase: ScanPhase) -> String {
        let theme = Theme::default();
        let area = Rect::new(0, 0, 120, 1);
        let mut buf = Buffer::empty(area);
        Footer::new(AppMode::Monitoring, phase, &theme).render(area, &mut buf);
        (0..area.width)
            .map(|x| buf[(x, 0)].symbol().to_string())
            .collect()
    }

    #[test]
    fn test_status_follows_phase() {
        let searching = render_line(ScanPhase::Searching);
        assert!(searching.trim_end().ends_with("Searching"));
        assert!(!searching.contains("Scanning"));

        assert!(render_line(ScanPhase::Scanning).trim_end().ends_with("Scanning"));
        assert!(render_line(ScanPhase::Done).trim_end().ends_with("Done"));
    }
}
