use achilles_core::{ScanPhase, format_count};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    widgets::Widget,
};

use crate::app::AppState;

use super::progress::spinner;
use super::theme::Theme;

/// Header widget showing title, phase and totals
pub struct Header<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> Header<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }
}

impl Widget for Header<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < 20 || area.height < 1 {
            return;
        }

        let title_style = Style::default()
            .fg(self.theme.blue)
            .add_modifier(Modifier::BOLD);
        buf.set_string(area.x + 1, area.y, "ACHILLES", title_style);
        buf.set_string(
            area.x + 10,
            area.y,
            "─",
            Style::default().fg(self.theme.border),
        );

        let (phase_text, phase_color) = match self.state.phase {
            ScanPhase::Searching => (
                format!("{} Searching...", spinner(self.state.spinner_frame)),
                self.theme.yellow,
            ),
            ScanPhase::Scanning => (
                format!("{} Scanning", spinner(self.state.spinner_frame)),
                self.theme.yellow,
            ),
            ScanPhase::Done => ("Done".to_string(), self.theme.green),
        };
        buf.set_string(area.x + 12, area.y, &phase_text, Style::default().fg(phase_color));

        let progress = &self.state.progress;
        let status = format!(
            "{} libraries, {} links",
            format_count(progress.libraries_observed),
            format_count(progress.edges)
        );
        let status_x = (area.x + area.width).saturating_sub(status.len() as u16 + 2);
        if status_x > area.x + 12 + phase_text.chars().count() as u16 {
            buf.set_string(status_x, area.y, &status, Style::default().fg(self.theme.fg_dim));
        }
    }
}
