use achilles_core::{ScanProgress, format_count};
use ratatui::{buffer::Buffer, layout::Rect, style::Style, widgets::Widget};

use super::bar_chart::render_bar;
use super::theme::Theme;

/// Braille spinner characters
const SPINNER: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

pub fn spinner(frame: usize) -> char {
    SPINNER[frame % SPINNER.len()]
}

/// Scan counters as shown next to the gauge, e.g.
/// `12 / 40 libs  3 / 9 bins  (49 tot)`
pub fn progress_summary(progress: &ScanProgress) -> String {
    format!(
        "{} / {} libs  {} / {} bins  ({} tot)",
        format_count(progress.libraries_resolved),
        format_count(progress.libraries_discovered),
        format_count(progress.binaries_resolved),
        format_count(progress.binaries_discovered),
        format_count(progress.total_discovered()),
    )
}

/// Single-line gauge plus counters
pub struct ProgressView<'a> {
    progress: &'a ScanProgress,
    done: bool,
    theme: &'a Theme,
}

impl<'a> ProgressView<'a> {
    pub fn new(progress: &'a ScanProgress, done: bool, theme: &'a Theme) -> Self {
        Self {
            progress,
            done,
            theme,
        }
    }
}

impl Widget for ProgressView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < 20 || area.height < 1 {
            return;
        }

        // The denominator keeps growing until walkers finish, so this is approximate
        let fraction = if self.done {
            1.0
        } else {
            self.progress.fraction()
        };

        let bar_width = (area.width as usize / 3).min(40);
        let bar = render_bar(fraction * 100.0, bar_width);
        buf.set_string(area.x + 1, area.y, &bar, Style::default().fg(self.theme.green));

        let label = format!(
            " {:>5.1}%  Scanned  {}",
            fraction * 100.0,
            progress_summary(self.progress)
        );
        buf.set_stringn(
            area.x + 1 + bar_width as u16,
            area.y,
            &label,
            area.width.saturating_sub(bar_width as u16 + 2) as usize,
            Style::default().fg(self.theme.fg_muted),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_summary() {
        let progress = ScanProgress {
            libraries_discovered: 1200,
            libraries_resolved: 300,
            binaries_discovered: 5,
            binaries_resolved: 5,
            ..Default::default()
        };
        assert_eq!(
            progress_summary(&progress),
            "300 / 1,200 libs  5 / 5 bins  (1,205 tot)"
        );
    }

    #[test]
    fn test_spinner_wraps() {
        assert_eq!(spinner(0), spinner(10));
    }
}
