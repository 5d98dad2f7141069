use ratatui::layout::{Constraint, Direction, Layout, Rect};

use crate::app::state::VISIBLE_MESSAGES;

/// Main application layout
pub struct AppLayout {
    pub header: Rect,
    pub progress: Rect,
    pub table: Rect,
    pub messages: Rect,
    pub footer: Rect,
}

impl AppLayout {
    /// `message_count` is the number of diagnostics to make room for
    pub fn new(area: Rect, message_count: usize) -> Self {
        let message_height = if message_count == 0 {
            0
        } else {
            // Borders plus one line per message
            message_count.min(VISIBLE_MESSAGES) as u16 + 2
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),              // Header
                Constraint::Length(1),              // Progress line
                Constraint::Min(5),                 // Usage table
                Constraint::Length(message_height), // Diagnostics
                Constraint::Length(1),              // Footer
            ])
            .split(area);

        Self {
            header: chunks[0],
            progress: chunks[1],
            table: chunks[2],
            messages: chunks[3],
            footer: chunks[4],
        }
    }
}
