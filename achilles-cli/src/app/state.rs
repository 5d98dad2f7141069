use achilles_core::{ScanPhase, ScanProgress, UsageAggregate, UsageRow};

/// Number of diagnostics shown under the table
pub const VISIBLE_MESSAGES: usize = 10;

/// Application mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    /// Watching the scan / browsing the table
    Monitoring,
    /// Showing help overlay
    Help,
}

/// Application state, refreshed from the scan aggregate on every tick
pub struct AppState {
    /// Current mode
    pub mode: AppMode,
    /// Last observed scan phase
    pub phase: ScanPhase,
    /// Last observed progress counters
    pub progress: ScanProgress,
    /// Ranked usage rows
    pub rows: Vec<UsageRow>,
    /// Most recent diagnostics
    pub messages: Vec<String>,
    /// Diagnostics dropped from the bounded log
    pub evicted_messages: u64,
    /// Selected row
    pub selected_index: usize,
    /// First row shown
    pub scroll_offset: usize,
    /// Visible table height (set by UI)
    pub visible_height: usize,
    /// Whether app should quit
    pub should_quit: bool,
    /// Spinner frame for animation
    pub spinner_frame: usize,
    /// Set once the final table has been built
    pub finalized: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            mode: AppMode::Monitoring,
            phase: ScanPhase::Searching,
            progress: ScanProgress::default(),
            rows: Vec::new(),
            messages: Vec::new(),
            evicted_messages: 0,
            selected_index: 0,
            scroll_offset: 0,
            visible_height: 20,
            should_quit: false,
            spinner_frame: 0,
            finalized: false,
        }
    }

    /// Pull a fresh snapshot from the aggregate. The table is no longer
    /// rebuilt once finalized.
    pub fn refresh(&mut self, aggregate: &UsageAggregate) {
        self.phase = aggregate.phase();
        self.progress = aggregate.progress();
        self.messages = aggregate.recent_messages(VISIBLE_MESSAGES);
        self.evicted_messages = aggregate.evicted_messages();
        if !self.finalized {
            self.set_rows(aggregate.ranked());
        }
    }

    /// Build the final table; only the first call has an effect
    pub fn finalize(&mut self, aggregate: &UsageAggregate) {
        if self.finalized {
            return;
        }
        self.refresh(aggregate);
        self.finalized = true;
    }

    fn set_rows(&mut self, rows: Vec<UsageRow>) {
        self.rows = rows;
        if self.selected_index >= self.rows.len() {
            self.selected_index = self.rows.len().saturating_sub(1);
        }
        Self::ensure_visible_for(
            &mut self.selected_index,
            &mut self.scroll_offset,
            self.visible_height,
        );
    }

    /// Advance spinner animation
    pub fn tick_spinner(&mut self) {
        self.spinner_frame = (self.spinner_frame + 1) % 10;
    }

    /// Ensure the given index is visible within the scroll viewport
    fn ensure_visible_for(selected: &mut usize, scroll: &mut usize, visible_height: usize) {
        if *selected < *scroll {
            *scroll = *selected;
        } else if *selected >= *scroll + visible_height {
            *scroll = *selected + 1 - visible_height.max(1);
        }
    }

    fn select(&mut self, index: usize) {
        self.selected_index = index.min(self.rows.len().saturating_sub(1));
        Self::ensure_visible_for(
            &mut self.selected_index,
            &mut self.scroll_offset,
            self.visible_height,
        );
    }

    pub fn move_up(&mut self) {
        self.select(self.selected_index.saturating_sub(1));
    }

    pub fn move_down(&mut self) {
        self.select(self.selected_index + 1);
    }

    pub fn page_up(&mut self) {
        let page_size = self.visible_height.saturating_sub(2).max(1);
        self.select(self.selected_index.saturating_sub(page_size));
    }

    pub fn page_down(&mut self) {
        let page_size = self.visible_height.saturating_sub(2).max(1);
        self.select(self.selected_index + page_size);
    }

    pub fn go_to_first(&mut self) {
        self.select(0);
    }

    pub fn go_to_last(&mut self) {
        self.select(self.rows.len().saturating_sub(1));
    }

    pub fn show_help(&mut self) {
        self.mode = AppMode::Help;
    }

    pub fn hide_help(&mut self) {
        self.mode = AppMode::Monitoring;
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn aggregate_with(libs: &[(&str, u64)]) -> UsageAggregate {
        let aggregate = UsageAggregate::default();
        for (lib, uses) in libs {
            for _ in 0..*uses {
                aggregate.record_dependency(PathBuf::from(lib));
            }
        }
        aggregate
    }

    #[test]
    fn test_refresh_pulls_ranked_rows() {
        let aggregate = aggregate_with(&[("/lib/a.so", 1), ("/lib/b.so", 3)]);
        let mut state = AppState::new();
        state.refresh(&aggregate);

        assert_eq!(state.rows.len(), 2);
        assert_eq!(state.rows[0].library, PathBuf::from("/lib/b.so"));
        assert_eq!(state.progress.edges, 4);
        assert_eq!(state.phase, ScanPhase::Searching);
    }

    #[test]
    fn test_finalize_freezes_table() {
        let aggregate = aggregate_with(&[("/lib/a.so", 1)]);
        let mut state = AppState::new();
        state.finalize(&aggregate);
        assert!(state.finalized);

        aggregate.record_dependency(PathBuf::from("/lib/late.so"));
        state.finalize(&aggregate);
        state.refresh(&aggregate);
        assert_eq!(state.rows.len(), 1);
    }

    #[test]
    fn test_navigation_is_clamped() {
        let aggregate = aggregate_with(&[("/lib/a.so", 3), ("/lib/b.so", 2), ("/lib/c.so", 1)]);
        let mut state = AppState::new();
        state.visible_height = 2;
        state.refresh(&aggregate);

        state.move_up();
        assert_eq!(state.selected_index, 0);

        state.go_to_last();
        assert_eq!(state.selected_index, 2);
        assert_eq!(state.scroll_offset, 1);

        state.move_down();
        assert_eq!(state.selected_index, 2);

        state.page_up();
        assert_eq!(state.selected_index, 1);

        state.go_to_first();
        assert_eq!(state.selected_index, 0);
        assert_eq!(state.scroll_offset, 0);
    }

    #[test]
    fn test_navigation_on_empty_table() {
        let mut state = AppState::new();
        state.move_down();
        state.page_down();
        state.go_to_last();
        assert_eq!(state.selected_index, 0);
    }
}
