mod app;
mod tui;
mod ui;

use std::fs;
use std::io::{self, stdout};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use achilles_core::{
    LddResolver, ScanConfig, ScanMessage, Scanner, UsageAggregate, format_count, format_percent,
};
use clap::Parser;
use color_eyre::{Result, eyre::WrapErr};
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend, style::Style, widgets::Widget};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use app::{Action, AppMode, AppState};
use tui::{AppEvent, EventHandler, handle_key};
use ui::{AppLayout, Footer, Header, HelpView, MessagesView, ProgressView, Theme, UsageTable};

/// ACHILLES - Which shared libraries does this system lean on the most?
#[derive(Parser, Debug)]
#[command(name = "achilles")]
#[command(about = "Ranks shared libraries by how many binaries and libraries link against them")]
#[command(version)]
struct Args {
    /// Library root to search (repeatable, replaces the defaults)
    #[arg(long = "lib-dir", value_name = "DIR")]
    lib_dirs: Vec<PathBuf>,

    /// Binary root to search (repeatable, replaces the defaults)
    #[arg(long = "bin-dir", value_name = "DIR")]
    bin_dirs: Vec<PathBuf>,

    /// Number of resolver workers (0 = one per CPU)
    #[arg(short, long, default_value_t = 0)]
    workers: usize,

    /// Threads per directory walker (0 = one per CPU)
    #[arg(long, default_value_t = 0)]
    walk_threads: usize,

    /// Print the ranking to stdout instead of running the interactive monitor
    #[arg(long)]
    plain: bool,

    /// Rows to print in plain mode
    #[arg(long, default_value_t = 25)]
    top: usize,

    /// Log file for the interactive monitor
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn scan_config(&self) -> ScanConfig {
        let mut config = ScanConfig {
            workers: self.workers,
            walk_threads: self.walk_threads,
            ..ScanConfig::default()
        };
        if !self.lib_dirs.is_empty() {
            config.library_roots = self.lib_dirs.clone();
        }
        if !self.bin_dirs.is_empty() {
            config.binary_roots = self.bin_dirs.clone();
        }
        config
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    let _guard = init_tracing(&args)?;

    let resolver = LddResolver::new().wrap_err("cannot resolve dependencies")?;
    tracing::info!(ldd = %resolver.program().display(), "using resolver");
    let scanner = Scanner::new(args.scan_config(), Arc::new(resolver));

    if args.plain {
        return run_plain(scanner, args.top);
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, scanner);

    // Restore terminal
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;

    result
}

/// Logs go to stderr in plain mode and to a file otherwise, so the
/// alternate screen is never written over.
fn init_tracing(args: &Args) -> Result<Option<WorkerGuard>> {
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if args.plain {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
        return Ok(None);
    }

    let log_path = match &args.log_file {
        Some(path) => path.clone(),
        None => match dirs::cache_dir() {
            Some(dir) => dir.join("achilles").join("achilles.log"),
            // Nowhere sensible to write; stay silent rather than corrupt the screen
            None => return Ok(None),
        },
    };
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)
            .wrap_err_with(|| format!("cannot create log directory {}", parent.display()))?;
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .wrap_err_with(|| format!("cannot open log file {}", log_path.display()))?;

    let (writer, guard) = tracing_appender::non_blocking(file);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(Some(guard))
}

fn run_plain(scanner: Scanner, top: usize) -> Result<()> {
    let aggregate = scanner.run();
    let rows = aggregate.ranked();

    println!("{:>5}  {:>9}  {:>6}  Library", "#", "Uses", "%");
    for row in rows.iter().take(top) {
        println!(
            "{:>5}  {:>9}  {:>6}  {}",
            row.rank,
            format_count(row.uses),
            format_percent(row.percent),
            row.library.display()
        );
    }

    let progress = aggregate.progress();
    println!();
    println!(
        "{} libraries and {} binaries scanned, {} distinct libraries, {} links",
        format_count(progress.libraries_resolved),
        format_count(progress.binaries_resolved),
        format_count(progress.libraries_observed),
        format_count(progress.edges),
    );
    for message in aggregate.recent_messages(app::state::VISIBLE_MESSAGES) {
        eprintln!("warning: {message}");
    }
    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    scanner: Scanner,
) -> Result<()> {
    let theme = Theme::default();
    let mut state = AppState::new();
    let event_handler = EventHandler::new(Duration::from_millis(100));

    let aggregate: Arc<UsageAggregate> = scanner.aggregate();
    let (scan_rx, scan_handle) = scanner.scan();
    let mut scan_handle: Option<JoinHandle<Arc<UsageAggregate>>> = Some(scan_handle);

    state.refresh(&aggregate);

    loop {
        while let Ok(msg) = scan_rx.try_recv() {
            match msg {
                ScanMessage::Phase(phase) => {
                    tracing::debug!(%phase, "monitor observed phase");
                }
                ScanMessage::Completed => {
                    if let Some(handle) = scan_handle.take()
                        && handle.join().is_err()
                    {
                        tracing::error!("scan thread panicked");
                    }
                    state.finalize(&aggregate);
                }
            }
        }

        terminal.draw(|frame| {
            let area = frame.area();
            let layout = AppLayout::new(area, state.messages.len());

            frame
                .buffer_mut()
                .set_style(area, Style::default().bg(theme.bg));

            // Heading row is not part of the scroll viewport
            state.visible_height = layout.table.height.saturating_sub(1).max(1) as usize;

            Header::new(&state, &theme).render(layout.header, frame.buffer_mut());
            ProgressView::new(&state.progress, state.finalized, &theme)
                .render(layout.progress, frame.buffer_mut());
            UsageTable::new(
                &state.rows,
                state.selected_index,
                state.scroll_offset,
                &theme,
            )
            .render(layout.table, frame.buffer_mut());
            MessagesView::new(&state.messages, state.evicted_messages, &theme)
                .render(layout.messages, frame.buffer_mut());
            Footer::new(state.mode, state.phase, &theme).render(layout.footer, frame.buffer_mut());

            if state.mode == AppMode::Help {
                HelpView::new(&theme).render(area, frame.buffer_mut());
            }
        })?;

        match event_handler.next()? {
            AppEvent::Key(key) => {
                let action = handle_key(key, state.mode);
                handle_action(&mut state, action);
            }
            AppEvent::Resize => {
                // Terminal will redraw on next loop
            }
            AppEvent::Tick => {
                state.tick_spinner();
                state.refresh(&aggregate);
            }
        }

        if state.should_quit {
            break;
        }
    }

    // Scan threads are not cancellable; they die with the process.
    if scan_handle.is_some() {
        tracing::info!("quit before the scan completed");
    }

    Ok(())
}

fn handle_action(state: &mut AppState, action: Action) {
    match action {
        Action::MoveUp => state.move_up(),
        Action::MoveDown => state.move_down(),
        Action::PageUp => state.page_up(),
        Action::PageDown => state.page_down(),
        Action::GoToFirst => state.go_to_first(),
        Action::GoToLast => state.go_to_last(),
        Action::ShowHelp => state.show_help(),
        Action::HideHelp => state.hide_help(),
        Action::Quit => state.quit(),
        Action::Tick => {}
    }
}
