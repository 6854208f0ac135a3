// Forbid accidental stdout/stderr writes in the *library* portion of the TUI.
// The terminal is in raw mode while the overlay runs; anything printed would corrupt the screen.
#![deny(clippy::print_stdout, clippy::print_stderr)]

use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::time::Duration;

use ratatui::layout::Constraint;
use ratatui::layout::Layout;
use ratatui::widgets::Paragraph;
use tokio::sync::broadcast;
use tracing_appender::non_blocking;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

mod ansi_escape;
mod cli;
pub mod config;
pub mod conversation;
pub mod editor;
pub mod error;
mod history_cell;
pub mod history_pane;
pub mod key_hint;
mod line_truncation;
pub mod mouse;
mod render;
pub mod split_pane;
pub mod style;
pub mod tui;
mod wrapping;

pub use cli::Cli;
pub use config::OverlayConfig;
pub use conversation::ConversationEntry;
pub use conversation::load_session;
pub use editor::Editor;
pub use editor::EditorEvent;
pub use editor::TextEditor;
pub use history_pane::HistoryOptions;
pub use history_pane::HistoryPane;
pub use render::line_utils::line_to_plain_string;
pub use split_pane::Focus;
pub use split_pane::SplitPane;
pub use style::Theme;
pub use tui::FrameRequester;

const LOG_FILE_NAME: &str = "history-split.log";

/// How often the host polls for a terminal resize; resizes do not arrive on stdin.
const RESIZE_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Run the overlay and return the text the caller should put back into its editor.
pub async fn run_main(cli: Cli) -> anyhow::Result<String> {
    let mut config = OverlayConfig::load(cli.config.as_deref())?;
    config.apply_cli(&cli);

    let log_dir = config.log_dir();
    std::fs::create_dir_all(&log_dir)?;
    let _log_guard = init_logging(&log_dir)?;

    let entries = load_session(&cli.session)?;
    tracing::info!(
        session = %cli.session.display(),
        entries = entries.len(),
        "opening history overlay"
    );

    run_overlay(&cli, &config, &entries)
        .await
        .map_err(|err| anyhow::anyhow!("{err:?}"))
}

fn init_logging(log_dir: &Path) -> io::Result<WorkerGuard> {
    let mut log_file_opts = OpenOptions::new();
    log_file_opts.create(true).append(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        log_file_opts.mode(0o600);
    }

    let log_file = log_file_opts.open(log_dir.join(LOG_FILE_NAME))?;
    let (non_blocking, guard) = non_blocking(log_file);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("history_split_tui=info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_target(true)
        .with_ansi(false)
        .with_filter(env_filter);

    let _ = tracing_subscriber::registry().with(file_layer).try_init();
    Ok(guard)
}

async fn run_overlay(
    cli: &Cli,
    config: &OverlayConfig,
    entries: &[ConversationEntry],
) -> color_eyre::Result<String> {
    color_eyre::install()?;

    // Report panics to the log, then fall through to color-eyre's handler.
    let prev_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        tracing::error!("panic: {info}");
        prev_hook(info);
    }));

    let mut terminal = tui::init()?;
    terminal.clear()?;
    let result = event_loop(&mut terminal, cli, config, entries).await;
    tui::restore()?;
    result
}

async fn event_loop(
    terminal: &mut tui::Terminal,
    cli: &Cli,
    config: &OverlayConfig,
    entries: &[ConversationEntry],
) -> color_eyre::Result<String> {
    let (draw_tx, mut draw_rx) = broadcast::channel(16);
    let frame_requester = FrameRequester::new(draw_tx);

    let theme = Theme::named(config.theme);
    let history = HistoryPane::new(entries, config.history_options(), frame_requester.clone());
    let editor = TextEditor::new(cli.draft.as_deref().unwrap_or_default());
    let (mut pane, mut done_rx) = if config.mouse {
        SplitPane::with_mouse_reporting(
            history,
            editor,
            theme,
            frame_requester.clone(),
            Box::new(io::stdout()),
        )?
    } else {
        SplitPane::new(history, editor, theme, frame_requester.clone())
    };

    let mut input_rx = tui::spawn_input_reader();
    let mut resize_poll = tokio::time::interval(RESIZE_POLL_INTERVAL);
    let mut last_size = crossterm::terminal::size()?;
    frame_requester.schedule_frame();

    loop {
        tokio::select! {
            text = &mut done_rx => {
                return Ok(text?);
            }
            chunk = input_rx.recv() => {
                let Some(chunk) = chunk else {
                    tracing::info!("stdin closed; keeping the current draft");
                    return Ok(pane.editor().text());
                };
                pane.handle_input(&chunk);
                frame_requester.schedule_frame();
            }
            draw = draw_rx.recv() => {
                match draw {
                    Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {
                        draw_frame(terminal, &mut pane)?;
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        return Ok(pane.editor().text());
                    }
                }
            }
            _ = resize_poll.tick() => {
                let size = crossterm::terminal::size()?;
                if size != last_size {
                    tracing::debug!(cols = size.0, rows = size.1, "terminal resized");
                    last_size = size;
                    frame_requester.schedule_frame();
                }
            }
        }
    }
}

fn draw_frame<E: Editor>(terminal: &mut tui::Terminal, pane: &mut SplitPane<E>) -> io::Result<()> {
    let (_, rows) = crossterm::terminal::size()?;
    pane.set_terminal_rows(rows);
    terminal.draw(|frame| {
        let area = frame.area();
        let [body, status] =
            Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(area);
        frame.render_widget(Paragraph::new(pane.render(area.width)), body);
        frame.render_widget(Paragraph::new(pane.status_line()), status);
    })?;
    Ok(())
}
