//! PodTUI - terminal podcast player
//!
//! # Usage
//!
//! ```bash
//! # Launch interactive TUI
//! podtui
//!
//! # CLI mode (for scripting)
//! podtui search "history"
//! podtui episodes https://example.com/feed.xml --json
//! ```

use std::io::{stdout, Stdout};
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;

use podtui::app::{App, AppEvent};
use podtui::cli::{Cli, Command, ExitCode, Output};
use podtui::commands;
use podtui::config::Config;
use podtui::dispatch::Dispatcher;
use podtui::logging;
use podtui::playback::PlaybackEngine;

/// Terminal type alias for convenience
type Tui = Terminal<CrosstermBackend<Stdout>>;

// The audio output stream is not Send, so the UI loop stays on the main
// task; one worker thread serves the network tasks.
#[tokio::main(flavor = "multi_thread", worker_threads = 1)]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load_from(cli.config.as_deref());

    if cli.is_cli_mode() {
        let exit_code = run_cli(cli, &config).await;
        std::process::exit(exit_code.into());
    }

    let _log_guard = match logging::init_logging(&config.log_dir()) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: file logging disabled: {}", e);
            None
        }
    };

    run_tui(&config).await
}

/// Run CLI command and return exit code
async fn run_cli(cli: Cli, config: &Config) -> ExitCode {
    let output = Output::new(&cli);

    match cli.command {
        Some(Command::Search(cmd)) => commands::search_cmd(cmd, config, &output).await,
        Some(Command::Episodes(cmd)) => commands::episodes_cmd(cmd, config, &output).await,
        None => ExitCode::Success,
    }
}

// =============================================================================
// TUI Mode
// =============================================================================

fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

async fn run_tui(config: &Config) -> Result<()> {
    tracing::info!(directory = %config.directory_url, "starting TUI");

    let mut terminal = init_terminal()?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut dispatcher = Dispatcher::from_config(config, tx);
    let mut app = App::new(PlaybackEngine::rodio());

    let result = run_event_loop(&mut terminal, &mut app, &mut dispatcher, &mut rx, config.tick_rate()).await;

    // Sessions release audio and temp files even when the loop failed
    if app.running {
        app.quit();
    }
    dispatcher.abort_all();

    restore_terminal(&mut terminal)?;
    tracing::info!("TUI exited");

    result
}

/// Main event loop - input, background results, timer, then dispatch
async fn run_event_loop(
    terminal: &mut Tui,
    app: &mut App,
    dispatcher: &mut Dispatcher,
    events: &mut mpsc::UnboundedReceiver<AppEvent>,
    tick_rate: Duration,
) -> Result<()> {
    let mut last_tick = Instant::now();

    while app.running {
        terminal.draw(|frame| podtui::ui::render(frame, app))?;

        // Short poll keeps background results flowing between key presses
        let timeout = tick_rate
            .saturating_sub(last_tick.elapsed())
            .min(Duration::from_millis(50));
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        while let Ok(event) = events.try_recv() {
            app.handle_event(event);
        }

        if last_tick.elapsed() >= tick_rate {
            app.tick();
            last_tick = Instant::now();
        }

        for request in app.take_requests() {
            tracing::debug!(?request, "dispatching");
            dispatcher.dispatch(request);
        }

        // Let spawned tasks make progress on the runtime
        tokio::task::yield_now().await;
    }

    Ok(())
}
