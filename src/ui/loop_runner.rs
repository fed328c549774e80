//! Main event loop for the TUI.
//!
//! Multiplexes terminal input, background task results, a fast tick that
//! drives the session's timers, and Unix signals.

use crate::app::{App, AppEvent};
use anyhow::Result;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

use super::events::handle_app_event;
use super::helpers::spawn_effects;
use super::input::{handle_input, handle_mouse};
use super::render::render;

/// Tick period; fine enough for a smooth 300 ms scroll animation.
const TICK: Duration = Duration::from_millis(50);

/// Result of handling a key press event.
pub enum Action {
    /// Continue the event loop and process more events.
    Continue,
    /// Exit the application and restore the terminal.
    Quit,
}

/// Runs the TUI application event loop.
///
/// Uses `tokio::select!` over:
/// - **Terminal input**: keys, mouse and resizes from crossterm's event stream
/// - **Background tasks**: API results via the `AppEvent` channel
/// - **Periodic tick**: advances the session clock (settle timers, snapping,
///   scroll animation, delayed unmute)
///
/// Installs a panic hook that restores terminal state before unwinding.
pub async fn run(
    app: &mut App,
    event_tx: mpsc::Sender<AppEvent>,
    mut event_rx: mpsc::Receiver<AppEvent>,
) -> Result<()> {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), DisableMouseCapture, LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let mut terminal = setup_terminal()?;
    let mut event_stream = crossterm::event::EventStream::new();
    let mut tick_interval = tokio::time::interval(TICK);
    let started = Instant::now();

    #[cfg(unix)]
    let mut sigterm = signal(SignalKind::terminate())?;
    #[cfg(unix)]
    let mut sigint = signal(SignalKind::interrupt())?;

    app.session.start();

    loop {
        // Run whatever the last step queued before drawing the result.
        app.drain_notices();
        spawn_effects(app, &event_tx);

        if app.needs_redraw {
            terminal.draw(|f| render(f, app))?;
            app.needs_redraw = false;
        }

        if app.clear_expired_status() {
            app.needs_redraw = true;
        }

        while let Ok(event) = event_rx.try_recv() {
            app.needs_redraw = true;
            handle_app_event(app, event);
        }

        #[cfg(unix)]
        let sigterm_fut = sigterm.recv();
        #[cfg(not(unix))]
        let sigterm_fut = std::future::pending::<Option<()>>();

        #[cfg(unix)]
        let sigint_fut = sigint.recv();
        #[cfg(not(unix))]
        let sigint_fut = std::future::pending::<Option<()>>();

        tokio::select! {
            biased;

            _ = sigterm_fut => {
                tracing::info!("Received SIGTERM, shutting down gracefully");
                break;
            }

            _ = sigint_fut => {
                tracing::info!("Received SIGINT, shutting down gracefully");
                break;
            }

            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind != KeyEventKind::Release => {
                        app.needs_redraw = true;
                        match handle_input(app, key.code, key.modifiers) {
                            Ok(Action::Quit) => break,
                            Ok(Action::Continue) => {}
                            Err(e) => app.set_status(format!("Error: {e:#}")),
                        }
                    }
                    Some(Ok(Event::Mouse(mouse))) => {
                        app.needs_redraw = true;
                        handle_mouse(app, mouse);
                    }
                    Some(Ok(Event::Resize(_, _))) => app.needs_redraw = true,
                    Some(Err(e)) => tracing::warn!(error = %e, "Terminal event error"),
                    None => break,
                    _ => {}
                }
            }

            Some(event) = event_rx.recv() => {
                app.needs_redraw = true;
                handle_app_event(app, event);
            }

            _ = tick_interval.tick() => {
                handle_tick(app, started.elapsed());
            }
        }
    }

    app.session.shutdown();
    restore_terminal(terminal)?;
    Ok(())
}

/// Advance the session clock; redraw only when something on screen moved.
fn handle_tick(app: &mut App, now: Duration) {
    let before = (
        app.session.viewport().scroll_top(),
        app.session.navigation(),
        app.session.feed().len(),
        app.session.playback().playing().collect::<Vec<_>>(),
    );
    app.session.tick(now);
    let after = (
        app.session.viewport().scroll_top(),
        app.session.navigation(),
        app.session.feed().len(),
        app.session.playback().playing().collect::<Vec<_>>(),
    );
    if before != after {
        app.needs_redraw = true;
    }
}

/// Set up the terminal for TUI rendering.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore terminal to normal state.
fn restore_terminal(mut terminal: Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableMouseCapture, LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
