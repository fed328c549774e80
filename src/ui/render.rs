//! Render functions for the TUI.
//!
//! The feed fills the screen above a one-line status bar; dialogs are drawn
//! on top in a fixed order.

use crate::app::App;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    widgets::Paragraph,
    Frame,
};

use super::{help, overlay, reels, status};

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 40;
pub(super) const MIN_HEIGHT: u16 = 10;

/// Main render dispatch function.
pub(super) fn render(f: &mut Frame, app: &mut App) {
    let area = f.area();
    app.dialog_area = None;

    if area.width < 1 || area.height < 1 {
        return;
    }

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
                MIN_WIDTH, MIN_HEIGHT, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    reels::render(f, app, chunks[0]);
    status::render(f, app, chunks[1]);

    if app.login_visible() {
        overlay::render_auth(f, app);
    }
    if app.reel_form.is_some() {
        overlay::render_reel_form(f, app);
    }
    if app.pending_confirm.is_some() {
        overlay::render_confirm(f, app);
    }
    if app.show_help {
        help::render(f, app);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Reel, ReelsClient, ReelsPage};
    use crate::config::Config;
    use crate::keybindings::KeybindingRegistry;
    use crate::session::FeedSession;
    use crate::viewer::{NullBackend, PlaybackController};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use ratatui::{backend::TestBackend, Terminal};
    use std::time::Duration;

    fn app() -> App {
        let client = ReelsClient::new("http://localhost:5000", Duration::from_secs(5)).unwrap();
        let playback = PlaybackController::new(Box::new(NullBackend), true);
        let session = FeedSession::new(
            client.base_url().clone(),
            playback,
            StdRng::seed_from_u64(5),
        );
        App::new(session, client, Config::default(), KeybindingRegistry::new())
    }

    fn screen(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_loading_then_cards() {
        let mut app = app();
        app.session.start();
        let mut terminal = Terminal::new(TestBackend::new(60, 20)).unwrap();
        terminal.draw(|f| render(f, &mut app)).unwrap();
        assert!(screen(&terminal).contains("Loading reels..."));

        app.session.load_feed();
        app.session.apply_feed(Ok(ReelsPage {
            reels: vec![Reel {
                id: 1,
                url: "/uploads/1.mp4".into(),
                title: Some("Only reel".into()),
                description: None,
                created_at: None,
            }],
            user: None,
        }));
        terminal.draw(|f| render(f, &mut app)).unwrap();
        let text = screen(&terminal);
        assert!(text.contains("Only reel"));
        assert!(text.contains("1/1"));
        assert_eq!(app.feed_area.height, 19);
        assert_eq!(app.session.viewport().height(), 19 * reels::ROW_PX);
    }

    #[test]
    fn test_error_and_empty_states() {
        let mut app = app();
        let mut terminal = Terminal::new(TestBackend::new(60, 20)).unwrap();

        app.session.apply_feed(Ok(ReelsPage {
            reels: vec![],
            user: None,
        }));
        terminal.draw(|f| render(f, &mut app)).unwrap();
        assert!(screen(&terminal).contains("No reels yet"));

        app.session
            .apply_feed(Err(crate::api::ApiError::HttpStatus(500)));
        terminal.draw(|f| render(f, &mut app)).unwrap();
        assert!(screen(&terminal).contains("Error loading reels: HTTP error! status: 500"));
    }

    #[test]
    fn test_login_overlay_sets_dialog_area() {
        let mut app = app();
        app.session.show_login();
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| render(f, &mut app)).unwrap();
        assert!(app.dialog_area.is_some());
        assert!(screen(&terminal).contains("Register"));

        app.session.close_login();
        terminal.draw(|f| render(f, &mut app)).unwrap();
        assert!(app.dialog_area.is_none());
    }

    #[test]
    fn test_too_small_terminal() {
        let mut app = app();
        let mut terminal = Terminal::new(TestBackend::new(30, 6)).unwrap();
        terminal.draw(|f| render(f, &mut app)).unwrap();
        assert!(screen(&terminal).contains("Terminal too small"));
    }
}
