//! Input handling for the TUI.
//!
//! Dialogs (help, confirmation, text forms) capture every key while open and
//! read key codes directly. The feed itself goes through the keybinding
//! registry so users can remap it.

use crate::app::{App, ConfirmAction, Form, FormKind};
use crate::keybindings::{Action as KbAction, Context as KbContext};
use crate::session::AuthTab;
use crate::viewer::NavIntent;
use anyhow::{Context as _, Result};
use crossterm::event::{KeyCode, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

use super::helpers::contains;
use super::reels::ROW_PX;
use super::Action;

/// Rows scrolled per mouse wheel notch.
const WHEEL_ROWS: u64 = 3;

/// Main input dispatch function.
///
/// Every key press counts as a user interaction for the autoplay policy,
/// even when a dialog swallows it.
pub(super) fn handle_input(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> Result<Action> {
    app.session.on_user_interaction();

    if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
        return Ok(Action::Quit);
    }

    if app.show_help {
        return Ok(handle_help_input(app, code));
    }

    if app.pending_confirm.is_some() {
        return Ok(handle_confirm_input(app, code));
    }

    if app.reel_form.is_some() {
        return Ok(handle_reel_form_input(app, code));
    }

    if app.login_visible() {
        return Ok(handle_auth_input(app, code));
    }

    handle_feed_input(app, code, modifiers)
}

/// Handle input while the help overlay is visible.
///
/// Captures all keys: j/k/Up/Down scroll, Esc/q/? dismiss.
fn handle_help_input(app: &mut App, code: KeyCode) -> Action {
    match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => {
            app.show_help = false;
            app.help_scroll_offset = 0;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.help_scroll_offset = app.help_scroll_offset.saturating_add(1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.help_scroll_offset = app.help_scroll_offset.saturating_sub(1);
        }
        _ => {}
    }
    Action::Continue
}

/// Handle input while the confirmation dialog is visible.
///
/// y/Y confirms the action, n/N/Esc cancels.
fn handle_confirm_input(app: &mut App, code: KeyCode) -> Action {
    match code {
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            if let Some(ConfirmAction::DeleteReel { reel_id, title }) = app.pending_confirm.take() {
                tracing::info!(reel_id, "Deleting reel");
                app.set_status(format!("Deleting {title}..."));
                app.session.delete_reel(reel_id);
            }
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            app.pending_confirm = None;
            app.set_status("Cancelled");
        }
        _ => {}
    }
    Action::Continue
}

/// What a key did to a focused form.
enum FormInput {
    Edited,
    Submit,
    Cancel,
}

fn edit_form(form: &mut Form, code: KeyCode) -> FormInput {
    match code {
        KeyCode::Esc => return FormInput::Cancel,
        KeyCode::Enter => return FormInput::Submit,
        KeyCode::Tab | KeyCode::Down => form.focus_next(),
        KeyCode::BackTab | KeyCode::Up => form.focus_prev(),
        KeyCode::Backspace => form.backspace(),
        KeyCode::Char(c) => form.push_char(c),
        _ => {}
    }
    FormInput::Edited
}

fn handle_reel_form_input(app: &mut App, code: KeyCode) -> Action {
    let Some(form) = app.reel_form.as_mut() else {
        return Action::Continue;
    };
    match edit_form(form, code) {
        FormInput::Edited => {}
        FormInput::Cancel => app.reel_form = None,
        FormInput::Submit => {
            if let Some(label) = form.missing_field() {
                app.set_status(format!("{label} is required"));
            } else if let Some(reel) = form.new_reel() {
                if app.session.add_reel(reel) {
                    app.set_status("Adding reel...");
                }
            }
        }
    }
    Action::Continue
}

/// Login/register overlay. Left/Right switch tabs.
fn handle_auth_input(app: &mut App, code: KeyCode) -> Action {
    match code {
        KeyCode::Left => {
            app.session.switch_auth_tab(AuthTab::Login);
            return Action::Continue;
        }
        KeyCode::Right => {
            app.session.switch_auth_tab(AuthTab::Register);
            return Action::Continue;
        }
        _ => {}
    }

    match edit_form(app.auth_form_mut(), code) {
        FormInput::Edited => {}
        FormInput::Cancel => {
            if !app.session.dismiss_login_outside() {
                app.set_status("Log in or register to keep watching");
            }
        }
        FormInput::Submit => submit_auth(app),
    }
    Action::Continue
}

fn submit_auth(app: &mut App) {
    if app.session.quota().overlay().submitting {
        return;
    }
    let form = app.auth_form();
    if let Some(label) = form.missing_field() {
        app.set_status(format!("{label} is required"));
        return;
    }
    let kind = form.kind;
    let Some(credentials) = form.credentials() else {
        return;
    };
    tracing::debug!(?kind, username = %credentials.username, "Submitting credentials");
    match kind {
        FormKind::Register => app.session.register(credentials),
        _ => app.session.login(credentials),
    }
}

/// Handle input in the feed through the keybinding registry.
fn handle_feed_input(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> Result<Action> {
    let Some(action) = app.keybindings.action_for_key(code, modifiers, KbContext::Feed) else {
        return Ok(Action::Continue);
    };

    match action {
        KbAction::Quit => return Ok(Action::Quit),
        KbAction::NavDown | KbAction::PageDown => app.session.navigate(NavIntent::Next),
        KbAction::NavUp | KbAction::PageUp => app.session.navigate(NavIntent::Previous),
        KbAction::First => app.session.navigate(NavIntent::First),
        KbAction::Last => app.session.navigate(NavIntent::Last),
        KbAction::Reload => {
            app.set_status("Reloading...");
            app.session.load_feed();
        }
        KbAction::OpenInPlayer => open_current(app)?,
        KbAction::ShowLogin => {
            if app.session.quota().is_logged_in() {
                app.set_status("Already logged in");
            } else {
                app.session.show_login();
            }
        }
        KbAction::AddReel => {
            if app.session.quota().is_logged_in() {
                app.reel_form = Some(Form::add_reel());
            } else {
                app.set_status("Please login to add reels");
            }
        }
        KbAction::DeleteReel => {
            if let Some(card) = app.session.current_card() {
                app.pending_confirm = Some(ConfirmAction::DeleteReel {
                    reel_id: card.reel_id,
                    title: card.title.clone(),
                });
            }
        }
        KbAction::ToggleMute => {
            let muted = app.session.toggle_mute();
            app.set_status(if muted { "Muted" } else { "Sound on" });
        }
        KbAction::ShowHelp => app.show_help = true,
        KbAction::Back => app.status_message = None,
    }
    Ok(Action::Continue)
}

/// Hand the current reel's media URL to the system opener.
fn open_current(app: &mut App) -> Result<()> {
    let Some(card) = app.session.current_card() else {
        app.set_status("No reel selected");
        return Ok(());
    };
    let url = card.media_url.to_string();
    open::that(&url).with_context(|| format!("Failed to open {url}"))?;
    app.set_status("Opened in external player");
    Ok(())
}

/// Handle mouse input: wheel scrolling, swipes and outside clicks.
pub(super) fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let dialog_open = app.show_help
        || app.pending_confirm.is_some()
        || app.reel_form.is_some()
        || app.login_visible();

    match mouse.kind {
        MouseEventKind::ScrollDown if !dialog_open => {
            app.session.on_wheel((WHEEL_ROWS * ROW_PX) as i64);
        }
        MouseEventKind::ScrollUp if !dialog_open => {
            app.session.on_wheel(-((WHEEL_ROWS * ROW_PX) as i64));
        }
        MouseEventKind::Down(MouseButton::Left) => {
            app.session.on_user_interaction();
            if app.login_visible() {
                let outside = app
                    .dialog_area
                    .is_some_and(|area| !contains(area, mouse.column, mouse.row));
                if outside && !app.session.dismiss_login_outside() {
                    app.set_status("Log in or register to keep watching");
                }
            } else if !dialog_open && contains(app.feed_area, mouse.column, mouse.row) {
                app.drag_start_row = Some(mouse.row);
                app.drag_last_row = Some(mouse.row);
            }
        }
        // The feed follows the pointer; the release then swipes.
        MouseEventKind::Drag(MouseButton::Left) => {
            if let Some(last) = app.drag_last_row.replace(mouse.row) {
                let rows = i64::from(last) - i64::from(mouse.row);
                if rows != 0 {
                    app.session.on_scroll(rows * ROW_PX as i64);
                }
            }
        }
        MouseEventKind::Up(MouseButton::Left) => {
            app.drag_last_row = None;
            if let Some(start) = app.drag_start_row.take() {
                app.session.navigate(NavIntent::Swipe {
                    start_y: i64::from(start) * ROW_PX as i64,
                    end_y: i64::from(mouse.row) * ROW_PX as i64,
                });
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Reel, ReelsClient, ReelsPage, TrackViewResponse};
    use crate::config::Config;
    use crate::keybindings::KeybindingRegistry;
    use crate::session::{Effect, FeedSession};
    use crate::viewer::{NullBackend, PlaybackController};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use ratatui::layout::Rect;
    use std::time::Duration;

    fn reel(id: i64) -> Reel {
        Reel {
            id,
            url: format!("/uploads/{id}.mp4"),
            title: Some(format!("Reel {id}")),
            description: None,
            created_at: None,
        }
    }

    fn loaded_app(count: i64) -> App {
        let client = ReelsClient::new("http://localhost:5000", Duration::from_secs(5)).unwrap();
        let playback = PlaybackController::new(Box::new(NullBackend), true);
        let mut session = FeedSession::new(
            client.base_url().clone(),
            playback,
            StdRng::seed_from_u64(3),
        );
        session.resize(400, 400);
        session.load_feed();
        session.apply_feed(Ok(ReelsPage {
            reels: (1..=count).map(reel).collect(),
            user: None,
        }));
        session.take_effects();
        let mut app = App::new(session, client, Config::default(), KeybindingRegistry::new());
        app.feed_area = Rect::new(0, 0, 80, 25);
        app
    }

    fn key(app: &mut App, code: KeyCode) -> Action {
        handle_input(app, code, KeyModifiers::NONE).unwrap()
    }

    #[test]
    fn test_quit_keys() {
        let mut app = loaded_app(2);
        assert!(matches!(key(&mut app, KeyCode::Char('q')), Action::Quit));
        let ctrl_c = handle_input(&mut app, KeyCode::Char('c'), KeyModifiers::CONTROL).unwrap();
        assert!(matches!(ctrl_c, Action::Quit));
    }

    #[test]
    fn test_nav_down_scrolls_feed() {
        let mut app = loaded_app(5);
        key(&mut app, KeyCode::Char('j'));
        assert_eq!(app.session.navigation().current_index, 1);
        assert!(app.session.navigation().is_animating_scroll);
    }

    #[test]
    fn test_typing_in_form_does_not_navigate() {
        let mut app = loaded_app(5);
        app.session.show_login();
        key(&mut app, KeyCode::Char('j'));
        key(&mut app, KeyCode::Char('q'));
        assert_eq!(app.session.navigation().current_index, 0);
        assert_eq!(app.login_form.fields[0].value, "jq");
    }

    #[test]
    fn test_auth_submit_requires_fields() {
        let mut app = loaded_app(1);
        app.session.show_login();
        key(&mut app, KeyCode::Enter);
        assert!(app.session.take_effects().is_empty());
        assert_eq!(
            app.status_message.as_ref().map(|(m, _)| m.as_ref()),
            Some("Username is required")
        );

        for c in "ana".chars() {
            key(&mut app, KeyCode::Char(c));
        }
        key(&mut app, KeyCode::Tab);
        for c in "pw".chars() {
            key(&mut app, KeyCode::Char(c));
        }
        key(&mut app, KeyCode::Enter);
        let effects = app.session.take_effects();
        assert!(matches!(effects.as_slice(), [Effect::Login(c)] if c.username == "ana"));

        // Second Enter while in flight does nothing.
        key(&mut app, KeyCode::Enter);
        assert!(app.session.take_effects().is_empty());
    }

    #[test]
    fn test_register_tab_submits_register() {
        let mut app = loaded_app(1);
        app.session.show_login();
        key(&mut app, KeyCode::Right);
        for (field, text) in ["bo", "bo@example.com", "pw"].iter().enumerate() {
            app.register_form.focused = field;
            for c in text.chars() {
                key(&mut app, KeyCode::Char(c));
            }
        }
        key(&mut app, KeyCode::Enter);
        let effects = app.session.take_effects();
        assert!(
            matches!(effects.as_slice(), [Effect::Register(c)] if c.email.as_deref() == Some("bo@example.com"))
        );
    }

    #[test]
    fn test_locked_overlay_survives_esc_and_outside_click() {
        let mut app = loaded_app(1);
        app.session.apply_track_view(
            1,
            Ok(TrackViewResponse {
                success: true,
                views_count: 10,
                views_remaining: Some(0),
                requires_login: true,
                error: None,
            }),
        );
        assert!(app.login_visible());
        key(&mut app, KeyCode::Esc);
        assert!(app.login_visible());

        app.dialog_area = Some(Rect::new(20, 5, 40, 12));
        handle_mouse(
            &mut app,
            MouseEvent {
                kind: MouseEventKind::Down(MouseButton::Left),
                column: 1,
                row: 1,
                modifiers: KeyModifiers::NONE,
            },
        );
        assert!(app.login_visible());
    }

    #[test]
    fn test_outside_click_dismisses_open_overlay() {
        let mut app = loaded_app(1);
        app.session.show_login();
        app.dialog_area = Some(Rect::new(20, 5, 40, 12));
        let click = |column, row| MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        };
        handle_mouse(&mut app, click(30, 8));
        assert!(app.login_visible());
        handle_mouse(&mut app, click(2, 2));
        assert!(!app.login_visible());
    }

    #[test]
    fn test_drag_up_swipes_to_next() {
        let mut app = loaded_app(5);
        let event = |kind, row| MouseEvent {
            kind,
            column: 10,
            row,
            modifiers: KeyModifiers::NONE,
        };
        handle_mouse(&mut app, event(MouseEventKind::Down(MouseButton::Left), 20));
        handle_mouse(&mut app, event(MouseEventKind::Up(MouseButton::Left), 5));
        assert_eq!(app.session.navigation().current_index, 1);
    }

    #[test]
    fn test_drag_scrolls_feed_with_pointer() {
        let mut app = loaded_app(5);
        let event = |kind, row| MouseEvent {
            kind,
            column: 10,
            row,
            modifiers: KeyModifiers::NONE,
        };
        handle_mouse(&mut app, event(MouseEventKind::Down(MouseButton::Left), 20));
        handle_mouse(&mut app, event(MouseEventKind::Drag(MouseButton::Left), 18));
        handle_mouse(&mut app, event(MouseEventKind::Drag(MouseButton::Left), 16));
        assert_eq!(app.session.viewport().scroll_top(), 4 * ROW_PX);

        handle_mouse(&mut app, event(MouseEventKind::Up(MouseButton::Left), 16));
        assert!(app.drag_last_row.is_none());
        assert_eq!(app.session.navigation().current_index, 1);
        app.session.tick_by(Duration::from_secs(1));
        assert_eq!(app.session.viewport().scroll_top(), 400);
    }

    #[test]
    fn test_add_reel_requires_login() {
        let mut app = loaded_app(1);
        key(&mut app, KeyCode::Char('a'));
        assert!(app.reel_form.is_none());
        assert_eq!(
            app.status_message.as_ref().map(|(m, _)| m.as_ref()),
            Some("Please login to add reels")
        );
    }

    #[test]
    fn test_delete_confirmation_flow() {
        let mut app = loaded_app(3);
        key(&mut app, KeyCode::Char('d'));
        let Some(ConfirmAction::DeleteReel { reel_id, .. }) = app.pending_confirm.clone() else {
            panic!("expected confirmation");
        };

        key(&mut app, KeyCode::Char('n'));
        assert!(app.pending_confirm.is_none());
        assert!(app.session.take_effects().is_empty());

        key(&mut app, KeyCode::Char('d'));
        key(&mut app, KeyCode::Char('y'));
        let effects = app.session.take_effects();
        assert!(matches!(effects.as_slice(), [Effect::DeleteReel { reel_id: id }] if *id == reel_id));
    }

    #[test]
    fn test_help_captures_keys() {
        let mut app = loaded_app(3);
        key(&mut app, KeyCode::Char('?'));
        assert!(app.show_help);
        assert!(matches!(key(&mut app, KeyCode::Char('q')), Action::Continue));
        assert!(!app.show_help);
    }

    #[test]
    fn test_any_key_unlocks_sound() {
        let mut app = loaded_app(1);
        assert!(!app.session.playback().sound_unlocked());
        key(&mut app, KeyCode::Char('x'));
        assert!(app.session.playback().sound_unlocked());
    }
}
