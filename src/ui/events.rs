//! Background task event processing.

use crate::api::ApiError;
use crate::app::{App, AppEvent};
use crate::session::{AuthKind, FeedPhase};

use super::helpers::task;

/// Handle application events from background tasks.
///
/// Hands each API result to the session. Requests the session queues in
/// response (a reload after login, for example) are run by the event loop.
pub(super) fn handle_app_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::AuthStatusLoaded(result) => {
            app.session.apply_auth_status(result);
        }
        AppEvent::FeedLoaded(result) => {
            app.session.apply_feed(result);
            if let FeedPhase::Ready = app.session.phase() {
                let count = app.session.feed().original().len();
                app.set_status(format!("Loaded {count} reels"));
            }
        }
        AppEvent::ViewTracked { reel_id, result } => {
            app.session.apply_track_view(reel_id, result);
        }
        AppEvent::AuthFinished { kind, result } => {
            let ok = result.is_ok();
            app.session.apply_auth_result(kind, result);
            if ok {
                app.reset_auth_forms(kind);
                app.set_status("Logged in");
            }
        }
        AppEvent::ReelAdded(result) => {
            let ok = result.is_ok();
            app.session.apply_reel_added(result);
            if ok {
                app.reel_form = None;
                app.set_status("Reel added");
            }
        }
        AppEvent::ReelDeleted(result) => {
            let ok = result.is_ok();
            app.session.apply_reel_deleted(result);
            if ok {
                app.set_status("Reel deleted");
            }
        }
        AppEvent::TaskPanicked { task, error } => {
            tracing::error!(task, error = %error, "Background task panicked");
            fail_request(app, task, &error);
            app.set_status(format!("Internal error in {task}: {error}"));
        }
    }
}

fn internal<T>(error: &str) -> Result<T, ApiError> {
    Err(ApiError::Internal(error.to_string()))
}

/// Settle the session state a dead task left waiting on its result.
fn fail_request(app: &mut App, name: &str, error: &str) {
    match name {
        task::AUTH_STATUS => app.session.apply_auth_status(internal(error)),
        task::LOAD_FEED => app.session.apply_feed(internal(error)),
        task::LOGIN => app.session.apply_auth_result(AuthKind::Login, internal(error)),
        task::REGISTER => app.session.apply_auth_result(AuthKind::Register, internal(error)),
        task::ADD_REEL => app.session.apply_reel_added(internal(error)),
        task::DELETE_REEL => app.session.apply_reel_deleted(internal(error)),
        // The reel id is lost with the task; a missed view count is harmless.
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Credentials, ReelsClient};
    use crate::config::Config;
    use crate::keybindings::KeybindingRegistry;
    use crate::session::{Effect, FeedSession};
    use crate::viewer::{NullBackend, PlaybackController};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::time::Duration;

    fn app() -> App {
        let client = ReelsClient::new("http://localhost:5000", Duration::from_secs(5)).unwrap();
        let playback = PlaybackController::new(Box::new(NullBackend), false);
        let session = FeedSession::new(
            client.base_url().clone(),
            playback,
            StdRng::seed_from_u64(5),
        );
        App::new(session, client, Config::default(), KeybindingRegistry::new())
    }

    fn panicked(task: &'static str) -> AppEvent {
        AppEvent::TaskPanicked {
            task,
            error: "boom".to_string(),
        }
    }

    #[test]
    fn test_panicked_login_releases_overlay() {
        let mut app = app();
        app.session.show_login();
        app.session.login(Credentials::login("ana", "pw"));
        assert!(app.session.quota().overlay().submitting);

        handle_app_event(&mut app, panicked(task::LOGIN));

        let overlay = app.session.quota().overlay();
        assert!(overlay.visible);
        assert!(!overlay.submitting);
        assert_eq!(overlay.error.as_deref(), Some("Error: Internal error: boom"));
        assert!(app.status_message.is_some());
    }

    #[test]
    fn test_panicked_feed_load_shows_error() {
        let mut app = app();
        app.session.load_feed();
        assert_eq!(app.session.phase(), &FeedPhase::Loading);

        handle_app_event(&mut app, panicked(task::LOAD_FEED));

        assert_eq!(
            app.session.phase(),
            &FeedPhase::Failed("Error loading reels: Internal error: boom".to_string())
        );
    }

    #[test]
    fn test_panicked_auth_check_still_loads_feed() {
        let mut app = app();
        app.session.start();
        app.session.take_effects();

        handle_app_event(&mut app, panicked(task::AUTH_STATUS));

        assert!(matches!(app.session.take_effects().as_slice(), [Effect::LoadFeed]));
    }
}
