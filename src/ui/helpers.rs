//! Shared helpers for the UI layer: background task spawning and layout math.

use crate::app::{App, AppEvent};
use crate::session::{AuthKind, Effect};
use futures::FutureExt;
use ratatui::layout::Rect;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tokio::sync::mpsc;

/// Run a future, converting a panic into an error message.
///
/// Background tasks are spawned with `tokio::spawn`; a panic inside one would
/// otherwise vanish silently and leave the UI waiting for a result forever.
///
/// # Example
///
/// ```ignore
/// tokio::spawn(async move {
///     match catch_task_panic(async { do_work().await }).await {
///         Ok(event) => { let _ = tx.send(event).await; }
///         Err(panic_msg) => {
///             let _ = tx.send(AppEvent::TaskPanicked { task: "work", error: panic_msg }).await;
///         }
///     }
/// });
/// ```
pub(super) async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                format!("Unknown panic: {:?}", (*panic).type_id())
            }
        })
}

/// Background task names, as reported in `AppEvent::TaskPanicked`.
pub(super) mod task {
    pub const AUTH_STATUS: &str = "auth_status";
    pub const LOAD_FEED: &str = "load_feed";
    pub const TRACK_VIEW: &str = "track_view";
    pub const LOGIN: &str = "login";
    pub const REGISTER: &str = "register";
    pub const ADD_REEL: &str = "add_reel";
    pub const DELETE_REEL: &str = "delete_reel";
}

/// Spawn `future` and forward its event, or a `TaskPanicked`, to the loop.
fn spawn_task<F>(task: &'static str, event_tx: &mpsc::Sender<AppEvent>, future: F)
where
    F: Future<Output = AppEvent> + Send + 'static,
{
    let tx = event_tx.clone();
    tokio::spawn(async move {
        let event = match catch_task_panic(future).await {
            Ok(event) => event,
            Err(panic_msg) => {
                tracing::error!(task, error = %panic_msg, "Background task panicked");
                AppEvent::TaskPanicked {
                    task,
                    error: panic_msg,
                }
            }
        };
        if let Err(e) = tx.send(event).await {
            tracing::warn!(task, error = %e, "Channel send failed (receiver dropped)");
        }
    });
}

/// Run every network request the session has queued.
///
/// Each request gets its own task; results come back as [`AppEvent`]s in
/// whatever order the backend answers.
pub(super) fn spawn_effects(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    for effect in app.session.take_effects() {
        let client = app.client.clone();
        match effect {
            Effect::CheckAuthStatus => spawn_task(task::AUTH_STATUS, event_tx, async move {
                AppEvent::AuthStatusLoaded(client.auth_status().await)
            }),
            Effect::LoadFeed => spawn_task(task::LOAD_FEED, event_tx, async move {
                AppEvent::FeedLoaded(client.list_reels().await)
            }),
            Effect::TrackView { reel_id } => spawn_task(task::TRACK_VIEW, event_tx, async move {
                AppEvent::ViewTracked {
                    reel_id,
                    result: client.track_view(reel_id).await,
                }
            }),
            Effect::Login(credentials) => spawn_task(task::LOGIN, event_tx, async move {
                AppEvent::AuthFinished {
                    kind: AuthKind::Login,
                    result: client.login(&credentials).await,
                }
            }),
            Effect::Register(credentials) => spawn_task(task::REGISTER, event_tx, async move {
                AppEvent::AuthFinished {
                    kind: AuthKind::Register,
                    result: client.register(&credentials).await,
                }
            }),
            Effect::AddReel(reel) => spawn_task(task::ADD_REEL, event_tx, async move {
                AppEvent::ReelAdded(client.add_reel(&reel).await)
            }),
            Effect::DeleteReel { reel_id } => spawn_task(task::DELETE_REEL, event_tx, async move {
                AppEvent::ReelDeleted(client.delete_reel(reel_id).await)
            }),
        }
    }
}

/// Create a centered rectangle with the given percentage of the parent area.
pub(super) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let width = area.width * percent_x / 100;
    let height = area.height * percent_y / 100;
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

/// A `width` x `height` box centered in `area`, shrunk to fit.
pub(super) fn centered_box(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

pub(super) fn contains(area: Rect, column: u16, row: u16) -> bool {
    column >= area.x
        && column < area.x.saturating_add(area.width)
        && row >= area.y
        && row < area.y.saturating_add(area.height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_catch_task_panic_passes_value() {
        assert_eq!(catch_task_panic(async { 7 }).await, Ok(7));
    }

    #[tokio::test]
    async fn test_catch_task_panic_reports_message() {
        let result = catch_task_panic(async {
            if true {
                panic!("boom");
            }
        })
        .await;
        assert_eq!(result, Err("boom".to_string()));
    }

    #[test]
    fn test_centered_rect() {
        let area = Rect::new(0, 0, 100, 50);
        assert_eq!(centered_rect(80, 80, area), Rect::new(10, 5, 80, 40));
    }

    #[test]
    fn test_centered_box_shrinks_to_fit() {
        let area = Rect::new(0, 0, 30, 10);
        let rect = centered_box(50, 12, area);
        assert_eq!(rect.width, 26);
        assert_eq!(rect.height, 8);
        assert_eq!(rect.x, 2);
    }

    #[test]
    fn test_contains() {
        let area = Rect::new(5, 5, 10, 4);
        assert!(contains(area, 5, 5));
        assert!(contains(area, 14, 8));
        assert!(!contains(area, 15, 8));
        assert!(!contains(area, 4, 6));
    }
}
