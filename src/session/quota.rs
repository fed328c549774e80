use crate::api::{ApiError, AuthStatus, Credentials, TrackViewResponse, UserStatus};
use crate::session::Effect;

/// Who is watching and how many anonymous views are left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStatus {
    pub is_logged_in: bool,
    pub views_count: u32,
    /// `None` when logged in or not yet reported by the backend.
    pub views_remaining: Option<u32>,
}

impl From<&UserStatus> for SessionStatus {
    fn from(user: &UserStatus) -> Self {
        Self {
            is_logged_in: user.is_logged_in,
            views_count: user.views_count,
            views_remaining: user.views_remaining,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthTab {
    #[default]
    Login,
    Register,
}

/// Which auth request a result belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthKind {
    Login,
    Register,
}

impl AuthKind {
    pub fn tab(self) -> AuthTab {
        match self {
            AuthKind::Login => AuthTab::Login,
            AuthKind::Register => AuthTab::Register,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoginOverlay {
    pub visible: bool,
    pub tab: AuthTab,
    pub error: Option<String>,
    /// A login or register request is in flight.
    pub submitting: bool,
}

/// Client half of the anonymous view quota and the login overlay.
///
/// The backend does the actual counting; this only mirrors what it reports
/// and decides when the overlay opens and whether it may be dismissed.
#[derive(Debug, Default)]
pub struct QuotaGate {
    status: SessionStatus,
    overlay: LoginOverlay,
}

impl QuotaGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_logged_in(&self) -> bool {
        self.status.is_logged_in
    }

    pub fn overlay(&self) -> &LoginOverlay {
        &self.overlay
    }

    /// Text for the remaining-views counter, or `None` when it is hidden.
    pub fn counter_text(&self) -> Option<String> {
        if self.status.is_logged_in {
            return None;
        }
        self.status
            .views_remaining
            .map(|n| format!("{n} reels remaining"))
    }

    pub fn check_auth_status(&self) -> Effect {
        Effect::CheckAuthStatus
    }

    pub fn apply_auth_status(&mut self, result: &Result<AuthStatus, ApiError>) {
        match result {
            Ok(auth) => {
                self.status = SessionStatus {
                    is_logged_in: auth.is_logged_in,
                    views_count: auth.views_count,
                    views_remaining: auth.views_remaining,
                };
                tracing::debug!(
                    logged_in = auth.is_logged_in,
                    remaining = ?auth.views_remaining,
                    "Auth status"
                );
            }
            Err(e) => tracing::warn!(error = %e, "Error checking auth status"),
        }
    }

    /// Overwrite the status with the block attached to a reel list.
    pub fn apply_user_status(&mut self, user: &UserStatus) {
        self.status = SessionStatus::from(user);
    }

    /// A first view of `reel_id`; only anonymous users are counted.
    pub fn track_view(&self, reel_id: i64) -> Option<Effect> {
        if self.status.is_logged_in {
            return None;
        }
        Some(Effect::TrackView { reel_id })
    }

    pub fn apply_track_view(&mut self, reel_id: i64, result: Result<TrackViewResponse, ApiError>) {
        let response = match result {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(reel_id, error = %e, "Error tracking view");
                return;
            }
        };
        if self.status.is_logged_in {
            tracing::debug!(reel_id, "Ignoring view count for logged-in user");
            return;
        }
        self.status.views_count = response.views_count;
        self.status.views_remaining = response.views_remaining;
        tracing::debug!(
            reel_id,
            views = response.views_count,
            remaining = ?response.views_remaining,
            "View tracked"
        );
        if response.requires_login {
            self.show_overlay();
        }
    }

    pub fn login(&mut self, credentials: Credentials) -> Effect {
        self.overlay.submitting = true;
        Effect::Login(credentials)
    }

    pub fn register(&mut self, credentials: Credentials) -> Effect {
        self.overlay.submitting = true;
        Effect::Register(credentials)
    }

    pub fn apply_auth_success(&mut self) {
        self.status = SessionStatus {
            is_logged_in: true,
            views_count: 0,
            views_remaining: None,
        };
        self.close_overlay();
    }

    /// Show why login/registration failed; the overlay otherwise stays put.
    pub fn apply_auth_failure(&mut self, error: &ApiError) {
        self.overlay.submitting = false;
        self.overlay.error = Some(match error {
            ApiError::Application(message) => message.clone(),
            other => format!("Error: {other}"),
        });
    }

    pub fn show_overlay(&mut self) {
        self.overlay.visible = true;
        self.switch_tab(AuthTab::Login);
    }

    pub fn close_overlay(&mut self) {
        self.overlay.visible = false;
        self.overlay.error = None;
        self.overlay.submitting = false;
    }

    pub fn switch_tab(&mut self, tab: AuthTab) {
        self.overlay.tab = tab;
        self.overlay.error = None;
    }

    /// Close the overlay from outside (Esc, click beside the dialog).
    ///
    /// Refused while an anonymous user has no views left.
    pub fn dismiss_outside(&mut self) -> bool {
        if !self.overlay.visible || self.is_locked_out() {
            return false;
        }
        self.close_overlay();
        true
    }

    /// Anonymous with the quota used up.
    pub fn is_locked_out(&self) -> bool {
        !self.status.is_logged_in && self.status.views_remaining == Some(0)
    }
}
