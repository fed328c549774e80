use crate::api::{ApiError, AuthStatus, Credentials, NewReel, ReelsClient, ReelsPage, TrackViewResponse};
use crate::config::Config;
use crate::keybindings::KeybindingRegistry;
use crate::session::{AuthKind, AuthTab, FeedSession};
use ratatui::layout::Rect;
use std::borrow::Cow;
use tokio::time::Instant;

/// How long a status message stays in the status bar.
const STATUS_TTL_SECS: u64 = 3;

// ============================================================================
// Background Events
// ============================================================================

/// Events from background tasks
pub enum AppEvent {
    /// `GET /api/auth/status` answered.
    AuthStatusLoaded(Result<AuthStatus, ApiError>),
    /// `GET /api/reels` answered.
    FeedLoaded(Result<ReelsPage, ApiError>),
    /// A view was reported for `reel_id`.
    ViewTracked {
        reel_id: i64,
        result: Result<TrackViewResponse, ApiError>,
    },
    /// Login or registration finished.
    AuthFinished {
        kind: AuthKind,
        result: Result<(), ApiError>,
    },
    ReelAdded(Result<(), ApiError>),
    ReelDeleted(Result<(), ApiError>),
    /// A background task panicked.
    ///
    /// Fields:
    /// - `task`: Name of the task that panicked (e.g., "load_feed", "track_view")
    /// - `error`: The panic message extracted from the panic payload
    TaskPanicked { task: &'static str, error: String },
}

// ============================================================================
// Text Forms
// ============================================================================

/// Which dialog a [`Form`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Login,
    Register,
    AddReel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub label: &'static str,
    pub value: String,
    /// Rendered as `*` characters.
    pub masked: bool,
    pub required: bool,
}

impl FormField {
    fn text(label: &'static str, required: bool) -> Self {
        Self {
            label,
            value: String::new(),
            masked: false,
            required,
        }
    }

    fn secret(label: &'static str) -> Self {
        Self {
            label,
            value: String::new(),
            masked: true,
            required: true,
        }
    }
}

/// A small single-line-per-field text form.
///
/// While a form has focus every key goes to it, so feed navigation keys
/// type characters instead of scrolling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Form {
    pub kind: FormKind,
    pub fields: Vec<FormField>,
    pub focused: usize,
}

/// Longest value accepted in a form field.
pub const MAX_FIELD_LENGTH: usize = 256;

impl Form {
    pub fn login(username: Option<&str>) -> Self {
        let mut form = Self {
            kind: FormKind::Login,
            fields: vec![FormField::text("Username", true), FormField::secret("Password")],
            focused: 0,
        };
        if let Some(name) = username {
            form.fields[0].value = name.to_string();
            form.focused = 1;
        }
        form
    }

    pub fn register() -> Self {
        Self {
            kind: FormKind::Register,
            fields: vec![
                FormField::text("Username", true),
                FormField::text("Email", true),
                FormField::secret("Password"),
            ],
            focused: 0,
        }
    }

    pub fn add_reel() -> Self {
        Self {
            kind: FormKind::AddReel,
            fields: vec![
                FormField::text("Filename", true),
                FormField::text("Title", false),
                FormField::text("Description", false),
            ],
            focused: 0,
        }
    }

    pub fn focus_next(&mut self) {
        self.focused = (self.focused + 1) % self.fields.len();
    }

    pub fn focus_prev(&mut self) {
        self.focused = self.focused.checked_sub(1).unwrap_or(self.fields.len() - 1);
    }

    pub fn push_char(&mut self, c: char) {
        if let Some(field) = self.fields.get_mut(self.focused) {
            if field.value.chars().count() < MAX_FIELD_LENGTH && !c.is_control() {
                field.value.push(c);
            }
        }
    }

    pub fn backspace(&mut self) {
        if let Some(field) = self.fields.get_mut(self.focused) {
            field.value.pop();
        }
    }

    fn value(&self, index: usize) -> &str {
        self.fields.get(index).map_or("", |f| f.value.trim())
    }

    /// Label of the first required field left blank.
    pub fn missing_field(&self) -> Option<&'static str> {
        self.fields
            .iter()
            .find(|f| f.required && f.value.trim().is_empty())
            .map(|f| f.label)
    }

    pub fn credentials(&self) -> Option<Credentials> {
        match self.kind {
            FormKind::Login => Some(Credentials::login(self.value(0), &self.fields[1].value)),
            FormKind::Register => Some(Credentials::register(
                self.value(0),
                self.value(1),
                &self.fields[2].value,
            )),
            FormKind::AddReel => None,
        }
    }

    pub fn new_reel(&self) -> Option<NewReel> {
        (self.kind == FormKind::AddReel).then(|| NewReel {
            filename: self.value(0).to_string(),
            title: self.value(1).to_string(),
            description: self.value(2).to_string(),
        })
    }
}

// ============================================================================
// Dialogs
// ============================================================================

/// Pending confirmation dialog for destructive operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    DeleteReel { reel_id: i64, title: String },
}

// ============================================================================
// Application State
// ============================================================================

/// Central application state
pub struct App {
    pub session: FeedSession,
    pub client: ReelsClient,
    pub config: Config,
    pub keybindings: KeybindingRegistry,

    /// Login/register fields; shown while the session's overlay is visible.
    pub login_form: Form,
    pub register_form: Form,
    /// Add-reel dialog, when open.
    pub reel_form: Option<Form>,
    pub pending_confirm: Option<ConfirmAction>,

    /// Whether the help overlay is currently displayed.
    pub show_help: bool,
    /// Scroll offset in the help screen for long keybinding lists.
    pub help_scroll_offset: usize,

    pub status_message: Option<(Cow<'static, str>, Instant)>,

    /// Dirty flag to skip unnecessary frame renders
    pub needs_redraw: bool,

    /// Area the feed was last drawn into; maps mouse rows to feed pixels.
    pub feed_area: Rect,
    /// Area of the dialog currently on top, for outside-click dismissal.
    pub dialog_area: Option<Rect>,
    /// Row where the current left-button drag started.
    pub drag_start_row: Option<u16>,
    /// Row of the last drag step, for incremental scrolling.
    pub drag_last_row: Option<u16>,
}

impl App {
    pub fn new(
        session: FeedSession,
        client: ReelsClient,
        config: Config,
        keybindings: KeybindingRegistry,
    ) -> Self {
        let login_form = Form::login(config.username.as_deref());
        Self {
            session,
            client,
            config,
            keybindings,
            login_form,
            register_form: Form::register(),
            reel_form: None,
            pending_confirm: None,
            show_help: false,
            help_scroll_offset: 0,
            status_message: None,
            needs_redraw: true,
            feed_area: Rect::default(),
            dialog_area: None,
            drag_start_row: None,
            drag_last_row: None,
        }
    }

    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), Instant::now()));
    }

    /// Clear status message if expired (older than 3 seconds)
    /// Returns true if a message was actually cleared
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed().as_secs() >= STATUS_TTL_SECS {
                self.status_message = None;
                return true;
            }
        }
        false
    }

    /// Move session notices into the status bar. The newest one wins.
    pub fn drain_notices(&mut self) {
        if let Some(last) = self.session.take_notices().pop() {
            self.set_status(last);
            self.needs_redraw = true;
        }
    }

    pub fn login_visible(&self) -> bool {
        self.session.quota().overlay().visible
    }

    /// Form for the overlay's active tab.
    pub fn auth_form(&self) -> &Form {
        match self.session.quota().overlay().tab {
            AuthTab::Login => &self.login_form,
            AuthTab::Register => &self.register_form,
        }
    }

    pub fn auth_form_mut(&mut self) -> &mut Form {
        match self.session.quota().overlay().tab {
            AuthTab::Login => &mut self.login_form,
            AuthTab::Register => &mut self.register_form,
        }
    }

    /// Any text form has keyboard focus.
    pub fn form_focused(&self) -> bool {
        self.reel_form.is_some() || self.login_visible()
    }

    /// Reset the auth forms after a successful login, keeping the username.
    pub fn reset_auth_forms(&mut self, kind: AuthKind) {
        let username = match kind {
            AuthKind::Login => self.login_form.fields[0].value.clone(),
            AuthKind::Register => self.register_form.fields[0].value.clone(),
        };
        self.login_form = Form::login(Some(username.as_str()).filter(|u| !u.is_empty()));
        self.register_form = Form::register();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewer::{NullBackend, PlaybackController};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use secrecy::ExposeSecret;
    use std::time::Duration;

    fn test_app() -> App {
        let client = ReelsClient::new("http://localhost:5000", Duration::from_secs(5)).unwrap();
        let playback = PlaybackController::new(Box::new(NullBackend), true);
        let session = FeedSession::new(
            client.base_url().clone(),
            playback,
            StdRng::seed_from_u64(1),
        );
        App::new(session, client, Config::default(), KeybindingRegistry::new())
    }

    #[test]
    fn test_form_typing_and_focus() {
        let mut form = Form::register();
        for c in "ana".chars() {
            form.push_char(c);
        }
        form.focus_next();
        form.push_char('a');
        form.push_char('@');
        form.backspace();
        form.focus_prev();
        form.focus_prev();
        assert_eq!(form.focused, 2);
        assert_eq!(form.fields[0].value, "ana");
        assert_eq!(form.fields[1].value, "a");
        assert_eq!(form.missing_field(), Some("Password"));
    }

    #[test]
    fn test_form_rejects_control_chars_and_overlong_input() {
        let mut form = Form::add_reel();
        form.push_char('\u{7}');
        assert!(form.fields[0].value.is_empty());
        for _ in 0..(MAX_FIELD_LENGTH + 10) {
            form.push_char('x');
        }
        assert_eq!(form.fields[0].value.len(), MAX_FIELD_LENGTH);
    }

    #[test]
    fn test_login_prefill_focuses_password() {
        let form = Form::login(Some("ana"));
        assert_eq!(form.fields[0].value, "ana");
        assert_eq!(form.focused, 1);
        assert_eq!(Form::login(None).focused, 0);
    }

    #[test]
    fn test_form_conversions() {
        let mut form = Form::login(Some(" ana "));
        form.fields[1].value = "secret".into();
        let creds = form.credentials().unwrap();
        assert_eq!(creds.username, "ana");
        assert_eq!(creds.password.expose_secret(), "secret");
        assert!(form.new_reel().is_none());

        let mut reel = Form::add_reel();
        reel.fields[0].value = "clip.mp4".into();
        reel.fields[1].value = "Sunset".into();
        assert_eq!(reel.missing_field(), None);
        assert_eq!(
            reel.new_reel(),
            Some(NewReel {
                filename: "clip.mp4".into(),
                title: "Sunset".into(),
                description: String::new(),
            })
        );
        assert!(reel.credentials().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_message_expires() {
        let mut app = test_app();
        app.set_status("Test message");

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(!app.clear_expired_status());
        assert!(app.status_message.is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(app.clear_expired_status());
        assert!(app.status_message.is_none());
    }

    #[test]
    fn test_auth_form_follows_overlay_tab() {
        let mut app = test_app();
        app.session.show_login();
        assert!(app.form_focused());
        assert_eq!(app.auth_form().kind, FormKind::Login);
        app.session.switch_auth_tab(AuthTab::Register);
        app.auth_form_mut().push_char('b');
        assert_eq!(app.register_form.fields[0].value, "b");
    }

    #[test]
    fn test_notices_move_to_status() {
        let mut app = test_app();
        assert!(!app.session.add_reel(NewReel {
            filename: "a.mp4".into(),
            title: String::new(),
            description: String::new(),
        }));
        app.drain_notices();
        assert_eq!(
            app.status_message.as_ref().map(|(m, _)| m.as_ref()),
            Some("Please login to add reels")
        );
    }
}
