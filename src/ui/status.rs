use crate::app::App;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};
use std::borrow::Cow;
use unicode_width::UnicodeWidthStr;

const FEED_HINTS: &str = "[j/k]next/prev [m]ute [o]pen [l]ogin [a]dd [d]elete [r]eload [?]help [q]uit";
const FORM_HINTS: &str = "Enter submit  Tab next field  Esc close";
const AUTH_HINTS: &str = "Enter submit  Tab next field  ←/→ login/register  Esc close";

/// Right-hand side: remaining views and sound state.
fn indicators(app: &App) -> String {
    let mut parts: Vec<Cow<'static, str>> = Vec::new();
    if let Some(counter) = app.session.quota().counter_text() {
        parts.push(Cow::Owned(counter));
    }
    let playback = app.session.playback();
    if playback.is_user_muted() {
        parts.push(Cow::Borrowed("muted"));
    } else if !playback.sound_unlocked() {
        parts.push(Cow::Borrowed("sound locked"));
    }
    if parts.is_empty() {
        return String::new();
    }
    format!(" {} ", parts.join(" | "))
}

/// Render the status bar
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }

    let text: Cow<'_, str> = if let Some((msg, _)) = &app.status_message {
        Cow::Borrowed(msg.as_ref())
    } else if app.reel_form.is_some() {
        Cow::Borrowed(FORM_HINTS)
    } else if app.login_visible() {
        Cow::Borrowed(AUTH_HINTS)
    } else {
        Cow::Borrowed(FEED_HINTS)
    };

    let right = indicators(app);
    let right_width = (right.width() as u16).min(area.width / 2);
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(right_width)])
        .split(area);

    let style = Style::default().bg(Color::DarkGray).fg(Color::White);
    f.render_widget(Paragraph::new(text).style(style), chunks[0]);
    f.render_widget(
        Paragraph::new(right).style(style.fg(Color::Yellow)),
        chunks[1],
    );
}
