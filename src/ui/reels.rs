//! Feed widget: reel cards drawn at their scroll offsets.
//!
//! Each card is exactly as tall as the feed area, like a phone-sized reel.
//! Rows map to a fixed number of viewport pixels so scrolling, snapping and
//! the visibility threshold all work on the same numbers as a touch screen.

use crate::app::App;
use crate::feed::ReelCard;
use crate::session::FeedPhase;
use crate::util::fit_width;
use crate::viewer::PlayState;
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

/// Viewport pixels per terminal row.
pub(super) const ROW_PX: u64 = 16;

/// Render the feed area and keep the session's viewport in sync with it.
pub(super) fn render(f: &mut Frame, app: &mut App, area: Rect) {
    app.feed_area = area;
    let height = u64::from(area.height) * ROW_PX;
    app.session.resize(height, height);

    match app.session.phase() {
        FeedPhase::Ready => render_cards(f, app, area),
        FeedPhase::Idle | FeedPhase::Loading => {
            render_placeholder(f, area, "Loading reels...", Style::default().fg(Color::Gray));
        }
        FeedPhase::Empty => {
            render_placeholder(
                f,
                area,
                "No reels yet. Add one with [a] after logging in.",
                Style::default().fg(Color::Gray),
            );
        }
        FeedPhase::Failed(message) => {
            let text = format!("{message}\n\nPress [r] to retry");
            render_placeholder(f, area, &text, Style::default().fg(Color::Red));
        }
    }
}

fn render_placeholder(f: &mut Frame, area: Rect, text: &str, style: Style) {
    let top = area.height.saturating_sub(3) / 2;
    let inner = Rect {
        y: area.y + top,
        height: area.height - top,
        ..area
    };
    let paragraph = Paragraph::new(text.to_string())
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .style(style);
    f.render_widget(paragraph, inner);
}

fn render_cards(f: &mut Frame, app: &App, area: Rect) {
    let viewport = app.session.viewport();
    let total = app.session.cards().len();
    let rows = i64::from(area.height);

    for index in viewport.visible_range() {
        let Some(card) = app.session.cards().get(index) else {
            continue;
        };
        let offset_px = viewport.item_top(index) as i64 - viewport.scroll_top() as i64;
        let top_row = offset_px.div_euclid(ROW_PX as i64);
        let first = top_row.max(0);
        let last = (top_row + rows).min(rows);
        if first >= last {
            continue;
        }
        let slot = Rect {
            x: area.x,
            y: area.y + first as u16,
            width: area.width,
            height: (last - first) as u16,
        };
        let skip = (first - top_row) as u16;

        let state = app.session.playback().state(index);
        let awaiting = app.session.playback().is_awaiting_interaction(index);
        let lines = card_lines(card, total, state, awaiting, area.width as usize);
        let paragraph = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((skip, 0));
        f.render_widget(paragraph, slot);
    }
}

fn state_label(state: PlayState) -> (&'static str, Style) {
    match state {
        PlayState::Playing { muted: false } => ("▶ playing", Style::default().fg(Color::Green)),
        PlayState::Playing { muted: true } => {
            ("▶ playing (muted)", Style::default().fg(Color::Yellow))
        }
        PlayState::Paused => ("❚❚ paused", Style::default().fg(Color::DarkGray)),
    }
}

/// Lines for one card, header rule first.
fn card_lines(
    card: &ReelCard,
    total: usize,
    state: PlayState,
    awaiting: bool,
    width: usize,
) -> Vec<Line<'static>> {
    let dim = Style::default().fg(Color::DarkGray);
    let (label, label_style) = state_label(state);

    let position = format!(" {}/{} ", card.index + 1, total);
    let used = position.width() + label.width() + 3;
    let rule = "─".repeat(width.saturating_sub(used));
    let header = Line::from(vec![
        Span::styled(format!("──{position}"), dim),
        Span::styled(label.to_string(), label_style),
        Span::styled(format!(" {rule}"), dim),
    ]);

    let mut lines = vec![
        header,
        Line::from(""),
        Line::from(Span::styled(
            fit_width(&card.title, width).into_owned(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(card.date_label.clone(), dim)),
        Line::from(""),
    ];
    if let Some(description) = &card.description {
        lines.push(Line::from(description.clone()));
        lines.push(Line::from(""));
    }
    lines.push(Line::from(Span::styled(
        fit_width(card.media_url.as_str(), width).into_owned(),
        dim,
    )));
    if awaiting {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Press any key to enable sound",
            Style::default().fg(Color::Yellow),
        )));
    }
    lines
}
