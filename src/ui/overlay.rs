//! Dialog overlays: login/register, add-reel form and delete confirmation.

use crate::app::{App, ConfirmAction, Form};
use crate::session::AuthTab;
use crate::util::fit_width;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs},
    Frame,
};

use super::helpers::centered_box;

const BORDER: Style = Style::new().fg(Color::Cyan);

/// One line per field; the focused one is highlighted with a cursor.
fn field_lines(form: &Form, width: usize) -> Vec<Line<'static>> {
    let label_width = form
        .fields
        .iter()
        .map(|f| f.label.len())
        .max()
        .unwrap_or(0);
    form.fields
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let focused = i == form.focused;
            let shown = if field.masked {
                "*".repeat(field.value.chars().count())
            } else {
                field.value.clone()
            };
            let room = width.saturating_sub(label_width + 4);
            let mut value = fit_width(&shown, room).into_owned();
            if focused {
                value.push('█');
            }
            let label_style = if focused {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            Line::from(vec![
                Span::styled(format!("{:>label_width$}: ", field.label), label_style),
                Span::raw(value),
            ])
        })
        .collect()
}

/// Login/register dialog. Records its area for outside-click dismissal.
pub(super) fn render_auth(f: &mut Frame, app: &mut App) {
    let area = centered_box(56, 14, f.area());
    if area.width < 24 || area.height < 8 {
        return;
    }
    app.dialog_area = Some(area);
    f.render_widget(Clear, area);

    let overlay = app.session.quota().overlay();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(BORDER)
        .title(" Log in to keep watching ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(3),
            Constraint::Length(2),
        ])
        .split(inner);

    let selected = match overlay.tab {
        AuthTab::Login => 0,
        AuthTab::Register => 1,
    };
    let tabs = Tabs::new(vec!["Login", "Register"])
        .select(selected)
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::REVERSED))
        .divider("|");
    f.render_widget(tabs, chunks[0]);

    let form = app.auth_form();
    f.render_widget(
        Paragraph::new(field_lines(form, chunks[1].width as usize)),
        chunks[1],
    );

    let footer = if overlay.submitting {
        Line::from(Span::styled("Submitting...", Style::default().fg(Color::Gray)))
    } else if let Some(error) = &overlay.error {
        Line::from(Span::styled(error.clone(), Style::default().fg(Color::Red)))
    } else {
        Line::from("")
    };
    f.render_widget(
        Paragraph::new(footer).alignment(Alignment::Center),
        chunks[2],
    );
}

/// Add-reel form.
pub(super) fn render_reel_form(f: &mut Frame, app: &mut App) {
    let Some(form) = &app.reel_form else {
        return;
    };
    let area = centered_box(60, 9, f.area());
    if area.width < 24 || area.height < 6 {
        return;
    }
    f.render_widget(Clear, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(BORDER)
        .title(" Add reel ");
    let inner = block.inner(area);
    let mut lines = field_lines(form, inner.width as usize);
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Filename is relative to the server's upload folder",
        Style::default().fg(Color::DarkGray),
    )));
    f.render_widget(Paragraph::new(lines).block(block), area);
    app.dialog_area = Some(area);
}

/// Render a confirmation dialog overlay centered on screen.
pub(super) fn render_confirm(f: &mut Frame, app: &mut App) {
    let Some(ConfirmAction::DeleteReel { title, .. }) = &app.pending_confirm else {
        return;
    };
    let area = centered_box(50, 7, f.area());
    if area.width < 10 || area.height < 5 {
        return;
    }
    let text = format!(
        "Delete \"{}\"?\n\n(y) Confirm  (n/Esc) Cancel",
        fit_width(title, area.width.saturating_sub(12) as usize)
    );
    f.render_widget(Clear, area);
    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(BORDER)
                .title(" Confirm "),
        )
        .alignment(Alignment::Center);
    f.render_widget(paragraph, area);
    app.dialog_area = Some(area);
}
