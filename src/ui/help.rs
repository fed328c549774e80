//! Help overlay: scrollable keybinding table.
//!
//! Shows the bindings actually in effect, including config overrides.

use crate::app::App;
use crate::keybindings::Context;
use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Row, Table},
    Frame,
};

use super::helpers::centered_rect;

/// Context display order and labels for the help screen.
const CONTEXT_ORDER: [(Context, &str); 2] = [(Context::Global, "General"), (Context::Feed, "Feed")];

/// Keys handled by dialogs directly; not remappable.
const DIALOG_KEYS: [(&str, &str); 4] = [
    ("Tab / Shift+Tab", "Next / previous field"),
    ("Left / Right", "Login / register tab"),
    ("Enter", "Submit form"),
    ("y / n", "Confirm / cancel delete"),
];

/// Section header row, preceded by a blank separator unless first.
fn push_section(rows: &mut Vec<Row<'static>>, label: &str) {
    if !rows.is_empty() {
        rows.push(Row::new(vec![String::new(), String::new()]));
    }
    let heading = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    rows.push(Row::new(vec![
        Line::from(Span::styled(format!("-- {label} --"), heading)),
        Line::from(""),
    ]));
}

/// Render the help overlay on top of the current view.
pub fn render(f: &mut Frame, app: &App) {
    let overlay = centered_rect(80, 80, f.area());
    if overlay.width < 20 || overlay.height < 6 {
        return;
    }
    f.render_widget(Clear, overlay);

    let bindings = app.keybindings.all_bindings();

    let mut rows: Vec<Row<'static>> = Vec::new();

    for (ctx, label) in &CONTEXT_ORDER {
        let ctx_bindings: Vec<_> = bindings.iter().filter(|(c, _, _, _)| c == ctx).collect();
        if ctx_bindings.is_empty() {
            continue;
        }
        push_section(&mut rows, label);
        for (_, key_str, _, description) in ctx_bindings {
            rows.push(Row::new(vec![format!("  {key_str}"), description.to_string()]));
        }
    }

    push_section(&mut rows, "Dialogs");
    for (key, description) in DIALOG_KEYS {
        rows.push(Row::new(vec![format!("  {key}"), description.to_string()]));
    }

    let total_rows = rows.len();
    let visible_height = overlay.height.saturating_sub(3) as usize;
    let max_scroll = total_rows.saturating_sub(visible_height);
    let scroll = app.help_scroll_offset.min(max_scroll);
    let visible_rows: Vec<Row> = rows.into_iter().skip(scroll).take(visible_height).collect();

    let title = if max_scroll > 0 {
        format!(" Help ({}/{}) ", scroll + 1, max_scroll + 1)
    } else {
        " Help (? to close) ".to_string()
    };

    let table = Table::new(visible_rows, [Constraint::Length(18), Constraint::Min(20)])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(title),
        )
        .header(
            Row::new(vec!["Key", "Action"])
                .style(
                    Style::default()
                        .add_modifier(Modifier::BOLD)
                        .add_modifier(Modifier::UNDERLINED),
                )
                .bottom_margin(1),
        );
    f.render_widget(table, overlay);

    if max_scroll > 0 && scroll < max_scroll {
        let hint = Line::from(Span::styled(
            " j/k to scroll, ? or Esc to close ",
            Style::default().fg(Color::DarkGray),
        ));
        let hint_area = Rect {
            x: overlay.x + 1,
            y: overlay.y + overlay.height.saturating_sub(1),
            width: overlay.width.saturating_sub(2),
            height: 1,
        };
        f.render_widget(Paragraph::new(hint), hint_area);
    }
}
