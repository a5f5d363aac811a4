use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph};

use crate::app::{App, Focus, LayoutCache};

const LABEL_WIDTH: usize = 15;

/// Draw the whole screen and record hit areas for the mouse.
pub fn render(frame: &mut Frame, app: &mut App) {
    app.layout = LayoutCache::default();

    let area = centered_rect(80, 80, frame.area());
    let block = Block::default()
        .title(" Address ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.frost_blue()))
        .style(Style::default().bg(app.theme.bg()));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    render_search(frame, app, chunks[0]);
    render_form(frame, app, chunks[2]);
    render_help(frame, app, chunks[3]);
    render_status(frame, app, chunks[4]);

    // Dropdown last so it overlays the form.
    render_dropdown(frame, app, chunks[0], inner);
}

fn render_search(frame: &mut Frame, app: &mut App, area: Rect) {
    let focused = app.focus == Focus::Search;
    let border = if focused {
        app.theme.active_input()
    } else {
        app.theme.border()
    };
    let block = Block::default()
        .title(" Search address ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));
    let inner = block.inner(area);

    let input = app.widget.input();
    let line = if input.value.is_empty() && !focused {
        Line::from(Span::styled(
            "Start typing a street address…",
            Style::default().fg(app.theme.muted()),
        ))
    } else {
        Line::from(Span::styled(
            input.value.clone(),
            Style::default().fg(app.theme.fg_bright()),
        ))
    };
    frame.render_widget(Paragraph::new(line).block(block), area);

    if focused {
        let x = inner.x + (input.cursor_column() as u16).min(inner.width.saturating_sub(1));
        frame.set_cursor_position((x, inner.y));
    }
    app.layout.search = Some(area);
}

fn render_dropdown(frame: &mut Frame, app: &mut App, search: Rect, bounds: Rect) {
    let dropdown = app.widget.dropdown();
    if !dropdown.is_visible() {
        return;
    }

    let y = search.y + search.height;
    let available = (bounds.y + bounds.height).saturating_sub(y);
    let height = (dropdown.len() as u16 + 2).min(available);
    if height < 3 {
        return;
    }
    let area = Rect {
        x: search.x,
        y,
        width: search.width,
        height,
    };
    frame.render_widget(Clear, area);

    let items: Vec<ListItem> = dropdown
        .candidates()
        .iter()
        .enumerate()
        .map(|(i, candidate)| {
            let style = if dropdown.selected() == Some(i) {
                Style::default()
                    .bg(app.theme.selection_bg())
                    .fg(app.theme.fg_bright())
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(app.theme.fg())
            };
            ListItem::new(Span::styled(format!(" {} ", candidate.label), style))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.green()))
        .style(Style::default().bg(app.theme.bg_secondary()));
    let inner = block.inner(area);
    frame.render_widget(List::new(items).block(block), area);

    let rows = (dropdown.len() as u16).min(inner.height);
    app.layout.dropdown_rows = Some(Rect { height: rows, ..inner });
}

fn render_form(frame: &mut Frame, app: &mut App, area: Rect) {
    let form = app.widget.form();
    if !form.fields().any(|f| f.visible) {
        let hint = Paragraph::new(Line::from(Span::styled(
            "  Address fields appear once you pick a suggestion.",
            Style::default().fg(app.theme.muted()),
        )));
        frame.render_widget(hint, area);
        return;
    }

    let mut lines = Vec::new();
    let mut cursor = None;
    for field in form.fields().filter(|f| f.visible) {
        let row = area.y + lines.len() as u16;
        if row >= area.y + area.height {
            break;
        }
        let is_active = app.focus == Focus::Field(field.id);
        let label_style = if is_active {
            Style::default().fg(app.theme.frost_ice()).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(app.theme.muted())
        };
        let value_style = if field.enabled {
            Style::default().fg(app.theme.fg())
        } else {
            Style::default().fg(app.theme.muted()).add_modifier(Modifier::DIM)
        };
        let indicator = if is_active { "▶ " } else { "  " };
        let label = format!("{:<width$}", format!("{}:", field.id.label()), width = LABEL_WIDTH);
        let value = if field.value().is_empty() && !is_active {
            "─".to_string()
        } else {
            field.value().to_string()
        };

        if is_active {
            let x = area.x + (indicator.chars().count() + LABEL_WIDTH) as u16
                + field.input.cursor_column() as u16;
            cursor = Some((x.min(area.x + area.width.saturating_sub(1)), row));
        }

        lines.push(Line::from(vec![
            Span::styled(indicator, Style::default().fg(app.theme.frost_ice())),
            Span::styled(label, label_style),
            Span::styled(value, value_style),
        ]));
        app.layout.fields.push((field.id, Rect { y: row, height: 1, ..area }));
    }

    frame.render_widget(Paragraph::new(lines), area);
    if let Some(position) = cursor {
        frame.set_cursor_position(position);
    }
}

fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let text = match app.focus {
        Focus::Search => "  ↑/↓: choose  Enter: fill form  Tab: edit fields  Esc: close/quit",
        Focus::Field(_) => "  Tab/↓: next field  Shift-Tab/↑: previous  Esc: back to search",
    };
    frame.render_widget(
        Paragraph::new(Span::styled(
            text,
            Style::default().fg(app.theme.muted()).add_modifier(Modifier::DIM),
        )),
        area,
    );
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let left = if app.in_flight > 0 {
        Span::styled(" Searching…", Style::default().fg(app.theme.frost_ice()))
    } else {
        Span::styled(
            format!(" {}", app.status_message),
            Style::default().fg(app.theme.warning()),
        )
    };
    let right = format!("{} · {} ", app.location_label(), app.geocoder_name());

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(10), Constraint::Length(right.chars().count() as u16)])
        .split(area);

    frame.render_widget(Paragraph::new(left), chunks[0]);
    frame.render_widget(
        Paragraph::new(Span::styled(right, Style::default().fg(app.theme.muted()))),
        chunks[1],
    );
}

pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
