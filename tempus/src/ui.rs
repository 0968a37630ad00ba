use chrono::{Local, Timelike};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, List, ListItem, Paragraph},
    Frame,
};
use tempus_api::models::TimeBoxEntry;

use crate::app::{App, AppMode};
use crate::config::parse_hex_color;
use crate::stopwatch::format_elapsed;
use crate::timebox::{format_minutes, DayLayout, PlacedBlock};

pub fn draw(f: &mut Frame, app: &App) {
    let area = f.area();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1), Constraint::Length(1)])
        .split(area);
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(36), Constraint::Min(20)])
        .split(rows[1]);
    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(3)])
        .split(columns[0]);

    draw_header(f, rows[0], app);
    draw_stopwatch(f, left[0], app);
    draw_projects(f, left[1], app);
    draw_day(f, columns[1], app);
    draw_status_bar(f, rows[2], app);

    if app.mode == AppMode::EditingDescription {
        draw_input_overlay(f, "Description", &app.input_buffer, app);
    }
}

fn panel<'a>(title: String, app: &App) -> Block<'a> {
    let theme = &app.config.theme;
    Block::default()
        .title(Span::styled(title, Style::default().fg(theme.muted)))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.planned))
}

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.config.theme;
    let mut spans = vec![
        Span::styled(
            "TEMPUS",
            Style::default()
                .fg(theme.planned)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            app.day.format("%A, %d %B %Y").to_string(),
            Style::default().fg(theme.foreground),
        ),
    ];
    if app.is_loading() {
        spans.push(Span::styled("  loading…", Style::default().fg(theme.muted)));
    }
    f.render_widget(
        Paragraph::new(Line::from(spans))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::BOTTOM)
                    .border_style(Style::default().fg(theme.muted)),
            ),
        area,
    );
}

fn draw_stopwatch(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.config.theme;
    let timer = &app.timer;
    let block = panel(" Stopwatch ".to_string(), app);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let (icon, color) = if timer.is_running {
        ("▶", theme.running)
    } else {
        ("■", theme.muted)
    };
    let description = if timer.description.is_empty() {
        app.config.stopwatch.default_description.as_str()
    } else {
        timer.description.as_str()
    };
    let project = app.projects.find(timer.project_id);
    let project_span = match project {
        Some(p) => Span::styled(
            p.name.clone(),
            Style::default().fg(parse_hex_color(&p.color).unwrap_or(theme.foreground)),
        ),
        None => Span::styled("No project", Style::default().fg(theme.muted)),
    };

    let lines = vec![
        Line::from(Span::styled(
            format!("{icon} {}", format_elapsed(timer.elapsed_millis)),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center),
        Line::from(Span::styled(
            description.to_string(),
            Style::default().fg(theme.foreground),
        ))
        .alignment(Alignment::Center),
        Line::from(project_span).alignment(Alignment::Center),
    ];
    f.render_widget(Paragraph::new(lines), inner);
}

fn draw_projects(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.config.theme;
    let selected = app.timer.project_id;
    let items: Vec<ListItem> = app
        .projects
        .projects()
        .iter()
        .map(|p| {
            let marker = if Some(p.id) == selected { "▸ " } else { "  " };
            ListItem::new(Line::from(vec![
                Span::styled(marker, Style::default().fg(theme.selection)),
                Span::styled(
                    "● ",
                    Style::default().fg(parse_hex_color(&p.color).unwrap_or(theme.muted)),
                ),
                Span::styled(p.name.clone(), Style::default().fg(theme.foreground)),
            ]))
        })
        .collect();

    let block = panel(" Projects ".to_string(), app);
    if items.is_empty() {
        f.render_widget(
            Paragraph::new("No projects")
                .style(Style::default().fg(theme.muted))
                .alignment(Alignment::Center)
                .block(block),
            area,
        );
        return;
    }
    f.render_widget(List::new(items).block(block), area);
}

fn draw_day(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.config.theme;
    let layout = &app.config.timebox;
    let tracked = app.entries.tracked_index();
    let day = DayLayout::build(app.boxes.boxes(), &tracked, app.day, layout, &Local);

    let title = format!(
        " Time boxes · {} planned · {} ",
        day.summary.count,
        format_minutes(day.summary.total_minutes)
    );
    let block = panel(title, app);
    let inner = block.inner(area);
    f.render_widget(block, area);

    const LABEL_WIDTH: u16 = 6;
    if inner.width <= LABEL_WIDTH || inner.height == 0 {
        return;
    }
    let grid = Rect {
        x: inner.x + LABEL_WIDTH,
        width: inner.width - LABEL_WIDTH,
        ..inner
    };
    let scroll = f64::from(app.scroll);

    let now = Local::now();
    for slot in &day.slots {
        let top = f64::from(slot.hour - layout.start_hour) * layout.hour_height - scroll;
        let Some(row) = visible_row(top, inner) else {
            continue;
        };
        let is_now = app.day == now.date_naive() && slot.hour == now.hour();
        let style = if is_now {
            Style::default()
                .fg(theme.selection)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.muted)
        };
        f.render_widget(
            Paragraph::new(format!("{:02}:00", slot.hour)).style(style),
            Rect {
                x: inner.x,
                y: row,
                width: LABEL_WIDTH - 1,
                height: 1,
            },
        );
        f.render_widget(
            Paragraph::new("┈".repeat(grid.width as usize))
                .style(Style::default().fg(theme.muted)),
            Rect {
                y: row,
                height: 1,
                ..grid
            },
        );
    }

    for block in &day.blocks {
        if let Some(rect) = block_rect(block, grid, scroll) {
            draw_block(f, rect, block, app);
        }
    }
}

/// Screen row for a grid offset, if it lands inside `area`.
fn visible_row(top: f64, area: Rect) -> Option<u16> {
    if top < 0.0 || top >= f64::from(area.height) {
        return None;
    }
    Some(area.y + top.floor() as u16)
}

fn block_rect(block: &PlacedBlock<'_, TimeBoxEntry>, grid: Rect, scroll: f64) -> Option<Rect> {
    let top = block.placement.top - scroll;
    let bottom = block.placement.bottom() - scroll;
    let visible_top = top.max(0.0);
    let visible_bottom = bottom.min(f64::from(grid.height));
    if visible_bottom <= visible_top {
        return None;
    }

    let columns = block.columns.max(1) as u16;
    let width = grid.width / columns;
    if width == 0 {
        return None;
    }
    let y = grid.y + visible_top.floor() as u16;
    let height = ((visible_bottom - visible_top).round() as u16).max(1);
    Some(Rect {
        x: grid.x + width * block.column as u16,
        y,
        width,
        height: height.min(grid.bottom().saturating_sub(y)),
    })
}

fn draw_block(f: &mut Frame, area: Rect, block: &PlacedBlock<'_, TimeBoxEntry>, app: &App) {
    let theme = &app.config.theme;
    let entry = block.entry;
    let project = app.projects.find(entry.project_id);
    let fallback = if block.tracked {
        theme.tracked
    } else {
        theme.planned
    };
    let color = project
        .and_then(|p| parse_hex_color(&p.color))
        .unwrap_or(fallback);

    let mark = if block.tracked { "✓ " } else { "" };
    let start = entry.start_date.with_timezone(&Local);
    let end = entry.end_date.with_timezone(&Local);
    let text = Line::from(vec![
        Span::styled(
            mark,
            Style::default()
                .fg(theme.tracked)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(
                "{} {}-{}",
                entry.description,
                start.format("%H:%M"),
                end.format("%H:%M")
            ),
            Style::default().fg(theme.background),
        ),
    ]);
    let style = if block.tracked {
        Style::default().bg(color).add_modifier(Modifier::DIM)
    } else {
        Style::default().bg(color)
    };
    f.render_widget(Clear, area);
    f.render_widget(Paragraph::new(text).style(style), area);
}

fn draw_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.config.theme;
    let (mode_text, mode_color) = match app.mode {
        AppMode::Normal => ("NORMAL", theme.running),
        AppMode::EditingDescription => ("EDIT", theme.selection),
    };
    let mut spans = vec![
        Span::styled(
            format!(" {mode_text} "),
            Style::default()
                .bg(mode_color)
                .fg(theme.background)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
    ];
    match app.last_error() {
        Some(message) => {
            spans.push(Span::styled(message.to_string(), Style::default().fg(theme.error)))
        }
        None if app.mode == AppMode::Normal => spans.push(Span::raw(
            "space:start/stop │ e:edit │ p:project │ [/]:day │ t:today │ r:refresh │ q:quit",
        )),
        None => spans.push(Span::raw("enter:confirm │ esc:cancel")),
    }
    f.render_widget(
        Paragraph::new(Line::from(spans))
            .style(Style::default().bg(theme.background).fg(theme.muted)),
        area,
    );
}

fn draw_input_overlay(f: &mut Frame, title: &str, input: &str, app: &App) {
    let theme = &app.config.theme;
    let area = centered_rect(60, 20, f.area());
    f.render_widget(Clear, area);
    let block = Block::default()
        .title(format!(" {title} "))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.selection))
        .border_type(BorderType::Double)
        .style(Style::default().bg(theme.background));
    let inner = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("▸ ", Style::default().fg(theme.foreground)),
            Span::styled(input, Style::default().fg(theme.foreground)),
            Span::styled(
                "▊",
                Style::default()
                    .fg(theme.foreground)
                    .add_modifier(Modifier::SLOW_BLINK),
            ),
        ])),
        inner,
    );
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
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
