use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};

use super::app::{AddField, App, Pane};

pub fn render(frame: &mut Frame, app: &App) {
    let mut constraints = vec![Constraint::Min(0)];
    if !app.alerts.is_empty() {
        constraints.push(Constraint::Length(app.alerts.len() as u16 + 2));
    }
    constraints.push(Constraint::Length(1));
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(frame.area());

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Percentage(30),
            Constraint::Percentage(30),
        ])
        .split(chunks[0]);
    for (pane, area) in Pane::ALL.into_iter().zip(columns.iter()) {
        render_pane(frame, app, pane, *area);
    }

    if !app.alerts.is_empty() {
        render_alerts(frame, app, chunks[1]);
    }
    render_status(frame, app, chunks[chunks.len() - 1]);

    if app.show_help {
        render_help(frame);
    }
    if app.add_form.is_some() {
        render_add_dialog(frame, app);
    }
}

fn render_pane(frame: &mut Frame, app: &App, pane: Pane, area: Rect) {
    let focused = app.pane == pane;
    let items: Vec<ListItem> = app
        .rows(pane)
        .iter()
        .map(|row| {
            let text_style = match pane {
                Pane::Completed => Style::default().fg(Color::DarkGray).crossed_out(),
                Pane::Deleted => Style::default().fg(Color::DarkGray),
                Pane::Pending if row.reminder_pending => Style::default().fg(Color::Yellow),
                Pane::Pending => Style::default(),
            };
            ListItem::new(vec![
                Line::from(Span::styled(row.text.clone(), text_style.bold())),
                Line::from(Span::styled(
                    format!("  {}", row.meta),
                    Style::default().fg(Color::DarkGray),
                )),
            ])
        })
        .collect();

    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(pane.title()),
        )
        .highlight_style(Style::default().bg(Color::DarkGray));

    let mut state = ListState::default();
    if focused && !app.rows(pane).is_empty() {
        state.select(Some(app.cursor(pane)));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_alerts(frame: &mut Frame, app: &App, area: Rect) {
    let text: Vec<Line> = app.alerts.iter().map(|a| Line::from(a.as_str())).collect();
    let paragraph = Paragraph::new(text)
        .style(Style::default().fg(Color::Yellow).bold())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Reminders (x: dismiss) "),
        );
    frame.render_widget(paragraph, area);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let line = match &app.error {
        Some(err) => Paragraph::new(err.as_str()).style(Style::default().fg(Color::Red)),
        None => Paragraph::new("a: add  c: complete  d: delete  u: undo  Tab: pane  ?: help  q: quit")
            .style(Style::default().fg(Color::DarkGray)),
    };
    frame.render_widget(line, area);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn render_help(frame: &mut Frame) {
    let help = "\
j/k, Up/Down    move
Tab/Shift-Tab   switch pane
a               add a task
c, Enter        complete (Pending)
d               delete
u, Enter        restore (Deleted)
x               dismiss reminder / error
?               toggle help
q, Esc          quit";
    let area = centered(frame.area(), 44, 11);
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(help).block(Block::default().borders(Borders::ALL).title(" Help ")),
        area,
    );
}

fn render_field(frame: &mut Frame, label: &str, value: &str, focused: bool, area: Rect) {
    let label_style = if focused {
        Style::default().fg(Color::Cyan).bold()
    } else {
        Style::default()
    };
    let cursor = if focused { "_" } else { "" };
    let lines = vec![
        Line::from(Span::styled(label, label_style)),
        Line::from(format!("  {value}{cursor}")),
    ];
    frame.render_widget(Paragraph::new(lines), area);
}

fn render_add_dialog(frame: &mut Frame, app: &App) {
    let Some(form) = &app.add_form else {
        return;
    };
    let area = centered(frame.area(), 60, 9);
    frame.render_widget(Clear, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Add task (Enter: save, Tab: field, Esc: cancel) ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(2),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);
    render_field(frame, "Task", &form.text, form.focused == AddField::Text, rows[0]);
    render_field(
        frame,
        "Reminder (YYYY-MM-DD HH:MM, optional)",
        &form.reminder,
        form.focused == AddField::Reminder,
        rows[1],
    );
    if let Some(err) = &form.error {
        frame.render_widget(
            Paragraph::new(err.as_str())
                .style(Style::default().fg(Color::Red))
                .wrap(Wrap { trim: true }),
            rows[3],
        );
    }
}
