use crate::state::{App, FormField, Mode, StreamRow};
use crate::theme;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};
use std::time::{SystemTime, UNIX_EPOCH};
use vms_core::{InferenceResult, ModelSummary};
use vms_sync::PollStatus;

pub fn render(f: &mut Frame, app: &App) {
    let area = f.size();

    let mut constraints = vec![Constraint::Length(3)];
    if app.mode == Mode::Form {
        constraints.push(Constraint::Length(5));
    }
    constraints.push(Constraint::Min(5));
    if !app.alerts.is_empty() {
        constraints.push(Constraint::Length(app.alerts.len() as u16 + 2));
    }
    constraints.push(Constraint::Length(1));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let mut next = 0;
    render_header(f, app, chunks[next]);
    next += 1;
    if app.mode == Mode::Form {
        render_form(f, app, chunks[next]);
        next += 1;
    }
    render_streams(f, app, chunks[next]);
    next += 1;
    if !app.alerts.is_empty() {
        render_alerts(f, app, chunks[next]);
        next += 1;
    }
    render_footer(f, app, chunks[next]);
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let models = match &app.health {
        Some(health) if !health.models.is_empty() => {
            format!("models: {}", health.models.join(", "))
        }
        Some(_) => "models: (none advertised)".to_string(),
        None => "models: unavailable".to_string(),
    };

    let mut lines = vec![
        Line::from(Span::styled("VMS Console", theme::HEADER_STYLE)),
        Line::from(Span::styled(models, Style::default().fg(theme::MUTED))),
    ];
    if let Some(note) = &app.status_note {
        lines.push(Line::from(Span::styled(
            note.clone(),
            Style::default().fg(theme::WARN),
        )));
    }
    f.render_widget(Paragraph::new(lines), area);
}

fn render_form(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("start stream (Enter submit, Esc cancel, Tab next field)")
        .border_style(Style::default().fg(theme::ACCENT));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let fields = [
        (FormField::StreamId, app.form.stream_id.as_str()),
        (FormField::Source, app.form.source.as_str()),
        (FormField::Models, app.form.models.as_str()),
    ];
    let lines: Vec<Line> = fields
        .iter()
        .map(|(field, value)| {
            let focused = *field == app.form_field;
            let marker = if focused { "> " } else { "  " };
            let label_style = if focused {
                Style::default()
                    .fg(theme::ACCENT)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme::MUTED)
            };
            Line::from(vec![
                Span::styled(format!("{marker}{:<10}", field.label()), label_style),
                Span::styled(value.to_string(), Style::default().fg(theme::TEXT)),
            ])
        })
        .collect();
    f.render_widget(Paragraph::new(lines), inner);
}

fn render_streams(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("streams ({})", app.rows.len()));

    if app.rows.is_empty() {
        let inner = block.inner(area);
        f.render_widget(block, area);
        f.render_widget(
            Paragraph::new(Span::styled(
                "no streams; press 's' to start one",
                Style::default().fg(theme::MUTED),
            )),
            inner,
        );
        return;
    }

    let now = unix_seconds();
    let header = Row::new(
        ["ID", "SOURCE", "MODELS", "STATUS", "AGE", "LATEST RESULTS"]
            .into_iter()
            .map(Cell::from),
    )
    .style(theme::HEADER_STYLE);

    let rows: Vec<Row> = app
        .rows
        .iter()
        .map(|(stream_id, row)| stream_table_row(stream_id, row, now))
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(14),
            Constraint::Length(20),
            Constraint::Length(24),
            Constraint::Length(10),
            Constraint::Length(5),
            Constraint::Min(30),
        ],
    )
    .header(header)
    .block(block)
    .highlight_style(theme::SELECTED_STYLE);

    let mut state = TableState::default();
    state.select(Some(app.selected));
    f.render_stateful_widget(table, area, &mut state);
}

fn stream_table_row<'a>(stream_id: &'a str, row: &'a StreamRow, now: f64) -> Row<'a> {
    let (source, models, running, age) = match &row.descriptor {
        Some(descriptor) => (
            descriptor.source.clone(),
            descriptor.models.join(", "),
            Some(descriptor.running),
            format_age(descriptor.last_timestamp.map(|ts| now - ts)),
        ),
        None => (String::new(), String::new(), None, "-".to_string()),
    };

    let status_cell = match running {
        Some(true) => Span::styled("running", Style::default().fg(theme::running_color(true))),
        Some(false) => Span::styled("stopped", Style::default().fg(theme::running_color(false))),
        None => Span::styled("…", Style::default().fg(theme::MUTED)),
    };

    let results = results_lines(row);
    let height = results.len().max(1) as u16;

    Row::new(vec![
        Cell::from(stream_id),
        Cell::from(source),
        Cell::from(models),
        Cell::from(status_cell),
        Cell::from(age),
        Cell::from(Text::from(results)),
    ])
    .height(height)
}

fn results_lines(row: &StreamRow) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    if row.poll.status == PollStatus::Failed {
        let message = row
            .poll
            .error
            .clone()
            .unwrap_or_else(|| "fetch failed".to_string());
        lines.push(Line::from(Span::styled(
            format!("! {message}"),
            Style::default().fg(theme::CRITICAL),
        )));
    }

    for result in row.poll.latest_by_model.values() {
        if let Some(text) = summary_text(result) {
            lines.push(Line::from(Span::styled(
                text,
                Style::default().fg(summary_color(result)),
            )));
        }
    }

    if lines.is_empty() {
        let placeholder = match row.poll.status {
            PollStatus::Pending => "loading...",
            _ => "no results yet",
        };
        lines.push(Line::from(Span::styled(
            placeholder,
            Style::default().fg(theme::MUTED),
        )));
    }

    lines
}

/// Closed presentation dispatch over the known model kinds. Unknown models
/// (and known models whose payload failed to decode) render nothing.
pub fn summary_text(result: &InferenceResult) -> Option<String> {
    match &result.summary {
        ModelSummary::AssetDetection(summary) => {
            let detections = summary
                .detections
                .iter()
                .map(|det| format!("{} {}%", det.class, percent(det.confidence)))
                .collect::<Vec<_>>()
                .join(", ");
            if detections.is_empty() {
                Some(format!("assets: {} objects", summary.objects))
            } else {
                Some(format!("assets: {} objects ({detections})", summary.objects))
            }
        }
        ModelSummary::DefectAnalysis(summary) => Some(format!(
            "defects: {}% {} (conf {}%)",
            percent(summary.defect_score),
            summary.defect_type,
            percent(summary.confidence),
        )),
        ModelSummary::RoadCondition(summary) => Some(format!(
            "road: {} {}% ({}, {})",
            summary.condition.label().to_uppercase(),
            percent(summary.score),
            summary.surface_type,
            summary.weather_impact,
        )),
        ModelSummary::TrafficAnalysis(summary) => Some(format!(
            "traffic: {} veh @ {} km/h, {} ({}%)",
            summary.vehicle_count,
            summary.average_speed.round() as i64,
            summary.density,
            percent(summary.congestion_level),
        )),
        ModelSummary::Other(_) => None,
    }
}

fn summary_color(result: &InferenceResult) -> ratatui::style::Color {
    match &result.summary {
        ModelSummary::AssetDetection(_) => theme::TEXT,
        ModelSummary::DefectAnalysis(summary) => theme::defect_score_color(summary.defect_score),
        ModelSummary::RoadCondition(summary) => theme::road_state_color(&summary.condition),
        ModelSummary::TrafficAnalysis(summary) => theme::density_color(summary.density),
        ModelSummary::Other(_) => theme::MUTED,
    }
}

fn render_alerts(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("alerts");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let lines: Vec<Line> = app
        .alerts
        .iter()
        .map(|alert| {
            Line::from(vec![
                Span::styled(
                    format!("[{}] ", alert.level),
                    Style::default().fg(theme::alert_level_color(alert.level)),
                ),
                Span::styled(
                    format!("{}: {}", alert.stream_id, alert.message),
                    Style::default().fg(theme::TEXT),
                ),
            ])
        })
        .collect();
    f.render_widget(Paragraph::new(lines), inner);
}

fn render_footer(f: &mut Frame, app: &App, area: Rect) {
    let hints = match app.mode {
        Mode::Streams => "q quit | j/k select | s start form | x stop selected",
        Mode::Form => "Enter submit | Tab/Shift-Tab field | Esc cancel",
    };
    f.render_widget(
        Paragraph::new(Span::styled(hints, Style::default().fg(theme::MUTED))),
        area,
    );
}

fn percent(value: f64) -> i64 {
    (value * 100.0).round() as i64
}

fn unix_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs_f64())
        .unwrap_or_default()
}

fn format_age(delta_secs: Option<f64>) -> String {
    let Some(delta) = delta_secs else {
        return "-".to_string();
    };
    let delta = delta.max(0.0) as u64;
    if delta < 60 {
        format!("{delta}s")
    } else if delta < 3_600 {
        format!("{}m", delta / 60)
    } else {
        format!("{}h", delta / 3_600)
    }
}
