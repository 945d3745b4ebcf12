use ratatui::style::{Color, Modifier, Style};
use vms_core::{AlertLevel, Density, RoadState};

pub const HEADER_STYLE: Style = Style::new()
    .fg(Color::Rgb(191, 219, 254))
    .add_modifier(Modifier::BOLD);
pub const SELECTED_STYLE: Style = Style::new()
    .bg(Color::Rgb(56, 189, 248))
    .fg(Color::Black)
    .add_modifier(Modifier::BOLD);
pub const MUTED: Color = Color::Rgb(148, 163, 184);
pub const TEXT: Color = Color::Rgb(226, 232, 240);
pub const OK: Color = Color::Rgb(34, 197, 94);
pub const WARN: Color = Color::Rgb(245, 158, 11);
pub const CRITICAL: Color = Color::Rgb(239, 68, 68);
pub const ACCENT: Color = Color::Rgb(56, 189, 248);

pub fn running_color(running: bool) -> Color {
    if running {
        OK
    } else {
        MUTED
    }
}

pub fn alert_level_color(level: AlertLevel) -> Color {
    match level {
        AlertLevel::Info => ACCENT,
        AlertLevel::Warn => WARN,
        AlertLevel::Critical => CRITICAL,
    }
}

pub fn defect_score_color(score: f64) -> Color {
    if score > 0.7 {
        CRITICAL
    } else if score > 0.3 {
        WARN
    } else {
        OK
    }
}

pub fn density_color(density: Density) -> Color {
    match density {
        Density::Low => OK,
        Density::Medium => WARN,
        Density::High => CRITICAL,
    }
}

pub fn road_state_color(state: &RoadState) -> Color {
    match state {
        RoadState::Excellent | RoadState::Good => OK,
        RoadState::Fair => WARN,
        RoadState::Poor | RoadState::Other(_) => CRITICAL,
    }
}
