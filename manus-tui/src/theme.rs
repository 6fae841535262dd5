//! Terminal theme and color utilities.

use crate::notifications::NotificationLevel;
use crate::store::RequestStatus;
use manus_core::StepStatus;
use ratatui::style::Color;

#[derive(Debug, Clone)]
pub struct Theme {
    pub bg: Color,
    pub bg_highlight: Color,
    pub primary: Color,
    pub primary_dim: Color,
    pub accent: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,
    pub text: Color,
    pub text_dim: Color,
    pub border: Color,
    pub border_focus: Color,
}

impl Theme {
    /// Green on black.
    pub fn terminal() -> Self {
        Self {
            bg: Color::Rgb(0, 0, 0),
            bg_highlight: Color::Rgb(24, 40, 24),
            primary: Color::Rgb(0, 255, 65),
            primary_dim: Color::Rgb(0, 143, 17),
            accent: Color::Rgb(0, 200, 255),
            success: Color::Rgb(0, 255, 65),
            warning: Color::Rgb(255, 204, 0),
            error: Color::Rgb(255, 64, 64),
            info: Color::Rgb(0, 200, 255),
            text: Color::Rgb(220, 255, 220),
            text_dim: Color::Rgb(110, 140, 110),
            border: Color::Rgb(0, 90, 20),
            border_focus: Color::Rgb(0, 255, 65),
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "terminal" => Some(Self::terminal()),
            _ => None,
        }
    }
}

pub fn step_status_color(status: StepStatus, theme: &Theme) -> Color {
    match status {
        StepStatus::NotStarted => theme.text_dim,
        StepStatus::InProgress => theme.accent,
        StepStatus::Completed => theme.success,
        StepStatus::Blocked => theme.error,
    }
}

pub fn request_status_color(status: RequestStatus, theme: &Theme) -> Color {
    match status {
        RequestStatus::Idle => theme.text_dim,
        RequestStatus::Loading => theme.warning,
        RequestStatus::Succeeded => theme.success,
        RequestStatus::Failed => theme.error,
    }
}

pub fn notification_color(level: NotificationLevel, theme: &Theme) -> Color {
    match level {
        NotificationLevel::Info => theme.info,
        NotificationLevel::Warning => theme.warning,
        NotificationLevel::Error => theme.error,
        NotificationLevel::Success => theme.success,
    }
}
