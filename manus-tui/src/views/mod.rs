//! View rendering dispatch.

pub mod agent;
pub mod flow;
pub mod helpers;
pub mod llm;
pub mod terminal;

use crate::nav::View;
use crate::notifications::NotificationLevel;
use crate::state::App;
use crate::theme::notification_color;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub fn render_view(f: &mut Frame<'_>, app: &App) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.size());

    render_header(f, app, layout[0]);

    match app.active_view {
        View::Terminal => terminal::render(f, app, layout[1]),
        View::LlmConfig => llm::render(f, app, layout[1]),
        View::AgentConfig => agent::render(f, app, layout[1]),
        View::Flow => flow::render(f, app, layout[1]),
    }

    render_footer(f, app, layout[2]);
}

fn render_header(f: &mut Frame<'_>, app: &App, area: Rect) {
    let mut tabs = Vec::new();
    for (index, view) in View::all().iter().enumerate() {
        let style = if *view == app.active_view {
            Style::default()
                .fg(app.theme.primary)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(app.theme.text_dim)
        };
        tabs.push(Span::styled(format!(" {} {} ", index + 1, view.title()), style));
    }
    let stream = match (&app.store.flow.flow_id, app.stream_connected) {
        (Some(id), true) => format!("Stream: {id}"),
        (Some(_), false) => "Stream: closed".to_string(),
        (None, _) => "Stream: idle".to_string(),
    };
    let title = format!("OpenManus | {} | {}", app.config.api_base_url, stream);
    let header = Paragraph::new(Line::from(tabs)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border))
            .title(Span::styled(title, Style::default().fg(app.theme.primary))),
    );
    f.render_widget(header, area);
}

fn help_text(app: &App) -> &'static str {
    if app.is_editing() {
        return "Enter commit • Esc cancel • ↑/↓ history";
    }
    match app.active_view {
        View::Terminal => "Enter type command • j/k scroll • Ctrl-L clear • Tab switch • q quit",
        View::LlmConfig => "j/k move • Enter edit • Space cycle • s save • r reload • q quit",
        View::AgentConfig => "j/k move • Enter edit • Space toggle • s create • h/l pane • c cycle type • r refresh • q quit",
        View::Flow => "n new • Enter select • c status • d delete • h/l pane • x start • r refresh • z reset • q quit",
    }
}

fn render_footer(f: &mut Frame<'_>, app: &App, area: Rect) {
    let (text, style) = match app.notifications.last() {
        Some(note) => {
            let label = match note.level {
                NotificationLevel::Info => "INFO",
                NotificationLevel::Warning => "WARN",
                NotificationLevel::Error => "ERROR",
                NotificationLevel::Success => "SUCCESS",
            };
            (
                format!("{label}: {}", note.message),
                Style::default().fg(notification_color(note.level, &app.theme)),
            )
        }
        None => (help_text(app).to_string(), Style::default().fg(app.theme.text_dim)),
    };
    let footer = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(app.theme.border)))
        .style(style);
    f.render_widget(footer, area);
}
