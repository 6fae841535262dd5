//! Terminal view: command output, processing indicator, command input.

use crate::forms::EditTarget;
use crate::state::App;
use crate::views::helpers::{border_style, render_input};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

pub const NOT_CONFIGURED: &str = "Please configure LLM settings before using the terminal.";

pub fn render(f: &mut Frame<'_>, app: &App, area: Rect) {
    if !app.store.llm.is_configured {
        let notice = Paragraph::new(Span::styled(NOT_CONFIGURED, Style::default().fg(app.theme.warning)))
            .block(Block::default().title("Terminal").borders(Borders::ALL));
        f.render_widget(notice, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(area);

    render_output(f, app, chunks[0]);

    let terminal = &app.store.terminal;
    let placeholder = if terminal.is_processing {
        "Processing..."
    } else {
        "Enter your command... (press Enter)"
    };
    render_input(f, app, EditTarget::Command, "Command", placeholder, chunks[1]);
}

fn render_output(f: &mut Frame<'_>, app: &App, area: Rect) {
    let terminal = &app.store.terminal;
    let text_style = Style::default().fg(app.theme.primary);
    let mut lines: Vec<Line> = terminal
        .output
        .lines()
        .map(|line| Line::from(Span::styled(line.to_string(), text_style)))
        .collect();
    if terminal.is_processing {
        lines.push(Line::from(Span::styled("...", Style::default().fg(app.theme.text_dim))));
    }
    if let Some(error) = &terminal.error {
        lines.push(Line::from(Span::styled(
            format!("Error: {error}"),
            Style::default().fg(app.theme.error),
        )));
    }

    let height = area.height.saturating_sub(2);
    let total = u16::try_from(lines.len()).unwrap_or(u16::MAX);
    let offset = total
        .saturating_sub(height)
        .saturating_sub(app.terminal_view.scroll);

    let output = Paragraph::new(Text::from(lines))
        .block(
            Block::default()
                .title("Output")
                .borders(Borders::ALL)
                .border_style(border_style(&app.theme, false)),
        )
        .wrap(Wrap { trim: false })
        .scroll((offset, 0));
    f.render_widget(output, area);
}
