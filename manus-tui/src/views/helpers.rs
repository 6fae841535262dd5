//! Common view rendering helpers.

use crate::forms::EditTarget;
use crate::state::App;
use crate::theme::Theme;
use crate::widgets::Banner;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::Span,
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub fn two_column(area: Rect, left_percent: u16) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(left_percent),
            Constraint::Percentage(100 - left_percent),
        ])
        .split(area);
    (chunks[0], chunks[1])
}

/// Reserve a three-row strip on top of `area` when a banner is showing.
pub fn with_banner(f: &mut Frame<'_>, banner: Option<Banner>, area: Rect) -> Rect {
    let Some(banner) = banner else {
        return area;
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);
    banner.render(f, chunks[0]);
    chunks[1]
}

pub fn border_style(theme: &Theme, focused: bool) -> Style {
    Style::default().fg(if focused { theme.border_focus } else { theme.border })
}

/// Render the open editor if it targets `target`, otherwise `placeholder`.
pub fn render_input(
    f: &mut Frame<'_>,
    app: &App,
    target: EditTarget,
    title: &str,
    placeholder: &str,
    area: Rect,
) {
    let editing = app.editor.as_ref().filter(|e| e.target == target);
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style(&app.theme, editing.is_some()));
    match editing {
        Some(editor) => {
            let inner = block.inner(area);
            f.render_widget(block, area);
            f.render_widget(editor.textarea.widget(), inner);
        }
        None => {
            let text = Paragraph::new(Span::styled(
                placeholder.to_string(),
                Style::default().fg(app.theme.text_dim),
            ))
            .block(block);
            f.render_widget(text, area);
        }
    }
}
