//! LLM configuration view.

use crate::forms::{EditTarget, LlmField};
use crate::state::App;
use crate::store::RequestStatus;
use crate::views::helpers::{border_style, render_input, two_column, with_banner};
use crate::widgets::{Banner, DetailPanel};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

pub fn render(f: &mut Frame<'_>, app: &App, area: Rect) {
    let llm = &app.store.llm;
    let banner = Banner::for_message(llm.message.as_ref(), llm.status, &app.theme);
    let area = with_banner(f, banner, area);
    let (form_area, detail_area) = two_column(area, 60);

    let editing_field = app.editor.as_ref().and_then(|e| match e.target {
        EditTarget::LlmField(field) => Some(field),
        _ => None,
    });
    let form_area = match editing_field {
        Some(field) => {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(3), Constraint::Length(3)])
                .split(form_area);
            render_input(f, app, EditTarget::LlmField(field), field.label(), "", chunks[1]);
            chunks[0]
        }
        None => form_area,
    };

    let items: Vec<ListItem> = LlmField::all()
        .iter()
        .map(|field| {
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:<12}", field.label()), Style::default().fg(app.theme.text_dim)),
                Span::styled(app.llm_form.display_value(*field), Style::default().fg(app.theme.text)),
            ]))
        })
        .collect();
    let mut state = ListState::default();
    state.select(Some(app.llm_form.focus));

    let title = if llm.status == RequestStatus::Loading {
        "LLM Configuration (Saving...)"
    } else {
        "LLM Configuration"
    };
    let list = List::new(items)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(border_style(&app.theme, editing_field.is_none())),
        )
        .highlight_style(
            Style::default()
                .bg(app.theme.bg_highlight)
                .add_modifier(Modifier::BOLD),
        );
    f.render_stateful_widget(list, form_area, &mut state);

    let mut fields = vec![
        ("Configured", if llm.is_configured { "yes" } else { "no" }.to_string()),
        ("Status", format!("{:?}", llm.status).to_lowercase()),
    ];
    if let Some(error) = &llm.error {
        fields.push(("Error", error.clone()));
    }
    if app.llm_form.dirty {
        fields.push(("Draft", "unsaved changes".to_string()));
    }
    DetailPanel {
        title: "Saved Settings",
        fields,
        label_style: Style::default().fg(app.theme.accent),
        border_style: border_style(&app.theme, false),
        empty: "",
    }
    .render(f, detail_area);
}
