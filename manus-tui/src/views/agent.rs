//! Agent configuration view: creation form, tool selector, registry.

use crate::forms::{AgentPane, AgentRow, EditTarget};
use crate::state::App;
use crate::store::RequestStatus;
use crate::views::helpers::{border_style, render_input, two_column, with_banner};
use crate::widgets::{Banner, Checklist, ChecklistItem, DetailPanel};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

pub fn render(f: &mut Frame<'_>, app: &App, area: Rect) {
    let agents = &app.store.agent;
    let banner = Banner::for_message(agents.message.as_ref(), agents.status, &app.theme);
    let area = with_banner(f, banner, area);
    let (form_area, registry_area) = two_column(area, 55);
    render_form(f, app, form_area);
    render_registry(f, app, registry_area);
}

fn render_form(f: &mut Frame<'_>, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(3),
        ])
        .split(area);

    let form = &app.agent_form;
    let tools = &app.store.agent.available_tools;
    let focused = form.pane == AgentPane::Form;
    let row = form.row(tools.len());

    let name_title = if focused && row == AgentRow::Name { "› Agent Name" } else { "Agent Name" };
    let name = if form.name.is_empty() { "(Enter to edit)" } else { form.name.as_str() };
    render_input(f, app, EditTarget::AgentName, name_title, name, chunks[0]);

    let type_focused = focused && row == AgentRow::Type;
    let agent_type = Paragraph::new(Span::styled(
        format!("{}  (Space to cycle)", form.agent_type.label()),
        Style::default().fg(app.theme.text),
    ))
    .block(
        Block::default()
            .title(if type_focused { "› Agent Type" } else { "Agent Type" })
            .borders(Borders::ALL)
            .border_style(border_style(&app.theme, type_focused)),
    );
    f.render_widget(agent_type, chunks[1]);

    let cursor = match row {
        AgentRow::Tool(index) if focused => Some(index),
        _ => None,
    };
    Checklist {
        title: "Tools",
        items: tools
            .iter()
            .map(|tool| ChecklistItem {
                label: tool.name.clone(),
                detail: tool.description.clone(),
                checked: form.has_tool(&tool.name),
            })
            .collect(),
        cursor,
        style: Style::default().fg(app.theme.text),
        detail_style: Style::default().fg(app.theme.text_dim),
        border_style: border_style(&app.theme, cursor.is_some()),
        empty: "No tools configured",
    }
    .render(f, chunks[2]);

    let submit = if app.store.agent.status == RequestStatus::Loading {
        "Creating Agent..."
    } else {
        "[s] Create Agent"
    };
    let button = Paragraph::new(Span::styled(
        submit,
        Style::default().fg(app.theme.primary).add_modifier(Modifier::BOLD),
    ))
    .block(Block::default().borders(Borders::ALL).border_style(border_style(&app.theme, false)));
    f.render_widget(button, chunks[3]);
}

fn render_registry(f: &mut Frame<'_>, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(7)])
        .split(area);

    let agents = &app.store.agent;
    let focused = app.agent_form.pane == AgentPane::Registry;
    let items: Vec<ListItem> = agents
        .agents
        .values()
        .map(|agent| {
            ListItem::new(Line::from(vec![
                Span::styled(agent.name.clone(), Style::default().fg(app.theme.text)),
                Span::styled(
                    format!("  {} · {} tools", agent.agent_type.label(), agent.tools.len()),
                    Style::default().fg(app.theme.text_dim),
                ),
            ]))
        })
        .collect();
    let mut state = ListState::default();
    state.select(
        agents
            .selected_agent
            .as_ref()
            .and_then(|name| agents.agents.keys().position(|k| k == name)),
    );
    let list = List::new(items)
        .block(
            Block::default()
                .title("Agents")
                .borders(Borders::ALL)
                .border_style(border_style(&app.theme, focused)),
        )
        .highlight_style(Style::default().bg(app.theme.bg_highlight));
    f.render_stateful_widget(list, chunks[0], &mut state);

    // Agents inherit the global LLM settings.
    let llm = &app.store.llm.settings;
    let mut fields = vec![
        ("Model", llm.model.clone()),
        ("Temperature", llm.temperature.to_string()),
        ("Max Tokens", llm.max_tokens.to_string()),
    ];
    if let Some(error) = &agents.error {
        fields.push(("Error", error.clone()));
    }
    DetailPanel {
        title: "LLM Configuration",
        fields,
        label_style: Style::default().fg(app.theme.accent),
        border_style: border_style(&app.theme, false),
        empty: "",
    }
    .render(f, chunks[1]);
}
