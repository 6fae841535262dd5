//! Flow management view: step list, active step details, dependencies.

use crate::forms::EditTarget;
use crate::state::{App, FlowPane};
use crate::store::FlowPhase;
use crate::theme::step_status_color;
use crate::views::helpers::{border_style, render_input, two_column, with_banner};
use crate::widgets::{Banner, Checklist, ChecklistItem, DetailPanel};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

pub const EMPTY_FLOW: &str = "No steps in the current flow. Add steps to get started.";

pub fn render(f: &mut Frame<'_>, app: &App, area: Rect) {
    let flow = &app.store.flow;
    let banner = flow.error.as_ref().map(|error| Banner {
        text: error.clone(),
        style: Style::default().fg(app.theme.error),
    });
    let area = with_banner(f, banner, area);
    let (left, right) = two_column(area, 55);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(left);
    render_input(
        f,
        app,
        EditTarget::StepDescription,
        "New Step",
        "Add new step... (n)",
        chunks[0],
    );
    render_steps(f, app, chunks[1]);
    render_active_step(f, app, right);
}

fn phase_label(phase: FlowPhase) -> &'static str {
    match phase {
        FlowPhase::Idle => "idle",
        FlowPhase::Loaded => "loaded",
        FlowPhase::Executing => "executing",
    }
}

fn render_steps(f: &mut Frame<'_>, app: &App, area: Rect) {
    let flow = &app.store.flow;
    let title = format!("Steps [{}]", phase_label(flow.phase()));
    let focused = app.flow_view.pane == FlowPane::Steps && !app.is_editing();
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style(&app.theme, focused));

    if flow.steps.is_empty() {
        let empty = List::new(vec![ListItem::new(Span::styled(
            EMPTY_FLOW,
            Style::default().fg(app.theme.text_dim),
        ))])
        .block(block);
        f.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = flow
        .steps
        .iter()
        .map(|step| {
            let color = step_status_color(step.status, &app.theme);
            let mut style = Style::default().fg(color);
            if flow.active_step_id.as_deref() == Some(step.id.as_str()) {
                style = style.add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
            }
            ListItem::new(Line::from(vec![
                Span::styled(format!("{} ", step.status.marker()), Style::default().fg(color)),
                Span::styled(step.description.clone(), style),
                Span::styled(
                    format!("  {}", step.status),
                    Style::default().fg(app.theme.text_dim),
                ),
            ]))
        })
        .collect();
    let mut state = ListState::default();
    state.select(Some(app.flow_view.step_cursor));
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(app.theme.bg_highlight));
    f.render_stateful_widget(list, area, &mut state);
}

fn render_active_step(f: &mut Frame<'_>, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(8), Constraint::Min(3)])
        .split(area);

    let flow = &app.store.flow;
    let active = flow.active_step();
    let mut fields = Vec::new();
    if let Some(step) = active {
        fields.push(("ID", step.id.clone()));
        fields.push(("Agent", step.agent.clone()));
        fields.push(("Status", step.status.to_string()));
        fields.push(("Depends on", step.dependencies.len().to_string()));
    }
    if let Some(flow_id) = &flow.flow_id {
        fields.push(("Flow", flow_id.clone()));
    }
    DetailPanel {
        title: "Active Step",
        fields,
        label_style: Style::default().fg(app.theme.accent),
        border_style: border_style(&app.theme, false),
        empty: "Select a step with Enter",
    }
    .render(f, chunks[0]);

    let Some(active) = active else {
        return;
    };
    let focused = app.flow_view.pane == FlowPane::Dependencies;
    Checklist {
        title: "Dependencies",
        items: app
            .dependency_candidates()
            .iter()
            .filter_map(|id| flow.step(id))
            .map(|step| ChecklistItem {
                label: step.description.clone(),
                detail: step.id.clone(),
                checked: active.depends_on(&step.id),
            })
            .collect(),
        cursor: focused.then_some(app.flow_view.dependency_cursor),
        style: Style::default().fg(app.theme.text),
        detail_style: Style::default().fg(app.theme.text_dim),
        border_style: border_style(&app.theme, focused),
        empty: "No other steps",
    }
    .render(f, chunks[1]);
}
