//! Application state: the store plus everything that only exists on screen.
//!
//! Key handling lives here rather than in `main` so it can be driven without
//! a terminal or a backend. Every handler returns an [`Outcome`] listing the
//! backend requests the event loop must run.

use crate::config::TuiConfig;
use crate::events::{StreamEvent, StreamEventKind};
use crate::forms::{AgentForm, AgentPane, AgentRow, EditTarget, FieldEditor, LlmForm};
use crate::history::{HistoryCursor, Recall};
use crate::keys::{map_editing_key, map_key, Action, EditAction};
use crate::nav::View;
use crate::notifications::{Notification, NotificationLevel};
use crate::realtime::StreamSubscription;
use crate::store::{Effect, Request, RequestStatus, Response, Store};
use crate::theme::Theme;
use crossterm::event::KeyEvent;
use manus_core::{AgentPatch, FlowStep, StepId, StepIdGenerator, Timestamp};

/// Agent assigned to new steps when no agent is selected.
pub const DEFAULT_STEP_AGENT: &str = "default";

#[derive(Debug, Default)]
pub struct Outcome {
    pub quit: bool,
    pub requests: Vec<Request>,
}

impl Outcome {
    fn quit() -> Self {
        Self {
            quit: true,
            requests: Vec::new(),
        }
    }

    fn request(request: Request) -> Self {
        Self {
            quit: false,
            requests: vec![request],
        }
    }

    fn maybe(request: Option<Request>) -> Self {
        Self {
            quit: false,
            requests: request.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlowPane {
    #[default]
    Steps,
    Dependencies,
}

#[derive(Debug, Clone, Default)]
pub struct FlowViewState {
    pub pane: FlowPane,
    pub step_cursor: usize,
    pub dependency_cursor: usize,
}

#[derive(Debug, Clone, Default)]
pub struct TerminalViewState {
    pub history: HistoryCursor,
    /// Lines scrolled up from the bottom of the output.
    pub scroll: u16,
}

pub struct App {
    pub config: TuiConfig,
    pub theme: Theme,
    pub store: Store,
    pub active_view: View,

    pub editor: Option<FieldEditor>,
    pub terminal_view: TerminalViewState,
    pub llm_form: LlmForm,
    pub agent_form: AgentForm,
    pub flow_view: FlowViewState,

    pub notifications: Vec<Notification>,
    pub stream: Option<StreamSubscription>,
    pub stream_connected: bool,
    step_ids: StepIdGenerator,
}

impl App {
    pub fn new(config: TuiConfig) -> Self {
        let theme = Theme::by_name(&config.theme.name).unwrap_or_else(Theme::terminal);
        let mut store = Store::new();
        store.agent.set_available_tools(config.tools.clone());
        let llm_form = LlmForm::from_settings(&store.llm.settings);
        Self {
            config,
            theme,
            store,
            active_view: View::default(),
            editor: None,
            terminal_view: TerminalViewState::default(),
            llm_form,
            agent_form: AgentForm::default(),
            flow_view: FlowViewState::default(),
            notifications: Vec::new(),
            stream: None,
            stream_connected: false,
            step_ids: StepIdGenerator::new(),
        }
    }

    /// Requests issued once at startup.
    pub fn startup_requests(&mut self) -> Vec<Request> {
        vec![self.store.llm.load_settings(), self.store.agent.load_agents()]
    }

    pub fn message_ttl(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(i64::try_from(self.config.message_ttl_ms).unwrap_or(i64::MAX))
    }

    pub fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) {
        self.notifications.push(Notification::new(level, message));
    }

    pub fn is_editing(&self) -> bool {
        self.editor.is_some()
    }

    pub fn on_tick(&mut self, now: Timestamp) {
        let ttl = self.message_ttl();
        self.store.expire_messages(now, ttl);
        self.notifications.retain(|n| !n.is_expired(now, ttl));
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Outcome {
        if self.editor.is_some() {
            return self.handle_editing_key(key);
        }
        match map_key(key) {
            Some(action) => self.handle_action(action),
            None => Outcome::default(),
        }
    }

    /// Feed a backend response into the store and react to it.
    pub fn apply_response(&mut self, response: Response) -> Option<Effect> {
        let created_agent = matches!(response, Response::AgentCreated { result: Ok(_), .. });
        let loaded_settings = matches!(response, Response::SettingsLoaded { result: Ok(_), .. });
        let failure = response_error(&response);

        let effect = self.store.apply(response);

        if created_agent && self.store.agent.status == RequestStatus::Succeeded {
            self.agent_form.reset();
        }
        if loaded_settings && !self.llm_form.dirty {
            let focus = self.llm_form.focus;
            self.llm_form = LlmForm::from_settings(&self.store.llm.settings);
            self.llm_form.focus = focus;
        }
        if let Some((what, error)) = failure {
            self.notify(NotificationLevel::Error, format!("{what}: {error}"));
        }
        self.clamp_cursors();
        effect
    }

    pub fn attach_stream(&mut self, subscription: StreamSubscription) {
        if let Some(previous) = self.stream.replace(subscription) {
            previous.close();
        }
    }

    pub fn handle_stream_event(&mut self, event: StreamEvent) {
        let StreamEvent { flow_id, kind } = event;
        if self.store.flow.flow_id.as_deref() != Some(flow_id.as_str()) {
            tracing::debug!(%flow_id, "event from a stale flow stream");
            return;
        }
        match kind {
            StreamEventKind::Opened => {
                self.stream_connected = true;
                self.notify(NotificationLevel::Info, format!("Streaming flow {flow_id}"));
            }
            StreamEventKind::Message(data) => self.store.terminal.append_stream_line(&data),
            StreamEventKind::Error(error) => {
                self.notify(NotificationLevel::Error, format!("Flow stream error: {error}"));
            }
            StreamEventKind::Closed => {
                self.stream_connected = false;
                self.store.flow.stream_finished(&flow_id);
                if self.stream.as_ref().is_some_and(|s| s.flow_id() == flow_id) {
                    self.stream = None;
                }
            }
        }
    }

    fn handle_editing_key(&mut self, key: KeyEvent) -> Outcome {
        let Some(editor) = self.editor.as_mut() else {
            return Outcome::default();
        };
        let is_command = editor.target == EditTarget::Command;
        match map_editing_key(key) {
            Some(EditAction::Commit) => return self.commit_editor(),
            Some(EditAction::Cancel) => {
                self.editor = None;
                self.terminal_view.history.reset();
            }
            Some(EditAction::HistoryPrevious) if is_command => {
                let recall = self.terminal_view.history.previous(&self.store.terminal.command_history);
                apply_recall(editor, recall);
            }
            Some(EditAction::HistoryNext) if is_command => {
                let recall = self.terminal_view.history.next(&self.store.terminal.command_history);
                apply_recall(editor, recall);
            }
            Some(EditAction::HistoryPrevious | EditAction::HistoryNext) => {}
            None => {
                editor.textarea.input(key);
            }
        }
        Outcome::default()
    }

    fn commit_editor(&mut self) -> Outcome {
        let Some(editor) = self.editor.as_mut() else {
            return Outcome::default();
        };
        let text = editor.text();
        let target = editor.target;
        match target {
            EditTarget::Command => {
                if self.store.terminal.is_processing {
                    return Outcome::default();
                }
                let request = self.store.terminal.execute_command(&text);
                if request.is_some() {
                    editor.clear();
                    self.terminal_view.history.reset();
                    self.terminal_view.scroll = 0;
                }
                Outcome::maybe(request)
            }
            EditTarget::LlmField(field) => {
                self.editor = None;
                self.llm_form.set(field, text);
                Outcome::default()
            }
            EditTarget::AgentName => {
                self.editor = None;
                self.agent_form.name = text;
                Outcome::default()
            }
            EditTarget::StepDescription => {
                self.editor = None;
                let description = text.trim();
                if !description.is_empty() {
                    let agent = self
                        .store
                        .agent
                        .selected_agent
                        .clone()
                        .unwrap_or_else(|| DEFAULT_STEP_AGENT.to_string());
                    let step = FlowStep::new(self.step_ids.next_id(), description, agent);
                    if self.store.flow.add_step(step) {
                        self.flow_view.step_cursor = self.store.flow.steps.len() - 1;
                    }
                }
                Outcome::default()
            }
        }
    }

    fn open_editor(&mut self, target: EditTarget, initial: &str) {
        self.editor = Some(FieldEditor::new(target, initial));
    }

    fn handle_action(&mut self, action: Action) -> Outcome {
        match action {
            Action::Quit => return Outcome::quit(),
            Action::NextView => self.active_view = self.active_view.next(),
            Action::PrevView => self.active_view = self.active_view.previous(),
            Action::SwitchView(index) => {
                if let Some(view) = View::from_index(index) {
                    self.active_view = view;
                }
            }
            _ => {
                return match self.active_view {
                    View::Terminal => self.terminal_action(action),
                    View::LlmConfig => self.llm_action(action),
                    View::AgentConfig => self.agent_action(action),
                    View::Flow => self.flow_action(action),
                }
            }
        }
        Outcome::default()
    }

    fn terminal_action(&mut self, action: Action) -> Outcome {
        match action {
            Action::Activate => {
                if self.store.llm.is_configured {
                    self.open_editor(EditTarget::Command, "");
                } else {
                    self.notify(
                        NotificationLevel::Warning,
                        "Please configure LLM settings before using the terminal.",
                    );
                }
            }
            Action::MoveUp => self.terminal_view.scroll = self.terminal_view.scroll.saturating_add(1),
            Action::MoveDown => self.terminal_view.scroll = self.terminal_view.scroll.saturating_sub(1),
            Action::ClearTerminal => {
                self.store.terminal.clear_terminal();
                self.terminal_view.scroll = 0;
            }
            _ => {}
        }
        Outcome::default()
    }

    fn llm_action(&mut self, action: Action) -> Outcome {
        match action {
            Action::MoveDown => self.llm_form.focus_next(),
            Action::MoveUp => self.llm_form.focus_previous(),
            Action::Activate | Action::Toggle => {
                let field = self.llm_form.focused();
                if field.is_choice() {
                    self.llm_form.cycle_api_type();
                } else if action == Action::Activate {
                    let value = self.llm_form.value(field);
                    self.open_editor(EditTarget::LlmField(field), &value);
                }
            }
            Action::Submit => {
                if self.store.llm.status == RequestStatus::Loading {
                    return Outcome::default();
                }
                match self.llm_form.to_settings(&self.store.llm.settings) {
                    Ok(settings) => {
                        self.llm_form.dirty = false;
                        return Outcome::request(self.store.llm.submit(settings));
                    }
                    Err(err) => self.notify(NotificationLevel::Warning, err.to_string()),
                }
            }
            Action::Refresh => return Outcome::request(self.store.llm.load_settings()),
            _ => {}
        }
        Outcome::default()
    }

    fn agent_action(&mut self, action: Action) -> Outcome {
        if self.agent_form.pane == AgentPane::Registry {
            return self.registry_action(action);
        }
        let tool_count = self.store.agent.available_tools.len();
        match action {
            Action::MoveDown => self.agent_form.focus_next(tool_count),
            Action::MoveUp => self.agent_form.focus_previous(),
            Action::PaneRight => self.agent_form.pane = AgentPane::Registry,
            Action::Activate | Action::Toggle => match self.agent_form.row(tool_count) {
                AgentRow::Name if action == Action::Activate => {
                    let name = self.agent_form.name.clone();
                    self.open_editor(EditTarget::AgentName, &name);
                }
                AgentRow::Name => {}
                AgentRow::Type => self.agent_form.agent_type = self.agent_form.agent_type.next(),
                AgentRow::Tool(index) => {
                    if let Some(tool) = self.store.agent.available_tools.get(index).cloned() {
                        self.agent_form.toggle_tool(&tool);
                    }
                }
            },
            Action::Submit => {
                if self.store.agent.status == RequestStatus::Loading {
                    return Outcome::default();
                }
                let config = self.agent_form.to_config(&self.store.llm.settings);
                match self.store.agent.create_agent(config) {
                    Some(request) => return Outcome::request(request),
                    None => self.notify(NotificationLevel::Warning, "Agent name is required"),
                }
            }
            Action::Refresh => return Outcome::request(self.store.agent.load_agents()),
            _ => {}
        }
        Outcome::default()
    }

    fn registry_action(&mut self, action: Action) -> Outcome {
        let names: Vec<String> = self.store.agent.agents.keys().cloned().collect();
        let position = self
            .store
            .agent
            .selected_agent
            .as_ref()
            .and_then(|selected| names.iter().position(|n| n == selected));
        match action {
            Action::PaneLeft => self.agent_form.pane = AgentPane::Form,
            Action::MoveDown => {
                let next = position.map_or(0, |p| (p + 1).min(names.len().saturating_sub(1)));
                if let Some(name) = names.get(next) {
                    self.store.agent.select_agent(name);
                }
            }
            Action::MoveUp => {
                let next = position.map_or(0, |p| p.saturating_sub(1));
                if let Some(name) = names.get(next) {
                    self.store.agent.select_agent(name);
                }
            }
            Action::DeleteStep => {
                if let Some(name) = self.store.agent.selected_agent.clone() {
                    self.store.agent.remove_agent(&name);
                    self.notify(NotificationLevel::Info, format!("Removed agent {name} locally"));
                }
            }
            Action::CycleStatus => {
                if let Some(agent) = self.store.agent.selected().cloned() {
                    let patch = AgentPatch {
                        agent_type: Some(agent.agent_type.next()),
                        ..AgentPatch::default()
                    };
                    return Outcome::maybe(self.store.agent.push_agent_update(&agent.name, patch));
                }
            }
            Action::Refresh => {
                let request = match self.store.agent.selected_agent.clone() {
                    Some(name) => self.store.agent.fetch_agent(&name),
                    None => self.store.agent.load_agents(),
                };
                return Outcome::request(request);
            }
            _ => {}
        }
        Outcome::default()
    }

    fn flow_action(&mut self, action: Action) -> Outcome {
        match action {
            Action::NewStep => self.open_editor(EditTarget::StepDescription, ""),
            Action::StartFlow => {
                let request = self.store.flow.create_remote_flow();
                if request.is_none() {
                    let reason = if self.store.flow.is_executing {
                        "Flow is already executing"
                    } else {
                        "Add steps before starting the flow"
                    };
                    self.notify(NotificationLevel::Warning, reason);
                }
                return Outcome::maybe(request);
            }
            Action::Refresh => {
                let request = self.store.flow.refresh_status();
                if request.is_none() {
                    self.notify(NotificationLevel::Info, "Flow has not been started");
                }
                return Outcome::maybe(request);
            }
            Action::ResetFlow => {
                if let Some(stream) = self.stream.take() {
                    stream.close();
                }
                self.stream_connected = false;
                self.store.flow.reset_flow();
                self.flow_view = FlowViewState::default();
            }
            Action::PaneLeft => self.flow_view.pane = FlowPane::Steps,
            Action::PaneRight => {
                if self.store.flow.active_step_id.is_some() {
                    self.flow_view.pane = FlowPane::Dependencies;
                    self.flow_view.dependency_cursor = 0;
                }
            }
            _ => {
                return match self.flow_view.pane {
                    FlowPane::Steps => self.steps_action(action),
                    FlowPane::Dependencies => self.dependencies_action(action),
                }
            }
        }
        Outcome::default()
    }

    fn steps_action(&mut self, action: Action) -> Outcome {
        let len = self.store.flow.steps.len();
        let cursor_id = self.cursor_step_id();
        match action {
            Action::MoveDown if len > 0 => {
                self.flow_view.step_cursor = (self.flow_view.step_cursor + 1).min(len - 1);
            }
            Action::MoveUp => self.flow_view.step_cursor = self.flow_view.step_cursor.saturating_sub(1),
            Action::Activate | Action::Toggle => {
                if let Some(id) = cursor_id {
                    self.store.flow.set_active_step(&id);
                }
            }
            Action::CycleStatus => {
                if let Some(step) = cursor_id.as_deref().and_then(|id| self.store.flow.step(id)) {
                    let (id, status) = (step.id.clone(), step.status.next());
                    return Outcome::maybe(self.store.flow.sync_step_status(&id, status));
                }
            }
            Action::DeleteStep => {
                if let Some(id) = cursor_id {
                    self.store.flow.remove_step(&id);
                    self.clamp_cursors();
                }
            }
            _ => {}
        }
        Outcome::default()
    }

    fn dependencies_action(&mut self, action: Action) -> Outcome {
        let Some(active) = self.store.flow.active_step().cloned() else {
            self.flow_view.pane = FlowPane::Steps;
            return Outcome::default();
        };
        let candidates = self.dependency_candidates();
        match action {
            Action::MoveDown if !candidates.is_empty() => {
                self.flow_view.dependency_cursor =
                    (self.flow_view.dependency_cursor + 1).min(candidates.len() - 1);
            }
            Action::MoveUp => {
                self.flow_view.dependency_cursor = self.flow_view.dependency_cursor.saturating_sub(1);
            }
            Action::Activate | Action::Toggle => {
                if let Some(candidate) = candidates.get(self.flow_view.dependency_cursor) {
                    let mut deps = active.dependencies.clone();
                    if active.depends_on(candidate) {
                        deps.retain(|d| d != candidate);
                    } else {
                        deps.push(candidate.clone());
                    }
                    self.store.flow.update_step_dependencies(&active.id, &deps);
                }
            }
            _ => {}
        }
        Outcome::default()
    }

    /// Ids of the steps the active step may depend on, in list order.
    pub fn dependency_candidates(&self) -> Vec<StepId> {
        let active = self.store.flow.active_step_id.as_deref();
        self.store
            .flow
            .steps
            .iter()
            .filter(|s| Some(s.id.as_str()) != active)
            .map(|s| s.id.clone())
            .collect()
    }

    pub fn cursor_step_id(&self) -> Option<StepId> {
        self.store
            .flow
            .steps
            .get(self.flow_view.step_cursor)
            .map(|s| s.id.clone())
    }

    fn clamp_cursors(&mut self) {
        let steps = self.store.flow.steps.len();
        self.flow_view.step_cursor = self.flow_view.step_cursor.min(steps.saturating_sub(1));
        let deps = steps.saturating_sub(1);
        self.flow_view.dependency_cursor = self.flow_view.dependency_cursor.min(deps.saturating_sub(1));
        if self.store.flow.active_step_id.is_none() {
            self.flow_view.pane = FlowPane::Steps;
        }
    }
}

fn apply_recall(editor: &mut FieldEditor, recall: Recall) {
    match recall {
        Recall::Command(command) => editor.set_text(&command),
        Recall::Clear => editor.clear(),
        Recall::Unchanged => {}
    }
}

/// Failures worth a footer notification, beyond the slice's own banner.
fn response_error(response: &Response) -> Option<(&'static str, String)> {
    let (what, error) = match response {
        Response::AgentsListed { result: Err(e), .. } => ("Loading agents failed", e),
        Response::AgentFetched { result: Err(e), .. } => ("Fetching agent failed", e),
        Response::AgentUpdated { result: Err(e), .. } => ("Updating agent failed", e),
        Response::FlowCreated { result: Err(e), .. } => ("Starting flow failed", e),
        Response::StepUpdated { result: Err(e), .. } => ("Updating step failed", e),
        Response::FlowStatusFetched { result: Err(e), .. } => ("Refreshing flow failed", e),
        Response::SettingsLoaded { result: Err(e), .. } => ("Loading settings failed", e),
        _ => return None,
    };
    Some((what, error.clone()))
}
