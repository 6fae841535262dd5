//! Agent registry slice.

use super::{set_transient, ApiOutcome, Generation, Request, RequestStatus, RequestToken, TransientMessage};
use manus_core::{AgentConfig, AgentPatch, ToolDefinition};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct AgentState {
    /// Keyed by agent name.
    pub agents: BTreeMap<String, AgentConfig>,
    pub available_tools: Vec<ToolDefinition>,
    pub selected_agent: Option<String>,
    pub error: Option<String>,
    pub status: RequestStatus,
    pub message: Option<TransientMessage>,
    create_gen: Generation,
    list_gen: Generation,
}

impl AgentState {
    /// Start creating `config` on the backend. Returns `None` when the name
    /// is blank.
    pub fn create_agent(&mut self, mut config: AgentConfig) -> Option<Request> {
        let name = config.name.trim().to_string();
        if name.is_empty() {
            return None;
        }
        config.name = name;
        self.status = RequestStatus::Loading;
        self.error = None;
        self.set_message("Creating agent...");
        Some(Request::CreateAgent {
            token: self.create_gen.issue(),
            config,
        })
    }

    pub fn add_agent(&mut self, config: AgentConfig) {
        self.agents.insert(config.name.clone(), config);
    }

    /// Merge `patch` into the named agent. A rename moves the entry and the
    /// selection with it; renaming onto another existing agent is refused.
    pub fn update_agent(&mut self, name: &str, patch: &AgentPatch) -> bool {
        let Some(mut agent) = self.agents.get(name).cloned() else {
            return false;
        };
        agent.apply(patch);
        if agent.name.trim().is_empty() {
            agent.name = name.to_string();
        }
        if agent.name != name && self.agents.contains_key(&agent.name) {
            tracing::debug!(agent = name, target = %agent.name, "rename onto existing agent refused");
            return false;
        }
        self.agents.remove(name);
        if agent.name != name && self.selected_agent.as_deref() == Some(name) {
            self.selected_agent = Some(agent.name.clone());
        }
        self.agents.insert(agent.name.clone(), agent);
        true
    }

    pub fn remove_agent(&mut self, name: &str) -> Option<AgentConfig> {
        let removed = self.agents.remove(name);
        if removed.is_some() && self.selected_agent.as_deref() == Some(name) {
            self.selected_agent = None;
        }
        removed
    }

    pub fn select_agent(&mut self, name: &str) -> bool {
        if !self.agents.contains_key(name) {
            return false;
        }
        self.selected_agent = Some(name.to_string());
        true
    }

    pub fn selected(&self) -> Option<&AgentConfig> {
        self.selected_agent
            .as_deref()
            .and_then(|name| self.agents.get(name))
    }

    pub fn set_available_tools(&mut self, tools: Vec<ToolDefinition>) {
        self.available_tools = tools;
    }

    pub fn set_message(&mut self, text: impl Into<String>) {
        set_transient(&mut self.message, text);
    }

    pub fn set_error(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn load_agents(&mut self) -> Request {
        Request::ListAgents {
            token: self.list_gen.issue(),
        }
    }

    pub fn fetch_agent(&self, name: &str) -> Request {
        Request::FetchAgent {
            name: name.to_string(),
        }
    }

    /// Apply `patch` locally, then send it. `None` if the agent is unknown
    /// or the patch is empty.
    pub fn push_agent_update(&mut self, name: &str, patch: AgentPatch) -> Option<Request> {
        if patch.is_empty() || !self.update_agent(name, &patch) {
            return None;
        }
        Some(Request::UpdateAgent {
            name: name.to_string(),
            patch,
        })
    }

    pub(crate) fn apply_created(
        &mut self,
        token: RequestToken,
        submitted: AgentConfig,
        result: ApiOutcome<AgentConfig>,
    ) {
        let current = self.create_gen.is_current(token);
        match result {
            Ok(created) => {
                // The agent exists on the backend even if a newer create superseded this one.
                let agent = if created.name.trim().is_empty() {
                    submitted
                } else {
                    created
                };
                tracing::info!(agent = %agent.name, "agent created");
                self.add_agent(agent);
                if current {
                    self.status = RequestStatus::Succeeded;
                    self.set_message("Agent created successfully!");
                }
            }
            Err(err) => {
                tracing::warn!(agent = %submitted.name, error = %err, "creating agent failed");
                if current {
                    self.status = RequestStatus::Failed;
                    self.error = Some(err);
                    self.set_message("Failed to create agent");
                }
            }
        }
    }

    pub(crate) fn apply_listed(&mut self, token: RequestToken, result: ApiOutcome<Vec<AgentConfig>>) {
        if !self.list_gen.is_current(token) {
            tracing::debug!(?token, "discarding stale agent list");
            return;
        }
        match result {
            Ok(agents) => {
                self.agents = agents
                    .into_iter()
                    .map(|agent| (agent.name.clone(), agent))
                    .collect();
                if let Some(name) = &self.selected_agent {
                    if !self.agents.contains_key(name) {
                        self.selected_agent = None;
                    }
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "listing agents failed");
                self.error = Some(err);
            }
        }
    }

    pub(crate) fn apply_fetched(&mut self, name: &str, result: ApiOutcome<AgentConfig>) {
        match result {
            Ok(agent) if !agent.name.is_empty() => self.add_agent(agent),
            Ok(_) => tracing::debug!(agent = name, "fetched agent has no name"),
            Err(err) => {
                tracing::warn!(agent = name, error = %err, "fetching agent failed");
                self.error = Some(err);
            }
        }
    }

    pub(crate) fn apply_updated(&mut self, name: &str, result: ApiOutcome<AgentConfig>) {
        match result {
            Ok(agent) if !agent.name.is_empty() => {
                if agent.name != name {
                    self.agents.remove(name);
                }
                self.add_agent(agent);
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(agent = name, error = %err, "updating agent failed");
                self.error = Some(err);
                self.set_message("Failed to update agent");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use manus_core::AgentType;

    fn create_token(request: &Request) -> RequestToken {
        match request {
            Request::CreateAgent { token, .. } => *token,
            other => panic!("unexpected request {other:?}"),
        }
    }

    #[test]
    fn blank_name_blocks_create() {
        let mut state = AgentState::default();
        assert!(state.create_agent(AgentConfig::new("   ", AgentType::Manus)).is_none());
        assert_eq!(state.status, RequestStatus::Idle);
    }

    #[test]
    fn successful_create_inserts_agent() {
        let mut state = AgentState::default();
        let config = AgentConfig::new("a1", AgentType::React);
        let request = state.create_agent(config.clone()).unwrap();
        assert_eq!(state.status, RequestStatus::Loading);
        let echoed = AgentConfig::new("", AgentType::Manus);
        state.apply_created(create_token(&request), config.clone(), Ok(echoed));
        assert_eq!(state.status, RequestStatus::Succeeded);
        assert_eq!(state.agents.get("a1"), Some(&config));
    }

    #[test]
    fn superseded_create_still_records_agent() {
        let mut state = AgentState::default();
        let first = AgentConfig::new("first", AgentType::Manus);
        let second = AgentConfig::new("second", AgentType::Manus);
        let first_request = state.create_agent(first.clone()).unwrap();
        let _second_request = state.create_agent(second).unwrap();
        state.apply_created(create_token(&first_request), first.clone(), Ok(first));
        assert!(state.agents.contains_key("first"));
        assert_eq!(state.status, RequestStatus::Loading);
    }

    #[test]
    fn rename_moves_selection() {
        let mut state = AgentState::default();
        state.add_agent(AgentConfig::new("old", AgentType::Swe));
        assert!(state.select_agent("old"));
        let patch = AgentPatch {
            name: Some("new".into()),
            ..AgentPatch::default()
        };
        assert!(state.update_agent("old", &patch));
        assert_eq!(state.selected_agent.as_deref(), Some("new"));
        assert!(!state.agents.contains_key("old"));
    }

    #[test]
    fn rename_onto_existing_agent_is_refused() {
        let mut state = AgentState::default();
        state.add_agent(AgentConfig::new("a1", AgentType::Swe));
        state.add_agent(AgentConfig::new("a2", AgentType::React));
        let patch = AgentPatch {
            name: Some("a2".into()),
            agent_type: Some(AgentType::Planning),
            ..AgentPatch::default()
        };
        assert!(!state.update_agent("a1", &patch));
        assert!(state.push_agent_update("a1", patch).is_none());
        assert_eq!(state.agents.len(), 2);
        assert_eq!(state.agents["a1"].agent_type, AgentType::Swe);
        assert_eq!(state.agents["a2"].agent_type, AgentType::React);
    }

    #[test]
    fn removing_selected_agent_clears_selection() {
        let mut state = AgentState::default();
        state.add_agent(AgentConfig::new("a1", AgentType::Planning));
        state.select_agent("a1");
        assert!(state.remove_agent("a1").is_some());
        assert!(state.selected_agent.is_none());
        assert!(!state.select_agent("a1"));
    }

    #[test]
    fn push_update_requires_known_agent() {
        let mut state = AgentState::default();
        let patch = AgentPatch {
            agent_type: Some(AgentType::Swe),
            ..AgentPatch::default()
        };
        assert!(state.push_agent_update("ghost", patch.clone()).is_none());
        state.add_agent(AgentConfig::new("a1", AgentType::Manus));
        assert!(state.push_agent_update("a1", AgentPatch::default()).is_none());
        assert!(state.push_agent_update("a1", patch).is_some());
        assert_eq!(state.agents["a1"].agent_type, AgentType::Swe);
    }
}
