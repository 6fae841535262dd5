//! Client-side state store.
//!
//! Four independent slices, each a plain struct mutated only through its own
//! methods. Backend work is split in two halves: a slice's begin method sets
//! the pending state and hands back a [`Request`]; the event loop runs it with
//! [`perform`] on a spawned task and feeds the [`Response`] to
//! [`Store::apply`]. Each request carries a [`RequestToken`] so that a slice can
//! discard a response that a newer request has superseded.

pub mod agent;
pub mod flow;
pub mod llm;
pub mod terminal;

pub use agent::AgentState;
pub use flow::{FlowPhase, FlowState};
pub use llm::LlmState;
pub use terminal::TerminalState;

use crate::api_client::Backend;
use chrono::Utc;
use manus_core::{
    AgentConfig, AgentPatch, FlowId, FlowStatus, FlowStep, FlowStepPatch, LlmSettings, Message,
    StepId, Timestamp,
};

/// Failure of a backend call, flattened to the message shown to the user.
pub type ApiOutcome<T> = Result<T, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestStatus {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestToken(u64);

/// Per-operation counter; only the most recently issued token is current.
#[derive(Debug, Clone, Default)]
pub struct Generation {
    latest: u64,
}

impl Generation {
    pub fn issue(&mut self) -> RequestToken {
        self.latest += 1;
        RequestToken(self.latest)
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        token.0 == self.latest
    }
}

/// A banner that disappears once it is older than the configured TTL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransientMessage {
    pub text: String,
    pub set_at: Timestamp,
}

impl TransientMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            set_at: Utc::now(),
        }
    }

    pub fn is_expired(&self, now: Timestamp, ttl: chrono::Duration) -> bool {
        now - self.set_at >= ttl
    }
}

/// Replace `slot` with `text`, or clear it when `text` is empty.
pub(crate) fn set_transient(slot: &mut Option<TransientMessage>, text: impl Into<String>) {
    let text = text.into();
    *slot = if text.is_empty() {
        None
    } else {
        Some(TransientMessage::new(text))
    };
}

pub(crate) fn expire(slot: &mut Option<TransientMessage>, now: Timestamp, ttl: chrono::Duration) {
    if slot.as_ref().is_some_and(|m| m.is_expired(now, ttl)) {
        *slot = None;
    }
}

/// Backend work requested by a slice.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    LoadSettings {
        token: RequestToken,
    },
    SaveSettings {
        token: RequestToken,
        settings: LlmSettings,
    },
    CreateAgent {
        token: RequestToken,
        config: AgentConfig,
    },
    ListAgents {
        token: RequestToken,
    },
    FetchAgent {
        name: String,
    },
    UpdateAgent {
        name: String,
        patch: AgentPatch,
    },
    CreateFlow {
        token: RequestToken,
        steps: Vec<FlowStep>,
    },
    UpdateStep {
        token: RequestToken,
        flow_id: FlowId,
        step_id: StepId,
        patch: FlowStepPatch,
    },
    FetchFlowStatus {
        token: RequestToken,
        flow_id: FlowId,
    },
    ExecuteCommand {
        token: RequestToken,
        command: String,
    },
}

impl Request {
    pub fn name(&self) -> &'static str {
        match self {
            Request::LoadSettings { .. } => "load_settings",
            Request::SaveSettings { .. } => "save_settings",
            Request::CreateAgent { .. } => "create_agent",
            Request::ListAgents { .. } => "list_agents",
            Request::FetchAgent { .. } => "fetch_agent",
            Request::UpdateAgent { .. } => "update_agent",
            Request::CreateFlow { .. } => "create_flow",
            Request::UpdateStep { .. } => "update_step",
            Request::FetchFlowStatus { .. } => "fetch_flow_status",
            Request::ExecuteCommand { .. } => "execute_command",
        }
    }
}

/// Outcome of a [`Request`], routed back to the slice that issued it.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    SettingsLoaded {
        token: RequestToken,
        result: ApiOutcome<LlmSettings>,
    },
    SettingsSaved {
        token: RequestToken,
        result: ApiOutcome<LlmSettings>,
    },
    AgentCreated {
        token: RequestToken,
        submitted: AgentConfig,
        result: ApiOutcome<AgentConfig>,
    },
    AgentsListed {
        token: RequestToken,
        result: ApiOutcome<Vec<AgentConfig>>,
    },
    AgentFetched {
        name: String,
        result: ApiOutcome<AgentConfig>,
    },
    AgentUpdated {
        name: String,
        result: ApiOutcome<AgentConfig>,
    },
    FlowCreated {
        token: RequestToken,
        result: ApiOutcome<FlowId>,
    },
    StepUpdated {
        token: RequestToken,
        step_id: StepId,
        result: ApiOutcome<FlowStep>,
    },
    FlowStatusFetched {
        token: RequestToken,
        flow_id: FlowId,
        result: ApiOutcome<FlowStatus>,
    },
    CommandExecuted {
        token: RequestToken,
        result: ApiOutcome<Message>,
    },
}

/// Follow-up work a response asks the event loop to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    SubscribeStream(FlowId),
}

/// Run `request` against the backend. Never fails: errors become part of
/// the response.
pub async fn perform(backend: &dyn Backend, request: Request) -> Response {
    fn flatten<T>(result: Result<T, crate::api_client::ApiClientError>) -> ApiOutcome<T> {
        result.map_err(|e| e.to_string())
    }

    match request {
        Request::LoadSettings { token } => Response::SettingsLoaded {
            token,
            result: flatten(backend.get_llm_settings().await),
        },
        Request::SaveSettings { token, settings } => Response::SettingsSaved {
            token,
            result: flatten(backend.save_llm_settings(&settings).await),
        },
        Request::CreateAgent { token, config } => {
            let result = flatten(backend.create_agent(&config).await);
            Response::AgentCreated {
                token,
                submitted: config,
                result,
            }
        }
        Request::ListAgents { token } => Response::AgentsListed {
            token,
            result: flatten(backend.list_agents().await),
        },
        Request::FetchAgent { name } => {
            let result = flatten(backend.get_agent(&name).await);
            Response::AgentFetched { name, result }
        }
        Request::UpdateAgent { name, patch } => {
            let result = flatten(backend.update_agent(&name, &patch).await);
            Response::AgentUpdated { name, result }
        }
        Request::CreateFlow { token, steps } => Response::FlowCreated {
            token,
            result: flatten(backend.create_flow(&steps).await).map(|created| created.flow_id),
        },
        Request::UpdateStep {
            token,
            flow_id,
            step_id,
            patch,
        } => {
            let result = flatten(backend.update_flow_step(&flow_id, &step_id, &patch).await);
            Response::StepUpdated {
                token,
                step_id,
                result,
            }
        }
        Request::FetchFlowStatus { token, flow_id } => {
            let result = flatten(backend.get_flow_status(&flow_id).await);
            Response::FlowStatusFetched {
                token,
                flow_id,
                result,
            }
        }
        Request::ExecuteCommand { token, command } => Response::CommandExecuted {
            token,
            result: flatten(backend.execute_command(&command).await),
        },
    }
}

#[derive(Debug, Clone, Default)]
pub struct Store {
    pub llm: LlmState,
    pub agent: AgentState,
    pub flow: FlowState,
    pub terminal: TerminalState,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route a response to its slice.
    pub fn apply(&mut self, response: Response) -> Option<Effect> {
        match response {
            Response::SettingsLoaded { token, result } => self.llm.apply_loaded(token, result),
            Response::SettingsSaved { token, result } => self.llm.apply_saved(token, result),
            Response::AgentCreated {
                token,
                submitted,
                result,
            } => self.agent.apply_created(token, submitted, result),
            Response::AgentsListed { token, result } => self.agent.apply_listed(token, result),
            Response::AgentFetched { name, result } => self.agent.apply_fetched(&name, result),
            Response::AgentUpdated { name, result } => self.agent.apply_updated(&name, result),
            Response::FlowCreated { token, result } => {
                return self.flow.apply_created(token, result).map(Effect::SubscribeStream);
            }
            Response::StepUpdated {
                token,
                step_id,
                result,
            } => self.flow.apply_step_updated(token, &step_id, result),
            Response::FlowStatusFetched {
                token,
                flow_id,
                result,
            } => self.flow.apply_status(token, &flow_id, result),
            Response::CommandExecuted { token, result } => {
                self.terminal.apply_executed(token, result)
            }
        }
        None
    }

    /// Clear every banner older than `ttl`. Called from the tick.
    pub fn expire_messages(&mut self, now: Timestamp, ttl: chrono::Duration) {
        expire(&mut self.llm.message, now, ttl);
        expire(&mut self.agent.message, now, ttl);
    }
}
