//! Entity types exchanged with the orchestration backend.

use crate::enums::{deserialize_api_type, ApiType, AgentType, FlowType, MessageRole, StepStatus, ToolCallType};
use crate::error::{ValidationError, ValidationResult};
use crate::{FlowId, StepId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Upper bound the settings form accepts for `max_tokens`.
pub const MAX_TOKENS_LIMIT: u32 = 32_000;

/// Temperature range accepted by the settings form.
pub const TEMPERATURE_RANGE: std::ops::RangeInclusive<f32> = 0.0..=2.0;

// ============================================================================
// LLM SETTINGS
// ============================================================================

/// Connection settings for the LLM the backend agents talk to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmSettings {
    pub model: String,
    pub base_url: String,
    /// The backend strips the key when echoing settings back.
    #[serde(default)]
    pub api_key: String,
    pub max_tokens: u32,
    pub temperature: f32,
    #[serde(
        default,
        deserialize_with = "deserialize_api_type",
        skip_serializing_if = "Option::is_none"
    )]
    pub api_type: Option<ApiType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_input_tokens: Option<u32>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            max_tokens: 4096,
            temperature: 0.0,
            api_type: None,
            api_version: None,
            max_input_tokens: None,
        }
    }
}

impl LlmSettings {
    /// Check the constraints the settings form enforces on its inputs.
    pub fn validate(&self) -> ValidationResult<()> {
        require("model", &self.model)?;
        require("base_url", &self.base_url)?;
        require("api_key", &self.api_key)?;
        if self.max_tokens == 0 || self.max_tokens > MAX_TOKENS_LIMIT {
            return Err(ValidationError::OutOfRange {
                field: "max_tokens",
                reason: format!("must be between 1 and {}", MAX_TOKENS_LIMIT),
            });
        }
        if !self.temperature.is_finite() || !TEMPERATURE_RANGE.contains(&self.temperature) {
            return Err(ValidationError::OutOfRange {
                field: "temperature",
                reason: "must be between 0 and 2".to_string(),
            });
        }
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.validate().is_ok()
    }
}

fn require(field: &'static str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        Err(ValidationError::RequiredFieldMissing { field })
    } else {
        Ok(())
    }
}

// ============================================================================
// TOOLS
// ============================================================================

/// JSON-schema style description of a tool's parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParameters {
    #[serde(rename = "type")]
    pub schema_type: String,
    #[serde(default)]
    pub properties: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub required: Vec<String>,
}

impl Default for ToolParameters {
    fn default() -> Self {
        Self {
            schema_type: "object".to_string(),
            properties: BTreeMap::new(),
            required: Vec::new(),
        }
    }
}

/// A named capability an agent may invoke. Reference data; selection is by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: ToolParameters,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: ToolParameters::default(),
        }
    }
}

// ============================================================================
// AGENTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub name: String,
    #[serde(rename = "type", default)]
    pub agent_type: AgentType,
    #[serde(default)]
    pub tools: Vec<ToolDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_config: Option<LlmSettings>,
}

impl AgentConfig {
    pub fn new(name: impl Into<String>, agent_type: AgentType) -> Self {
        Self {
            name: name.into(),
            agent_type,
            tools: Vec::new(),
            llm_config: None,
        }
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t.name == name)
    }

    /// Add the tool when absent, remove it (by name) when present.
    ///
    /// Two consecutive toggles of the same tool leave the selection unchanged.
    pub fn toggle_tool(&mut self, tool: &ToolDefinition) {
        if self.has_tool(&tool.name) {
            self.tools.retain(|t| t.name != tool.name);
        } else {
            self.tools.push(tool.clone());
        }
    }

    /// Merge the fields present in `patch` into this config.
    pub fn apply(&mut self, patch: &AgentPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(agent_type) = patch.agent_type {
            self.agent_type = agent_type;
        }
        if let Some(tools) = &patch.tools {
            self.tools = tools.clone();
        }
        if let Some(llm_config) = &patch.llm_config {
            self.llm_config = Some(llm_config.clone());
        }
    }
}

/// Partial agent configuration, used for PATCH requests and local updates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub agent_type: Option<AgentType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDefinition>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_config: Option<LlmSettings>,
}

impl AgentPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.agent_type.is_none()
            && self.tools.is_none()
            && self.llm_config.is_none()
    }
}

// ============================================================================
// FLOWS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowStep {
    pub id: StepId,
    pub description: String,
    #[serde(default)]
    pub status: StepStatus,
    pub agent: String,
    #[serde(default)]
    pub dependencies: Vec<StepId>,
}

impl FlowStep {
    pub fn new(id: impl Into<StepId>, description: impl Into<String>, agent: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            status: StepStatus::NotStarted,
            agent: agent.into(),
            dependencies: Vec::new(),
        }
    }

    pub fn depends_on(&self, id: &str) -> bool {
        self.dependencies.iter().any(|d| d == id)
    }

    pub fn apply(&mut self, patch: &FlowStepPatch) {
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(agent) = &patch.agent {
            self.agent = agent.clone();
        }
        if let Some(dependencies) = &patch.dependencies {
            self.dependencies = dependencies.clone();
        }
    }
}

/// Partial flow step, used for PATCH requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowStepPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<StepStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Vec<StepId>>,
}

impl FlowStepPatch {
    pub fn status(status: StepStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

/// A plan: ordered steps assigned to agents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    #[serde(rename = "type", default)]
    pub flow_type: FlowType,
    #[serde(default)]
    pub agents: BTreeMap<String, AgentConfig>,
    #[serde(default)]
    pub steps: Vec<FlowStep>,
    pub primary_agent: String,
}

/// Keep only dependency ids that name another step in `steps`.
///
/// Order is preserved and duplicates are collapsed to their first occurrence.
pub fn retain_known_dependencies(steps: &[FlowStep], step_id: &str, deps: &[StepId]) -> Vec<StepId> {
    let known: HashSet<&str> = steps.iter().map(|s| s.id.as_str()).collect();
    let mut seen = HashSet::new();
    deps.iter()
        .filter(|d| d.as_str() != step_id && known.contains(d.as_str()))
        .filter(|d| seen.insert(d.as_str()))
        .cloned()
        .collect()
}

// ============================================================================
// MESSAGES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// JSON-encoded argument object, as produced by the model.
    pub arguments: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default)]
    pub call_type: ToolCallType,
    pub function: FunctionCall,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallResult {
    pub tool_call_id: String,
    pub name: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl From<ToolCallResult> for Message {
    /// A tool's output, addressed back to the call that produced it.
    fn from(result: ToolCallResult) -> Self {
        Self {
            role: MessageRole::Tool,
            content: result.content,
            tool_calls: None,
            tool_call_id: Some(result.tool_call_id),
            name: Some(result.name),
        }
    }
}

impl Message {
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            tool_calls: None,
            tool_call_id: None,
            name: None,
        }
    }
}

// ============================================================================
// WIRE PAYLOADS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateFlowRequest {
    pub steps: Vec<FlowStep>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFlowResponse {
    pub flow_id: FlowId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowStatus {
    #[serde(default)]
    pub steps: Vec<FlowStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_step: Option<StepId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteCommandRequest {
    pub command: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn configured() -> LlmSettings {
        LlmSettings {
            api_key: "sk-test".to_string(),
            ..LlmSettings::default()
        }
    }

    #[test]
    fn default_settings_need_an_api_key() {
        let err = LlmSettings::default().validate().unwrap_err();
        assert_eq!(err, ValidationError::RequiredFieldMissing { field: "api_key" });
        assert!(configured().is_complete());
    }

    #[test]
    fn settings_reject_out_of_range_values() {
        let mut settings = configured();
        settings.max_tokens = 0;
        assert!(settings.validate().is_err());
        settings.max_tokens = MAX_TOKENS_LIMIT + 1;
        assert!(settings.validate().is_err());
        settings.max_tokens = MAX_TOKENS_LIMIT;
        settings.temperature = 2.5;
        assert!(settings.validate().is_err());
        settings.temperature = f32::NAN;
        assert!(settings.validate().is_err());
        settings.temperature = 2.0;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn settings_decode_backend_echo_without_key() {
        let json = r#"{
            "model": "gpt-4o",
            "base_url": "https://api.openai.com/v1",
            "max_tokens": 4096,
            "temperature": 0.0,
            "api_type": "",
            "api_version": ""
        }"#;
        let settings: LlmSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.api_key, "");
        assert_eq!(settings.api_type, None);
        assert_eq!(settings.api_version.as_deref(), Some(""));
    }

    #[test]
    fn settings_omit_absent_provider_fields() {
        let value = serde_json::to_value(configured()).unwrap();
        assert!(value.get("api_type").is_none());
        assert!(value.get("api_version").is_none());
        assert_eq!(value["max_tokens"], 4096);
    }

    #[test]
    fn agent_config_uses_type_on_the_wire() {
        let config = AgentConfig::new("a1", AgentType::Planning);
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["type"], "planning");
        assert!(value.get("llm_config").is_none());
    }

    #[test]
    fn agent_tool_echo_without_schema_decodes() {
        let json = r#"{"name":"a1","type":"manus","tools":[{"name":"bash"}]}"#;
        let config: AgentConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.tools[0].parameters.schema_type, "object");
    }

    #[test]
    fn agent_patch_only_touches_present_fields() {
        let mut config = AgentConfig::new("a1", AgentType::Manus);
        config.toggle_tool(&ToolDefinition::new("bash", "run shell"));
        let patch = AgentPatch {
            agent_type: Some(AgentType::Swe),
            ..AgentPatch::default()
        };
        config.apply(&patch);
        assert_eq!(config.agent_type, AgentType::Swe);
        assert_eq!(config.name, "a1");
        assert_eq!(config.tools.len(), 1);
        assert_eq!(serde_json::to_string(&patch).unwrap(), r#"{"type":"swe"}"#);
    }

    #[test]
    fn retain_known_dependencies_filters_self_and_unknown() {
        let steps = vec![
            FlowStep::new("a", "first", "default"),
            FlowStep::new("b", "second", "default"),
            FlowStep::new("c", "third", "default"),
        ];
        let deps = vec![
            "a".to_string(),
            "b".to_string(),
            "zzz".to_string(),
            "c".to_string(),
            "c".to_string(),
        ];
        assert_eq!(retain_known_dependencies(&steps, "b", &deps), vec!["a", "c"]);
    }

    #[test]
    fn tool_result_becomes_tool_message() {
        let json = r#"{"tool_call_id":"call-1","name":"python_execute","content":"42"}"#;
        let result: ToolCallResult = serde_json::from_str(json).unwrap();
        let message = Message::from(result);
        assert_eq!(message.role, MessageRole::Tool);
        assert_eq!(message.content, "42");
        assert_eq!(message.tool_call_id.as_deref(), Some("call-1"));
        assert_eq!(message.name.as_deref(), Some("python_execute"));
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["role"], "tool");
        assert!(value.get("tool_calls").is_none());
    }

    #[test]
    fn flow_status_uses_camel_case() {
        let json = r#"{"steps":[],"activeStep":"step-1"}"#;
        let status: FlowStatus = serde_json::from_str(json).unwrap();
        assert_eq!(status.active_step.as_deref(), Some("step-1"));
        let created: CreateFlowResponse = serde_json::from_str(r#"{"flowId":"f-9"}"#).unwrap();
        assert_eq!(created.flow_id, "f-9");
    }

    fn arb_tool() -> impl Strategy<Value = ToolDefinition> {
        ("[a-d]", "[a-z ]{0,12}").prop_map(|(name, desc)| ToolDefinition::new(name, desc))
    }

    proptest! {
        #[test]
        fn prop_toggle_twice_restores_selection(
            initial in prop::collection::vec(arb_tool(), 0..4),
            tool in arb_tool(),
        ) {
            let mut config = AgentConfig::new("agent", AgentType::Manus);
            for t in &initial {
                if !config.has_tool(&t.name) {
                    config.tools.push(t.clone());
                }
            }
            let before = config.tools.iter().map(|t| t.name.clone()).collect::<HashSet<_>>();
            config.toggle_tool(&tool);
            config.toggle_tool(&tool);
            let after = config.tools.iter().map(|t| t.name.clone()).collect::<HashSet<_>>();
            prop_assert_eq!(before, after);
        }

        #[test]
        fn prop_toggle_never_duplicates(tools in prop::collection::vec(arb_tool(), 0..12)) {
            let mut config = AgentConfig::new("agent", AgentType::Manus);
            for tool in &tools {
                config.toggle_tool(tool);
            }
            let names = config.tools.iter().map(|t| t.name.as_str()).collect::<HashSet<_>>();
            prop_assert_eq!(names.len(), config.tools.len());
        }
    }
}
