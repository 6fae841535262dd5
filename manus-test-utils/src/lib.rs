//! Manus Test Utilities
//!
//! Shared test infrastructure for the console workspace:
//! - Proptest generators for the entity types
//! - Fixtures for common scenarios
//! - Assertions for flow bookkeeping invariants

pub use manus_core::{
    AgentConfig, AgentType, ApiType, FlowStep, LlmSettings, Message, MessageRole, StepStatus,
    ToolDefinition, ToolParameters,
};

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating console entity types.

    use super::*;
    use proptest::prelude::*;

    // === Enum Generators ===

    /// Generate a StepStatus variant.
    pub fn arb_step_status() -> impl Strategy<Value = StepStatus> {
        prop_oneof![
            Just(StepStatus::NotStarted),
            Just(StepStatus::InProgress),
            Just(StepStatus::Completed),
            Just(StepStatus::Blocked),
        ]
    }

    /// Generate an AgentType variant.
    pub fn arb_agent_type() -> impl Strategy<Value = AgentType> {
        prop_oneof![
            Just(AgentType::Planning),
            Just(AgentType::React),
            Just(AgentType::Swe),
            Just(AgentType::Manus),
        ]
    }

    pub fn arb_api_type() -> impl Strategy<Value = Option<ApiType>> {
        prop_oneof![Just(None), Just(Some(ApiType::Azure)), Just(Some(ApiType::Ollama))]
    }

    // === Entity Generators ===

    /// Generate settings that pass `LlmSettings::validate`.
    pub fn arb_llm_settings() -> impl Strategy<Value = LlmSettings> {
        (
            "[a-z0-9-]{1,20}",
            "https://[a-z]{3,10}\\.example/v1",
            "sk-[A-Za-z0-9]{8,24}",
            1u32..=32_000,
            0u32..=20,
            arb_api_type(),
        )
            .prop_map(|(model, base_url, api_key, max_tokens, temp_tenths, api_type)| {
                let api_version = match api_type {
                    Some(ApiType::Azure) => Some("2024-03-01-preview".to_string()),
                    _ => None,
                };
                LlmSettings {
                    model,
                    base_url,
                    api_key,
                    max_tokens,
                    temperature: temp_tenths as f32 / 10.0,
                    api_type,
                    api_version,
                    max_input_tokens: None,
                }
            })
    }

    /// Generate a tool definition with a small parameter schema.
    pub fn arb_tool_definition() -> impl Strategy<Value = ToolDefinition> {
        (
            "[a-z_]{1,12}",
            "[A-Za-z ]{0,40}",
            prop::collection::vec("[a-z]{1,8}", 0..4),
        )
            .prop_map(|(name, description, params)| {
                let mut parameters = ToolParameters::default();
                for param in &params {
                    parameters
                        .properties
                        .insert(param.clone(), serde_json::json!({ "type": "string" }));
                }
                parameters.required = params.into_iter().take(1).collect();
                ToolDefinition {
                    name,
                    description,
                    parameters,
                }
            })
    }

    /// Generate an agent with a duplicate-free tool list.
    pub fn arb_agent_config() -> impl Strategy<Value = AgentConfig> {
        (
            "[a-z][a-z0-9_]{0,15}",
            arb_agent_type(),
            prop::collection::vec(arb_tool_definition(), 0..5),
            prop::option::of(arb_llm_settings()),
        )
            .prop_map(|(name, agent_type, tools, llm_config)| {
                let mut config = AgentConfig::new(name, agent_type);
                for tool in &tools {
                    if !config.has_tool(&tool.name) {
                        config.tools.push(tool.clone());
                    }
                }
                config.llm_config = llm_config;
                config
            })
    }

    /// Generate a step with the given id and no dependencies.
    pub fn arb_flow_step(id: String) -> impl Strategy<Value = FlowStep> {
        ("[A-Za-z ]{1,40}", arb_step_status(), "[a-z]{1,8}").prop_map(
            move |(description, status, agent)| {
                let mut step = FlowStep::new(id.clone(), description, agent);
                step.status = status;
                step
            },
        )
    }

    /// One operation against the flow tracker, referring to steps by
    /// position so that generated sequences stay meaningful.
    #[derive(Debug, Clone)]
    pub enum StepOp {
        Add { id_seed: u8, description: String },
        Remove(usize),
        SetActive(usize),
        SetStatus(usize, StepStatus),
        SetDependencies(usize, Vec<usize>),
    }

    pub fn arb_step_op() -> impl Strategy<Value = StepOp> {
        prop_oneof![
            3 => (any::<u8>(), "[a-z ]{1,16}")
                .prop_map(|(id_seed, description)| StepOp::Add { id_seed, description }),
            1 => (0usize..16).prop_map(StepOp::Remove),
            1 => (0usize..16).prop_map(StepOp::SetActive),
            1 => (0usize..16, arb_step_status()).prop_map(|(i, s)| StepOp::SetStatus(i, s)),
            1 => (0usize..16, prop::collection::vec(0usize..16, 0..4))
                .prop_map(|(i, deps)| StepOp::SetDependencies(i, deps)),
        ]
    }

    pub fn arb_step_ops() -> impl Strategy<Value = Vec<StepOp>> {
        prop::collection::vec(arb_step_op(), 0..40)
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built test fixtures for common testing scenarios.

    use super::*;

    /// Settings the terminal accepts as configured.
    pub fn configured_settings() -> LlmSettings {
        LlmSettings {
            model: "gpt-4o".to_string(),
            api_key: "sk-test-key".to_string(),
            max_tokens: 4096,
            temperature: 0.0,
            ..LlmSettings::default()
        }
    }

    /// The tool catalog the backend's Manus agent ships with.
    pub fn sample_tools() -> Vec<ToolDefinition> {
        let mut python = ToolDefinition::new("python_execute", "Execute Python code");
        python
            .parameters
            .properties
            .insert("code".to_string(), serde_json::json!({ "type": "string" }));
        python.parameters.required = vec!["code".to_string()];

        let mut search = ToolDefinition::new("google_search", "Search the web");
        search
            .parameters
            .properties
            .insert("query".to_string(), serde_json::json!({ "type": "string" }));
        search.parameters.required = vec!["query".to_string()];

        vec![
            python,
            search,
            ToolDefinition::new("browser_use", "Drive a headless browser"),
            ToolDefinition::new("file_saver", "Save content to a local file"),
            ToolDefinition::new("terminate", "Finish the interaction"),
        ]
    }

    pub fn sample_agent(name: &str) -> AgentConfig {
        let mut agent = AgentConfig::new(name, AgentType::Manus);
        agent.tools = sample_tools().into_iter().take(2).collect();
        agent.llm_config = Some(configured_settings());
        agent
    }

    /// Three steps where `step-3` depends on `step-1` and `step-2`.
    pub fn sample_steps() -> Vec<FlowStep> {
        let first = FlowStep::new("step-1", "Collect requirements", "planner");
        let second = FlowStep::new("step-2", "Draft the design", "planner");
        let mut third = FlowStep::new("step-3", "Implement", "swe");
        third.dependencies = vec!["step-1".to_string(), "step-2".to_string()];
        vec![first, second, third]
    }

    pub fn assistant_reply(content: &str) -> Message {
        Message::assistant(content)
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Invariant checks for flow bookkeeping.

    use super::*;
    use std::collections::HashSet;

    /// Assert step ids are unique and the active id, if any, names a step.
    #[track_caller]
    pub fn assert_flow_consistent(steps: &[FlowStep], active: Option<&str>) {
        let mut seen = HashSet::new();
        for step in steps {
            assert!(seen.insert(step.id.as_str()), "duplicate step id {}", step.id);
        }
        if let Some(active) = active {
            assert!(seen.contains(active), "active step {} is not in the list", active);
        }
    }

    /// Assert no step depends on itself or on a step that is not present.
    #[track_caller]
    pub fn assert_dependencies_resolved(steps: &[FlowStep]) {
        let ids: HashSet<&str> = steps.iter().map(|s| s.id.as_str()).collect();
        for step in steps {
            for dep in &step.dependencies {
                assert_ne!(dep, &step.id, "step {} depends on itself", step.id);
                assert!(ids.contains(dep.as_str()), "step {} has dangling dependency {}", step.id, dep);
            }
        }
    }
}
