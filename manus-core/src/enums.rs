//! Enum types for console entities

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// LLM PROVIDER
// ============================================================================

/// Provider variant for an LLM endpoint. Absent means the default
/// OpenAI-compatible API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiType {
    Azure,
    Ollama,
}

impl ApiType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiType::Azure => "azure",
            ApiType::Ollama => "ollama",
        }
    }

    /// Cycle through `None -> Azure -> Ollama -> None`, the order the
    /// provider selector presents them in.
    pub fn cycle(current: Option<ApiType>) -> Option<ApiType> {
        match current {
            None => Some(ApiType::Azure),
            Some(ApiType::Azure) => Some(ApiType::Ollama),
            Some(ApiType::Ollama) => None,
        }
    }
}

impl fmt::Display for ApiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The backend reports "no provider variant" as an empty string.
pub(crate) fn deserialize_api_type<'de, D>(deserializer: D) -> Result<Option<ApiType>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse::<ApiType>()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

impl FromStr for ApiType {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "azure" => Ok(ApiType::Azure),
            "ollama" => Ok(ApiType::Ollama),
            _ => Err(EnumParseError::new("api type", s)),
        }
    }
}

// ============================================================================
// AGENTS
// ============================================================================

/// Kind of agent the backend instantiates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    Planning,
    React,
    Swe,
    #[default]
    Manus,
}

impl AgentType {
    pub fn all() -> &'static [AgentType] {
        &[
            AgentType::Manus,
            AgentType::Planning,
            AgentType::React,
            AgentType::Swe,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentType::Planning => "planning",
            AgentType::React => "react",
            AgentType::Swe => "swe",
            AgentType::Manus => "manus",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AgentType::Planning => "Planning",
            AgentType::React => "React",
            AgentType::Swe => "SWE",
            AgentType::Manus => "Manus",
        }
    }

    pub fn next(&self) -> AgentType {
        let all = Self::all();
        let idx = all.iter().position(|t| t == self).unwrap_or(0);
        all[(idx + 1) % all.len()]
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentType {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "planning" => Ok(AgentType::Planning),
            "react" => Ok(AgentType::React),
            "swe" => Ok(AgentType::Swe),
            "manus" => Ok(AgentType::Manus),
            _ => Err(EnumParseError::new("agent type", s)),
        }
    }
}

// ============================================================================
// FLOWS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FlowType {
    #[default]
    Planning,
}

/// Status of a single plan step.
///
/// Statuses form a flat set: any status may follow any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
    Blocked,
}

impl StepStatus {
    pub fn all() -> &'static [StepStatus] {
        &[
            StepStatus::NotStarted,
            StepStatus::InProgress,
            StepStatus::Completed,
            StepStatus::Blocked,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::NotStarted => "not_started",
            StepStatus::InProgress => "in_progress",
            StepStatus::Completed => "completed",
            StepStatus::Blocked => "blocked",
        }
    }

    /// Checkbox-style marker shown next to a step.
    pub fn marker(&self) -> &'static str {
        match self {
            StepStatus::NotStarted => "[ ]",
            StepStatus::InProgress => "[→]",
            StepStatus::Completed => "[✓]",
            StepStatus::Blocked => "[!]",
        }
    }

    pub fn next(&self) -> StepStatus {
        let all = Self::all();
        let idx = all.iter().position(|s| s == self).unwrap_or(0);
        all[(idx + 1) % all.len()]
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepStatus {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "not_started" => Ok(StepStatus::NotStarted),
            "in_progress" => Ok(StepStatus::InProgress),
            "completed" => Ok(StepStatus::Completed),
            "blocked" => Ok(StepStatus::Blocked),
            _ => Err(EnumParseError::new("step status", s)),
        }
    }
}

// ============================================================================
// MESSAGES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallType {
    #[default]
    Function,
}

/// Error when parsing an invalid enum string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid {kind}: {value}")]
pub struct EnumParseError {
    pub kind: &'static str,
    pub value: String,
}

impl EnumParseError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_status_round_trips_through_display() {
        for status in StepStatus::all() {
            assert_eq!(status.to_string().parse::<StepStatus>(), Ok(*status));
        }
    }

    #[test]
    fn step_status_next_cycles_through_all() {
        let mut status = StepStatus::NotStarted;
        for _ in 0..StepStatus::all().len() {
            status = status.next();
        }
        assert_eq!(status, StepStatus::NotStarted);
    }

    #[test]
    fn agent_type_serializes_snake_case() {
        let json = serde_json::to_string(&AgentType::Swe).unwrap();
        assert_eq!(json, "\"swe\"");
    }

    #[test]
    fn agent_type_rejects_unknown() {
        let err = "wizard".parse::<AgentType>().unwrap_err();
        assert_eq!(err.to_string(), "Invalid agent type: wizard");
    }

    #[test]
    fn api_type_cycle_returns_to_default() {
        let mut current = None;
        for _ in 0..3 {
            current = ApiType::cycle(current);
        }
        assert_eq!(current, None);
    }
}
