//! Draft state behind the settings and agent forms.
//!
//! Form values are kept as the text the user typed and only parsed on
//! submit, so a half-typed number never reaches the store.

use manus_core::{AgentConfig, AgentType, ApiType, LlmSettings, ToolDefinition, ValidationError};
use tui_textarea::TextArea;

/// Which piece of text an open editor writes back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTarget {
    Command,
    LlmField(LlmField),
    AgentName,
    StepDescription,
}

/// A single-line text editor bound to a form field.
pub struct FieldEditor {
    pub target: EditTarget,
    pub textarea: TextArea<'static>,
}

impl FieldEditor {
    pub fn new(target: EditTarget, initial: &str) -> Self {
        Self {
            target,
            textarea: single_line(initial),
        }
    }

    pub fn text(&self) -> String {
        self.textarea.lines().join("")
    }

    pub fn set_text(&mut self, text: &str) {
        self.textarea = single_line(text);
    }

    pub fn clear(&mut self) {
        self.set_text("");
    }
}

fn single_line(text: &str) -> TextArea<'static> {
    let mut textarea = TextArea::new(vec![text.to_string()]);
    textarea.move_cursor(tui_textarea::CursorMove::End);
    textarea
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmField {
    Model,
    BaseUrl,
    ApiKey,
    MaxTokens,
    Temperature,
    ApiType,
    ApiVersion,
}

impl LlmField {
    pub fn all() -> &'static [LlmField] {
        &[
            LlmField::Model,
            LlmField::BaseUrl,
            LlmField::ApiKey,
            LlmField::MaxTokens,
            LlmField::Temperature,
            LlmField::ApiType,
            LlmField::ApiVersion,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            LlmField::Model => "Model",
            LlmField::BaseUrl => "Base URL",
            LlmField::ApiKey => "API Key",
            LlmField::MaxTokens => "Max Tokens",
            LlmField::Temperature => "Temperature",
            LlmField::ApiType => "API Type",
            LlmField::ApiVersion => "API Version",
        }
    }

    /// Fields edited by cycling through fixed values rather than typing.
    pub fn is_choice(&self) -> bool {
        matches!(self, LlmField::ApiType)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LlmForm {
    pub model: String,
    pub base_url: String,
    pub api_key: String,
    pub max_tokens: String,
    pub temperature: String,
    pub api_type: Option<ApiType>,
    pub api_version: String,
    pub focus: usize,
    /// Set once the user has touched the form; a backend load then leaves it alone.
    pub dirty: bool,
}

impl LlmForm {
    pub fn from_settings(settings: &LlmSettings) -> Self {
        Self {
            model: settings.model.clone(),
            base_url: settings.base_url.clone(),
            api_key: settings.api_key.clone(),
            max_tokens: settings.max_tokens.to_string(),
            temperature: settings.temperature.to_string(),
            api_type: settings.api_type,
            api_version: settings.api_version.clone().unwrap_or_default(),
            focus: 0,
            dirty: false,
        }
    }

    pub fn focused(&self) -> LlmField {
        LlmField::all()[self.focus.min(LlmField::all().len() - 1)]
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % LlmField::all().len();
    }

    pub fn focus_previous(&mut self) {
        let len = LlmField::all().len();
        self.focus = (self.focus + len - 1) % len;
    }

    pub fn value(&self, field: LlmField) -> String {
        match field {
            LlmField::Model => self.model.clone(),
            LlmField::BaseUrl => self.base_url.clone(),
            LlmField::ApiKey => self.api_key.clone(),
            LlmField::MaxTokens => self.max_tokens.clone(),
            LlmField::Temperature => self.temperature.clone(),
            LlmField::ApiType => self
                .api_type
                .map(|t| t.as_str().to_string())
                .unwrap_or_else(|| "default".to_string()),
            LlmField::ApiVersion => self.api_version.clone(),
        }
    }

    /// Value as shown on screen; the key is masked.
    pub fn display_value(&self, field: LlmField) -> String {
        match field {
            LlmField::ApiKey if !self.api_key.is_empty() => "•".repeat(self.api_key.chars().count().min(24)),
            _ => self.value(field),
        }
    }

    pub fn set(&mut self, field: LlmField, text: String) {
        self.dirty = true;
        match field {
            LlmField::Model => self.model = text,
            LlmField::BaseUrl => self.base_url = text,
            LlmField::ApiKey => self.api_key = text,
            LlmField::MaxTokens => self.max_tokens = text,
            LlmField::Temperature => self.temperature = text,
            LlmField::ApiType => self.api_type = text.trim().parse().ok(),
            LlmField::ApiVersion => self.api_version = text,
        }
    }

    pub fn cycle_api_type(&mut self) {
        self.dirty = true;
        self.api_type = ApiType::cycle(self.api_type);
    }

    /// Parse the draft into settings, enforcing what the inputs enforce.
    pub fn to_settings(&self, base: &LlmSettings) -> Result<LlmSettings, ValidationError> {
        let max_tokens = self
            .max_tokens
            .trim()
            .parse::<u32>()
            .map_err(|_| ValidationError::OutOfRange {
                field: "max_tokens",
                reason: format!("'{}' is not a whole number", self.max_tokens.trim()),
            })?;
        let temperature = self
            .temperature
            .trim()
            .parse::<f32>()
            .map_err(|_| ValidationError::OutOfRange {
                field: "temperature",
                reason: format!("'{}' is not a number", self.temperature.trim()),
            })?;
        let api_version = self.api_version.trim();
        let settings = LlmSettings {
            model: self.model.trim().to_string(),
            base_url: self.base_url.trim().to_string(),
            api_key: self.api_key.trim().to_string(),
            max_tokens,
            temperature,
            api_type: self.api_type,
            api_version: (!api_version.is_empty()).then(|| api_version.to_string()),
            max_input_tokens: base.max_input_tokens,
        };
        settings.validate()?;
        Ok(settings)
    }
}

impl Default for LlmForm {
    fn default() -> Self {
        Self::from_settings(&LlmSettings::default())
    }
}

/// Rows of the agent form: name, type, then one row per available tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentRow {
    Name,
    Type,
    Tool(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AgentPane {
    #[default]
    Form,
    Registry,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AgentForm {
    pub name: String,
    pub agent_type: AgentType,
    pub tools: Vec<ToolDefinition>,
    pub focus: usize,
    pub pane: AgentPane,
}

impl AgentForm {
    pub fn row(&self, tool_count: usize) -> AgentRow {
        match self.focus.min(tool_count + 1) {
            0 => AgentRow::Name,
            1 => AgentRow::Type,
            n => AgentRow::Tool(n - 2),
        }
    }

    pub fn focus_next(&mut self, tool_count: usize) {
        self.focus = (self.focus + 1).min(tool_count + 1);
    }

    pub fn focus_previous(&mut self) {
        self.focus = self.focus.saturating_sub(1);
    }

    pub fn toggle_tool(&mut self, tool: &ToolDefinition) {
        let mut draft = AgentConfig::new(self.name.clone(), self.agent_type);
        draft.tools = std::mem::take(&mut self.tools);
        draft.toggle_tool(tool);
        self.tools = draft.tools;
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t.name == name)
    }

    /// The config to submit. LLM settings are inherited from the global ones.
    pub fn to_config(&self, llm: &LlmSettings) -> AgentConfig {
        AgentConfig {
            name: self.name.clone(),
            agent_type: self.agent_type,
            tools: self.tools.clone(),
            llm_config: Some(llm.clone()),
        }
    }

    /// Back to a blank form, keeping the cursor where it was.
    pub fn reset(&mut self) {
        self.name.clear();
        self.agent_type = AgentType::default();
        self.tools.clear();
        self.focus = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_round_trips_default_settings() {
        let mut form = LlmForm::default();
        form.set(LlmField::ApiKey, "sk-test".into());
        let settings = form.to_settings(&LlmSettings::default()).unwrap();
        assert_eq!(settings.model, "gpt-4o");
        assert_eq!(settings.max_tokens, 4096);
        assert_eq!(settings.temperature, 0.0);
        assert_eq!(settings.api_version, None);
    }

    #[test]
    fn non_numeric_tokens_are_rejected() {
        let mut form = LlmForm::default();
        form.set(LlmField::ApiKey, "sk-test".into());
        form.set(LlmField::MaxTokens, "lots".into());
        assert!(matches!(
            form.to_settings(&LlmSettings::default()),
            Err(ValidationError::OutOfRange { field: "max_tokens", .. })
        ));
    }

    #[test]
    fn api_key_is_masked() {
        let mut form = LlmForm::default();
        form.set(LlmField::ApiKey, "secret".into());
        assert_eq!(form.display_value(LlmField::ApiKey), "••••••");
    }

    #[test]
    fn agent_rows_cover_tools() {
        let mut form = AgentForm::default();
        assert_eq!(form.row(2), AgentRow::Name);
        form.focus_next(2);
        form.focus_next(2);
        assert_eq!(form.row(2), AgentRow::Tool(0));
        form.focus_next(2);
        form.focus_next(2);
        assert_eq!(form.row(2), AgentRow::Tool(1));
    }

    #[test]
    fn editor_text_and_clear() {
        let mut editor = FieldEditor::new(EditTarget::Command, "ls -la");
        assert_eq!(editor.text(), "ls -la");
        editor.clear();
        assert_eq!(editor.text(), "");
    }
}
