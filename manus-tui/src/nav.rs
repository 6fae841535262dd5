//! Screen switching.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum View {
    #[default]
    Terminal,
    LlmConfig,
    AgentConfig,
    Flow,
}

impl View {
    pub fn title(&self) -> &'static str {
        match self {
            View::Terminal => "Terminal",
            View::LlmConfig => "LLM Configuration",
            View::AgentConfig => "Agent Configuration",
            View::Flow => "Flow Management",
        }
    }

    pub fn all() -> &'static [View] {
        &[View::Terminal, View::LlmConfig, View::AgentConfig, View::Flow]
    }

    pub fn index(&self) -> usize {
        Self::all().iter().position(|v| v == self).unwrap_or(0)
    }

    pub fn from_index(index: usize) -> Option<View> {
        Self::all().get(index).copied()
    }

    pub fn next(&self) -> View {
        let all = Self::all();
        all[(self.index() + 1) % all.len()]
    }

    pub fn previous(&self) -> View {
        let all = Self::all();
        let idx = self.index();
        all[if idx == 0 { all.len() - 1 } else { idx - 1 }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_and_previous_wrap() {
        assert_eq!(View::Flow.next(), View::Terminal);
        assert_eq!(View::Terminal.previous(), View::Flow);
        for view in View::all() {
            assert_eq!(view.next().previous(), *view);
        }
    }
}
