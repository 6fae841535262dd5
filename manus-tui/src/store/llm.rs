//! LLM connection settings slice.

use super::{set_transient, ApiOutcome, Generation, Request, RequestStatus, RequestToken, TransientMessage};
use manus_core::LlmSettings;

#[derive(Debug, Clone, Default)]
pub struct LlmState {
    pub settings: LlmSettings,
    pub is_configured: bool,
    pub error: Option<String>,
    pub status: RequestStatus,
    pub message: Option<TransientMessage>,
    save_gen: Generation,
    load_gen: Generation,
}

impl LlmState {
    /// Replace the settings and mark the client configured. Validation is the
    /// form's job.
    pub fn update_settings(&mut self, settings: LlmSettings) {
        self.settings = settings;
        self.is_configured = true;
    }

    /// Start a save. Any load still in flight becomes stale.
    pub fn save_settings(&mut self, settings: LlmSettings) -> Request {
        self.load_gen.issue();
        self.status = RequestStatus::Loading;
        self.error = None;
        self.set_message("Saving configuration...");
        Request::SaveSettings {
            token: self.save_gen.issue(),
            settings,
        }
    }

    /// What the settings form does on submit.
    pub fn submit(&mut self, settings: LlmSettings) -> Request {
        self.update_settings(settings.clone());
        self.save_settings(settings)
    }

    pub fn load_settings(&mut self) -> Request {
        Request::LoadSettings {
            token: self.load_gen.issue(),
        }
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

    pub(crate) fn apply_saved(&mut self, token: RequestToken, result: ApiOutcome<LlmSettings>) {
        if !self.save_gen.is_current(token) {
            tracing::debug!(?token, "discarding stale settings save");
            return;
        }
        match result {
            Ok(_) => {
                self.status = RequestStatus::Succeeded;
                self.set_message("Configuration saved successfully!");
            }
            Err(err) => {
                tracing::warn!(error = %err, "saving LLM settings failed");
                self.status = RequestStatus::Failed;
                self.error = Some(err);
                self.set_message("Failed to save configuration");
            }
        }
    }

    pub(crate) fn apply_loaded(&mut self, token: RequestToken, result: ApiOutcome<LlmSettings>) {
        if !self.load_gen.is_current(token) {
            tracing::debug!(?token, "discarding stale settings load");
            return;
        }
        // A save issued after the load wins.
        if self.status == RequestStatus::Loading {
            return;
        }
        match result {
            Ok(settings) => {
                self.is_configured = settings.is_complete();
                self.settings = settings;
            }
            Err(err) => {
                tracing::warn!(error = %err, "loading LLM settings failed");
                self.error = Some(err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Response;

    fn token_of(request: &Request) -> RequestToken {
        match request {
            Request::SaveSettings { token, .. } | Request::LoadSettings { token } => *token,
            other => panic!("unexpected request {other:?}"),
        }
    }

    #[test]
    fn update_marks_configured() {
        let mut state = LlmState::default();
        assert!(!state.is_configured);
        state.update_settings(LlmSettings::default());
        assert!(state.is_configured);
    }

    #[test]
    fn save_sets_loading_and_message() {
        let mut state = LlmState::default();
        let request = state.save_settings(LlmSettings::default());
        assert!(matches!(request, Request::SaveSettings { .. }));
        assert_eq!(state.status, RequestStatus::Loading);
        assert_eq!(state.message.as_ref().map(|m| m.text.as_str()), Some("Saving configuration..."));
    }

    #[test]
    fn failed_save_surfaces_error() {
        let mut state = LlmState::default();
        let request = state.submit(LlmSettings::default());
        state.apply_saved(token_of(&request), Err("bad key".into()));
        assert_eq!(state.status, RequestStatus::Failed);
        assert_eq!(state.error.as_deref(), Some("bad key"));
        assert_eq!(
            state.message.as_ref().map(|m| m.text.as_str()),
            Some("Failed to save configuration")
        );
    }

    #[test]
    fn stale_save_is_ignored() {
        let mut store = crate::store::Store::new();
        let first = store.llm.save_settings(LlmSettings::default());
        let second = store.llm.save_settings(LlmSettings::default());
        store.apply(Response::SettingsSaved {
            token: token_of(&first),
            result: Err("late failure".into()),
        });
        assert_eq!(store.llm.status, RequestStatus::Loading);
        store.apply(Response::SettingsSaved {
            token: token_of(&second),
            result: Ok(LlmSettings::default()),
        });
        assert_eq!(store.llm.status, RequestStatus::Succeeded);
        assert!(store.llm.error.is_none());
    }

    #[test]
    fn load_issued_before_save_does_not_overwrite_it() {
        let mut state = LlmState::default();
        let load = state.load_settings();
        let saved = LlmSettings {
            model: "user-model".into(),
            api_key: "sk-user".into(),
            ..LlmSettings::default()
        };
        let save = state.submit(saved);
        state.apply_saved(token_of(&save), Ok(LlmSettings::default()));
        state.apply_loaded(token_of(&load), Ok(LlmSettings::default()));
        assert_eq!(state.settings.model, "user-model");
        assert_eq!(state.settings.api_key, "sk-user");
        assert!(state.is_configured);
        assert_eq!(state.status, RequestStatus::Succeeded);
    }

    #[test]
    fn load_without_key_is_not_configured() {
        let mut state = LlmState::default();
        let request = state.load_settings();
        let mut settings = LlmSettings::default();
        settings.model = "llama3".into();
        state.apply_loaded(token_of(&request), Ok(settings));
        assert_eq!(state.settings.model, "llama3");
        assert!(!state.is_configured);
    }
}
