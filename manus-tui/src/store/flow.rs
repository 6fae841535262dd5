//! Flow and step tracker slice.
//!
//! Keeps an ordered list of steps with unique ids, at most one active step,
//! and dependency lists that only name other steps in the list. Status
//! transitions are unconstrained.

use super::{ApiOutcome, Generation, Request, RequestToken};
use manus_core::{
    retain_known_dependencies, Flow, FlowId, FlowStatus, FlowStep, FlowStepPatch, StepId,
    StepStatus,
};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowPhase {
    Idle,
    Loaded,
    Executing,
}

#[derive(Debug, Clone, Default)]
pub struct FlowState {
    pub current_flow: Option<Flow>,
    pub steps: Vec<FlowStep>,
    pub active_step_id: Option<StepId>,
    pub error: Option<String>,
    pub is_executing: bool,
    /// Set once the backend has accepted the steps.
    pub flow_id: Option<FlowId>,
    create_gen: Generation,
    status_gen: Generation,
    step_gen: Generation,
    /// Latest update token per step.
    step_tokens: HashMap<StepId, RequestToken>,
}

impl FlowState {
    pub fn phase(&self) -> FlowPhase {
        if self.is_executing {
            FlowPhase::Executing
        } else if self.steps.is_empty() {
            FlowPhase::Idle
        } else {
            FlowPhase::Loaded
        }
    }

    pub fn step(&self, id: &str) -> Option<&FlowStep> {
        self.steps.iter().find(|s| s.id == id)
    }

    pub fn active_step(&self) -> Option<&FlowStep> {
        self.active_step_id.as_deref().and_then(|id| self.step(id))
    }

    /// Load a whole flow, replacing any previous one.
    pub fn initialize_flow(&mut self, flow: Flow) {
        self.steps = sanitize_steps(flow.steps.clone());
        self.current_flow = Some(flow);
        self.active_step_id = None;
        self.is_executing = false;
        self.error = None;
        self.flow_id = None;
        self.invalidate_pending();
    }

    /// Append a step. Refuses an id already in the list.
    pub fn add_step(&mut self, mut step: FlowStep) -> bool {
        if self.step(&step.id).is_some() {
            tracing::debug!(step_id = %step.id, "duplicate step id ignored");
            return false;
        }
        step.dependencies = retain_known_dependencies(&self.steps, &step.id, &step.dependencies);
        self.steps.push(step);
        true
    }

    /// Remove a step and every reference to it.
    pub fn remove_step(&mut self, id: &str) -> bool {
        let Some(index) = self.steps.iter().position(|s| s.id == id) else {
            return false;
        };
        self.steps.remove(index);
        for step in &mut self.steps {
            step.dependencies.retain(|d| d != id);
        }
        if self.active_step_id.as_deref() == Some(id) {
            self.active_step_id = None;
        }
        self.step_tokens.remove(id);
        true
    }

    pub fn update_step_status(&mut self, id: &str, status: StepStatus) -> bool {
        match self.steps.iter_mut().find(|s| s.id == id) {
            Some(step) => {
                step.status = status;
                true
            }
            None => false,
        }
    }

    pub fn set_active_step(&mut self, id: &str) -> bool {
        if self.step(id).is_none() {
            return false;
        }
        self.active_step_id = Some(id.to_string());
        true
    }

    pub fn clear_active_step(&mut self) {
        self.active_step_id = None;
    }

    /// Replace the dependency list of `id`. Self references and unknown ids
    /// are dropped; cycles are allowed.
    pub fn update_step_dependencies(&mut self, id: &str, deps: &[StepId]) -> bool {
        let deps = retain_known_dependencies(&self.steps, id, deps);
        match self.steps.iter_mut().find(|s| s.id == id) {
            Some(step) => {
                step.dependencies = deps;
                true
            }
            None => false,
        }
    }

    pub fn set_executing(&mut self, executing: bool) {
        self.is_executing = executing;
    }

    pub fn set_error(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
        self.is_executing = false;
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn reset_flow(&mut self) {
        *self = Self {
            create_gen: std::mem::take(&mut self.create_gen),
            status_gen: std::mem::take(&mut self.status_gen),
            step_gen: std::mem::take(&mut self.step_gen),
            ..Self::default()
        };
        self.invalidate_pending();
    }

    /// Make every in-flight response stale.
    fn invalidate_pending(&mut self) {
        self.create_gen.issue();
        self.status_gen.issue();
        self.step_tokens.clear();
    }

    /// Submit the local steps as a new backend flow.
    pub fn create_remote_flow(&mut self) -> Option<Request> {
        if self.steps.is_empty() || self.is_executing {
            return None;
        }
        self.is_executing = true;
        self.error = None;
        Some(Request::CreateFlow {
            token: self.create_gen.issue(),
            steps: self.steps.clone(),
        })
    }

    /// Change a step's status locally, and on the backend once the flow
    /// exists there.
    pub fn sync_step_status(&mut self, id: &str, status: StepStatus) -> Option<Request> {
        if !self.update_step_status(id, status) {
            return None;
        }
        let flow_id = self.flow_id.clone()?;
        let token = self.step_gen.issue();
        self.step_tokens.insert(id.to_string(), token);
        Some(Request::UpdateStep {
            token,
            flow_id,
            step_id: id.to_string(),
            patch: FlowStepPatch::status(status),
        })
    }

    pub fn refresh_status(&mut self) -> Option<Request> {
        let flow_id = self.flow_id.clone()?;
        Some(Request::FetchFlowStatus {
            token: self.status_gen.issue(),
            flow_id,
        })
    }

    /// The event stream for `flow_id` ended.
    pub fn stream_finished(&mut self, flow_id: &str) {
        if self.flow_id.as_deref() == Some(flow_id) {
            self.is_executing = false;
        }
    }

    pub(crate) fn apply_created(
        &mut self,
        token: RequestToken,
        result: ApiOutcome<FlowId>,
    ) -> Option<FlowId> {
        if !self.create_gen.is_current(token) {
            tracing::debug!(?token, "discarding stale flow creation");
            return None;
        }
        match result {
            Ok(flow_id) => {
                tracing::info!(%flow_id, steps = self.steps.len(), "flow created");
                self.flow_id = Some(flow_id.clone());
                self.is_executing = true;
                Some(flow_id)
            }
            Err(err) => {
                tracing::warn!(error = %err, "creating flow failed");
                self.set_error(err);
                None
            }
        }
    }

    pub(crate) fn apply_step_updated(
        &mut self,
        token: RequestToken,
        step_id: &str,
        result: ApiOutcome<FlowStep>,
    ) {
        if self.step_tokens.get(step_id) != Some(&token) {
            tracing::debug!(step_id, "discarding stale step update");
            return;
        }
        match result {
            Ok(mut updated) => {
                updated.id = step_id.to_string();
                updated.dependencies =
                    retain_known_dependencies(&self.steps, step_id, &updated.dependencies);
                if let Some(step) = self.steps.iter_mut().find(|s| s.id == step_id) {
                    *step = updated;
                }
            }
            Err(err) => {
                tracing::warn!(step_id, error = %err, "updating step failed");
                self.error = Some(err);
            }
        }
    }

    pub(crate) fn apply_status(
        &mut self,
        token: RequestToken,
        flow_id: &str,
        result: ApiOutcome<FlowStatus>,
    ) {
        if !self.status_gen.is_current(token) || self.flow_id.as_deref() != Some(flow_id) {
            tracing::debug!(flow_id, "discarding stale flow status");
            return;
        }
        match result {
            Ok(status) => {
                self.steps = sanitize_steps(status.steps);
                self.active_step_id = status.active_step.filter(|id| self.step(id).is_some());
            }
            Err(err) => {
                tracing::warn!(flow_id, error = %err, "fetching flow status failed");
                self.error = Some(err);
            }
        }
    }
}

/// Drop repeated ids (first wins) and dependencies on unknown steps.
fn sanitize_steps(steps: Vec<FlowStep>) -> Vec<FlowStep> {
    let mut seen = HashSet::new();
    let mut unique: Vec<FlowStep> = steps
        .into_iter()
        .filter(|step| seen.insert(step.id.clone()))
        .collect();
    let snapshot = unique.clone();
    for step in &mut unique {
        step.dependencies = retain_known_dependencies(&snapshot, &step.id, &step.dependencies);
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(id: &str) -> FlowStep {
        FlowStep::new(id, format!("do {id}"), "manus")
    }

    fn loaded() -> FlowState {
        let mut state = FlowState::default();
        for id in ["a", "b", "c"] {
            assert!(state.add_step(step(id)));
        }
        state
    }

    #[test]
    fn phases_follow_steps_and_executing() {
        let mut state = FlowState::default();
        assert_eq!(state.phase(), FlowPhase::Idle);
        state.add_step(step("a"));
        assert_eq!(state.phase(), FlowPhase::Loaded);
        state.set_executing(true);
        assert_eq!(state.phase(), FlowPhase::Executing);
        state.set_error("boom");
        assert_eq!(state.phase(), FlowPhase::Loaded);
    }

    #[test]
    fn duplicate_ids_are_refused() {
        let mut state = loaded();
        assert!(!state.add_step(step("a")));
        assert_eq!(state.steps.len(), 3);
    }

    #[test]
    fn removing_active_step_clears_it_and_prunes_dependencies() {
        let mut state = loaded();
        state.update_step_dependencies("c", &["a".into(), "b".into()]);
        state.set_active_step("a");
        assert!(state.remove_step("a"));
        assert!(state.active_step_id.is_none());
        assert_eq!(state.step("c").map(|s| s.dependencies.clone()), Some(vec!["b".to_string()]));
    }

    #[test]
    fn dependencies_are_replaced() {
        let mut state = loaded();
        state.update_step_dependencies("a", &["b".into()]);
        state.update_step_dependencies("a", &["c".into()]);
        assert_eq!(state.step("a").map(|s| s.dependencies.clone()), Some(vec!["c".to_string()]));
    }

    #[test]
    fn self_and_unknown_dependencies_are_dropped() {
        let mut state = loaded();
        state.update_step_dependencies("a", &["a".into(), "zzz".into(), "b".into()]);
        assert_eq!(state.step("a").map(|s| s.dependencies.clone()), Some(vec!["b".to_string()]));
    }

    #[test]
    fn set_active_ignores_unknown_ids() {
        let mut state = loaded();
        assert!(state.set_active_step("b"));
        assert!(!state.set_active_step("nope"));
        assert_eq!(state.active_step_id.as_deref(), Some("b"));
    }

    #[test]
    fn reset_returns_to_idle() {
        let mut state = loaded();
        state.set_active_step("a");
        state.set_executing(true);
        state.reset_flow();
        assert!(state.steps.is_empty());
        assert!(state.active_step_id.is_none());
        assert!(!state.is_executing);
        assert_eq!(state.phase(), FlowPhase::Idle);
    }

    #[test]
    fn sync_without_flow_id_is_local_only() {
        let mut state = loaded();
        assert!(state.sync_step_status("a", StepStatus::Completed).is_none());
        assert_eq!(state.step("a").map(|s| s.status), Some(StepStatus::Completed));
    }

    #[test]
    fn created_flow_enables_sync_and_refresh() {
        let mut state = loaded();
        let Some(Request::CreateFlow { token, steps }) = state.create_remote_flow() else {
            panic!("expected create request");
        };
        assert_eq!(steps.len(), 3);
        assert!(state.create_remote_flow().is_none());
        assert_eq!(state.apply_created(token, Ok("flow-1".into())), Some("flow-1".to_string()));
        assert!(state.is_executing);

        let request = state.sync_step_status("b", StepStatus::InProgress);
        assert!(matches!(request, Some(Request::UpdateStep { ref flow_id, .. }) if flow_id == "flow-1"));
        assert!(state.refresh_status().is_some());

        state.stream_finished("other");
        assert!(state.is_executing);
        state.stream_finished("flow-1");
        assert!(!state.is_executing);
    }

    #[test]
    fn stale_step_update_is_discarded() {
        let mut state = loaded();
        state.flow_id = Some("flow-1".into());
        let Some(Request::UpdateStep { token: first, .. }) =
            state.sync_step_status("a", StepStatus::InProgress)
        else {
            panic!("expected update request");
        };
        state.sync_step_status("a", StepStatus::Completed);

        let mut echoed = step("a");
        echoed.status = StepStatus::InProgress;
        state.apply_step_updated(first, "a", Ok(echoed));
        assert_eq!(state.step("a").map(|s| s.status), Some(StepStatus::Completed));
    }

    #[test]
    fn status_refresh_replaces_steps() {
        let mut state = loaded();
        state.flow_id = Some("flow-1".into());
        let Some(Request::FetchFlowStatus { token, flow_id }) = state.refresh_status() else {
            panic!("expected status request");
        };
        let mut remote = step("x");
        remote.dependencies = vec!["ghost".into()];
        state.apply_status(
            token,
            &flow_id,
            Ok(FlowStatus {
                steps: vec![remote.clone(), remote],
                active_step: Some("x".into()),
            }),
        );
        assert_eq!(state.steps.len(), 1);
        assert!(state.steps[0].dependencies.is_empty());
        assert_eq!(state.active_step_id.as_deref(), Some("x"));
    }
}
