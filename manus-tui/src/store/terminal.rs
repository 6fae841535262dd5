//! Command terminal slice.

use super::{ApiOutcome, Generation, Request, RequestToken};
use manus_core::Message;

#[derive(Debug, Clone, Default)]
pub struct TerminalState {
    pub output: String,
    /// Oldest first.
    pub command_history: Vec<String>,
    pub is_processing: bool,
    pub error: Option<String>,
    exec_gen: Generation,
}

impl TerminalState {
    /// Start executing `command`. Only one command runs at a time; blank
    /// commands and calls made while busy return `None`.
    pub fn execute_command(&mut self, command: &str) -> Option<Request> {
        if command.trim().is_empty() {
            return None;
        }
        if self.is_processing {
            tracing::debug!(command, "command rejected while another is running");
            return None;
        }
        self.is_processing = true;
        self.error = None;
        self.command_history.push(command.to_string());
        self.append_output(&format!("\n> {command}\n"));
        Some(Request::ExecuteCommand {
            token: self.exec_gen.issue(),
            command: command.to_string(),
        })
    }

    pub fn append_output(&mut self, text: &str) {
        self.output.push_str(text);
    }

    pub fn set_output(&mut self, text: impl Into<String>) {
        self.output = text.into();
    }

    /// Empty the transcript. History and the last error are kept.
    pub fn clear_terminal(&mut self) {
        self.output.clear();
    }

    pub fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }

    /// Append one message from a flow's event stream.
    pub fn append_stream_line(&mut self, line: &str) {
        self.output.push_str(line);
        if !line.ends_with('\n') {
            self.output.push('\n');
        }
    }

    pub(crate) fn apply_executed(&mut self, token: RequestToken, result: ApiOutcome<Message>) {
        if !self.exec_gen.is_current(token) {
            tracing::debug!(?token, "discarding stale command result");
            return;
        }
        match result {
            Ok(message) => {
                self.append_output(&format!("{}\n", message.content));
            }
            Err(err) => {
                tracing::warn!(error = %err, "command failed");
                self.append_output(&format!("Error: {err}\n"));
                self.error = Some(err);
            }
        }
        self.is_processing = false;
    }
}
