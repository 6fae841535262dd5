//! Event types for the TUI event loop.

use crate::store::Response;
use crossterm::event::KeyEvent;
use manus_core::FlowId;

#[derive(Debug, Clone)]
pub enum TuiEvent {
    Input(KeyEvent),
    Resize { width: u16, height: u16 },
    /// A backend request finished.
    Response(Box<Response>),
    Stream(StreamEvent),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEvent {
    pub flow_id: FlowId,
    pub kind: StreamEventKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEventKind {
    Opened,
    Message(String),
    Error(String),
    Closed,
}
