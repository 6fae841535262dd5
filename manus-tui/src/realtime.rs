//! Server-push subscription for flow events.
//!
//! One task per subscription reads `GET /api/stream/{flowId}`, decodes the
//! event-stream framing and forwards each message to the UI channel. There
//! is no reconnect: when the stream ends or fails a `Closed` event is sent
//! and the task exits. Dropping or closing the [`StreamSubscription`] aborts
//! the task and releases the connection.

use crate::api_client::StreamClient;
use crate::events::{StreamEvent, StreamEventKind, TuiEvent};
use futures_util::StreamExt;
use manus_core::FlowId;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Handle to a running stream task.
#[derive(Debug)]
pub struct StreamSubscription {
    flow_id: FlowId,
    handle: JoinHandle<()>,
}

impl StreamSubscription {
    pub fn flow_id(&self) -> &str {
        &self.flow_id
    }

    /// Stop receiving events and drop the connection.
    pub fn close(self) {
        tracing::debug!(flow_id = %self.flow_id, "closing flow stream");
        // Drop aborts the task.
    }
}

impl Drop for StreamSubscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub fn spawn_flow_stream(
    stream: StreamClient,
    flow_id: FlowId,
    sender: mpsc::Sender<TuiEvent>,
) -> StreamSubscription {
    let task_flow_id = flow_id.clone();
    let handle = tokio::spawn(async move {
        let emit = |kind: StreamEventKind| {
            TuiEvent::Stream(StreamEvent {
                flow_id: task_flow_id.clone(),
                kind,
            })
        };

        let response = match stream.open(&task_flow_id).await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(flow_id = %task_flow_id, error = %err, "flow stream failed to open");
                let _ = sender.send(emit(StreamEventKind::Error(err.to_string()))).await;
                let _ = sender.send(emit(StreamEventKind::Closed)).await;
                return;
            }
        };
        tracing::info!(flow_id = %task_flow_id, "flow stream opened");
        let _ = sender.send(emit(StreamEventKind::Opened)).await;

        let mut bytes = response.bytes_stream();
        let mut decoder = SseDecoder::default();
        while let Some(chunk) = bytes.next().await {
            match chunk {
                Ok(chunk) => {
                    for data in decoder.push(&chunk) {
                        if sender.send(emit(StreamEventKind::Message(data))).await.is_err() {
                            return;
                        }
                    }
                }
                Err(err) => {
                    tracing::warn!(flow_id = %task_flow_id, error = %err, "flow stream read failed");
                    let _ = sender.send(emit(StreamEventKind::Error(err.to_string()))).await;
                    break;
                }
            }
        }
        if let Some(data) = decoder.finish() {
            let _ = sender.send(emit(StreamEventKind::Message(data))).await;
        }
        tracing::info!(flow_id = %task_flow_id, "flow stream closed");
        let _ = sender.send(emit(StreamEventKind::Closed)).await;
    });

    StreamSubscription { flow_id, handle }
}

/// Incremental decoder for `text/event-stream` bodies.
///
/// Only `data` fields are kept; multiple `data` lines of one event are joined
/// with `\n` and the event is dispatched on the blank line that ends it.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    /// Feed raw bytes, returning every event completed by them.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some(newline_index) = self.buffer.iter().position(|byte| *byte == b'\n') {
            let mut line = self.buffer.drain(..=newline_index).collect::<Vec<_>>();
            line.pop();
            if matches!(line.last(), Some(b'\r')) {
                line.pop();
            }
            let line = String::from_utf8_lossy(&line).into_owned();
            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
        }
        events
    }

    /// Flush whatever is pending once the body has ended.
    pub fn finish(&mut self) -> Option<String> {
        if !self.buffer.is_empty() {
            let line = String::from_utf8_lossy(&std::mem::take(&mut self.buffer)).into_owned();
            let line = line.trim_end_matches('\r').to_string();
            if let Some(event) = self.process_line(&line) {
                return Some(event);
            }
        }
        self.dispatch()
    }

    fn process_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        if field == "data" {
            self.data.push(value.to_string());
        }
        None
    }

    fn dispatch(&mut self) -> Option<String> {
        if self.data.is_empty() {
            return None;
        }
        Some(std::mem::take(&mut self.data).join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_single_event() {
        let mut decoder = SseDecoder::default();
        assert_eq!(decoder.push(b"data: hello\n\n"), vec!["hello".to_string()]);
    }

    #[test]
    fn joins_multi_line_data() {
        let mut decoder = SseDecoder::default();
        let events = decoder.push(b"data: line one\ndata: line two\n\n");
        assert_eq!(events, vec!["line one\nline two".to_string()]);
    }

    #[test]
    fn handles_chunks_split_mid_line() {
        let mut decoder = SseDecoder::default();
        assert!(decoder.push(b"da").is_empty());
        assert!(decoder.push(b"ta: par").is_empty());
        assert!(decoder.push(b"tial\r\n").is_empty());
        assert_eq!(decoder.push(b"\r\n"), vec!["partial".to_string()]);
    }

    #[test]
    fn ignores_comments_and_other_fields() {
        let mut decoder = SseDecoder::default();
        let events = decoder.push(b": keepalive\nevent: step\nid: 7\ndata:x\n\n\n");
        assert_eq!(events, vec!["x".to_string()]);
    }

    #[test]
    fn finish_flushes_unterminated_event() {
        let mut decoder = SseDecoder::default();
        assert!(decoder.push(b"data: tail").is_empty());
        assert_eq!(decoder.finish(), Some("tail".to_string()));
        assert_eq!(decoder.finish(), None);
    }
}
