//! API client layer for the orchestration backend's REST and event-stream endpoints.

use crate::config::TuiConfig;
use async_trait::async_trait;
use manus_core::{
    AgentConfig, AgentPatch, CreateFlowRequest, CreateFlowResponse, ExecuteCommandRequest,
    FlowStatus, FlowStep, FlowStepPatch, LlmSettings, Message,
};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, Url};
use serde_json::Value;
use std::time::Duration;

/// Error text used when a failed response carries no message of its own.
pub const FALLBACK_ERROR: &str = "API request failed";

#[derive(Debug, thiserror::Error)]
pub enum ApiClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// The backend rejected the request; `message` is its own explanation.
    #[error("{message}")]
    Server { status: Option<u16>, message: String },
    #[error("Unexpected response: {0}")]
    InvalidResponse(String),
    #[error("Config error: {0}")]
    Config(String),
}

/// REST operations the store drives. Implemented by [`RestClient`]; tests
/// substitute an in-memory backend.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn get_llm_settings(&self) -> Result<LlmSettings, ApiClientError>;
    async fn save_llm_settings(&self, settings: &LlmSettings) -> Result<LlmSettings, ApiClientError>;
    async fn create_agent(&self, config: &AgentConfig) -> Result<AgentConfig, ApiClientError>;
    async fn list_agents(&self) -> Result<Vec<AgentConfig>, ApiClientError>;
    async fn get_agent(&self, agent_id: &str) -> Result<AgentConfig, ApiClientError>;
    async fn update_agent(
        &self,
        agent_id: &str,
        patch: &AgentPatch,
    ) -> Result<AgentConfig, ApiClientError>;
    async fn create_flow(&self, steps: &[FlowStep]) -> Result<CreateFlowResponse, ApiClientError>;
    async fn update_flow_step(
        &self,
        flow_id: &str,
        step_id: &str,
        patch: &FlowStepPatch,
    ) -> Result<FlowStep, ApiClientError>;
    async fn get_flow_status(&self, flow_id: &str) -> Result<FlowStatus, ApiClientError>;
    async fn execute_command(&self, command: &str) -> Result<Message, ApiClientError>;
}

#[derive(Clone)]
pub struct ApiClient {
    rest: RestClient,
    stream: StreamClient,
}

impl ApiClient {
    pub fn new(config: &TuiConfig) -> Result<Self, ApiClientError> {
        let rest = RestClient::new(config)?;
        let stream = StreamClient::new(config)?;
        Ok(Self { rest, stream })
    }

    pub fn rest(&self) -> &RestClient {
        &self.rest
    }

    pub fn stream(&self) -> &StreamClient {
        &self.stream
    }
}

#[derive(Clone)]
pub struct RestClient {
    client: reqwest::Client,
    base_url: Url,
}

impl RestClient {
    pub fn new(config: &TuiConfig) -> Result<Self, ApiClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: parse_base_url(&config.api_base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn request<T, B>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&B>,
    ) -> Result<T, ApiClientError>
    where
        T: serde::de::DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        let url = endpoint(&self.base_url, segments)?;
        tracing::debug!(%method, %url, "backend request");
        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        let value = decode_body(status.as_u16(), status.is_success(), &text)?;
        Ok(serde_json::from_value(value)?)
    }

    async fn get_json<T>(&self, segments: &[&str]) -> Result<T, ApiClientError>
    where
        T: serde::de::DeserializeOwned,
    {
        self.request::<T, ()>(Method::GET, segments, None).await
    }
}

#[async_trait]
impl Backend for RestClient {
    async fn get_llm_settings(&self) -> Result<LlmSettings, ApiClientError> {
        self.get_json(&["api", "llm", "settings"]).await
    }

    async fn save_llm_settings(&self, settings: &LlmSettings) -> Result<LlmSettings, ApiClientError> {
        self.request(Method::POST, &["api", "llm", "settings"], Some(settings))
            .await
    }

    async fn create_agent(&self, config: &AgentConfig) -> Result<AgentConfig, ApiClientError> {
        self.request(Method::POST, &["api", "agents"], Some(config)).await
    }

    async fn list_agents(&self) -> Result<Vec<AgentConfig>, ApiClientError> {
        self.get_json(&["api", "agents"]).await
    }

    async fn get_agent(&self, agent_id: &str) -> Result<AgentConfig, ApiClientError> {
        self.get_json(&["api", "agents", agent_id]).await
    }

    async fn update_agent(
        &self,
        agent_id: &str,
        patch: &AgentPatch,
    ) -> Result<AgentConfig, ApiClientError> {
        self.request(Method::PATCH, &["api", "agents", agent_id], Some(patch))
            .await
    }

    async fn create_flow(&self, steps: &[FlowStep]) -> Result<CreateFlowResponse, ApiClientError> {
        let body = CreateFlowRequest {
            steps: steps.to_vec(),
        };
        self.request(Method::POST, &["api", "flow"], Some(&body)).await
    }

    async fn update_flow_step(
        &self,
        flow_id: &str,
        step_id: &str,
        patch: &FlowStepPatch,
    ) -> Result<FlowStep, ApiClientError> {
        self.request(
            Method::PATCH,
            &["api", "flow", flow_id, "steps", step_id],
            Some(patch),
        )
        .await
    }

    async fn get_flow_status(&self, flow_id: &str) -> Result<FlowStatus, ApiClientError> {
        self.get_json(&["api", "flow", flow_id, "status"]).await
    }

    async fn execute_command(&self, command: &str) -> Result<Message, ApiClientError> {
        let body = ExecuteCommandRequest {
            command: command.to_string(),
        };
        let value: Value = self
            .request(Method::POST, &["api", "execute"], Some(&body))
            .await?;
        message_from_reply(value)
    }
}

/// Client for the long-lived event stream.
///
/// Uses its own `reqwest::Client` without a total request timeout so the
/// connection may stay open indefinitely; only connecting is bounded.
#[derive(Clone)]
pub struct StreamClient {
    client: reqwest::Client,
    base_url: Url,
}

impl StreamClient {
    pub fn new(config: &TuiConfig) -> Result<Self, ApiClientError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;
        Ok(Self {
            client,
            base_url: parse_base_url(&config.api_base_url)?,
        })
    }

    pub fn stream_url(&self, flow_id: &str) -> Result<Url, ApiClientError> {
        endpoint(&self.base_url, &["api", "stream", flow_id])
    }

    /// Open the stream and return the response once headers arrive.
    pub async fn open(&self, flow_id: &str) -> Result<reqwest::Response, ApiClientError> {
        let url = self.stream_url(flow_id)?;
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await?;
            return Err(error_from_body(status.as_u16(), &text));
        }
        Ok(response)
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ApiClientError> {
    let url = Url::parse(raw.trim()).map_err(|e| ApiClientError::Config(e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(ApiClientError::Config(format!("{} cannot be a base URL", raw)));
    }
    Ok(url)
}

/// Join path segments onto the base URL, percent-encoding each one.
pub fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, ApiClientError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ApiClientError::Config(format!("{} cannot be a base URL", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Turn a response body into the payload value, or the backend's error.
///
/// Success bodies may be the bare payload or an envelope of the form
/// `{"status": ..., "message": ..., "data": ...}`; an envelope with
/// `"status": "error"` is a failure even under a 2xx status.
pub fn decode_body(status: u16, success: bool, text: &str) -> Result<Value, ApiClientError> {
    if !success {
        return Err(error_from_body(status, text));
    }
    let value: Value = if text.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(text)?
    };
    match value {
        Value::Object(mut map) => {
            if map.get("status").and_then(Value::as_str) == Some("error") {
                return Err(ApiClientError::Server {
                    status: Some(status),
                    message: message_field(&Value::Object(map))
                        .unwrap_or_else(|| FALLBACK_ERROR.to_string()),
                });
            }
            if map.contains_key("status") && map.contains_key("data") {
                return Ok(map.remove("data").unwrap_or(Value::Null));
            }
            Ok(Value::Object(map))
        }
        other => Ok(other),
    }
}

fn error_from_body(status: u16, text: &str) -> ApiClientError {
    let message = serde_json::from_str::<Value>(text)
        .ok()
        .and_then(|v| message_field(&v))
        .unwrap_or_else(|| FALLBACK_ERROR.to_string());
    ApiClientError::Server {
        status: Some(status),
        message,
    }
}

fn message_field(value: &Value) -> Option<String> {
    match value.get("message") {
        Some(Value::String(message)) if !message.is_empty() => Some(message.clone()),
        _ => match value.get("detail") {
            Some(Value::String(detail)) => Some(detail.clone()),
            Some(detail @ Value::Array(_)) => Some(detail.to_string()),
            _ => None,
        },
    }
}

/// `/api/execute` answers with either a `Message` or `{"status", "result"}`.
pub fn message_from_reply(value: Value) -> Result<Message, ApiClientError> {
    if value.get("role").is_some() {
        return Ok(serde_json::from_value(value)?);
    }
    match value.get("result") {
        Some(Value::String(result)) => Ok(Message::assistant(result.clone())),
        Some(Value::Null) | None => Err(ApiClientError::InvalidResponse(
            "execute reply carried neither a message nor a result".to_string(),
        )),
        Some(other) => Ok(Message::assistant(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use manus_core::MessageRole;

    #[test]
    fn endpoint_encodes_segments() {
        let base = Url::parse("http://localhost:8001").unwrap();
        let url = endpoint(&base, &["api", "agents", "my agent"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8001/api/agents/my%20agent");
    }

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let base = Url::parse("http://host/backend/").unwrap();
        let url = endpoint(&base, &["api", "flow", "f1", "status"]).unwrap();
        assert_eq!(url.path(), "/backend/api/flow/f1/status");
    }

    #[test]
    fn error_status_surfaces_server_message() {
        let err = decode_body(500, false, r#"{"status":"error","message":"boom"}"#).unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn error_status_without_message_uses_fallback() {
        let err = decode_body(502, false, "<html>bad gateway</html>").unwrap_err();
        assert_eq!(err.to_string(), FALLBACK_ERROR);
    }

    #[test]
    fn validation_detail_is_surfaced() {
        let err = decode_body(422, false, r#"{"detail":"name missing"}"#).unwrap_err();
        assert_eq!(err.to_string(), "name missing");
    }

    #[test]
    fn error_envelope_under_success_status_fails() {
        let err = decode_body(200, true, r#"{"status":"error","message":"agent crashed"}"#)
            .unwrap_err();
        assert!(matches!(err, ApiClientError::Server { status: Some(200), .. }));
        assert_eq!(err.to_string(), "agent crashed");
    }

    #[test]
    fn success_envelope_is_unwrapped() {
        let value = decode_body(
            200,
            true,
            r#"{"status":"success","message":"ok","data":{"name":"a1","type":"swe","tools":[]}}"#,
        )
        .unwrap();
        let agent: AgentConfig = serde_json::from_value(value).unwrap();
        assert_eq!(agent.name, "a1");
    }

    #[test]
    fn bare_payload_passes_through() {
        let value = decode_body(200, true, r#"{"flowId":"f-1"}"#).unwrap();
        let created: CreateFlowResponse = serde_json::from_value(value).unwrap();
        assert_eq!(created.flow_id, "f-1");
    }

    #[test]
    fn execute_result_becomes_assistant_message() {
        let value = serde_json::json!({"status": "success", "result": "done"});
        let message = message_from_reply(value).unwrap();
        assert_eq!(message.role, MessageRole::Assistant);
        assert_eq!(message.content, "done");
    }

    #[test]
    fn execute_message_reply_is_decoded() {
        let value = serde_json::json!({"role": "assistant", "content": "hi"});
        assert_eq!(message_from_reply(value).unwrap().content, "hi");
    }
}
