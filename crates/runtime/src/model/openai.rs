//! OpenAI-compatible chat completions backend.

use crate::model::{
    Backend, Choice, Completion, CompletionRequest, Message, ModelError, Role, ToolInvocation,
    ToolSpec, Usage,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

// ─────────────────────────────────────────────────────────────────────────────
// API Wire Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ApiTool<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<ApiToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct ApiTool<'a> {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: ApiFunctionDef<'a>,
}

#[derive(Debug, Serialize)]
struct ApiFunctionDef<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    call_type: String,
    function: ApiFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    choices: Vec<ApiChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ApiResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ApiToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

// ─────────────────────────────────────────────────────────────────────────────
// Backend Implementation
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for creating an OpenAI-compatible backend.
#[derive(Debug, Clone)]
pub struct OpenAiBackendBuilder {
    api_key: String,
    model: String,
    api_base: String,
    max_tokens: Option<u32>,
    request_timeout: Duration,
}

impl OpenAiBackendBuilder {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            max_tokens: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Base URL of the API, e.g. `https://api.openai.com/v1`.
    pub fn api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn build(self) -> Result<OpenAiBackend, ModelError> {
        let client = reqwest::Client::builder()
            .timeout(self.request_timeout)
            .build()
            .map_err(|e| ModelError::Client(e.to_string()))?;

        Ok(OpenAiBackend {
            client,
            api_key: self.api_key,
            model: self.model,
            api_base: self.api_base,
            max_tokens: self.max_tokens,
        })
    }
}

/// Backend for any endpoint speaking the OpenAI chat completions protocol.
pub struct OpenAiBackend {
    client: reqwest::Client,
    api_key: String,
    model: String,
    api_base: String,
    max_tokens: Option<u32>,
}

impl OpenAiBackend {
    pub fn builder(api_key: impl Into<String>, model: impl Into<String>) -> OpenAiBackendBuilder {
        OpenAiBackendBuilder::new(api_key, model)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }

    fn role_to_api(role: Role) -> &'static str {
        match role {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }

    fn message_to_api(msg: &Message) -> ApiMessage<'_> {
        let tool_calls: Vec<ApiToolCall> = msg
            .tool_calls
            .iter()
            .map(|call| ApiToolCall {
                id: call.id.clone(),
                call_type: function_type(),
                function: ApiFunctionCall {
                    name: call.name.clone(),
                    arguments: call.arguments.clone(),
                },
            })
            .collect();

        // Declarations carry no text; some endpoints reject an empty string there.
        let content = if msg.content.is_empty() && !tool_calls.is_empty() {
            None
        } else {
            Some(msg.content.as_str())
        };

        ApiMessage {
            role: Self::role_to_api(msg.role),
            content,
            tool_calls,
            tool_call_id: msg.tool_call_id.as_deref(),
        }
    }

    fn tool_to_api(spec: &ToolSpec) -> ApiTool<'_> {
        ApiTool {
            tool_type: "function",
            function: ApiFunctionDef {
                name: &spec.name,
                description: &spec.description,
                parameters: &spec.parameters,
            },
        }
    }

    fn response_to_completion(response: ApiResponse) -> Completion {
        let choices = response
            .choices
            .into_iter()
            .map(|choice| Choice {
                content: choice.message.content.unwrap_or_default(),
                tool_calls: choice
                    .message
                    .tool_calls
                    .unwrap_or_default()
                    .into_iter()
                    .map(|call| ToolInvocation {
                        id: call.id,
                        name: call.function.name,
                        arguments: call.function.arguments,
                    })
                    .collect(),
            })
            .collect();

        let usage = response
            .usage
            .map(|u| Usage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        Completion { choices, usage }
    }
}

impl std::fmt::Display for OpenAiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "openai({}, {})", self.model, self.api_base)
    }
}

impl Backend for OpenAiBackend {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<Completion, ModelError> {
        let api_request = ApiRequest {
            model: &self.model,
            messages: request.messages.iter().map(Self::message_to_api).collect(),
            tools: request
                .tools
                .unwrap_or_default()
                .iter()
                .map(Self::tool_to_api)
                .collect(),
            max_tokens: self.max_tokens,
        };

        debug!(
            model = %self.model,
            messages = api_request.messages.len(),
            tools = api_request.tools.len(),
            "sending completion request"
        );

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&api_request)
            .send()
            .await
            .map_err(|e| ModelError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Api(format!("{status}: {body}")));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| ModelError::InvalidResponse(e.to_string()))?;

        let completion = Self::response_to_completion(api_response);
        debug!(
            choices = completion.choices.len(),
            input_tokens = completion.usage.input_tokens,
            output_tokens = completion.usage.output_tokens,
            "completion received"
        );

        Ok(completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend(server: &MockServer) -> OpenAiBackend {
        OpenAiBackend::builder("test-key", "gpt-4o-mini")
            .api_base(server.uri())
            .build()
            .unwrap()
    }

    fn add_spec() -> ToolSpec {
        ToolSpec {
            name: "add".into(),
            description: "Add two numbers".into(),
            parameters: json!({"type": "object", "properties": {"a": {"type": "number"}}}),
        }
    }

    #[test]
    fn completions_url_trims_trailing_slash() {
        let backend = OpenAiBackend::builder("k", "m")
            .api_base("https://example.com/v1/")
            .build()
            .unwrap();
        assert_eq!(
            backend.completions_url(),
            "https://example.com/v1/chat/completions"
        );
    }

    #[test]
    fn declaration_omits_empty_content() {
        let msg = Message::tool_calls(vec![ToolInvocation::new("call_1", "add", "{}")]);
        let wire = serde_json::to_value(OpenAiBackend::message_to_api(&msg)).unwrap();
        assert_eq!(
            wire,
            json!({
                "role": "assistant",
                "tool_calls": [{
                    "id": "call_1",
                    "type": "function",
                    "function": {"name": "add", "arguments": "{}"}
                }]
            })
        );
    }

    #[test]
    fn tool_result_carries_correlation_id() {
        let msg = Message::tool_result("call_1", "5");
        let wire = serde_json::to_value(OpenAiBackend::message_to_api(&msg)).unwrap();
        assert_eq!(
            wire,
            json!({"role": "tool", "content": "5", "tool_call_id": "call_1"})
        );
    }

    #[tokio::test]
    async fn text_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": "gpt-4o-mini",
                "messages": [{"role": "user", "content": "hi"}],
                "tools": [{"type": "function", "function": {"name": "add"}}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "hello"}}],
                "usage": {"prompt_tokens": 7, "completion_tokens": 2}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let messages = [Message::user("hi")];
        let tools = [add_spec()];
        let completion = backend(&server)
            .complete(CompletionRequest {
                messages: &messages,
                tools: Some(&tools),
            })
            .await
            .unwrap();

        assert_eq!(completion.choices, vec![Choice::text("hello")]);
        assert_eq!(
            completion.usage,
            Usage {
                input_tokens: 7,
                output_tokens: 2
            }
        );
    }

    #[tokio::test]
    async fn tool_call_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{
                    "message": {
                        "content": null,
                        "tool_calls": [{
                            "id": "call_abc",
                            "type": "function",
                            "function": {"name": "add", "arguments": "{\"a\":2,\"b\":3}"}
                        }]
                    },
                    "finish_reason": "tool_calls"
                }]
            })))
            .mount(&server)
            .await;

        let messages = [Message::user("what is 2+3?")];
        let completion = backend(&server)
            .complete(CompletionRequest {
                messages: &messages,
                tools: None,
            })
            .await
            .unwrap();

        assert_eq!(completion.choices.len(), 1);
        let choice = &completion.choices[0];
        assert!(choice.content.is_empty());
        assert_eq!(
            choice.tool_calls,
            vec![ToolInvocation::new("call_abc", "add", "{\"a\":2,\"b\":3}")]
        );
        assert_eq!(completion.usage, Usage::default());
    }

    #[tokio::test]
    async fn tools_are_omitted_when_not_supplied() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "5"}}]
            })))
            .mount(&server)
            .await;

        let messages = [Message::user("what is 2+3?")];
        backend(&server)
            .complete(CompletionRequest {
                messages: &messages,
                tools: None,
            })
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert!(body.get("tools").is_none());
        assert!(body.get("max_tokens").is_none());
    }

    #[tokio::test]
    async fn api_error_is_reported_with_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let messages = [Message::user("hi")];
        let err = backend(&server)
            .complete(CompletionRequest {
                messages: &messages,
                tools: None,
            })
            .await
            .unwrap_err();

        match err {
            ModelError::Api(msg) => {
                assert!(msg.contains("429"));
                assert!(msg.contains("slow down"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unparsable_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let messages = [Message::user("hi")];
        let err = backend(&server)
            .complete(CompletionRequest {
                messages: &messages,
                tools: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ModelError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_network_error() {
        let backend = OpenAiBackend::builder("k", "m")
            .api_base("http://127.0.0.1:1")
            .build()
            .unwrap();

        let messages = [Message::user("hi")];
        let err = backend
            .complete(CompletionRequest {
                messages: &messages,
                tools: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ModelError::Network(_)));
    }
}
