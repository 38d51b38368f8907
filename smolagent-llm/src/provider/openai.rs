//! OpenAI-compatible provider implementation
//!
//! Works with OpenRouter (the default), OpenAI, vLLM, Ollama and any other
//! server exposing `POST {base_url}/chat/completions`.

use super::*;
use reqwest::header::RETRY_AFTER;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// OpenAI-compatible provider
pub struct OpenAIProvider {
    client: Client,
    config: ProviderConfig,
}

impl OpenAIProvider {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let has_key = config
            .api_key
            .as_deref()
            .map(|key| !key.trim().is_empty())
            .unwrap_or(false);
        if config.provider_type.requires_api_key() && !has_key {
            return Err(ProviderError::Config(format!(
                "{:?} requires an API key",
                config.provider_type
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.unwrap_or(120)))
            .build()
            .map_err(|e| ProviderError::Config(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// OpenRouter with its default free model
    pub fn openrouter(api_key: impl Into<String>) -> Result<Self, ProviderError> {
        Self::new(ProviderConfig::openrouter(api_key))
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn base_url(&self) -> &str {
        self.config
            .base_url
            .as_deref()
            .unwrap_or(OPENROUTER_BASE_URL)
            .trim_end_matches('/')
    }

    fn build_request<'a>(&'a self, request: &'a CompletionRequest) -> OpenAIRequest<'a> {
        OpenAIRequest {
            model: request.model.as_deref().unwrap_or(self.default_model()),
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stop: request.stop.as_deref(),
            extra: &request.extra,
        }
    }
}

impl LlmProvider for OpenAIProvider {
    fn name(&self) -> &str {
        match self.config.provider_type {
            ProviderType::OpenRouter => "openrouter",
            ProviderType::OpenAI => "openai",
            ProviderType::Local => "local",
        }
    }

    fn default_model(&self) -> &str {
        self.config
            .default_model
            .as_deref()
            .unwrap_or(OPENROUTER_DEFAULT_MODEL)
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let api_request = self.build_request(&request);
        let url = format!("{}/chat/completions", self.base_url());
        debug!(
            provider = self.name(),
            model = api_request.model,
            messages = request.messages.len(),
            "Sending completion request"
        );

        let mut req = self.client.post(&url).json(&api_request);

        if let Some(api_key) = &self.config.api_key {
            if !api_key.is_empty() {
                req = req.header("Authorization", format!("Bearer {}", api_key));
            }
        }

        for (key, value) in &self.config.headers {
            req = req.header(key, value);
        }

        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Network(format!("request to {} timed out", url))
            } else {
                ProviderError::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            let text = response.text().await.unwrap_or_default();

            return Err(match status {
                401 | 403 => ProviderError::AuthenticationFailed,
                429 => ProviderError::RateLimited { retry_after },
                _ => ProviderError::Api { status, message: text },
            });
        }

        let api_response: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        // OpenRouter reports upstream failures inside a 200 body
        if let Some(error) = api_response.error {
            return Err(ProviderError::Api {
                status: error.code.unwrap_or(status),
                message: error.message,
            });
        }

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Other("No choices in response".into()))?;

        let usage = api_response
            .usage
            .map(|u| Usage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();

        Ok(CompletionResponse {
            id: api_response.id,
            model: api_response.model,
            content: choice.message.content,
            finish_reason: FinishReason::parse(choice.finish_reason.as_deref()),
            usage,
        })
    }
}

// ============================================================================
// OpenAI API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a [String]>,
    #[serde(flatten)]
    extra: &'a serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    id: String,
    #[serde(default)]
    model: String,
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
    error: Option<OpenAIErrorBody>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    #[serde(default)]
    prompt_tokens: usize,
    #[serde(default)]
    completion_tokens: usize,
    #[serde(default)]
    total_tokens: usize,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorBody {
    code: Option<u16>,
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    fn http_response(status: &str, extra_headers: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n{}\r\n{}",
            status,
            body.len(),
            extra_headers,
            body
        )
    }

    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).into_owned();
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        line.to_ascii_lowercase()
                            .strip_prefix("content-length:")
                            .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                    })
                    .unwrap_or(0);
                if buf.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Serve one canned response on a loopback port, returning the raw request
    async fn serve_once(response: String) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            request
        });
        (format!("http://{}", addr), handle)
    }

    fn provider_for(base_url: &str) -> OpenAIProvider {
        let config = ProviderConfig::openrouter("sk-test")
            .with_base_url(base_url)
            .with_model("test-model")
            .with_timeout(5);
        OpenAIProvider::new(config).unwrap()
    }

    #[test]
    fn test_requires_api_key() {
        let err = OpenAIProvider::new(ProviderConfig::openrouter("  ")).err().unwrap();
        assert!(matches!(err, ProviderError::Config(_)));
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);

        let local = OpenAIProvider::new(ProviderConfig::local("http://localhost:8000/v1", "m"));
        assert!(local.is_ok());
    }

    #[test]
    fn test_request_body() {
        let provider = provider_for("http://localhost:1");
        let request = CompletionRequest::new(vec![
            ChatMessage::system("sys"),
            ChatMessage::user("Hello"),
        ])
        .with_temperature(0.5)
        .with_max_tokens(500)
        .with_extra("top_p", serde_json::json!(0.9));

        let body = serde_json::to_value(provider.build_request(&request)).unwrap();
        assert_eq!(body["model"], "test-model");
        assert_eq!(body["temperature"], 0.5);
        assert_eq!(body["max_tokens"], 500);
        assert_eq!(body["top_p"], 0.9);
        assert_eq!(body["messages"][1], serde_json::json!({"role": "user", "content": "Hello"}));
        assert!(body.get("stop").is_none());
    }

    #[test]
    fn test_request_model_override() {
        let provider = provider_for("http://localhost:1");
        let request = CompletionRequest::new(vec![]).with_model("other/model");
        let body = serde_json::to_value(provider.build_request(&request)).unwrap();
        assert_eq!(body["model"], "other/model");
        assert!(body.get("temperature").is_none());
    }

    #[tokio::test]
    async fn test_complete_success() {
        let body = r#"{"id":"gen-1","model":"test-model","choices":[{"message":{"role":"assistant","content":"{\"final_answer\": \"4\"}"},"finish_reason":"stop"}],"usage":{"prompt_tokens":12,"completion_tokens":5,"total_tokens":17}}"#;
        let (base_url, server) = serve_once(http_response("200 OK", "", body)).await;
        let provider = provider_for(&base_url);

        let response = provider
            .complete(CompletionRequest::new(vec![ChatMessage::user("2 + 2?")]))
            .await
            .unwrap();

        assert_eq!(response.id, "gen-1");
        assert_eq!(response.content.as_deref(), Some(r#"{"final_answer": "4"}"#));
        assert_eq!(response.finish_reason, FinishReason::Stop);
        assert_eq!(response.usage.total_tokens, 17);

        let raw = server.await.unwrap();
        assert!(raw.starts_with("POST /chat/completions"));
        assert!(raw.to_ascii_lowercase().contains("authorization: bearer sk-test"));
        assert!(raw.contains(r#""model":"test-model""#));
    }

    #[tokio::test]
    async fn test_generate_returns_content() {
        let body = r#"{"id":"gen-2","model":"m","choices":[{"message":{"content":"hi"},"finish_reason":"stop"}]}"#;
        let (base_url, _server) = serve_once(http_response("200 OK", "", body)).await;
        let provider = provider_for(&base_url);

        let text = provider.generate(vec![ChatMessage::user("hello")]).await.unwrap();
        assert_eq!(text, "hi");
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let (base_url, _server) =
            serve_once(http_response("500 Internal Server Error", "", "upstream exploded")).await;
        let provider = provider_for(&base_url);

        let err = provider.complete(CompletionRequest::default()).await.unwrap_err();
        match err {
            ProviderError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "upstream exploded");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_unauthorized() {
        let (base_url, _server) = serve_once(http_response("401 Unauthorized", "", "{}")).await;
        let provider = provider_for(&base_url);

        let err = provider.complete(CompletionRequest::default()).await.unwrap_err();
        assert!(matches!(err, ProviderError::AuthenticationFailed));
    }

    #[tokio::test]
    async fn test_rate_limited_with_retry_after() {
        let (base_url, _server) =
            serve_once(http_response("429 Too Many Requests", "Retry-After: 7\r\n", "{}")).await;
        let provider = provider_for(&base_url);

        let err = provider.complete(CompletionRequest::default()).await.unwrap_err();
        assert!(matches!(err, ProviderError::RateLimited { retry_after: Some(7) }));
    }

    #[tokio::test]
    async fn test_error_inside_success_body() {
        let body = r#"{"error":{"code":502,"message":"provider returned error"}}"#;
        let (base_url, _server) = serve_once(http_response("200 OK", "", body)).await;
        let provider = provider_for(&base_url);

        let err = provider.complete(CompletionRequest::default()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Api { status: 502, .. }));
    }

    #[tokio::test]
    async fn test_undecodable_body() {
        let (base_url, _server) = serve_once(http_response("200 OK", "", "<html>gateway</html>")).await;
        let provider = provider_for(&base_url);

        let err = provider.complete(CompletionRequest::default()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Parse(_)));
        assert_eq!(err.into_error().kind(), ErrorKind::ParseFailed);
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let provider = provider_for(&format!("http://{}", addr));
        let err = provider.complete(CompletionRequest::default()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Network(_)));
        assert_eq!(err.into_error().kind(), ErrorKind::NetworkFailed);
    }
}
