use crate::controller::Generator;
use crate::error::{Result, SmartCommitError};
use crate::prompt::SYSTEM_PROMPT;
use crate::provider::Provider;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

const REQUEST_TIMEOUT_SECS: u64 = 30;
const MAX_OUTPUT_TOKENS: u32 = 500;
const TEMPERATURE: f32 = 0.7;

/// One generation attempt. Rebuilt for every regeneration.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub provider: Provider,
    pub model: String,
    pub api_key: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

pub struct GenerationClient {
    agent: ureq::Agent,
    provider: Provider,
    model: String,
    api_key: String,
    endpoint: String,
}

impl GenerationClient {
    pub fn new(provider: Provider, model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            agent: http_agent(Duration::from_secs(REQUEST_TIMEOUT_SECS)),
            provider,
            model: model.into(),
            api_key: api_key.into(),
            endpoint: provider.endpoint().to_string(),
        }
    }

    pub fn request(&self, prompt: &str) -> GenerationRequest {
        GenerationRequest {
            prompt: prompt.to_string(),
            provider: self.provider,
            model: self.model.clone(),
            api_key: self.api_key.clone(),
        }
    }

    pub fn send(&self, request: &GenerationRequest) -> Result<String> {
        if request.api_key.trim().is_empty() {
            return Err(SmartCommitError::MissingCredential {
                provider: request.provider,
            });
        }

        let model = request.provider.resolve_model(&request.model);
        if model != request.model.trim() {
            info!(
                requested = %request.model,
                resolved = %model,
                "model identifier is deprecated, using its replacement"
            );
        }

        let chat = ChatRequest {
            model,
            messages: vec![
                Message {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                Message {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_OUTPUT_TOKENS,
        };
        let body = serde_json::to_string(&chat)
            .map_err(|e| SmartCommitError::MalformedResponse(format!("Request encoding: {}", e)))?;

        debug!(
            provider = %request.provider,
            endpoint = %self.endpoint,
            model = %model,
            prompt_chars = request.prompt.len(),
            "sending completion request"
        );

        let response = self
            .agent
            .post(&self.endpoint)
            .header("Authorization", &format!("Bearer {}", request.api_key.trim()))
            .header("Content-Type", "application/json")
            .send(&body)
            .map_err(handle_ureq_error)?;

        let status = response.status().as_u16();
        let text = response
            .into_body()
            .read_to_string()
            .map_err(handle_ureq_error)?;

        if !(200..300).contains(&status) {
            return Err(status_error(status, &text));
        }

        extract_content(&text)
    }
}

impl Generator for GenerationClient {
    fn generate(&self, prompt: &str) -> Result<String> {
        self.send(&self.request(prompt))
    }
}

fn http_agent(timeout: Duration) -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .new_agent()
}

fn handle_ureq_error(e: ureq::Error) -> SmartCommitError {
    match e {
        ureq::Error::StatusCode(status) => status_error(status, ""),
        other => SmartCommitError::NetworkError(other.to_string()),
    }
}

fn status_error(status: u16, body: &str) -> SmartCommitError {
    let message = api_error_message(body);
    match status {
        401 | 403 => SmartCommitError::AuthenticationFailed(
            message.unwrap_or_else(|| format!("provider rejected the API key (HTTP {status})")),
        ),
        429 => SmartCommitError::RateLimited(
            message.unwrap_or_else(|| "too many requests, try again later".to_string()),
        ),
        _ => SmartCommitError::ProviderError {
            status,
            message: message.unwrap_or_else(|| "request failed".to_string()),
        },
    }
}

fn api_error_message(body: &str) -> Option<String> {
    if let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(body) {
        return Some(parsed.error.message);
    }
    let trimmed = body.trim();
    (!trimmed.is_empty()).then(|| trimmed.chars().take(300).collect())
}

fn extract_content(body: &str) -> Result<String> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| SmartCommitError::MalformedResponse(format!("undecodable body: {}", e)))?;

    let content = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|c| c.trim().to_string())
        .unwrap_or_default();

    if content.is_empty() {
        return Err(SmartCommitError::MalformedResponse(
            "provider returned an empty completion".to_string(),
        ));
    }
    Ok(content)
}

#[cfg(test)]
impl GenerationClient {
    fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = http_agent(timeout);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{GenerationClient, extract_content};
    use crate::error::SmartCommitError;
    use crate::provider::Provider;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const COMPLETIONS: &str = "/v1/chat/completions";

    fn completion(content: &str) -> serde_json::Value {
        json!({
            "id": "chatcmpl-1",
            "choices": [
                { "index": 0, "message": { "role": "assistant", "content": content } }
            ]
        })
    }

    async fn send(client: GenerationClient, prompt: &str) -> Result<String, SmartCommitError> {
        let request = client.request(prompt);
        tokio::task::spawn_blocking(move || client.send(&request))
            .await
            .expect("blocking task panicked")
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn sends_prompt_and_returns_trimmed_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(COMPLETIONS))
            .and(header("authorization", "Bearer gsk-test"))
            .and(body_partial_json(json!({
                "model": "llama-3.1-8b-instant",
                "max_tokens": 500
            })))
            .and(body_string_contains("describe my diff"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion("\n feat: add login endpoint\n\nAdds POST /login.\n")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = GenerationClient::new(Provider::Groq, "llama-3.1-8b-instant", "gsk-test")
            .with_endpoint(format!("{}{}", server.uri(), COMPLETIONS));
        let raw = send(client, "describe my diff").await.expect("completion");
        assert_eq!(raw, "feat: add login endpoint\n\nAdds POST /login.");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn deprecated_model_is_remapped_before_dispatch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "model": "llama-3.3-70b-versatile" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("fix: x")))
            .expect(1)
            .mount(&server)
            .await;

        let client = GenerationClient::new(Provider::Groq, "llama3-70b-8192", "gsk-test")
            .with_endpoint(format!("{}{}", server.uri(), COMPLETIONS));
        assert_eq!(send(client, "p").await.expect("completion"), "fix: x");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn maps_http_statuses_to_error_kinds() {
        let cases = [
            (401, "AuthenticationFailed"),
            (403, "AuthenticationFailed"),
            (429, "RateLimited"),
            (500, "ProviderError"),
        ];
        for (status, expected) in cases {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                    "error": { "message": format!("status {status} detail"), "type": "x" }
                })))
                .mount(&server)
                .await;

            let client = GenerationClient::new(Provider::OpenAi, "gpt-4o", "sk-test")
                .with_endpoint(format!("{}{}", server.uri(), COMPLETIONS));
            let err = send(client, "p").await.unwrap_err();
            let kind = match &err {
                SmartCommitError::AuthenticationFailed(_) => "AuthenticationFailed",
                SmartCommitError::RateLimited(_) => "RateLimited",
                SmartCommitError::ProviderError { status: 500, .. } => "ProviderError",
                other => panic!("unexpected error {other:?}"),
            };
            assert_eq!(kind, expected);
            assert!(err.to_string().contains(&format!("status {status} detail")));
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn non_json_error_body_is_reported_raw() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let client = GenerationClient::new(Provider::Groq, "m", "k")
            .with_endpoint(format!("{}{}", server.uri(), COMPLETIONS));
        match send(client, "p").await.unwrap_err() {
            SmartCommitError::ProviderError { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "bad gateway");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn timeout_surfaces_as_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion("feat: late"))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let client = GenerationClient::new(Provider::Groq, "m", "k")
            .with_endpoint(format!("{}{}", server.uri(), COMPLETIONS))
            .with_timeout(Duration::from_millis(300));
        let err = send(client, "p").await.unwrap_err();
        assert!(matches!(err, SmartCommitError::NetworkError(_)), "{err:?}");
    }

    #[test]
    fn empty_key_is_a_missing_credential() {
        let client = GenerationClient::new(Provider::OpenAi, "gpt-4o", "   ");
        let err = client.send(&client.request("p")).unwrap_err();
        assert!(matches!(
            err,
            SmartCommitError::MissingCredential {
                provider: Provider::OpenAi
            }
        ));
    }

    #[test]
    fn empty_or_missing_content_is_malformed() {
        for body in [
            r#"{"choices": []}"#,
            r#"{"choices": [{"message": {"role": "assistant", "content": "  "}}]}"#,
            r#"{"choices": [{"message": {"role": "assistant", "content": null}}]}"#,
            "not json",
        ] {
            let err = extract_content(body).unwrap_err();
            assert!(matches!(err, SmartCommitError::MalformedResponse(_)), "{body}");
        }
    }
}
