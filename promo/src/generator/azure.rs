use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use super::prompt;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const TEMPERATURE: f32 = 0.7;
const TOP_P: f32 = 0.9;
const MAX_COMPLETION_TOKENS: u32 = 250;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Azure OpenAI error {status}: {body}")]
    Api { status: StatusCode, body: String },

    #[error("Empty completion")]
    EmptyCompletion,

    #[error("Malformed completion: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Incomplete AI response")]
    Incomplete,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    messages: [ChatMessage<'a>; 2],
    response_format: Value,
    temperature: f32,
    top_p: f32,
    max_completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions client for one Azure OpenAI deployment.
pub struct AzureOpenAiClient {
    http: reqwest::Client,
    url: String,
    api_key: SecretString,
}

impl AzureOpenAiClient {
    pub fn new(
        endpoint: &str,
        deployment: &str,
        api_version: &str,
        api_key: SecretString,
    ) -> Result<Self, GenerationError> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let url = format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            endpoint.trim_end_matches('/'),
            deployment,
            api_version
        );

        Ok(Self { http, url, api_key })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Request a completion constrained to the post-content schema and
    /// return the raw message content.
    pub async fn complete(&self, system: &str, user: &str) -> Result<String, GenerationError> {
        let request = ChatCompletionRequest {
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            response_format: serde_json::json!({
                "type": "json_schema",
                "json_schema": {
                    "name": prompt::SCHEMA_NAME,
                    "strict": true,
                    "schema": prompt::response_schema(),
                }
            }),
            temperature: TEMPERATURE,
            top_p: TOP_P,
            max_completion_tokens: MAX_COMPLETION_TOKENS,
        };

        let response = self
            .http
            .post(&self.url)
            .header("api-key", self.api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(GenerationError::Api { status, body });
        }

        let completion: ChatCompletionResponse = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(GenerationError::EmptyCompletion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_targets_deployment_and_version() {
        let client = AzureOpenAiClient::new(
            "https://ai-services-az-1.openai.azure.com/",
            "gpt-4.1",
            "2024-12-01-preview",
            SecretString::from("key".to_string()),
        )
        .unwrap();

        assert_eq!(
            client.url(),
            "https://ai-services-az-1.openai.azure.com/openai/deployments/gpt-4.1/chat/completions?api-version=2024-12-01-preview"
        );
    }
}
