//! Promotional copy generation: a structured-output chat completion,
//! validated and normalized, retried a bounded number of times and replaced
//! by canned copy when every attempt fails.

mod azure;
mod content;
pub mod prompt;
mod retry;

pub use azure::{AzureOpenAiClient, GenerationError};
pub use content::{TweetContent, FALLBACK_DESCRIPTION, FALLBACK_HASHTAGS};
pub use retry::RetryPolicy;

use secrecy::ExposeSecret;

use crate::config::AzureOpenAiConfiguration;

pub struct ContentGenerator {
    client: AzureOpenAiClient,
    retry: RetryPolicy,
}

impl ContentGenerator {
    pub fn new(client: AzureOpenAiClient, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    /// `Ok(None)` when no API key is configured.
    pub fn from_configuration(
        configuration: &AzureOpenAiConfiguration,
    ) -> Result<Option<Self>, GenerationError> {
        let Some(api_key) = configuration
            .api_key
            .clone()
            .filter(|k| !k.expose_secret().trim().is_empty())
        else {
            return Ok(None);
        };

        let client = AzureOpenAiClient::new(
            &configuration.endpoint,
            &configuration.deployment,
            &configuration.api_version,
            api_key,
        )?;
        let retry = RetryPolicy {
            base: configuration.retry_base(),
            ..RetryPolicy::default()
        };

        tracing::info!(
            deployment = %configuration.deployment,
            "Content generator initialized"
        );

        Ok(Some(Self::new(client, retry)))
    }

    /// Never fails: after the last unsuccessful attempt the canned fallback is
    /// returned.
    pub async fn generate(&self, title: &str, features: &[String]) -> TweetContent {
        let user_prompt = prompt::user_prompt(title, features);

        let result = self
            .retry
            .execute(|attempt| {
                let user_prompt = &user_prompt;
                async move {
                    tracing::debug!(attempt, "Requesting post content");
                    let raw = self.client.complete(prompt::SYSTEM_PROMPT, user_prompt).await?;
                    TweetContent::from_completion(&raw)
                }
            })
            .await;

        match result {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(error = %e, "Content generation exhausted, using fallback");
                TweetContent::fallback()
            }
        }
    }
}
