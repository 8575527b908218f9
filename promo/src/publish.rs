use std::sync::Arc;

use chrono::Utc;
use promo_auth::{AuthError, CredentialStore, OAuthClient, TweetClient};

use crate::error::AppError;

/// Posts text as a linked account, refreshing its token first when needed.
pub struct Publisher {
    credentials: Arc<CredentialStore>,
    oauth: Option<Arc<OAuthClient>>,
    tweets: TweetClient,
}

impl Publisher {
    pub fn new(
        credentials: Arc<CredentialStore>,
        oauth: Option<Arc<OAuthClient>>,
        tweets: TweetClient,
    ) -> Self {
        Self {
            credentials,
            oauth,
            tweets,
        }
    }

    #[tracing::instrument(skip(self, text), fields(chars = text.chars().count()))]
    pub async fn post_tweet(&self, account_id: &str, text: &str) -> Result<(), AppError> {
        let record = self
            .credentials
            .get(account_id)
            .await
            .ok_or_else(|| AppError::Data("User not found".to_string()))?;

        let record = match &self.oauth {
            Some(oauth) => oauth
                .ensure_fresh(&self.credentials, account_id)
                .await
                .map_err(|e| AppError::Upstream(format!("Token refresh error: {e}")))?,
            None if record.is_fresh_at(Utc::now().timestamp()) => record,
            None => {
                return Err(AppError::Configuration(
                    "Token refresh error: X OAuth client is not configured".to_string(),
                ))
            }
        };

        match self.tweets.post(&record.access_token, text).await {
            Ok(_) => Ok(()),
            Err(AuthError::Upstream { status, body, .. }) => Err(AppError::Upstream(format!(
                "{} {}",
                status.as_u16(),
                body
            ))),
            Err(e) => Err(e.into()),
        }
    }
}
