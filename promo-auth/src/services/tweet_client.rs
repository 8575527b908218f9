use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::Endpoints;
use crate::error::AuthError;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct CreateTweet<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreateTweetResponse {
    data: Option<PostedTweet>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PostedTweet {
    pub id: String,
    #[serde(default)]
    pub text: String,
}

/// Publishes posts on behalf of a linked account.
pub struct TweetClient {
    tweets_url: String,
    http: reqwest::Client,
}

impl TweetClient {
    pub fn new(endpoints: &Endpoints) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self {
            tweets_url: endpoints.tweets_url.clone(),
            http,
        })
    }

    /// Post `text` as the owner of `access_token`. Both 200 and 201 count as
    /// success; the created post is returned when the body describes one.
    pub async fn post(
        &self,
        access_token: &str,
        text: &str,
    ) -> Result<Option<PostedTweet>, AuthError> {
        let response = self
            .http
            .post(&self.tweets_url)
            .bearer_auth(access_token)
            .json(&CreateTweet { text })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status != StatusCode::OK && status != StatusCode::CREATED {
            tracing::warn!(status = %status, "Post rejected");
            return Err(AuthError::Upstream {
                context: "Tweet",
                status,
                body,
            });
        }

        let posted = serde_json::from_str::<CreateTweetResponse>(&body)
            .ok()
            .and_then(|r| r.data);
        tracing::info!(tweet_id = ?posted.as_ref().map(|t| &t.id), "Post published");

        Ok(posted)
    }
}
