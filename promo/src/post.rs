use std::sync::Arc;

use crate::error::AppError;
use crate::generator::{ContentGenerator, TweetContent};

pub const BRAND_HASHTAG: &str = "#amazon";

/// Builds post text for a product from its catalog data and generated copy.
pub struct PostComposer {
    amazon: Option<paapi::Client>,
    generator: Option<Arc<ContentGenerator>>,
}

impl PostComposer {
    pub fn new(amazon: Option<paapi::Client>, generator: Option<Arc<ContentGenerator>>) -> Self {
        Self { amazon, generator }
    }

    #[tracing::instrument(skip(self))]
    pub async fn generate_post_text(&self, asin: &str) -> Result<String, AppError> {
        let asin = asin.trim();
        if asin.is_empty() {
            return Err(AppError::Data("ASIN is required".to_string()));
        }

        let amazon = self.amazon.as_ref().ok_or_else(|| {
            AppError::Configuration(
                "Missing Amazon PA-API configuration: access_key / secret_key / partner_tag"
                    .to_string(),
            )
        })?;

        let item = amazon.get_item(asin).await?;
        if item.title.is_empty() {
            return Err(AppError::Data(format!(
                "PA-API returned empty title for ASIN {asin}"
            )));
        }
        let affiliate_url = item.url.clone().unwrap_or_else(|| fallback_url(asin));

        let generator = self.generator.as_ref().ok_or_else(|| {
            AppError::Configuration("Missing Azure OpenAI configuration: api_key".to_string())
        })?;

        let content = generator.generate(&item.title, &item.features).await;
        tracing::info!(hashtags = ?content.hashtags, "Post text generated");

        Ok(compose_post_text(&content, &affiliate_url))
    }
}

pub fn fallback_url(asin: &str) -> String {
    format!("https://www.amazon.com/dp/{asin}")
}

/// `{description}\n{url}\n#amazon {h1} {h2}\n`
pub fn compose_post_text(content: &TweetContent, affiliate_url: &str) -> String {
    let [hashtag1, hashtag2] = &content.hashtags;
    format!(
        "{}\n{}\n{} {} {}\n",
        content.description, affiliate_url, BRAND_HASHTAG, hashtag1, hashtag2
    )
}
