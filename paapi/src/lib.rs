pub mod endpoints;
mod error;
mod macros;
pub mod signer;

pub use crate::endpoints::get_items::{GetItems, ItemSummary};
pub use crate::error::PaapiError;
pub use crate::signer::{SignedHeaders, Signer};

use chrono::Utc;
use endpoints::Operation;
use macros::setter;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use secrecy::SecretString;
use std::time::Duration;

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_HOST: &str = "webservices.amazon.com";
pub const DEFAULT_MARKETPLACE: &str = "www.amazon.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Long-lived PA-API credentials. All three parts must be present.
pub struct Credentials {
    access_key: String,
    secret_key: SecretString,
    partner_tag: String,
}

impl Credentials {
    pub fn new(
        access_key: Option<String>,
        secret_key: Option<SecretString>,
        partner_tag: Option<String>,
    ) -> Result<Self, PaapiError> {
        use secrecy::ExposeSecret;

        let access_key = access_key
            .filter(|k| !k.trim().is_empty())
            .ok_or(PaapiError::MissingCredentials("access_key"))?;
        let secret_key = secret_key
            .filter(|k| !k.expose_secret().trim().is_empty())
            .ok_or(PaapiError::MissingCredentials("secret_key"))?;
        let partner_tag = partner_tag
            .filter(|t| !t.trim().is_empty())
            .ok_or(PaapiError::MissingCredentials("partner_tag"))?;

        Ok(Self {
            access_key,
            secret_key,
            partner_tag,
        })
    }
}

pub struct Client {
    http: reqwest::Client,
    credentials: Credentials,
    region: String,
    host: String,
    marketplace: String,
    base_url: Option<String>,
}

impl Client {
    pub fn new(credentials: Credentials) -> Result<Self, PaapiError> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            http,
            credentials,
            region: DEFAULT_REGION.to_string(),
            host: DEFAULT_HOST.to_string(),
            marketplace: DEFAULT_MARKETPLACE.to_string(),
            base_url: None,
        })
    }

    setter!(region: String);
    setter!(host: String);
    setter!(marketplace: String);
    // Send somewhere other than `https://{host}`; the signature still covers `host`.
    setter!(opt base_url: String);

    pub fn partner_tag(&self) -> &str {
        &self.credentials.partner_tag
    }

    pub fn signer(&self) -> Signer<'_> {
        Signer::new(
            &self.credentials.access_key,
            &self.credentials.secret_key,
            &self.region,
            &self.host,
        )
    }

    /// Sign and send one operation. Non-200 responses are returned as
    /// [`PaapiError::Api`] with the raw body; nothing is retried.
    pub async fn send<R>(&self, request: R) -> Result<R::Response, PaapiError>
    where
        R: Operation,
    {
        let payload = serde_json::to_string(&request)?;
        let signed = self.signer().sign(request.path(), &payload, Utc::now());

        let url = match &self.base_url {
            Some(base) => format!("{}{}", base.trim_end_matches('/'), request.path()),
            None => format!("https://{}{}", self.host, request.path()),
        };

        tracing::debug!(target_op = request.target(), %url, "Sending PA-API request");

        let response = self
            .http
            .post(&url)
            .header("content-encoding", signer::CONTENT_ENCODING)
            .header(CONTENT_TYPE, "application/json; charset=utf-8")
            .header("x-amz-date", &signed.amz_date)
            .header("x-amz-target", request.target())
            .header(AUTHORIZATION, &signed.authorization)
            .body(payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if status != StatusCode::OK {
            tracing::warn!(%status, "PA-API request failed");
            return Err(PaapiError::Api { status, body });
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// Look up title, features and affiliate URL for one ASIN.
    pub async fn get_item(&self, asin: &str) -> Result<ItemSummary, PaapiError> {
        let asin = asin.trim();
        if asin.is_empty() {
            return Err(PaapiError::EmptyItemId);
        }

        let request = GetItems::new(asin, self.partner_tag()).marketplace(self.marketplace.clone());
        let item = self
            .send(request)
            .await?
            .into_first_item()
            .ok_or_else(|| PaapiError::NoItems(asin.to_string()))?;

        Ok(ItemSummary::from_item(asin, item))
    }
}
