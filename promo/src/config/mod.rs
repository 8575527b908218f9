use std::path::PathBuf;
use std::time::Duration;

use paapi::{Credentials, PaapiError};
use promo_auth::{Endpoints, OAuthSettings};
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Configuration {
    #[serde(default)]
    pub server: ServerConfiguration,
    #[serde(default)]
    pub x: XConfiguration,
    #[serde(default)]
    pub amazon: AmazonConfiguration,
    #[serde(default)]
    pub azure_openai: AzureOpenAiConfiguration,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfiguration {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_session_ttl")]
    pub session_ttl_seconds: u64,

    #[serde(default = "default_token_file")]
    pub token_file: PathBuf,

    /// Also write logs to timestamped files in this directory.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

impl Default for ServerConfiguration {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            session_ttl_seconds: default_session_ttl(),
            token_file: default_token_file(),
            log_dir: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct XConfiguration {
    pub client_id: Option<String>,
    #[serde(default, deserialize_with = "optional_secret")]
    pub client_secret: Option<SecretString>,
    pub callback_url: Option<String>,

    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,

    #[serde(default = "default_x_auth_url")]
    pub auth_url: String,

    #[serde(default = "default_x_api_base")]
    pub api_base: String,
}

impl Default for XConfiguration {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            callback_url: None,
            scopes: default_scopes(),
            auth_url: default_x_auth_url(),
            api_base: default_x_api_base(),
        }
    }
}

impl XConfiguration {
    pub fn endpoints(&self) -> Endpoints {
        Endpoints::new(self.auth_url.clone(), &self.api_base)
    }

    /// `None` until client id, client secret and callback URL are all set.
    pub fn oauth_settings(&self) -> Option<OAuthSettings> {
        use secrecy::ExposeSecret;

        let client_id = self.client_id.clone().filter(|v| !v.trim().is_empty())?;
        let client_secret = self
            .client_secret
            .clone()
            .filter(|v| !v.expose_secret().trim().is_empty())?;
        let callback_url = self.callback_url.clone().filter(|v| !v.trim().is_empty())?;

        Some(
            OAuthSettings::new(client_id, client_secret, callback_url)
                .with_scopes(self.scopes.clone())
                .with_endpoints(self.endpoints()),
        )
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AmazonConfiguration {
    pub access_key: Option<String>,
    #[serde(default, deserialize_with = "optional_secret")]
    pub secret_key: Option<SecretString>,
    pub partner_tag: Option<String>,

    #[serde(default = "default_region")]
    pub region: String,

    #[serde(default = "default_amazon_host")]
    pub host: String,

    #[serde(default = "default_marketplace")]
    pub marketplace: String,

    /// Send requests here instead of `https://{host}`.
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Default for AmazonConfiguration {
    fn default() -> Self {
        Self {
            access_key: None,
            secret_key: None,
            partner_tag: None,
            region: default_region(),
            host: default_amazon_host(),
            marketplace: default_marketplace(),
            base_url: None,
        }
    }
}

impl AmazonConfiguration {
    pub fn client(&self) -> Result<paapi::Client, PaapiError> {
        let credentials = Credentials::new(
            self.access_key.clone(),
            self.secret_key.clone(),
            self.partner_tag.clone(),
        )?;

        let client = paapi::Client::new(credentials)?
            .region(self.region.clone())
            .host(self.host.clone())
            .marketplace(self.marketplace.clone());

        Ok(match &self.base_url {
            Some(base_url) => client.base_url(base_url.clone()),
            None => client,
        })
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AzureOpenAiConfiguration {
    #[serde(default = "default_azure_endpoint")]
    pub endpoint: String,

    #[serde(default, deserialize_with = "optional_secret")]
    pub api_key: Option<SecretString>,

    #[serde(default = "default_deployment")]
    pub deployment: String,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Base unit of the exponential backoff between generation attempts.
    #[serde(default = "default_retry_base_ms")]
    pub retry_base_ms: u64,
}

impl Default for AzureOpenAiConfiguration {
    fn default() -> Self {
        Self {
            endpoint: default_azure_endpoint(),
            api_key: None,
            deployment: default_deployment(),
            api_version: default_api_version(),
            retry_base_ms: default_retry_base_ms(),
        }
    }
}

impl AzureOpenAiConfiguration {
    pub fn retry_base(&self) -> Duration {
        Duration::from_millis(self.retry_base_ms)
    }
}

fn optional_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(SecretString::from))
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_session_ttl() -> u64 {
    600
}

fn default_token_file() -> PathBuf {
    PathBuf::from("users.json")
}

fn default_scopes() -> Vec<String> {
    promo_auth::config::DEFAULT_SCOPES
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_x_auth_url() -> String {
    promo_auth::config::X_AUTH_URL.to_string()
}

fn default_x_api_base() -> String {
    promo_auth::config::X_API_BASE.to_string()
}

fn default_region() -> String {
    paapi::DEFAULT_REGION.to_string()
}

fn default_amazon_host() -> String {
    paapi::DEFAULT_HOST.to_string()
}

fn default_marketplace() -> String {
    paapi::DEFAULT_MARKETPLACE.to_string()
}

fn default_azure_endpoint() -> String {
    "https://ai-services-az-1.openai.azure.com/".to_string()
}

fn default_deployment() -> String {
    "gpt-4.1".to_string()
}

fn default_api_version() -> String {
    "2024-12-01-preview".to_string()
}

fn default_retry_base_ms() -> u64 {
    1000
}

impl Configuration {
    pub fn new() -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        if std::path::Path::new("config.toml").exists() {
            builder = builder.add_source(config::File::with_name("config"));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("PROMO")
                .prefix_separator("_")
                .separator("__"),
        );

        builder.build()?.try_deserialize()
    }

    pub fn from_toml(toml: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}
