pub mod handlers;
pub mod pages;
pub mod session_store;

pub use session_store::SessionStore;

use axum::{
    routing::{get, post},
    Router,
};
use promo_auth::{CredentialStore, OAuthClient, TweetClient};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::Configuration;
use crate::error::AppError;
use crate::generator::ContentGenerator;
use crate::post::PostComposer;
use crate::publish::Publisher;

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionStore>,
    pub credentials: Arc<CredentialStore>,
    pub oauth: Option<Arc<OAuthClient>>,
    pub publisher: Arc<Publisher>,
    pub composer: Arc<PostComposer>,
}

impl AppState {
    /// Wire every service from configuration. Integrations that are not
    /// configured are left out and reported when used.
    pub fn from_configuration(
        configuration: &Configuration,
        credentials: Arc<CredentialStore>,
    ) -> Result<Self, AppError> {
        let oauth = match configuration.x.oauth_settings() {
            Some(settings) => Some(Arc::new(OAuthClient::new(&settings)?)),
            None => {
                tracing::warn!("X OAuth is not configured; /login is disabled");
                None
            }
        };
        let tweets = TweetClient::new(&configuration.x.endpoints())?;

        let amazon = match configuration.amazon.client() {
            Ok(client) => Some(client),
            Err(e) if e.is_configuration() => {
                tracing::warn!(error = %e, "PA-API is not configured");
                None
            }
            Err(e) => return Err(e.into()),
        };

        let generator = ContentGenerator::from_configuration(&configuration.azure_openai)
            .map_err(|e| AppError::Configuration(e.to_string()))?
            .map(Arc::new);
        if generator.is_none() {
            tracing::warn!("Azure OpenAI is not configured; post generation is disabled");
        }

        Ok(Self {
            sessions: Arc::new(SessionStore::new(configuration.server.session_ttl_seconds)),
            credentials: credentials.clone(),
            publisher: Arc::new(Publisher::new(credentials, oauth.clone(), tweets)),
            oauth,
            composer: Arc::new(PostComposer::new(amazon, generator)),
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index).post(handlers::submit_post))
        .route("/login", get(handlers::login))
        .route("/callback", get(handlers::oauth_callback))
        .route("/generate_tweet", post(handlers::generate_tweet))
        .route("/health", get(handlers::health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
