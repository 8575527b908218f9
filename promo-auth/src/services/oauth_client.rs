use chrono::Utc;
use oauth2::{
    basic::{BasicClient, BasicErrorResponse},
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, HttpRequest, HttpResponse,
    PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, RefreshToken, RequestTokenError, Scope,
    TokenResponse, TokenUrl,
};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use crate::common::{
    CallbackParams, LinkedAccount, PendingAuthorization, TokenGrant, TokenRecord, UserIdentity,
};
use crate::config::OAuthSettings;
use crate::credential_store::CredentialStore;
use crate::error::AuthError;
use crate::pkce::PkcePair;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Transport failure, or a token endpoint answer other than 200.
#[derive(Debug, thiserror::Error)]
enum TokenHttpError {
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error("{status} {body}")]
    Status { status: StatusCode, body: String },
}

// Simple async HTTP client for OAuth2. Non-200 answers are returned as
// errors here so their status and body survive.
async fn http_client(request: HttpRequest) -> Result<HttpResponse, TokenHttpError> {
    let client = reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .redirect(reqwest::redirect::Policy::none())
        .build()?;
    let mut builder = client
        .request(request.method().clone(), request.uri().to_string())
        .body(request.body().clone());

    for (name, value) in request.headers() {
        builder = builder.header(name.as_str(), value.as_bytes());
    }

    let response = builder.send().await?;
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.bytes().await?.to_vec();

    if status != StatusCode::OK {
        return Err(TokenHttpError::Status {
            status,
            body: String::from_utf8_lossy(&body).into_owned(),
        });
    }

    let mut http_response = HttpResponse::new(body);
    *http_response.status_mut() = status;
    *http_response.headers_mut() = headers;

    Ok(http_response)
}

type TokenRequestError = RequestTokenError<TokenHttpError, BasicErrorResponse>;

#[derive(Debug, Deserialize)]
struct UsersMeResponse {
    data: UserIdentity,
}

pub struct OAuthClient {
    client_id: String,
    client_secret: SecretString,
    scopes: Vec<Scope>,
    auth_url: AuthUrl,
    token_url: TokenUrl,
    redirect_url: RedirectUrl,
    users_me_url: String,
    http: reqwest::Client,
}

impl OAuthClient {
    pub fn new(settings: &OAuthSettings) -> Result<Self, AuthError> {
        let auth_url = AuthUrl::new(settings.endpoints.auth_url.clone())
            .map_err(|e| AuthError::Configuration(format!("Invalid auth URL: {}", e)))?;

        let token_url = TokenUrl::new(settings.endpoints.token_url.clone())
            .map_err(|e| AuthError::Configuration(format!("Invalid token URL: {}", e)))?;

        let redirect_url = RedirectUrl::new(settings.redirect_uri.clone())
            .map_err(|e| AuthError::Configuration(format!("Invalid redirect URI: {}", e)))?;

        let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;

        Ok(Self {
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone(),
            scopes: settings.scopes.iter().cloned().map(Scope::new).collect(),
            auth_url,
            token_url,
            redirect_url,
            users_me_url: settings.endpoints.users_me_url.clone(),
            http,
        })
    }

    /// Build the authorization redirect for a new login attempt.
    ///
    /// The returned [`PendingAuthorization`] must be kept in the browser
    /// session until the callback arrives.
    pub fn begin_authorization(&self) -> (String, PendingAuthorization) {
        let pkce = PkcePair::generate();
        let state = pkce.state.clone();

        let (auth_url, _) = BasicClient::new(ClientId::new(self.client_id.clone()))
            .set_client_secret(ClientSecret::new(
                self.client_secret.expose_secret().to_string(),
            ))
            .set_auth_uri(self.auth_url.clone())
            .set_token_uri(self.token_url.clone())
            .set_redirect_uri(self.redirect_url.clone())
            .authorize_url(|| CsrfToken::new(state))
            .add_scopes(self.scopes.iter().cloned())
            .set_pkce_challenge(PkceCodeChallenge::from_code_verifier_sha256(
                &PkceCodeVerifier::new(pkce.verifier.clone()),
            ))
            .url();

        tracing::debug!("Authorization requested");

        (auth_url.to_string(), pkce.pending())
    }

    /// Check the callback against the pending authorization without touching
    /// the network. Returns the code and verifier to exchange.
    pub fn validate_callback(
        pending: Option<&PendingAuthorization>,
        params: &CallbackParams,
    ) -> Result<(String, String), AuthError> {
        if let Some(error) = params.error.as_deref().filter(|e| !e.is_empty()) {
            return Err(AuthError::Provider(error.to_string()));
        }

        let code = params
            .code
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or(AuthError::MissingCode)?;

        let expected = pending.map(|p| p.state.as_str());
        match (params.state.as_deref(), expected) {
            (Some(actual), Some(expected)) if !actual.is_empty() && actual == expected => {}
            _ => return Err(AuthError::StateMismatch),
        }

        let verifier = pending
            .map(|p| p.pkce_verifier.as_str())
            .filter(|v| !v.is_empty())
            .ok_or(AuthError::MissingVerifier)?;

        Ok((code.to_string(), verifier.to_string()))
    }

    /// Exchange authorization code for access and refresh tokens
    pub async fn exchange_code_for_token(
        &self,
        code: &str,
        verifier: &str,
    ) -> Result<TokenGrant, AuthError> {
        let token_result = BasicClient::new(ClientId::new(self.client_id.clone()))
            .set_client_secret(ClientSecret::new(
                self.client_secret.expose_secret().to_string(),
            ))
            .set_auth_uri(self.auth_url.clone())
            .set_token_uri(self.token_url.clone())
            .set_redirect_uri(self.redirect_url.clone())
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .set_pkce_verifier(PkceCodeVerifier::new(verifier.to_string()))
            .request_async(&http_client)
            .await
            .map_err(|e| token_error(e, AuthError::TokenExchange))?;

        let access_token = token_result.access_token().secret().to_string();
        if access_token.is_empty() {
            return Err(AuthError::MissingAccessToken);
        }

        let grant = TokenGrant {
            access_token,
            refresh_token: token_result.refresh_token().map(|t| t.secret().to_string()),
            expires_in: token_result.expires_in().map(|d| d.as_secs()),
        };

        tracing::debug!(
            expires_in = ?grant.expires_in,
            has_refresh_token = grant.refresh_token.is_some(),
            "Successfully exchanged code for tokens"
        );

        Ok(grant)
    }

    /// Refresh an expired access token using a refresh token
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenGrant, AuthError> {
        let token_result = BasicClient::new(ClientId::new(self.client_id.clone()))
            .set_client_secret(ClientSecret::new(
                self.client_secret.expose_secret().to_string(),
            ))
            .set_auth_uri(self.auth_url.clone())
            .set_token_uri(self.token_url.clone())
            .set_redirect_uri(self.redirect_url.clone())
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(&http_client)
            .await
            .map_err(|e| token_error(e, AuthError::RefreshFailed))?;

        let access_token = token_result.access_token().secret().to_string();
        if access_token.is_empty() {
            return Err(AuthError::RefreshFailed(
                "response missing access_token".to_string(),
            ));
        }

        tracing::debug!("Successfully refreshed tokens");

        Ok(TokenGrant {
            access_token,
            refresh_token: token_result.refresh_token().map(|t| t.secret().to_string()),
            expires_in: token_result.expires_in().map(|d| d.as_secs()),
        })
    }

    /// Fetch the identity that owns `access_token`.
    pub async fn fetch_identity(&self, access_token: &str) -> Result<UserIdentity, AuthError> {
        let response = self
            .http
            .get(&self.users_me_url)
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if status != StatusCode::OK {
            return Err(AuthError::Upstream {
                context: "User info",
                status,
                body,
            });
        }

        let me: UsersMeResponse = serde_json::from_str(&body)?;
        Ok(me.data)
    }

    /// Run the callback half of the flow: validate, exchange, identify and
    /// persist. Nothing is sent if validation fails.
    pub async fn complete_authorization(
        &self,
        store: &CredentialStore,
        pending: Option<PendingAuthorization>,
        params: &CallbackParams,
    ) -> Result<LinkedAccount, AuthError> {
        let (code, verifier) = Self::validate_callback(pending.as_ref(), params)?;

        let grant = self.exchange_code_for_token(&code, &verifier).await?;
        let identity = self.fetch_identity(&grant.access_token).await?;

        let record = TokenRecord {
            username: identity.display_name(),
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
            expires_in: grant.expires_in.unwrap_or(0),
            obtained_at: Utc::now().timestamp(),
        };
        store.upsert(&identity.id, record.clone()).await?;

        tracing::info!(
            account_id = %identity.id,
            username = %record.username,
            "Account linked"
        );

        Ok(LinkedAccount {
            account_id: identity.id,
            record,
        })
    }

    /// Return a usable record for `account_id`, refreshing and persisting it
    /// first when it is within the early-refresh window or has no known expiry.
    pub async fn ensure_fresh(
        &self,
        store: &CredentialStore,
        account_id: &str,
    ) -> Result<TokenRecord, AuthError> {
        let record = store
            .get(account_id)
            .await
            .ok_or_else(|| AuthError::UnknownAccount(account_id.to_string()))?;

        if record.is_fresh_at(Utc::now().timestamp()) {
            return Ok(record);
        }

        let refresh_token = record
            .refresh_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::NoRefreshToken)?;

        tracing::info!(account_id = %account_id, "Access token stale, refreshing");

        let grant = self.refresh_access_token(refresh_token).await?;
        let refreshed = store
            .update(account_id, |record| {
                record.apply_refresh(grant, Utc::now().timestamp())
            })
            .await?;

        tracing::info!(account_id = %account_id, "Token refresh successful");

        Ok(refreshed)
    }
}

fn token_error(err: TokenRequestError, wrap: fn(String) -> AuthError) -> AuthError {
    match err {
        RequestTokenError::Request(TokenHttpError::Status { status, body }) => {
            wrap(format!("{status} {body}"))
        }
        RequestTokenError::Request(TokenHttpError::Transport(e)) => AuthError::Http(e),
        RequestTokenError::ServerResponse(response) => {
            let body = serde_json::to_string(&response).unwrap_or_else(|_| response.to_string());
            wrap(body)
        }
        // Only successful answers reach the parser.
        RequestTokenError::Parse(_, body) => {
            let body = String::from_utf8_lossy(&body).into_owned();
            let has_access_token = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("access_token").cloned())
                .is_some();
            if has_access_token {
                wrap(format!("unexpected token response: {body}"))
            } else {
                AuthError::MissingAccessToken
            }
        }
        RequestTokenError::Other(message) => wrap(message),
    }
}
