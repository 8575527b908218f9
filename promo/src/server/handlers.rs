use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue},
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use promo_auth::CallbackParams;
use serde::{Deserialize, Serialize};

use super::{
    pages,
    session_store::{Flash, SESSION_COOKIE},
    AppState,
};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct PostForm {
    pub account: Option<String>,
    pub text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub asin: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub ok: bool,
    pub post_text: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// The caller's browser session. The cookie is re-issued on every response
/// so its `Max-Age` slides along with the server-side expiry.
struct Session {
    id: String,
    set_cookie: Option<HeaderValue>,
}

impl Session {
    fn resolve(state: &AppState, headers: &HeaderMap) -> Self {
        let (id, _) = state.sessions.resolve(session_cookie(headers).as_deref());
        let set_cookie = HeaderValue::from_str(&format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            SESSION_COOKIE,
            id,
            state.sessions.ttl().as_secs()
        ))
        .ok();
        Self { id, set_cookie }
    }

    fn respond(self, response: impl IntoResponse) -> Response {
        let mut response = response.into_response();
        if let Some(cookie) = self.set_cookie {
            response.headers_mut().insert(header::SET_COOKIE, cookie);
        }
        response
    }
}

fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}

async fn render_index(state: &AppState, session: Session) -> Response {
    let accounts = state.credentials.accounts().await;
    let flashes = state.sessions.drain_flashes(&session.id);
    session.respond(Html(pages::index_page(&accounts, &flashes)))
}

pub async fn index(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let session = Session::resolve(&state, &headers);
    render_index(&state, session).await
}

#[tracing::instrument(skip_all)]
pub async fn submit_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<PostForm>,
) -> Response {
    let session = Session::resolve(&state, &headers);

    let account = form.account.as_deref().filter(|a| !a.is_empty());
    let text = form.text.as_deref().map(str::trim).unwrap_or("");

    let flash = match account {
        Some(account) if !text.is_empty() => {
            tracing::debug!(account = %account, "Posting");
            match state.publisher.post_tweet(account, text).await {
                Ok(()) => Flash::success("Tweet posted"),
                Err(e) => {
                    tracing::warn!(error = %e, "Post failed");
                    Flash::error(e.to_string())
                }
            }
        }
        _ => Flash::error("Please select account & enter text"),
    };
    state.sessions.flash(&session.id, flash);

    render_index(&state, session).await
}

#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let session = Session::resolve(&state, &headers);

    let Some(oauth) = state.oauth.as_ref() else {
        state.sessions.flash(
            &session.id,
            Flash::error("Missing X configuration: client_id / client_secret / callback_url"),
        );
        return session.respond(Redirect::to("/"));
    };

    let (authorization_url, pending) = oauth.begin_authorization();
    state.sessions.set_pending(&session.id, pending);

    tracing::info!(session_id = %session.id, "Redirecting to authorization");

    session.respond(Redirect::to(&authorization_url))
}

#[tracing::instrument(skip_all)]
pub async fn oauth_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<CallbackParams>,
) -> Response {
    let session = Session::resolve(&state, &headers);
    let pending = state.sessions.take_pending(&session.id);

    let flash = match state.oauth.as_ref() {
        None => Flash::error("Missing X configuration: client_id / client_secret / callback_url"),
        Some(oauth) => {
            match oauth
                .complete_authorization(&state.credentials, pending, &params)
                .await
            {
                Ok(linked) => Flash::success(format!("Account linked: {}", linked.record.username)),
                Err(e) => {
                    tracing::warn!(error = %e, "OAuth callback failed");
                    Flash::error(e.to_string())
                }
            }
        }
    };
    state.sessions.flash(&session.id, flash);

    session.respond(Redirect::to("/"))
}

// The body is parsed leniently: anything that is not `{"asin": "..."}` is
// treated as a missing ASIN.
#[tracing::instrument(skip_all)]
pub async fn generate_tweet(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<GenerateResponse>, AppError> {
    let request: GenerateRequest = serde_json::from_slice(&body).unwrap_or_default();
    let asin = request.asin.unwrap_or_default();

    let post_text = state
        .composer
        .generate_post_text(&asin)
        .await
        .inspect_err(|e| tracing::warn!(error = %e, "Post generation failed"))?;

    Ok(Json(GenerateResponse {
        ok: true,
        post_text,
    }))
}
