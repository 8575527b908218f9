use chrono::{DateTime, Utc};
use dashmap::DashMap;
use promo_auth::PendingAuthorization;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "promo_session";

const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashLevel {
    Success,
    Error,
}

impl FlashLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlashLevel::Success => "success",
            FlashLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BrowserSession {
    pub pending: Option<PendingAuthorization>,
    pub flashes: Vec<Flash>,
    /// Last time the browser presented this session.
    pub last_seen: DateTime<Utc>,
}

impl BrowserSession {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            pending: None,
            flashes: Vec::new(),
            last_seen: now,
        }
    }

    fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        let age = now
            .signed_duration_since(self.last_seen)
            .to_std()
            .unwrap_or(Duration::ZERO);
        age >= ttl
    }
}

/// Server-side browser sessions keyed by the id carried in
/// [`SESSION_COOKIE`].
pub struct SessionStore {
    sessions: Arc<DashMap<String, BrowserSession>>,
    ttl: Duration,
}

impl SessionStore {
    /// Must be called inside a tokio runtime: a background task sweeps
    /// expired sessions.
    pub fn new(ttl_seconds: u64) -> Self {
        let store = Self {
            sessions: Arc::new(DashMap::new()),
            ttl: Duration::from_secs(ttl_seconds),
        };

        // Spawn background cleanup task
        let sessions_clone = store.sessions.clone();
        let ttl_clone = store.ttl;
        tokio::spawn(async move {
            cleanup_expired_sessions(sessions_clone, ttl_clone).await;
        });

        tracing::info!(
            "Session store initialized with TTL of {} seconds",
            ttl_seconds
        );
        store
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Resolve the caller's session, starting a new one when the id is
    /// missing, unknown or expired. Returns the id and whether it is new.
    ///
    /// Expiry slides: every resolve of a live session restarts its TTL.
    pub fn resolve(&self, session_id: Option<&str>) -> (String, bool) {
        self.resolve_at(session_id, Utc::now())
    }

    pub(crate) fn resolve_at(
        &self,
        session_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> (String, bool) {
        if let Some(id) = session_id {
            let live = self
                .sessions
                .get_mut(id)
                .filter(|s| !s.is_expired(now, self.ttl))
                .map(|mut s| s.last_seen = now)
                .is_some();
            if live {
                return (id.to_string(), false);
            }
            self.sessions.remove(id);
        }

        let session_id = Uuid::new_v4().to_string();
        self.sessions
            .insert(session_id.clone(), BrowserSession::new(now));
        tracing::debug!(session_id = %session_id, "Created session");
        (session_id, true)
    }

    /// Update a session using a closure
    pub fn update_session<F>(&self, session_id: &str, update_fn: F) -> bool
    where
        F: FnOnce(&mut BrowserSession),
    {
        self.sessions
            .get_mut(session_id)
            .map(|mut s| {
                update_fn(&mut s);
                true
            })
            .unwrap_or(false)
    }

    pub fn set_pending(&self, session_id: &str, pending: PendingAuthorization) -> bool {
        self.update_session(session_id, |s| s.pending = Some(pending))
    }

    /// Remove and return the pending authorization; a second call yields
    /// `None`.
    pub fn take_pending(&self, session_id: &str) -> Option<PendingAuthorization> {
        self.sessions
            .get_mut(session_id)
            .and_then(|mut s| s.pending.take())
    }

    pub fn flash(&self, session_id: &str, flash: Flash) -> bool {
        self.update_session(session_id, |s| s.flashes.push(flash))
    }

    pub fn drain_flashes(&self, session_id: &str) -> Vec<Flash> {
        self.sessions
            .get_mut(session_id)
            .map(|mut s| std::mem::take(&mut s.flashes))
            .unwrap_or_default()
    }

    /// Get session count (for monitoring)
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

/// Background task that periodically cleans up expired sessions
async fn cleanup_expired_sessions(sessions: Arc<DashMap<String, BrowserSession>>, ttl: Duration) {
    let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
    loop {
        interval.tick().await;
        let now = Utc::now();
        let initial_count = sessions.len();

        sessions.retain(|_, session| !session.is_expired(now, ttl));

        let cleaned = initial_count.saturating_sub(sessions.len());
        if cleaned > 0 {
            tracing::info!(
                "Cleaned up {} expired sessions, {} remaining",
                cleaned,
                sessions.len()
            );
        }
    }
}
