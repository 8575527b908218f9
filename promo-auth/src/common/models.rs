use serde::{Deserialize, Serialize};

/// Seconds before computed expiry at which a token is treated as stale.
pub const EARLY_REFRESH_SECS: i64 = 60;

/// Stored credentials for one linked account, keyed by account id in the
/// credential file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub username: String,
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Zero when the server did not report a lifetime.
    #[serde(default)]
    pub expires_in: u64,
    /// Unix seconds.
    #[serde(default)]
    pub obtained_at: i64,
}

impl TokenRecord {
    /// A token is fresh only when its lifetime is known and `now` is more
    /// than [`EARLY_REFRESH_SECS`] before the computed expiry.
    pub fn is_fresh_at(&self, now: i64) -> bool {
        if self.access_token.is_empty() || self.expires_in == 0 || self.obtained_at == 0 {
            return false;
        }
        let expires_in = i64::try_from(self.expires_in).unwrap_or(i64::MAX);
        now < self
            .obtained_at
            .saturating_add(expires_in)
            .saturating_sub(EARLY_REFRESH_SECS)
    }

    /// Apply a refresh response. The refresh token is only replaced when the
    /// server rotated it; a missing lifetime keeps the previous one.
    pub fn apply_refresh(&mut self, tokens: TokenGrant, now: i64) {
        self.access_token = tokens.access_token;
        if let Some(expires_in) = tokens.expires_in {
            self.expires_in = expires_in;
        }
        self.obtained_at = now;
        if let Some(refresh_token) = tokens.refresh_token.filter(|t| !t.is_empty()) {
            self.refresh_token = Some(refresh_token);
        }
    }
}

/// Tokens returned by the token endpoint for either grant type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
}

/// Per-browser-session secrets created when the login redirect is issued and
/// consumed once at callback time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAuthorization {
    pub state: String,
    pub pkce_verifier: String,
}

/// Query parameters the provider appends to the redirect URI.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Identity returned by the user-info endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserIdentity {
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl UserIdentity {
    pub fn display_name(&self) -> String {
        self.username
            .clone()
            .filter(|u| !u.is_empty())
            .or_else(|| self.name.clone().filter(|n| !n.is_empty()))
            .unwrap_or_else(|| self.id.clone())
    }
}

/// A freshly linked account: the id it is stored under plus its record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedAccount {
    pub account_id: String,
    pub record: TokenRecord,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(expires_in: u64, obtained_at: i64) -> TokenRecord {
        TokenRecord {
            username: "promo".to_string(),
            access_token: "access".to_string(),
            refresh_token: Some("refresh".to_string()),
            expires_in,
            obtained_at,
        }
    }

    #[test]
    fn fresh_until_sixty_seconds_before_expiry() {
        let t = 1_700_000_000;
        let e = 7200;
        let token = record(e as u64, t);

        assert!(token.is_fresh_at(t + e - 61));
        assert!(!token.is_fresh_at(t + e - 60));
        assert!(!token.is_fresh_at(t + e - 59));
        assert!(!token.is_fresh_at(t + e + 1));
    }

    #[test]
    fn unknown_lifetime_is_never_fresh() {
        assert!(!record(0, 1_700_000_000).is_fresh_at(1_700_000_001));
        assert!(!record(7200, 0).is_fresh_at(1));

        let mut empty = record(7200, 1_700_000_000);
        empty.access_token.clear();
        assert!(!empty.is_fresh_at(1_700_000_001));
    }

    #[test]
    fn refresh_keeps_refresh_token_unless_rotated() {
        let mut token = record(7200, 100);
        token.apply_refresh(
            TokenGrant {
                access_token: "access-2".to_string(),
                refresh_token: None,
                expires_in: None,
            },
            500,
        );
        assert_eq!(token.access_token, "access-2");
        assert_eq!(token.refresh_token.as_deref(), Some("refresh"));
        assert_eq!(token.expires_in, 7200);
        assert_eq!(token.obtained_at, 500);

        token.apply_refresh(
            TokenGrant {
                access_token: "access-3".to_string(),
                refresh_token: Some("refresh-2".to_string()),
                expires_in: Some(3600),
            },
            900,
        );
        assert_eq!(token.refresh_token.as_deref(), Some("refresh-2"));
        assert_eq!(token.expires_in, 3600);
    }

    #[test]
    fn display_name_falls_back_to_name_then_id() {
        let identity = UserIdentity {
            id: "42".to_string(),
            username: None,
            name: Some("Promo Bot".to_string()),
        };
        assert_eq!(identity.display_name(), "Promo Bot");

        let bare = UserIdentity {
            id: "42".to_string(),
            username: Some(String::new()),
            name: None,
        };
        assert_eq!(bare.display_name(), "42");
    }

    #[test]
    fn record_uses_persisted_field_names() {
        let json = serde_json::to_value(record(7200, 100)).unwrap();
        assert_eq!(json["username"], "promo");
        assert_eq!(json["access_token"], "access");
        assert_eq!(json["refresh_token"], "refresh");
        assert_eq!(json["expires_in"], 7200);
        assert_eq!(json["obtained_at"], 100);
    }
}
