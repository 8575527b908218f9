use secrecy::SecretString;

pub const X_AUTH_URL: &str = "https://twitter.com/i/oauth2/authorize";
pub const X_API_BASE: &str = "https://api.twitter.com";

pub const TOKEN_PATH: &str = "/2/oauth2/token";
pub const USERS_ME_PATH: &str = "/2/users/me";
pub const TWEETS_PATH: &str = "/2/tweets";

pub const DEFAULT_SCOPES: [&str; 4] = ["tweet.read", "tweet.write", "users.read", "offline.access"];

/// Everything needed to drive the authorization-code flow for one client.
#[derive(Debug, Clone)]
pub struct OAuthSettings {
    pub client_id: String,
    pub client_secret: SecretString,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub endpoints: Endpoints,
}

impl OAuthSettings {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: SecretString,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret,
            redirect_uri: redirect_uri.into(),
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            endpoints: Endpoints::default(),
        }
    }

    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub auth_url: String,
    pub token_url: String,
    pub users_me_url: String,
    pub tweets_url: String,
}

impl Endpoints {
    /// Endpoints rooted at `api_base` (token, user-info, tweets) with a
    /// separate authorization page.
    pub fn new(auth_url: impl Into<String>, api_base: &str) -> Self {
        let api_base = api_base.trim_end_matches('/');
        Self {
            auth_url: auth_url.into(),
            token_url: format!("{api_base}{TOKEN_PATH}"),
            users_me_url: format!("{api_base}{USERS_ME_PATH}"),
            tweets_url: format!("{api_base}{TWEETS_PATH}"),
        }
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(X_AUTH_URL, X_API_BASE)
    }
}
