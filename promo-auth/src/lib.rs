// Common types shared by the flow, the store and the web layer
pub mod common;

pub mod config;
pub mod credential_store;
mod error;
pub mod pkce;
pub mod services;

pub use common::{
    CallbackParams, LinkedAccount, PendingAuthorization, TokenGrant, TokenRecord, UserIdentity,
};
pub use config::{Endpoints, OAuthSettings};
pub use credential_store::{AccountSummary, CredentialStore};
pub use error::{AuthError, ErrorKind};
pub use services::{OAuthClient, PostedTweet, TweetClient};
