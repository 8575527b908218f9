//! PKCE (RFC 7636) verifier/challenge generation and the opaque state token.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::Rng;
use sha2::{Digest, Sha256};

use crate::common::PendingAuthorization;

pub const CHALLENGE_METHOD: &str = "S256";

const VERIFIER_BYTES: usize = 32;
const STATE_BYTES: usize = 16;

fn random_token(len: usize) -> String {
    let mut rng = rand::rng();
    let random_bytes: Vec<u8> = (0..len).map(|_| rng.random()).collect();
    URL_SAFE_NO_PAD.encode(random_bytes)
}

/// 32 random bytes, base64url without padding (43 characters).
pub fn generate_code_verifier() -> String {
    random_token(VERIFIER_BYTES)
}

/// BASE64URL(SHA256(ASCII(verifier))) without padding.
pub fn code_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

/// Unguessable CSRF state, URL-safe.
pub fn generate_state() -> String {
    random_token(STATE_BYTES)
}

/// Verifier, its challenge and the state token for one login attempt.
#[derive(Debug, Clone)]
pub struct PkcePair {
    pub verifier: String,
    pub challenge: String,
    pub state: String,
}

impl PkcePair {
    pub fn generate() -> Self {
        let verifier = generate_code_verifier();
        let challenge = code_challenge(&verifier);
        Self {
            verifier,
            challenge,
            state: generate_state(),
        }
    }

    /// The half that must survive until the callback.
    pub fn pending(&self) -> PendingAuthorization {
        PendingAuthorization {
            state: self.state.clone(),
            pkce_verifier: self.verifier.clone(),
        }
    }
}
