//! AWS Signature Version 4 request signing, specialised for the PA-API 5
//! `GetItems` operation.
//!
//! The signing key is derived by chaining HMAC-SHA256 over the date, region,
//! service and the literal `aws4_request`, starting from `"AWS4" + secret`.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";
pub const SERVICE: &str = "ProductAdvertisingAPI";
pub const CONTENT_ENCODING: &str = "amz-1.0";
pub const SIGNED_HEADERS: &str = "content-encoding;host;x-amz-date";

const AMZ_DATE_FORMAT: &str = "%Y%m%dT%H%M%SZ";
const DATESTAMP_FORMAT: &str = "%Y%m%d";
const SCOPE_TERMINATOR: &str = "aws4_request";

/// Headers produced for one signed call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    pub amz_date: String,
    pub authorization: String,
}

pub struct Signer<'a> {
    access_key: &'a str,
    secret_key: &'a SecretString,
    region: &'a str,
    host: &'a str,
}

impl<'a> Signer<'a> {
    pub fn new(
        access_key: &'a str,
        secret_key: &'a SecretString,
        region: &'a str,
        host: &'a str,
    ) -> Self {
        Self {
            access_key,
            secret_key,
            region,
            host,
        }
    }

    /// Sign `payload` for a POST to `path` at the instant `at`.
    ///
    /// The output depends only on the inputs, so signing twice with the same
    /// timestamp yields identical headers.
    pub fn sign(&self, path: &str, payload: &str, at: DateTime<Utc>) -> SignedHeaders {
        let amz_date = at.format(AMZ_DATE_FORMAT).to_string();
        let datestamp = at.format(DATESTAMP_FORMAT).to_string();

        let canonical_request = self.canonical_request(path, &amz_date, payload);
        let scope = self.credential_scope(&datestamp);
        let string_to_sign = string_to_sign(&amz_date, &scope, &canonical_request);

        let signing_key = self.signing_key(&datestamp);
        let signature = hex::encode(hmac_sha256(&signing_key, &string_to_sign));

        let authorization = format!(
            "{ALGORITHM} Credential={}/{scope}, SignedHeaders={SIGNED_HEADERS}, Signature={signature}",
            self.access_key
        );

        SignedHeaders {
            amz_date,
            authorization,
        }
    }

    pub(crate) fn canonical_request(&self, path: &str, amz_date: &str, payload: &str) -> String {
        let canonical_headers = format!(
            "content-encoding:{CONTENT_ENCODING}\nhost:{}\nx-amz-date:{amz_date}\n",
            self.host
        );
        let payload_hash = sha256_hex(payload.as_bytes());

        // Query string is always empty for PA-API calls.
        format!("POST\n{path}\n\n{canonical_headers}\n{SIGNED_HEADERS}\n{payload_hash}")
    }

    pub(crate) fn credential_scope(&self, datestamp: &str) -> String {
        format!("{datestamp}/{}/{SERVICE}/{SCOPE_TERMINATOR}", self.region)
    }

    pub(crate) fn signing_key(&self, datestamp: &str) -> Vec<u8> {
        let secret = format!("AWS4{}", self.secret_key.expose_secret());
        let k_date = hmac_sha256(secret.as_bytes(), datestamp);
        let k_region = hmac_sha256(&k_date, self.region);
        let k_service = hmac_sha256(&k_region, SERVICE);
        hmac_sha256(&k_service, SCOPE_TERMINATOR)
    }
}

fn string_to_sign(amz_date: &str, scope: &str, canonical_request: &str) -> String {
    format!(
        "{ALGORITHM}\n{amz_date}\n{scope}\n{}",
        sha256_hex(canonical_request.as_bytes())
    )
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn hmac_sha256(key: &[u8], msg: &str) -> Vec<u8> {
    let mut mac =
        <HmacSha256 as Mac>::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(msg.as_bytes());
    mac.finalize().into_bytes().to_vec()
}
