//! Shared-secret signed token issuance and verification.
//!
//! Both sides of the system share one symmetric secret. The issuer builds a
//! claims set carrying the issuance time, signs it with HMAC-SHA256, and
//! encodes the result as a three-part `header.payload.signature` string.
//! The verifier walks an ordered check chain and reports the first failure
//! as a distinct [`VerifyError`] variant.
//!
//! There is no expiry claim and no replay tracking: a token is accepted for
//! a symmetric ±[`FRESHNESS_WINDOW_SECS`] window around its `iat` claim, and
//! nothing else bounds its validity.

use std::collections::BTreeMap;
use std::io;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ring::hmac;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Width of the acceptance window on each side of `iat`, in seconds.
///
/// A token is accepted iff `iat - 60 <= now <= iat + 60`, boundaries
/// inclusive. This window is the entire freshness guarantee.
pub const FRESHNESS_WINDOW_SECS: i64 = 60;

/// Prefix of the `Authorization` header value carrying a token.
pub const BEARER_PREFIX: &str = "Bearer ";

/// The only signing algorithm a verifier will honor.
const SIGNING_ALG: &str = "HS256";

/// Claims carried inside a signed token.
///
/// `iat` is the only required and only interpreted claim. Additional claims
/// round-trip untouched through [`ClaimValue`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Unix timestamp (seconds) recorded at signing time.
    pub iat: i64,
    #[serde(flatten, default)]
    pub extra: BTreeMap<String, ClaimValue>,
}

impl Claims {
    pub fn issued_at(iat: i64) -> Self {
        Self {
            iat,
            extra: BTreeMap::new(),
        }
    }
}

/// Value kinds permitted for claims beyond `iat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClaimValue {
    Integer(i64),
    Text(String),
    Flag(bool),
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenHeader {
    #[serde(default)]
    alg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    typ: Option<String>,
}

/// Token issuance failure.
///
/// A well-formed claims set always encodes, so hitting this is a programmer
/// or environment error rather than a normal outcome.
#[derive(Debug, Error)]
pub enum IssueError {
    #[error("failed to encode token part: {0}")]
    Encode(#[from] serde_json::Error),
}

/// First failing check of the verification chain.
///
/// Every variant maps to a rejected request on the serving side; none of
/// them is a crash. The variants stay distinct so logs and tests can tell
/// the checks apart even where the transport response collapses them.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerifyError {
    /// Not a three-part token, or the header part does not decode.
    #[error("token is structurally malformed")]
    Malformed,
    /// Declared algorithm is not HMAC, or the MAC does not match.
    #[error("token signature is invalid")]
    SignatureInvalid,
    /// Payload is not a claims object with an integer `iat`.
    #[error("token claims are invalid")]
    ClaimsInvalid,
    /// `iat` is outside the acceptance window around `now`.
    #[error("token issued at {iat} is outside the freshness window at {now}")]
    StaleOrFuture { iat: i64, now: i64 },
}

/// Read the shared secret from a file as raw bytes.
pub fn load_secret(path: &Path) -> io::Result<Vec<u8>> {
    std::fs::read(path)
}

/// Current Unix time in seconds.
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as i64)
        .unwrap_or(0)
}

/// Issue a token whose `iat` is the current time.
pub fn issue_token(secret: &[u8]) -> Result<String, IssueError> {
    issue_token_at(secret, unix_now())
}

/// Issue a token with an explicit `iat`.
pub fn issue_token_at(secret: &[u8], iat: i64) -> Result<String, IssueError> {
    let header = TokenHeader {
        alg: Some(SIGNING_ALG.to_string()),
        typ: Some("JWT".to_string()),
    };
    let header_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?);
    let payload_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&Claims::issued_at(iat))?);

    let key = hmac::Key::new(hmac::HMAC_SHA256, secret);
    let message = format!("{header_b64}.{payload_b64}");
    let tag = hmac::sign(&key, message.as_bytes());
    let signature_b64 = URL_SAFE_NO_PAD.encode(tag.as_ref());

    Ok(format!("{message}.{signature_b64}"))
}

/// Verify a token against the shared secret at time `now`.
///
/// Checks run in a fixed order and stop at the first failure: structure,
/// declared algorithm, signature, claims shape, freshness. The signature is
/// checked before the payload is ever decoded, and the comparison goes
/// through `ring`'s constant-time verify.
pub fn verify_token(token: &str, secret: &[u8], now: i64) -> Result<Claims, VerifyError> {
    let mut parts = token.split('.');
    let (header_b64, payload_b64, signature_b64) =
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(header), Some(payload), Some(signature), None) => (header, payload, signature),
            _ => return Err(VerifyError::Malformed),
        };

    let header_bytes = URL_SAFE_NO_PAD
        .decode(header_b64)
        .map_err(|_| VerifyError::Malformed)?;
    let header: TokenHeader =
        serde_json::from_slice(&header_bytes).map_err(|_| VerifyError::Malformed)?;

    // Pin the algorithm to the HMAC family. Honoring whatever the token
    // declares (notably "none") would let an attacker pick the check that
    // verifies their forgery.
    if header.alg.as_deref() != Some(SIGNING_ALG) {
        return Err(VerifyError::SignatureInvalid);
    }

    let signature = URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| VerifyError::SignatureInvalid)?;
    let key = hmac::Key::new(hmac::HMAC_SHA256, secret);
    let message_len = header_b64.len() + 1 + payload_b64.len();
    hmac::verify(&key, &token.as_bytes()[..message_len], &signature)
        .map_err(|_| VerifyError::SignatureInvalid)?;

    let payload_bytes = URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| VerifyError::ClaimsInvalid)?;
    let claims: Claims =
        serde_json::from_slice(&payload_bytes).map_err(|_| VerifyError::ClaimsInvalid)?;

    if now < claims.iat - FRESHNESS_WINDOW_SECS || now > claims.iat + FRESHNESS_WINDOW_SECS {
        return Err(VerifyError::StaleOrFuture {
            iat: claims.iat,
            now,
        });
    }

    Ok(claims)
}
