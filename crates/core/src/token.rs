//! Bearer-token decoding.
//!
//! The backend issues three-segment dot-delimited tokens whose middle segment
//! is base64url JSON. The frontend never verifies signatures; trust is
//! deferred entirely to the backend, and decoding exists only to read the
//! role, branch, subject, and expiry claims. Malformed input yields `None`,
//! never a panic.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use crate::errors::AuthError;

/// Branch claim fallback when a token carries no branch at all. Central-office
/// tokens historically lack the claim and the backend expects branch 1 for
/// them; keep this value unless `workflow.default_branch` overrides it.
pub const DEFAULT_BRANCH: u32 = 1;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedIdentity {
    pub role: String,
    pub branch: Option<u32>,
    pub subject: String,
    /// Unix seconds. Tokens without an `exp` claim never expire; some
    /// backend-issued tokens omit the claim.
    pub expires_at: Option<i64>,
}

impl DecodedIdentity {
    pub fn branch_or(&self, default: u32) -> u32 {
        self.branch.unwrap_or(default)
    }

    pub fn branch_number(&self) -> u32 {
        self.branch_or(DEFAULT_BRANCH)
    }

    /// Expiry boundary is inclusive: `exp <= now` is invalid.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at > now.timestamp(),
            None => true,
        }
    }
}

pub fn decode(token: &str) -> Option<DecodedIdentity> {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (segments.next(), segments.next(), segments.next(), segments.next())
    else {
        return None;
    };

    let raw = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: Value = serde_json::from_slice(&raw).ok()?;

    Some(DecodedIdentity {
        role: role_claim(&claims),
        branch: branch_claim(&claims),
        subject: claims.get("sub").and_then(Value::as_str).unwrap_or_default().to_owned(),
        expires_at: expiry_claim(&claims),
    })
}

pub fn is_valid(token: &str) -> bool {
    is_valid_at(token, Utc::now())
}

pub fn is_valid_at(token: &str, now: DateTime<Utc>) -> bool {
    if token.trim().is_empty() {
        return false;
    }
    decode(token).map(|identity| identity.is_valid_at(now)).unwrap_or(false)
}

pub fn role(token: &str) -> String {
    decode(token).map(|identity| identity.role).unwrap_or_default()
}

pub fn branch_number(token: &str) -> u32 {
    decode(token).and_then(|identity| identity.branch).unwrap_or(DEFAULT_BRANCH)
}

/// Compatibility shim for the inconsistent token shapes the backend issues.
/// The precedence order is load-bearing: `roles` string, `roles` array,
/// `role` string, `role` array, `authorities` string, `authorities` array,
/// then empty.
fn role_claim(claims: &Value) -> String {
    for key in ["roles", "role", "authorities"] {
        match claims.get(key) {
            Some(Value::String(role)) => return role.clone(),
            Some(Value::Array(entries)) => {
                if let Some(Value::String(role)) = entries.first() {
                    return role.clone();
                }
            }
            _ => {}
        }
    }
    String::new()
}

fn branch_claim(claims: &Value) -> Option<u32> {
    ["nomorCabang", "cabang"]
        .iter()
        .filter_map(|key| claims.get(*key))
        .find_map(numeric_claim)
}

fn numeric_claim(value: &Value) -> Option<u32> {
    match value {
        Value::Number(number) => number.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(raw) => raw.trim().parse().ok(),
        _ => None,
    }
}

fn expiry_claim(claims: &Value) -> Option<i64> {
    let exp = claims.get("exp")?;
    exp.as_i64().or_else(|| exp.as_f64().map(|seconds| seconds as i64))
}

/// Explicit session object handed into every gateway call, replacing ad hoc
/// reads of a globally stored token. Constructed fresh per screen, so a
/// re-login is visible on the next construction without any invalidation
/// machinery.
#[derive(Clone, Debug)]
pub struct Session {
    token: SecretString,
    pub identity: DecodedIdentity,
}

impl Session {
    pub fn from_token(token: &str) -> Result<Self, AuthError> {
        Self::from_token_at(token, Utc::now())
    }

    pub fn from_token_at(token: &str, now: DateTime<Utc>) -> Result<Self, AuthError> {
        if token.trim().is_empty() {
            return Err(AuthError::Missing);
        }
        let identity = decode(token).ok_or(AuthError::Invalid)?;
        if !identity.is_valid_at(now) {
            return Err(AuthError::Invalid);
        }
        Ok(Self { token: token.to_owned().into(), identity })
    }

    pub fn bearer(&self) -> &str {
        self.token.expose_secret()
    }

    pub fn branch_or(&self, default: u32) -> u32 {
        self.identity.branch_or(default)
    }
}

/// Builds an unsigned token for tests elsewhere in the crate.
#[cfg(test)]
pub(crate) fn token_with(claims: serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string().as_bytes());
    format!("{header}.{payload}.signature")
}
