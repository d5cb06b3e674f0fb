// SPDX-FileCopyrightText: 2026 Rapport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Signed bearer token identity adapter.
//!
//! Tokens have the form `<user_id>.<expires_unix>.<signature>` where the
//! signature is the hex HMAC-SHA256 of `<user_id>.<expires_unix>` under the
//! deployment secret. The user id may itself contain dots; the last two
//! segments are always the expiry and signature.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;

use rapport_core::traits::{IdentityAdapter, PluginAdapter};
use rapport_core::types::{AdapterType, AuthToken, HealthStatus, UserId};
use rapport_core::RapportError;

type HmacSha256 = Hmac<Sha256>;

/// Verifies and mints HMAC-signed, expiring bearer tokens.
pub struct SignedTokenVerifier {
    secret: Vec<u8>,
}

impl std::fmt::Debug for SignedTokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedTokenVerifier")
            .field("secret", &"[redacted]")
            .finish()
    }
}

impl SignedTokenVerifier {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Mints a token for `user` valid for `ttl` from now.
    pub fn issue(&self, user: &UserId, ttl: Duration) -> Result<AuthToken, RapportError> {
        self.issue_until(user, (Utc::now() + ttl).timestamp())
    }

    /// Mints a token for `user` expiring at the given unix timestamp.
    pub fn issue_until(&self, user: &UserId, expires_at: i64) -> Result<AuthToken, RapportError> {
        if user.0.is_empty() {
            return Err(RapportError::Validation("user id must not be empty".into()));
        }
        let payload = format!("{}.{expires_at}", user.0);
        let signature = hex::encode(self.mac(&payload)?.finalize().into_bytes());
        Ok(AuthToken(format!("{payload}.{signature}")))
    }

    /// Verifies `token` against the clock value `now` (unix seconds).
    pub fn verify_at(&self, token: &AuthToken, now: i64) -> Result<UserId, RapportError> {
        let mut parts = token.0.rsplitn(3, '.');
        let (Some(signature), Some(expires), Some(user)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(unauthorized("malformed token"));
        };
        if user.is_empty() {
            return Err(unauthorized("malformed token"));
        }
        let expires_at: i64 = expires
            .parse()
            .map_err(|_| unauthorized("malformed token expiry"))?;
        let signature = hex::decode(signature).map_err(|_| unauthorized("malformed token signature"))?;

        let payload = &token.0[..user.len() + 1 + expires.len()];
        self.mac(payload)?
            .verify_slice(&signature)
            .map_err(|_| unauthorized("invalid token signature"))?;

        if expires_at <= now {
            debug!(user_id = user, expires_at, "rejected expired token");
            return Err(unauthorized("token expired"));
        }
        Ok(UserId(user.to_string()))
    }

    fn mac(&self, payload: &str) -> Result<HmacSha256, RapportError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| RapportError::Internal(format!("invalid HMAC key: {e}")))?;
        mac.update(payload.as_bytes());
        Ok(mac)
    }
}

fn unauthorized(reason: &str) -> RapportError {
    RapportError::Unauthorized(reason.to_string())
}

#[async_trait]
impl PluginAdapter for SignedTokenVerifier {
    fn name(&self) -> &str {
        "signed-token"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Identity
    }

    async fn health_check(&self) -> Result<HealthStatus, RapportError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), RapportError> {
        Ok(())
    }
}

#[async_trait]
impl IdentityAdapter for SignedTokenVerifier {
    async fn verify(&self, token: AuthToken) -> Result<UserId, RapportError> {
        self.verify_at(&token, Utc::now().timestamp())
    }
}
