// SPDX-FileCopyrightText: 2026 Rapport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity adapter trait for caller verification.

use async_trait::async_trait;

use crate::error::RapportError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{AuthToken, UserId};

/// Adapter that resolves a bearer token to a verified user.
#[async_trait]
pub trait IdentityAdapter: PluginAdapter {
    /// Verifies the token, returning [`RapportError::Unauthorized`] on rejection.
    async fn verify(&self, token: AuthToken) -> Result<UserId, RapportError>;
}
