// SPDX-FileCopyrightText: 2026 Rapport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `rapport token`: mint a development bearer token.

use clap::Args;
use rapport_auth::SignedTokenVerifier;
use rapport_config::RapportConfig;
use rapport_core::{RapportError, UserId};

/// Arguments for `rapport token`.
#[derive(Args, Debug)]
pub struct TokenArgs {
    /// User id embedded in the token.
    pub user: String,

    /// Lifetime in hours.
    #[arg(long, default_value_t = 24)]
    pub ttl_hours: i64,
}

/// Mints a token for `args.user` with the configured secret.
pub fn mint(config: &RapportConfig, args: &TokenArgs) -> Result<String, RapportError> {
    let secret = config.auth.token_secret.as_deref().ok_or_else(|| {
        RapportError::Config("auth.token_secret must be set to mint tokens".to_string())
    })?;
    if args.ttl_hours <= 0 {
        return Err(RapportError::Validation("--ttl-hours must be positive".to_string()));
    }
    let verifier = SignedTokenVerifier::new(secret.as_bytes());
    let token = verifier.issue(
        &UserId(args.user.clone()),
        chrono::Duration::hours(args.ttl_hours),
    )?;
    Ok(token.0)
}

/// Runs the `rapport token` command.
pub fn run_token(config: &RapportConfig, args: &TokenArgs) -> Result<(), RapportError> {
    println!("{}", mint(config, args)?);
    Ok(())
}
