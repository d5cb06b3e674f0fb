// SPDX-FileCopyrightText: 2026 Rapport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Rapport analysis service.
//!
//! Exposes the health probe, the analyze endpoint, the caller's analysis
//! history, and character CRUD over axum, with bearer-token auth on every
//! `/api` route.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod server;

pub use auth::Identity;
pub use error::ApiError;
pub use server::{build_router, start_server, GatewayState};
