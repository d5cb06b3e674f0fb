// SPDX-FileCopyrightText: 2026 Rapport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Rapport integration tests.
//!
//! Provides a scripted generation engine, transcript fixtures, and a test
//! harness that assembles the full HTTP stack over a temp SQLite database.
//!
//! # Components
//!
//! - [`MockGenerator`] - Generation engine with pre-configured payloads
//! - [`TestHarness`] - Router, storage, and token minting for end-to-end tests
//! - [`fixtures`] - Transcripts and well-formed engine payloads

pub mod fixtures;
pub mod harness;
pub mod mock_generator;

pub use harness::{TestHarness, TestResponse};
pub use mock_generator::MockGenerator;
