// SPDX-FileCopyrightText: 2026 Rapport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Analysis engines for the Rapport service.
//!
//! - [`sampler`]: even down-sampling of a transcript for the timeline
//! - [`mock`]: the deterministic placeholder scorer
//! - [`reconcile`]: validating decode of delegated-engine output
//! - [`prompt`]: prompts and output schema for the delegated engine
//! - [`orchestrator`]: engine selection, transcript windowing, archiving

pub mod mock;
pub mod orchestrator;
pub mod prompt;
pub mod reconcile;
pub mod sampler;

pub use orchestrator::{Analysis, Analyzer, Archive, Engine, MAX_TRANSCRIPT};
pub use reconcile::{reconcile, SchemaError};
pub use sampler::sample;
