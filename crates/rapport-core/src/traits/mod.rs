// SPDX-FileCopyrightText: 2026 Rapport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capability traits for the collaborators the analysis core depends on.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod generation;
pub mod identity;
pub mod storage;

pub use adapter::PluginAdapter;
pub use generation::GenerationAdapter;
pub use identity::IdentityAdapter;
pub use storage::StorageAdapter;
