// SPDX-FileCopyrightText: 2026 Rapport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for persistence backends (SQLite, etc.).

use async_trait::async_trait;

use crate::error::RapportError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{AnalysisRecord, Character};

/// Adapter for storage and persistence backends.
///
/// Holds the analysis archive and saved characters. Character operations
/// are always scoped by owner: a character belonging to another user
/// behaves exactly like a missing one.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), RapportError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), RapportError>;

    // --- Analysis archive ---

    /// Archives an analysis and returns its record id.
    async fn save_analysis(&self, record: &AnalysisRecord) -> Result<String, RapportError>;

    /// Lists a user's archived analyses, newest first.
    async fn list_analyses(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<AnalysisRecord>, RapportError>;

    // --- Characters ---

    /// Inserts a new character.
    async fn create_character(&self, character: &Character) -> Result<(), RapportError>;

    /// Fetches one of the user's characters.
    async fn get_character(
        &self,
        user_id: &str,
        id: &str,
    ) -> Result<Option<Character>, RapportError>;

    /// Lists the user's characters, most recently updated first.
    async fn list_characters(&self, user_id: &str) -> Result<Vec<Character>, RapportError>;

    /// Replaces a character's mutable fields. Returns `false` if no row matched.
    async fn update_character(&self, character: &Character) -> Result<bool, RapportError>;

    /// Deletes a character. Returns `false` if no row matched.
    async fn delete_character(&self, user_id: &str, id: &str) -> Result<bool, RapportError>;
}
