// SPDX-FileCopyrightText: 2026 Rapport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use rapport_config::model::StorageConfig;
use rapport_core::types::{AnalysisRecord, Character};
use rapport_core::{AdapterType, HealthStatus, PluginAdapter, RapportError, StorageAdapter};

use crate::database::{self, Database};
use crate::queries;

/// SQLite-backed storage adapter.
///
/// The database is opened on the first call to [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    path: String,
    wal_mode: bool,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    pub fn new(path: impl Into<String>, wal_mode: bool) -> Self {
        Self {
            path: path.into(),
            wal_mode,
            db: OnceCell::new(),
        }
    }

    /// Builds an adapter from `[storage]`, or `None` when persistence is disabled.
    pub fn from_config(config: &StorageConfig) -> Option<Self> {
        config
            .database_path
            .as_ref()
            .map(|path| Self::new(path.clone(), config.wal_mode))
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn db(&self) -> Result<&Database, RapportError> {
        self.db.get().ok_or_else(|| RapportError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, RapportError> {
        let Ok(db) = self.db() else {
            return Ok(HealthStatus::Unhealthy("not initialized".into()));
        };
        let probe = db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await;
        Ok(match probe {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        })
    }

    async fn shutdown(&self) -> Result<(), RapportError> {
        if let Some(db) = self.db.get() {
            database::checkpoint(db.connection()).await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), RapportError> {
        let db = Database::open_with(&self.path, self.wal_mode).await?;
        self.db.set(db).map_err(|_| RapportError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), RapportError> {
        database::checkpoint(self.db()?.connection()).await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    // --- Analysis archive ---

    async fn save_analysis(&self, record: &AnalysisRecord) -> Result<String, RapportError> {
        queries::analyses::insert_analysis(self.db()?, record).await
    }

    async fn list_analyses(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<AnalysisRecord>, RapportError> {
        queries::analyses::list_analyses(self.db()?, user_id, limit).await
    }

    // --- Characters ---

    async fn create_character(&self, character: &Character) -> Result<(), RapportError> {
        queries::characters::create_character(self.db()?, character).await
    }

    async fn get_character(
        &self,
        user_id: &str,
        id: &str,
    ) -> Result<Option<Character>, RapportError> {
        queries::characters::get_character(self.db()?, user_id, id).await
    }

    async fn list_characters(&self, user_id: &str) -> Result<Vec<Character>, RapportError> {
        queries::characters::list_characters(self.db()?, user_id).await
    }

    async fn update_character(&self, character: &Character) -> Result<bool, RapportError> {
        queries::characters::update_character(self.db()?, character).await
    }

    async fn delete_character(&self, user_id: &str, id: &str) -> Result<bool, RapportError> {
        queries::characters::delete_character(self.db()?, user_id, id).await
    }
}
