// SPDX-FileCopyrightText: 2026 Rapport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Analysis archive operations.

use rapport_core::types::AnalysisRecord;
use rapport_core::RapportError;
use rusqlite::params;

use crate::database::{json_column_err, map_tr_err, Database};

/// Insert an archived analysis, returning its id.
pub async fn insert_analysis(db: &Database, record: &AnalysisRecord) -> Result<String, RapportError> {
    let options = serde_json::to_string(&record.options).map_err(RapportError::storage)?;
    let result = serde_json::to_string(&record.result).map_err(RapportError::storage)?;
    let id = record.id.clone();
    let user_id = record.user_id.clone();
    let created_at = record.created_at.clone();
    let message_count = record.message_count as i64;

    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO analyses (id, user_id, created_at, options, result, message_count)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![id, user_id, created_at, options, result, message_count],
            )?;
            Ok(id)
        })
        .await
        .map_err(map_tr_err)
}

/// List a user's archived analyses, newest first.
pub async fn list_analyses(
    db: &Database,
    user_id: &str,
    limit: usize,
) -> Result<Vec<AnalysisRecord>, RapportError> {
    let user_id = user_id.to_string();
    let limit = limit as i64;
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, created_at, options, result, message_count
                 FROM analyses WHERE user_id = ?1
                 ORDER BY created_at DESC, rowid DESC LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![user_id, limit], |row| {
                let options: String = row.get(3)?;
                let result: String = row.get(4)?;
                let message_count: i64 = row.get(5)?;
                Ok(AnalysisRecord {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    created_at: row.get(2)?,
                    options: serde_json::from_str(&options).map_err(|e| json_column_err(3, e))?,
                    result: serde_json::from_str(&result).map_err(|e| json_column_err(4, e))?,
                    message_count: message_count.max(0) as usize,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}
