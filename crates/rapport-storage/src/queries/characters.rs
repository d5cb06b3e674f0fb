// SPDX-FileCopyrightText: 2026 Rapport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Character CRUD operations. Every statement is scoped by `user_id`.

use rapport_core::types::Character;
use rapport_core::RapportError;
use rusqlite::{params, OptionalExtension, Row};

use crate::database::{json_column_err, map_tr_err, Database};

const COLUMNS: &str = "id, user_id, name, description, messages, created_at, updated_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Character> {
    let messages: String = row.get(4)?;
    Ok(Character {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        messages: serde_json::from_str(&messages).map_err(|e| json_column_err(4, e))?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

/// Insert a new character.
pub async fn create_character(db: &Database, character: &Character) -> Result<(), RapportError> {
    let messages = serde_json::to_string(&character.messages).map_err(RapportError::storage)?;
    let c = character.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO characters (id, user_id, name, description, messages, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![c.id, c.user_id, c.name, c.description, messages, c.created_at, c.updated_at],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Get one of the user's characters by id.
pub async fn get_character(
    db: &Database,
    user_id: &str,
    id: &str,
) -> Result<Option<Character>, RapportError> {
    let user_id = user_id.to_string();
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM characters WHERE user_id = ?1 AND id = ?2"),
                params![user_id, id],
                from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// List the user's characters, most recently updated first.
pub async fn list_characters(db: &Database, user_id: &str) -> Result<Vec<Character>, RapportError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM characters WHERE user_id = ?1
                 ORDER BY updated_at DESC, rowid DESC"
            ))?;
            let rows = stmt.query_map(params![user_id], from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Replace name, description, messages and `updated_at`. Returns `false` if
/// the character does not exist for this user.
pub async fn update_character(db: &Database, character: &Character) -> Result<bool, RapportError> {
    let messages = serde_json::to_string(&character.messages).map_err(RapportError::storage)?;
    let c = character.clone();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE characters SET name = ?1, description = ?2, messages = ?3, updated_at = ?4
                 WHERE user_id = ?5 AND id = ?6",
                params![c.name, c.description, messages, c.updated_at, c.user_id, c.id],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Delete one of the user's characters. Returns `false` if nothing matched.
pub async fn delete_character(db: &Database, user_id: &str, id: &str) -> Result<bool, RapportError> {
    let user_id = user_id.to_string();
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "DELETE FROM characters WHERE user_id = ?1 AND id = ?2",
                params![user_id, id],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}
