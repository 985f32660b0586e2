// SPDX-FileCopyrightText: 2026 Bioline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook deliveries that could not be stored, kept for later replay.

use bioline_core::BiolineError;
use rusqlite::params;

use crate::database::{map_tr_err, Database};
use crate::models::DeadLetter;

/// Record a failed delivery.
pub async fn record(
    db: &Database,
    phone_number_id: Option<&str>,
    payload: &str,
    error: &str,
) -> Result<(), BiolineError> {
    let phone_number_id = phone_number_id.map(str::to_string);
    let payload = payload.to_string();
    let error = error.to_string();
    let now = db.next_timestamp();
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            conn.execute(
                "INSERT INTO webhook_dead_letters (phone_number_id, payload, error, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![phone_number_id, payload, error, now],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Most recent dead letters first.
pub async fn list(db: &Database, limit: u32) -> Result<Vec<DeadLetter>, BiolineError> {
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT id, phone_number_id, payload, error, created_at
                 FROM webhook_dead_letters ORDER BY id DESC LIMIT ?1",
            )?;
            let rows = stmt.query_map(params![limit], |row| {
                Ok(DeadLetter {
                    id: row.get(0)?,
                    phone_number_id: row.get(1)?,
                    payload: row.get(2)?,
                    error: row.get(3)?,
                    created_at: row.get(4)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn record_then_list_newest_first() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("dead.db");
        let db = Database::open(db_path.to_str().unwrap(), true).await.unwrap();

        record(&db, Some("P1"), r#"{"a":1}"#, "storage error: disk full")
            .await
            .unwrap();
        record(&db, None, r#"{"b":2}"#, "no owner").await.unwrap();

        let letters = list(&db, 10).await.unwrap();
        assert_eq!(letters.len(), 2);
        assert_eq!(letters[0].error, "no owner");
        assert_eq!(letters[0].phone_number_id, None);
        assert_eq!(letters[1].phone_number_id.as_deref(), Some("P1"));
        assert_eq!(letters[1].payload, r#"{"a":1}"#);

        assert_eq!(list(&db, 1).await.unwrap().len(), 1);
        db.close().await.unwrap();
    }
}
