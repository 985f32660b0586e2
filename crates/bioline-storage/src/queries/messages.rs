// SPDX-FileCopyrightText: 2026 Bioline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only message log and the conversation views derived from it.

use bioline_core::BiolineError;
use rusqlite::{params, Row};

use crate::database::{map_tr_err, Database};
use crate::models::{AppendOutcome, ConversationSummary, Direction, Message, NewMessage};

const MESSAGE_COLUMNS: &str = "id, owner_user_id, phone_number_id, contact, direction, \
                               message_type, text_body, template_name, template_language, \
                               external_message_id, raw_payload, created_at";

fn row_to_message(row: &Row<'_>) -> Result<Message, rusqlite::Error> {
    let direction: String = row.get(4)?;
    let direction = direction.parse::<Direction>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let raw: String = row.get(10)?;
    let raw_payload = serde_json::from_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(10, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(Message {
        id: row.get(0)?,
        owner_user_id: row.get(1)?,
        phone_number_id: row.get(2)?,
        contact: row.get(3)?,
        direction,
        message_type: row.get(5)?,
        text_body: row.get(6)?,
        template_name: row.get(7)?,
        template_language: row.get(8)?,
        external_message_id: row.get(9)?,
        raw_payload,
        created_at: row.get(11)?,
    })
}

/// Append one message.
///
/// An inbound message whose external id was already stored for the same
/// line is not inserted again; the original row comes back as
/// [`AppendOutcome::Duplicate`].
pub async fn append_message(
    db: &Database,
    msg: &NewMessage,
) -> Result<AppendOutcome, BiolineError> {
    let msg = msg.clone();
    let raw_payload = serde_json::to_string(&msg.raw_payload).map_err(BiolineError::storage)?;
    let created_at = db.next_timestamp();

    db.connection()
        .call(move |conn| -> Result<AppendOutcome, rusqlite::Error> {
            let inserted = conn.execute(
                "INSERT INTO messages
                    (owner_user_id, phone_number_id, contact, direction, message_type, text_body,
                     template_name, template_language, external_message_id, raw_payload, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                 ON CONFLICT DO NOTHING",
                params![
                    msg.owner_user_id,
                    msg.phone_number_id,
                    msg.contact,
                    msg.direction.to_string(),
                    msg.message_type,
                    msg.text_body,
                    msg.template_name,
                    msg.template_language,
                    msg.external_message_id,
                    raw_payload,
                    created_at,
                ],
            )?;

            if inserted == 1 {
                let id = conn.last_insert_rowid();
                let row = conn.query_row(
                    &format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1"),
                    params![id],
                    row_to_message,
                )?;
                return Ok(AppendOutcome::Inserted(row));
            }

            let row = conn.query_row(
                &format!(
                    "SELECT {MESSAGE_COLUMNS} FROM messages
                     WHERE phone_number_id = ?1 AND external_message_id = ?2
                       AND direction = 'inbound'"
                ),
                params![msg.phone_number_id, msg.external_message_id],
                row_to_message,
            )?;
            Ok(AppendOutcome::Duplicate(row))
        })
        .await
        .map_err(map_tr_err)
}

/// One summary per contact, most recently active first.
///
/// `last_text` comes from the newest message of the thread and is `None`
/// when that message has no text body.
pub async fn list_conversations(
    db: &Database,
    owner_user_id: &str,
    phone_number_id: &str,
    limit: u32,
) -> Result<Vec<ConversationSummary>, BiolineError> {
    let owner_user_id = owner_user_id.to_string();
    let phone_number_id = phone_number_id.to_string();
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT m.contact, m.created_at, m.text_body
                 FROM messages m
                 WHERE m.id = (
                     SELECT latest.id FROM messages latest
                     WHERE latest.owner_user_id = m.owner_user_id
                       AND latest.phone_number_id = m.phone_number_id
                       AND latest.contact = m.contact
                     ORDER BY latest.created_at DESC, latest.id DESC
                     LIMIT 1
                 )
                   AND m.owner_user_id = ?1
                   AND m.phone_number_id = ?2
                 ORDER BY m.created_at DESC, m.id DESC
                 LIMIT ?3",
            )?;
            let rows = stmt.query_map(params![owner_user_id, phone_number_id, limit], |row| {
                Ok(ConversationSummary {
                    contact: row.get(0)?,
                    last_message_at: row.get(1)?,
                    last_text: row.get(2)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

/// The `limit` most recent messages of one thread, returned oldest first.
pub async fn list_messages(
    db: &Database,
    owner_user_id: &str,
    phone_number_id: &str,
    contact: &str,
    limit: u32,
) -> Result<Vec<Message>, BiolineError> {
    let owner_user_id = owner_user_id.to_string();
    let phone_number_id = phone_number_id.to_string();
    let contact = contact.to_string();
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages
                 WHERE owner_user_id = ?1 AND phone_number_id = ?2 AND contact = ?3
                 ORDER BY created_at DESC, id DESC
                 LIMIT ?4"
            ))?;
            let rows = stmt.query_map(
                params![owner_user_id, phone_number_id, contact, limit],
                row_to_message,
            )?;
            let mut messages = rows.collect::<Result<Vec<_>, _>>()?;
            messages.reverse();
            Ok(messages)
        })
        .await
        .map_err(map_tr_err)
}
