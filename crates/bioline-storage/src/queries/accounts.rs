// SPDX-FileCopyrightText: 2026 Bioline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Messaging account lookup and first-claim-wins linking.

use bioline_core::BiolineError;
use rusqlite::{params, OptionalExtension, Row};

use crate::database::{map_tr_err, Database};
use crate::models::{ConnectRequest, MessagingAccount};

const ACCOUNT_COLUMNS: &str = "id, owner_user_id, phone_number_id, waba_id, label, access_token, \
                               token_expires_at, created_at, updated_at";

fn row_to_account(row: &Row<'_>) -> Result<MessagingAccount, rusqlite::Error> {
    Ok(MessagingAccount {
        id: row.get(0)?,
        owner_user_id: row.get(1)?,
        phone_number_id: row.get(2)?,
        waba_id: row.get(3)?,
        label: row.get(4)?,
        access_token: row.get(5)?,
        token_expires_at: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

/// Find an account by its platform phone number id, regardless of owner.
pub async fn find_by_phone_number_id(
    db: &Database,
    phone_number_id: &str,
) -> Result<Option<MessagingAccount>, BiolineError> {
    let phone_number_id = phone_number_id.to_string();
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            conn.query_row(
                &format!("SELECT {ACCOUNT_COLUMNS} FROM messaging_accounts WHERE phone_number_id = ?1"),
                params![phone_number_id],
                row_to_account,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Find an account only when `owner_user_id` owns it.
pub async fn find_owned(
    db: &Database,
    owner_user_id: &str,
    phone_number_id: &str,
) -> Result<Option<MessagingAccount>, BiolineError> {
    let owner_user_id = owner_user_id.to_string();
    let phone_number_id = phone_number_id.to_string();
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            conn.query_row(
                &format!(
                    "SELECT {ACCOUNT_COLUMNS} FROM messaging_accounts
                     WHERE phone_number_id = ?1 AND owner_user_id = ?2"
                ),
                params![phone_number_id, owner_user_id],
                row_to_account,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// All accounts owned by a user, ordered by label.
pub async fn list_owned(
    db: &Database,
    owner_user_id: &str,
) -> Result<Vec<MessagingAccount>, BiolineError> {
    let owner_user_id = owner_user_id.to_string();
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ACCOUNT_COLUMNS} FROM messaging_accounts
                 WHERE owner_user_id = ?1 ORDER BY label ASC, created_at ASC"
            ))?;
            let rows = stmt.query_map(params![owner_user_id], row_to_account)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Create or refresh an account and assign `owner_user_id` as its owner.
///
/// The upsert only touches a row that is unowned or already owned by the
/// same user, so a concurrent claim by someone else can never overwrite
/// the owner. When the conditional update matches nothing the line
/// belongs to another user.
pub async fn claim(
    db: &Database,
    owner_user_id: &str,
    request: &ConnectRequest,
) -> Result<MessagingAccount, BiolineError> {
    let owner = owner_user_id.to_string();
    let request = request.clone();
    let id = uuid::Uuid::new_v4().to_string();
    let now = db.next_timestamp();
    let label = request
        .label
        .clone()
        .filter(|l| !l.trim().is_empty())
        .unwrap_or_else(|| request.phone_number_id.clone());
    let phone_number_id = request.phone_number_id.clone();

    let claimed = db
        .connection()
        .call(move |conn| -> Result<Option<MessagingAccount>, rusqlite::Error> {
            let tx = conn.transaction()?;
            let changed = tx.execute(
                "INSERT INTO messaging_accounts
                    (id, owner_user_id, phone_number_id, waba_id, label, access_token,
                     token_expires_at, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
                 ON CONFLICT(phone_number_id) DO UPDATE SET
                    owner_user_id = COALESCE(messaging_accounts.owner_user_id, excluded.owner_user_id),
                    waba_id = COALESCE(excluded.waba_id, messaging_accounts.waba_id),
                    label = excluded.label,
                    access_token = excluded.access_token,
                    token_expires_at = excluded.token_expires_at,
                    updated_at = excluded.updated_at
                 WHERE messaging_accounts.owner_user_id IS NULL
                    OR messaging_accounts.owner_user_id = excluded.owner_user_id",
                params![
                    id,
                    owner,
                    request.phone_number_id,
                    request.waba_id,
                    label,
                    request.access_token,
                    request.token_expires_at,
                    now,
                ],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            let account = tx.query_row(
                &format!("SELECT {ACCOUNT_COLUMNS} FROM messaging_accounts WHERE phone_number_id = ?1"),
                params![request.phone_number_id],
                row_to_account,
            )?;
            tx.commit()?;
            Ok(Some(account))
        })
        .await
        .map_err(map_tr_err)?;

    claimed.ok_or(BiolineError::AccountClaimed { phone_number_id })
}
