// SPDX-FileCopyrightText: 2026 Bioline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message template listing for a linked line's business account.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use bioline_core::types::UserId;
use bioline_core::{AccountDirectory, BiolineError};

use crate::client::GraphClient;

/// Lists templates through the owner's credential.
pub struct TemplateCatalog {
    accounts: Arc<dyn AccountDirectory>,
    client: GraphClient,
}

impl TemplateCatalog {
    pub fn new(accounts: Arc<dyn AccountDirectory>, client: GraphClient) -> Self {
        Self { accounts, client }
    }

    /// Templates for the business account behind `phone_number_id`.
    ///
    /// The platform's `data` array is returned as is; a response without
    /// one yields no templates.
    pub async fn list(
        &self,
        caller: &UserId,
        phone_number_id: &str,
    ) -> Result<Vec<Value>, BiolineError> {
        let account = self
            .accounts
            .find_owned(caller.as_str(), phone_number_id)
            .await?
            .ok_or(BiolineError::AccountNotFound)?;
        let waba_id = account.waba_id.as_deref().ok_or_else(|| {
            BiolineError::Validation(
                "account has no business account id; reconnect it with waba_id to list templates"
                    .into(),
            )
        })?;

        let response = self.client.list_templates(waba_id, &account.access_token).await?;
        let templates = match response {
            Value::Object(mut body) => match body.remove("data") {
                Some(Value::Array(data)) => data,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };
        debug!(phone_number_id, count = templates.len(), "templates listed");
        Ok(templates)
    }
}
