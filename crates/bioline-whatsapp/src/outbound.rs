// SPDX-FileCopyrightText: 2026 Bioline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound text and template sends through a user's linked line.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};

use bioline_core::types::{message_type, Direction, Message, NewMessage, UserId};
use bioline_core::{AccountDirectory, BiolineError, ConversationStore};

use crate::client::GraphClient;
use crate::recording;

/// Body of a send request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SendRequest {
    #[serde(default)]
    pub phone_number_id: String,
    #[serde(default)]
    pub to: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub template: Option<TemplateRef>,
}

/// Template selector within a send request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplateRef {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

/// Validated message content.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Content {
    Text(String),
    Template { name: String, language: String },
}

impl Content {
    fn from_request(request: &SendRequest) -> Result<Self, BiolineError> {
        match request.kind.as_str() {
            message_type::TEXT => {
                let body = request
                    .text
                    .as_deref()
                    .filter(|t| !t.trim().is_empty())
                    .ok_or_else(|| BiolineError::Validation("text body is required".into()))?;
                Ok(Self::Text(body.to_string()))
            }
            message_type::TEMPLATE => {
                let template = request.template.as_ref();
                let field = |f: Option<&String>| f.map(|s| s.trim()).filter(|s| !s.is_empty()).map(str::to_string);
                let name = field(template.and_then(|t| t.name.as_ref()))
                    .ok_or_else(|| BiolineError::Validation("template name is required".into()))?;
                let language = field(template.and_then(|t| t.language.as_ref())).ok_or_else(|| {
                    BiolineError::Validation("template language is required".into())
                })?;
                Ok(Self::Template { name, language })
            }
            other => Err(BiolineError::Validation(format!(
                "unsupported message type `{other}`, expected text or template"
            ))),
        }
    }

    fn envelope(&self, to: &str) -> Value {
        match self {
            Self::Text(body) => json!({
                "messaging_product": "whatsapp",
                "recipient_type": "individual",
                "to": to,
                "type": "text",
                "text": { "preview_url": false, "body": body },
            }),
            Self::Template { name, language } => json!({
                "messaging_product": "whatsapp",
                "recipient_type": "individual",
                "to": to,
                "type": "template",
                "template": { "name": name, "language": { "code": language } },
            }),
        }
    }
}

/// Result of a successful send.
#[derive(Debug, Clone)]
pub struct SendReceipt {
    /// Raw platform response.
    pub platform_response: Value,
    /// The journaled outbound row.
    pub message: Message,
}

/// Sends messages on behalf of users and journals what was sent.
pub struct OutboundSender {
    accounts: Arc<dyn AccountDirectory>,
    store: Arc<dyn ConversationStore>,
    client: GraphClient,
}

impl OutboundSender {
    pub fn new(
        accounts: Arc<dyn AccountDirectory>,
        store: Arc<dyn ConversationStore>,
        client: GraphClient,
    ) -> Self {
        Self {
            accounts,
            store,
            client,
        }
    }

    /// Send one message through `request.phone_number_id`.
    ///
    /// The line must belong to `caller`; otherwise the result is
    /// [`BiolineError::AccountNotFound`] whatever the payload. No row is
    /// written unless the platform accepted the message.
    pub async fn send(
        &self,
        caller: &UserId,
        request: &SendRequest,
    ) -> Result<SendReceipt, BiolineError> {
        if request.phone_number_id.trim().is_empty() {
            return Err(BiolineError::Validation("phone_number_id is required".into()));
        }
        let account = self
            .accounts
            .find_owned(caller.as_str(), &request.phone_number_id)
            .await?
            .ok_or(BiolineError::AccountNotFound)?;

        let to = request.to.trim();
        if to.is_empty() {
            return Err(BiolineError::Validation("recipient `to` is required".into()));
        }
        let content = Content::from_request(request)?;

        let response = match self
            .client
            .send_message(&account.phone_number_id, &account.access_token, &content.envelope(to))
            .await
        {
            Ok(response) => response,
            Err(e) => {
                recording::record_send(e.kind());
                return Err(e);
            }
        };
        recording::record_send("sent");

        let external_message_id = response
            .pointer("/messages/0/id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_string);

        let (kind, text_body, template_name, template_language) = match &content {
            Content::Text(body) => (message_type::TEXT, Some(body.clone()), None, None),
            Content::Template { name, language } => (
                message_type::TEMPLATE,
                None,
                Some(name.clone()),
                Some(language.clone()),
            ),
        };
        let outbound = NewMessage {
            owner_user_id: caller.as_str().to_string(),
            phone_number_id: account.phone_number_id.clone(),
            contact: to.to_string(),
            direction: Direction::Outbound,
            message_type: kind.to_string(),
            text_body,
            template_name,
            template_language,
            external_message_id,
            raw_payload: response.clone(),
        };

        let message = self
            .store
            .append_message(&outbound)
            .await
            .inspect_err(|e| {
                error!(phone_number_id = %account.phone_number_id, error = %e, "message sent but journaling failed");
            })?
            .into_message();
        recording::record_stored(Direction::Outbound);
        info!(
            phone_number_id = %account.phone_number_id,
            message_type = kind,
            external_id = ?message.external_message_id,
            "outbound message sent"
        );

        Ok(SendReceipt {
            platform_response: response,
            message,
        })
    }
}
