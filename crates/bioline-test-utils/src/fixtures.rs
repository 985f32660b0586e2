// SPDX-FileCopyrightText: 2026 Bioline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Payload builders shaped like real platform deliveries.

use bioline_core::ConnectRequest;
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;

/// `sha256=<hex>` header value for `body` under `secret`.
pub fn sign_body(body: &[u8], secret: &str) -> String {
    let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts any key length");
    mac.update(body);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

/// A delivery carrying one text message.
pub fn text_message_payload(phone_number_id: &str, from: &str, wamid: &str, body: &str) -> Value {
    delivery(phone_number_id, vec![json!({
        "from": from,
        "id": wamid,
        "timestamp": "1735689600",
        "type": "text",
        "text": { "body": body }
    })])
}

/// A delivery for one line with arbitrary message objects.
pub fn delivery(phone_number_id: &str, messages: Vec<Value>) -> Value {
    json!({
        "object": "whatsapp_business_account",
        "entry": [{
            "id": "102290129340398",
            "changes": [{
                "field": "messages",
                "value": {
                    "messaging_product": "whatsapp",
                    "metadata": {
                        "display_phone_number": "15550783881",
                        "phone_number_id": phone_number_id
                    },
                    "messages": messages
                }
            }]
        }]
    })
}

/// Connect request with a business account id and a per-line token.
pub fn connect_request(phone_number_id: &str) -> ConnectRequest {
    ConnectRequest {
        phone_number_id: phone_number_id.to_string(),
        waba_id: Some("waba-1".to_string()),
        label: Some(format!("Line {phone_number_id}")),
        access_token: format!("token-{phone_number_id}"),
        token_expires_at: None,
    }
}
