// SPDX-FileCopyrightText: 2026 Bioline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers.
//!
//! Webhook routes answer the messaging platform; every other route except
//! `/health` runs behind [`crate::auth::auth_middleware`] and sees the
//! caller as an `Extension<UserId>`.

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use bioline_core::types::{ConnectRequest, ConversationSummary, Message, MessagingAccount, UserId};
use bioline_core::{BiolineError, HealthStatus};
use bioline_whatsapp::signature::SIGNATURE_HEADER;
use bioline_whatsapp::{HandshakeOutcome, HandshakeQuery, SendRequest};

use crate::error::ApiError;
use crate::server::GatewayState;

/// Page size used when `limit` is absent or unparseable.
pub const DEFAULT_LIMIT: u32 = 50;
/// Largest page size a caller can ask for.
pub const MAX_LIMIT: u32 = 200;

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok` or `degraded`.
    pub status: String,
    /// Binary version.
    pub version: String,
    /// Seconds since the server started.
    pub uptime_secs: u64,
}

/// Query for GET /conversations.
#[derive(Debug, Default, Deserialize)]
pub struct ConversationsQuery {
    #[serde(default)]
    pub phone_number_id: Option<String>,
    #[serde(default)]
    pub limit: Option<String>,
}

/// Query for GET /messages.
#[derive(Debug, Default, Deserialize)]
pub struct MessagesQuery {
    #[serde(default)]
    pub phone_number_id: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub limit: Option<String>,
}

/// Query for GET /templates.
#[derive(Debug, Default, Deserialize)]
pub struct TemplatesQuery {
    #[serde(default)]
    pub phone_number_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ConversationsResponse {
    pub conversations: Vec<ConversationSummary>,
}

#[derive(Debug, Serialize)]
pub struct MessagesResponse {
    pub messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
pub struct TemplatesResponse {
    pub templates: Vec<Value>,
}

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub account: MessagingAccount,
}

#[derive(Debug, Serialize)]
pub struct AccountsResponse {
    pub accounts: Vec<MessagingAccount>,
}

/// Parse and clamp a `limit` query value into `1..=MAX_LIMIT`.
pub fn clamp_limit(raw: Option<&str>) -> u32 {
    match raw.map(str::trim).and_then(|s| s.parse::<i64>().ok()) {
        Some(n) => n.clamp(1, i64::from(MAX_LIMIT)) as u32,
        None => DEFAULT_LIMIT,
    }
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, ApiError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError(BiolineError::Validation(format!("{name} is required"))))
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    ApiError(BiolineError::Validation(rejection.body_text()))
}

/// GET /webhook
///
/// Subscription handshake. The challenge is echoed as plain text.
pub async fn get_webhook(
    State(state): State<GatewayState>,
    Query(query): Query<HandshakeQuery>,
) -> Response {
    let outcome = state.ingestor.handshake(&query);
    let status =
        StatusCode::from_u16(outcome.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    match outcome {
        HandshakeOutcome::Accepted(challenge) => (status, challenge).into_response(),
        HandshakeOutcome::MissingParameter => (status, "missing parameter").into_response(),
        HandshakeOutcome::Forbidden => (status, "forbidden").into_response(),
        HandshakeOutcome::NotConfigured => (status, "verify token not configured").into_response(),
    }
}

/// POST /webhook
///
/// The body is taken as raw bytes so the signature covers exactly what was
/// sent. Anything past the signature and JSON checks answers 200.
pub async fn post_webhook(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());
    state.ingestor.receive(&body, signature).await?;
    Ok(Json(json!({ "received": true })))
}

/// GET /health
///
/// Unauthenticated. Answers 503 when any probe reports anything but healthy.
pub async fn get_health(State(state): State<GatewayState>) -> Response {
    let mut healthy = true;
    for probe in &state.health.probes {
        match probe.health_check().await {
            Ok(HealthStatus::Healthy) => {}
            Ok(other) => {
                tracing::warn!(adapter = probe.name(), status = ?other, "health probe not healthy");
                healthy = false;
            }
            Err(e) => {
                tracing::warn!(adapter = probe.name(), error = %e, "health probe failed");
                healthy = false;
            }
        }
    }

    let body = HealthResponse {
        status: if healthy { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.health.start_time.elapsed().as_secs(),
    };
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body)).into_response()
}

/// POST /send-message
pub async fn post_send_message(
    State(state): State<GatewayState>,
    Extension(caller): Extension<UserId>,
    body: Result<Json<SendRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = body.map_err(json_rejection)?;
    let receipt = state.sender.send(&caller, &request).await?;
    Ok(Json(json!({
        "success": true,
        "metaResponse": receipt.platform_response,
    })))
}

/// GET /conversations
pub async fn get_conversations(
    State(state): State<GatewayState>,
    Extension(caller): Extension<UserId>,
    Query(query): Query<ConversationsQuery>,
) -> Result<Json<ConversationsResponse>, ApiError> {
    let pnid = required(&query.phone_number_id, "phone_number_id")?;
    let limit = clamp_limit(query.limit.as_deref());
    ensure_owned(&state, &caller, pnid).await?;

    let conversations = state
        .store
        .list_conversations(caller.as_str(), pnid, limit)
        .await?;
    Ok(Json(ConversationsResponse { conversations }))
}

/// GET /messages
pub async fn get_messages(
    State(state): State<GatewayState>,
    Extension(caller): Extension<UserId>,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<MessagesResponse>, ApiError> {
    let pnid = required(&query.phone_number_id, "phone_number_id")?;
    let contact = required(&query.contact, "contact")?;
    let limit = clamp_limit(query.limit.as_deref());
    ensure_owned(&state, &caller, pnid).await?;

    let messages = state
        .store
        .list_messages(caller.as_str(), pnid, contact, limit)
        .await?;
    Ok(Json(MessagesResponse { messages }))
}

/// GET /templates
pub async fn get_templates(
    State(state): State<GatewayState>,
    Extension(caller): Extension<UserId>,
    Query(query): Query<TemplatesQuery>,
) -> Result<Json<TemplatesResponse>, ApiError> {
    let pnid = required(&query.phone_number_id, "phone_number_id")?;
    let templates = state.templates.list(&caller, pnid).await?;
    Ok(Json(TemplatesResponse { templates }))
}

/// POST /accounts/connect
pub async fn post_connect_account(
    State(state): State<GatewayState>,
    Extension(caller): Extension<UserId>,
    body: Result<Json<ConnectRequest>, JsonRejection>,
) -> Result<Json<AccountResponse>, ApiError> {
    let Json(mut request) = body.map_err(json_rejection)?;
    request.phone_number_id = request.phone_number_id.trim().to_string();
    if request.phone_number_id.is_empty() {
        return Err(BiolineError::Validation("phone_number_id is required".into()).into());
    }
    if request.access_token.trim().is_empty() {
        return Err(BiolineError::Validation("access_token is required".into()).into());
    }

    let account = state.accounts.claim(caller.as_str(), &request).await?;
    tracing::info!(
        user = caller.as_str(),
        phone_number_id = %account.phone_number_id,
        "messaging account linked"
    );
    Ok(Json(AccountResponse { account }))
}

/// GET /accounts
pub async fn get_accounts(
    State(state): State<GatewayState>,
    Extension(caller): Extension<UserId>,
) -> Result<Json<AccountsResponse>, ApiError> {
    let accounts = state.accounts.list_owned(caller.as_str()).await?;
    Ok(Json(AccountsResponse { accounts }))
}

async fn ensure_owned(state: &GatewayState, caller: &UserId, pnid: &str) -> Result<(), ApiError> {
    state
        .accounts
        .find_owned(caller.as_str(), pnid)
        .await?
        .map(|_| ())
        .ok_or(ApiError(BiolineError::AccountNotFound))
}
