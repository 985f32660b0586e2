// SPDX-FileCopyrightText: 2026 Bioline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Caller authentication for the API routes.
//!
//! Identity itself is issued elsewhere; this crate only maps a presented
//! bearer token to a user id. With no tokens configured every request is
//! rejected (fail-closed).

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use bioline_core::secret::constant_time_eq;
use bioline_core::types::{AdapterType, AuthIdentity, AuthToken, HealthStatus, UserId};
use bioline_core::{AuthAdapter, BiolineError, PluginAdapter};

use crate::error::ApiError;

/// Auth adapter backed by the static `[auth.tokens]` table.
#[derive(Clone)]
pub struct StaticTokenAuth {
    tokens: BTreeMap<String, String>,
}

impl std::fmt::Debug for StaticTokenAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenAuth")
            .field("tokens", &format!("[{} redacted]", self.tokens.len()))
            .finish()
    }
}

impl StaticTokenAuth {
    pub fn new(tokens: BTreeMap<String, String>) -> Self {
        Self { tokens }
    }
}

#[async_trait]
impl PluginAdapter for StaticTokenAuth {
    fn name(&self) -> &str {
        "static-token"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Auth
    }

    async fn health_check(&self) -> Result<HealthStatus, BiolineError> {
        if self.tokens.is_empty() {
            return Ok(HealthStatus::Degraded("no API tokens configured".into()));
        }
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), BiolineError> {
        Ok(())
    }
}

#[async_trait]
impl AuthAdapter for StaticTokenAuth {
    async fn authenticate(&self, token: AuthToken) -> Result<AuthIdentity, BiolineError> {
        if self.tokens.is_empty() {
            tracing::error!("no API tokens configured -- rejecting request");
            return Err(BiolineError::Unauthorized);
        }
        // Compare against every entry so timing does not reveal a prefix match.
        let mut matched = None;
        for (candidate, user) in &self.tokens {
            if constant_time_eq(candidate.as_bytes(), token.0.as_bytes()) {
                matched = Some(user);
            }
        }
        matched
            .map(|user| AuthIdentity {
                user_id: UserId(user.clone()),
            })
            .ok_or(BiolineError::Unauthorized)
    }
}

/// Middleware that resolves `Authorization: Bearer <token>` to a [`UserId`]
/// and stores it in the request extensions.
pub async fn auth_middleware(
    State(auth): State<Arc<dyn AuthAdapter>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| AuthToken(t.trim().to_string()));

    let Some(token) = token else {
        return ApiError(BiolineError::Unauthorized).into_response();
    };

    match auth.authenticate(token).await {
        Ok(identity) => {
            request.extensions_mut().insert(identity.user_id);
            next.run(request).await
        }
        Err(e) => ApiError(e).into_response(),
    }
}
