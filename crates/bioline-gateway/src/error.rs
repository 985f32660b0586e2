// SPDX-FileCopyrightText: 2026 Bioline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping from [`BiolineError`] to HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use bioline_core::BiolineError;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error description.
    pub error: String,
}

/// Handler error carrying a [`BiolineError`].
///
/// Client errors echo the error message. Server errors are logged in full
/// and answered with a generic message so storage and platform details
/// never reach the caller.
#[derive(Debug)]
pub struct ApiError(pub BiolineError);

impl From<BiolineError> for ApiError {
    fn from(err: BiolineError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            BiolineError::Validation(_) | BiolineError::MalformedPayload(_) => {
                StatusCode::BAD_REQUEST
            }
            BiolineError::Unauthorized => StatusCode::UNAUTHORIZED,
            BiolineError::SignatureInvalid => StatusCode::FORBIDDEN,
            BiolineError::AccountNotFound => StatusCode::NOT_FOUND,
            BiolineError::AccountClaimed { .. } => StatusCode::CONFLICT,
            BiolineError::Upstream { .. }
            | BiolineError::Timeout { .. }
            | BiolineError::Storage { .. }
            | BiolineError::Config(_)
            | BiolineError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match &self.0 {
            BiolineError::Upstream { .. } | BiolineError::Timeout { .. } => {
                "failed to send message via messaging platform".to_string()
            }
            BiolineError::Storage { .. } | BiolineError::Config(_) | BiolineError::Internal(_) => {
                "internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(kind = self.0.kind(), error = %self.0, "request failed");
        } else {
            tracing::debug!(kind = self.0.kind(), error = %self.0, "request rejected");
        }
        let body = ErrorResponse {
            error: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}
