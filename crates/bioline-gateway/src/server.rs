// SPDX-FileCopyrightText: 2026 Bioline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state.

use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use bioline_config::model::{BiolineConfig, ServerConfig};
use bioline_core::{AccountDirectory, AuthAdapter, BiolineError, ConversationStore, PluginAdapter};
use bioline_whatsapp::{GraphClient, OutboundSender, TemplateCatalog, WebhookIngestor};

use crate::auth::{auth_middleware, StaticTokenAuth};
use crate::handlers;

/// State behind the unauthenticated health endpoint.
#[derive(Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: std::time::Instant,
    /// Adapters whose health decides `ok` versus `degraded`.
    pub probes: Vec<Arc<dyn PluginAdapter>>,
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub accounts: Arc<dyn AccountDirectory>,
    pub store: Arc<dyn ConversationStore>,
    pub ingestor: Arc<WebhookIngestor>,
    pub sender: Arc<OutboundSender>,
    pub templates: Arc<TemplateCatalog>,
    /// Resolves bearer tokens for the API routes.
    pub auth: Arc<dyn AuthAdapter>,
    pub health: HealthState,
}

impl GatewayState {
    /// Wire every component against one storage backend.
    ///
    /// Callers come from `[auth.tokens]`; the storage backend is the only
    /// health probe.
    pub fn new<S>(config: &BiolineConfig, storage: Arc<S>) -> Result<Self, BiolineError>
    where
        S: AccountDirectory + ConversationStore + PluginAdapter + 'static,
    {
        let accounts: Arc<dyn AccountDirectory> = storage.clone();
        let store: Arc<dyn ConversationStore> = storage.clone();
        let probe: Arc<dyn PluginAdapter> = storage;
        let client = GraphClient::new(&config.whatsapp)?;

        Ok(Self {
            ingestor: Arc::new(WebhookIngestor::new(
                &config.whatsapp,
                Arc::clone(&accounts),
                Arc::clone(&store),
            )),
            sender: Arc::new(OutboundSender::new(
                Arc::clone(&accounts),
                Arc::clone(&store),
                client.clone(),
            )),
            templates: Arc::new(TemplateCatalog::new(Arc::clone(&accounts), client)),
            auth: Arc::new(StaticTokenAuth::new(config.auth.tokens.clone())),
            accounts,
            store,
            health: HealthState {
                start_time: std::time::Instant::now(),
                probes: vec![probe],
            },
        })
    }
}

/// Build the application router.
///
/// - GET /health, GET|POST /webhook (no caller auth)
/// - POST /send-message, GET /conversations, GET /messages, GET /templates,
///   POST /accounts/connect, GET /accounts (bearer auth)
pub fn build_router(state: GatewayState, body_limit_bytes: usize) -> Router {
    let auth_state = Arc::clone(&state.auth);

    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .route(
            "/webhook",
            get(handlers::get_webhook).post(handlers::post_webhook),
        )
        .with_state(state.clone());

    let api_routes = Router::new()
        .route("/send-message", post(handlers::post_send_message))
        .route("/conversations", get(handlers::get_conversations))
        .route("/messages", get(handlers::get_messages))
        .route("/templates", get(handlers::get_templates))
        .route("/accounts/connect", post(handlers::post_connect_account))
        .route("/accounts", get(handlers::get_accounts))
        .route_layer(axum_middleware::from_fn_with_state(
            auth_state,
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(DefaultBodyLimit::max(body_limit_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind and serve until `shutdown` resolves.
pub async fn start_server<F>(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: F,
) -> Result<(), BiolineError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(state, config.body_limit_bytes);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| BiolineError::Internal(format!("failed to bind {addr}: {e}")))?;

    tracing::info!("server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| BiolineError::Internal(format!("server error: {e}")))?;

    tracing::info!("server stopped");
    Ok(())
}
