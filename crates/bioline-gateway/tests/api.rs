// SPDX-FileCopyrightText: 2026 Bioline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Router-level tests: requests go through the full middleware stack
//! against a real temp database and a mock Graph API.

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, header as header_eq, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bioline_gateway::{build_router, GatewayState};
use bioline_test_utils::fixtures::{sign_body, text_message_payload};
use bioline_test_utils::TestHarness;

const SECRET: &str = "app-secret";
const ALICE: &str = "alice-token";
const BOB: &str = "bob-token";

struct App {
    router: Router,
    harness: TestHarness,
}

async fn app(api_base_url: Option<&str>) -> App {
    let mut builder = TestHarness::builder()
        .with_app_secret(SECRET)
        .with_verify_token("verify-me")
        .with_caller(ALICE, "alice")
        .with_caller(BOB, "bob");
    if let Some(url) = api_base_url {
        builder = builder.with_api_base_url(url);
    }
    let harness = builder.build().await.unwrap();
    let state = GatewayState::new(harness.config(), harness.storage()).unwrap();
    App {
        router: build_router(state, 64 * 1024),
        harness,
    }
}

async fn call(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, body)
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn post_json(uri: &str, token: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn signed_webhook(payload: &Value) -> Request<Body> {
    let body = payload.to_string();
    Request::builder()
        .method(Method::POST)
        .uri("/webhook")
        .header("x-hub-signature-256", sign_body(body.as_bytes(), SECRET))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap()
}

// --- webhook ---

#[tokio::test]
async fn inbound_text_for_known_line_is_stored() {
    let app = app(None).await;
    app.harness.link_account("alice", "P1").await.unwrap();

    let payload = text_message_payload("P1", "5215500000000", "wamid.A", "hola");
    let (status, body) = call(&app.router, signed_webhook(&payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "received": true }));

    let thread = app.harness.thread("alice", "P1", "5215500000000").await.unwrap();
    assert_eq!(thread.len(), 1);
    assert_eq!(thread[0].text_body.as_deref(), Some("hola"));
    assert_eq!(thread[0].direction.to_string(), "inbound");
}

#[tokio::test]
async fn inbound_for_unknown_line_is_acknowledged_and_dropped() {
    let app = app(None).await;
    app.harness.link_account("alice", "P1").await.unwrap();

    let payload = text_message_payload("P-unknown", "5215500000000", "wamid.A", "hola");
    let (status, body) = call(&app.router, signed_webhook(&payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "received": true }));
    assert!(app
        .harness
        .thread("alice", "P-unknown", "5215500000000")
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn redelivered_webhook_stores_one_row() {
    let app = app(None).await;
    app.harness.link_account("alice", "P1").await.unwrap();
    let payload = text_message_payload("P1", "C1", "wamid.same", "hi");

    for _ in 0..3 {
        let (status, _) = call(&app.router, signed_webhook(&payload)).await;
        assert_eq!(status, StatusCode::OK);
    }
    assert_eq!(app.harness.thread("alice", "P1", "C1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn bad_signature_is_forbidden_and_stores_nothing() {
    let app = app(None).await;
    app.harness.link_account("alice", "P1").await.unwrap();
    let body = text_message_payload("P1", "C1", "wamid.A", "hi").to_string();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/webhook")
        .header("x-hub-signature-256", sign_body(body.as_bytes(), "wrong-secret"))
        .body(Body::from(body.clone()))
        .unwrap();
    let (status, _) = call(&app.router, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let unsigned = Request::builder()
        .method(Method::POST)
        .uri("/webhook")
        .body(Body::from(body))
        .unwrap();
    let (status, _) = call(&app.router, unsigned).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    assert!(app.harness.thread("alice", "P1", "C1").await.unwrap().is_empty());
}

#[tokio::test]
async fn non_json_body_is_bad_request() {
    let app = app(None).await;
    let body = b"not json at all".to_vec();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/webhook")
        .header("x-hub-signature-256", sign_body(&body, SECRET))
        .body(Body::from(body))
        .unwrap();
    let (status, body) = call(&app.router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("malformed"));
}

#[tokio::test]
async fn handshake_echoes_challenge_or_rejects() {
    let app = app(None).await;

    let (status, body) = call(
        &app.router,
        get(
            "/webhook?hub.mode=subscribe&hub.verify_token=verify-me&hub.challenge=12345",
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(12345));

    let (status, _) = call(
        &app.router,
        get("/webhook?hub.mode=subscribe&hub.verify_token=nope&hub.challenge=1", None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(
        &app.router,
        get("/webhook?hub.mode=subscribe&hub.challenge=1", None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn handshake_without_configured_token_is_server_error() {
    let harness = TestHarness::builder().build().await.unwrap();
    let state = GatewayState::new(harness.config(), harness.storage()).unwrap();
    let router = build_router(state, 1024);
    let (status, _) = call(
        &router,
        get("/webhook?hub.mode=subscribe&hub.verify_token=x&hub.challenge=1", None),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

// --- auth ---

#[tokio::test]
async fn api_routes_require_known_bearer_token() {
    let app = app(None).await;

    let (status, body) = call(&app.router, get("/accounts", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = call(&app.router, get("/accounts", Some("forged"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(&app.router, get("/conversations?phone_number_id=P1", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_is_public() {
    let app = app(None).await;
    let (status, body) = call(&app.router, get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}

// --- send ---

#[tokio::test]
async fn empty_text_is_rejected_before_any_upstream_call() {
    let graph = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&graph)
        .await;
    let app = app(Some(&graph.uri())).await;
    app.harness.link_account("alice", "P1").await.unwrap();

    let request = json!({ "phone_number_id": "P1", "to": "C1", "type": "text", "text": "" });
    let (status, body) = call(&app.router, post_json("/send-message", ALICE, &request)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert!(app.harness.thread("alice", "P1", "C1").await.unwrap().is_empty());
}

#[tokio::test]
async fn template_send_journals_outbound_row() {
    let graph = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v21.0/P1/messages"))
        .and(header_eq("authorization", "Bearer token-P1"))
        .and(body_partial_json(json!({
            "type": "template",
            "template": { "name": "welcome", "language": { "code": "es_MX" } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messaging_product": "whatsapp",
            "messages": [{ "id": "wamid.OUT1" }]
        })))
        .expect(1)
        .mount(&graph)
        .await;
    let app = app(Some(&graph.uri())).await;
    app.harness.link_account("alice", "P1").await.unwrap();

    let request = json!({
        "phone_number_id": "P1",
        "to": "5215500000000",
        "type": "template",
        "template": { "name": "welcome", "language": "es_MX" }
    });
    let (status, body) = call(&app.router, post_json("/send-message", ALICE, &request)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["metaResponse"]["messages"][0]["id"], "wamid.OUT1");

    let thread = app.harness.thread("alice", "P1", "5215500000000").await.unwrap();
    assert_eq!(thread.len(), 1);
    assert_eq!(thread[0].message_type, "template");
    assert_eq!(thread[0].template_name.as_deref(), Some("welcome"));
    assert_eq!(thread[0].template_language.as_deref(), Some("es_MX"));
    assert_eq!(thread[0].external_message_id.as_deref(), Some("wamid.OUT1"));
}

#[tokio::test]
async fn sending_through_another_users_line_is_not_found() {
    let graph = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&graph)
        .await;
    let app = app(Some(&graph.uri())).await;
    app.harness.link_account("bob", "P2").await.unwrap();

    for request in [
        json!({ "phone_number_id": "P2", "to": "C1", "type": "text", "text": "hi" }),
        json!({ "phone_number_id": "P2", "to": "", "type": "bogus" }),
    ] {
        let (status, body) = call(&app.router, post_json("/send-message", ALICE, &request)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "messaging account not found");
    }
}

#[tokio::test]
async fn upstream_failure_is_generic_server_error() {
    let graph = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "error": { "message": "token expired for 5215500000000" } })),
        )
        .mount(&graph)
        .await;
    let app = app(Some(&graph.uri())).await;
    app.harness.link_account("alice", "P1").await.unwrap();

    let request = json!({ "phone_number_id": "P1", "to": "C1", "type": "text", "text": "hi" });
    let (status, body) = call(&app.router, post_json("/send-message", ALICE, &request)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "failed to send message via messaging platform");
    assert!(app.harness.thread("alice", "P1", "C1").await.unwrap().is_empty());
}

#[tokio::test]
async fn invalid_json_body_is_bad_request() {
    let app = app(None).await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/send-message")
        .header(header::AUTHORIZATION, format!("Bearer {ALICE}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ nope"))
        .unwrap();
    let (status, _) = call(&app.router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// --- reads ---

#[tokio::test]
async fn conversations_are_ordered_by_most_recent_message() {
    let app = app(None).await;
    app.harness.link_account("alice", "P1").await.unwrap();

    let deliveries = [
        ("C1", "w1"),
        ("C2", "w2"),
        ("C2", "w3"),
        ("C3", "w4"),
        ("C1", "w5"),
        ("C1", "w6"),
        ("C2", "w7"),
    ];
    for (contact, wamid) in deliveries {
        let payload = text_message_payload("P1", contact, wamid, &format!("text {wamid}"));
        let (status, _) = call(&app.router, signed_webhook(&payload)).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = call(
        &app.router,
        get("/conversations?phone_number_id=P1", Some(ALICE)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let conversations = body["conversations"].as_array().unwrap();
    let contacts: Vec<_> = conversations
        .iter()
        .map(|c| c["contact"].as_str().unwrap())
        .collect();
    assert_eq!(contacts, vec!["C2", "C1", "C3"]);
    assert_eq!(conversations[0]["lastText"], "text w7");
    assert!(conversations[0]["lastMessageAt"].is_string());
}

#[tokio::test]
async fn messages_are_oldest_first_and_limit_is_clamped() {
    let app = app(None).await;
    app.harness.link_account("alice", "P1").await.unwrap();
    for i in 0..4 {
        let payload = text_message_payload("P1", "C1", &format!("w{i}"), &format!("m{i}"));
        call(&app.router, signed_webhook(&payload)).await;
    }

    let (status, body) = call(
        &app.router,
        get("/messages?phone_number_id=P1&contact=C1&limit=2", Some(ALICE)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let texts: Vec<_> = body["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["text_body"].as_str().unwrap())
        .collect();
    assert_eq!(texts, vec!["m2", "m3"]);

    let (_, body) = call(
        &app.router,
        get("/messages?phone_number_id=P1&contact=C1&limit=0", Some(ALICE)),
    )
    .await;
    assert_eq!(body["messages"].as_array().unwrap().len(), 1);

    let (_, body) = call(
        &app.router,
        get("/messages?phone_number_id=P1&contact=C1&limit=100000", Some(ALICE)),
    )
    .await;
    assert_eq!(body["messages"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn reads_of_foreign_line_are_not_found() {
    let app = app(None).await;
    app.harness.link_account("bob", "P2").await.unwrap();

    let (status, _) = call(
        &app.router,
        get("/conversations?phone_number_id=P2", Some(ALICE)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(
        &app.router,
        get("/messages?phone_number_id=P2&contact=C1", Some(ALICE)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&app.router, get("/messages?phone_number_id=P2", Some(BOB))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// --- accounts and templates ---

#[tokio::test]
async fn connect_then_list_accounts_without_credentials() {
    let app = app(None).await;
    let request = json!({
        "phone_number_id": "P1",
        "waba_id": "waba-9",
        "label": "Front desk",
        "access_token": "secret-credential"
    });
    let (status, body) = call(&app.router, post_json("/accounts/connect", ALICE, &request)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["account"]["phone_number_id"], "P1");
    assert_eq!(body["account"]["owner_user_id"], "alice");
    assert!(!body.to_string().contains("secret-credential"));

    let (status, body) = call(&app.router, get("/accounts", Some(ALICE))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["accounts"].as_array().unwrap().len(), 1);
    assert!(!body.to_string().contains("secret-credential"));

    let (_, body) = call(&app.router, get("/accounts", Some(BOB))).await;
    assert!(body["accounts"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn connecting_a_claimed_line_conflicts() {
    let app = app(None).await;
    app.harness.link_account("alice", "P1").await.unwrap();

    let request = json!({ "phone_number_id": "P1", "access_token": "bobs" });
    let (status, body) = call(&app.router, post_json("/accounts/connect", BOB, &request)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("already linked"));

    let (status, _) = call(
        &app.router,
        post_json("/accounts/connect", BOB, &json!({ "phone_number_id": " ", "access_token": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn templates_are_listed_through_owner_credential() {
    let graph = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v21.0/waba-1/message_templates"))
        .and(header_eq("authorization", "Bearer token-P1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "name": "welcome", "language": "es_MX", "status": "APPROVED", "category": "UTILITY" }
            ]
        })))
        .expect(1)
        .mount(&graph)
        .await;
    let app = app(Some(&graph.uri())).await;
    app.harness.link_account("alice", "P1").await.unwrap();

    let (status, body) = call(&app.router, get("/templates?phone_number_id=P1", Some(ALICE))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["templates"][0]["name"], "welcome");

    let (status, _) = call(&app.router, get("/templates?phone_number_id=P1", Some(BOB))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
