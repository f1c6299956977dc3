//! API routing through the full HTTP stack.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use base64::{engine::general_purpose::STANDARD, Engine};
use edge_server::config::EdgeConfig;
use edge_server::http::Stage;
use edge_server::routing::{json, unauthorized, write_json};
use edge_server::security::RateLimitHook;
use edge_server::{ApiRequest, Dispatcher, EdgeServer, HandlerResult};
use serde_json::{json, Value};

mod common;
use common::{get, post, send};

async fn health(_req: ApiRequest) -> HandlerResult {
    Ok(json(json!({ "status": "ok" })))
}

async fn echo(mut req: ApiRequest) -> HandlerResult {
    let body: Value = req.parse_body().await?;
    Ok(json(body))
}

async fn explode(_req: ApiRequest) -> HandlerResult {
    panic!("secret internal detail")
}

async fn whoami(req: ApiRequest) -> HandlerResult {
    match req.basic_auth() {
        Some(creds) => Ok(json(json!({ "user": creds.username, "password": creds.password }))),
        None => Ok(unauthorized(Some("edge"), None)),
    }
}

async fn token(req: ApiRequest) -> HandlerResult {
    match req.bearer_auth() {
        Some(token) => Ok(json(json!({ "token": token }))),
        None => Ok(unauthorized(None, Some(json!({ "error": "token required" }).into()))),
    }
}

/// Two failed attempts per minute; a correct password clears the counter.
async fn login(mut req: ApiRequest) -> HandlerResult {
    let body: Value = req.parse_body().await?;
    let key = "login:alice";
    if body["password"] == "correct" {
        req.rate_limiter().reset(key);
        return Ok(json(json!({ "ok": true })));
    }
    if !req.rate_limiter().check(key, 2, Duration::from_secs(60)) {
        return Ok(write_json(
            json!({ "error": "Too many attempts" }),
            StatusCode::TOO_MANY_REQUESTS,
            None,
        ));
    }
    Ok(write_json(json!({ "ok": false }), StatusCode::UNAUTHORIZED, None))
}

async fn report(req: ApiRequest) -> HandlerResult {
    let rows: Vec<Value> = (0..200).map(|i| json!({ "row": i, "label": "entry" })).collect();
    Ok(req.json_compressed(json!({ "rows": rows })).await)
}

fn server_with(config: &EdgeConfig, configure: impl FnOnce(&mut Dispatcher)) -> EdgeServer {
    let mut dispatcher = Dispatcher::new(config);
    let api = dispatcher.api_mut();
    api.get("/api/health", health).unwrap();
    api.post("/api/echo", echo).unwrap();
    api.get("/api/explode", explode).unwrap();
    api.get("/api/whoami", whoami).unwrap();
    api.get("/api/token", token).unwrap();
    api.post("/api/login", login).unwrap();
    api.get("/api/report", report).unwrap();
    configure(&mut dispatcher);
    EdgeServer::new(dispatcher, config)
}

fn server() -> (tempfile::TempDir, EdgeServer) {
    let dir = common::public_dir();
    let config = common::config_for(dir.path());
    let server = server_with(&config, |_| {});
    (dir, server)
}

#[tokio::test]
async fn health_returns_json_status() {
    let (_dir, server) = server();
    let response = send(&server, get("/api/health")).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.headers[header::CONTENT_TYPE], "application/json");
    assert_eq!(response.json()["status"], "ok");
}

#[tokio::test]
async fn echo_round_trips_the_body() {
    let (_dir, server) = server();
    let response = send(&server, post("/api/echo", r#"{"x":1}"#)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!({ "x": 1 }));
}

#[tokio::test]
async fn echo_of_empty_body_is_empty_object() {
    let (_dir, server) = server();
    let response = send(&server, post("/api/echo", "")).await;
    assert_eq!(response.json(), json!({}));
}

/// Malformed JSON surfaces as a generic 500, not a 400. Handlers that want a
/// 400 must match on `EdgeError::Parse` themselves.
#[tokio::test]
async fn malformed_json_is_a_500_not_a_400() {
    let (_dir, server) = server();
    let response = send(&server, post("/api/echo", "{x:}")).await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json(), json!({ "error": "INTERNAL SERVER ERROR" }));
}

#[tokio::test]
async fn panicking_handler_is_contained() {
    let (_dir, server) = server();
    let response = send(&server, get("/api/explode")).await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!response.text().contains("secret"));

    // The server keeps answering afterwards.
    let response = send(&server, get("/api/health")).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn near_misses_fall_through_to_404() {
    let (_dir, server) = server();
    for path in ["/api/health/", "/api/HEALTH", "/api/health/extra", "/api/nope"] {
        let response = send(&server, get(path)).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND, "{path}");
        assert_eq!(response.json(), json!({ "error": "Not found" }), "{path}");
    }

    let response = send(&server, post("/api/health", "{}")).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn host_header_does_not_reroute_the_request() {
    let (_dir, server) = server();
    for host in ["evil?", "evil/x", "evil#"] {
        let request = Request::builder()
            .uri("/api/health")
            .header(header::HOST, host)
            .body(Body::empty())
            .unwrap();
        let response = send(&server, request).await;
        assert_eq!(response.status, StatusCode::OK, "{host}");
        assert_eq!(response.json()["status"], "ok", "{host}");
    }
}

#[tokio::test]
async fn basic_credentials_are_decoded() {
    let (_dir, server) = server();
    let request = Request::builder()
        .uri("/api/whoami")
        .header(header::AUTHORIZATION, format!("Basic {}", STANDARD.encode("alice:s3cret")))
        .body(Body::empty())
        .unwrap();
    let response = send(&server, request).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!({ "user": "alice", "password": "s3cret" }));
}

#[tokio::test]
async fn missing_credentials_get_a_challenge() {
    let (_dir, server) = server();
    let response = send(&server, get("/api/whoami")).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers[header::WWW_AUTHENTICATE], "Basic realm=\"edge\"");
    assert_eq!(response.json(), json!({ "error": "Unauthorized" }));
}

#[tokio::test]
async fn bearer_token_and_wrong_scheme() {
    let (_dir, server) = server();
    let request = Request::builder()
        .uri("/api/token")
        .header(header::AUTHORIZATION, "Bearer abc.def")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&server, request).await.json(), json!({ "token": "abc.def" }));

    let request = Request::builder()
        .uri("/api/token")
        .header(header::AUTHORIZATION, format!("Basic {}", STANDARD.encode("a:b")))
        .body(Body::empty())
        .unwrap();
    let response = send(&server, request).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(response.headers.get(header::WWW_AUTHENTICATE).is_none());
    assert_eq!(response.json(), json!({ "error": "token required" }));
}

#[tokio::test]
async fn handler_limiter_blocks_and_resets() {
    let (_dir, server) = server();
    let wrong = || post("/api/login", r#"{"password":"wrong"}"#);

    assert_eq!(send(&server, wrong()).await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(send(&server, wrong()).await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(send(&server, wrong()).await.status, StatusCode::TOO_MANY_REQUESTS);

    let ok = send(&server, post("/api/login", r#"{"password":"correct"}"#)).await;
    assert_eq!(ok.json(), json!({ "ok": true }));
    assert_eq!(send(&server, wrong()).await.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn compressed_json_follows_accept_encoding() {
    let (_dir, server) = server();
    let request = Request::builder()
        .uri("/api/report")
        .header(header::ACCEPT_ENCODING, "gzip, deflate")
        .body(Body::empty())
        .unwrap();
    let response = send(&server, request).await;
    assert_eq!(response.headers[header::CONTENT_ENCODING], "gzip");

    let mut decoded = Vec::new();
    std::io::Read::read_to_end(&mut flate2::read::GzDecoder::new(&response.body[..]), &mut decoded)
        .unwrap();
    let value: Value = serde_json::from_slice(&decoded).unwrap();
    assert_eq!(value["rows"].as_array().unwrap().len(), 200);

    let plain = send(&server, get("/api/report")).await;
    assert!(plain.headers.get(header::CONTENT_ENCODING).is_none());
    assert_eq!(plain.json(), value);
}

#[tokio::test]
async fn short_circuit_skips_handler_but_not_after_hooks() {
    let dir = common::public_dir();
    let mut config = common::config_for(dir.path());
    config.rate_limit.enabled = true;
    config.rate_limit.max_requests = 2;

    let after_runs = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&after_runs);
    let server = server_with(&config, |dispatcher| {
        let hook = RateLimitHook::new(Arc::clone(dispatcher.rate_limiter()), &config.rate_limit);
        dispatcher
            .hooks_mut()
            .add(Stage::Before, "rate-limit", Arc::new(hook))
            .after_sync("count", move |_| {
                counted.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
    });

    assert_eq!(send(&server, get("/api/health")).await.status, StatusCode::OK);
    assert_eq!(send(&server, get("/style.css")).await.status, StatusCode::OK);

    let limited = send(&server, get("/api/health")).await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(limited.json(), json!({ "error": "Too many requests" }));
    assert_eq!(after_runs.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn failing_hooks_never_reach_the_client() {
    let dir = common::public_dir();
    let config = common::config_for(dir.path());
    let server = server_with(&config, |dispatcher| {
        dispatcher
            .hooks_mut()
            .before_sync("flaky", |_| anyhow::bail!("before failed"))
            .after_sync("flakier", |_| anyhow::bail!("after failed"));
    });

    let response = send(&server, get("/api/health")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["status"], "ok");
}
