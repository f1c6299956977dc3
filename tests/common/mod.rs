//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode};
use edge_server::{Dispatcher, EdgeConfig, EdgeServer, Shutdown};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower::ServiceExt;

/// A response collected in full.
pub struct Collected {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Collected {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

/// Public directory with a few representative files.
pub fn public_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("index.html"), "<!doctype html><h1>home</h1>").unwrap();
    std::fs::write(dir.path().join("style.css"), "body { margin: 0 }\n".repeat(40)).unwrap();
    std::fs::write(dir.path().join("data.bin"), [0_u8, 1, 2, 3, 255]).unwrap();
    std::fs::create_dir(dir.path().join("docs")).unwrap();
    std::fs::write(dir.path().join("docs/index.html"), "<h1>docs</h1>").unwrap();
    dir
}

/// Config serving `root`, otherwise defaults.
pub fn config_for(root: &std::path::Path) -> EdgeConfig {
    let mut config = EdgeConfig::default();
    config.static_files.root = root.to_path_buf();
    config.sse.heartbeat_secs = 0;
    config
}

/// Run one request through the full Axum stack.
pub async fn send(server: &EdgeServer, request: Request<Body>) -> Collected {
    let response = server.router().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    Collected {
        status,
        headers,
        body,
    }
}

pub fn get(path: &str) -> Request<Body> {
    Request::builder().uri(path).body(Body::empty()).unwrap()
}

pub fn post(path: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// A server listening on an ephemeral local port.
pub struct Running {
    pub addr: SocketAddr,
    pub shutdown: Arc<Shutdown>,
    pub handle: JoinHandle<std::io::Result<()>>,
}

impl Running {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Trigger shutdown and wait for the server task to finish.
    pub async fn stop(self) {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("server did not stop")
            .unwrap()
            .unwrap();
    }
}

pub async fn start(dispatcher: Dispatcher, config: &EdgeConfig) -> Running {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Arc::new(Shutdown::new());
    let server = EdgeServer::new(dispatcher, config);

    let stop = Arc::clone(&shutdown);
    let handle = tokio::spawn(async move { server.run(listener, &stop).await });
    // Let the server subscribe before a test can trigger shutdown.
    tokio::time::sleep(Duration::from_millis(20)).await;

    Running {
        addr,
        shutdown,
        handle,
    }
}
