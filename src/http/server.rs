//! HTTP server setup.
//!
//! # Responsibilities
//! - Wrap the dispatcher in an Axum router with tracing and request IDs
//! - Bind to a listener and serve until shutdown
//! - Run the rate-limit sweeper alongside the server
//! - Bound the drain phase so open event streams cannot block exit

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Request, State},
    http,
    response::Response,
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::EdgeConfig;
use crate::http::dispatcher::Dispatcher;
use crate::lifecycle::Shutdown;

/// HTTP front end for a [`Dispatcher`].
pub struct EdgeServer {
    dispatcher: Arc<Dispatcher>,
    sweep_interval: Duration,
    drain_timeout: Duration,
}

impl EdgeServer {
    /// Freeze the dispatcher; no routes or hooks can be added after this.
    pub fn new(dispatcher: Dispatcher, config: &EdgeConfig) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            sweep_interval: Duration::from_secs(config.rate_limit.sweep_interval_secs),
            drain_timeout: Duration::from_secs(config.listener.drain_timeout_secs),
        }
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Axum router sending every request through the dispatcher.
    pub fn router(&self) -> Router {
        build_router(Arc::clone(&self.dispatcher))
    }

    /// Serve on `listener` until `shutdown` is triggered.
    pub async fn run(self, listener: TcpListener, shutdown: &Shutdown) -> std::io::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let sweeper = self
            .dispatcher
            .rate_limiter()
            .spawn_sweeper(self.sweep_interval, shutdown.subscribe());

        let mut stop = shutdown.subscribe();
        let mut drain = shutdown.subscribe();
        let app = self.router().into_make_service_with_connect_info::<SocketAddr>();
        let serve = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = stop.recv().await;
            })
            .into_future();
        tokio::pin!(serve);

        tokio::select! {
            result = &mut serve => result?,
            _ = drain.recv() => {
                match tokio::time::timeout(self.drain_timeout, &mut serve).await {
                    Ok(result) => result?,
                    Err(_) => tracing::warn!(
                        timeout_secs = self.drain_timeout.as_secs(),
                        "Drain timed out; dropping remaining connections"
                    ),
                }
            }
        }

        if let Err(e) = sweeper.await {
            tracing::error!(error = %e, "Rate limit sweeper failed");
        }
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn build_router(dispatcher: Arc<Dispatcher>) -> Router {
    Router::new()
        .fallback(dispatch)
        .with_state(dispatcher)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(|request: &http::Request<Body>| {
            let request_id = request
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-");
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id,
            )
        }))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

async fn dispatch(State(dispatcher): State<Arc<Dispatcher>>, request: Request) -> Response {
    dispatcher.dispatch(request).await
}
