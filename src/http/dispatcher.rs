//! Per-request entry point.
//!
//! # Responsibilities
//! - Build the `Exchange` for an inbound request
//! - Run before-hooks, then exactly one of the API router or static files
//! - Run after-hooks unconditionally and hand back the response
//!
//! # Design Decisions
//! - Built once at startup, then shared behind an `Arc`; registration needs
//!   `&mut self`, so the tables cannot change while serving
//! - The main branch is skipped when a before-hook already responded

use std::sync::Arc;

use axum::{
    extract::Request,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::compression::Compressor;
use crate::config::EdgeConfig;
use crate::http::exchange::{Branch, Exchange};
use crate::http::hooks::{Flow, HookPipeline};
use crate::routing::matcher::PathPrefixMatcher;
use crate::routing::reply::error_json;
use crate::routing::request::{ApiContext, ApiRequest};
use crate::routing::router::ApiRouter;
use crate::security::rate_limit::RateLimiter;
use crate::static_files::StaticFiles;

/// Sequences hooks, API routes and static files for every request.
#[derive(Debug)]
pub struct Dispatcher {
    hooks: HookPipeline,
    api: ApiRouter,
    statics: StaticFiles,
    api_prefix: PathPrefixMatcher,
}

impl Dispatcher {
    pub fn new(config: &EdgeConfig) -> Self {
        Self::with_limiter(config, Arc::new(RateLimiter::new()))
    }

    /// Build with an existing limiter (shared with hooks or a sweeper).
    pub fn with_limiter(config: &EdgeConfig, limiter: Arc<RateLimiter>) -> Self {
        let context = ApiContext::new(config, limiter);
        Self {
            hooks: HookPipeline::new(),
            api: ApiRouter::new(context),
            statics: StaticFiles::from_config(&config.static_files, Compressor::new(&config.compression)),
            api_prefix: PathPrefixMatcher::new(config.api.prefix.clone()),
        }
    }

    pub fn api_mut(&mut self) -> &mut ApiRouter {
        &mut self.api
    }

    pub fn api(&self) -> &ApiRouter {
        &self.api
    }

    pub fn hooks_mut(&mut self) -> &mut HookPipeline {
        &mut self.hooks
    }

    pub fn statics(&self) -> &StaticFiles {
        &self.statics
    }

    /// The limiter handlers reach through `ApiRequest::rate_limiter`.
    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        self.api.context().rate_limiter()
    }

    /// Handle one request end to end.
    pub async fn dispatch(&self, request: Request) -> Response {
        let mut exchange = match Exchange::from_request(request) {
            Ok(exchange) => exchange,
            Err(e) => {
                tracing::warn!(error = %e, "Rejected request target");
                return e.into_response();
            }
        };

        if self.hooks.run_before(&mut exchange).await == Flow::Responded {
            exchange.set_branch(Branch::Hook);
        } else if self.api_prefix.matches(exchange.path()) {
            exchange.set_branch(Branch::Api);
            let request = ApiRequest::from_exchange(&mut exchange, Arc::clone(self.api.context()));
            let response = self.api.dispatch(request).await;
            self.write(&mut exchange, response);
        } else {
            exchange.set_branch(Branch::Static);
            let response = self.statics.serve(exchange.path(), exchange.headers()).await;
            self.write(&mut exchange, response);
        }

        self.hooks.run_after(&mut exchange).await;

        tracing::debug!(
            method = %exchange.method(),
            path = %exchange.path(),
            branch = exchange.branch().map(|b| b.as_str()).unwrap_or("none"),
            status = exchange.response().map(|r| r.status().as_u16()).unwrap_or(0),
            elapsed_ms = exchange.elapsed().as_millis() as u64,
            "Request handled"
        );

        exchange.into_response().unwrap_or_else(|| {
            tracing::error!("Exchange finished without a response");
            error_json(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL SERVER ERROR")
        })
    }

    fn write(&self, exchange: &mut Exchange, response: Response) {
        if let Err(e) = exchange.respond(response) {
            tracing::error!(path = %exchange.path(), error = %e, "Response dropped");
        }
    }
}
