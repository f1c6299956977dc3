//! Route table and API dispatch.
//!
//! # Responsibilities
//! - Store routes in registration order
//! - Look up the first route whose method and path match exactly
//! - Turn handler failures into a single generic 500
//!
//! # Design Decisions
//! - Append-only; frozen once the dispatcher is shared (thread-safe without locks)
//! - O(n) linear scan (acceptable for typical route counts)
//! - Duplicate (method, path) pairs are allowed; the first one registered wins
//! - Explicit 404 rather than silent fallback to static files

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::{
    http::{Method, StatusCode},
    response::Response,
};
use futures_util::future::{BoxFuture, FutureExt};

use crate::error::EdgeError;
use crate::routing::matcher::ExactMatcher;
use crate::routing::reply::error_json;
use crate::routing::request::{ApiContext, ApiRequest};

/// Result every handler produces.
pub type HandlerResult = Result<Response, EdgeError>;

type BoxHandler = Arc<dyn Fn(ApiRequest) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// One registered route.
pub struct Route {
    matcher: ExactMatcher,
    handler: BoxHandler,
}

impl Route {
    pub fn method(&self) -> &Method {
        self.matcher.method()
    }

    pub fn path(&self) -> &str {
        self.matcher.path()
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", self.method())
            .field("path", &self.path())
            .finish_non_exhaustive()
    }
}

/// Exact-match router for API paths.
#[derive(Debug)]
pub struct ApiRouter {
    routes: Vec<Route>,
    context: Arc<ApiContext>,
}

impl ApiRouter {
    pub fn new(context: ApiContext) -> Self {
        Self {
            routes: Vec::new(),
            context: Arc::new(context),
        }
    }

    /// Facilities handed to every handler.
    pub fn context(&self) -> &Arc<ApiContext> {
        &self.context
    }

    /// Append a route. The only check is that the path is non-empty.
    pub fn register<F, Fut>(
        &mut self,
        method: Method,
        path: impl Into<String>,
        handler: F,
    ) -> Result<&mut Self, EdgeError>
    where
        F: Fn(ApiRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let path = path.into();
        if path.is_empty() {
            return Err(EdgeError::InvalidRoute("path must not be empty".into()));
        }

        if self.find(&method, &path).is_some() {
            tracing::warn!(method = %method, path = %path, "Route already registered; the earlier one wins");
        }
        tracing::debug!(method = %method, path = %path, "Route registered");

        self.routes.push(Route {
            matcher: ExactMatcher::new(method, path),
            handler: Arc::new(move |req| handler(req).boxed()),
        });
        Ok(self)
    }

    pub fn get<F, Fut>(&mut self, path: impl Into<String>, handler: F) -> Result<&mut Self, EdgeError>
    where
        F: Fn(ApiRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.register(Method::GET, path, handler)
    }

    pub fn post<F, Fut>(&mut self, path: impl Into<String>, handler: F) -> Result<&mut Self, EdgeError>
    where
        F: Fn(ApiRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.register(Method::POST, path, handler)
    }

    pub fn put<F, Fut>(&mut self, path: impl Into<String>, handler: F) -> Result<&mut Self, EdgeError>
    where
        F: Fn(ApiRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.register(Method::PUT, path, handler)
    }

    pub fn delete<F, Fut>(&mut self, path: impl Into<String>, handler: F) -> Result<&mut Self, EdgeError>
    where
        F: Fn(ApiRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.register(Method::DELETE, path, handler)
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// First route matching `method` and `path` exactly.
    pub fn find(&self, method: &Method, path: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.matcher.matches(method, path))
    }

    /// Run the matching handler, or answer 404.
    ///
    /// Handler errors and panics become `500 {"error":"INTERNAL SERVER ERROR"}`;
    /// the cause is logged only when the debug flag is set.
    pub async fn dispatch(&self, request: ApiRequest) -> Response {
        let method = request.method().clone();
        let path = request.path().to_string();

        let Some(route) = self.find(&method, &path) else {
            tracing::debug!(method = %method, path = %path, "No route matched");
            return error_json(StatusCode::NOT_FOUND, "Not found");
        };

        let handler = Arc::clone(&route.handler);
        let outcome = AssertUnwindSafe(async move { handler(request).await })
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                self.report_failure(&method, &path, &format!("{:#}", anyhow::Error::from(e)));
                internal_error()
            }
            Err(panic) => {
                self.report_failure(&method, &path, &panic_message(panic.as_ref()));
                internal_error()
            }
        }
    }

    fn report_failure(&self, method: &Method, path: &str, detail: &str) {
        if self.context.debug() {
            tracing::error!(method = %method, path = %path, error = %detail, "Handler failed");
        } else {
            tracing::error!(method = %method, path = %path, "Handler failed");
        }
    }
}

impl Default for ApiRouter {
    fn default() -> Self {
        Self::new(ApiContext::default())
    }
}

fn internal_error() -> Response {
    error_json(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL SERVER ERROR")
}

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic".to_string()
    }
}
