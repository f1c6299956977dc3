//! Handler-side view of a request and the facilities shared by all handlers.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::Response,
};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use url::Url;

use crate::compression::{negotiate, Compressor, Encoding};
use crate::config::EdgeConfig;
use crate::error::EdgeError;
use crate::http::exchange::Exchange;
use crate::routing::reply::{json_bytes, JsonBody};
use crate::security::auth::{self, BasicCredentials};
use crate::security::rate_limit::RateLimiter;
use crate::sse::SseSession;

/// Facilities every handler can reach through its request.
#[derive(Debug)]
pub struct ApiContext {
    limiter: Arc<RateLimiter>,
    compressor: Compressor,
    max_body_bytes: usize,
    sse_capacity: usize,
    sse_heartbeat: Option<Duration>,
    debug: bool,
}

impl ApiContext {
    pub fn new(config: &EdgeConfig, limiter: Arc<RateLimiter>) -> Self {
        Self {
            limiter,
            compressor: Compressor::new(&config.compression),
            max_body_bytes: config.api.max_body_bytes,
            sse_capacity: config.sse.channel_capacity,
            sse_heartbeat: (config.sse.heartbeat_secs > 0)
                .then(|| Duration::from_secs(config.sse.heartbeat_secs)),
            debug: config.api.debug,
        }
    }

    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn debug(&self) -> bool {
        self.debug
    }
}

impl Default for ApiContext {
    fn default() -> Self {
        Self::new(&EdgeConfig::default(), Arc::new(RateLimiter::new()))
    }
}

/// A request as seen by an API handler.
#[derive(Debug)]
pub struct ApiRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    url: Url,
    peer: Option<SocketAddr>,
    body: Option<Body>,
    context: Arc<ApiContext>,
}

impl ApiRequest {
    /// Build from an exchange, claiming its body.
    pub(crate) fn from_exchange(exchange: &mut Exchange, context: Arc<ApiContext>) -> Self {
        Self {
            method: exchange.method().clone(),
            uri: exchange.uri().clone(),
            headers: exchange.headers().clone(),
            url: exchange.url().clone(),
            peer: exchange.peer(),
            body: Some(exchange.take_body()),
            context,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    pub fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }

    pub fn context(&self) -> &ApiContext {
        &self.context
    }

    /// The limiter shared by every handler of this router.
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.context.limiter
    }

    /// Read the whole body into memory. A second call yields an empty body.
    pub async fn body_bytes(&mut self) -> Result<Bytes, EdgeError> {
        let Some(body) = self.body.take() else {
            return Ok(Bytes::new());
        };
        axum::body::to_bytes(body, self.context.max_body_bytes)
            .await
            .map_err(|e| EdgeError::Body(e.to_string()))
    }

    /// Read the whole body and parse it as JSON. An empty body parses as `{}`.
    pub async fn parse_body<T: DeserializeOwned>(&mut self) -> Result<T, EdgeError> {
        let bytes = self.body_bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(serde_json::from_str("{}")?);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn basic_auth(&self) -> Option<BasicCredentials> {
        auth::basic_auth(&self.headers)
    }

    pub fn bearer_auth(&self) -> Option<String> {
        auth::bearer_auth(&self.headers)
    }

    /// Encoding this response may use, given the request and configuration.
    pub fn accepted_encoding(&self) -> Option<Encoding> {
        if !self.context.compressor.enabled() {
            return None;
        }
        negotiate(self.headers.get(header::ACCEPT_ENCODING))
    }

    /// `200 OK` JSON, compressed when the client accepts it.
    pub fn json_compressed(
        &self,
        data: impl Into<JsonBody>,
    ) -> impl Future<Output = Response> + Send + 'static {
        self.write_json_compressed(data, StatusCode::OK, None)
    }

    /// JSON response compressed when the client accepts it.
    ///
    /// The body is fully encoded before the response is assembled, so the
    /// headers always describe the bytes that follow. The returned future
    /// does not borrow the request.
    pub fn write_json_compressed(
        &self,
        data: impl Into<JsonBody>,
        status: StatusCode,
        extra_headers: Option<HeaderMap>,
    ) -> impl Future<Output = Response> + Send + 'static {
        let body = Bytes::from(data.into().into_string());
        let encoding = self.accepted_encoding();
        let context = Arc::clone(&self.context);

        async move {
            let Some(encoding) = encoding else {
                return json_bytes(body, status, None, extra_headers);
            };
            match context.compressor.compress(body.clone(), encoding).await {
                Ok(packed) => json_bytes(packed, status, Some(encoding), extra_headers),
                Err(e) => {
                    tracing::warn!(encoding = %encoding, error = %e, "Compression failed; sending identity");
                    json_bytes(body, status, None, extra_headers)
                }
            }
        }
    }

    /// Open an event stream. Return the response from the handler and keep
    /// the session to push events.
    ///
    /// When a heartbeat interval is configured, a keep-alive task runs until
    /// the session ends.
    pub fn sse(&self) -> (SseSession, Response) {
        let (session, response) = SseSession::open(self.context.sse_capacity);
        if let Some(interval) = self.context.sse_heartbeat {
            session.spawn_keepalive(interval);
        }
        (session, response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compression::codec::tests::decode;
    use axum::extract::Request;

    fn api_request(builder: axum::http::request::Builder, body: &str) -> ApiRequest {
        api_request_with(builder, body, ApiContext::default())
    }

    fn api_request_with(
        builder: axum::http::request::Builder,
        body: &str,
        context: ApiContext,
    ) -> ApiRequest {
        let request: Request = builder.body(Body::from(body.to_string())).unwrap();
        let mut exchange = Exchange::from_request(request).unwrap();
        ApiRequest::from_exchange(&mut exchange, Arc::new(context))
    }

    #[tokio::test]
    async fn parses_json_body() {
        let mut req = api_request(axum::http::Request::builder().method("POST"), r#"{"x":1}"#);
        let value: serde_json::Value = req.parse_body().await.unwrap();
        assert_eq!(value, serde_json::json!({"x": 1}));
    }

    #[tokio::test]
    async fn empty_body_is_empty_object() {
        let mut req = api_request(axum::http::Request::builder(), "");
        let value: serde_json::Value = req.parse_body().await.unwrap();
        assert_eq!(value, serde_json::json!({}));
    }

    #[tokio::test]
    async fn malformed_body_is_parse_error() {
        let mut req = api_request(axum::http::Request::builder(), "{x:}");
        let err = req.parse_body::<serde_json::Value>().await.unwrap_err();
        assert!(matches!(err, EdgeError::Parse(_)));
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let mut config = EdgeConfig::default();
        config.api.max_body_bytes = 4;
        let context = ApiContext::new(&config, Arc::new(RateLimiter::new()));
        let mut req = api_request_with(axum::http::Request::builder(), r#"{"long":true}"#, context);
        assert!(matches!(req.body_bytes().await, Err(EdgeError::Body(_))));
    }

    #[tokio::test]
    async fn compressed_json_matches_negotiation() {
        let req = api_request(axum::http::Request::builder().header("accept-encoding", "gzip, br"), "");
        let payload = serde_json::json!({ "items": vec!["entry"; 100] });
        let response = req.json_compressed(payload.clone()).await;

        assert_eq!(response.headers()[header::CONTENT_ENCODING], "br");
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let decoded: serde_json::Value =
            serde_json::from_slice(&decode(&bytes, Encoding::Brotli)).unwrap();
        assert_eq!(decoded, payload);
    }

    #[tokio::test]
    async fn compression_disabled_by_config() {
        let mut config = EdgeConfig::default();
        config.compression.enabled = false;
        let context = ApiContext::new(&config, Arc::new(RateLimiter::new()));
        let req = api_request_with(
            axum::http::Request::builder().header("accept-encoding", "gzip"),
            "",
            context,
        );
        let response = req.json_compressed("{}").await;
        assert!(response.headers().get(header::CONTENT_ENCODING).is_none());
    }

    #[test]
    fn credentials_come_from_headers() {
        let req = api_request(
            axum::http::Request::builder().header("authorization", "Bearer t0ken"),
            "",
        );
        assert_eq!(req.bearer_auth().as_deref(), Some("t0ken"));
        assert!(req.basic_auth().is_none());
    }
}
