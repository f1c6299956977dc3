//! JSON response helpers.
//!
//! Every API response leaves through one of these functions, so status and
//! headers are fixed in a single place before any byte is written.

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::Response,
};
use bytes::Bytes;
use serde::Serialize;

use crate::compression::Encoding;
use crate::error::EdgeError;

const APPLICATION_JSON: &str = "application/json";

/// Payload for a JSON response.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonBody {
    /// Already-serialized JSON text, written verbatim.
    Raw(String),
    /// A structured value, serialized on write.
    Value(serde_json::Value),
}

impl JsonBody {
    /// Serialize any `Serialize` type into a structured payload.
    pub fn to_json<T: Serialize + ?Sized>(data: &T) -> Result<Self, EdgeError> {
        Ok(JsonBody::Value(serde_json::to_value(data)?))
    }

    pub fn into_string(self) -> String {
        match self {
            JsonBody::Raw(text) => text,
            JsonBody::Value(value) => value.to_string(),
        }
    }
}

impl From<String> for JsonBody {
    fn from(text: String) -> Self {
        JsonBody::Raw(text)
    }
}

impl From<&str> for JsonBody {
    fn from(text: &str) -> Self {
        JsonBody::Raw(text.to_string())
    }
}

impl From<serde_json::Value> for JsonBody {
    fn from(value: serde_json::Value) -> Self {
        JsonBody::Value(value)
    }
}

/// `200 OK` JSON response.
pub fn json(data: impl Into<JsonBody>) -> Response {
    write_json(data, StatusCode::OK, None)
}

/// JSON response with an explicit status and optional extra headers.
pub fn write_json(
    data: impl Into<JsonBody>,
    status: StatusCode,
    extra_headers: Option<HeaderMap>,
) -> Response {
    json_bytes(
        Bytes::from(data.into().into_string()),
        status,
        None,
        extra_headers,
    )
}

/// Assemble a JSON response from an already-encoded body.
pub(crate) fn json_bytes(
    body: Bytes,
    status: StatusCode,
    encoding: Option<Encoding>,
    extra_headers: Option<HeaderMap>,
) -> Response {
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;

    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
    if let Some(encoding) = encoding {
        headers.insert(header::CONTENT_ENCODING, encoding.header_value());
        headers.insert(header::VARY, HeaderValue::from_static("Accept-Encoding"));
    }
    if let Some(extra) = extra_headers {
        headers.extend(extra);
    }
    response
}

/// `{"error": "<message>"}` with the given status.
pub fn error_json(status: StatusCode, message: &str) -> Response {
    write_json(serde_json::json!({ "error": message }), status, None)
}

/// `401 Unauthorized`, optionally challenging for Basic credentials.
pub fn unauthorized(realm: Option<&str>, data: Option<JsonBody>) -> Response {
    let mut extra = HeaderMap::new();
    if let Some(realm) = realm {
        match HeaderValue::from_str(&format!("Basic realm=\"{realm}\"")) {
            Ok(value) => {
                extra.insert(header::WWW_AUTHENTICATE, value);
            }
            Err(_) => tracing::warn!(realm = %realm, "Realm is not a valid header value"),
        }
    }

    let body = data.unwrap_or_else(|| serde_json::json!({ "error": "Unauthorized" }).into());
    write_json(body, StatusCode::UNAUTHORIZED, Some(extra))
}
