//! Per-request state shared by hooks and the dispatcher.
//!
//! # Responsibilities
//! - Hold the request head, parsed URL and peer address
//! - Hold the request body until a branch claims it
//! - Hold the single response slot ("has anything been written yet")
//!
//! # Design Decisions
//! - The response slot can be filled once; a second write is an error
//! - Hooks see the same `Exchange` before and after the main branch

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, Request},
    http::{header, uri::Authority, HeaderMap, Method, Uri, Version},
    response::Response,
};
use url::Url;

use crate::error::EdgeError;

/// Which branch produced the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    /// A before-hook responded and the main branch was skipped.
    Hook,
    Api,
    Static,
}

impl Branch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Branch::Hook => "hook",
            Branch::Api => "api",
            Branch::Static => "static",
        }
    }
}

/// One request moving through the pipeline.
#[derive(Debug)]
pub struct Exchange {
    method: Method,
    uri: Uri,
    version: Version,
    headers: HeaderMap,
    url: Url,
    peer: Option<SocketAddr>,
    started: Instant,
    body: Option<Body>,
    response: Option<Response>,
    branch: Option<Branch>,
}

impl Exchange {
    /// Split an inbound request and resolve its target URL.
    pub fn from_request(request: Request) -> Result<Self, EdgeError> {
        let peer = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        let (parts, body) = request.into_parts();
        let url = resolve_url(&parts.uri, &parts.headers)?;

        Ok(Self {
            method: parts.method,
            uri: parts.uri,
            version: parts.version,
            headers: parts.headers,
            url,
            peer,
            started: Instant::now(),
            body: Some(body),
            response: None,
            branch: None,
        })
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Fully resolved request URL. The host comes from the request authority
    /// or `Host` header when it is a valid host, else `localhost`.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Normalized request path.
    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// Remote address, when the transport provides one.
    pub fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }

    /// When the exchange was created.
    pub fn started(&self) -> Instant {
        self.started
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// `x-request-id` assigned by the request-id layer, if any.
    pub fn request_id(&self) -> Option<&str> {
        self.headers
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
    }

    /// Whether a response has been written.
    pub fn responded(&self) -> bool {
        self.response.is_some()
    }

    /// Write the response. Fails if one was already written.
    pub fn respond(&mut self, response: Response) -> Result<(), EdgeError> {
        if self.responded() {
            return Err(EdgeError::AlreadyResponded);
        }
        self.response = Some(response);
        Ok(())
    }

    pub fn response(&self) -> Option<&Response> {
        self.response.as_ref()
    }

    /// Mutable access for after-hooks that decorate the response.
    pub fn response_mut(&mut self) -> Option<&mut Response> {
        self.response.as_mut()
    }

    pub fn branch(&self) -> Option<Branch> {
        self.branch
    }

    pub(crate) fn set_branch(&mut self, branch: Branch) {
        self.branch = Some(branch);
    }

    /// Claim the request body; later calls get an empty body.
    pub(crate) fn take_body(&mut self) -> Body {
        self.body.take().unwrap_or_else(Body::empty)
    }

    pub(crate) fn into_response(self) -> Option<Response> {
        self.response
    }
}

/// Resolve the request target against a fixed origin, then attach the
/// client's host. The host never takes part in parsing the path.
fn resolve_url(uri: &Uri, headers: &HeaderMap) -> Result<Url, EdgeError> {
    let target = match uri.path_and_query().map(|pq| pq.as_str()) {
        Some(target) if target.starts_with('/') => target.to_owned(),
        Some(target) => format!("/{target}"),
        None => "/".to_owned(),
    };
    let mut url = Url::parse(&format!("http://localhost{target}"))
        .map_err(|e| EdgeError::BadRequest(format!("{target}: {e}")))?;

    let authority = uri.authority().cloned().or_else(|| {
        headers
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.parse::<Authority>().ok())
    });
    if let Some(authority) = authority {
        let mut with_host = url.clone();
        if with_host.set_host(Some(authority.host())).is_ok()
            && with_host.set_port(authority.port_u16()).is_ok()
        {
            url = with_host;
        }
    }
    Ok(url)
}
