use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::request::Parts;
use axum::http::{StatusCode, Uri};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tower::ServiceExt;

use crate::presentation::http::body::{self, ParsedBody};
use crate::presentation::http::error::internal_error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyMode {
    /// Handler sees the exact bytes the client sent.
    Raw,
    /// Handler additionally gets a [`ParsedBody`] extension.
    Parsed,
}

/// Marker placed on responses from a mount's own fallback, meaning "this
/// module has no route for the path".
#[derive(Debug, Clone, Copy)]
struct Unhandled;

async fn unhandled() -> Response {
    let mut res = StatusCode::NOT_FOUND.into_response();
    res.extensions_mut().insert(Unhandled);
    res
}

#[derive(Clone)]
struct Mount {
    prefix: String,
    mode: BodyMode,
    router: Router,
}

impl Mount {
    /// Path as seen inside the mount, or `None` if the prefix does not apply.
    /// Matching is on whole segments: `/api/cart` owns `/api/cart/items` but
    /// not `/api/cartography`.
    fn strip<'a>(&self, path: &'a str) -> Option<&'a str> {
        let rest = path.strip_prefix(self.prefix.as_str())?;
        if rest.is_empty() {
            Some("/")
        } else if rest.starts_with('/') {
            Some(rest)
        } else {
            None
        }
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_end_matches('/');
    if trimmed.is_empty() || trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Ordered prefix table. The first mount whose prefix matches and whose
/// router has a route for the remaining path answers the request; a mount
/// without a matching route passes the request to the next candidate.
/// Bodies that exceed the limit or fail to parse end in the uniform 500.
#[derive(Clone)]
pub struct RouteTable {
    mounts: Vec<Mount>,
    body_parser: bool,
    body_limit: usize,
}

impl RouteTable {
    pub fn new(body_limit: usize) -> Self {
        Self {
            mounts: Vec::new(),
            body_parser: false,
            body_limit,
        }
    }

    /// Appends a mount. Its body mode is fixed by whether
    /// [`RouteTable::parse_bodies`] was called before it.
    pub fn mount(mut self, prefix: &str, router: Router) -> Self {
        let mode = if self.body_parser {
            BodyMode::Parsed
        } else {
            BodyMode::Raw
        };
        self.mounts.push(Mount {
            prefix: normalize_prefix(prefix),
            mode,
            router: router.fallback(unhandled),
        });
        self
    }

    /// Installs the body parser for every mount added after this call.
    pub fn parse_bodies(mut self) -> Self {
        self.body_parser = true;
        self
    }
}

fn rewrite_uri(original: &Uri, path: &str) -> Result<Uri, http::Error> {
    let path_and_query = match original.query() {
        Some(q) => format!("{path}?{q}"),
        None => path.to_string(),
    };
    let mut parts = original.clone().into_parts();
    parts.path_and_query = Some(path_and_query.parse()?);
    Ok(Uri::from_parts(parts)?)
}

fn rebuild(parts: &Parts, uri: Uri, body: Body) -> Request {
    let mut req = Request::new(body);
    *req.method_mut() = parts.method.clone();
    *req.uri_mut() = uri;
    *req.version_mut() = parts.version;
    *req.headers_mut() = parts.headers.clone();
    *req.extensions_mut() = parts.extensions.clone();
    req
}

/// Middleware that runs the [`RouteTable`] ahead of the outer router.
/// Requests no mount handles continue to `next` (health checks, frontend,
/// 404) with their body intact.
pub async fn dispatch(State(table): State<Arc<RouteTable>>, req: Request, next: Next) -> Response {
    let path = req.uri().path().to_owned();
    if !table.mounts.iter().any(|m| m.strip(&path).is_some()) {
        return next.run(req).await;
    }

    let (parts, body) = req.into_parts();
    let bytes = match axum::body::to_bytes(body, table.body_limit).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(error = %e, %path, limit = table.body_limit, "request_body_unreadable");
            return internal_error();
        }
    };

    let mut parsed: Option<ParsedBody> = None;
    for mount in &table.mounts {
        let Some(inner_path) = mount.strip(&path) else {
            continue;
        };
        let uri = match rewrite_uri(&parts.uri, inner_path) {
            Ok(uri) => uri,
            Err(e) => {
                tracing::warn!(error = %e, %path, prefix = %mount.prefix, "mount_uri_rewrite_failed");
                continue;
            }
        };
        let mut attempt = rebuild(&parts, uri, Body::from(bytes.clone()));
        if mount.mode == BodyMode::Parsed {
            if parsed.is_none() {
                match body::parse(&parts.headers, &bytes) {
                    Ok(b) => parsed = Some(b),
                    Err(e) => {
                        tracing::error!(error = %e, %path, "request_body_malformed");
                        return internal_error();
                    }
                }
            }
            if let Some(b) = &parsed {
                attempt.extensions_mut().insert(b.clone());
            }
        }

        let response = match mount.router.clone().oneshot(attempt).await {
            Ok(res) => res,
            Err(never) => match never {},
        };
        if response.extensions().get::<Unhandled>().is_none() {
            return response;
        }
    }

    next.run(rebuild(&parts, parts.uri.clone(), Body::from(bytes)))
        .await
}

#[cfg(test)]
impl RouteTable {
    fn mounts(&self) -> impl Iterator<Item = (&str, BodyMode)> {
        self.mounts.iter().map(|m| (m.prefix.as_str(), m.mode))
    }

    /// Body mode of the first mount whose prefix matches `path`.
    fn mode_for(&self, path: &str) -> Option<BodyMode> {
        self.mounts
            .iter()
            .find(|m| m.strip(path).is_some())
            .map(|m| m.mode)
    }
}
