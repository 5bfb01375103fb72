use std::path::PathBuf;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::Method;
use axum::response::Response;
use tower::ServiceExt;
use tower_http::services::{ServeDir, ServeFile};

use crate::bootstrap::app_context::AppContext;
use crate::presentation::http::error;

pub const ENTRY_DOCUMENT: &str = "index.html";

/// Fallback when frontend serving is on: files from the dist directory,
/// anything else gets the entry document so client-side routes resolve.
pub async fn serve_frontend(State(ctx): State<AppContext>, req: Request) -> Response {
    if !matches!(*req.method(), Method::GET | Method::HEAD) {
        return error::not_found();
    }
    let dist = PathBuf::from(&ctx.cfg.frontend_dist);
    let service = ServeDir::new(&dist).fallback(ServeFile::new(dist.join(ENTRY_DOCUMENT)));
    match service.oneshot(req).await {
        Ok(res) => res.map(Body::new),
        Err(never) => match never {},
    }
}

pub async fn not_found() -> Response {
    error::not_found()
}
