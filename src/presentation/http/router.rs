use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::{Router, middleware, routing::get};
use chrono::Utc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use crate::bootstrap::app_context::AppContext;
use crate::presentation::http::modules::RouteModules;
use crate::presentation::http::{cors, dispatch, error, frontend, health, openapi};
use crate::presentation::ws::delivery_socket::{self, DELIVERY_SOCKET_PATH};

/// Composes the whole HTTP surface.
///
/// Layers run outermost first: request log, CORS, panic containment, then
/// the route table (webhook mounts with raw bodies, the rest parsed), and
/// finally the fixed routes and the health/frontend/404 fallback.
pub fn build_app(ctx: AppContext, modules: RouteModules) -> Router {
    let table = Arc::new(modules.into_table(&ctx));

    let mut app = Router::new()
        .route(
            "/api",
            get(health::api_root).fallback(frontend::not_found),
        )
        .route("/api/health", get(health::health))
        .route("/api/openapi.json", get(openapi::openapi_json))
        .route(
            DELIVERY_SOCKET_PATH,
            get(delivery_socket::delivery_socket_entry),
        );

    app = if ctx.cfg.serve_frontend {
        app.fallback(frontend::serve_frontend)
    } else {
        app.route("/", get(health::root_ok).fallback(frontend::not_found))
            .fallback(frontend::not_found)
    };

    app.with_state(ctx.clone())
        .layer(middleware::from_fn_with_state(table, dispatch::dispatch))
        .layer(CatchPanicLayer::custom(error::panic_response))
        .layer(cors::layer(&ctx.cfg.allowed_origins))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &Request<Body>| {
                    tracing::info_span!("http", method = %req.method(), uri = %req.uri())
                })
                .on_request(|req: &Request<Body>, _span: &Span| {
                    tracing::info!(
                        method = %req.method(),
                        path = %req.uri().path(),
                        at = %Utc::now().to_rfc3339(),
                        "request"
                    );
                }),
        )
}
