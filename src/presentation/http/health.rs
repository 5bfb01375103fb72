use axum::{Json, extract::State};
use serde::Serialize;
use utoipa::ToSchema;

use crate::bootstrap::app_context::AppContext;
use crate::infrastructure::db;

pub const API_BANNER: &str = "Protein Grub Hub API is running...";
pub const ROOT_OK: &str = "API OK";

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResp {
    pub status: &'static str,
}

#[utoipa::path(
    get,
    path = "/api",
    tag = "Health",
    responses((status = 200, body = String, description = "Plain-text liveness banner"))
)]
pub async fn api_root() -> &'static str {
    API_BANNER
}

pub async fn root_ok() -> &'static str {
    ROOT_OK
}

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses((status = 200, body = HealthResp))
)]
pub async fn health(State(ctx): State<AppContext>) -> Json<HealthResp> {
    let status = match db::ping(&ctx.db()).await {
        Ok(()) => "ok",
        Err(e) => {
            tracing::warn!(error = %e, "health_db_ping_failed");
            "degraded"
        }
    };
    Json(HealthResp { status })
}
