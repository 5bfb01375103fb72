use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::post,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::bootstrap::app_context::AppContext;
use crate::domain::delivery::{DeliveryEvent, GeoPoint};
use crate::presentation::http::body::ParsedBody;
use crate::presentation::http::error::AppError;

pub fn routes(ctx: AppContext) -> Router {
    Router::new()
        .route("/:order_id/status", post(update_status))
        .with_state(ctx)
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StatusUpdateRequest {
    pub status: String,
    pub location: Option<GeoPoint>,
    pub note: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusUpdateResponse {
    pub ok: bool,
    /// Live socket connections the event was handed to, whether or not
    /// they track this order.
    pub delivered: usize,
}

#[utoipa::path(
    post,
    path = "/api/delivery/{order_id}/status",
    tag = "Delivery",
    params(("order_id" = String, Path, description = "Order identifier")),
    request_body = StatusUpdateRequest,
    responses(
        (status = 202, body = StatusUpdateResponse),
        (status = 400, description = "Missing or malformed status")
    )
)]
pub async fn update_status(
    State(ctx): State<AppContext>,
    Path(order_id): Path<String>,
    body: ParsedBody,
) -> Result<(StatusCode, Json<StatusUpdateResponse>), AppError> {
    let req: StatusUpdateRequest = body.deserialize()?;
    let status = req.status.trim();
    if status.is_empty() {
        return Err(AppError::bad_request("status is required"));
    }

    let event = DeliveryEvent::new(order_id, status)
        .with_location(req.location)
        .with_note(req.note);
    let delivered = ctx.delivery_notifier().publish(&event).await?;
    tracing::info!(
        order_id = %event.order_id,
        status = %event.status,
        delivered,
        "delivery_status_published"
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(StatusUpdateResponse {
            ok: true,
            delivered,
        }),
    ))
}
