use axum::Json;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::presentation::http::health::api_root,
        crate::presentation::http::health::health,
        crate::presentation::http::delivery::update_status,
        crate::presentation::ws::delivery_socket::delivery_socket_entry,
    ),
    components(schemas(
        crate::presentation::http::health::HealthResp,
        crate::presentation::http::delivery::StatusUpdateRequest,
        crate::presentation::http::delivery::StatusUpdateResponse,
        crate::domain::delivery::DeliveryEvent,
        crate::domain::delivery::GeoPoint,
    )),
    tags(
        (name = "Health", description = "System health checks"),
        (name = "Delivery", description = "Real-time delivery tracking")
    )
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
