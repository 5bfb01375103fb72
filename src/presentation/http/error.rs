use std::any::Any;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

pub const INTERNAL_ERROR_MESSAGE: &str = "Something went wrong!";

/// Error type shared by route modules. Anything not a client mistake is
/// logged and collapsed into the uniform 500 body.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::BadRequest(message) => rejection(StatusCode::BAD_REQUEST, message),
            AppError::Internal(e) => {
                tracing::error!(error = ?e, "request_failed");
                internal_error()
            }
        }
    }
}

/// `{ ok: false, message }` with the given status.
pub fn rejection(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({ "ok": false, "message": message.into() })),
    )
        .into_response()
}

pub fn not_found() -> Response {
    rejection(StatusCode::NOT_FOUND, "Not found")
}

pub fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "message": INTERNAL_ERROR_MESSAGE })),
    )
        .into_response()
}

/// Terminal stage for handlers that panic. The payload is logged and never
/// reaches the client.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic payload".to_string()
    };
    tracing::error!(panic = %detail, "request_handler_panicked");
    internal_error()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(res: Response) -> serde_json::Value {
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn internal_errors_hide_detail() {
        let res = AppError::from(anyhow::anyhow!("db password is hunter2")).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(res).await;
        assert_eq!(body, json!({ "message": "Something went wrong!" }));
    }

    #[tokio::test]
    async fn bad_request_keeps_message() {
        let res = AppError::bad_request("status is required").into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body = body_json(res).await;
        assert_eq!(body, json!({ "ok": false, "message": "status is required" }));
    }

    #[tokio::test]
    async fn panic_payloads_become_uniform_500() {
        let res = panic_response(Box::new("boom"));
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let res = panic_response(Box::new(String::from("boom")));
        assert_eq!(body_json(res).await["message"], "Something went wrong!");
        let res = panic_response(Box::new(42_u8));
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
