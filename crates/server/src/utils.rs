use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::Json;
use library::ReconcileError;

use crate::state::{ApiError, ErrorResponse};

pub fn json_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

pub fn reconcile_error(err: ReconcileError) -> ApiError {
    match err {
        ReconcileError::NotFound(name) => {
            json_error(StatusCode::NOT_FOUND, format!("artist not found: {}", name))
        }
        other => json_error(StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
    }
}

/// A request without a JSON body means "all defaults"; a malformed body is
/// a 400.
pub fn body_or_default<T: Default>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(T::default()),
        Err(err) => Err(json_error(StatusCode::BAD_REQUEST, err.body_text())),
    }
}

/// Runs blocking filesystem or network work off the async runtime.
pub async fn run_blocking<T, F>(task: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(task).await {
        Ok(result) => result,
        Err(err) => Err(json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("task failed: {}", err),
        )),
    }
}
