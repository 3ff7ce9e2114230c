use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use workshop_common::Rejection;

use crate::Error;

/// Wraps a ledger error so handlers can use `?`.
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

pub fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::Validation(_) | Error::Parse(_) => StatusCode::BAD_REQUEST,
        Error::PreconditionFailed(Rejection::GuestForbidden) => StatusCode::FORBIDDEN,
        Error::PreconditionFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::Conflict(_) => StatusCode::CONFLICT,
        Error::Auth(_) => StatusCode::UNAUTHORIZED,
        Error::Unavailable(_) | Error::Timeout(_) => StatusCode::SERVICE_UNAVAILABLE,
        Error::Http(_) => StatusCode::BAD_GATEWAY,
        Error::Database(_) | Error::Migration(_) | Error::Json(_) | Error::Io(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn kind(err: &Error) -> &'static str {
    match err {
        Error::Validation(_) | Error::Parse(_) => "validation",
        Error::PreconditionFailed(_) => "precondition_failed",
        Error::NotFound(_) => "not_found",
        Error::Conflict(_) => "conflict",
        Error::Auth(_) => "auth",
        Error::Unavailable(_) | Error::Timeout(_) | Error::Http(_) => "unavailable",
        _ => "internal",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            error!("request failed: {}", self.0);
        }
        let message = match &self.0 {
            Error::PreconditionFailed(r) => r.to_string(),
            other => other.to_string(),
        };
        let body = json!({ "error": kind(&self.0), "message": message });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_statuses() {
        assert_eq!(status_for(&Error::Validation("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&Error::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status_for(&Rejection::GuestForbidden.into()), StatusCode::FORBIDDEN);
        assert_eq!(
            status_for(&Rejection::OutOfStock { product: "p".into() }.into()),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(status_for(&Error::Conflict("x".into())), StatusCode::CONFLICT);
        assert_eq!(status_for(&Error::Unavailable("x".into())), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(status_for(&Error::Auth("x".into())), StatusCode::UNAUTHORIZED);
    }
}
