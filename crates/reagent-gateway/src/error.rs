//! Maps `reagent_core::Error` onto HTTP status codes for route handlers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

pub struct ApiError(pub StatusCode, pub String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "error": self.1 }))).into_response()
    }
}

impl From<reagent_core::Error> for ApiError {
    fn from(err: reagent_core::Error) -> Self {
        let status = match &err {
            reagent_core::Error::SessionNotFound(_) => StatusCode::NOT_FOUND,
            reagent_core::Error::ConfigError(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self(status, err.to_string())
    }
}
