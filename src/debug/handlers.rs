use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::debug::DebugState;
use crate::http::ApiError;

pub async fn get_log_level(State(state): State<DebugState>) -> Response {
    match state.log_level.as_ref().and_then(|handle| handle.current()) {
        Some(level) => (StatusCode::OK, level).into_response(),
        None => ApiError::new(StatusCode::NOT_FOUND, "log level is not reconfigurable").into_response(),
    }
}

pub async fn set_log_level(State(state): State<DebugState>, body: String) -> Response {
    let Some(handle) = state.log_level.as_ref() else {
        return ApiError::new(StatusCode::NOT_FOUND, "log level is not reconfigurable").into_response();
    };

    match handle.set(&body) {
        Ok(level) => (StatusCode::OK, level).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "rejected log level change");
            ApiError::bad_request(e.to_string()).into_response()
        }
    }
}

pub async fn get_metrics(State(state): State<DebugState>) -> Response {
    match state.metrics.as_ref() {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => ApiError::new(StatusCode::NOT_FOUND, "metrics recorder not installed").into_response(),
    }
}

pub async fn get_health() -> &'static str {
    "ok"
}
