use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use kloner_core::ProxyError;
use serde_json::{json, Value};
use tracing::error;

/// Error response of a proxy route: a status plus a small JSON document.
#[derive(Debug)]
pub struct ProxyFailure {
    pub status: StatusCode,
    pub body: Value,
}

impl ProxyFailure {
    pub fn new(status: StatusCode, body: Value) -> Self {
        Self { status, body }
    }

    /// Upstream status preserved, `details` carrying the upstream text.
    pub fn upstream(status_code: u16, error: &str, details: impl Into<Value>) -> Self {
        Self::new(
            StatusCode::from_u16(status_code).unwrap_or(StatusCode::BAD_GATEWAY),
            json!({"error": error, "details": details.into()}),
        )
    }

    pub fn internal(error: &str, message: impl ToString) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"error": error, "message": message.to_string()}),
        )
    }
}

impl From<ProxyError> for ProxyFailure {
    fn from(e: ProxyError) -> Self {
        error!("{}", e);
        match e {
            ProxyError::NotConfigured { route, reason } => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                json!({"error": format!("{route} is not configured"), "message": reason}),
            ),
            other => Self::internal("Proxy error", other),
        }
    }
}

impl IntoResponse for ProxyFailure {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
