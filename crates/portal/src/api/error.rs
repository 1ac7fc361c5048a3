//! Mapping of portal errors onto HTTP responses

use axum::{http::StatusCode, response::Json};
use serde::Serialize;
use serde_json::{json, Value};
use types::{LifecycleError, PortalError, SimulationError, WalletError};

pub type ApiResponse = (StatusCode, Json<Value>);
pub type ApiResult = Result<ApiResponse, ApiResponse>;

pub fn status_for(err: &PortalError) -> StatusCode {
    match err {
        PortalError::Validation(_) | PortalError::Config(_) | PortalError::Receipt(_) => {
            StatusCode::BAD_REQUEST
        }
        PortalError::Simulation(e) => match e {
            SimulationError::UnsupportedCurrency { .. } | SimulationError::InvalidAmount(_) => {
                StatusCode::BAD_REQUEST
            }
            SimulationError::TransactionFailed => StatusCode::UNPROCESSABLE_ENTITY,
            SimulationError::TickerAlreadyRunning { .. } => StatusCode::CONFLICT,
            SimulationError::TickerAborted(_) => StatusCode::INTERNAL_SERVER_ERROR,
        },
        PortalError::Wallet(e) => match e {
            WalletError::InvalidChainId(_) => StatusCode::BAD_REQUEST,
            WalletError::NotConnected => StatusCode::CONFLICT,
            _ => StatusCode::UNPROCESSABLE_ENTITY,
        },
        PortalError::Lifecycle(e) => match e {
            LifecycleError::NotesRequired => StatusCode::BAD_REQUEST,
            LifecycleError::Inconsistent { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::CONFLICT,
        },
        PortalError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        PortalError::NotFound { .. } => StatusCode::NOT_FOUND,
        PortalError::Conflict(_) => StatusCode::CONFLICT,
        PortalError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// `{"error": message}` with the matching status
pub fn api_error(err: PortalError) -> ApiResponse {
    let status = status_for(&err);
    if status.is_server_error() {
        tracing::error!(error = %err, "Request failed");
    } else {
        tracing::debug!(status = status.as_u16(), error = %err, "Request rejected");
    }
    (status, Json(json!({ "error": err.to_string() })))
}

/// Serialize `body` under `status`
pub fn respond<T: Serialize>(status: StatusCode, body: T) -> ApiResult {
    serde_json::to_value(body)
        .map(|value| (status, Json(value)))
        .map_err(|e| api_error(PortalError::Internal(format!("Failed to serialize response: {}", e))))
}

pub fn ok<T: Serialize>(body: T) -> ApiResult {
    respond(StatusCode::OK, body)
}
