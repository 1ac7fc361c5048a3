//! HTTP API request handlers

use crate::accounts::{LoginRequest, NewUser, RegisterRequest, UserUpdate};
use crate::api::error::{api_error, ok, respond, ApiResponse, ApiResult};
use crate::app::AppState;
use crate::receipts::{ReceiptUpload, StoredReceipt};
use crate::storage::{NotificationFilter, TransactionFilter, UserFilter};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use config::SimulationConfigUpdate;
use payment::ReviewAction;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use types::{CryptoCurrency, CurrencyTable, PaymentSubmission, PortalError};

fn fail(err: impl Into<PortalError>) -> ApiResponse {
    api_error(err.into())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateRequest {
    pub usd_amount: f64,
    pub currency: String,
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub action: ReviewAction,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchNetworkRequest {
    pub chain_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentQuery {
    pub student_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptQuery {
    pub transaction_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CurrencyView<'a> {
    #[serde(flatten)]
    currency: &'a CryptoCurrency,
    display_price: f64,
}

// Health

pub async fn health_check(State(state): State<Arc<AppState>>) -> ApiResult {
    ok(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "components": {
            "chain": state.chain.name(),
            "activeTickers": state.tickers.active_count().await,
        }
    }))
}

/// System status endpoint with more detailed information
pub async fn system_status(State(state): State<Arc<AppState>>) -> ApiResult {
    let violations = state.store.audit().await;

    ok(json!({
        "service": "tuition-portal",
        "version": env!("CARGO_PKG_VERSION"),
        "status": if violations.is_empty() { "operational" } else { "degraded" },
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptimeSeconds": state.uptime_seconds(),
        "components": {
            "chain": {
                "name": state.chain.name(),
                "activeTickers": state.tickers.active_ids().await,
            },
            "transactions": state.store.status_counts().await,
            "unreadNotifications": state.store.unread_count().await,
            "consistencyViolations": violations.iter().map(ToString::to_string).collect::<Vec<_>>(),
            "wallet": {
                "connected": state.wallet.is_connected().await,
            },
            "simulation": state.simulation().await,
        }
    }))
}

// Auth

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> ApiResult {
    let user = state.login(&request.email).await.map_err(fail)?;
    ok(json!({ "user": user }))
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult {
    let user = state.register(request).await.map_err(fail)?;
    respond(StatusCode::CREATED, json!({ "user": user }))
}

pub async fn logout(State(state): State<Arc<AppState>>) -> ApiResult {
    state.logout().await.map_err(fail)?;
    ok(json!({ "loggedOut": true }))
}

pub async fn current_session(State(state): State<Arc<AppState>>) -> ApiResult {
    ok(json!({ "user": state.session.current().await }))
}

// Payments

pub async fn list_currencies(State(state): State<Arc<AppState>>) -> ApiResult {
    let config = state.simulation().await;
    let currencies: Vec<_> = CurrencyTable::all()
        .iter()
        .map(|currency| CurrencyView {
            currency,
            display_price: state.calculator.display_price(currency, &config),
        })
        .collect();
    ok(currencies)
}

pub async fn list_payment_requests(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StudentQuery>,
) -> ApiResult {
    ok(state.store.payment_requests(query.student_id.as_deref()).await)
}

pub async fn estimate_payment(
    State(state): State<Arc<AppState>>,
    Json(request): Json<EstimateRequest>,
) -> ApiResult {
    let estimate = state
        .estimate_payment(request.usd_amount, &request.currency)
        .await
        .map_err(fail)?;
    ok(estimate)
}

/// Create, initiate and start confirming a payment. A payment the chain
/// rejects is still stored and returned, with status 422.
pub async fn submit_payment(
    State(state): State<Arc<AppState>>,
    Json(submission): Json<PaymentSubmission>,
) -> ApiResult {
    let outcome = state.submit_payment(submission).await.map_err(fail)?;
    let status = if outcome.error.is_some() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::CREATED
    };
    respond(status, outcome)
}

// Transactions

pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<TransactionFilter>,
) -> ApiResult {
    ok(state.store.transactions(&filter).await)
}

pub async fn get_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult {
    let tx = state.store.transaction(&id).await.map_err(fail)?;
    let confirming = state.tickers.is_active(&id).await;
    ok(json!({
        "transaction": tx,
        "progressPercent": tx.progress_percent(),
        "tickerActive": confirming,
    }))
}

pub async fn cancel_confirmation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult {
    ok(state.cancel_confirmation(&id).await.map_err(fail)?)
}

pub async fn review_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<ReviewRequest>,
) -> ApiResult {
    let tx = state
        .review_transaction(&id, request.action, request.notes)
        .await
        .map_err(fail)?;
    ok(tx)
}

// Users

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<UserFilter>,
) -> ApiResult {
    ok(state.store.users(&filter).await)
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(new_user): Json<NewUser>,
) -> ApiResult {
    respond(StatusCode::CREATED, state.create_user(new_user).await.map_err(fail)?)
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(update): Json<UserUpdate>,
) -> ApiResult {
    ok(state.update_user(&id, update).await.map_err(fail)?)
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult {
    ok(state.delete_user(&id).await.map_err(fail)?)
}

pub async fn verify_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult {
    ok(state.verify_user(&id).await.map_err(fail)?)
}

pub async fn toggle_two_factor(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult {
    ok(state.toggle_two_factor(&id).await.map_err(fail)?)
}

// Notifications

pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<NotificationFilter>,
) -> ApiResult {
    let notifications = state.store.notifications(&filter).await;
    ok(json!({
        "notifications": notifications,
        "unread": state.store.unread_count().await,
    }))
}

pub async fn mark_notification_read(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult {
    ok(state.store.mark_notification_read(&id).await.map_err(fail)?)
}

pub async fn mark_all_notifications_read(State(state): State<Arc<AppState>>) -> ApiResult {
    let marked = state.store.mark_all_notifications_read().await;
    ok(json!({ "marked": marked }))
}

pub async fn delete_notification(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult {
    state.store.delete_notification(&id).await.map_err(fail)?;
    ok(json!({ "deleted": id }))
}

// Receipts

pub async fn list_receipts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReceiptQuery>,
) -> ApiResult {
    let receipts: Vec<StoredReceipt> = state
        .store
        .receipts(query.transaction_id.as_deref())
        .await
        .into_iter()
        .map(StoredReceipt::from)
        .collect();
    ok(receipts)
}

pub async fn upload_receipt(
    State(state): State<Arc<AppState>>,
    Json(upload): Json<ReceiptUpload>,
) -> ApiResult {
    respond(StatusCode::CREATED, state.upload_receipt(upload).await.map_err(fail)?)
}

pub async fn verify_receipt(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult {
    ok(state.verify_receipt(&id).await.map_err(fail)?)
}

pub async fn delete_receipt(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult {
    ok(state.delete_receipt(&id).await.map_err(fail)?)
}

// Wallet

pub async fn wallet_status(State(state): State<Arc<AppState>>) -> ApiResult {
    let connection = state.wallet.current().await;
    ok(json!({
        "connected": connection.is_some(),
        "connection": connection,
    }))
}

pub async fn connect_wallet(State(state): State<Arc<AppState>>) -> ApiResult {
    ok(state.wallet.connect().await.map_err(fail)?)
}

pub async fn disconnect_wallet(State(state): State<Arc<AppState>>) -> ApiResult {
    state.wallet.disconnect().await;
    ok(json!({ "connected": false }))
}

pub async fn switch_network(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SwitchNetworkRequest>,
) -> ApiResult {
    state
        .wallet
        .switch_network(&request.chain_id)
        .await
        .map_err(fail)?;
    ok(json!({ "chainId": request.chain_id }))
}

// Simulation settings

pub async fn get_simulation_config(State(state): State<Arc<AppState>>) -> ApiResult {
    ok(state.simulation().await)
}

pub async fn update_simulation_config(
    State(state): State<Arc<AppState>>,
    Json(update): Json<SimulationConfigUpdate>,
) -> ApiResult {
    ok(state.update_simulation(&update).await.map_err(fail)?)
}
