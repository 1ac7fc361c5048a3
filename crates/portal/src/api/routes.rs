//! API route definitions

use crate::api::handlers;
use crate::app::AppState;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

/// Create the main API router
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Health and status endpoints
        .route("/healthz", get(handlers::health_check))
        .route("/status", get(handlers::system_status))
        // Auth endpoints
        .route("/auth/login", post(handlers::login))
        .route("/auth/register", post(handlers::register))
        .route("/auth/logout", post(handlers::logout))
        .route("/auth/session", get(handlers::current_session))
        // Payment endpoints
        .route("/currencies", get(handlers::list_currencies))
        .route("/payment-requests", get(handlers::list_payment_requests))
        .route("/payments/estimate", post(handlers::estimate_payment))
        .route("/payments", post(handlers::submit_payment))
        // Transaction endpoints
        .route("/transactions", get(handlers::list_transactions))
        .route("/transactions/:id", get(handlers::get_transaction))
        .route("/transactions/:id/cancel", post(handlers::cancel_confirmation))
        // Admin endpoints
        .route(
            "/admin/transactions/:id/review",
            post(handlers::review_transaction),
        )
        .route(
            "/admin/users",
            get(handlers::list_users).post(handlers::create_user),
        )
        .route(
            "/admin/users/:id",
            put(handlers::update_user).delete(handlers::delete_user),
        )
        .route("/admin/users/:id/verify", post(handlers::verify_user))
        .route("/admin/users/:id/two-factor", post(handlers::toggle_two_factor))
        // Notification endpoints
        .route("/notifications", get(handlers::list_notifications))
        .route(
            "/notifications/read-all",
            post(handlers::mark_all_notifications_read),
        )
        .route("/notifications/:id/read", post(handlers::mark_notification_read))
        .route("/notifications/:id", delete(handlers::delete_notification))
        // Receipt endpoints
        .route(
            "/receipts",
            get(handlers::list_receipts).post(handlers::upload_receipt),
        )
        .route("/receipts/:id/verify", post(handlers::verify_receipt))
        .route("/receipts/:id", delete(handlers::delete_receipt))
        // Wallet endpoints
        .route("/wallet", get(handlers::wallet_status))
        .route("/wallet/connect", post(handlers::connect_wallet))
        .route("/wallet/disconnect", post(handlers::disconnect_wallet))
        .route("/wallet/switch-network", post(handlers::switch_network))
        // Simulation settings
        .route(
            "/simulation/config",
            get(handlers::get_simulation_config).put(handlers::update_simulation_config),
        )
}
