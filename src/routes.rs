//! HTTP router and shared application state.

use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{handlers, middleware, store::Store};

/// State shared with every handler through `State` extraction.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
}

impl AppState {
    pub fn new(store: impl Store + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        // Customers
        .route(
            "/customers",
            get(handlers::customers::list_customers).post(handlers::customers::save_customer),
        )
        .route(
            "/customers/{cid}",
            get(handlers::customers::get_customer).delete(handlers::customers::delete_customer),
        )
        .route(
            "/customers/{cid}/balance",
            get(handlers::customers::get_balance),
        )
        // Accounts
        .route(
            "/customers/{cid}/accounts",
            get(handlers::accounts::list_accounts).post(handlers::accounts::open_account),
        )
        .route(
            "/customers/{cid}/accounts/{aid}",
            get(handlers::accounts::get_account).delete(handlers::accounts::close_account),
        )
        // Money movement
        .route(
            "/customers/{cid}/accounts/{aid}/deposit",
            post(handlers::transactions::deposit),
        )
        .route(
            "/customers/{cid}/accounts/{aid}/withdraw",
            post(handlers::transactions::withdraw),
        )
        .route(
            "/customers/{cid}/transfers",
            post(handlers::transactions::transfer),
        )
        // Recipients
        .route(
            "/customers/{cid}/recipients",
            get(handlers::recipients::list_recipients).post(handlers::recipients::add_recipient),
        )
        .route(
            "/customers/{cid}/recipients/{rid}",
            delete(handlers::recipients::remove_recipient),
        );

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .nest("/api", api)
        .layer(axum_middleware::from_fn(middleware::request_log::log_requests))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
