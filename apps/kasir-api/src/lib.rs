//! # Kasir API
//!
//! JSON REST server for the cashier client.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kasir API Server                                 │
//! │                                                                         │
//! │  Cashier client ──► HTTP (8080) ──► handlers ──► kasir-db ──► SQLite   │
//! │                          │                          │                   │
//! │                   TraceLayer span            checkout boundary          │
//! │                   (request_id, user_id)      (one sqlx transaction)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Routes
//! | Method | Path | |
//! |---|---|---|
//! | GET | `/health` | liveness + database ping |
//! | POST | `/api/transactions` | checkout (requires `X-User-ID`) |
//! | GET | `/api/transactions` | list, optional `start_date`/`end_date`/`timezone` |
//! | GET | `/api/transactions/{id}` | detail |
//! | GET | `/api/discounts/active` | selectable global discounts |
//! | GET | `/api/products/{id}` | product with margin |
//! | POST | `/api/purchases` | restock (requires `X-User-ID`) |
//! | GET | `/api/purchases` | list |
//! | GET | `/api/purchases/{id}` | detail |

pub mod config;
pub mod dto;
pub mod error;
pub mod extract;
pub mod handlers;

use std::sync::Arc;

use axum::http::{header, HeaderName, Method, Request};
use axum::routing::get;
use axum::Router;
use kasir_db::Database;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::config::ApiConfig;
use crate::handlers::{discounts, health, products, purchases, transactions};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Self {
        AppState {
            db,
            config: Arc::new(config),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    let api = Router::new()
        .route(
            "/transactions",
            get(transactions::list_transactions).post(transactions::create_transaction),
        )
        .route("/transactions/{id}", get(transactions::get_transaction))
        .route("/discounts/active", get(discounts::list_active_discounts))
        .route("/products/{id}", get(products::get_product))
        .route(
            "/purchases",
            get(purchases::list_purchases).post(purchases::create_purchase),
        )
        .route("/purchases/{id}", get(purchases::get_purchase));

    Router::new()
        .route("/health", get(health::health))
        .nest("/api", api)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_string)
                    .unwrap_or_else(|| Uuid::new_v4().to_string());

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    user_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}

fn cors_layer(config: &ApiConfig) -> CorsLayer {
    match &config.cors_origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(AllowOrigin::exact(origin.clone()))
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("x-user-id")]),
        None => CorsLayer::permissive(),
    }
}
