//! # Transaction Handlers
//!
//! ```text
//! POST /api/transactions        checkout → 201 with the persisted sale
//! GET  /api/transactions        newest first, optional local-day filter
//! GET  /api/transactions/{id}   header + line items, 404 if absent
//! ```

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono_tz::Tz;
use kasir_db::DateRange;
use tracing::debug;

use crate::dto::{CheckoutBody, TransactionListParams, TransactionResponse, TransactionWithDetailsResponse};
use crate::error::{ApiError, ApiResult};
use crate::extract::ActingUser;
use crate::AppState;

pub async fn create_transaction(
    State(state): State<AppState>,
    user: ActingUser,
    body: Result<Json<CheckoutBody>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TransactionWithDetailsResponse>)> {
    let Json(body) = body?;
    let request = body.into_request()?;

    let created = state
        .db
        .transactions()
        .checkout(&request, Some(user.as_str()))
        .await?;

    Ok((StatusCode::CREATED, Json(created.into())))
}

pub async fn list_transactions(
    State(state): State<AppState>,
    params: Result<Query<TransactionListParams>, QueryRejection>,
) -> ApiResult<Json<Vec<TransactionResponse>>> {
    let Query(params) = params?;
    let repo = state.db.transactions();

    let transactions = match (params.start_date, params.end_date) {
        (None, None) => repo.get_all().await?,
        (Some(start_date), Some(end_date)) => {
            let tz = match params.timezone.as_deref() {
                Some(name) => parse_timezone(name)?,
                None => state.config.default_timezone,
            };
            let range = DateRange::local_days(start_date, end_date, &tz)?;
            debug!(%start_date, %end_date, tz = tz.name(), "Listing transactions by local day");
            repo.get_by_date_range(range).await?
        }
        _ => {
            return Err(ApiError::bad_request(
                "VALIDATION_ERROR",
                "start_date and end_date must be given together",
            ))
        }
    };

    Ok(Json(transactions.into_iter().map(Into::into).collect()))
}

pub async fn get_transaction(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<TransactionWithDetailsResponse>> {
    let Path(id) = id?;
    let transaction = state.db.transactions().get_by_id(id).await?;
    Ok(Json(transaction.into()))
}

fn parse_timezone(name: &str) -> ApiResult<Tz> {
    name.parse::<Tz>()
        .map_err(|_| ApiError::bad_request("INVALID_TIMEZONE", format!("Unknown timezone: {name}")))
}
