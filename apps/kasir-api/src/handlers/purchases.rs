use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::dto::{PurchaseBody, PurchaseResponse, PurchaseWithItemsResponse};
use crate::error::ApiResult;
use crate::extract::ActingUser;
use crate::AppState;

/// Records a restocking purchase; stock and cost prices change atomically with it.
pub async fn create_purchase(
    State(state): State<AppState>,
    user: ActingUser,
    body: Result<Json<PurchaseBody>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<PurchaseWithItemsResponse>)> {
    let Json(body) = body?;
    let request = body.into_request()?;

    let created = state
        .db
        .purchases()
        .create(&request, Some(user.as_str()))
        .await?;

    Ok((StatusCode::CREATED, Json(created.into())))
}

pub async fn list_purchases(State(state): State<AppState>) -> ApiResult<Json<Vec<PurchaseResponse>>> {
    let purchases = state.db.purchases().list().await?;
    Ok(Json(purchases.into_iter().map(Into::into).collect()))
}

pub async fn get_purchase(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<PurchaseWithItemsResponse>> {
    let Path(id) = id?;
    let purchase = state.db.purchases().get_by_id(id).await?;
    Ok(Json(purchase.into()))
}
