use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::Json;

use crate::dto::ProductResponse;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub async fn get_product(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<ProductResponse>> {
    let Path(id) = id?;
    let product = state
        .db
        .products()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Product not found: {id}")))?;

    Ok(Json(product.into()))
}
