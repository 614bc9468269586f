use axum::extract::State;
use axum::Json;
use chrono::Utc;

use crate::dto::DiscountResponse;
use crate::error::ApiResult;
use crate::AppState;

/// Global discounts the cashier can pick right now. Item-scoped
/// discounts apply automatically and are never listed here.
pub async fn list_active_discounts(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<DiscountResponse>>> {
    let discounts = state.db.discounts().list_selectable(Utc::now()).await?;
    Ok(Json(discounts.into_iter().map(Into::into).collect()))
}
