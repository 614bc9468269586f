//! # API Error Mapping
//!
//! Everything a handler can fail with ends up as an [`ApiError`]: a status
//! code plus a `{code, message}` JSON body.
//!
//! ```text
//! ValidationError ─┐
//! CoreError ───────┼──► 400 with a rule-specific code
//!   TransactionNotFound ──► 404
//! DbError::Domain ─┘
//! DbError::NotFound ─────► 404
//! missing X-User-ID ─────► 401
//! any other DbError ─────► 500, details logged, generic message returned
//! ```

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use kasir_core::{CoreError, ValidationError};
use kasir_db::DbError;
use serde::{Deserialize, Serialize};
use tracing::error;

/// Wire shape of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        ApiError {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, code, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn internal() -> Self {
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "An unexpected error occurred, please try again",
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.code.to_string(),
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::bad_request("VALIDATION_ERROR", err.to_string())
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::TransactionNotFound(_) => {
                return ApiError::new(StatusCode::NOT_FOUND, "TRANSACTION_NOT_FOUND", err.to_string())
            }
            CoreError::Validation(inner) => {
                return ApiError::bad_request("VALIDATION_ERROR", inner.to_string())
            }
            CoreError::EmptyCart => "EMPTY_CART",
            CoreError::InvalidQuantity { .. } => "INVALID_QUANTITY",
            CoreError::ProductNotFound(_) => "PRODUCT_NOT_FOUND",
            CoreError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            CoreError::DiscountNotFound(_) => "DISCOUNT_NOT_FOUND",
            CoreError::DiscountNotGlobal(_) => "DISCOUNT_NOT_SELECTABLE",
            CoreError::DiscountInactive(_) => "DISCOUNT_INACTIVE",
            CoreError::DiscountExpired(_) => "DISCOUNT_EXPIRED",
            CoreError::MinimumOrderNotMet { .. } => "MINIMUM_ORDER_NOT_MET",
        };
        ApiError::bad_request(code, err.to_string())
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Domain(rule) => rule.into(),
            DbError::NotFound { .. } => ApiError::not_found(err.to_string()),
            DbError::ForeignKeyViolation { .. } => ApiError::bad_request(
                "INVALID_REFERENCE",
                "A referenced record does not exist",
            ),
            other => {
                error!(error = %other, "Storage failure");
                ApiError::internal()
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request("MALFORMED_REQUEST", rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request("MALFORMED_REQUEST", rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::bad_request("MALFORMED_REQUEST", rejection.body_text())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use kasir_core::Money;

    #[test]
    fn test_business_rules_are_client_errors() {
        let err: ApiError = DbError::Domain(CoreError::InsufficientStock {
            product_id: 1,
            name: "Aqua".to_string(),
            available: 3,
            requested: 5,
        })
        .into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "INSUFFICIENT_STOCK");

        let err: ApiError = CoreError::MinimumOrderNotMet {
            discount_id: 2,
            minimum: Money::from_major(50_000),
            order_total: Money::from_major(32_000),
        }
        .into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "MINIMUM_ORDER_NOT_MET");
    }

    #[test]
    fn test_not_found_mapping() {
        let err: ApiError = DbError::Domain(CoreError::TransactionNotFound(9)).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err: ApiError = DbError::not_found("Purchase", 9).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        // A missing product inside a checkout is a rejected request.
        let err: ApiError = CoreError::ProductNotFound(9).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_storage_failures_hide_details() {
        let err: ApiError = DbError::QueryFailed("disk I/O error at /var/lib".to_string()).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message.contains("/var/lib"));
    }
}
