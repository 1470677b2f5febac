use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::inventory::StockIssue;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Cart is empty")]
    CartEmpty,

    #[error("Some items have insufficient stock")]
    StockInsufficient(Vec<StockIssue>),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn not_found(what: &str) -> Self {
        AppError::NotFound(format!("{what} not found"))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::BadRequest(_)
            | AppError::CartEmpty
            | AppError::StockInsufficient(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::DbError(_) | AppError::OrmError(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::BadRequest(_) => "bad_request",
            AppError::CartEmpty => "cart_empty",
            AppError::StockInsufficient(_) => "stock_insufficient",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Forbidden(_) => "forbidden",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::DbError(_) | AppError::OrmError(_) | AppError::Internal(_) => {
                "internal_error"
            }
        }
    }

    /// Postgres unique violations surface as conflicts instead of 500s.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            AppError::DbError(sqlx::Error::Database(db)) => db.is_unique_violation(),
            AppError::OrmError(err) => matches!(
                err.sql_err(),
                Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
            ),
            _ => false,
        }
    }

    /// Replace a unique violation with a conflict carrying `message`; other errors pass through.
    pub fn conflict_on_unique(self, message: &str) -> Self {
        if self.is_unique_violation() {
            AppError::Conflict(message.to_string())
        } else {
            self
        }
    }

    pub fn is_foreign_key_violation(&self) -> bool {
        match self {
            AppError::DbError(sqlx::Error::Database(db)) => db.is_foreign_key_violation(),
            AppError::OrmError(err) => matches!(
                err.sql_err(),
                Some(sea_orm::SqlErr::ForeignKeyConstraintViolation(_))
            ),
            _ => false,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(format_validation_errors(&errors))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

fn format_validation_errors(errors: &validator::ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{field}: validation failed"))
            })
        })
        .collect();
    messages.sort();
    messages.join("; ")
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "stockIssues", skip_serializing_if = "Option::is_none")]
    pub stock_issues: Option<Vec<StockIssue>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        }

        let message = self.to_string();
        let kind = self.kind().to_string();
        let stock_issues = match self {
            AppError::StockInsufficient(issues) => Some(issues),
            _ => None,
        };

        let body = ErrorBody {
            message,
            kind,
            stock_issues,
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;
    use validator::Validate;

    #[derive(Validate)]
    struct Probe {
        #[validate(length(min = 1, message = "name is required"))]
        name: String,
    }

    #[test]
    fn statuses_follow_error_taxonomy() {
        assert_eq!(AppError::CartEmpty.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::StockInsufficient(vec![]).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Conflict("dup".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Unauthorized("no token".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn stock_issues_are_rendered_in_body() {
        let issue = StockIssue {
            product_id: Uuid::nil(),
            product_name: "Mango".into(),
            requested_quantity: 3,
            available_stock: 2,
            message: "Sorry, only 2 left in stock for Mango".into(),
        };
        let body = ErrorBody {
            message: AppError::StockInsufficient(vec![]).to_string(),
            kind: "stock_insufficient".into(),
            stock_issues: Some(vec![issue]),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["type"], "stock_insufficient");
        assert_eq!(json["stockIssues"][0]["requestedQuantity"], 3);
        assert_eq!(json["stockIssues"][0]["availableStock"], 2);
    }

    #[test]
    fn internal_errors_hide_driver_details() {
        let err = AppError::Internal(anyhow::anyhow!("password=hunter2"));
        assert_eq!(err.to_string(), "Internal Server Error");
    }

    #[test]
    fn validation_errors_carry_field_messages() {
        let err: AppError = Probe { name: String::new() }.validate().unwrap_err().into();
        assert_eq!(err.to_string(), "name is required");
        assert_eq!(err.kind(), "validation_error");
    }
}
