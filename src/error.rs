use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::utils::{
    error_codes, error_to_api_response, validation::FieldErrors, validation_error_response,
};

/// 对外统一展示的内部错误信息，不暴露真实原因
pub const GENERIC_ERROR_MESSAGE: &str = "Une erreur s'est produite.";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("validation failed")]
    Validation(FieldErrors),
    #[error("permission denied")]
    Forbidden,
    #[error("not found")]
    NotFound,
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("password hashing error: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("mail error: {0}")]
    Mail(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("multipart error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),
}

impl AppError {
    /// 唯一约束冲突（如邮箱重复）单独归类，其余数据库错误视为内部错误
    pub fn from_write(err: sqlx::Error, conflict_message: &str) -> Self {
        let unique = err
            .as_database_error()
            .is_some_and(|db| db.is_unique_violation() || db.is_foreign_key_violation());
        if unique {
            AppError::Conflict(conflict_message.to_string())
        } else {
            AppError::Database(err)
        }
    }

    /// 只有数据库写入错误可能是冲突，哈希等其他错误原样返回
    pub fn into_conflict(self, conflict_message: &str) -> Self {
        match self {
            AppError::Database(err) => AppError::from_write(err, conflict_message),
            other => other,
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            AppError::Database(_)
                | AppError::Redis(_)
                | AppError::Hash(_)
                | AppError::Token(_)
                | AppError::Mail(_)
                | AppError::Io(_)
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_internal() {
            tracing::error!("Internal error: {}", self);
        }

        match self {
            AppError::Validation(errors) => validation_error_response(errors).into_response(),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                error_to_api_response::<()>(error_codes::PERMISSION_DENIED, "Accès refusé.".into()),
            )
                .into_response(),
            AppError::NotFound => (
                StatusCode::NOT_FOUND,
                error_to_api_response::<()>(error_codes::NOT_FOUND, "Page non trouvée.".into()),
            )
                .into_response(),
            AppError::Conflict(message) => (
                StatusCode::CONFLICT,
                error_to_api_response::<()>(error_codes::CONFLICT, message),
            )
                .into_response(),
            AppError::Multipart(e) => (
                StatusCode::BAD_REQUEST,
                error_to_api_response::<()>(error_codes::VALIDATION_ERROR, e.body_text()),
            )
                .into_response(),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response::<()>(
                    error_codes::INTERNAL_ERROR,
                    GENERIC_ERROR_MESSAGE.into(),
                ),
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_errors_are_masked() {
        let response = AppError::Mail("smtp down".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn non_database_errors_are_not_conflicts() {
        let err = AppError::from_write(sqlx::Error::RowNotFound, "dup");
        assert!(matches!(err, AppError::Database(_)));
    }

    #[test]
    fn hash_failure_stays_internal_on_write_paths() {
        let err = AppError::from(bcrypt::BcryptError::CostNotAllowed(1)).into_conflict("dup");
        assert!(matches!(err, AppError::Hash(_)));
        assert!(err.is_internal());

        let err = AppError::from(sqlx::Error::RowNotFound).into_conflict("dup");
        assert!(matches!(err, AppError::Database(_)));
    }

    #[test]
    fn not_found_maps_to_404() {
        assert_eq!(AppError::NotFound.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn forbidden_maps_to_403() {
        assert_eq!(AppError::Forbidden.into_response().status(), StatusCode::FORBIDDEN);
    }
}
