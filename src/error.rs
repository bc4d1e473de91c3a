use actix_web::http::StatusCode;
use actix_web::{error, HttpRequest, HttpResponse, ResponseError};
use sqlx::error::ErrorKind;
use thiserror::Error;

use crate::core::PipelineError;
use crate::models::ErrorResponse;
use crate::services::{AuthError, CacheError, IconError, PostgresError, TelegramError};

/// Error returned by every handler, rendered as a JSON [`ErrorResponse`]
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Upstream(String),

    #[error("{0}")]
    Database(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn kind(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation_failed",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::Upstream(_) => "upstream_error",
            ApiError::Database(_) => "database_error",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        HttpResponse::build(status).json(ErrorResponse {
            error: self.kind().to_string(),
            message: self.to_string(),
            status_code: status.as_u16(),
        })
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        tracing::info!("Validation failed: field_errors={:?}", errors.field_errors().keys());
        ApiError::Validation(errors.to_string())
    }
}

impl From<PostgresError> for ApiError {
    fn from(err: PostgresError) -> Self {
        match err {
            PostgresError::NotFound(message) => ApiError::NotFound(message),
            PostgresError::Conflict(message) => ApiError::Conflict(message),
            PostgresError::SqlxError(sqlx::Error::RowNotFound) => {
                ApiError::NotFound("Record not found".to_string())
            }
            PostgresError::SqlxError(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                ApiError::Conflict("Record already exists".to_string())
            }
            PostgresError::SqlxError(sqlx::Error::Database(db)) => match db.kind() {
                ErrorKind::ForeignKeyViolation => {
                    tracing::info!("Rejected write, missing reference: {}", db.message());
                    ApiError::BadRequest("Referenced record does not exist".to_string())
                }
                ErrorKind::CheckViolation => {
                    tracing::info!("Rejected write, check failed: {}", db.message());
                    ApiError::BadRequest("Value is out of the allowed range".to_string())
                }
                // string_data_right_truncation
                _ if db.code().as_deref() == Some("22001") => {
                    ApiError::BadRequest("Value is too long".to_string())
                }
                _ => {
                    tracing::error!("Database error: {}", db);
                    ApiError::Database("Database error".to_string())
                }
            },
            other => {
                tracing::error!("Database error: {}", other);
                ApiError::Database("Database error".to_string())
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        tracing::debug!("Rejected admin request: {}", err);
        match err {
            AuthError::InvalidCredentials => ApiError::Unauthorized("Invalid credentials".into()),
            AuthError::MissingToken => ApiError::Unauthorized("Missing authorization token".into()),
            AuthError::InvalidToken(_) | AuthError::Forbidden(_) => {
                ApiError::Unauthorized("Invalid or expired token".into())
            }
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Busy | PipelineError::AlreadyPublished(_) => {
                ApiError::Conflict(err.to_string())
            }
            PipelineError::NotFound(_) => ApiError::NotFound(err.to_string()),
            PipelineError::NoChannels => ApiError::BadRequest(err.to_string()),
            PipelineError::Store(e) => e.into(),
            PipelineError::Scrape(_) => ApiError::Internal(err.to_string()),
            PipelineError::AllChannelsFailed(_)
            | PipelineError::Fetch(_)
            | PipelineError::Ai(_)
            | PipelineError::Telegram(_)
            | PipelineError::Vk(_) => ApiError::Upstream(err.to_string()),
        }
    }
}

impl From<TelegramError> for ApiError {
    fn from(err: TelegramError) -> Self {
        match err {
            TelegramError::NotConfigured => ApiError::BadRequest(err.to_string()),
            other => ApiError::Upstream(other.to_string()),
        }
    }
}

impl From<IconError> for ApiError {
    fn from(err: IconError) -> Self {
        match err {
            IconError::NotFound(_) => ApiError::NotFound(err.to_string()),
            IconError::Io(e) => {
                tracing::error!("Icon storage error: {}", e);
                ApiError::Internal("Icon storage error".to_string())
            }
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl From<CacheError> for ApiError {
    fn from(err: CacheError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    ApiError::BadRequest(format!("Invalid JSON: {}", err)).into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("Query error on {}: {}", req.path(), err);
    ApiError::BadRequest(format!("Invalid query: {}", err)).into()
}

/// Handle malformed path segments such as a non-numeric id
pub fn handle_path_error(err: error::PathError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("Path error on {}: {}", req.path(), err);
    ApiError::BadRequest(format!("Invalid path: {}", err)).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn test_error_envelope() {
        let response = ApiError::NotFound("Service 7 not found".into()).error_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "not_found");
        assert_eq!(json["message"], "Service 7 not found");
        assert_eq!(json["status_code"], 404);
    }

    #[test]
    fn test_postgres_error_mapping() {
        let not_found: ApiError = PostgresError::SqlxError(sqlx::Error::RowNotFound).into();
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);

        let conflict: ApiError = PostgresError::Conflict("duplicate".into()).into();
        assert_eq!(conflict.status_code(), StatusCode::CONFLICT);

        let pool: ApiError = PostgresError::SqlxError(sqlx::Error::PoolTimedOut).into();
        assert_eq!(pool.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(pool.to_string(), "Database error");
    }

    #[test]
    fn test_pipeline_error_mapping() {
        assert_eq!(ApiError::from(PipelineError::Busy).status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::from(PipelineError::AllChannelsFailed("x".into())).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(ApiError::from(PipelineError::NotFound(3)).status_code(), StatusCode::NOT_FOUND);
    }
}
