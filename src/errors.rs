use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

/// Domain failure taxonomy. Every variant maps to one HTTP status at the
/// boundary; nothing here is fatal to the process.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Validation(String),
    #[error("database error")]
    Database(#[from] sqlx::Error),
    #[error("{0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    status: u16,
    message: String,
    detail: String,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let (message, detail) = match self {
            ApiError::Database(err) => {
                log::error!("Database failure: {err}");
                (
                    "An unexpected error occurred".to_string(),
                    "database error".to_string(),
                )
            }
            ApiError::Internal(detail) => {
                log::error!("Internal failure: {detail}");
                (
                    "An unexpected error occurred".to_string(),
                    detail.clone(),
                )
            }
            ApiError::Validation(detail) => ("Validation failed".to_string(), detail.clone()),
            other => (other.to_string(), kind_name(other).to_string()),
        };

        HttpResponse::build(status).json(ErrorBody {
            status: status.as_u16(),
            message,
            detail,
        })
    }
}

fn kind_name(err: &ApiError) -> &'static str {
    match err {
        ApiError::NotFound(_) => "not found",
        ApiError::BadRequest(_) => "bad request",
        ApiError::Unauthorized(_) => "unauthorized",
        ApiError::Forbidden(_) => "forbidden",
        ApiError::Validation(_) => "validation",
        ApiError::Database(_) => "database error",
        ApiError::Internal(_) => "internal",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            ApiError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::BadRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Unauthorized("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Forbidden("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Internal("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn auth_failures_keep_the_json_body_shape() {
        let resp = ApiError::Forbidden(
            "Access Denied: You do not have permission to perform this action.".into(),
        )
        .error_response();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let bytes = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], 403);
        assert_eq!(body["detail"], "forbidden");

        let resp = ApiError::Unauthorized("Invalid or missing token".into()).error_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let bytes = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], 401);
        assert_eq!(body["message"], "Invalid or missing token");
    }
}
