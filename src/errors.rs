use actix_web::HttpResponse;
use thiserror::Error;

use crate::domain::errors::DomainError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Failure(String),

    #[error("{0}")]
    AccessDenied(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Machine-discriminable kind, so a front end can tell "stock ran out"
    /// from "not authorized" from "server couldn't save your request".
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::BadRequest(_) => "bad_request",
            AppError::Failure(_) => "failure",
            AppError::AccessDenied(_) => "access_denied",
            AppError::Internal(_) => "internal",
        }
    }
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::NotFound(msg) => AppError::NotFound(msg),
            DomainError::BadRequest(msg) => AppError::BadRequest(msg),
            DomainError::Failure(msg) => AppError::Failure(msg),
            DomainError::AccessDenied(msg) => AppError::AccessDenied(msg),
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let body = |message: &str| {
            serde_json::json!({
                "error": message,
                "kind": self.kind(),
            })
        };
        match self {
            AppError::NotFound(_) => HttpResponse::NotFound().json(body(&self.to_string())),
            AppError::BadRequest(_) => HttpResponse::BadRequest().json(body(&self.to_string())),
            AppError::Failure(_) => {
                HttpResponse::InternalServerError().json(body(&self.to_string()))
            }
            AppError::AccessDenied(_) => HttpResponse::Unauthorized().json(body(&self.to_string())),
            AppError::Internal(_) => {
                HttpResponse::InternalServerError().json(body("Internal server error"))
            }
        }
    }
}
