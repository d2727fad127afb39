use crate::models::ApiResponse;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Inventory store unavailable: {0}")]
    RepositoryUnavailable(String),

    #[error("Inventory store corrupt: {0}")]
    RepositoryCorrupt(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("All prizes have been claimed")]
    SoldOut,

    #[error("Draw unavailable: {0}")]
    DrawUnavailable(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Auth error: {0}")]
    AuthError(String),

    #[error("External API error: {0}")]
    ExternalApiError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::DbErr),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("HTTP request error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl AppError {
    /// Collapse a transport-level failure into `RepositoryUnavailable`, keeping
    /// errors that already carry repository meaning.
    pub fn into_repository_error(self) -> AppError {
        match self {
            AppError::RepositoryUnavailable(_)
            | AppError::RepositoryCorrupt(_)
            | AppError::NotFound(_) => self,
            AppError::SerdeJsonError(e) => AppError::RepositoryCorrupt(e.to_string()),
            other => AppError::RepositoryUnavailable(other.to_string()),
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let (status_code, error_code, message) = match self {
            AppError::SoldOut => {
                log::warn!("Draw rejected: sold out");
                (
                    actix_web::http::StatusCode::SERVICE_UNAVAILABLE,
                    "SOLD_OUT",
                    "All prizes have been claimed".to_string(),
                )
            }
            AppError::DrawUnavailable(msg) => {
                log::error!("Draw unavailable: {msg}");
                (
                    actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "DRAW_UNAVAILABLE",
                    "Draw is temporarily unavailable".to_string(),
                )
            }
            AppError::ValidationError(msg) => {
                log::warn!("Validation error: {msg}");
                (
                    actix_web::http::StatusCode::BAD_REQUEST,
                    "VALIDATION_ERROR",
                    msg.clone(),
                )
            }
            AppError::AuthError(msg) => {
                log::warn!("Authentication error: {msg}");
                (
                    actix_web::http::StatusCode::UNAUTHORIZED,
                    "AUTH_ERROR",
                    msg.clone(),
                )
            }
            AppError::NotFound(msg) => (
                actix_web::http::StatusCode::NOT_FOUND,
                "NOT_FOUND",
                msg.clone(),
            ),
            AppError::RepositoryUnavailable(msg) | AppError::RepositoryCorrupt(msg) => {
                log::error!("Inventory store error: {msg}");
                (
                    actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "INVENTORY_ERROR",
                    "Inventory store error".to_string(),
                )
            }
            AppError::ExternalApiError(msg) => {
                log::error!("External API error: {msg}");
                (
                    actix_web::http::StatusCode::BAD_GATEWAY,
                    "EXTERNAL_API_ERROR",
                    msg.clone(),
                )
            }
            AppError::DatabaseError(err) => {
                log::error!("Database error: {err}");
                (
                    actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "Database error".to_string(),
                )
            }
            _ => {
                log::error!("Internal error: {self}");
                (
                    actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error".to_string(),
                )
            }
        };

        HttpResponse::build(status_code).json(ApiResponse::error(error_code, message))
    }
}
