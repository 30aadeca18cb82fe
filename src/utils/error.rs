use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// How a reward transfer failed. Transient failures are eligible for the
/// ledger's bounded retry; permanent ones require operator intervention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferFailure {
    Transient(String),
    Permanent(String),
}

impl fmt::Display for TransferFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferFailure::Transient(msg) => write!(f, "transient: {}", msg),
            TransferFailure::Permanent(msg) => write!(f, "permanent: {}", msg),
        }
    }
}

#[derive(Debug)]
pub enum AppError {
    DatabaseError(String),
    ValidationError(String),
    NotFound(String),
    Unauthorized(String),
    SurveyClosed(String),
    DuplicateParticipation(String),
    IncompleteAnswers(String),
    InvalidAnswer(String),
    RewardSettlement(TransferFailure),
    BadRequest(String),
    InternalError(String),
    SerializationError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::SurveyClosed(msg) => write!(f, "Survey closed: {}", msg),
            AppError::DuplicateParticipation(msg) => write!(f, "Duplicate participation: {}", msg),
            AppError::IncompleteAnswers(msg) => write!(f, "Incomplete answers: {}", msg),
            AppError::InvalidAnswer(msg) => write!(f, "Invalid answer: {}", msg),
            AppError::RewardSettlement(failure) => write!(f, "Reward settlement failed: {}", failure),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            AppError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            AppError::DatabaseError(msg) => {
                eprintln!("❌ Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "Database operation failed".to_string(),
                )
            }
            AppError::ValidationError(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                msg,
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                msg,
            ),
            AppError::Unauthorized(msg) => (
                StatusCode::FORBIDDEN,
                "UNAUTHORIZED",
                msg,
            ),
            AppError::SurveyClosed(msg) => (
                StatusCode::CONFLICT,
                "SURVEY_CLOSED",
                msg,
            ),
            AppError::DuplicateParticipation(msg) => (
                StatusCode::CONFLICT,
                "DUPLICATE_PARTICIPATION",
                msg,
            ),
            AppError::IncompleteAnswers(msg) => (
                StatusCode::BAD_REQUEST,
                "INCOMPLETE_ANSWERS",
                msg,
            ),
            AppError::InvalidAnswer(msg) => (
                StatusCode::BAD_REQUEST,
                "INVALID_ANSWER",
                msg,
            ),
            AppError::RewardSettlement(failure) => {
                eprintln!("❌ Reward settlement error: {}", failure);
                let error_type = match failure {
                    TransferFailure::Transient(_) => "REWARD_SETTLEMENT_TRANSIENT",
                    TransferFailure::Permanent(_) => "REWARD_SETTLEMENT_PERMANENT",
                };
                (
                    StatusCode::BAD_GATEWAY,
                    error_type,
                    "Reward settlement failed".to_string(),
                )
            }
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                "BAD_REQUEST",
                msg,
            ),
            AppError::InternalError(msg) => {
                eprintln!("❌ Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
            AppError::SerializationError(msg) => {
                eprintln!("❌ Serialization error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "SERIALIZATION_ERROR",
                    "Data serialization failed".to_string(),
                )
            }
        };

        let error_response = ErrorResponse {
            error: error_type.to_string(),
            message,
            details: None,
        };

        (status, Json(error_response)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

impl From<mongodb::bson::ser::Error> for AppError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        AppError::SerializationError(err.to_string())
    }
}

impl From<mongodb::bson::de::Error> for AppError {
    fn from(err: mongodb::bson::de::Error) -> Self {
        AppError::SerializationError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::SerializationError(err.to_string())
    }
}
