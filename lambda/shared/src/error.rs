// HTTP-facing error taxonomy shared by every function.
use lambda_http::{Body, Error, Response};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{error, warn};

use crate::jwt::AuthError;
use crate::store::StoreError;
use crate::validate::ValidationError;

const INTERNAL: &str = "Internal Server Error";

#[derive(Debug, Error)]
pub enum ApiError {
    // 400
    #[error("{0}")]
    BadRequest(String),
    #[error("{message}")]
    Validation { field: String, message: String },

    // 401
    #[error("{0}")]
    Unauthorized(String),

    // 404
    #[error("{0}")]
    NotFound(String),

    // 500
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) | ApiError::Validation { .. } => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::NotFound(_) => 404,
            ApiError::Internal(_) => 500,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            ApiError::Validation { field, message } => json!({
                "error": message,
                "field": field,
            }),
            other => json!({ "error": other.to_string() }),
        }
    }

    pub fn into_response(self) -> Result<Response<Body>, Error> {
        Ok(Response::builder()
            .status(self.status_code())
            .header("content-type", "application/json")
            .body(Body::Text(self.to_json().to_string()))?)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation {
            field: err.field,
            message: err.message,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        error!(error = %err, "storage request failed");
        ApiError::internal(INTERNAL)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            // The issuer being unreachable says nothing about the token.
            AuthError::KeySetFetch(_) => {
                error!(error = %err, "key set unavailable");
                ApiError::internal(INTERNAL)
            }
            err => {
                warn!(error = %err, "authentication failed");
                ApiError::unauthorized("Unauthorized")
            }
        }
    }
}
