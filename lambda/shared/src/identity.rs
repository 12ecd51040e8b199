//! Caller identity as established by the API Gateway authorizer.
//!
//! The gateway has already verified the token, so this only reads the claim
//! map it forwarded. The list function does its own verification instead,
//! see [`crate::jwt`].

use lambda_http::{Request, RequestExt};
use serde_json::Value;
use tracing::warn;

use crate::error::ApiError;

const UNAUTHORIZED: &str = "Unauthorized: Could not extract user ID";

pub fn owner_id(event: &Request) -> Result<String, ApiError> {
    let Some(context) = event.request_context_ref() else {
        warn!("request carries no API Gateway context");
        return Err(ApiError::unauthorized(UNAUTHORIZED));
    };

    let context = serde_json::to_value(context).map_err(|err| {
        warn!(error = %err, "could not read request context");
        ApiError::unauthorized(UNAUTHORIZED)
    })?;

    owner_from_context(&context).ok_or_else(|| {
        let authorizer = context.get("authorizer").cloned().unwrap_or_default();
        warn!(%authorizer, "no user ID in authorizer claims");
        ApiError::unauthorized(UNAUTHORIZED)
    })
}

/// Claims live under `authorizer.jwt.claims` for HTTP APIs and directly
/// under `authorizer.claims` for REST APIs with a Cognito authorizer.
pub fn owner_from_context(context: &Value) -> Option<String> {
    let authorizer = context.get("authorizer")?;
    let claims = authorizer
        .pointer("/jwt/claims")
        .or_else(|| authorizer.get("claims"))?;

    claim(claims, "sub").or_else(|| claim(claims, "cognito:username"))
}

fn claim(claims: &Value, name: &str) -> Option<String> {
    claims
        .get(name)?
        .as_str()
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
