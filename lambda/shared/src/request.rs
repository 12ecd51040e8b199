use lambda_http::{Request, RequestExt};
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::ApiError;

/// The `{id}` path parameter of single-record routes.
pub fn book_id(event: &Request) -> Result<String, ApiError> {
    match event.path_parameters().first("id") {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(ApiError::bad_request("Book ID is required")),
    }
}

pub fn query_param(event: &Request, name: &str) -> Option<String> {
    event
        .query_string_parameters()
        .first(name)
        .map(str::to_string)
}

pub fn json_body<T: DeserializeOwned>(event: &Request) -> Result<T, ApiError> {
    serde_json::from_slice(event.body().as_ref()).map_err(|err| {
        warn!(error = %err, "could not parse request body");
        ApiError::bad_request("Invalid request body")
    })
}

/// Like [`json_body`], but an empty body yields the type's default.
pub fn optional_json_body<T: DeserializeOwned + Default>(event: &Request) -> Result<T, ApiError> {
    if event.body().as_ref().iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    json_body(event)
}
