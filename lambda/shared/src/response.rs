use lambda_http::{Body, Error, Response};
use serde::Serialize;

use crate::error::ApiError;

pub fn json<T: Serialize>(status: u16, value: &T) -> Result<Response<Body>, Error> {
    let body = serde_json::to_string(value)?;
    Ok(Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Body::Text(body))?)
}

pub fn no_content() -> Result<Response<Body>, Error> {
    Ok(Response::builder().status(204).body(Body::Empty)?)
}

/// Renders a handler outcome: the value with `status` on success, the
/// error's own status and JSON body otherwise.
pub fn respond<T: Serialize>(
    status: u16,
    outcome: Result<T, ApiError>,
) -> Result<Response<Body>, Error> {
    match outcome {
        Ok(value) => json(status, &value),
        Err(err) => err.into_response(),
    }
}
