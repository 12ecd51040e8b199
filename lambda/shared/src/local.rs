//! Running a function once outside Lambda.
//!
//! When `LAMBDA_TASK_ROOT` is unset the binaries load `.env`, build a
//! sample gateway request with [`SampleRequest`] and print what the handler
//! returns instead of starting the runtime loop.

use lambda_http::http::header::{HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use lambda_http::http::{Method, Uri};
use lambda_http::request::RequestContext;
use lambda_http::{Body, Error, Request, RequestExt, Response};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::env;
use tracing::{debug, info};

const DEFAULT_OWNER: &str = "test-user-id";

pub fn is_lambda() -> bool {
    env::var_os("LAMBDA_TASK_ROOT").is_some()
}

pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => debug!(path = %path.display(), "loaded environment file"),
        Err(err) if err.not_found() => {}
        Err(err) => info!(error = %err, "ignoring unreadable .env"),
    }
}

/// Owner used for local runs, `LOCAL_OWNER_ID` if set.
pub fn sample_owner() -> String {
    env::var("LOCAL_OWNER_ID").unwrap_or_else(|_| DEFAULT_OWNER.to_string())
}

pub fn print_response(response: &Response<Body>) {
    println!("--- Local execution ---");
    println!("Status: {}", response.status().as_u16());

    let raw = response.body().as_ref();
    match serde_json::from_slice::<Value>(raw) {
        Ok(body) => match serde_json::to_string_pretty(&body) {
            Ok(pretty) => println!("{pretty}"),
            Err(_) => println!("{body}"),
        },
        Err(_) => println!("{}", String::from_utf8_lossy(raw)),
    }
}

/// Builds a request shaped like an HTTP API (payload v2) event.
pub struct SampleRequest {
    method: Method,
    path: String,
    owner: Option<String>,
    path_params: HashMap<String, String>,
    query: HashMap<String, String>,
    headers: Vec<(String, String)>,
    body: Body,
}

impl SampleRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            owner: None,
            path_params: HashMap::new(),
            query: HashMap::new(),
            headers: Vec::new(),
            body: Body::Empty,
        }
    }

    /// Puts `owner` in the authorizer's JWT claims as `sub`.
    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.insert(name.into(), value.into());
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn bearer(self, token: &str) -> Self {
        self.header(AUTHORIZATION.as_str(), format!("Bearer {token}"))
    }

    pub fn json(mut self, body: &Value) -> Self {
        self.body = Body::Text(body.to_string());
        self.header(CONTENT_TYPE.as_str(), "application/json")
    }

    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.body = Body::Text(body.into());
        self
    }

    pub fn build(self) -> Result<Request, Error> {
        let context: RequestContext =
            serde_json::from_value(gateway_context(&self.method, &self.path, self.owner.as_deref()))?;

        let mut request = Request::new(self.body);
        *request.method_mut() = self.method;
        *request.uri_mut() = self.path.parse::<Uri>()?;
        for (name, value) in &self.headers {
            request.headers_mut().insert(
                HeaderName::from_bytes(name.as_bytes())?,
                HeaderValue::from_str(value)?,
            );
        }

        Ok(request
            .with_path_parameters(self.path_params)
            .with_query_string_parameters(self.query)
            .with_request_context(context))
    }
}

fn gateway_context(method: &Method, path: &str, owner: Option<&str>) -> Value {
    let mut context = json!({
        "routeKey": "$default",
        "accountId": "123456789012",
        "stage": "$default",
        "requestId": "local-request",
        "apiId": "local",
        "domainName": "localhost",
        "domainPrefix": "localhost",
        "time": "01/Jan/2025:00:00:00 +0000",
        "timeEpoch": 1_735_689_600_000_i64,
        "http": {
            "method": method.as_str(),
            "path": path,
            "protocol": "HTTP/1.1",
            "sourceIp": "127.0.0.1",
            "userAgent": "bookshelf-local",
        },
    });
    if let Some(owner) = owner {
        context["authorizer"] = json!({
            "jwt": { "claims": { "sub": owner }, "scopes": null }
        });
    }
    context
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_requests_carry_parameters_and_body() {
        let event = SampleRequest::new(Method::PUT, "/books/b-1")
            .owner("abc-123")
            .path_param("id", "b-1")
            .query("status", "READ")
            .json(&json!({"title": "Dune"}))
            .build()
            .unwrap();

        assert_eq!(event.method(), &Method::PUT);
        assert_eq!(event.uri().path(), "/books/b-1");
        assert_eq!(event.path_parameters().first("id"), Some("b-1"));
        assert_eq!(event.query_string_parameters().first("status"), Some("READ"));
        assert_eq!(event.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(event.body().as_ref(), br#"{"title":"Dune"}"#);
        assert!(event.request_context_ref().is_some());
    }

    #[test]
    fn bearer_sets_the_authorization_header() {
        let event = SampleRequest::new(Method::GET, "/books")
            .bearer("abc.def.ghi")
            .build()
            .unwrap();
        assert_eq!(event.headers()[AUTHORIZATION], "Bearer abc.def.ghi");
    }
}
