use lambda_http::{Body, Error, Request, Response};
use shared::error::ApiError;
use shared::{request, response};
use tracing::error;

use crate::google_books::{BooksApi, SearchResult};

pub(crate) async fn function_handler(api: &BooksApi, event: Request) -> Result<Response<Body>, Error> {
    response::respond(200, search_books(api, &event).await)
}

async fn search_books(api: &BooksApi, event: &Request) -> Result<Vec<SearchResult>, ApiError> {
    let query = match request::query_param(event, "q") {
        Some(query) if !query.trim().is_empty() => query,
        _ => return Err(ApiError::bad_request("Missing required query parameter 'q'")),
    };

    api.search(&query).await.map_err(|err| {
        error!(query = %query, error = ?err, "book search failed");
        ApiError::internal("Failed to search for books")
    })
}
