use lambda_http::{Body, Error, Request, Response};
use serde_json::Value;
use shared::book::Book;
use shared::error::ApiError;
use shared::store::BookStore;
use shared::{identity, request, response, validate};
use tracing::{debug, info};

pub(crate) async fn function_handler(
    store: &impl BookStore,
    event: Request,
) -> Result<Response<Body>, Error> {
    response::respond(200, update_book(store, &event).await)
}

/// Read, merge, write back. There is no version check between the read and
/// the put, so concurrent updates race and the last one wins.
async fn update_book(store: &impl BookStore, event: &Request) -> Result<Book, ApiError> {
    let owner = identity::owner_id(event)?;
    let book_id = request::book_id(event)?;

    let body: Value = request::json_body(event)?;
    let patch = validate::patch_from_json(&body)?;

    let Some(current) = store.get(&owner, &book_id).await? else {
        return Err(ApiError::not_found("Book not found"));
    };

    let updated = patch.apply(&current)?;
    validate::validate_book(&updated)?;
    store.put(&owner, &updated).await?;

    let fields: Vec<&str> = patch.fields().map(|field| field.name()).collect();
    debug!(?fields, "applied patch");
    info!(owner = %owner, book_id = %book_id, "updated book");
    Ok(updated)
}
