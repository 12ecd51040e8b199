use lambda_http::{Body, Error, Request, Response};
use shared::error::ApiError;
use shared::store::BookStore;
use shared::{identity, request, response};
use tracing::info;

pub(crate) async fn function_handler(
    store: &impl BookStore,
    event: Request,
) -> Result<Response<Body>, Error> {
    match delete_book(store, &event).await {
        Ok(()) => response::no_content(),
        Err(err) => err.into_response(),
    }
}

async fn delete_book(store: &impl BookStore, event: &Request) -> Result<(), ApiError> {
    let owner = identity::owner_id(event)?;
    let book_id = request::book_id(event)?;

    // The delete itself is unconditional, so existence is checked first.
    if store.get(&owner, &book_id).await?.is_none() {
        return Err(ApiError::not_found("Book not found"));
    }
    store.delete(&owner, &book_id).await?;

    info!(owner = %owner, book_id = %book_id, "deleted book");
    Ok(())
}
