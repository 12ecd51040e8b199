use lambda_http::{Body, Error, Request, Response};
use shared::book::{Book, BookDraft};
use shared::error::ApiError;
use shared::store::BookStore;
use shared::{identity, request, response, validate};
use tracing::info;
use uuid::Uuid;

pub(crate) async fn function_handler(
    store: &impl BookStore,
    event: Request,
) -> Result<Response<Body>, Error> {
    response::respond(201, create_book(store, &event).await)
}

async fn create_book(store: &impl BookStore, event: &Request) -> Result<Book, ApiError> {
    let owner = identity::owner_id(event)?;
    let draft: BookDraft = request::json_body(event)?;
    let book = validate::validate_draft(draft)?.into_book(Uuid::new_v4().to_string());

    store.put(&owner, &book).await?;
    info!(owner = %owner, book_id = %book.id, status = %book.status, "created book");
    Ok(book)
}
