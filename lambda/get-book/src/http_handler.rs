use lambda_http::{Body, Error, Request, Response};
use shared::book::Book;
use shared::error::ApiError;
use shared::store::BookStore;
use shared::{identity, request, response};
use tracing::debug;

pub(crate) async fn function_handler(
    store: &impl BookStore,
    event: Request,
) -> Result<Response<Body>, Error> {
    response::respond(200, get_book(store, &event).await)
}

async fn get_book(store: &impl BookStore, event: &Request) -> Result<Book, ApiError> {
    let owner = identity::owner_id(event)?;
    let book_id = request::book_id(event)?;

    match store.get(&owner, &book_id).await? {
        Some(book) => Ok(book),
        None => {
            debug!(owner = %owner, book_id = %book_id, "book not found");
            Err(ApiError::not_found("Book not found"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lambda_http::http::Method;
    use serde_json::json;
    use shared::local::SampleRequest;
    use shared::testing::{body_json, book, MemoryBookStore};

    fn get(owner: &str, id: &str) -> Request {
        SampleRequest::new(Method::GET, format!("/books/{id}"))
            .owner(owner)
            .path_param("id", id)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn returns_the_callers_book() {
        let mut dune = book("b-1", "Dune", "Frank Herbert");
        dune.tags = vec!["sci-fi".to_string()];
        let store = MemoryBookStore::with_books("user-1", [dune]);

        let response = function_handler(&store, get("user-1", "b-1")).await.unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(
            body_json(&response),
            json!({
                "id": "b-1",
                "title": "Dune",
                "author": "Frank Herbert",
                "status": "WANT_TO_READ",
                "tags": ["sci-fi"],
            })
        );
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let store = MemoryBookStore::new();
        let response = function_handler(&store, get("user-1", "xyz")).await.unwrap();
        assert_eq!(response.status(), 404);
        assert_eq!(body_json(&response), json!({"error": "Book not found"}));
    }

    #[tokio::test]
    async fn other_owners_books_are_invisible() {
        let store = MemoryBookStore::with_books("user-1", [book("b-1", "Dune", "Frank Herbert")]);
        let response = function_handler(&store, get("user-2", "b-1")).await.unwrap();
        assert_eq!(response.status(), 404);
    }

    #[tokio::test]
    async fn missing_path_id_is_a_bad_request() {
        let store = MemoryBookStore::new();
        let event = SampleRequest::new(Method::GET, "/books/")
            .owner("user-1")
            .build()
            .unwrap();
        let response = function_handler(&store, event).await.unwrap();
        assert_eq!(response.status(), 400);
        assert_eq!(body_json(&response), json!({"error": "Book ID is required"}));
    }

    #[tokio::test]
    async fn anonymous_and_storage_failures() {
        let store = MemoryBookStore::new();
        let event = SampleRequest::new(Method::GET, "/books/b-1")
            .path_param("id", "b-1")
            .build()
            .unwrap();
        let response = function_handler(&store, event).await.unwrap();
        assert_eq!(response.status(), 401);

        let store = MemoryBookStore::failing();
        let response = function_handler(&store, get("user-1", "b-1")).await.unwrap();
        assert_eq!(response.status(), 500);
    }
}
