use lambda_http::{Body, Error, Request, Response};
use shared::book::{Book, BookStatus};
use shared::error::ApiError;
use shared::jwt::{JwtVerifier, KeySetSource};
use shared::store::BookStore;
use shared::{request, response, validate};
use tracing::info;

pub(crate) async fn function_handler<S: KeySetSource>(
    store: &impl BookStore,
    verifier: &JwtVerifier<S>,
    event: Request,
) -> Result<Response<Body>, Error> {
    response::respond(200, list_books(store, verifier, &event).await)
}

async fn list_books<S: KeySetSource>(
    store: &impl BookStore,
    verifier: &JwtVerifier<S>,
    event: &Request,
) -> Result<Vec<Book>, ApiError> {
    let owner = verifier.owner_from_headers(event.headers()).await?;
    let status = status_filter(event)?;

    let books = store.query_by_owner(&owner, status).await?;
    info!(owner = %owner, ?status, count = books.len(), "listed books");
    Ok(books)
}

fn status_filter(event: &Request) -> Result<Option<BookStatus>, ApiError> {
    match request::query_param(event, "status") {
        Some(raw) if !raw.is_empty() => Ok(Some(validate::parse_status(&raw)?)),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lambda_http::http::Method;
    use async_trait::async_trait;
    use jsonwebtoken::jwk::JwkSet;
    use serde_json::json;
    use shared::jwt::{AuthError, KeyCache};
    use shared::local::SampleRequest;
    use shared::testing::{
        access_token, body_json, book, MemoryBookStore, StaticKeySet, TEST_ISSUER,
    };

    struct UnreachableIssuer;

    #[async_trait]
    impl KeySetSource for UnreachableIssuer {
        async fn fetch(&self) -> Result<JwkSet, AuthError> {
            Err(AuthError::KeySetFetch("connection refused".to_string()))
        }
    }

    fn verifier() -> JwtVerifier<StaticKeySet> {
        JwtVerifier::new(KeyCache::new(StaticKeySet::default()), TEST_ISSUER)
    }

    fn library() -> MemoryBookStore {
        let mut dune = book("b-1", "Dune", "Frank Herbert");
        dune.status = BookStatus::Read;
        let mut emma = book("b-2", "Emma", "Jane Austen");
        emma.status = BookStatus::Reading;
        let hobbit = book("b-3", "The Hobbit", "J.R.R. Tolkien");
        let store = MemoryBookStore::with_books("user-1", [dune, emma, hobbit]);
        store.insert("user-2", &book("b-9", "Persuasion", "Jane Austen"));
        store
    }

    fn list(owner: &str) -> SampleRequest {
        SampleRequest::new(Method::GET, "/books").bearer(&access_token(owner))
    }

    fn titles(response: &Response<Body>) -> Vec<String> {
        let mut titles: Vec<String> = body_json(response)
            .as_array()
            .unwrap()
            .iter()
            .map(|book| book["title"].as_str().unwrap().to_string())
            .collect();
        titles.sort();
        titles
    }

    #[tokio::test]
    async fn lists_only_the_callers_books() {
        let store = library();
        let event = list("user-1").build().unwrap();
        let response = function_handler(&store, &verifier(), event).await.unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(titles(&response), ["Dune", "Emma", "The Hobbit"]);
    }

    #[tokio::test]
    async fn status_filter_returns_the_matching_subset() {
        let store = library();
        let event = list("user-1").query("status", "READING").build().unwrap();
        let response = function_handler(&store, &verifier(), event).await.unwrap();
        assert_eq!(titles(&response), ["Emma"]);

        let event = list("user-2").query("status", "READ").build().unwrap();
        let response = function_handler(&store, &verifier(), event).await.unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(body_json(&response), json!([]));
    }

    #[tokio::test]
    async fn invalid_status_filter_is_a_bad_request() {
        let store = library();
        let event = list("user-1").query("status", "FINISHED").build().unwrap();
        let response = function_handler(&store, &verifier(), event).await.unwrap();
        assert_eq!(response.status(), 400);
        assert_eq!(body_json(&response)["field"], "status");
    }

    #[tokio::test]
    async fn missing_or_forged_tokens_are_unauthorized() {
        let store = library();

        let event = SampleRequest::new(Method::GET, "/books").build().unwrap();
        let response = function_handler(&store, &verifier(), event).await.unwrap();
        assert_eq!(response.status(), 401);
        assert_eq!(body_json(&response), json!({"error": "Unauthorized"}));

        let event = SampleRequest::new(Method::GET, "/books")
            .bearer("not.a.token")
            .build()
            .unwrap();
        let response = function_handler(&store, &verifier(), event).await.unwrap();
        assert_eq!(response.status(), 401);
    }

    #[tokio::test]
    async fn storage_failure_is_a_server_error() {
        let store = MemoryBookStore::failing();
        let event = list("user-1").build().unwrap();
        let response = function_handler(&store, &verifier(), event).await.unwrap();
        assert_eq!(response.status(), 500);
    }

    #[tokio::test]
    async fn unreachable_key_issuer_is_a_server_error() {
        let store = library();
        let verifier = JwtVerifier::new(KeyCache::new(UnreachableIssuer), TEST_ISSUER);
        let event = list("user-1").build().unwrap();
        let response = function_handler(&store, &verifier, event).await.unwrap();

        assert_eq!(response.status(), 500);
        assert_eq!(body_json(&response), json!({"error": "Internal Server Error"}));
    }
}
