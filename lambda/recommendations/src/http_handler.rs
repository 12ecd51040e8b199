use lambda_http::{Body, Error, Request, Response};
use serde::Serialize;
use shared::error::ApiError;
use shared::store::BookStore;
use shared::{identity, response};
use tracing::info;

use crate::generator::TextGenerator;
use crate::recommend::{recommend, Recommendation, Recommendations};

#[derive(Debug, Serialize)]
struct RecommendationResponse<'a> {
    recommendations: &'a [Recommendation],
    source: &'static str,
}

pub(crate) async fn function_handler(
    store: &impl BookStore,
    generator: &impl TextGenerator,
    event: Request,
) -> Result<Response<Body>, Error> {
    match recommendations(store, generator, &event).await {
        Ok(outcome) => response::json(
            200,
            &RecommendationResponse {
                recommendations: outcome.items(),
                source: outcome.source(),
            },
        ),
        Err(err) => err.into_response(),
    }
}

async fn recommendations(
    store: &impl BookStore,
    generator: &impl TextGenerator,
    event: &Request,
) -> Result<Recommendations, ApiError> {
    let owner = identity::owner_id(event)?;
    let books = store.query_by_owner(&owner, None).await?;

    let outcome = recommend(&books, generator).await;
    info!(
        owner = %owner,
        books = books.len(),
        source = outcome.source(),
        "recommended books"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use lambda_http::http::Method;
    use serde_json::json;
    use shared::book::BookStatus;
    use shared::local::SampleRequest;
    use shared::testing::{body_json, book, MemoryBookStore};

    struct Unavailable;

    #[async_trait]
    impl TextGenerator for Unavailable {
        async fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
            Err(anyhow!("model not enabled in this region"))
        }
    }

    struct Fixed(&'static str);

    #[async_trait]
    impl TextGenerator for Fixed {
        async fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
            Ok(self.0.to_string())
        }
    }

    fn request(owner: &str) -> Request {
        SampleRequest::new(Method::GET, "/recommendations")
            .owner(owner)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn no_books_yields_the_five_defaults() {
        let store = MemoryBookStore::new();
        let response = function_handler(&store, &Fixed("[]"), request("user-1"))
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        let body = body_json(&response);
        assert_eq!(body["source"], "default");
        assert_eq!(body["recommendations"].as_array().unwrap().len(), 5);
        assert_eq!(
            body["recommendations"][0],
            json!({
                "title": "The Hobbit",
                "author": "J.R.R. Tolkien",
                "genre": "Fantasy",
                "reason": "A classic adventure perfect for starting your reading journey",
            })
        );
    }

    #[tokio::test]
    async fn generator_failure_is_absorbed() {
        let mut dune = book("b-1", "Dune", "Frank Herbert");
        dune.status = BookStatus::Read;
        let store = MemoryBookStore::with_books("user-1", [dune]);

        let response = function_handler(&store, &Unavailable, request("user-1"))
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(body_json(&response)["source"], "default");
    }

    #[tokio::test]
    async fn generated_items_are_returned() {
        let store = MemoryBookStore::with_books("user-1", [book("b-1", "Emma", "Jane Austen")]);
        let generator = Fixed(
            r#"Here you go: [
  {"title": "Persuasion", "author": "Jane Austen", "genre": "Romance", "reason": "More Austen"},
  {"title": "Villette", "author": "Charlotte Bronte", "genre": "Classic", "reason": "Quiet intensity"},
  {"title": "Middlemarch", "author": "George Eliot", "genre": "Classic", "reason": "Provincial life"},
  {"title": "Cranford", "author": "Elizabeth Gaskell", "genre": "Classic", "reason": "Gentle satire"},
  {"title": "Evelina", "author": "Frances Burney", "genre": "Classic", "reason": "Austen's model"}
]"#,
        );

        let response = function_handler(&store, &generator, request("user-1"))
            .await
            .unwrap();
        let body = body_json(&response);
        assert_eq!(body["source"], "generated");
        assert_eq!(body["recommendations"].as_array().unwrap().len(), 5);
        assert_eq!(body["recommendations"][0]["title"], "Persuasion");
    }

    #[tokio::test]
    async fn storage_failure_is_not_masked() {
        let store = MemoryBookStore::failing();
        let response = function_handler(&store, &Unavailable, request("user-1"))
            .await
            .unwrap();
        assert_eq!(response.status(), 500);
    }

    #[tokio::test]
    async fn anonymous_callers_are_rejected() {
        let store = MemoryBookStore::new();
        let event = SampleRequest::new(Method::GET, "/recommendations").build().unwrap();
        let response = function_handler(&store, &Unavailable, event).await.unwrap();
        assert_eq!(response.status(), 401);
    }
}
