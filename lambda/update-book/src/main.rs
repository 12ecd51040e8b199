use lambda_http::http::Method;
use lambda_http::{run, service_fn, tracing, Error};
use serde_json::json;
use shared::config;
use shared::local::{self, SampleRequest};
use shared::store::DynamoBookStore;
mod http_handler;
use http_handler::function_handler;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let in_lambda = local::is_lambda();
    if !in_lambda {
        local::load_dotenv();
    }
    tracing::init_default_subscriber();

    let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let client = aws_sdk_dynamodb::Client::new(&sdk_config);
    let store = DynamoBookStore::new(client, config::table_name());

    if !in_lambda {
        let book_id = std::env::var("LOCAL_BOOK_ID").unwrap_or_else(|_| "test-book-id".to_string());
        let event = SampleRequest::new(Method::PUT, format!("/books/{book_id}"))
            .owner(local::sample_owner())
            .path_param("id", book_id)
            .json(&json!({"status": "READ", "rating": 8, "finished_at": "2024-03-01"}))
            .build()?;
        let response = function_handler(&store, event).await?;
        local::print_response(&response);
        return Ok(());
    }

    run(service_fn(|event| function_handler(&store, event))).await
}
