use lambda_http::http::Method;
use lambda_http::{run, service_fn, tracing, Error};
use serde_json::json;
use shared::config;
use shared::local::{self, SampleRequest};
use shared::store::DynamoBookStore;
mod http_handler;
mod render;
mod upload;
use http_handler::function_handler;
use upload::S3ExportSink;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let in_lambda = local::is_lambda();
    if !in_lambda {
        local::load_dotenv();
    }
    tracing::init_default_subscriber();

    let bucket = config::required("EXPORTS_BUCKET_NAME")?;
    let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let store = DynamoBookStore::new(
        aws_sdk_dynamodb::Client::new(&sdk_config),
        config::table_name(),
    );
    let sink = S3ExportSink::new(aws_sdk_s3::Client::new(&sdk_config), bucket);

    if !in_lambda {
        let event = SampleRequest::new(Method::POST, "/books/export")
            .owner(local::sample_owner())
            .json(&json!({"format": "csv"}))
            .build()?;
        let response = function_handler(&store, &sink, event).await?;
        local::print_response(&response);
        return Ok(());
    }

    run(service_fn(|event| function_handler(&store, &sink, event))).await
}
