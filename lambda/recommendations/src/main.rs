use lambda_http::http::Method;
use lambda_http::{run, service_fn, tracing, Error};
use shared::config;
use shared::local::{self, SampleRequest};
use shared::store::DynamoBookStore;
mod generator;
mod http_handler;
mod recommend;
use generator::{BedrockGenerator, DEFAULT_MODEL_ID};
use http_handler::function_handler;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let in_lambda = local::is_lambda();
    if !in_lambda {
        local::load_dotenv();
    }
    tracing::init_default_subscriber();

    let model_id =
        config::optional("BEDROCK_MODEL_ID").unwrap_or_else(|| DEFAULT_MODEL_ID.to_string());
    let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let store = DynamoBookStore::new(
        aws_sdk_dynamodb::Client::new(&sdk_config),
        config::table_name(),
    );
    let generator = BedrockGenerator::new(aws_sdk_bedrockruntime::Client::new(&sdk_config), model_id);

    if !in_lambda {
        let event = SampleRequest::new(Method::GET, "/recommendations")
            .owner(local::sample_owner())
            .build()?;
        let response = function_handler(&store, &generator, event).await?;
        local::print_response(&response);
        return Ok(());
    }

    run(service_fn(|event| function_handler(&store, &generator, event))).await
}
