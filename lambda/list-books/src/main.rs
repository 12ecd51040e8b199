use lambda_http::http::Method;
use lambda_http::{run, service_fn, tracing, Error};
use shared::config::{self, CognitoConfig};
use shared::jwt::{HttpKeySetSource, JwtVerifier, KeyCache};
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

    let cognito = CognitoConfig::from_env()?;
    let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let client = aws_sdk_dynamodb::Client::new(&sdk_config);
    let store = DynamoBookStore::new(client, config::table_name());

    // Lives for the whole execution environment so warm invocations reuse keys.
    let keys = KeyCache::new(HttpKeySetSource::new(
        reqwest::Client::new(),
        cognito.jwks_url(),
    ));
    let verifier = JwtVerifier::new(keys, cognito.issuer());

    if !in_lambda {
        let mut sample = SampleRequest::new(Method::GET, "/books").query("status", "READING");
        if let Some(token) = config::optional("LOCAL_ACCESS_TOKEN") {
            sample = sample.bearer(&token);
        }
        let response = function_handler(&store, &verifier, sample.build()?).await?;
        local::print_response(&response);
        return Ok(());
    }

    run(service_fn(|event| function_handler(&store, &verifier, event))).await
}
