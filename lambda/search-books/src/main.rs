use lambda_http::http::Method;
use lambda_http::{run, service_fn, tracing, Error};
use shared::config;
use shared::local::{self, SampleRequest};
mod google_books;
mod http_handler;
use google_books::{BooksApi, DEFAULT_BASE_URL};
use http_handler::function_handler;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let in_lambda = local::is_lambda();
    if !in_lambda {
        local::load_dotenv();
    }
    tracing::init_default_subscriber();

    let base_url =
        config::optional("BOOKS_API_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let api = BooksApi::new(
        reqwest::Client::new(),
        base_url,
        config::optional("GOOGLE_BOOKS_API_KEY"),
    );

    if !in_lambda {
        let event = SampleRequest::new(Method::GET, "/search")
            .query("q", "the hobbit")
            .build()?;
        let response = function_handler(&api, event).await?;
        local::print_response(&response);
        return Ok(());
    }

    run(service_fn(|event| function_handler(&api, event))).await
}
