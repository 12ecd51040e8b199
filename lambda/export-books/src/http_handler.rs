use chrono::{DateTime, SecondsFormat, Utc};
use lambda_http::{Body, Error, Request, Response};
use serde::{Deserialize, Serialize};
use shared::book::BookStatus;
use shared::error::ApiError;
use shared::store::BookStore;
use shared::{identity, request, response, validate};
use tracing::{error, info};

use crate::render::{self, ExportFormat};
use crate::upload::{ExportObject, ExportSink, LINK_VALIDITY};

#[derive(Debug, Default, Deserialize)]
struct ExportRequest {
    #[serde(default)]
    format: Option<String>,
    #[serde(default)]
    filters: ExportFilters,
}

#[derive(Debug, Default, Deserialize)]
struct ExportFilters {
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Serialize)]
struct ExportResponse {
    download_url: String,
    format: &'static str,
    filename: String,
    expires_at: String,
}

pub(crate) async fn function_handler(
    store: &impl BookStore,
    sink: &impl ExportSink,
    event: Request,
) -> Result<Response<Body>, Error> {
    response::respond(200, export_books(store, sink, &event, Utc::now()).await)
}

async fn export_books(
    store: &impl BookStore,
    sink: &impl ExportSink,
    event: &Request,
    now: DateTime<Utc>,
) -> Result<ExportResponse, ApiError> {
    let owner = identity::owner_id(event)?;
    let options: ExportRequest = request::optional_json_body(event)?;
    let format = ExportFormat::parse(options.format.as_deref())?;
    let status = status_filter(options.filters.status.as_deref())?;

    let books = store.query_by_owner(&owner, status).await?;
    let body = render::render(format, &books).map_err(|err| {
        error!(owner = %owner, error = %err, "rendering export failed");
        ApiError::internal("Failed to generate export data")
    })?;

    let filename = format!(
        "books-{}.{}",
        now.format("%Y%m%d-%H%M%S"),
        format.extension()
    );
    let key = format!("exports/{owner}/{filename}");

    // A failed presign leaves the uploaded object behind.
    let object = ExportObject {
        key: key.clone(),
        body,
        content_type: format.content_type(),
        created_at: now,
    };
    let download_url = async {
        sink.upload(object).await?;
        sink.download_link(&key, LINK_VALIDITY).await
    }
    .await
    .map_err(|err| {
        error!(owner = %owner, key = %key, error = %err, "export upload failed");
        ApiError::internal("Failed to upload export file")
    })?;

    let expires_at = now + chrono::Duration::seconds(LINK_VALIDITY.as_secs() as i64);
    info!(owner = %owner, key = %key, count = books.len(), "exported books");

    Ok(ExportResponse {
        download_url,
        format: format.as_str(),
        filename,
        expires_at: expires_at.to_rfc3339_opts(SecondsFormat::Secs, true),
    })
}

fn status_filter(raw: Option<&str>) -> Result<Option<BookStatus>, ApiError> {
    match raw {
        None | Some("") => Ok(None),
        Some(raw) => Ok(Some(validate::parse_status(raw)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use lambda_http::http::Method;
    use serde_json::{json, Value};
    use shared::local::SampleRequest;
    use shared::testing::{body_json, book, MemoryBookStore};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingSink {
        uploads: Mutex<Vec<ExportObject>>,
        links: Mutex<Vec<(String, Duration)>>,
        fail_upload: bool,
    }

    #[async_trait]
    impl ExportSink for RecordingSink {
        async fn upload(&self, object: ExportObject) -> anyhow::Result<()> {
            if self.fail_upload {
                anyhow::bail!("access denied");
            }
            self.uploads.lock().unwrap().push(object);
            Ok(())
        }

        async fn download_link(&self, key: &str, valid_for: Duration) -> anyhow::Result<String> {
            self.links.lock().unwrap().push((key.to_string(), valid_for));
            Ok(format!("https://exports.example.com/{key}?signature=abc"))
        }
    }

    fn library() -> MemoryBookStore {
        let mut dune = book("b-1", "Dune", "Frank Herbert");
        dune.status = BookStatus::Read;
        let emma = book("b-2", "Emma", "Jane Austen");
        MemoryBookStore::with_books("user-1", [dune, emma])
    }

    fn export(body: Option<Value>) -> Request {
        let sample = SampleRequest::new(Method::POST, "/books/export").owner("user-1");
        let sample = match body {
            Some(body) => sample.json(&body),
            None => sample,
        };
        sample.build().unwrap()
    }

    fn at_noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 12, 4, 9).unwrap()
    }

    #[tokio::test]
    async fn empty_body_exports_everything_as_csv() {
        let store = library();
        let sink = RecordingSink::default();

        let exported = export_books(&store, &sink, &export(None), at_noon()).await.unwrap();
        assert_eq!(exported.format, "csv");
        assert_eq!(exported.filename, "books-20240305-120409.csv");
        assert_eq!(exported.expires_at, "2024-03-05T12:19:09Z");
        assert_eq!(
            exported.download_url,
            "https://exports.example.com/exports/user-1/books-20240305-120409.csv?signature=abc"
        );

        let uploads = sink.uploads.lock().unwrap();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].key, "exports/user-1/books-20240305-120409.csv");
        assert_eq!(uploads[0].content_type, "text/csv");
        assert_eq!(uploads[0].created_at, at_noon());
        let csv = String::from_utf8(uploads[0].body.clone()).unwrap();
        assert_eq!(csv.lines().count(), 3);

        let links = sink.links.lock().unwrap();
        assert_eq!(links[0].1, Duration::from_secs(900));
    }

    #[tokio::test]
    async fn json_export_honours_the_status_filter() {
        let store = library();
        let sink = RecordingSink::default();
        let event = export(Some(json!({"format": "json", "filters": {"status": "READ"}})));

        let exported = export_books(&store, &sink, &event, at_noon()).await.unwrap();
        assert_eq!(exported.filename, "books-20240305-120409.json");

        let uploads = sink.uploads.lock().unwrap();
        assert_eq!(uploads[0].content_type, "application/json");
        let rows: Value = serde_json::from_slice(&uploads[0].body).unwrap();
        assert_eq!(rows.as_array().unwrap().len(), 1);
        assert_eq!(rows[0]["title"], "Dune");
    }

    #[tokio::test]
    async fn handler_answers_with_the_download_details() {
        let store = library();
        let sink = RecordingSink::default();
        let response = function_handler(&store, &sink, export(Some(json!({"format": "csv"}))))
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        let body = body_json(&response);
        assert_eq!(body["format"], "csv");
        assert!(body["download_url"].as_str().unwrap().starts_with("https://"));
        assert!(body["filename"].as_str().unwrap().starts_with("books-"));
        assert!(body["expires_at"].as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn bad_options_are_rejected_before_any_upload() {
        let store = library();
        let sink = RecordingSink::default();

        for body in [
            json!({"format": "xml"}),
            json!({"filters": {"status": "DONE"}}),
            json!({"format": 3}),
        ] {
            let response = function_handler(&store, &sink, export(Some(body))).await.unwrap();
            assert_eq!(response.status(), 400);
        }
        assert!(sink.uploads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn upload_and_storage_failures_are_server_errors() {
        let store = library();
        let sink = RecordingSink {
            fail_upload: true,
            ..RecordingSink::default()
        };
        let response = function_handler(&store, &sink, export(None)).await.unwrap();
        assert_eq!(response.status(), 500);
        assert_eq!(body_json(&response), json!({"error": "Failed to upload export file"}));
        assert!(sink.links.lock().unwrap().is_empty());

        let store = MemoryBookStore::failing();
        let sink = RecordingSink::default();
        let response = function_handler(&store, &sink, export(None)).await.unwrap();
        assert_eq!(response.status(), 500);
    }

    #[tokio::test]
    async fn anonymous_callers_are_rejected() {
        let store = library();
        let sink = RecordingSink::default();
        let event = SampleRequest::new(Method::POST, "/books/export").build().unwrap();
        let response = function_handler(&store, &sink, event).await.unwrap();
        assert_eq!(response.status(), 401);
    }
}
