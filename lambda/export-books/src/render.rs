use anyhow::Context;
use shared::book::Book;
use shared::error::ApiError;

pub const CSV_HEADER: [&str; 12] = [
    "Title",
    "Author",
    "Series",
    "Status",
    "Rating",
    "Started Date",
    "Finished Date",
    "Tags",
    "Type",
    "Review",
    "Comments",
    "Thumbnail",
];

const TAG_SEPARATOR: &str = "; ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    /// Missing or empty means CSV.
    pub fn parse(raw: Option<&str>) -> Result<Self, ApiError> {
        match raw {
            None | Some("") | Some("csv") => Ok(ExportFormat::Csv),
            Some("json") => Ok(ExportFormat::Json),
            Some(_) => Err(ApiError::bad_request(
                "Invalid format. Supported formats: csv, json",
            )),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    pub fn extension(self) -> &'static str {
        self.as_str()
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Json => "application/json",
        }
    }
}

pub fn render(format: ExportFormat, books: &[Book]) -> anyhow::Result<Vec<u8>> {
    match format {
        ExportFormat::Csv => to_csv(books),
        ExportFormat::Json => serde_json::to_vec_pretty(books).context("serializing books"),
    }
}

fn to_csv(books: &[Book]) -> anyhow::Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    for book in books {
        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        writer.write_record([
            book.title.clone(),
            book.author.clone(),
            text(&book.series),
            book.status.as_str().to_string(),
            book.rating.map(|rating| rating.to_string()).unwrap_or_default(),
            text(&book.started_at),
            text(&book.finished_at),
            book.tags.join(TAG_SEPARATOR),
            text(&book.kind),
            text(&book.review),
            text(&book.comments),
            text(&book.thumbnail),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|err| err.into_error())
        .context("flushing CSV")
}
