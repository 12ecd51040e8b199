use serde_json::Value;
use thiserror::Error;

use crate::book::{Book, BookDraft, BookField, BookPatch, BookStatus, ValidDraft};

pub const RATING_RANGE: std::ops::RangeInclusive<i64> = 1..=10;

const INVALID_STATUS: &str = "Invalid status. Must be one of: WANT_TO_READ, READING, READ";

/// A rejected write, naming the field at fault.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub fn parse_status(raw: &str) -> Result<BookStatus, ValidationError> {
    raw.parse()
        .map_err(|_| ValidationError::new("status", INVALID_STATUS))
}

/// Checks a create request and fills in the default status.
///
/// Dates are passed through untouched; in particular nothing checks that a
/// book was finished after it was started.
pub fn validate_draft(draft: BookDraft) -> Result<ValidDraft, ValidationError> {
    let title = required_text(BookField::Title, draft.title)?;
    let author = required_text(BookField::Author, draft.author)?;

    let status = match draft.status.as_deref() {
        None | Some("") => BookStatus::default(),
        Some(raw) => parse_status(raw)?,
    };

    if let Some(rating) = draft.rating {
        check_rating(rating)?;
    }

    Ok(ValidDraft {
        title,
        author,
        series: non_empty(draft.series),
        status,
        rating: draft.rating,
        review: non_empty(draft.review),
        tags: draft.tags.unwrap_or_default(),
        started_at: non_empty(draft.started_at),
        finished_at: non_empty(draft.finished_at),
        thumbnail: non_empty(draft.thumbnail),
        kind: non_empty(draft.kind),
        comments: non_empty(draft.comments),
    })
}

/// Turns an update body into a patch, type-checking every known field.
/// Unknown keys, `id` included, are ignored.
pub fn patch_from_json(body: &Value) -> Result<BookPatch, ValidationError> {
    let object = body
        .as_object()
        .ok_or_else(|| ValidationError::new("body", "Request body must be a JSON object"))?;

    let mut patch = BookPatch::default();
    for (name, value) in object {
        let Some(field) = BookField::from_name(name) else {
            continue;
        };

        match field {
            BookField::Title | BookField::Author => match value.as_str() {
                Some(text) if !text.trim().is_empty() => patch.set(field, value.clone()),
                _ => return Err(required(field)),
            },
            BookField::Status => {
                let raw = value
                    .as_str()
                    .ok_or_else(|| ValidationError::new("status", INVALID_STATUS))?;
                parse_status(raw)?;
                patch.set(field, value.clone());
            }
            BookField::Rating => match value {
                Value::Null => patch.clear(field),
                Value::Number(number) => {
                    let rating = number.as_i64().ok_or_else(rating_error)?;
                    check_rating(rating)?;
                    patch.set(field, value.clone());
                }
                _ => return Err(rating_error()),
            },
            BookField::Tags => match value {
                Value::Null => patch.clear(field),
                Value::Array(items) if items.iter().all(Value::is_string) => {
                    patch.set(field, value.clone())
                }
                _ => {
                    return Err(ValidationError::new(
                        field.name(),
                        "tags must be a list of strings",
                    ))
                }
            },
            BookField::Series
            | BookField::Review
            | BookField::StartedAt
            | BookField::FinishedAt
            | BookField::Thumbnail
            | BookField::Kind
            | BookField::Comments => match value {
                Value::Null => patch.clear(field),
                Value::String(text) if text.is_empty() => patch.clear(field),
                Value::String(_) => patch.set(field, value.clone()),
                _ => {
                    return Err(ValidationError::new(
                        field.name(),
                        format!("{} must be a string", field.name()),
                    ))
                }
            },
        }
    }

    Ok(patch)
}

/// Invariants every stored record must satisfy.
pub fn validate_book(book: &Book) -> Result<(), ValidationError> {
    if book.title.trim().is_empty() {
        return Err(required(BookField::Title));
    }
    if book.author.trim().is_empty() {
        return Err(required(BookField::Author));
    }
    if let Some(rating) = book.rating {
        check_rating(rating)?;
    }
    Ok(())
}

fn required_text(field: BookField, value: Option<String>) -> Result<String, ValidationError> {
    match value {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(required(field)),
    }
}

fn required(field: BookField) -> ValidationError {
    let name = field.name();
    let mut label = name.to_string();
    label[..1].make_ascii_uppercase();
    ValidationError::new(name, format!("{label} is required"))
}

fn check_rating(rating: i64) -> Result<(), ValidationError> {
    if RATING_RANGE.contains(&rating) {
        Ok(())
    } else {
        Err(rating_error())
    }
}

fn rating_error() -> ValidationError {
    ValidationError::new(
        "rating",
        format!(
            "Rating must be a whole number between {} and {}",
            RATING_RANGE.start(),
            RATING_RANGE.end()
        ),
    )
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.is_empty())
}
