use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::validate::ValidationError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookStatus {
    #[default]
    WantToRead,
    Reading,
    Read,
}

impl BookStatus {
    pub const ALL: [BookStatus; 3] = [BookStatus::WantToRead, BookStatus::Reading, BookStatus::Read];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::WantToRead => "WANT_TO_READ",
            BookStatus::Reading => "READING",
            BookStatus::Read => "READ",
        }
    }
}

impl fmt::Display for BookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown status {:?}", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for BookStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BookStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// A book as the API sees it. Storage keys never appear in this shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,
    #[serde(default)]
    pub status: BookStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

/// Create-request payload before validation.
#[derive(Debug, Default, Deserialize)]
pub struct BookDraft {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub series: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub rating: Option<i64>,
    #[serde(default)]
    pub review: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub finished_at: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub comments: Option<String>,
}

/// A draft that passed validation and only needs an identity to become a book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidDraft {
    pub title: String,
    pub author: String,
    pub series: Option<String>,
    pub status: BookStatus,
    pub rating: Option<i64>,
    pub review: Option<String>,
    pub tags: Vec<String>,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
    pub thumbnail: Option<String>,
    pub kind: Option<String>,
    pub comments: Option<String>,
}

impl ValidDraft {
    pub fn into_book(self, id: String) -> Book {
        Book {
            id,
            title: self.title,
            author: self.author,
            series: self.series,
            status: self.status,
            rating: self.rating,
            review: self.review,
            tags: self.tags,
            started_at: self.started_at,
            finished_at: self.finished_at,
            thumbnail: self.thumbnail,
            kind: self.kind,
            comments: self.comments,
        }
    }
}

/// Fields a client may change. `id` is deliberately absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BookField {
    Title,
    Author,
    Series,
    Status,
    Rating,
    Review,
    Tags,
    StartedAt,
    FinishedAt,
    Thumbnail,
    Kind,
    Comments,
}

impl BookField {
    pub const ALL: [BookField; 12] = [
        BookField::Title,
        BookField::Author,
        BookField::Series,
        BookField::Status,
        BookField::Rating,
        BookField::Review,
        BookField::Tags,
        BookField::StartedAt,
        BookField::FinishedAt,
        BookField::Thumbnail,
        BookField::Kind,
        BookField::Comments,
    ];

    /// Name of the field in the API representation.
    pub fn name(self) -> &'static str {
        match self {
            BookField::Title => "title",
            BookField::Author => "author",
            BookField::Series => "series",
            BookField::Status => "status",
            BookField::Rating => "rating",
            BookField::Review => "review",
            BookField::Tags => "tags",
            BookField::StartedAt => "started_at",
            BookField::FinishedAt => "finished_at",
            BookField::Thumbnail => "thumbnail",
            BookField::Kind => "type",
            BookField::Comments => "comments",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        BookField::ALL.into_iter().find(|field| field.name() == name)
    }
}

/// A partial update: each present field maps to its replacement value, or to
/// `None` when the field should be cleared. Fields not in the map are kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookPatch {
    changes: BTreeMap<BookField, Option<Value>>,
}

impl BookPatch {
    pub fn set(&mut self, field: BookField, value: Value) {
        self.changes.insert(field, Some(value));
    }

    pub fn clear(&mut self, field: BookField) {
        self.changes.insert(field, None);
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = BookField> + '_ {
        self.changes.keys().copied()
    }

    /// Overlays the patch on `book` and returns the merged record. The
    /// original is left untouched so a failed merge never leaks out.
    pub fn apply(&self, book: &Book) -> Result<Book, ValidationError> {
        let mut doc = match serde_json::to_value(book) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };

        for (field, change) in &self.changes {
            match change {
                Some(value) => {
                    doc.insert(field.name().to_string(), value.clone());
                }
                None => {
                    doc.remove(field.name());
                }
            }
        }

        let mut merged: Book = serde_json::from_value(Value::Object(doc))
            .map_err(|err| ValidationError::new("body", err.to_string()))?;
        merged.id = book.id.clone();
        Ok(merged.normalized())
    }
}

impl Book {
    /// Collapses empty optional text to `None` so it is omitted everywhere.
    pub fn normalized(mut self) -> Self {
        for value in [
            &mut self.series,
            &mut self.review,
            &mut self.started_at,
            &mut self.finished_at,
            &mut self.thumbnail,
            &mut self.kind,
            &mut self.comments,
        ] {
            if value.as_deref().is_some_and(str::is_empty) {
                *value = None;
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dune() -> Book {
        Book {
            id: "b-1".to_string(),
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            series: Some("Dune Chronicles".to_string()),
            status: BookStatus::Reading,
            rating: Some(9),
            review: None,
            tags: vec!["sci-fi".to_string(), "classic".to_string()],
            started_at: Some("2024-01-02".to_string()),
            finished_at: None,
            thumbnail: None,
            kind: Some("paperback".to_string()),
            comments: None,
        }
    }

    #[test]
    fn status_round_trips_through_its_wire_name() {
        for status in BookStatus::ALL {
            assert_eq!(status.as_str().parse::<BookStatus>(), Ok(status));
        }
        assert!("reading".parse::<BookStatus>().is_err());
        assert_eq!(BookStatus::default(), BookStatus::WantToRead);
    }

    #[test]
    fn api_shape_omits_absent_fields_and_renames_kind() {
        let value = serde_json::to_value(dune()).unwrap();
        assert_eq!(value["type"], "paperback");
        assert_eq!(value["status"], "READING");
        assert!(value.get("review").is_none());
        assert!(value.get("kind").is_none());

        let mut bare = dune();
        bare.tags.clear();
        let value = serde_json::to_value(bare).unwrap();
        assert!(value.get("tags").is_none());
    }

    #[test]
    fn field_names_resolve_both_ways() {
        for field in BookField::ALL {
            assert_eq!(BookField::from_name(field.name()), Some(field));
        }
        assert_eq!(BookField::from_name("id"), None);
    }

    #[test]
    fn patch_overwrites_present_fields_and_keeps_the_rest() {
        let mut patch = BookPatch::default();
        patch.set(BookField::Status, json!("READ"));
        patch.set(BookField::Tags, json!([]));
        patch.clear(BookField::Rating);

        let merged = patch.apply(&dune()).unwrap();
        assert_eq!(merged.status, BookStatus::Read);
        assert!(merged.tags.is_empty());
        assert_eq!(merged.rating, None);
        assert_eq!(merged.title, "Dune");
        assert_eq!(merged.series.as_deref(), Some("Dune Chronicles"));
    }

    #[test]
    fn patch_never_changes_identity() {
        let mut patch = BookPatch::default();
        patch.set(BookField::Title, json!("Dune Messiah"));
        let merged = patch.apply(&dune()).unwrap();
        assert_eq!(merged.id, "b-1");
        assert_eq!(merged.title, "Dune Messiah");
    }

    #[test]
    fn empty_text_is_normalized_away() {
        let mut patch = BookPatch::default();
        patch.set(BookField::Series, json!(""));
        let merged = patch.apply(&dune()).unwrap();
        assert_eq!(merged.series, None);
    }
}
