//! DynamoDB item layout for books.
//!
//! One layout only: every owner's books share the partition
//! `USER#<owner>` and each book sorts under `BOOK#<id>`. Items are stamped
//! with [`SCHEMA_VERSION`] and anything else is refused on read.

use aws_sdk_dynamodb::types::AttributeValue;
use std::collections::HashMap;
use thiserror::Error;

use crate::book::{Book, BookStatus};

pub type Item = HashMap<String, AttributeValue>;

pub const SCHEMA_VERSION: u32 = 1;

pub const PARTITION_KEY: &str = "PK";
pub const SORT_KEY: &str = "SK";

const OWNER_PREFIX: &str = "USER#";
const BOOK_PREFIX: &str = "BOOK#";

const ID: &str = "id";
const TITLE: &str = "Title";
const AUTHOR: &str = "Author";
const SERIES: &str = "Series";
const STATUS: &str = "status";
const RATING: &str = "rating";
const REVIEW: &str = "review";
const TAGS: &str = "tags";
const STARTED_AT: &str = "started_at";
const FINISHED_AT: &str = "finished_at";
const THUMBNAIL: &str = "thumbnail";
const KIND: &str = "type";
const COMMENTS: &str = "comments";
const VERSION: &str = "schema_version";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("missing attribute {0}")]
    MissingAttribute(&'static str),
    #[error("attribute {0} has the wrong type")]
    WrongType(&'static str),
    #[error("attribute {attribute} is not a valid integer: {value}")]
    InvalidNumber { attribute: &'static str, value: String },
    #[error("stored status {0:?} is not recognised")]
    InvalidStatus(String),
    #[error("unsupported schema version {0}")]
    UnsupportedSchema(String),
    #[error("key {0:?} does not follow the per-owner layout")]
    ForeignKey(String),
}

pub fn partition_key(owner: &str) -> String {
    format!("{OWNER_PREFIX}{owner}")
}

pub fn sort_key(book_id: &str) -> String {
    format!("{BOOK_PREFIX}{book_id}")
}

/// Primary key of one book, always derived from the caller's identity.
pub fn key(owner: &str, book_id: &str) -> Item {
    let mut key = HashMap::new();
    key.insert(
        PARTITION_KEY.to_string(),
        AttributeValue::S(partition_key(owner)),
    );
    key.insert(SORT_KEY.to_string(), AttributeValue::S(sort_key(book_id)));
    key
}

pub fn encode(owner: &str, book: &Book) -> Item {
    let mut item = key(owner, &book.id);
    item.insert(ID.to_string(), AttributeValue::S(book.id.clone()));
    item.insert(TITLE.to_string(), AttributeValue::S(book.title.clone()));
    item.insert(AUTHOR.to_string(), AttributeValue::S(book.author.clone()));
    item.insert(
        STATUS.to_string(),
        AttributeValue::S(book.status.as_str().to_string()),
    );
    item.insert(
        VERSION.to_string(),
        AttributeValue::N(SCHEMA_VERSION.to_string()),
    );

    put_text(&mut item, SERIES, &book.series);
    put_text(&mut item, REVIEW, &book.review);
    put_text(&mut item, STARTED_AT, &book.started_at);
    put_text(&mut item, FINISHED_AT, &book.finished_at);
    put_text(&mut item, THUMBNAIL, &book.thumbnail);
    put_text(&mut item, KIND, &book.kind);
    put_text(&mut item, COMMENTS, &book.comments);

    if let Some(rating) = book.rating {
        item.insert(RATING.to_string(), AttributeValue::N(rating.to_string()));
    }
    if !book.tags.is_empty() {
        let tags = book.tags.iter().cloned().map(AttributeValue::S).collect();
        item.insert(TAGS.to_string(), AttributeValue::L(tags));
    }

    item
}

/// Reads a stored item back into the API shape, dropping the key attributes.
pub fn decode(item: &Item) -> Result<Book, CodecError> {
    let version = number(item, VERSION)?.ok_or(CodecError::MissingAttribute(VERSION))?;
    if version != i64::from(SCHEMA_VERSION) {
        return Err(CodecError::UnsupportedSchema(version.to_string()));
    }

    let pk = required_text(item, PARTITION_KEY)?;
    if !pk.starts_with(OWNER_PREFIX) {
        return Err(CodecError::ForeignKey(pk));
    }

    let id = required_text(item, ID)?;
    let sk = required_text(item, SORT_KEY)?;
    if sk != sort_key(&id) {
        return Err(CodecError::ForeignKey(sk));
    }

    let status = required_text(item, STATUS)?;
    let status = status
        .parse::<BookStatus>()
        .map_err(|_| CodecError::InvalidStatus(status))?;

    let tags = match item.get(TAGS) {
        None => Vec::new(),
        Some(value) => value
            .as_l()
            .map_err(|_| CodecError::WrongType(TAGS))?
            .iter()
            .map(|tag| tag.as_s().cloned().map_err(|_| CodecError::WrongType(TAGS)))
            .collect::<Result<Vec<_>, _>>()?,
    };

    Ok(Book {
        id,
        title: required_text(item, TITLE)?,
        author: required_text(item, AUTHOR)?,
        series: text(item, SERIES)?,
        status,
        rating: number(item, RATING)?,
        review: text(item, REVIEW)?,
        tags,
        started_at: text(item, STARTED_AT)?,
        finished_at: text(item, FINISHED_AT)?,
        thumbnail: text(item, THUMBNAIL)?,
        kind: text(item, KIND)?,
        comments: text(item, COMMENTS)?,
    })
}

fn put_text(item: &mut Item, attribute: &str, value: &Option<String>) {
    if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
        item.insert(attribute.to_string(), AttributeValue::S(value.to_string()));
    }
}

fn text(item: &Item, attribute: &'static str) -> Result<Option<String>, CodecError> {
    match item.get(attribute) {
        None => Ok(None),
        Some(value) => {
            let value = value.as_s().map_err(|_| CodecError::WrongType(attribute))?;
            Ok(Some(value.clone()).filter(|v| !v.is_empty()))
        }
    }
}

fn required_text(item: &Item, attribute: &'static str) -> Result<String, CodecError> {
    text(item, attribute)?.ok_or(CodecError::MissingAttribute(attribute))
}

fn number(item: &Item, attribute: &'static str) -> Result<Option<i64>, CodecError> {
    match item.get(attribute) {
        None => Ok(None),
        Some(value) => {
            let raw = value.as_n().map_err(|_| CodecError::WrongType(attribute))?;
            raw.parse::<i64>()
                .map(Some)
                .map_err(|_| CodecError::InvalidNumber {
                    attribute,
                    value: raw.clone(),
                })
        }
    }
}
