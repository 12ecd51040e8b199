//! Turning a reading history into five suggestions.
//!
//! Generation is best effort. Whatever goes wrong, the caller still gets a
//! list, and [`Recommendations`] records which path produced it.

use anyhow::{anyhow, bail};
use serde::{Deserialize, Serialize};
use shared::book::{Book, BookStatus};
use std::fmt::Write as _;
use tracing::warn;

use crate::generator::TextGenerator;

pub const RECOMMENDATION_COUNT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub reason: String,
}

impl Recommendation {
    fn new(title: &str, author: &str, genre: &str, reason: &str) -> Self {
        Self {
            title: title.to_string(),
            author: author.to_string(),
            genre: genre.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recommendations {
    Generated(Vec<Recommendation>),
    Default(Vec<Recommendation>),
}

impl Recommendations {
    pub fn defaults() -> Self {
        Recommendations::Default(default_recommendations())
    }

    pub fn source(&self) -> &'static str {
        match self {
            Recommendations::Generated(_) => "generated",
            Recommendations::Default(_) => "default",
        }
    }

    pub fn items(&self) -> &[Recommendation] {
        match self {
            Recommendations::Generated(items) | Recommendations::Default(items) => items,
        }
    }
}

pub fn default_recommendations() -> Vec<Recommendation> {
    vec![
        Recommendation::new(
            "The Hobbit",
            "J.R.R. Tolkien",
            "Fantasy",
            "A classic adventure perfect for starting your reading journey",
        ),
        Recommendation::new(
            "Dune",
            "Frank Herbert",
            "Science Fiction",
            "Epic world-building and complex politics",
        ),
        Recommendation::new(
            "The Name of the Wind",
            "Patrick Rothfuss",
            "Fantasy",
            "Beautiful prose and compelling storytelling",
        ),
        Recommendation::new(
            "The Martian",
            "Andy Weir",
            "Science Fiction",
            "Engaging hard sci-fi with humor",
        ),
        Recommendation::new(
            "The Way of Kings",
            "Brandon Sanderson",
            "Epic Fantasy",
            "Intricate magic system and world-building",
        ),
    ]
}

pub async fn recommend(books: &[Book], generator: &impl TextGenerator) -> Recommendations {
    if books.is_empty() {
        return Recommendations::defaults();
    }

    let prompt = build_prompt(books);
    let generated = generator
        .generate(&prompt)
        .await
        .and_then(|reply| parse_recommendations(&reply));

    match generated {
        Ok(items) => Recommendations::Generated(items),
        Err(err) => {
            warn!(error = %err, "using default recommendations");
            Recommendations::defaults()
        }
    }
}

pub fn build_prompt(books: &[Book]) -> String {
    let titles = |status: BookStatus| -> Vec<String> {
        books
            .iter()
            .filter(|book| book.status == status)
            .map(|book| format!("- {} by {}", book.title, book.author))
            .collect()
    };

    let mut prompt = String::from(
        "You are a librarian recommending books based on a reader's history.\n",
    );
    for (heading, status) in [
        ("Books they have read", BookStatus::Read),
        ("Books they are reading now", BookStatus::Reading),
        (
            "Books already on their want-to-read list (do not recommend these)",
            BookStatus::WantToRead,
        ),
    ] {
        let lines = titles(status);
        if lines.is_empty() {
            continue;
        }
        let _ = write!(prompt, "\n{heading}:\n{}\n", lines.join("\n"));
    }
    let _ = write!(
        prompt,
        "\nRecommend exactly {RECOMMENDATION_COUNT} other books they are likely to enjoy. \
         Respond with only a JSON array of {RECOMMENDATION_COUNT} objects, each with the \
         string fields \"title\", \"author\", \"genre\" and \"reason\" (one sentence)."
    );
    prompt
}

/// Reads the first JSON array out of a model reply, keeping the first
/// [`RECOMMENDATION_COUNT`] entries. A shorter array is an error.
pub fn parse_recommendations(reply: &str) -> anyhow::Result<Vec<Recommendation>> {
    let array = first_json_array(reply).ok_or_else(|| anyhow!("no JSON array in reply"))?;
    let mut items: Vec<Recommendation> = serde_json::from_str(array)?;
    if items.len() < RECOMMENDATION_COUNT {
        bail!(
            "reply contained {} recommendations, expected {RECOMMENDATION_COUNT}",
            items.len()
        );
    }
    items.truncate(RECOMMENDATION_COUNT);
    Ok(items)
}

/// The first balanced `[...]` span. Brackets inside string literals do not
/// count.
pub fn first_json_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}
