//! Doubles for handler tests: an in-memory [`BookStore`], the fixed key set
//! published by the test issuer and tokens signed with its private key.

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use lambda_http::{Body, Response};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::book::{Book, BookStatus};
use crate::codec::{self, Item};
use crate::jwt::{AuthError, KeySetSource};
use crate::store::{BookStore, StoreError};

pub const TEST_ISSUER: &str = "https://cognito-idp.us-east-1.amazonaws.com/us-east-1_TestPool";
pub const TEST_KEY_ID: &str = "test-key-1";
pub const TEST_JWKS: &str = include_str!("jwks.json");

const TEST_PRIVATE_KEY: &[u8] = include_bytes!("jwt_test_key.pem");

/// Serves [`TEST_JWKS`] and counts how often it was asked to.
#[derive(Clone, Default)]
pub struct StaticKeySet {
    fetches: Arc<AtomicUsize>,
}

impl StaticKeySet {
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeySetSource for StaticKeySet {
    async fn fetch(&self) -> Result<JwkSet, AuthError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        serde_json::from_str(TEST_JWKS).map_err(|err| AuthError::KeySetFetch(err.to_string()))
    }
}

pub fn sign_token(kid: &str, claims: &Value) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    let key = EncodingKey::from_rsa_pem(TEST_PRIVATE_KEY).expect("test signing key");
    encode(&header, claims, &key).expect("sign test token")
}

/// A valid access token for `owner` from [`TEST_ISSUER`].
pub fn access_token(owner: &str) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock after epoch")
        .as_secs();
    sign_token(
        TEST_KEY_ID,
        &json!({
            "sub": owner,
            "iss": TEST_ISSUER,
            "exp": now + 3600,
            "iat": now,
            "token_use": "access",
        }),
    )
}

pub fn book(id: &str, title: &str, author: &str) -> Book {
    Book {
        id: id.to_string(),
        title: title.to_string(),
        author: author.to_string(),
        series: None,
        status: BookStatus::WantToRead,
        rating: None,
        review: None,
        tags: Vec::new(),
        started_at: None,
        finished_at: None,
        thumbnail: None,
        kind: None,
        comments: None,
    }
}

pub fn body_json(response: &Response<Body>) -> Value {
    serde_json::from_slice(response.body().as_ref()).expect("response body is JSON")
}

/// Keeps encoded items keyed by `(PK, SK)` so tests exercise the real
/// item layout. A failing store rejects every call.
#[derive(Default)]
pub struct MemoryBookStore {
    items: Mutex<BTreeMap<(String, String), Item>>,
    failing: bool,
}

impl MemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn with_books(owner: &str, books: impl IntoIterator<Item = Book>) -> Self {
        let store = Self::new();
        for book in books {
            store.insert(owner, &book);
        }
        store
    }

    pub fn insert(&self, owner: &str, book: &Book) {
        self.items.lock().unwrap().insert(
            (codec::partition_key(owner), codec::sort_key(&book.id)),
            codec::encode(owner, book),
        );
    }

    /// The raw item as it would sit in the table.
    pub fn item(&self, owner: &str, book_id: &str) -> Option<Item> {
        self.items
            .lock()
            .unwrap()
            .get(&(codec::partition_key(owner), codec::sort_key(book_id)))
            .cloned()
    }

    pub fn book(&self, owner: &str, book_id: &str) -> Option<Book> {
        self.item(owner, book_id)
            .map(|item| codec::decode(&item).expect("stored item decodes"))
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check(&self, operation: &'static str) -> Result<(), StoreError> {
        if self.failing {
            return Err(StoreError::Backend {
                operation,
                message: "service unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl BookStore for MemoryBookStore {
    async fn put(&self, owner: &str, book: &Book) -> Result<(), StoreError> {
        self.check("put_item")?;
        self.insert(owner, book);
        Ok(())
    }

    async fn get(&self, owner: &str, book_id: &str) -> Result<Option<Book>, StoreError> {
        self.check("get_item")?;
        match self.item(owner, book_id) {
            Some(item) => Ok(Some(codec::decode(&item)?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, owner: &str, book_id: &str) -> Result<(), StoreError> {
        self.check("delete_item")?;
        self.items
            .lock()
            .unwrap()
            .remove(&(codec::partition_key(owner), codec::sort_key(book_id)));
        Ok(())
    }

    async fn query_by_owner(
        &self,
        owner: &str,
        status: Option<BookStatus>,
    ) -> Result<Vec<Book>, StoreError> {
        self.check("query")?;
        let partition = codec::partition_key(owner);
        let items: Vec<Item> = self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|((pk, _), _)| *pk == partition)
            .map(|(_, item)| item.clone())
            .collect();

        let mut books = Vec::with_capacity(items.len());
        for item in &items {
            let book = codec::decode(item)?;
            if status.map_or(true, |wanted| book.status == wanted) {
                books.push(book);
            }
        }
        Ok(books)
    }
}
