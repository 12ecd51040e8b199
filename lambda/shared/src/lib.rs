//! Pieces every bookshelf function is built from: the book record and its
//! DynamoDB encoding, validation, the storage accessor, caller identity and
//! the HTTP response conventions.

pub mod book;
pub mod codec;
pub mod config;
pub mod error;
pub mod identity;
pub mod jwt;
pub mod local;
pub mod request;
pub mod response;
pub mod store;
pub mod validate;

#[cfg(any(test, feature = "testing"))]
pub mod testing;
