//! HTTP access to the `/books` collection, split the same way the rest of the
//! crate splits concerns: the client issues requests, the error type describes
//! how they fail.

mod client;
mod error;

pub use client::{BooksApi, DEFAULT_BASE_URL};
pub use error::ApiError;
